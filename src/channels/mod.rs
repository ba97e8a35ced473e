//! Mail transport: IMAP for inbound, SMTP for outbound.

pub mod email;
pub mod imap;

pub use email::{EmailConfig, EmailTransport};
