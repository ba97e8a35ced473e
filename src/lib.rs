//! Restaurant replier: keyword triage and template replies for an inbox.
//!
//! Reservation enquiries get an automatic reply (confirming, or asking for
//! the missing time or party size); feedback gets a thank-you draft saved
//! for review.

pub mod channels;
pub mod config;
pub mod drafts;
pub mod error;
pub mod pipeline;

pub use error::{Error, Result};
