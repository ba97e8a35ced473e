//! Message processing pipeline.
//!
//! Every inbound email flows through:
//! 1. `extract::extract_text()`: plain text from a multi-part body
//! 2. `Classifier::classify()`: reservation / feedback / unclassified
//! 3. `fields::detect_fields()`: time and party size (reservations only)
//! 4. `ReplyComposer::compose()`: template reply plus disposition
//!
//! Reservation replies are sent automatically; feedback replies are saved as
//! drafts for a human to review. None of the stages perform I/O.

pub mod classifier;
pub mod composer;
pub mod extract;
pub mod fields;
pub mod processor;
pub mod types;

pub use classifier::Classifier;
pub use composer::{ReplyComposer, ReplyTemplate};
pub use processor::{Analysis, MessageProcessor, RunSummary};
pub use types::{
    BodyPart, Classification, ContentDisposition, Disposition, InboundMessage, MailTransport,
    MessageBody, PartKind, ReplyDraft, ReservationFields,
};
