//! Shared types for the message processing pipeline.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::TransportError;

// ── Message body ────────────────────────────────────────────────────

/// Content kind of a single MIME part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartKind {
    PlainText,
    Html,
    /// Images, attachments, nested messages, anything non-textual.
    Other,
}

/// `Content-Disposition` of a part, when declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentDisposition {
    Inline,
    Attachment,
}

/// One leaf part of a message body, still undecoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyPart {
    pub kind: PartKind,
    pub disposition: Option<ContentDisposition>,
    /// Declared charset label (`utf-8`, `iso-8859-1`, ...).
    pub charset: Option<String>,
    pub bytes: Vec<u8>,
}

impl BodyPart {
    pub fn new(kind: PartKind, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            kind,
            disposition: None,
            charset: None,
            bytes: bytes.into(),
        }
    }

    pub fn plain(text: &str) -> Self {
        Self::new(PartKind::PlainText, text.as_bytes())
    }

    pub fn html(markup: &str) -> Self {
        Self::new(PartKind::Html, markup.as_bytes())
    }

    pub fn with_charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = Some(charset.into());
        self
    }

    pub fn with_disposition(mut self, disposition: ContentDisposition) -> Self {
        self.disposition = Some(disposition);
        self
    }

    pub fn is_attachment(&self) -> bool {
        self.disposition == Some(ContentDisposition::Attachment)
    }
}

/// A message body: either one part or an ordered list of leaf parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageBody {
    Single(BodyPart),
    Multipart(Vec<BodyPart>),
}

impl MessageBody {
    /// Leaf parts in document order.
    pub fn parts(&self) -> &[BodyPart] {
        match self {
            Self::Single(part) => std::slice::from_ref(part),
            Self::Multipart(parts) => parts,
        }
    }
}

// ── Inbound message ─────────────────────────────────────────────────

/// Immutable snapshot of one fetched email.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// Transport handle (IMAP UID); only used to mark the message processed.
    pub id: String,
    /// Sender display name, if the `From` header carried one.
    pub sender_name: Option<String>,
    /// Sender address; replies go here.
    pub sender: String,
    pub subject: String,
    pub body: MessageBody,
    /// `Message-ID` of the original, used for reply threading.
    pub message_id: Option<String>,
}

// ── Pipeline outputs ────────────────────────────────────────────────

/// Category decided by the keyword classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Reservation,
    Feedback,
    Unclassified,
}

impl Classification {
    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Reservation => "reservation",
            Self::Feedback => "feedback",
            Self::Unclassified => "unclassified",
        }
    }
}

/// Which reservation details were found in the text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationFields {
    pub has_time: bool,
    pub has_people_count: bool,
}

/// What happens to a composed reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    /// Sent immediately through the transport.
    AutoSend,
    /// Held on disk for manual review.
    SaveAsDraft,
}

/// A reply ready to be sent or saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyDraft {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub disposition: Disposition,
    /// `Message-ID` of the message being answered; `None` omits threading headers.
    pub in_reply_to: Option<String>,
}

// ── Transport trait ─────────────────────────────────────────────────

/// Mail transport. Pure I/O, no business logic.
///
/// Classification and reply composition live in `MessageProcessor`.
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Transport name for logging (e.g. "imap").
    fn name(&self) -> &str;

    /// Fetch unread messages without marking them read.
    async fn fetch_unread(&self) -> Result<Vec<InboundMessage>, TransportError>;

    /// Send an `AutoSend` reply.
    async fn send_reply(&self, draft: &ReplyDraft) -> Result<(), TransportError>;

    /// Mark messages (by transport handle) as processed.
    async fn mark_processed(&self, ids: &[String]) -> Result<(), TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_body_exposes_one_part() {
        let body = MessageBody::Single(BodyPart::plain("hello"));
        assert_eq!(body.parts().len(), 1);
        assert_eq!(body.parts()[0].kind, PartKind::PlainText);
    }

    #[test]
    fn multipart_preserves_order() {
        let body = MessageBody::Multipart(vec![
            BodyPart::html("<p>a</p>"),
            BodyPart::plain("b"),
        ]);
        let kinds: Vec<PartKind> = body.parts().iter().map(|p| p.kind).collect();
        assert_eq!(kinds, vec![PartKind::Html, PartKind::PlainText]);
    }

    #[test]
    fn attachment_flag() {
        let part = BodyPart::plain("x").with_disposition(ContentDisposition::Attachment);
        assert!(part.is_attachment());
        let inline = BodyPart::plain("x").with_disposition(ContentDisposition::Inline);
        assert!(!inline.is_attachment());
        assert!(!BodyPart::plain("x").is_attachment());
    }

    #[test]
    fn classification_labels() {
        assert_eq!(Classification::Reservation.label(), "reservation");
        assert_eq!(Classification::Feedback.label(), "feedback");
        assert_eq!(Classification::Unclassified.label(), "unclassified");
    }

    #[test]
    fn disposition_serialization() {
        let json = serde_json::to_value(Disposition::SaveAsDraft).unwrap();
        assert_eq!(json, "save_as_draft");
    }
}
