//! Reply composition.
//!
//! Every reply is one of a fixed set of templates, picked from the
//! classification and the reservation fields that were found.

use crate::config::ReplyConfig;
use crate::pipeline::types::{
    Classification, Disposition, InboundMessage, ReplyDraft, ReservationFields,
};

/// Greeting used when the sender gave no display name.
pub const FALLBACK_GREETING_NAME: &str = "there";

const RESERVATION_OPENING: &str =
    "Thank you for reaching out about a reservation at our restaurant.";

/// Which reply to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyTemplate {
    /// Time and party size both given.
    ReservationConfirmed,
    AskForTime,
    AskForPartySize,
    AskForTimeAndPartySize,
    FeedbackThanks,
}

impl ReplyTemplate {
    /// Pick the template; `None` for unclassified messages.
    pub fn select(classification: Classification, fields: ReservationFields) -> Option<Self> {
        match classification {
            Classification::Reservation => Some(match (fields.has_time, fields.has_people_count) {
                (true, true) => Self::ReservationConfirmed,
                (false, true) => Self::AskForTime,
                (true, false) => Self::AskForPartySize,
                (false, false) => Self::AskForTimeAndPartySize,
            }),
            Classification::Feedback => Some(Self::FeedbackThanks),
            Classification::Unclassified => None,
        }
    }

    /// Reservation replies go out immediately; feedback replies are held.
    pub fn disposition(&self) -> Disposition {
        match self {
            Self::FeedbackThanks => Disposition::SaveAsDraft,
            _ => Disposition::AutoSend,
        }
    }

    /// Paragraphs between the greeting and the sign-off.
    fn paragraphs(&self) -> &'static [&'static str] {
        match self {
            Self::ReservationConfirmed => &[
                RESERVATION_OPENING,
                "Your reservation details have been noted and we look forward to welcoming you.\n\
                 If you need to make any changes, please let us know.",
            ],
            Self::AskForTime => &[
                RESERVATION_OPENING,
                "Could you please let us know what time you would like to dine so we can confirm your reservation?",
            ],
            Self::AskForPartySize => &[
                RESERVATION_OPENING,
                "Could you please tell us the number of guests in your party?",
            ],
            Self::AskForTimeAndPartySize => &[
                RESERVATION_OPENING,
                "We would be happy to confirm your booking, but we need a bit more information.\n\
                 Could you please let us know what time you would like to dine and how many guests will be joining?",
            ],
            Self::FeedbackThanks => &[
                "Thank you for taking the time to share your feedback with us.\n\
                 We appreciate your comments and will review your message carefully.",
            ],
        }
    }

    /// Render the full body for `name`, signed with `signature`.
    pub fn render(&self, name: &str, signature: &str) -> String {
        let mut body = format!("Hello {name},");
        for paragraph in self.paragraphs() {
            body.push_str("\n\n");
            body.push_str(paragraph);
        }
        body.push_str("\n\nBest regards,\n");
        body.push_str(signature);
        body
    }
}

/// Builds `ReplyDraft`s. Holds no per-message state.
#[derive(Debug, Clone, Default)]
pub struct ReplyComposer {
    config: ReplyConfig,
}

impl ReplyComposer {
    pub fn new(config: ReplyConfig) -> Self {
        Self { config }
    }

    /// Compose the reply body for a classified message.
    pub fn body(
        &self,
        classification: Classification,
        sender_name: Option<&str>,
        fields: ReservationFields,
    ) -> Option<String> {
        ReplyTemplate::select(classification, fields)
            .map(|template| template.render(greeting_name(sender_name), &self.config.signature))
    }

    /// Compose the full draft answering `message`.
    pub fn compose(
        &self,
        message: &InboundMessage,
        classification: Classification,
        fields: ReservationFields,
    ) -> Option<ReplyDraft> {
        let template = ReplyTemplate::select(classification, fields)?;
        Some(ReplyDraft {
            to: message.sender.clone(),
            subject: reply_subject(&message.subject),
            body: template.render(
                greeting_name(message.sender_name.as_deref()),
                &self.config.signature,
            ),
            disposition: template.disposition(),
            in_reply_to: message.message_id.clone(),
        })
    }
}

/// Display name for the greeting, or "there".
pub fn greeting_name(sender_name: Option<&str>) -> &str {
    sender_name
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(FALLBACK_GREETING_NAME)
}

/// Prefix `Re: ` unless the subject already starts with it (any case).
pub fn reply_subject(original: &str) -> String {
    let already_reply = original
        .get(..3)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("re:"));
    if already_reply {
        original.to_string()
    } else {
        format!("Re: {original}")
    }
}
