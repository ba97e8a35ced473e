//! Message processor: runs one message through extract → classify →
//! detect → compose, and drives a batch over a `MailTransport`.

use tracing::{debug, error, info};

use crate::config::{KeywordSets, ReplyConfig};
use crate::drafts::DraftStore;
use crate::error::{self, TransportError};
use crate::pipeline::classifier::Classifier;
use crate::pipeline::composer::ReplyComposer;
use crate::pipeline::extract::extract_text;
use crate::pipeline::fields::detect_fields;
use crate::pipeline::types::{
    Classification, Disposition, InboundMessage, MailTransport, ReplyDraft, ReservationFields,
};

/// Everything the pipeline decided about one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    pub text: String,
    pub classification: Classification,
    /// Always `default()` for non-reservation messages.
    pub fields: ReservationFields,
}

/// Counts from one pass over the inbox.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub fetched: usize,
    pub sent: usize,
    pub drafted: usize,
    pub ignored: usize,
    pub failed: usize,
    /// Handled, but the transport could not mark them processed. These come
    /// back on the next fetch.
    pub unmarked: usize,
}

/// Stateless pipeline; safe to share across tasks.
#[derive(Debug, Clone, Default)]
pub struct MessageProcessor {
    classifier: Classifier,
    composer: ReplyComposer,
}

impl MessageProcessor {
    pub fn new(keywords: &KeywordSets, reply: ReplyConfig) -> Self {
        Self {
            classifier: Classifier::new(keywords),
            composer: ReplyComposer::new(reply),
        }
    }

    /// Extract, classify and (for reservations) detect fields.
    pub fn analyze(&self, message: &InboundMessage) -> Analysis {
        let text = extract_text(&message.body);
        let classification = self.classifier.classify(&text);
        let fields = match classification {
            Classification::Reservation => detect_fields(&text),
            _ => ReservationFields::default(),
        };
        Analysis {
            text,
            classification,
            fields,
        }
    }

    /// Compose the reply for a message, if it warrants one.
    pub fn process(&self, message: &InboundMessage) -> Option<ReplyDraft> {
        let analysis = self.analyze(message);
        debug!(
            id = %message.id,
            classification = analysis.classification.label(),
            has_time = analysis.fields.has_time,
            has_people_count = analysis.fields.has_people_count,
            "Message analyzed"
        );
        self.composer
            .compose(message, analysis.classification, analysis.fields)
    }

    /// One pass: fetch unread, reply or save drafts, mark handled messages.
    ///
    /// A message whose reply could not be sent or saved stays unread so the
    /// next pass retries it.
    pub async fn run_once(
        &self,
        transport: &dyn MailTransport,
        drafts: &DraftStore,
    ) -> Result<RunSummary, TransportError> {
        let messages = transport.fetch_unread().await?;
        let mut summary = RunSummary {
            fetched: messages.len(),
            ..RunSummary::default()
        };

        if messages.is_empty() {
            info!(transport = transport.name(), "No new messages to process");
            return Ok(summary);
        }

        for message in &messages {
            let Some(draft) = self.process(message) else {
                debug!(id = %message.id, sender = %message.sender, "No reply for unclassified message");
                summary.ignored += 1;
                mark_handled(transport, message, &mut summary).await;
                continue;
            };

            match dispatch(transport, drafts, message, &draft).await {
                Ok(()) => {
                    match draft.disposition {
                        Disposition::AutoSend => summary.sent += 1,
                        Disposition::SaveAsDraft => summary.drafted += 1,
                    }
                    mark_handled(transport, message, &mut summary).await;
                }
                Err(e) => {
                    error!(id = %message.id, to = %draft.to, error = %e, "Failed to dispatch reply");
                    summary.failed += 1;
                }
            }
        }

        info!(
            fetched = summary.fetched,
            sent = summary.sent,
            drafted = summary.drafted,
            ignored = summary.ignored,
            failed = summary.failed,
            unmarked = summary.unmarked,
            "Inbox pass complete"
        );
        Ok(summary)
    }
}

/// Marks one message as soon as it is handled, never in a batch at the end.
async fn mark_handled(
    transport: &dyn MailTransport,
    message: &InboundMessage,
    summary: &mut RunSummary,
) {
    if let Err(e) = transport
        .mark_processed(std::slice::from_ref(&message.id))
        .await
    {
        error!(id = %message.id, error = %e, "Failed to mark message processed");
        summary.unmarked += 1;
    }
}

async fn dispatch(
    transport: &dyn MailTransport,
    drafts: &DraftStore,
    message: &InboundMessage,
    draft: &ReplyDraft,
) -> error::Result<()> {
    match draft.disposition {
        Disposition::AutoSend => {
            transport.send_reply(draft).await?;
            info!(to = %draft.to, subject = %draft.subject, "Sent reply");
        }
        Disposition::SaveAsDraft => {
            let path = drafts.save(draft, &message.id).await?;
            info!(to = %draft.to, path = %path.display(), "Saved draft reply");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::{BodyPart, MessageBody};

    fn message(body: MessageBody) -> InboundMessage {
        InboundMessage {
            id: "42".into(),
            sender_name: Some("Alice".into()),
            sender: "alice@example.com".into(),
            subject: "Table booking".into(),
            body,
            message_id: Some("m1@example.com".into()),
        }
    }

    fn plain(text: &str) -> InboundMessage {
        message(MessageBody::Single(BodyPart::plain(text)))
    }

    #[test]
    fn reservation_with_everything_is_confirmed() {
        let processor = MessageProcessor::default();
        let draft = processor
            .process(&plain("I'd like to book a table for 7pm, party of 4"))
            .unwrap();
        assert_eq!(draft.disposition, Disposition::AutoSend);
        assert!(draft.body.contains("Your reservation details have been noted"));
        assert_eq!(draft.subject, "Re: Table booking");
    }

    #[test]
    fn reservation_missing_time_asks_for_time() {
        let draft = MessageProcessor::default()
            .process(&plain("Can I make a reservation for 6 people?"))
            .unwrap();
        assert!(draft.body.contains("what time you would like to dine so we can confirm"));
    }

    #[test]
    fn reservation_missing_both_asks_for_both() {
        let draft = MessageProcessor::default()
            .process(&plain("booking please"))
            .unwrap();
        assert!(draft.body.contains("how many guests will be joining"));
    }

    #[test]
    fn feedback_is_held() {
        let draft = MessageProcessor::default()
            .process(&plain("Great experience, loved the food!"))
            .unwrap();
        assert_eq!(draft.disposition, Disposition::SaveAsDraft);
        assert!(draft.body.contains("share your feedback"));
    }

    #[test]
    fn unrelated_mail_gets_no_reply() {
        assert!(
            MessageProcessor::default()
                .process(&plain("Do you sell gift cards?"))
                .is_none()
        );
    }

    #[test]
    fn html_only_body_is_analyzed() {
        let processor = MessageProcessor::default();
        let msg = message(MessageBody::Multipart(vec![BodyPart::html(
            "<p>party of 3 at 8pm</p>",
        )]));
        let analysis = processor.analyze(&msg);
        assert_eq!(analysis.text, "party of 3 at 8pm");
        assert_eq!(analysis.classification, Classification::Reservation);
        assert!(analysis.fields.has_time);
        assert!(analysis.fields.has_people_count);
    }

    #[test]
    fn fields_not_detected_for_feedback() {
        let analysis = MessageProcessor::default().analyze(&plain("Review: 7pm, 4 people, great"));
        assert_eq!(analysis.classification, Classification::Feedback);
        assert_eq!(analysis.fields, ReservationFields::default());
    }

    #[test]
    fn empty_body_is_unclassified() {
        let msg = message(MessageBody::Multipart(vec![]));
        let analysis = MessageProcessor::default().analyze(&msg);
        assert_eq!(analysis.text, "");
        assert_eq!(analysis.classification, Classification::Unclassified);
    }
}
