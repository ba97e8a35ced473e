//! Email transport: IMAP polling for inbound, SMTP via lettre for outbound.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use mail_parser::{MessageParser, MessagePart, MimeHeaders, PartType};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info, warn};

use crate::channels::imap::ImapSession;
use crate::config::parse_value;
use crate::error::{ConfigError, TransportError};
use crate::pipeline::types::{
    BodyPart, ContentDisposition, InboundMessage, MailTransport, MessageBody, PartKind, ReplyDraft,
};

// ── Configuration ───────────────────────────────────────────────────

/// Mailbox credentials and server endpoints.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub imap_host: String,
    pub imap_port: u16,
    pub smtp_host: String,
    pub smtp_port: u16,
    /// Login name and `From` address.
    pub address: String,
    pub password: SecretString,
}

impl EmailConfig {
    /// Build config from a variable lookup (the process environment in
    /// production).
    pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
        };

        let address = required("EMAIL_ADDRESS")?;
        let password = SecretString::from(required("EMAIL_PASSWORD")?);

        let imap_host = lookup("IMAP_SERVER").unwrap_or_else(|| "imap.gmail.com".to_string());
        let imap_port: u16 = match lookup("IMAP_PORT") {
            Some(raw) => parse_value("IMAP_PORT", &raw)?,
            None => 993,
        };
        let smtp_host = lookup("SMTP_SERVER").unwrap_or_else(|| "smtp.gmail.com".to_string());
        let smtp_port: u16 = match lookup("SMTP_PORT") {
            Some(raw) => parse_value("SMTP_PORT", &raw)?,
            None => 587,
        };

        Ok(Self {
            imap_host,
            imap_port,
            smtp_host,
            smtp_port,
            address,
            password,
        })
    }
}

// ── Transport ───────────────────────────────────────────────────────

/// IMAP (inbound) + SMTP (outbound) transport.
pub struct EmailTransport {
    config: EmailConfig,
}

impl EmailTransport {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T, TransportError>
    where
        T: Send + 'static,
        F: FnOnce(EmailConfig) -> Result<T, TransportError> + Send + 'static,
    {
        let config = self.config.clone();
        tokio::task::spawn_blocking(move || f(config))
            .await
            .map_err(|e| TransportError::Task(e.to_string()))?
    }
}

#[async_trait]
impl MailTransport for EmailTransport {
    fn name(&self) -> &str {
        "imap"
    }

    async fn fetch_unread(&self) -> Result<Vec<InboundMessage>, TransportError> {
        let raw_messages = self.blocking(|config| fetch_unseen(&config)).await?;
        debug!("Fetched {} unseen emails", raw_messages.len());

        Ok(raw_messages
            .into_iter()
            .filter_map(|(uid, raw)| {
                let parsed = parse_inbound(&uid, &raw);
                if parsed.is_none() {
                    warn!(uid = %uid, "Skipping unparseable or senderless email");
                }
                parsed
            })
            .collect())
    }

    async fn send_reply(&self, draft: &ReplyDraft) -> Result<(), TransportError> {
        let draft = draft.clone();
        self.blocking(move |config| send_smtp(&config, &draft)).await
    }

    async fn mark_processed(&self, ids: &[String]) -> Result<(), TransportError> {
        let uids = ids.to_vec();
        self.blocking(move |config| mark_seen(&config, &uids)).await
    }
}

// ── IMAP ────────────────────────────────────────────────────────────

fn open_inbox(config: &EmailConfig) -> Result<ImapSession, TransportError> {
    let mut session = ImapSession::connect(&config.imap_host, config.imap_port)?;
    session.login(&config.address, config.password.expose_secret())?;
    session.select_inbox()?;
    Ok(session)
}

/// Fetch unseen messages as `(uid, raw bytes)` (blocking).
fn fetch_unseen(config: &EmailConfig) -> Result<Vec<(String, Vec<u8>)>, TransportError> {
    let mut session = open_inbox(config)?;

    let uids = session.search_unseen()?;
    let mut fetched = Vec::with_capacity(uids.len());
    for uid in uids {
        match session.fetch_raw(&uid)? {
            Some(raw) => fetched.push((uid, raw)),
            None => warn!(uid = %uid, "FETCH returned no message body"),
        }
    }

    session.logout();
    Ok(fetched)
}

/// Set `\Seen` on the given UIDs (blocking).
fn mark_seen(config: &EmailConfig, uids: &[String]) -> Result<(), TransportError> {
    let mut session = open_inbox(config)?;
    for uid in uids {
        session.mark_seen(uid)?;
    }
    session.logout();
    Ok(())
}

// ── Parsing ─────────────────────────────────────────────────────────

/// Convert a raw RFC 5322 message into an `InboundMessage`.
///
/// Returns `None` when the bytes do not parse or there is no sender address
/// to reply to.
pub fn parse_inbound(id: &str, raw: &[u8]) -> Option<InboundMessage> {
    let parsed = MessageParser::default().parse(raw)?;

    let from = parsed.from().and_then(|addr| addr.first())?;
    let sender = from.address()?.to_string();
    let sender_name = from.name().map(str::to_string);

    let is_multipart = matches!(
        parsed.parts.first().map(|p| &p.body),
        Some(PartType::Multipart(_))
    );
    let mut leaves: Vec<BodyPart> = parsed
        .parts
        .iter()
        .filter(|part| !matches!(part.body, PartType::Multipart(_)))
        .map(to_body_part)
        .collect();

    let body = if !is_multipart && leaves.len() == 1 {
        MessageBody::Single(leaves.remove(0))
    } else {
        MessageBody::Multipart(leaves)
    };

    Some(InboundMessage {
        id: id.to_string(),
        sender_name,
        sender,
        subject: parsed.subject().unwrap_or_default().to_string(),
        body,
        message_id: parsed.message_id().map(str::to_string),
    })
}

/// mail-parser has already decoded text parts to UTF-8.
fn to_body_part(part: &MessagePart) -> BodyPart {
    let disposition = part.content_disposition().and_then(|cd| {
        let ctype = cd.ctype();
        if ctype.eq_ignore_ascii_case("attachment") {
            Some(ContentDisposition::Attachment)
        } else if ctype.eq_ignore_ascii_case("inline") {
            Some(ContentDisposition::Inline)
        } else {
            None
        }
    });

    let mut body_part = BodyPart::new(part_kind(part), part.contents()).with_charset("utf-8");
    body_part.disposition = disposition;
    body_part
}

fn part_kind(part: &MessagePart) -> PartKind {
    match &part.body {
        PartType::Html(_) => PartKind::Html,
        PartType::Text(_) => match part.content_type() {
            // No Content-Type means text/plain.
            None => PartKind::PlainText,
            Some(ct)
                if ct.ctype().eq_ignore_ascii_case("text")
                    && ct
                        .subtype()
                        .is_none_or(|sub| sub.eq_ignore_ascii_case("plain")) =>
            {
                PartKind::PlainText
            }
            Some(_) => PartKind::Other,
        },
        _ => PartKind::Other,
    }
}

// ── SMTP ────────────────────────────────────────────────────────────

/// Build the outgoing message, with threading headers when available.
pub fn build_reply(from: &str, draft: &ReplyDraft) -> Result<Message, TransportError> {
    let from: Mailbox = from.parse().map_err(|e| TransportError::InvalidAddress {
        address: from.to_string(),
        reason: format!("{e}"),
    })?;
    let to: Mailbox = draft.to.parse().map_err(|e| TransportError::InvalidAddress {
        address: draft.to.clone(),
        reason: format!("{e}"),
    })?;

    let mut builder = Message::builder()
        .from(from)
        .to(to)
        .subject(draft.subject.clone())
        .header(ContentType::TEXT_PLAIN);

    if let Some(id) = draft.in_reply_to.as_deref() {
        let id = bracketed(id);
        builder = builder.in_reply_to(id.clone()).references(id);
    }

    builder
        .body(draft.body.clone())
        .map_err(|e| TransportError::Build(e.to_string()))
}

/// `Message-ID` values travel in angle brackets on the wire.
fn bracketed(id: &str) -> String {
    let id = id.trim();
    if id.starts_with('<') && id.ends_with('>') {
        id.to_string()
    } else {
        format!("<{id}>")
    }
}

/// Send a reply over SMTP (blocking). Port 465 uses implicit TLS, anything
/// else STARTTLS.
fn send_smtp(config: &EmailConfig, draft: &ReplyDraft) -> Result<(), TransportError> {
    let email = build_reply(&config.address, draft)?;

    let builder = if config.smtp_port == 465 {
        SmtpTransport::relay(&config.smtp_host)
    } else {
        SmtpTransport::starttls_relay(&config.smtp_host)
    }
    .map_err(|e| TransportError::Connect {
        host: config.smtp_host.clone(),
        port: config.smtp_port,
        reason: e.to_string(),
    })?;

    let transport = builder
        .port(config.smtp_port)
        .credentials(Credentials::new(
            config.address.clone(),
            config.password.expose_secret().to_string(),
        ))
        .build();

    transport
        .send(&email)
        .map_err(|e| TransportError::Send(e.to_string()))?;

    info!(to = %draft.to, "Email sent");
    Ok(())
}

// ── Tests ───────────────────────────────────────────────────────────
