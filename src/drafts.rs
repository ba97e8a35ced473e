//! File-backed store for replies held for manual review.
//!
//! Each draft is a small text file under the drafts directory:
//! `draft_<id>.txt` with `To:` and `Subject:` lines, a blank line, then the body.

use std::path::PathBuf;

use chrono::Utc;
use tokio::fs;

use crate::error::DraftError;
use crate::pipeline::types::ReplyDraft;

pub struct DraftStore {
    dir: PathBuf,
}

impl DraftStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Write a draft, creating the directory if needed. Returns the file path.
    ///
    /// `transport_id` names the file when the draft has no `Message-ID`.
    pub async fn save(
        &self,
        draft: &ReplyDraft,
        transport_id: &str,
    ) -> Result<PathBuf, DraftError> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| DraftError::CreateDir {
                path: self.dir.display().to_string(),
                source,
            })?;

        let path = self
            .dir
            .join(draft_file_name(draft.in_reply_to.as_deref(), transport_id));
        fs::write(&path, render_draft(draft))
            .await
            .map_err(|source| DraftError::Write {
                path: path.display().to_string(),
                source,
            })?;
        Ok(path)
    }
}

/// `draft_<safe id>.txt`. Without a `Message-ID` the name is a UTC timestamp
/// plus the transport id, so id-less drafts saved in the same second stay
/// distinct.
pub fn draft_file_name(message_id: Option<&str>, transport_id: &str) -> String {
    let id = message_id
        .map(safe_id)
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| {
            let stamp = Utc::now().format("%Y%m%d%H%M%S");
            match safe_id(transport_id) {
                uid if uid.is_empty() => stamp.to_string(),
                uid => format!("{stamp}_{uid}"),
            }
        });
    format!("draft_{id}.txt")
}

/// Filesystem-safe form of a `Message-ID`: angle brackets dropped, anything
/// outside `[A-Za-z0-9_-]` replaced with `_`.
pub fn safe_id(message_id: &str) -> String {
    message_id
        .trim()
        .trim_start_matches('<')
        .trim_end_matches('>')
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn render_draft(draft: &ReplyDraft) -> String {
    format!(
        "To: {}\nSubject: {}\n\n{}",
        draft.to, draft.subject, draft.body
    )
}
