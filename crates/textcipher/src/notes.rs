//! Sealing and opening of note records.
//!
//! The record layer calls [`NoteSealer::seal`] before persisting a note and
//! [`NoteSealer::open`] when loading one for display or editing. Only the
//! note body is encrypted; title and tags stay searchable.

use common::{protocol::SealedNote, CipherError};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::cipher::TextCipher;

/// Editable, plaintext form of a note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Note identifier.
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    /// Note title.
    pub title: String,
    /// Plaintext note body.
    pub content: String,
    /// Comma-separated tags.
    #[serde(default)]
    pub tags: String,
}

impl Note {
    /// Create an untagged note with a fresh identifier.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            content: content.into(),
            tags: String::new(),
        }
    }

    /// Replace the note's tags.
    pub fn with_tags(mut self, tags: impl Into<String>) -> Self {
        self.tags = tags.into();
        self
    }

    /// Individual tags, trimmed, with empty entries dropped.
    pub fn tag_list(&self) -> Vec<&str> {
        split_tags(&self.tags)
    }
}

/// Body of an opened note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteContent {
    /// The body decrypted successfully.
    Readable(String),
    /// The body could not be recovered; the reason is kept for display.
    Unavailable(CipherError),
}

impl NoteContent {
    /// The plaintext body, if readable.
    pub fn text(&self) -> Option<&str> {
        match self {
            NoteContent::Readable(s) => Some(s),
            NoteContent::Unavailable(_) => None,
        }
    }
}

/// A note loaded from storage, with its body decrypted where possible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenedNote {
    pub id: Uuid,
    pub title: String,
    pub content: NoteContent,
    pub tags: String,
}

impl OpenedNote {
    /// Individual tags, trimmed, with empty entries dropped.
    pub fn tag_list(&self) -> Vec<&str> {
        split_tags(&self.tags)
    }

    /// Convert back into an editable [`Note`] if the body is readable.
    pub fn into_note(self) -> Option<Note> {
        match self.content {
            NoteContent::Readable(content) => Some(Note {
                id: self.id,
                title: self.title,
                content,
                tags: self.tags,
            }),
            NoteContent::Unavailable(_) => None,
        }
    }
}

/// Applies a [`TextCipher`] to note records.
#[derive(Debug, Clone)]
pub struct NoteSealer {
    cipher: TextCipher,
}

impl NoteSealer {
    pub fn new(cipher: TextCipher) -> Self {
        Self { cipher }
    }

    /// Encrypt the note body for storage.
    ///
    /// # Errors
    ///
    /// Propagates [`CipherError::Configuration`] from the cipher.
    pub fn seal(&self, note: &Note) -> Result<SealedNote, CipherError> {
        Ok(SealedNote {
            id: note.id,
            title: note.title.clone(),
            content: self.cipher.encrypt(&note.content)?,
            tags: note.tags.clone(),
        })
    }

    /// Decrypt a stored note.
    ///
    /// Never fails: a body that cannot be decrypted is reported as
    /// [`NoteContent::Unavailable`] so the caller can show a corrupted-content
    /// state instead of aborting.
    pub fn open(&self, sealed: &SealedNote) -> OpenedNote {
        let content = match self.cipher.decrypt(&sealed.content) {
            Ok(text) => NoteContent::Readable(text),
            Err(e) => {
                warn!(note_id = %sealed.id, error = %e, "note content unavailable");
                NoteContent::Unavailable(e)
            }
        };
        OpenedNote {
            id: sealed.id,
            title: sealed.title.clone(),
            content,
            tags: sealed.tags.clone(),
        }
    }

    /// Open many stored notes, preserving order.
    pub fn open_all<'a, I>(&self, sealed: I) -> Vec<OpenedNote>
    where
        I: IntoIterator<Item = &'a SealedNote>,
    {
        sealed.into_iter().map(|s| self.open(s)).collect()
    }
}

fn split_tags(tags: &str) -> Vec<&str> {
    tags.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::CipherKey;
    use std::time::Duration;

    fn sealer() -> NoteSealer {
        NoteSealer::new(TextCipher::new(CipherKey::generate()))
    }

    #[test]
    fn seal_encrypts_only_content() {
        let sealer = sealer();
        let note = Note::new("Groceries", "eggs, milk").with_tags("home, errands");
        let sealed = sealer.seal(&note).unwrap();
        assert_eq!(sealed.id, note.id);
        assert_eq!(sealed.title, "Groceries");
        assert_eq!(sealed.tags, "home, errands");
        assert_ne!(sealed.content, note.content);
        assert!(!sealed.content.contains("eggs"));
    }

    #[test]
    fn open_recovers_sealed_note() {
        let sealer = sealer();
        let note = Note::new("Diary", "This is a secret note.");
        let opened = sealer.open(&sealer.seal(&note).unwrap());
        assert_eq!(opened.content.text(), Some("This is a secret note."));
        assert_eq!(opened.into_note(), Some(note));
    }

    #[test]
    fn tampered_content_is_unavailable() {
        let sealer = sealer();
        let mut sealed = sealer.seal(&Note::new("t", "body")).unwrap();
        let flipped = if sealed.content.as_bytes()[40] == b'A' { "B" } else { "A" };
        sealed.content.replace_range(40..41, flipped);
        let opened = sealer.open(&sealed);
        assert_eq!(
            opened.content,
            NoteContent::Unavailable(CipherError::InvalidToken)
        );
        assert_eq!(opened.title, "t");
        assert!(opened.into_note().is_none());
    }

    #[test]
    fn foreign_key_content_is_unavailable() {
        let sealed = sealer().seal(&Note::new("t", "body")).unwrap();
        let opened = sealer().open(&sealed);
        assert!(opened.content.text().is_none());
    }

    #[test]
    fn expired_content_is_unavailable() {
        let cipher = TextCipher::with_ttl(CipherKey::generate(), Duration::from_secs(60));
        let token = cipher.encrypt_at("stale", 0).unwrap();
        let sealed = SealedNote {
            id: Uuid::new_v4(),
            title: "old".into(),
            content: token,
            tags: String::new(),
        };
        let opened = NoteSealer::new(cipher).open(&sealed);
        assert_eq!(
            opened.content,
            NoteContent::Unavailable(CipherError::ExpiredToken)
        );
    }

    #[test]
    fn open_all_keeps_order_and_isolates_failures() {
        let sealer = sealer();
        let first = sealer.seal(&Note::new("a", "first")).unwrap();
        let mut broken = sealer.seal(&Note::new("b", "second")).unwrap();
        broken.content = "garbage".into();
        let third = sealer.seal(&Note::new("c", "third")).unwrap();

        let opened = sealer.open_all([&first, &broken, &third]);
        let titles: Vec<_> = opened.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, ["a", "b", "c"]);
        assert_eq!(opened[0].content.text(), Some("first"));
        assert!(opened[1].content.text().is_none());
        assert_eq!(opened[2].content.text(), Some("third"));
    }

    #[test]
    fn tag_list_trims_and_skips_empty() {
        let note = Note::new("t", "c").with_tags(" rust , ,notes,");
        assert_eq!(note.tag_list(), ["rust", "notes"]);
        assert!(Note::new("t", "c").tag_list().is_empty());
    }

    #[test]
    fn note_json_without_id_gets_one() {
        let note: Note = serde_json::from_str(r#"{"title":"t","content":"c"}"#).unwrap();
        assert!(!note.id.is_nil());
        assert!(note.tags.is_empty());
    }
}
