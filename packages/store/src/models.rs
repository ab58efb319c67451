//! # Note records
//!
//! Notes live under the notes collection (`"notes/{id}"` by default) as
//! camel-cased JSON objects:
//!
//! ```json
//! { "id": "…", "title": "…", "content": "…", "userId": "…",
//!   "createdAt": 1700000000000, "updatedAt": 1700000000000 }
//! ```
//!
//! [`Note`] is the full record. [`NotePatch`] is the only shape ever used to
//! modify an existing note: it carries `title`, `content` and `updatedAt`, so
//! `id`, `userId` and `createdAt` are never rewritten after creation.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Title stored when the user leaves it blank.
pub const DEFAULT_NOTE_TITLE: &str = "Untitled Note";

/// A note as stored in the tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Store-generated key; mirrors the record's path segment.
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    /// Owner identity id.
    #[serde(default)]
    pub user_id: String,
    /// Epoch milliseconds, set once.
    #[serde(default)]
    pub created_at: i64,
    /// Epoch milliseconds, bumped on every edit.
    #[serde(default)]
    pub updated_at: i64,
}

impl Note {
    /// Build a fresh note. Title and content are trimmed, a blank title
    /// becomes [`DEFAULT_NOTE_TITLE`].
    pub fn new(id: String, user_id: String, title: &str, content: &str, now_ms: i64) -> Self {
        Self {
            id,
            title: normalize_title(title),
            content: content.trim().to_string(),
            user_id,
            created_at: now_ms,
            updated_at: now_ms,
        }
    }
}

/// Partial update applied when a note is edited.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotePatch {
    pub title: String,
    pub content: String,
    pub updated_at: i64,
}

impl NotePatch {
    pub fn new(title: &str, content: &str, now_ms: i64) -> Self {
        Self {
            title: normalize_title(title),
            content: content.trim().to_string(),
            updated_at: now_ms,
        }
    }

    /// The patch as store update fields.
    pub fn into_fields(self) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert("title".into(), Value::String(self.title));
        fields.insert("content".into(), Value::String(self.content));
        fields.insert("updatedAt".into(), Value::from(self.updated_at));
        fields
    }
}

/// Trim a title, falling back to [`DEFAULT_NOTE_TITLE`] when blank.
pub fn normalize_title(title: &str) -> String {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        DEFAULT_NOTE_TITLE.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_note_wire_format() {
        let note = Note::new("k1".into(), "u1".into(), "  Title ", " body\n", 42);
        assert_eq!(
            serde_json::to_value(&note).unwrap(),
            json!({
                "id": "k1",
                "title": "Title",
                "content": "body",
                "userId": "u1",
                "createdAt": 42,
                "updatedAt": 42
            })
        );
    }

    #[test]
    fn test_blank_title_defaults() {
        assert_eq!(normalize_title("   "), DEFAULT_NOTE_TITLE);
        assert_eq!(NotePatch::new("", "x", 1).title, DEFAULT_NOTE_TITLE);
    }

    #[test]
    fn test_patch_never_touches_identity_fields() {
        let fields = NotePatch::new("t", "c", 7).into_fields();
        let mut keys: Vec<&str> = fields.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["content", "title", "updatedAt"]);
    }

    #[test]
    fn test_missing_fields_decode_to_defaults() {
        let note: Note = serde_json::from_value(json!({"title": "only"})).unwrap();
        assert_eq!(note.title, "only");
        assert_eq!(note.content, "");
        assert_eq!(note.updated_at, 0);
    }
}
