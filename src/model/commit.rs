//! Commit (code revision) data model

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Author or committer identity as recorded by the forge
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Identity {
    pub email: String,

    pub name: String,

    /// Forge account name, absent for identities without an account
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl Identity {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: name.into(),
            username: None,
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }
}

/// Immutable identity of a benchmarked revision
///
/// Field order matches the persisted document, which is sorted by key.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Commit {
    pub author: Identity,

    pub committer: Identity,

    /// Whether the push event considered this commit distinct
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distinct: Option<bool>,

    /// Content hash of the revision
    pub id: String,

    pub message: String,

    /// ISO 8601 timestamp, kept as written so the document round-trips exactly
    pub timestamp: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tree_id: Option<String>,

    /// Provenance link (commit page on the forge)
    pub url: String,
}

impl Commit {
    /// Parse the commit timestamp
    ///
    /// Returns `None` when the timestamp is not a valid RFC 3339 point in time.
    pub fn parsed_timestamp(&self) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc3339(&self.timestamp).ok()
    }

    /// First 7 characters of the commit id
    pub fn short_id(&self) -> &str {
        let end = self
            .id
            .char_indices()
            .nth(7)
            .map_or(self.id.len(), |(idx, _)| idx);
        &self.id[..end]
    }

    /// First line of the commit message
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_commit() -> Commit {
        Commit {
            author: Identity::new("Alice", "alice@example.com").with_username("alice"),
            committer: Identity::new("GitHub", "noreply@github.com"),
            distinct: Some(true),
            id: "7f3c2a91b5e04d6f8a1c3e5b7d9f0a2c4e6b8d0f".to_string(),
            message: "Speed up CSV reader\n\nUses a pooled buffer.".to_string(),
            timestamp: "2024-03-05T10:15:30+09:00".to_string(),
            tree_id: Some("0a1b2c3d".to_string()),
            url: "https://github.com/acme/reader/commit/7f3c2a9".to_string(),
        }
    }

    #[test]
    fn test_parsed_timestamp_valid() {
        let commit = sample_commit();
        let ts = commit.parsed_timestamp().unwrap();
        assert_eq!(ts.timestamp(), 1_709_601_330);
    }

    #[test]
    fn test_parsed_timestamp_invalid() {
        let commit = Commit {
            timestamp: "yesterday".to_string(),
            ..sample_commit()
        };
        assert!(commit.parsed_timestamp().is_none());
    }

    #[test]
    fn test_short_id() {
        assert_eq!(sample_commit().short_id(), "7f3c2a9");

        let short = Commit {
            id: "abc".to_string(),
            ..sample_commit()
        };
        assert_eq!(short.short_id(), "abc");
    }

    #[test]
    fn test_summary_is_first_line() {
        assert_eq!(sample_commit().summary(), "Speed up CSV reader");
    }

    #[test]
    fn test_serialized_key_order() {
        let json = serde_json::to_string(&sample_commit()).unwrap();
        let author = json.find("\"author\"").unwrap();
        let committer = json.find("\"committer\"").unwrap();
        let id = json.find("\"id\"").unwrap();
        let url = json.find("\"url\"").unwrap();
        assert!(author < committer && committer < id && id < url);
    }

    #[test]
    fn test_missing_username_is_omitted() {
        let json = serde_json::to_string(&Identity::new("GitHub", "noreply@github.com")).unwrap();
        assert_eq!(json, r#"{"email":"noreply@github.com","name":"GitHub"}"#);
    }
}
