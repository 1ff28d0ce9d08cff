//! Comments and public share records

use chrono::{DateTime, Utc};

use super::EntryId;

/// A comment left on a shared entry. Append-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub content: String,
    pub created_at: DateTime<Utc>,
    /// User id of the author
    pub created_by: String,
}

/// Maps a public share token back to the owner's entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareRecord {
    pub token: String,
    pub owner_id: String,
    pub entry_id: EntryId,
}

/// Sort comments oldest first, in place.
pub fn sort_comments(comments: &mut [Comment]) {
    comments.sort_by_key(|comment| comment.created_at);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn comment(content: &str, second: u32) -> Comment {
        Comment {
            content: content.to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, second).unwrap(),
            created_by: "reader".to_string(),
        }
    }

    #[test]
    fn sorts_ascending_by_creation_time() {
        let mut comments = vec![comment("third", 30), comment("first", 1), comment("second", 2)];
        sort_comments(&mut comments);
        let order: Vec<&str> = comments.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(order, vec!["first", "second", "third"]);
    }
}
