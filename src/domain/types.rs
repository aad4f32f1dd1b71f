//! # Domain Types
//!
//! Value types flowing through the pipeline.

use chrono::{DateTime, Utc};

/// Identifier of a post on the source timeline. The service assigns ids in
/// increasing order, so the newest seen id doubles as the polling cursor.
pub type PostId = u64;

/// A single post from the polled list, as normalized by the source adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub id: PostId,
    /// Display name of the author.
    pub user_name: String,
    /// Handle of the author, without the leading `@`.
    pub screen_name: String,
    pub text: String,
    /// Hashtags attached to the post, without the leading `#`, in the order
    /// the source reports them.
    pub hashtags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Address of a list on the source service, configured as `owner/slug`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListAddress {
    pub owner: String,
    pub slug: String,
}

impl std::fmt::Display for ListAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.slug)
    }
}

/// A formatted notification ready for delivery. Built fresh per post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoticeContent {
    /// Plain-text body.
    pub body: String,
    /// HTML body rendered from the configured template, if any.
    pub formatted: Option<String>,
}
