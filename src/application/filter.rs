//! # Hashtag Filter
//!
//! Optional topic filter applied to every fetched post.

use crate::domain::types::Post;

/// Pure predicate over a post's hashtag entities.
///
/// The configured value is normalized once at construction (leading `#`
/// stripped, lowercased); without a configured hashtag every post passes.
#[derive(Debug, Clone)]
pub struct HashtagFilter {
    hashtag: Option<String>,
}

impl HashtagFilter {
    /// `hashtag` is taken as configured: it may carry a leading `#` and any
    /// casing.
    pub fn new(hashtag: Option<String>) -> Self {
        let hashtag = hashtag.map(|tag| tag.strip_prefix('#').unwrap_or(&tag).to_lowercase());
        Self { hashtag }
    }

    /// True when the post should be delivered.
    pub fn passes(&self, post: &Post) -> bool {
        match &self.hashtag {
            None => true,
            Some(wanted) => post
                .hashtags
                .iter()
                .any(|tag| tag.to_lowercase() == *wanted),
        }
    }
}
