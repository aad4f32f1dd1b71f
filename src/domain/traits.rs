//! # Domain Traits
//!
//! Abstract interfaces for the two external capabilities the bridge
//! consumes. Allows for pluggable implementations in the Infrastructure
//! layer and in-memory doubles in tests.

use async_trait::async_trait;

use super::error::SourceError;
use super::types::{ListAddress, NoticeContent, Post, PostId};

/// A polled list timeline (e.g. Twitter).
#[async_trait]
pub trait TimelineSource: Send + Sync {
    /// Fetch posts strictly newer than `cursor`, newest first.
    /// `None` fetches the current head of the list.
    async fn fetch_since(
        &self,
        list: &ListAddress,
        cursor: Option<PostId>,
    ) -> Result<Vec<Post>, SourceError>;

    /// Names of the lists owned by `owner`. Only used to hint the operator
    /// when the configured list cannot be found.
    async fn owned_lists(&self, owner: &str) -> Result<Vec<String>, SourceError>;
}

/// The room the bridge delivers notices into (e.g. a Matrix room).
#[async_trait]
pub trait NoticeSink: Send + Sync {
    /// Deliver one notice to the room.
    async fn deliver(&self, notice: &NoticeContent) -> anyhow::Result<()>;

    /// The target room id, for log lines.
    fn room_id(&self) -> String;
}
