//! # Poll Cycle
//!
//! The engine of the bridge. Owns the cursor, fetches from the source,
//! restores chronological order, filters, formats, and delivers. Failures
//! are isolated to the cycle they happen in; the loop itself never dies.

use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::application::filter::HashtagFilter;
use crate::application::formatter::NoticeFormatter;
use crate::domain::traits::{NoticeSink, TimelineSource};
use crate::domain::types::{ListAddress, PostId};

/// What a single cycle did. The loop only logs these; tests assert on them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Posts were fetched and every post passing the filter was delivered.
    Delivered(usize),
    /// The source returned nothing new.
    Empty,
    /// The fetch failed and the cycle was skipped; the cursor is unchanged.
    FetchFailed,
    /// A delivery failed; the remaining posts of the cycle were dropped.
    DeliveryAborted { delivered: usize },
}

pub struct PollCycle<S, D> {
    source: S,
    sink: D,
    filter: HashtagFilter,
    formatter: NoticeFormatter,
    list: ListAddress,
    cursor: Option<PostId>,
    interval: Duration,
}

impl<S: TimelineSource, D: NoticeSink> PollCycle<S, D> {
    pub fn new(
        source: S,
        sink: D,
        filter: HashtagFilter,
        formatter: NoticeFormatter,
        list: ListAddress,
        cursor: Option<PostId>,
        interval: Duration,
    ) -> Self {
        Self {
            source,
            sink,
            filter,
            formatter,
            list,
            cursor,
            interval,
        }
    }

    /// Poll forever. Only process termination stops the loop.
    pub async fn run(mut self) {
        loop {
            // Fixed pacing sleep, not backoff: it keeps the request rate
            // under the source's documented ceiling.
            tokio::time::sleep(self.interval).await;
            self.poll_once().await;
        }
    }

    /// One fetch/deliver cycle. Never returns an error: every failure is
    /// logged here and isolated to this cycle.
    pub async fn poll_once(&mut self) -> CycleOutcome {
        debug!(
            "Requesting posts in {} newer than {:?}",
            self.list, self.cursor
        );

        let mut posts = match self.source.fetch_since(&self.list, self.cursor).await {
            Ok(posts) => posts,
            Err(e) => {
                warn!("Fetching list {} failed: {e}", self.list);
                return CycleOutcome::FetchFailed;
            }
        };

        if posts.is_empty() {
            return CycleOutcome::Empty;
        }

        // The source returns newest first: the head carries the next cursor,
        // then delivery walks the posts oldest first.
        self.cursor = Some(posts[0].id);
        posts.reverse();

        let mut delivered = 0;
        for post in &posts {
            if !self.filter.passes(post) {
                debug!("Post {} has no matching hashtag, skipping", post.id);
                continue;
            }
            let notice = self.formatter.format(post);
            if let Err(e) = self.sink.deliver(&notice).await {
                // The cursor already moved past this cycle, so the dropped
                // posts will not come back: accepted at-least-once gap.
                error!(
                    "Delivering post {} to {} failed, dropping the rest of this cycle: {e:#}",
                    post.id,
                    self.sink.room_id()
                );
                return CycleOutcome::DeliveryAborted { delivered };
            }
            info!("Delivered post {} to {}", post.id, self.sink.room_id());
            delivered += 1;
        }

        CycleOutcome::Delivered(delivered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::SourceError;
    use crate::domain::types::{NoticeContent, Post};
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    fn post(id: PostId, hashtags: &[&str]) -> Post {
        Post {
            id,
            user_name: "Ada".to_string(),
            screen_name: "ada".to_string(),
            text: format!("post {id}"),
            hashtags: hashtags.iter().map(|t| t.to_string()).collect(),
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, id as u32).unwrap(),
        }
    }

    fn body(id: PostId) -> String {
        format!("Ada: post {id} - https://twitter.com/ada/status/{id}")
    }

    #[derive(Clone, Default)]
    struct ScriptedSource {
        state: Arc<Mutex<SourceState>>,
    }

    #[derive(Default)]
    struct SourceState {
        script: VecDeque<Result<Vec<Post>, SourceError>>,
        calls: Vec<Option<PostId>>,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<Vec<Post>, SourceError>>) -> Self {
            Self {
                state: Arc::new(Mutex::new(SourceState {
                    script: script.into(),
                    calls: Vec::new(),
                })),
            }
        }

        fn calls(&self) -> Vec<Option<PostId>> {
            self.state.lock().unwrap().calls.clone()
        }
    }

    #[async_trait]
    impl TimelineSource for ScriptedSource {
        async fn fetch_since(
            &self,
            _list: &ListAddress,
            cursor: Option<PostId>,
        ) -> Result<Vec<Post>, SourceError> {
            let mut state = self.state.lock().unwrap();
            state.calls.push(cursor);
            state.script.pop_front().unwrap_or_else(|| Ok(Vec::new()))
        }

        async fn owned_lists(&self, _owner: &str) -> Result<Vec<String>, SourceError> {
            Ok(Vec::new())
        }
    }

    #[derive(Clone, Default)]
    struct RecordingSink {
        state: Arc<Mutex<SinkState>>,
    }

    #[derive(Default)]
    struct SinkState {
        delivered: Vec<NoticeContent>,
        fail_after: Option<usize>,
    }

    impl RecordingSink {
        fn failing_after(deliveries: usize) -> Self {
            let sink = Self::default();
            sink.state.lock().unwrap().fail_after = Some(deliveries);
            sink
        }

        fn bodies(&self) -> Vec<String> {
            self.state
                .lock()
                .unwrap()
                .delivered
                .iter()
                .map(|notice| notice.body.clone())
                .collect()
        }
    }

    #[async_trait]
    impl NoticeSink for RecordingSink {
        async fn deliver(&self, notice: &NoticeContent) -> anyhow::Result<()> {
            let mut state = self.state.lock().unwrap();
            if state.fail_after == Some(state.delivered.len()) {
                anyhow::bail!("room rejected the event");
            }
            state.delivered.push(notice.clone());
            Ok(())
        }

        fn room_id(&self) -> String {
            "!room:example.org".to_string()
        }
    }

    fn cycle(
        source: ScriptedSource,
        sink: RecordingSink,
        hashtag: Option<&str>,
        cursor: Option<PostId>,
    ) -> PollCycle<ScriptedSource, RecordingSink> {
        PollCycle::new(
            source,
            sink,
            HashtagFilter::new(hashtag.map(str::to_string)),
            NoticeFormatter::new(None),
            ListAddress {
                owner: "owner".to_string(),
                slug: "slug".to_string(),
            },
            cursor,
            Duration::from_secs(1),
        )
    }

    #[tokio::test]
    async fn test_delivers_oldest_first() {
        let source = ScriptedSource::new(vec![Ok(vec![post(5, &[]), post(4, &[]), post(3, &[])])]);
        let sink = RecordingSink::default();
        let mut cycle = cycle(source, sink.clone(), None, None);

        assert_eq!(cycle.poll_once().await, CycleOutcome::Delivered(3));
        assert_eq!(sink.bodies(), vec![body(3), body(4), body(5)]);
        assert_eq!(cycle.cursor, Some(5));
    }

    #[tokio::test]
    async fn test_cursor_advances_regardless_of_filter_outcome() {
        let source = ScriptedSource::new(vec![
            Ok(vec![post(5, &[]), post(4, &[]), post(3, &[])]),
            Ok(Vec::new()),
        ]);
        let sink = RecordingSink::default();
        let mut cycle = cycle(source.clone(), sink.clone(), Some("release"), None);

        assert_eq!(cycle.poll_once().await, CycleOutcome::Delivered(0));
        assert!(sink.bodies().is_empty());

        assert_eq!(cycle.poll_once().await, CycleOutcome::Empty);
        assert_eq!(source.calls(), vec![None, Some(5)]);
    }

    #[tokio::test]
    async fn test_empty_fetch_leaves_cursor_unchanged() {
        let source = ScriptedSource::new(vec![Ok(Vec::new()), Ok(Vec::new())]);
        let sink = RecordingSink::default();
        let mut cycle = cycle(source.clone(), sink, None, Some(7));

        assert_eq!(cycle.poll_once().await, CycleOutcome::Empty);
        assert_eq!(cycle.poll_once().await, CycleOutcome::Empty);
        assert_eq!(source.calls(), vec![Some(7), Some(7)]);
    }

    #[tokio::test]
    async fn test_fetch_error_skips_cycle_without_advancing() {
        let source = ScriptedSource::new(vec![Err(SourceError::RateLimited), Ok(Vec::new())]);
        let sink = RecordingSink::default();
        let mut cycle = cycle(source.clone(), sink.clone(), None, Some(7));

        assert_eq!(cycle.poll_once().await, CycleOutcome::FetchFailed);
        assert!(sink.bodies().is_empty());

        cycle.poll_once().await;
        assert_eq!(source.calls(), vec![Some(7), Some(7)]);
    }

    #[tokio::test]
    async fn test_first_posts_after_empty_bootstrap() {
        let source = ScriptedSource::new(vec![Ok(vec![post(1, &[])]), Ok(Vec::new())]);
        let sink = RecordingSink::default();
        let mut cycle = cycle(source.clone(), sink.clone(), None, None);

        assert_eq!(cycle.poll_once().await, CycleOutcome::Delivered(1));
        assert_eq!(sink.bodies(), vec![body(1)]);

        cycle.poll_once().await;
        assert_eq!(source.calls(), vec![None, Some(1)]);
    }

    #[tokio::test]
    async fn test_hashtag_filter_drops_unmatched_posts() {
        let source = ScriptedSource::new(vec![Ok(vec![post(2, &["Release"]), post(1, &[])])]);
        let sink = RecordingSink::default();
        let mut cycle = cycle(source, sink.clone(), Some("release"), None);

        assert_eq!(cycle.poll_once().await, CycleOutcome::Delivered(1));
        assert_eq!(sink.bodies(), vec![body(2)]);
        assert_eq!(cycle.cursor, Some(2));
    }

    #[tokio::test]
    async fn test_delivery_failure_aborts_rest_of_cycle() {
        let source = ScriptedSource::new(vec![
            Ok(vec![post(3, &[]), post(2, &[]), post(1, &[])]),
            Ok(Vec::new()),
        ]);
        let sink = RecordingSink::failing_after(1);
        let mut cycle = cycle(source.clone(), sink.clone(), None, None);

        assert_eq!(
            cycle.poll_once().await,
            CycleOutcome::DeliveryAborted { delivered: 1 }
        );
        assert_eq!(sink.bodies(), vec![body(1)]);

        // The dropped posts do not come back: the cursor already advanced.
        cycle.poll_once().await;
        assert_eq!(source.calls(), vec![None, Some(3)]);
    }
}
