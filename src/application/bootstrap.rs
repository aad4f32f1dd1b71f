//! # Bootstrap
//!
//! Startup priming of the polling cursor.

use tracing::{info, warn};

use crate::domain::error::{BootstrapError, SourceError};
use crate::domain::traits::TimelineSource;
use crate::domain::types::{ListAddress, PostId};

/// Seed the cursor with the newest post currently in the list, `None` when
/// the list is empty.
///
/// An unknown list becomes [`BootstrapError::ListNotFound`] carrying the
/// owner's actual list names, so the caller can point the operator at the
/// misconfiguration. Any other source failure is fatal.
pub async fn prime_cursor<S: TimelineSource>(
    source: &S,
    list: &ListAddress,
) -> Result<Option<PostId>, BootstrapError> {
    match source.fetch_since(list, None).await {
        Ok(posts) => {
            let cursor = posts.first().map(|post| post.id);
            match cursor {
                Some(id) => info!("Cursor primed at post {id}"),
                None => info!("List {list} is currently empty, starting without a cursor"),
            }
            Ok(cursor)
        }
        Err(SourceError::NotFound) => {
            let available = match source.owned_lists(&list.owner).await {
                Ok(names) => names,
                Err(e) => {
                    warn!("Could not fetch the lists owned by {}: {e}", list.owner);
                    Vec::new()
                }
            };
            Err(BootstrapError::ListNotFound {
                list: list.to_string(),
                available,
            })
        }
        Err(e) => Err(BootstrapError::Source(e)),
    }
}
