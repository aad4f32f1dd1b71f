//! # Twitter Timeline Adapter
//!
//! Implements [`TimelineSource`] against the v1.1 list-timeline API using
//! application-only authentication. Every upstream failure shape is
//! normalized into [`SourceError`] at this boundary; nothing above this
//! module sees a raw response.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::Deserialize;

use crate::domain::config::Credentials;
use crate::domain::error::SourceError;
use crate::domain::traits::TimelineSource;
use crate::domain::types::{ListAddress, Post, PostId};

const API_BASE: &str = "https://api.twitter.com";

/// The v1.1 timestamp representation, e.g. `Wed Aug 27 13:08:45 +0000 2008`.
const CREATED_AT_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

/// Error code the API uses for "page does not exist", which is what an
/// unknown list slug comes back as.
const ERROR_CODE_NOT_FOUND: i64 = 34;

pub struct TwitterTimeline {
    client: reqwest::Client,
    bearer: String,
    base: String,
}

impl TwitterTimeline {
    /// Exchange the consumer key pair for an application-only bearer token.
    /// The list-timeline endpoint accepts app-only auth, so the user token
    /// pair in [`Credentials`] is never presented.
    pub async fn connect(credentials: &Credentials) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .user_agent(concat!("tweetrix/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let response = client
            .post(format!("{API_BASE}/oauth2/token"))
            .basic_auth(&credentials.consumer_key, Some(&credentials.consumer_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;
        let token: BearerToken = check(response).await?.json().await?;

        Ok(Self {
            client,
            bearer: token.access_token,
            base: API_BASE.to_string(),
        })
    }
}

#[async_trait]
impl TimelineSource for TwitterTimeline {
    async fn fetch_since(
        &self,
        list: &ListAddress,
        cursor: Option<PostId>,
    ) -> Result<Vec<Post>, SourceError> {
        let mut query = vec![
            ("slug", list.slug.clone()),
            ("owner_screen_name", list.owner.clone()),
            ("include_entities", "true".to_string()),
        ];
        if let Some(id) = cursor {
            query.push(("since_id", id.to_string()));
        }

        let response = self
            .client
            .get(format!("{}/1.1/lists/statuses.json", self.base))
            .bearer_auth(&self.bearer)
            .query(&query)
            .send()
            .await?;
        let statuses: Vec<ApiStatus> = check(response).await?.json().await?;
        statuses.into_iter().map(map_status).collect()
    }

    async fn owned_lists(&self, owner: &str) -> Result<Vec<String>, SourceError> {
        let response = self
            .client
            .get(format!("{}/1.1/lists/ownerships.json", self.base))
            .bearer_auth(&self.bearer)
            .query(&[("screen_name", owner)])
            .send()
            .await?;
        let ownerships: ApiOwnerships = check(response).await?.json().await?;
        Ok(ownerships.lists.into_iter().map(|list| list.name).collect())
    }
}

/// Pass successful responses through, classify everything else.
async fn check(response: reqwest::Response) -> Result<reqwest::Response, SourceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(classify_failure(status, &body))
}

/// Non-success responses carry `{"errors": [{"code": .., "message": ..}]}`,
/// except when they don't; fall back to the raw body text.
fn classify_failure(status: StatusCode, body: &str) -> SourceError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return SourceError::RateLimited;
    }
    if status == StatusCode::NOT_FOUND {
        return SourceError::NotFound;
    }
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) {
        if envelope
            .errors
            .iter()
            .any(|error| error.code == ERROR_CODE_NOT_FOUND)
        {
            return SourceError::NotFound;
        }
        if let Some(first) = envelope.errors.first() {
            return SourceError::Unknown(first.message.clone());
        }
    }
    SourceError::Unknown(format!("HTTP {status}: {body}"))
}

fn map_status(status: ApiStatus) -> Result<Post, SourceError> {
    let created_at = DateTime::parse_from_str(&status.created_at, CREATED_AT_FORMAT)
        .map_err(|e| {
            SourceError::Unknown(format!("bad created_at {:?}: {e}", status.created_at))
        })?
        .with_timezone(&Utc);

    Ok(Post {
        id: status.id,
        user_name: status.user.name,
        screen_name: status.user.screen_name,
        text: status.text,
        hashtags: status
            .entities
            .hashtags
            .into_iter()
            .map(|hashtag| hashtag.text)
            .collect(),
        created_at,
    })
}

#[derive(Debug, Deserialize)]
struct BearerToken {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct ApiStatus {
    id: u64,
    text: String,
    created_at: String,
    user: ApiUser,
    #[serde(default)]
    entities: ApiEntities,
}

#[derive(Debug, Deserialize)]
struct ApiUser {
    name: String,
    screen_name: String,
}

#[derive(Debug, Default, Deserialize)]
struct ApiEntities {
    #[serde(default)]
    hashtags: Vec<ApiHashtag>,
}

#[derive(Debug, Deserialize)]
struct ApiHashtag {
    text: String,
}

#[derive(Debug, Deserialize)]
struct ApiOwnerships {
    #[serde(default)]
    lists: Vec<ApiOwnedList>,
}

#[derive(Debug, Deserialize)]
struct ApiOwnedList {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    errors: Vec<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: i64,
    message: String,
}
