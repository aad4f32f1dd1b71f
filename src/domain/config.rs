//! # Configuration
//!
//! Manages the loading and validation of the application's configuration
//! file (`config.yaml`). Defines the structs for the source list, the
//! destination room, and system-level settings.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use regex::Regex;
use serde::Deserialize;

use super::types::ListAddress;

/// Main application configuration structure.
/// Matches the layout of `config.yaml`; loaded once and never mutated.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub services: ServicesConfig,
    #[serde(default)]
    pub system: SystemConfig,
}

/// Configuration for the connected services.
#[derive(Debug, Deserialize, Clone)]
pub struct ServicesConfig {
    pub twitter: TwitterConfig,
    pub matrix: MatrixConfig,
}

/// Source-side settings: which list to poll and how to authenticate.
#[derive(Debug, Deserialize, Clone)]
pub struct TwitterConfig {
    /// List to poll, as `owner/slug`.
    pub list: String,
    /// Optional topic filter. A leading `#` is accepted and stripped.
    #[serde(default)]
    pub hashtag: Option<String>,
    pub app: Credentials,
}

/// The four opaque tokens of a registered Twitter application.
#[derive(Debug, Deserialize, Clone)]
pub struct Credentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    // Application-only auth never presents the user token pair, but existing
    // deployments configure all four tokens, so keep accepting them.
    #[allow(dead_code)]
    pub access_token: String,
    #[allow(dead_code)]
    pub access_token_secret: String,
}

/// Destination-side settings for the Matrix service.
#[derive(Debug, Deserialize, Clone)]
pub struct MatrixConfig {
    pub homeserver: String,
    pub username: String,
    pub password: String,
    pub room_id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    /// Optional HTML template for the rich notice body. May reference
    /// `{user_name}`, `{screen_name}`, `{text}` and `{url}`.
    #[serde(default)]
    pub notice_template: Option<String>,
}

/// System-level settings for the bridge.
#[derive(Debug, Deserialize, Clone)]
pub struct SystemConfig {
    /// Pause between polls. The list-timeline endpoint allows 900 requests
    /// per 15 minutes, so the 1 second default stays under that ceiling.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
        }
    }
}

fn default_poll_interval() -> u64 {
    1
}

impl AppConfig {
    /// Read and parse the configuration file, then run the load-time
    /// validations so a bad list address or notice template fails at
    /// startup instead of mid-cycle.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: AppConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        self.services.twitter.list_address()?;
        if let Some(template) = &self.services.matrix.notice_template {
            validate_template(template)?;
        }
        Ok(())
    }
}

impl TwitterConfig {
    /// Parse the configured `owner/slug` pair.
    pub fn list_address(&self) -> Result<ListAddress> {
        match self.list.split_once('/') {
            Some((owner, slug)) if !owner.is_empty() && !slug.is_empty() => Ok(ListAddress {
                owner: owner.to_string(),
                slug: slug.to_string(),
            }),
            _ => bail!(
                "twitter.list must be of the form owner/slug, got {:?}",
                self.list
            ),
        }
    }
}

const TEMPLATE_PLACEHOLDERS: [&str; 4] = ["user_name", "screen_name", "text", "url"];

/// Reject templates referencing unknown placeholders. Formatting itself
/// never fails, so this is the only place a bad template can surface.
fn validate_template(template: &str) -> Result<()> {
    let placeholder = Regex::new(r"\{([a-z_]+)\}")?;
    for capture in placeholder.captures_iter(template) {
        let name = &capture[1];
        if !TEMPLATE_PLACEHOLDERS.contains(&name) {
            bail!("notice_template references unknown placeholder {{{name}}}");
        }
    }
    Ok(())
}
