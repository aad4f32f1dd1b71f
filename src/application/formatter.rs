//! # Notice Formatter
//!
//! Turns a post into the notice delivered to the room: a plain body, plus an
//! HTML body when a template is configured.

use crate::domain::types::{NoticeContent, Post};

/// Pure formatter; the template was validated at startup, so formatting
/// cannot fail.
#[derive(Debug, Clone)]
pub struct NoticeFormatter {
    template: Option<String>,
}

impl NoticeFormatter {
    pub fn new(template: Option<String>) -> Self {
        Self { template }
    }

    /// Build the notice for one post. Identical posts always yield
    /// identical content.
    pub fn format(&self, post: &Post) -> NoticeContent {
        let url = permalink(post);
        let body = format!("{}: {} - {}", post.user_name, post.text, url);
        let formatted = self.template.as_ref().map(|template| {
            template
                .replace("{user_name}", &post.user_name)
                .replace("{screen_name}", &post.screen_name)
                .replace("{text}", &post.text.replace('\n', "<br/>"))
                .replace("{url}", &url)
        });
        NoticeContent { body, formatted }
    }
}

fn permalink(post: &Post) -> String {
    format!(
        "https://twitter.com/{}/status/{}",
        post.screen_name, post.id
    )
}
