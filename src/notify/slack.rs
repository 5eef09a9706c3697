use std::time::Duration;

use reqwest::Client;
use serde_json::{json, Value};

use super::{Delivered, NotificationSink};
use crate::error::SinkError;
use crate::ingest::types::Item;

/// Body text is capped at this many characters.
pub const MAX_BODY_CHARS: usize = 500;

const HEADER: &str = "🎯 New Job Posting Found";
const BUTTON_LABEL: &str = "View on Twitter";

#[derive(Clone)]
pub struct SlackNotifier {
    webhook_url: String,
    client: Client,
    timeout: Duration,
}

impl SlackNotifier {
    pub fn new(webhook_url: String) -> Self {
        Self {
            webhook_url,
            client: Client::new(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }
}

/// Cut `text` to `MAX_BODY_CHARS` characters, appending `...` when cut.
pub fn truncate_body(text: &str) -> String {
    match text.char_indices().nth(MAX_BODY_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Block Kit payload for one item.
pub fn build_message(item: &Item) -> Value {
    let mut blocks = vec![
        json!({
            "type": "header",
            "text": { "type": "plain_text", "text": HEADER }
        }),
        json!({
            "type": "section",
            "fields": [
                {
                    "type": "mrkdwn",
                    "text": format!("*Posted by:*\n{} (@{})", item.author_name(), item.author_username())
                },
                {
                    "type": "mrkdwn",
                    "text": format!("*Date:*\n{}", item.created_at.format("%Y-%m-%d %H:%M UTC"))
                }
            ]
        }),
        json!({
            "type": "section",
            "text": {
                "type": "mrkdwn",
                "text": format!("*Job Description:*\n{}", truncate_body(&item.text))
            }
        }),
        json!({
            "type": "section",
            "text": {
                "type": "mrkdwn",
                "text": format!("💙 {} | 🔁 {}", item.metrics.likes, item.metrics.reposts)
            }
        }),
    ];

    // Slack rejects a button without a url.
    if let Some(url) = &item.url {
        blocks.push(json!({
            "type": "actions",
            "elements": [{
                "type": "button",
                "text": { "type": "plain_text", "text": BUTTON_LABEL },
                "url": url,
                "style": "primary"
            }]
        }));
    }
    blocks.push(json!({ "type": "divider" }));

    json!({ "blocks": blocks })
}

#[async_trait::async_trait]
impl NotificationSink for SlackNotifier {
    async fn notify(&self, item: &Item) -> Result<Delivered, SinkError> {
        let body = build_message(item);

        let rsp = self
            .client
            .post(&self.webhook_url)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await?;

        let status = rsp.status();
        if status.is_success() {
            return Ok(Delivered {
                status: status.as_u16(),
            });
        }
        let text = rsp.text().await.unwrap_or_default();
        Err(SinkError {
            status: Some(status.as_u16()),
            body: text,
        })
    }

    fn name(&self) -> &'static str {
        "slack"
    }
}
