//! Telegram notifications for new and updated pages.
//!
//! Messages use Telegram's `MarkdownV2` dialect. Every piece of text that
//! comes from the wiki (title, description) is escaped before it is placed
//! in the template, so a title such as `C++ [draft]` cannot break rendering
//! or get the message rejected by the Bot API. The page link is inserted
//! verbatim inside the link construct.
//!
//! The reserved set follows the Bot API's `MarkdownV2` list, which includes
//! `|` and the backslash itself.

use crate::http::{api_error, build_client};
use crate::{Config, MessageLabels, Page, Result, TelegramConfig};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::info;

/// Characters `MarkdownV2` treats as markup.
pub const RESERVED_CHARS: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!', '\\',
];

/// Parse mode sent with every message.
pub const PARSE_MODE: &str = "MarkdownV2";

/// Prefix every reserved character with a backslash.
///
/// ```rust
/// use wikinotify_core::notify::escape_markdown_v2;
///
/// assert_eq!(escape_markdown_v2("v1.2 (beta)"), r"v1\.2 \(beta\)");
/// ```
#[must_use]
pub fn escape_markdown_v2(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + text.len() / 4);
    for c in text.chars() {
        if RESERVED_CHARS.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// What happened to a page, as far as the reader is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// Page was not in the cache
    Created,
    /// Page was edited within the check window
    Updated,
}

/// Render the notification text for a page change.
#[must_use]
pub fn format_message(
    kind: ChangeKind,
    page: &Page,
    site_url: &str,
    labels: &MessageLabels,
) -> String {
    let (icon, heading) = match kind {
        ChangeKind::Created => ("🆕", &labels.new_page),
        ChangeKind::Updated => ("🔄", &labels.updated_page),
    };
    let description = page
        .description_text()
        .map(|d| format!("\n\n{}", escape_markdown_v2(d)))
        .unwrap_or_default();

    format!(
        "{icon} *{heading}:*\n{title}{description}\n\n🔗 [{read}]({link})",
        heading = escape_markdown_v2(heading),
        title = escape_markdown_v2(&page.title),
        read = escape_markdown_v2(&labels.read),
        link = page.link(site_url),
    )
}

/// Destination for formatted notifications.
#[async_trait]
pub trait Notifier {
    /// Deliver one message.
    async fn send(&self, text: &str) -> Result<()>;
}

#[derive(Serialize)]
struct SendMessage<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    message_thread_id: Option<i64>,
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
    disable_web_page_preview: bool,
}

/// Telegram Bot API `sendMessage` client
pub struct TelegramNotifier {
    client: Client,
    endpoint: String,
    channel_id: String,
    thread_id: Option<i64>,
}

impl TelegramNotifier {
    /// Creates a notifier for the configured channel using the configured timeout
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_timeout(&config.telegram, config.request_timeout())
    }

    /// Creates a notifier with a custom request timeout (primarily for tests)
    pub fn with_timeout(telegram: &TelegramConfig, timeout: Duration) -> Result<Self> {
        let endpoint = format!(
            "{}/bot{}/sendMessage",
            telegram.api_url.trim_end_matches('/'),
            telegram.bot_token
        );
        Ok(Self {
            client: build_client(timeout)?,
            endpoint,
            channel_id: telegram.channel_id.clone(),
            thread_id: telegram.thread_id,
        })
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> Result<()> {
        let payload = SendMessage {
            message_thread_id: self.thread_id,
            chat_id: &self.channel_id,
            text,
            parse_mode: PARSE_MODE,
            disable_web_page_preview: true,
        };

        let response = self.client.post(&self.endpoint).json(&payload).send().await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        info!(chat_id = %self.channel_id, "Message sent to Telegram");
        Ok(())
    }
}

/// Writes messages to the log instead of sending them
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, text: &str) -> Result<()> {
        info!(message = text, "Dry run, notification not sent");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::{Error, PageId};
    use proptest::prelude::*;
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_json, method, path},
    };

    fn sample_page(description: Option<&str>) -> Page {
        Page {
            id: PageId::Number(12),
            title: "Setup_guide v2.0 (draft)".to_string(),
            description: description.map(ToString::to_string),
            path: "en/setup-guide".to_string(),
            created_at: "2024-05-01T10:00:00Z".to_string(),
            updated_at: "2024-05-02T10:00:00Z".to_string(),
        }
    }

    /// Every reserved char must be escaped exactly once and every backslash
    /// must introduce a reserved char.
    fn is_properly_escaped(text: &str) -> bool {
        let mut chars = text.chars();
        while let Some(c) = chars.next() {
            if c == '\\' {
                match chars.next() {
                    Some(next) if RESERVED_CHARS.contains(&next) => {},
                    _ => return false,
                }
            } else if RESERVED_CHARS.contains(&c) {
                return false;
            }
        }
        true
    }

    #[test]
    fn test_escape_covers_every_reserved_char() {
        let all: String = RESERVED_CHARS.iter().collect();
        let escaped = escape_markdown_v2(&all);
        assert_eq!(escaped.chars().count(), all.chars().count() * 2);
        assert!(is_properly_escaped(&escaped));
        assert_eq!(escape_markdown_v2("_*[]"), r"\_\*\[\]");
    }

    #[test]
    fn test_escape_leaves_other_chars_untouched() {
        let plain = "Привет, мир: 100% ok? <tag> & 'quotes' \"too\" 🆕";
        assert_eq!(escape_markdown_v2(plain), plain);
    }

    #[test]
    fn test_already_escaped_input_is_escaped_again() {
        // A literal backslash in a title is content, not an escape sequence.
        assert_eq!(escape_markdown_v2(r"\."), r"\\\.");
    }

    #[test]
    fn test_new_page_message_layout() {
        let page = sample_page(Some("How to install."));
        let text = format_message(
            ChangeKind::Created,
            &page,
            "https://wiki.example.org/",
            &MessageLabels::default(),
        );
        assert_eq!(
            text,
            "🆕 *Новая статья:*\nSetup\\_guide v2\\.0 \\(draft\\)\n\nHow to install\\.\n\n🔗 [Читать](https://wiki.example.org/en/setup-guide)"
        );
    }

    #[test]
    fn test_updated_page_message_without_description() {
        let page = sample_page(Some(""));
        let text = format_message(
            ChangeKind::Updated,
            &page,
            "https://wiki.example.org/",
            &MessageLabels::default(),
        );
        assert_eq!(
            text,
            "🔄 *Обновлена статья:*\nSetup\\_guide v2\\.0 \\(draft\\)\n\n🔗 [Читать](https://wiki.example.org/en/setup-guide)"
        );
    }

    #[test]
    fn test_untitled_page_keeps_the_layout() {
        let mut page = sample_page(None);
        page.title = String::new();
        let text = format_message(
            ChangeKind::Created,
            &page,
            "https://wiki.example.org/",
            &MessageLabels::default(),
        );
        assert_eq!(
            text,
            "🆕 *Новая статья:*\n\n\n🔗 [Читать](https://wiki.example.org/en/setup-guide)"
        );
    }

    #[test]
    fn test_link_is_not_escaped() {
        let page = sample_page(None);
        let text = format_message(
            ChangeKind::Created,
            &page,
            "https://wiki.example.org/",
            &MessageLabels::default(),
        );
        assert!(text.ends_with("(https://wiki.example.org/en/setup-guide)"));
    }

    #[test]
    fn test_custom_labels() {
        let labels = MessageLabels {
            new_page: "New article".to_string(),
            updated_page: "Updated article".to_string(),
            read: "Read".to_string(),
        };
        let text = format_message(ChangeKind::Updated, &sample_page(None), "https://w/", &labels);
        assert!(text.starts_with("🔄 *Updated article:*\n"));
        assert!(text.contains("[Read](https://w/en/setup-guide)"));
    }

    proptest! {
        #[test]
        fn prop_escape_is_reversible_and_complete(input in "\\PC{0,64}") {
            let escaped = escape_markdown_v2(&input);
            prop_assert!(is_properly_escaped(&escaped));

            let reserved = input.chars().filter(|c| RESERVED_CHARS.contains(c)).count();
            prop_assert_eq!(escaped.chars().count(), input.chars().count() + reserved);

            let mut restored = String::new();
            let mut chars = escaped.chars();
            while let Some(c) = chars.next() {
                if c == '\\' {
                    if let Some(next) = chars.next() {
                        restored.push(next);
                    }
                } else {
                    restored.push(c);
                }
            }
            prop_assert_eq!(restored, input);
        }
    }

    fn telegram_config(server: &MockServer, thread_id: Option<i64>) -> TelegramConfig {
        TelegramConfig {
            api_url: server.uri(),
            bot_token: "123:abc".to_string(),
            channel_id: "-1001".to_string(),
            thread_id,
        }
    }

    #[tokio::test]
    async fn test_send_posts_markdown_v2_payload() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendMessage"))
            .and(body_json(json!({
                "message_thread_id": 42,
                "chat_id": "-1001",
                "text": "hello",
                "parse_mode": "MarkdownV2",
                "disable_web_page_preview": true
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
            .expect(1)
            .mount(&server)
            .await;

        let notifier =
            TelegramNotifier::with_timeout(&telegram_config(&server, Some(42)), Duration::from_secs(5))?;
        notifier.send("hello").await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_send_omits_absent_thread_id() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendMessage"))
            .and(body_json(json!({
                "chat_id": "-1001",
                "text": "hello",
                "parse_mode": "MarkdownV2",
                "disable_web_page_preview": true
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let notifier =
            TelegramNotifier::with_timeout(&telegram_config(&server, None), Duration::from_secs(5))?;
        notifier.send("hello").await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_send_reports_api_rejection() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string(
                r#"{"ok":false,"description":"Bad Request: can't parse entities"}"#,
            ))
            .mount(&server)
            .await;

        let notifier =
            TelegramNotifier::with_timeout(&telegram_config(&server, None), Duration::from_secs(5))?;
        match notifier.send("broken *").await {
            Err(Error::Api { status, body }) => {
                assert_eq!(status, 400);
                assert!(body.contains("can't parse entities"));
            },
            other => panic!("Expected Api error, got {other:?}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_log_notifier_always_succeeds() {
        assert!(LogNotifier.send("anything").await.is_ok());
    }
}
