#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const CMD_TIMEOUT: Duration = Duration::from_secs(30);
pub const BOT_TOKEN: &str = "123:abc";
pub const SEND_MESSAGE_PATH: &str = "/bot123:abc/sendMessage";

/// Create a `wikinotify` command wired to the given mock servers, with the
/// cache and log file inside `dir`.
pub fn wikinotify_cmd(dir: &Path, wiki: &MockServer, telegram: &MockServer) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("wikinotify"));
    cmd.timeout(CMD_TIMEOUT);
    cmd.current_dir(dir);
    cmd.env("WIKI_GRAPHQL_URL", format!("{}/graphql", wiki.uri()));
    cmd.env("WIKI_API_TOKEN", "wiki-token");
    cmd.env("SITE_URL", "https://wiki.example.org/");
    cmd.env("TELEGRAM_BOT_TOKEN", BOT_TOKEN);
    cmd.env("TELEGRAM_CHANNEL_ID", "@wiki_updates");
    cmd.env("TELEGRAM_API_URL", telegram.uri());
    cmd.env("CACHE_FILE", cache_path(dir));
    cmd.env("LOG_FILE", log_path(dir));
    for var in [
        "TELEGRAM_THREAD_ID",
        "CHECK_INTERVAL_MINUTES",
        "REQUEST_TIMEOUT_SECS",
        "LOG_JSON",
    ] {
        cmd.env_remove(var);
    }
    cmd.env("NO_COLOR", "1");
    cmd
}

pub fn cache_path(dir: &Path) -> PathBuf {
    dir.join(".wiki_cache.json")
}

pub fn log_path(dir: &Path) -> PathBuf {
    dir.join("logs").join("app.log")
}

pub fn page_json(id: i64, title: &str, created_at: &str, updated_at: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "description": format!("About {title}"),
        "path": format!("en/page-{id}"),
        "createdAt": created_at,
        "updatedAt": updated_at
    })
}

pub async fn mount_pages(server: &MockServer, pages: Vec<Value>) {
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "pages": { "list": pages } }
        })))
        .mount(server)
        .await;
}

pub fn write_cache(dir: &Path, cache: &Value) {
    std::fs::write(cache_path(dir), serde_json::to_vec_pretty(cache).unwrap()).unwrap();
}

pub fn read_cache(dir: &Path) -> Value {
    let raw = std::fs::read_to_string(cache_path(dir)).expect("cache file should exist");
    serde_json::from_str(&raw).expect("cache file should be valid JSON")
}
