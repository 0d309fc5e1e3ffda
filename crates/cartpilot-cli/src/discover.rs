//! DevTools page-target discovery.
//!
//! A Chromium started with `--remote-debugging-port` serves its debuggable
//! targets as JSON at `/json`. Cartpilot only cares about `page` targets and
//! their WebSocket debugger URLs.

use anyhow::Context;
use serde::Deserialize;

/// One debuggable target from the DevTools `/json` list.
#[derive(Debug, Clone, Deserialize)]
pub struct PageTarget {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(rename = "type", default)]
    pub target_type: String,
    #[serde(rename = "webSocketDebuggerUrl", default)]
    pub ws_url: Option<String>,
}

/// Fetch the target list and keep only page targets.
pub async fn list_page_targets(devtools: &str) -> anyhow::Result<Vec<PageTarget>> {
    let endpoint = format!("{}/json", devtools.trim_end_matches('/'));
    let targets: Vec<PageTarget> = reqwest::get(&endpoint)
        .await
        .with_context(|| format!("failed to reach DevTools endpoint {endpoint}"))?
        .json()
        .await
        .context("failed to decode DevTools target list")?;
    Ok(targets
        .into_iter()
        .filter(|t| t.target_type == "page")
        .collect())
}

/// Pick the first target whose URL starts with `url_prefix`, or the first
/// target when no prefix is given.
pub fn select_target<'a>(
    targets: &'a [PageTarget],
    url_prefix: Option<&str>,
) -> Option<&'a PageTarget> {
    match url_prefix {
        Some(prefix) => targets.iter().find(|t| t.url.starts_with(prefix)),
        None => targets.first(),
    }
}
