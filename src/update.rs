use serde::Deserialize;
use std::time::Duration;

const RELEASES_URL: &str = "https://api.github.com/repos/matheuskafuri/devnews/releases/latest";
pub const CHECK_DEADLINE: Duration = Duration::from_secs(5);

#[derive(Deserialize)]
struct Release {
    #[serde(default)]
    tag_name: String,
}

/// Latest released version when it is newer than `current`. Any failure
/// yields `None`; the check is advisory.
pub async fn check(current: &str) -> Option<String> {
    let client = reqwest::Client::builder()
        .timeout(CHECK_DEADLINE)
        .user_agent(concat!("devnews/", env!("CARGO_PKG_VERSION")))
        .build()
        .ok()?;
    let resp = client
        .get(RELEASES_URL)
        .header("Accept", "application/vnd.github+json")
        .send()
        .await
        .map_err(|e| tracing::debug!(error = %e, "update check failed"))
        .ok()?;
    if !resp.status().is_success() {
        tracing::debug!(status = %resp.status(), "update check returned non-success");
        return None;
    }
    let release: Release = resp.json().await.ok()?;
    newer_version(&release.tag_name, current)
}

/// `latest` with any "v" prefix removed, if it is ahead of `current`.
pub fn newer_version(latest: &str, current: &str) -> Option<String> {
    let latest = latest.trim().trim_start_matches('v');
    let current = current.trim().trim_start_matches('v');
    if latest.is_empty() || latest == current {
        return None;
    }
    match (parse_version(latest), parse_version(current)) {
        (Some(l), Some(c)) if l <= c => None,
        _ => Some(latest.to_string()),
    }
}

fn parse_version(v: &str) -> Option<Vec<u64>> {
    let core = v.split(['-', '+']).next()?;
    core.split('.').map(|part| part.parse().ok()).collect()
}
