use anyhow::{Context, Result};
use std::process::{Command, Stdio};
use url::Url;

/// Validate that `raw` is an http(s) URL.
pub fn check_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).with_context(|| format!("invalid URL: {:?}", raw))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => anyhow::bail!(
            "refusing to open URL with scheme {:?} (only http/https allowed)",
            other
        ),
    }
}

/// Hand the URL to the platform opener without waiting for it.
pub fn open(raw: &str) -> Result<()> {
    let url = check_url(raw)?;
    let mut cmd = opener(url.as_str());
    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    cmd.spawn()
        .with_context(|| format!("failed to launch browser for {}", url))?;
    tracing::debug!(url = %url, "opened in browser");
    Ok(())
}

fn opener(url: &str) -> Command {
    if cfg!(target_os = "macos") {
        let mut cmd = Command::new("open");
        cmd.arg(url);
        cmd
    } else if cfg!(target_os = "windows") {
        // rundll32 avoids shell interpretation of the URL.
        let mut cmd = Command::new("rundll32");
        cmd.args(["url.dll,FileProtocolHandler", url]);
        cmd
    } else {
        let mut cmd = Command::new("xdg-open");
        cmd.arg(url);
        cmd
    }
}
