use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

const ENV_FILE: &str = ".env";
const AI_KEY_VAR: &str = "DEVNEWS_AI_KEY";
const APP_DIR: &str = "devnews";

/// Shipped defaults, written to the user's config path on first run.
pub const DEFAULT_CONFIG: &str = include_str!("../config.default.toml");

pub const DEFAULT_BRIEF_SIZE: usize = 5;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: String,
    #[serde(default = "default_retention")]
    pub retention: String,
    #[serde(default)]
    pub brief_size: Option<usize>,
    #[serde(default)]
    pub focus: Option<String>,
    #[serde(default)]
    pub sources: Vec<Source>,
    #[serde(default)]
    pub ai: Option<AiConfig>,
}

fn default_refresh_interval() -> String {
    "12h".to_string()
}

fn default_retention() -> String {
    "90d".to_string()
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FeedKind {
    Rss,
    Atom,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Source {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FeedKind,
    pub url: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Trust weight in [0, 1] used by signal scoring.
    #[serde(default)]
    pub weight: Option<f64>,
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AiConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub model: String,
}

fn default_provider() -> String {
    "claude".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            refresh_interval: default_refresh_interval(),
            retention: default_retention(),
            brief_size: None,
            focus: None,
            sources: Vec::new(),
            ai: None,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to load config: {}", path.display()))
    }

    /// Load the user's config, writing the shipped defaults on first run.
    /// A missing file that cannot be created still yields the defaults.
    pub fn load_or_init(path: &Path) -> Result<Self> {
        if !path.exists() {
            if let Err(e) = write_defaults(path) {
                tracing::warn!(path = %path.display(), error = %e, "could not write default config");
            } else {
                tracing::info!(path = %path.display(), "wrote default config");
            }
            return Self::parse(DEFAULT_CONFIG).context("Failed to parse built-in config");
        }
        Self::load(path)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .with_context(|| "Failed to parse config TOML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for (i, s) in self.sources.iter().enumerate() {
            if s.name.trim().is_empty() {
                anyhow::bail!("source {}: name is required", i);
            }
            if s.url.trim().is_empty() {
                anyhow::bail!("source {:?}: url is required", s.name);
            }
            let parsed = url::Url::parse(&s.url)
                .with_context(|| format!("source {:?}: invalid url", s.name))?;
            if parsed.scheme() != "http" && parsed.scheme() != "https" {
                anyhow::bail!(
                    "source {:?}: url scheme must be http or https, got {:?}",
                    s.name,
                    parsed.scheme()
                );
            }
            if let Some(w) = s.weight {
                if !(0.0..=1.0).contains(&w) {
                    anyhow::bail!("source {:?}: weight must be within [0, 1], got {}", s.name, w);
                }
            }
        }
        parse_duration(&self.refresh_interval).context("invalid refresh_interval")?;
        parse_duration(&self.retention).context("invalid retention")?;
        Ok(())
    }

    pub fn refresh_duration(&self) -> Duration {
        parse_duration(&self.refresh_interval).unwrap_or(Duration::from_secs(12 * 3600))
    }

    pub fn retention_duration(&self) -> Duration {
        parse_duration(&self.retention).unwrap_or(Duration::from_secs(90 * 86_400))
    }

    pub fn brief_size(&self) -> usize {
        match self.brief_size {
            Some(n) if n > 0 => n,
            _ => DEFAULT_BRIEF_SIZE,
        }
    }

    pub fn enabled_sources(&self) -> Vec<Source> {
        self.sources.iter().filter(|s| s.enabled).cloned().collect()
    }

    pub fn source_names(&self) -> Vec<String> {
        self.sources
            .iter()
            .filter(|s| s.enabled)
            .map(|s| s.name.clone())
            .collect()
    }

    /// Per-source trust weights for signal scoring. Sources without an
    /// explicit weight are left out and fall back to the scorer's default.
    pub fn source_weights(&self) -> HashMap<String, f64> {
        self.sources
            .iter()
            .filter_map(|s| s.weight.map(|w| (s.name.clone(), w.clamp(0.0, 1.0))))
            .collect()
    }

    /// API key from config, else the DEVNEWS_AI_KEY environment variable.
    pub fn ai_key(&self) -> Option<String> {
        let from_config = self
            .ai
            .as_ref()
            .map(|ai| sanitize_key(&ai.api_key))
            .filter(|k| !k.is_empty());
        from_config.or_else(|| {
            std::env::var(AI_KEY_VAR)
                .ok()
                .map(|k| sanitize_key(&k))
                .filter(|k| !k.is_empty())
        })
    }

    /// Load .env file into process environment. Real env vars take precedence.
    pub fn load_env_file() {
        let path = Path::new(ENV_FILE);
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return,
        };
        let content = content.strip_prefix('\u{feff}').unwrap_or(&content);
        for line in content.lines() {
            let line = line.trim().trim_matches('\r');
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim();
                let value = value.trim().trim_matches('"').trim_matches('\'');
                if std::env::var(key).is_err() {
                    std::env::set_var(key, value);
                }
            }
        }
    }
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("config.toml")
}

pub fn cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

pub fn database_path() -> PathBuf {
    cache_dir().join("devnews.db")
}

pub fn log_path() -> PathBuf {
    cache_dir().join("devnews.log")
}

fn write_defaults(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create config dir: {}", dir.display()))?;
    }
    std::fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write config file: {}", path.display()))
}

/// Parse durations such as "7d", "24h", "30m", "2h30m" or "45s".
/// A bare day count ("Nd") may not be combined with other units.
pub fn parse_duration(input: &str) -> Result<Duration> {
    let s = input.trim();
    if s.is_empty() {
        anyhow::bail!("empty duration");
    }

    if let Some(days) = s.strip_suffix('d') {
        let n: u64 = days
            .parse()
            .with_context(|| format!("invalid day count in {:?}", input))?;
        let secs = n
            .checked_mul(86_400)
            .with_context(|| format!("duration {:?} is too large", input))?;
        return Ok(Duration::from_secs(secs));
    }

    let mut total = 0u64;
    let mut digits = String::new();
    for c in s.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        let unit = match c {
            'h' => 3600,
            'm' => 60,
            's' => 1,
            _ => anyhow::bail!("invalid duration {:?}: unknown unit {:?}", input, c),
        };
        if digits.is_empty() {
            anyhow::bail!("invalid duration {:?}: missing number before {:?}", input, c);
        }
        let n: u64 = digits
            .parse()
            .with_context(|| format!("invalid number in {:?}", input))?;
        total = n
            .checked_mul(unit)
            .and_then(|secs| total.checked_add(secs))
            .with_context(|| format!("duration {:?} is too large", input))?;
        digits.clear();
    }
    if !digits.is_empty() {
        anyhow::bail!("invalid duration {:?}: missing unit", input);
    }
    Ok(Duration::from_secs(total))
}

/// Strip carriage returns, BOM, and other invisible chars from a key value.
fn sanitize_key(raw: &str) -> String {
    raw.replace(['\r', '\u{feff}', '\u{200b}'], "")
        .trim()
        .to_string()
}
