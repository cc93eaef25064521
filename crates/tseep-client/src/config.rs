//! Client configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use tseep_core::model::DEFAULT_MAX_SCORE;
use tseep_core::NavigatorConfig;

use crate::http::DEFAULT_TIMEOUT_SECS;

pub const DEFAULT_BASE_URL: &str = "https://tseep-backend.onrender.com";

/// Name of the config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "tseep.toml";

/// Top-level tseep configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Root URL of the assessment service.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Where the login session is persisted.
    #[serde(default = "default_session_file")]
    pub session_file: PathBuf,
    /// Keep fetched questions in memory for the duration of a quiz.
    #[serde(default)]
    pub cache_questions: bool,
    /// Maximum score shown next to the total.
    #[serde(default = "default_max_score")]
    pub max_score: u32,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}
fn default_session_file() -> PathBuf {
    match config_dir() {
        Some(dir) => dir.join("session.json"),
        None => PathBuf::from(".tseep-session.json"),
    }
}
fn default_max_score() -> u32 {
    DEFAULT_MAX_SCORE
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            session_file: default_session_file(),
            cache_questions: false,
            max_score: default_max_score(),
        }
    }
}

impl ClientConfig {
    pub fn navigator(&self) -> NavigatorConfig {
        NavigatorConfig {
            cache_questions: self.cache_questions,
        }
    }

    /// Starter config written by `tseep init`.
    pub fn starter_toml() -> String {
        format!(
            r#"# tseep configuration

base_url = "{DEFAULT_BASE_URL}"
timeout_secs = {DEFAULT_TIMEOUT_SECS}

# session_file = "${{HOME}}/.config/tseep/session.json"
cache_questions = false
max_score = {DEFAULT_MAX_SCORE}
"#
        )
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Substituted values are inserted verbatim; references inside them are not
/// expanded again.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        let var_name = &rest[start + 2..start + end];
        result.push_str(&rest[..start]);
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + end + 1..];
    }
    result.push_str(rest);
    result
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `tseep.toml` in the current directory
/// 2. `~/.config/tseep/config.toml`
///
/// `TSEEP_BASE_URL` overrides `base_url`.
pub fn load_config() -> Result<ClientConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<ClientConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from(LOCAL_CONFIG_FILE);
            if local.exists() {
                Some(local)
            } else {
                config_dir()
                    .map(|dir| dir.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<ClientConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => ClientConfig::default(),
    };

    if let Ok(url) = std::env::var("TSEEP_BASE_URL") {
        config.base_url = url;
    }

    config.base_url = resolve_env_vars(&config.base_url);
    config.session_file = PathBuf::from(resolve_env_vars(&config.session_file.to_string_lossy()));

    if config.base_url.trim().is_empty() {
        anyhow::bail!("base_url is empty");
    }

    Ok(config)
}

/// `~/.config/tseep`, if `HOME` is set.
pub fn config_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("tseep"))
}
