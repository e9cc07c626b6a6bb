//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.candilyzer.toml` files. Credentials are never read from here.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".candilyzer.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Web UI settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Chat model settings.
    #[serde(default)]
    pub model: ModelConfig,

    /// GitHub API settings.
    #[serde(default)]
    pub github: GithubConfig,

    /// Web search settings.
    #[serde(default)]
    pub search: SearchConfig,
}

/// Web UI settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Idle minutes after which a browser session and its keys are dropped.
    #[serde(default = "default_session_ttl_minutes")]
    pub session_ttl_minutes: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            session_ttl_minutes: default_session_ttl_minutes(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8501
}

fn default_session_ttl_minutes() -> u64 {
    60
}

/// Chat model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// DeepSeek-compatible API base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model used by the multi-candidate flow.
    #[serde(default = "default_multi_model")]
    pub multi_model: String,

    /// Model used by the single-candidate flow.
    #[serde(default = "default_single_model")]
    pub single_model: String,

    /// Sampling temperature. Provider default when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Connection timeout in seconds. The streamed response itself has no
    /// deadline.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,

    /// Upper bound on model turns that end in tool calls.
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            multi_model: default_multi_model(),
            single_model: default_single_model(),
            temperature: None,
            connect_timeout_seconds: default_connect_timeout(),
            max_tool_rounds: default_max_tool_rounds(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.deepseek.com".to_string()
}

fn default_multi_model() -> String {
    "deepseek-coder".to_string()
}

fn default_single_model() -> String {
    "deepseek-chat".to_string()
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_max_tool_rounds() -> usize {
    25
}

/// GitHub REST API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    /// API base URL.
    #[serde(default = "default_github_api_url")]
    pub api_url: String,

    /// Maximum items returned by list/search tools.
    #[serde(default = "default_max_items")]
    pub max_items: usize,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_url: default_github_api_url(),
            max_items: default_max_items(),
        }
    }
}

fn default_github_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_max_items() -> usize {
    30
}

/// Exa search settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// API base URL.
    #[serde(default = "default_search_api_url")]
    pub api_url: String,

    /// Exa search type (`keyword`, `neural`, `auto`).
    #[serde(default = "default_search_type")]
    pub search_type: String,

    /// Results per search.
    #[serde(default = "default_num_results")]
    pub num_results: usize,

    /// Domains the multi-candidate flow may search.
    #[serde(default = "default_multi_domains")]
    pub multi_domains: Vec<String>,

    /// Domains the single-candidate flow may search.
    #[serde(default = "default_single_domains")]
    pub single_domains: Vec<String>,

    /// Characters of page text returned per result in the single flow.
    #[serde(default = "default_text_length_limit")]
    pub single_text_length_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_url: default_search_api_url(),
            search_type: default_search_type(),
            num_results: default_num_results(),
            multi_domains: default_multi_domains(),
            single_domains: default_single_domains(),
            single_text_length_limit: default_text_length_limit(),
        }
    }
}

fn default_search_api_url() -> String {
    "https://api.exa.ai".to_string()
}

fn default_search_type() -> String {
    "keyword".to_string()
}

fn default_num_results() -> usize {
    5
}

fn default_multi_domains() -> Vec<String> {
    vec!["github.com".to_string()]
}

fn default_single_domains() -> Vec<String> {
    vec!["linkedin.com".to_string(), "github.com".to_string()]
}

fn default_text_length_limit() -> usize {
    2000
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.candilyzer.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(DEFAULT_CONFIG_FILE);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings and only
    /// override values they explicitly provide.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref base_url) = args.model_url {
            self.model.base_url = base_url.clone();
        }
        if let Some(temperature) = args.temperature {
            self.model.temperature = Some(temperature);
        }

        if let crate::cli::Command::Serve { host, port } = &args.command {
            if let Some(host) = host {
                self.server.host = host.clone();
            }
            if let Some(port) = port {
                self.server.port = *port;
            }
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Args, Command};
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.model.multi_model, "deepseek-coder");
        assert_eq!(config.model.single_model, "deepseek-chat");
        assert_eq!(config.search.multi_domains, vec!["github.com"]);
        assert_eq!(config.search.single_domains, vec!["linkedin.com", "github.com"]);
        assert_eq!(config.search.single_text_length_limit, 2000);
        assert_eq!(config.server.port, 8501);
        assert_eq!(config.server.session_ttl_minutes, 60);
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[server]
port = 9000

[model]
base_url = "http://localhost:8080"
temperature = 0.2

[search]
search_type = "neural"
multi_domains = ["github.com", "gitlab.com"]
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.model.base_url, "http://localhost:8080");
        assert_eq!(config.model.temperature, Some(0.2));
        assert_eq!(config.model.multi_model, "deepseek-coder");
        assert_eq!(config.search.search_type, "neural");
        assert_eq!(config.search.multi_domains, vec!["github.com", "gitlab.com"]);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[server]"));
        assert!(toml_str.contains("[model]"));
        assert!(toml_str.contains("[github]"));
        assert!(toml_str.contains("[search]"));
        assert!(!toml_str.to_lowercase().contains("api_key"));
    }

    #[test]
    fn test_load_from_dir() {
        let temp_dir = TempDir::new().unwrap();
        assert!(Config::load_from_dir(temp_dir.path()).unwrap().is_none());

        std::fs::write(
            temp_dir.path().join(DEFAULT_CONFIG_FILE),
            "[github]\nmax_items = 10\n",
        )
        .unwrap();
        let config = Config::load_from_dir(temp_dir.path()).unwrap().unwrap();
        assert_eq!(config.github.max_items, 10);

        std::fs::write(temp_dir.path().join(DEFAULT_CONFIG_FILE), "[github\n").unwrap();
        assert!(Config::load_from_dir(temp_dir.path()).is_err());
    }

    #[test]
    fn test_merge_with_args() {
        let args = Args {
            config: None,
            verbose: false,
            quiet: false,
            model_url: Some("http://127.0.0.1:1234".to_string()),
            temperature: None,
            command: Command::Serve {
                host: Some("0.0.0.0".to_string()),
                port: None,
            },
        };

        let mut config = Config::default();
        config.merge_with_args(&args);
        assert_eq!(config.model.base_url, "http://127.0.0.1:1234");
        assert_eq!(config.model.temperature, None);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8501);
    }
}
