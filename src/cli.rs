//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::credentials::{CredentialKind, CredentialSet, Secret};
use crate::request::{MultiCandidateForm, SingleCandidateForm};
use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;

/// Candilyzer - elite GitHub + LinkedIn candidate analyzer for tech hiring
///
/// Streams a DeepSeek agent's evaluation of one or more candidates. The agent
/// inspects GitHub with your token and searches the web with Exa.
///
/// Examples:
///   candilyzer serve --port 8501
///   candilyzer multi --role "Backend Engineer" --user alice --user bob
///   candilyzer multi --role "Backend Engineer" --users-file candidates.txt
///   candilyzer single --user toufiq --role "ML Engineer" --linkedin https://linkedin.com/in/toufiq
///   candilyzer init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to configuration file
    ///
    /// If not specified, looks for .candilyzer.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// DeepSeek-compatible API base URL
    #[arg(long, value_name = "URL", env = "CANDILYZER_MODEL_URL", global = true)]
    pub model_url: Option<String>,

    /// Sampling temperature (0.0 - 2.0)
    #[arg(long, global = true)]
    pub temperature: Option<f32>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Start the web UI
    Serve {
        /// Address to bind
        #[arg(long)]
        host: Option<String>,

        /// Port to bind
        #[arg(long)]
        port: Option<u16>,
    },

    /// Rank several GitHub candidates against one role
    Multi {
        /// Target job role
        #[arg(short, long)]
        role: String,

        /// GitHub username (repeatable)
        #[arg(short, long = "user", value_name = "USERNAME")]
        users: Vec<String>,

        /// File with one GitHub username per line ("-" for stdin)
        #[arg(long, value_name = "FILE")]
        users_file: Option<PathBuf>,

        #[command(flatten)]
        credentials: CredentialArgs,
    },

    /// Evaluate a single candidate in depth
    Single {
        /// GitHub username
        #[arg(short, long)]
        user: String,

        /// Target job role
        #[arg(short, long)]
        role: String,

        /// LinkedIn profile URL
        #[arg(long, value_name = "URL")]
        linkedin: Option<String>,

        #[command(flatten)]
        credentials: CredentialArgs,
    },

    /// Generate a default .candilyzer.toml configuration file
    InitConfig,
}

/// The three credentials, from flags or the environment. Parsed straight
/// into [`Secret`] so `Debug` output stays redacted.
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct CredentialArgs {
    /// DeepSeek API key
    #[arg(long, env = "DEEPSEEK_API_KEY", hide_env_values = true)]
    pub deepseek_api_key: Option<Secret>,

    /// GitHub access token
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<Secret>,

    /// Exa API key
    #[arg(long, env = "EXA_API_KEY", hide_env_values = true)]
    pub exa_api_key: Option<Secret>,
}

impl CredentialArgs {
    pub fn to_credential_set(&self) -> CredentialSet {
        let mut set = CredentialSet::default();
        let pairs = [
            (CredentialKind::ModelApiKey, &self.deepseek_api_key),
            (CredentialKind::GithubToken, &self.github_token),
            (CredentialKind::SearchApiKey, &self.exa_api_key),
        ];
        for (kind, value) in pairs {
            if let Some(value) = value {
                set.set(kind, value.expose());
            }
        }
        set
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref url) = self.model_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Model URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(temperature) = self.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err("Temperature must be between 0.0 and 2.0".to_string());
            }
        }

        match &self.command {
            Command::Serve { port: Some(0), .. } => {
                Err("Port must be between 1 and 65535".to_string())
            }
            Command::Multi {
                users_file: Some(path),
                ..
            } if path.as_os_str() != "-" && !path.is_file() => {
                Err(format!("Usernames file does not exist: {}", path.display()))
            }
            _ => Ok(()),
        }
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

/// Build the multi-candidate form from repeated `--user` flags and an
/// optional usernames file, in that order.
pub fn multi_form(role: &str, users: &[String], users_file: Option<&PathBuf>) -> Result<MultiCandidateForm> {
    let mut block = users.join("\n");

    if let Some(path) = users_file {
        let content = if path.as_os_str() == "-" {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read usernames from stdin")?;
            buf
        } else {
            std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read usernames file: {}", path.display()))?
        };
        block.push('\n');
        block.push_str(&content);
    }

    Ok(MultiCandidateForm {
        github_usernames: block,
        job_role: role.to_string(),
    })
}

/// Build the single-candidate form from flags.
pub fn single_form(user: &str, role: &str, linkedin: Option<&str>) -> SingleCandidateForm {
    SingleCandidateForm {
        github_username: user.to_string(),
        job_role: role.to_string(),
        linkedin_url: linkedin.map(String::from),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args(command: Command) -> Args {
        Args {
            config: None,
            verbose: false,
            quiet: false,
            model_url: None,
            temperature: None,
            command,
        }
    }

    #[test]
    fn test_parse_multi_subcommand() {
        let args = Args::try_parse_from([
            "candilyzer",
            "multi",
            "--role",
            "Backend Engineer",
            "--user",
            "alice",
            "-u",
            "bob",
            "--deepseek-api-key",
            "sk",
        ])
        .unwrap();

        match args.command {
            Command::Multi {
                role,
                users,
                credentials,
                ..
            } => {
                assert_eq!(role, "Backend Engineer");
                assert_eq!(users, vec!["alice", "bob"]);
                assert_eq!(credentials.deepseek_api_key.as_ref().map(Secret::expose), Some("sk"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args(Command::InitConfig);
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_invalid_model_url() {
        let mut args = make_args(Command::InitConfig);
        args.model_url = Some("api.deepseek.com".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_port_zero() {
        let args = make_args(Command::Serve {
            host: None,
            port: Some(0),
        });
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args(Command::InitConfig);
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }

    #[test]
    fn test_multi_form_merges_flags_and_file() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), "carol\n\n  dave \n").unwrap();

        let path = temp.path().to_path_buf();
        let form = multi_form("SRE", &["alice".to_string()], Some(&path)).unwrap();
        let request = form.validate().unwrap();
        assert_eq!(
            request,
            crate::request::AnalysisRequest::Multi {
                job_role: "SRE".to_string(),
                usernames: vec!["alice".to_string(), "carol".to_string(), "dave".to_string()],
            }
        );
    }

    #[test]
    fn test_credential_args_to_set() {
        let args = CredentialArgs {
            deepseek_api_key: Some(Secret::new("sk")),
            github_token: Some(Secret::new(" ")),
            exa_api_key: None,
        };
        let set = args.to_credential_set();
        assert_eq!(
            set.missing(),
            vec![CredentialKind::GithubToken, CredentialKind::SearchApiKey]
        );
    }

    #[test]
    fn test_debug_output_redacts_keys() {
        let args = Args::try_parse_from([
            "candilyzer",
            "-v",
            "single",
            "--user",
            "alice",
            "--role",
            "SRE",
            "--deepseek-api-key",
            "sk-hidden",
            "--github-token",
            "ghp_hidden",
            "--exa-api-key",
            "exa-hidden",
        ])
        .unwrap();

        let debug = format!("Arguments: {:?}", args);
        assert!(!debug.contains("hidden"), "{}", debug);

        if let Command::Single { credentials, .. } = &args.command {
            assert!(credentials.to_credential_set().missing().is_empty());
        } else {
            panic!("expected single subcommand");
        }
    }
}
