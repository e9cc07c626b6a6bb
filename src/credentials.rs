//! Credential Store.
//!
//! A [`CredentialSet`] holds whatever the user has typed into the sidebar so
//! far. An analysis can only run with a [`SessionContext`], which refuses to
//! exist unless all three secrets are present.

use crate::errors::ValidationError;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// An opaque secret. Never printed, never serialized.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw value, for the one client that owns this secret.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret(***)")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "***")
    }
}

/// Lets clap parse flags and env vars straight into a `Secret`.
impl FromStr for Secret {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

/// The three named credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialKind {
    /// DeepSeek chat-completion key.
    ModelApiKey,
    /// GitHub personal access token.
    GithubToken,
    /// Exa search key.
    SearchApiKey,
}

impl CredentialKind {
    pub const ALL: [CredentialKind; 3] = [
        CredentialKind::ModelApiKey,
        CredentialKind::GithubToken,
        CredentialKind::SearchApiKey,
    ];

    /// Sidebar label.
    pub fn label(&self) -> &'static str {
        match self {
            CredentialKind::ModelApiKey => "DeepSeek API Key",
            CredentialKind::GithubToken => "GitHub API Key",
            CredentialKind::SearchApiKey => "Exa API Key",
        }
    }
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Session-scoped credentials as entered so far. Any of them may be missing.
#[derive(Debug, Clone, Default)]
pub struct CredentialSet {
    model_api_key: Option<Secret>,
    github_token: Option<Secret>,
    search_api_key: Option<Secret>,
}

/// Which credentials are present, without their values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CredentialStatus {
    pub model_api_key: bool,
    pub github_token: bool,
    pub search_api_key: bool,
}

impl CredentialSet {
    pub fn get(&self, kind: CredentialKind) -> Option<&Secret> {
        self.slot(kind).as_ref()
    }

    /// Store a value. Blank input clears the slot.
    pub fn set(&mut self, kind: CredentialKind, value: impl Into<String>) {
        let value = value.into();
        let trimmed = value.trim();
        *self.slot_mut(kind) = if trimmed.is_empty() {
            None
        } else {
            Some(Secret::new(trimmed))
        };
    }

    /// Credentials still to be entered, in sidebar order.
    pub fn missing(&self) -> Vec<CredentialKind> {
        CredentialKind::ALL
            .into_iter()
            .filter(|kind| self.get(*kind).is_none())
            .collect()
    }

    pub fn status(&self) -> CredentialStatus {
        CredentialStatus {
            model_api_key: self.model_api_key.is_some(),
            github_token: self.github_token.is_some(),
            search_api_key: self.search_api_key.is_some(),
        }
    }

    fn slot(&self, kind: CredentialKind) -> &Option<Secret> {
        match kind {
            CredentialKind::ModelApiKey => &self.model_api_key,
            CredentialKind::GithubToken => &self.github_token,
            CredentialKind::SearchApiKey => &self.search_api_key,
        }
    }

    fn slot_mut(&mut self, kind: CredentialKind) -> &mut Option<Secret> {
        match kind {
            CredentialKind::ModelApiKey => &mut self.model_api_key,
            CredentialKind::GithubToken => &mut self.github_token,
            CredentialKind::SearchApiKey => &mut self.search_api_key,
        }
    }
}

/// Complete credentials for one analysis.
#[derive(Debug, Clone)]
pub struct SessionContext {
    model_api_key: Secret,
    github_token: Secret,
    search_api_key: Secret,
}

impl SessionContext {
    /// Fails with [`ValidationError::MissingCredentials`] unless all three are set.
    pub fn new(credentials: &CredentialSet) -> Result<Self, ValidationError> {
        match (
            &credentials.model_api_key,
            &credentials.github_token,
            &credentials.search_api_key,
        ) {
            (Some(model), Some(github), Some(search)) => Ok(Self {
                model_api_key: model.clone(),
                github_token: github.clone(),
                search_api_key: search.clone(),
            }),
            _ => Err(ValidationError::MissingCredentials(credentials.missing())),
        }
    }

    pub fn model_api_key(&self) -> &Secret {
        &self.model_api_key
    }

    pub fn github_token(&self) -> &Secret {
        &self.github_token
    }

    pub fn search_api_key(&self) -> &Secret {
        &self.search_api_key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_set() -> CredentialSet {
        let mut set = CredentialSet::default();
        set.set(CredentialKind::ModelApiKey, "sk-model");
        set.set(CredentialKind::GithubToken, "ghp_token");
        set.set(CredentialKind::SearchApiKey, "exa-key");
        set
    }

    #[test]
    fn test_secret_is_redacted() {
        let secret = Secret::new("sk-very-secret");
        assert_eq!(format!("{}", secret), "***");
        assert!(!format!("{:?}", secret).contains("very-secret"));

        let set = full_set();
        let debug = format!("{:?}", set);
        assert!(!debug.contains("sk-model"));
        assert!(!debug.contains("ghp_token"));
    }

    #[test]
    fn test_context_requires_all_three() {
        assert!(SessionContext::new(&full_set()).is_ok());

        for kind in CredentialKind::ALL {
            let mut set = full_set();
            set.set(kind, "   ");
            let err = SessionContext::new(&set).unwrap_err();
            assert_eq!(err, ValidationError::MissingCredentials(vec![kind]));
        }
    }

    #[test]
    fn test_empty_set_reports_everything_missing() {
        let set = CredentialSet::default();
        assert_eq!(set.missing(), CredentialKind::ALL.to_vec());
        assert_eq!(
            set.status(),
            CredentialStatus {
                model_api_key: false,
                github_token: false,
                search_api_key: false
            }
        );
    }

    #[test]
    fn test_each_client_gets_its_own_secret() {
        let context = SessionContext::new(&full_set()).unwrap();
        assert_eq!(context.model_api_key().expose(), "sk-model");
        assert_eq!(context.github_token().expose(), "ghp_token");
        assert_eq!(context.search_api_key().expose(), "exa-key");
    }
}
