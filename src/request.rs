//! Request Form.
//!
//! Both form variants validate their required fields and turn into an
//! [`AnalysisRequest`], which knows how to phrase itself as the agent query.

use crate::errors::ValidationError;
use crate::models::AnalysisKind;
use serde::Deserialize;

/// Multi-candidate form: usernames one per line, plus a role.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MultiCandidateForm {
    #[serde(default)]
    pub github_usernames: String,
    #[serde(default)]
    pub job_role: String,
}

/// Single-candidate form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SingleCandidateForm {
    #[serde(default)]
    pub github_username: String,
    #[serde(default)]
    pub job_role: String,
    #[serde(default)]
    pub linkedin_url: Option<String>,
}

/// Either form, as submitted.
#[derive(Debug, Clone)]
pub enum AnalysisForm {
    Multi(MultiCandidateForm),
    Single(SingleCandidateForm),
}

/// A validated submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisRequest {
    Multi {
        job_role: String,
        usernames: Vec<String>,
    },
    Single {
        job_role: String,
        username: String,
        linkedin_url: Option<String>,
    },
}

/// Split an identifier block on line breaks, trim each line and drop blanks.
///
/// Order is preserved and duplicates are kept.
pub fn parse_identifiers(block: &str) -> Vec<String> {
    block
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

impl MultiCandidateForm {
    pub fn validate(&self) -> Result<AnalysisRequest, ValidationError> {
        let job_role = self.job_role.trim();
        let usernames = parse_identifiers(&self.github_usernames);

        if job_role.is_empty() || usernames.is_empty() {
            return Err(ValidationError::MissingUsernamesOrRole);
        }

        Ok(AnalysisRequest::Multi {
            job_role: job_role.to_string(),
            usernames,
        })
    }
}

impl SingleCandidateForm {
    pub fn validate(&self) -> Result<AnalysisRequest, ValidationError> {
        let username = self.github_username.trim();
        let job_role = self.job_role.trim();

        if username.is_empty() || job_role.is_empty() {
            return Err(ValidationError::MissingUsernameOrRole);
        }

        let linkedin_url = self
            .linkedin_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(String::from);

        Ok(AnalysisRequest::Single {
            job_role: job_role.to_string(),
            username: username.to_string(),
            linkedin_url,
        })
    }
}

impl AnalysisForm {
    pub fn kind(&self) -> AnalysisKind {
        match self {
            AnalysisForm::Multi(_) => AnalysisKind::Multi,
            AnalysisForm::Single(_) => AnalysisKind::Single,
        }
    }

    pub fn validate(&self) -> Result<AnalysisRequest, ValidationError> {
        match self {
            AnalysisForm::Multi(form) => form.validate(),
            AnalysisForm::Single(form) => form.validate(),
        }
    }
}

impl AnalysisRequest {
    pub fn kind(&self) -> AnalysisKind {
        match self {
            AnalysisRequest::Multi { .. } => AnalysisKind::Multi,
            AnalysisRequest::Single { .. } => AnalysisKind::Single,
        }
    }

    /// The user message sent to the agent.
    pub fn query(&self) -> String {
        match self {
            AnalysisRequest::Multi {
                job_role,
                usernames,
            } => format!(
                "Evaluate GitHub candidates for the role '{}': {}",
                job_role,
                usernames.join(", ")
            ),
            AnalysisRequest::Single {
                job_role,
                username,
                linkedin_url,
            } => {
                let mut input = format!("GitHub: {}, Role: {}", username, job_role);
                if let Some(url) = linkedin_url {
                    input.push_str(&format!(", LinkedIn: {}", url));
                }
                format!(
                    "Analyze candidate for {}. {}. Provide score and detailed report, \
                     and give a final combined verdict in detail.",
                    job_role, input
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_identifiers() {
        assert_eq!(
            parse_identifiers("alice\n\nbob \n  \ncarol"),
            vec!["alice", "bob", "carol"]
        );
    }

    #[test]
    fn test_parse_identifiers_keeps_duplicates_and_order() {
        assert_eq!(
            parse_identifiers("  zed\r\nalice\nzed\n"),
            vec!["zed", "alice", "zed"]
        );
        assert!(parse_identifiers(" \n\t\n").is_empty());
    }

    #[test]
    fn test_multi_requires_role_and_usernames() {
        let form = MultiCandidateForm {
            github_usernames: "alice".to_string(),
            job_role: "   ".to_string(),
        };
        assert_eq!(form.validate(), Err(ValidationError::MissingUsernamesOrRole));

        let form = MultiCandidateForm {
            github_usernames: "\n  \n".to_string(),
            job_role: "Backend Engineer".to_string(),
        };
        assert_eq!(form.validate(), Err(ValidationError::MissingUsernamesOrRole));
    }

    #[test]
    fn test_multi_query() {
        let form = MultiCandidateForm {
            github_usernames: "alice\nbob".to_string(),
            job_role: " Backend Engineer ".to_string(),
        };
        let request = form.validate().unwrap();
        assert_eq!(request.kind(), AnalysisKind::Multi);
        assert_eq!(
            request.query(),
            "Evaluate GitHub candidates for the role 'Backend Engineer': alice, bob"
        );
    }

    #[test]
    fn test_single_requires_username_and_role() {
        let form = SingleCandidateForm {
            github_username: "".to_string(),
            job_role: "ML Engineer".to_string(),
            linkedin_url: None,
        };
        assert_eq!(form.validate(), Err(ValidationError::MissingUsernameOrRole));
    }

    #[test]
    fn test_single_query_with_and_without_linkedin() {
        let mut form = SingleCandidateForm {
            github_username: "toufiq".to_string(),
            job_role: "ML Engineer".to_string(),
            linkedin_url: Some("  ".to_string()),
        };
        let query = form.validate().unwrap().query();
        assert!(query.starts_with("Analyze candidate for ML Engineer. GitHub: toufiq, Role: ML Engineer."));
        assert!(!query.contains("LinkedIn"));

        form.linkedin_url = Some("https://linkedin.com/in/toufiq".to_string());
        let query = form.validate().unwrap().query();
        assert!(query.contains(", LinkedIn: https://linkedin.com/in/toufiq."));
    }

    #[test]
    fn test_form_kind() {
        assert_eq!(
            AnalysisForm::Single(SingleCandidateForm::default()).kind(),
            AnalysisKind::Single
        );
    }
}
