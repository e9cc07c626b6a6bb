//! Per-browser credential sessions, held in process memory only.

use crate::credentials::{CredentialKind, CredentialSet, CredentialStatus};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::debug;
use uuid::Uuid;

/// Sidebar update. Absent fields are left untouched; blank ones clear the
/// slot.
#[derive(Debug, Default, Deserialize)]
pub struct CredentialUpdate {
    #[serde(default)]
    pub model_api_key: Option<String>,
    #[serde(default)]
    pub github_token: Option<String>,
    #[serde(default)]
    pub search_api_key: Option<String>,
}

impl CredentialUpdate {
    fn apply(self, credentials: &mut CredentialSet) {
        let fields = [
            (CredentialKind::ModelApiKey, self.model_api_key),
            (CredentialKind::GithubToken, self.github_token),
            (CredentialKind::SearchApiKey, self.search_api_key),
        ];
        for (kind, value) in fields {
            if let Some(value) = value {
                credentials.set(kind, value);
            }
        }
    }
}

struct Session {
    credentials: CredentialSet,
    last_access: Instant,
}

impl Session {
    fn touch(&mut self) -> &mut CredentialSet {
        self.last_access = Instant::now();
        &mut self.credentials
    }
}

/// Sessions are dropped, keys included, on `remove` or after `ttl` idle.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, Session>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Arc::default(),
            ttl,
        }
    }

    pub async fn create(&self) -> Uuid {
        let id = Uuid::new_v4();
        let session = Session {
            credentials: CredentialSet::default(),
            last_access: Instant::now(),
        };
        self.sessions.write().await.insert(id, session);
        id
    }

    /// Apply an update. `None` when the session does not exist.
    pub async fn update(&self, id: Uuid, update: CredentialUpdate) -> Option<CredentialStatus> {
        let mut sessions = self.sessions.write().await;
        let credentials = sessions.get_mut(&id)?.touch();
        update.apply(credentials);
        Some(credentials.status())
    }

    pub async fn status(&self, id: Uuid) -> Option<CredentialStatus> {
        let mut sessions = self.sessions.write().await;
        sessions.get_mut(&id).map(|session| session.touch().status())
    }

    /// Snapshot of a session's credentials. Unknown sessions have none.
    pub async fn credentials(&self, id: Uuid) -> CredentialSet {
        let mut sessions = self.sessions.write().await;
        sessions
            .get_mut(&id)
            .map(|session| session.touch().clone())
            .unwrap_or_default()
    }

    /// End a session and drop its credentials. `false` when it did not exist.
    pub async fn remove(&self, id: Uuid) -> bool {
        self.sessions.write().await.remove(&id).is_some()
    }

    /// Drop every session idle since before `now - ttl`. Returns how many went.
    pub async fn expire_idle(&self, now: Instant) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| now.saturating_duration_since(session.last_access) < self.ttl);
        before - sessions.len()
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Sweep idle sessions every `period`. Runs until the handle is aborted.
    pub fn spawn_sweeper(&self, period: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let expired = store.expire_idle(Instant::now()).await;
                if expired > 0 {
                    debug!("Expired {} idle session(s)", expired);
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn test_session_lifecycle() {
        let store = SessionStore::new(TTL);
        let id = store.create().await;
        assert_eq!(store.credentials(id).await.missing().len(), 3);

        let status = store
            .update(
                id,
                CredentialUpdate {
                    model_api_key: Some("sk-1".to_string()),
                    github_token: Some("ghp_1".to_string()),
                    search_api_key: None,
                },
            )
            .await
            .unwrap();
        assert!(status.model_api_key);
        assert!(status.github_token);
        assert!(!status.search_api_key);

        // Absent fields keep their value, blank ones clear it.
        store
            .update(
                id,
                CredentialUpdate {
                    github_token: Some("  ".to_string()),
                    ..Default::default()
                },
            )
            .await;
        let credentials = store.credentials(id).await;
        assert_eq!(
            credentials.get(CredentialKind::ModelApiKey).map(|s| s.expose()),
            Some("sk-1")
        );
        assert!(credentials.get(CredentialKind::GithubToken).is_none());

        assert!(store.remove(id).await);
        assert!(store.status(id).await.is_none());
        assert_eq!(store.credentials(id).await.missing().len(), 3);
        assert!(!store.remove(id).await);
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let store = SessionStore::new(TTL);
        let id = Uuid::new_v4();
        assert!(store.update(id, CredentialUpdate::default()).await.is_none());
        assert_eq!(store.credentials(id).await.missing().len(), 3);
    }

    #[tokio::test]
    async fn test_ended_sessions_do_not_accumulate() {
        let store = SessionStore::new(TTL);
        for _ in 0..1000 {
            let id = store.create().await;
            store
                .update(
                    id,
                    CredentialUpdate {
                        model_api_key: Some("sk".to_string()),
                        ..Default::default()
                    },
                )
                .await;
            store.remove(id).await;
        }
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_idle_sessions_expire() {
        let store = SessionStore::new(TTL);
        let idle = store.create().await;
        let active = store.create().await;

        assert_eq!(store.expire_idle(Instant::now()).await, 0);

        // Only the idle one is past the TTL at this point.
        let later = Instant::now() + TTL + Duration::from_secs(1);
        {
            let mut sessions = store.sessions.write().await;
            if let Some(session) = sessions.get_mut(&active) {
                session.last_access = later;
            }
        }
        assert_eq!(store.expire_idle(later).await, 1);
        assert!(store.status(idle).await.is_none());
        assert!(store.status(active).await.is_some());
    }
}
