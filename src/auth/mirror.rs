//! Local mirror of the externally managed session.
//!
//! One `SessionMirror` lives in the application state. It is fed by the auth
//! service's session-change stream and republishes a denormalized `User`.
//! The authenticated user is persisted under [`SESSION_USER_KEY`] so a restart
//! can restore it, provided the auth service still holds a matching session.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::StreamExt;
use serde::Serialize;
use tokio::sync::{RwLock, watch};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tracing::{debug, info, warn};

use super::user::{ProfileUpdate, User};
use crate::backend::{AuthService, AuthSession, Profile, SessionEvent};
use crate::error::{AccessError, BackendError, Error};
use crate::store::{DEFAULT_USER, SESSION_USER_KEY, SettingsStore};

/// Lifecycle of the mirrored identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "user", rename_all = "snake_case")]
pub enum SessionState {
    Unauthenticated,
    /// A session exists and its profile is being fetched.
    Loading,
    Authenticated(User),
}

impl SessionState {
    pub fn user(&self) -> Option<&User> {
        match self {
            Self::Authenticated(user) => Some(user),
            Self::Unauthenticated | Self::Loading => None,
        }
    }
}

/// Join the auth identity with its profile record.
fn user_from(session_email: &str, profile: Profile) -> User {
    let username = profile.username.unwrap_or_else(|| {
        session_email
            .split('@')
            .next()
            .unwrap_or(session_email)
            .to_string()
    });
    User {
        id: profile.id,
        username,
        email: session_email.to_string(),
        role: profile.role,
        first_name: profile.first_name,
        last_name: profile.last_name,
        avatar_url: profile.avatar_url,
    }
}

pub struct SessionMirror {
    auth: Arc<dyn AuthService>,
    settings: Arc<dyn SettingsStore>,
    state: RwLock<SessionState>,
    /// Id of the mirrored user; changes whenever the identity does.
    identity: watch::Sender<Option<String>>,
    /// Bumped on every sign-out; a profile fetch that straddles one is dropped.
    generation: AtomicU64,
}

impl SessionMirror {
    pub fn new(auth: Arc<dyn AuthService>, settings: Arc<dyn SettingsStore>) -> Self {
        let (identity, _) = watch::channel(None);
        Self {
            auth,
            settings,
            state: RwLock::new(SessionState::Unauthenticated),
            identity,
            generation: AtomicU64::new(0),
        }
    }

    /// Follow identity changes (sign-in as someone else, sign-out, expiry).
    pub fn watch_identity(&self) -> watch::Receiver<Option<String>> {
        self.identity.subscribe()
    }

    fn set_identity(&self, user_id: Option<&str>) {
        self.identity.send_if_modified(|current| {
            if current.as_deref() == user_id {
                return false;
            }
            *current = user_id.map(str::to_string);
            true
        });
    }

    /// Drop to `Unauthenticated` and announce it.
    async fn clear(&self) -> bool {
        let was_signed_in = {
            let mut state = self.state.write().await;
            self.generation.fetch_add(1, Ordering::SeqCst);
            let prev = std::mem::replace(&mut *state, SessionState::Unauthenticated);
            prev != SessionState::Unauthenticated
        };
        self.set_identity(None);
        was_signed_in
    }

    pub async fn snapshot(&self) -> SessionState {
        self.state.read().await.clone()
    }

    /// Fold one session event into the mirror.
    ///
    /// Re-applying `SignedIn` for the user already mirrored is a no-op, so the
    /// login handler and the listener task can both deliver the same event.
    pub async fn apply(&self, event: SessionEvent) -> Result<Option<User>, BackendError> {
        match event {
            SessionEvent::SignedIn(session) => self.sign_in(&session).await.map(Some),
            SessionEvent::SignedOut => {
                // Stale event: a newer sign-in already replaced that session.
                if let Some(live) = self.auth.current_session().await {
                    debug!(user_id = %live.user_id, "Ignoring sign-out superseded by a live session");
                    return Ok(self.snapshot().await.user().cloned());
                }
                if self.clear().await {
                    info!("Session cleared");
                }
                self.forget().await;
                Ok(None)
            }
        }
    }

    async fn sign_in(&self, session: &AuthSession) -> Result<User, BackendError> {
        let generation = {
            let mut state = self.state.write().await;
            if let SessionState::Authenticated(user) = &*state {
                if user.id == session.user_id {
                    return Ok(user.clone());
                }
            }
            *state = SessionState::Loading;
            self.generation.load(Ordering::SeqCst)
        };

        let profile = match self.auth.read_profile(&session.user_id).await {
            Ok(profile) => profile,
            Err(e) => {
                let mut state = self.state.write().await;
                if self.generation.load(Ordering::SeqCst) == generation {
                    *state = SessionState::Unauthenticated;
                    self.set_identity(None);
                }
                return Err(e);
            }
        };
        let user = user_from(&session.email, profile);
        if !self.publish(user.clone(), generation).await {
            debug!(user_id = %user.id, "Sign-in superseded by a sign-out during profile fetch");
            return Err(BackendError::NoSession);
        }
        info!(user_id = %user.id, role = %user.role, "Session mirrored");
        Ok(user)
    }

    /// Store `user` as the authenticated identity and persist it, unless a
    /// sign-out happened since `generation` was read.
    async fn publish(&self, user: User, generation: u64) -> bool {
        let mut state = self.state.write().await;
        if self.generation.load(Ordering::SeqCst) != generation {
            return false;
        }
        self.persist(&user).await;
        self.set_identity(Some(&user.id));
        *state = SessionState::Authenticated(user);
        true
    }

    async fn persist(&self, user: &User) {
        let value = match serde_json::to_value(user) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "Could not serialize session user");
                return;
            }
        };
        if let Err(e) = self
            .settings
            .set_setting(DEFAULT_USER, SESSION_USER_KEY, &value)
            .await
        {
            warn!(error = %e, "Could not persist session user");
        }
    }

    async fn forget(&self) {
        if let Err(e) = self
            .settings
            .delete_setting(DEFAULT_USER, SESSION_USER_KEY)
            .await
        {
            warn!(error = %e, "Could not clear persisted session user");
        }
    }

    /// Restore from the persisted user, reconciled against the live session.
    ///
    /// A persisted user is only trusted when the auth service holds a session
    /// for the same id; otherwise the live session (if any) wins.
    pub async fn restore(&self) -> Result<SessionState, Error> {
        let persisted: Option<User> = match self
            .settings
            .get_setting(DEFAULT_USER, SESSION_USER_KEY)
            .await?
        {
            Some(value) => match serde_json::from_value(value) {
                Ok(user) => Some(user),
                Err(e) => {
                    warn!(error = %e, "Discarding malformed persisted session user");
                    None
                }
            },
            None => None,
        };

        match (persisted, self.auth.current_session().await) {
            (Some(user), Some(session)) if user.id == session.user_id => {
                debug!(user_id = %user.id, "Restored persisted session user");
                self.set_identity(Some(&user.id));
                *self.state.write().await = SessionState::Authenticated(user);
            }
            (_, Some(session)) => {
                self.apply(SessionEvent::SignedIn(session)).await?;
            }
            (persisted, None) => {
                if persisted.is_some() {
                    info!("Persisted session user has no live session; clearing");
                }
                self.clear().await;
                self.forget().await;
            }
        }
        Ok(self.snapshot().await)
    }

    /// Apply a partial profile update and republish the merged user.
    pub async fn update_profile(&self, fields: &ProfileUpdate) -> Result<User, Error> {
        let current = self
            .snapshot()
            .await
            .user()
            .cloned()
            .ok_or(AccessError::Unauthenticated)?;
        if fields.is_empty() {
            return Ok(current);
        }
        let generation = self.generation.load(Ordering::SeqCst);

        let profile = self.auth.update_profile(&current.id, fields).await?;
        let mut user = user_from(&current.email, profile);
        // Fields the profile row does not echo back still reflect the update.
        user.apply(fields);
        if !self.publish(user.clone(), generation).await {
            return Err(AccessError::Unauthenticated.into());
        }
        info!(user_id = %user.id, "Profile updated");
        Ok(user)
    }

    /// Follow the auth service's session-change stream until it closes.
    pub fn spawn_listener(self: &Arc<Self>) -> JoinHandle<()> {
        let mirror = Arc::clone(self);
        let mut events = BroadcastStream::new(self.auth.subscribe());
        tokio::spawn(async move {
            while let Some(item) = events.next().await {
                match item {
                    Ok(event) => {
                        if let Err(e) = mirror.apply(event).await {
                            warn!(error = %e, "Failed to mirror session change");
                        }
                    }
                    Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                        warn!(skipped, "Session listener lagged; reconciling");
                        if let Err(e) = mirror.restore().await {
                            warn!(error = %e, "Reconcile after lag failed");
                        }
                    }
                }
            }
            debug!("Session event stream closed");
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::auth::UserRole;
    use crate::backend::MemoryBackend;
    use crate::backend::memory::DEMO_PASSWORD;
    use crate::store::LibSqlBackend;

    async fn setup() -> (Arc<MemoryBackend>, Arc<LibSqlBackend>, Arc<SessionMirror>) {
        let backend = Arc::new(MemoryBackend::with_demo_accounts());
        let settings = Arc::new(LibSqlBackend::new_memory().await.unwrap());
        let mirror = Arc::new(SessionMirror::new(backend.clone(), settings.clone()));
        (backend, settings, mirror)
    }

    async fn wait_for<F: Fn(&SessionState) -> bool>(mirror: &SessionMirror, check: F) {
        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                if check(&mirror.snapshot().await) {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("mirror did not reach expected state");
    }

    #[tokio::test]
    async fn sign_in_event_fetches_profile_and_persists() {
        let (backend, settings, mirror) = setup().await;
        let session = backend
            .sign_in("student@waypoint.com", DEMO_PASSWORD)
            .await
            .unwrap();

        let user = mirror
            .apply(SessionEvent::SignedIn(session))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.username, "student");
        assert_eq!(user.role, UserRole::Student);
        assert_eq!(user.email, "student@waypoint.com");

        let stored = settings
            .get_setting(DEFAULT_USER, SESSION_USER_KEY)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored["id"], "3");
    }

    #[tokio::test]
    async fn repeated_sign_in_is_idempotent() {
        let (backend, _, mirror) = setup().await;
        let session = backend
            .sign_in("teacher@waypoint.com", DEMO_PASSWORD)
            .await
            .unwrap();
        mirror
            .apply(SessionEvent::SignedIn(session.clone()))
            .await
            .unwrap();
        let calls = backend.call_count();
        mirror.apply(SessionEvent::SignedIn(session)).await.unwrap();
        assert_eq!(backend.call_count(), calls);
    }

    #[tokio::test]
    async fn sign_out_clears_state_and_key() {
        let (backend, settings, mirror) = setup().await;
        let session = backend
            .sign_in("admin@waypoint.com", DEMO_PASSWORD)
            .await
            .unwrap();
        mirror.apply(SessionEvent::SignedIn(session)).await.unwrap();
        backend.sign_out().await.unwrap();
        mirror.apply(SessionEvent::SignedOut).await.unwrap();

        assert_eq!(mirror.snapshot().await, SessionState::Unauthenticated);
        assert!(
            settings
                .get_setting(DEFAULT_USER, SESSION_USER_KEY)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn restore_without_live_session_clears_persisted_user() {
        let (_, settings, mirror) = setup().await;
        settings
            .set_setting(
                DEFAULT_USER,
                SESSION_USER_KEY,
                &serde_json::json!({
                    "id": "3", "username": "student", "email": "student@waypoint.com",
                    "role": "student"
                }),
            )
            .await
            .unwrap();

        let state = mirror.restore().await.unwrap();
        assert_eq!(state, SessionState::Unauthenticated);
        assert!(
            settings
                .get_setting(DEFAULT_USER, SESSION_USER_KEY)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn restore_trusts_matching_persisted_user() {
        let (backend, settings, mirror) = setup().await;
        backend
            .sign_in("student@waypoint.com", DEMO_PASSWORD)
            .await
            .unwrap();
        settings
            .set_setting(
                DEFAULT_USER,
                SESSION_USER_KEY,
                &serde_json::json!({
                    "id": "3", "username": "cached", "email": "student@waypoint.com",
                    "role": "student"
                }),
            )
            .await
            .unwrap();

        let state = mirror.restore().await.unwrap();
        assert_eq!(state.user().unwrap().username, "cached");
    }

    #[tokio::test]
    async fn restore_prefers_live_session_over_other_user() {
        let (backend, settings, mirror) = setup().await;
        backend
            .sign_in("teacher@waypoint.com", DEMO_PASSWORD)
            .await
            .unwrap();
        settings
            .set_setting(
                DEFAULT_USER,
                SESSION_USER_KEY,
                &serde_json::json!({
                    "id": "3", "username": "student", "email": "student@waypoint.com",
                    "role": "student"
                }),
            )
            .await
            .unwrap();

        let state = mirror.restore().await.unwrap();
        assert_eq!(state.user().unwrap().role, UserRole::Educator);
    }

    #[tokio::test]
    async fn stale_sign_out_is_ignored_while_session_is_live() {
        let (backend, _, mirror) = setup().await;
        let session = backend
            .sign_in("teacher@waypoint.com", DEMO_PASSWORD)
            .await
            .unwrap();
        mirror.apply(SessionEvent::SignedIn(session)).await.unwrap();

        let still = mirror.apply(SessionEvent::SignedOut).await.unwrap();
        assert_eq!(still.unwrap().role, UserRole::Educator);
        assert!(mirror.snapshot().await.user().is_some());
    }

    #[tokio::test]
    async fn listener_follows_external_sign_out() {
        let (backend, _, mirror) = setup().await;
        let handle = mirror.spawn_listener();

        backend
            .sign_in("student@waypoint.com", DEMO_PASSWORD)
            .await
            .unwrap();
        wait_for(&mirror, |s| s.user().is_some()).await;

        backend.expire_session().await;
        wait_for(&mirror, |s| *s == SessionState::Unauthenticated).await;
        handle.abort();
    }

    #[tokio::test]
    async fn update_profile_requires_session_and_merges() {
        let (backend, _, mirror) = setup().await;
        let err = mirror
            .update_profile(&ProfileUpdate {
                first_name: Some("Sam".into()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Access(AccessError::Unauthenticated)));

        let session = backend
            .sign_in("student@waypoint.com", DEMO_PASSWORD)
            .await
            .unwrap();
        mirror.apply(SessionEvent::SignedIn(session)).await.unwrap();
        let user = mirror
            .update_profile(&ProfileUpdate {
                first_name: Some("Sam".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(user.first_name.as_deref(), Some("Sam"));
        assert_eq!(user.last_name.as_deref(), Some("Example"));
        assert_eq!(mirror.snapshot().await.user().unwrap().greeting_name(), "Sam");
    }

    /// Auth service whose profile reads wait for a signal.
    struct GatedProfiles {
        inner: Arc<MemoryBackend>,
        gate: tokio::sync::Notify,
    }

    #[async_trait::async_trait]
    impl AuthService for GatedProfiles {
        async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, BackendError> {
            self.inner.sign_in(email, password).await
        }

        async fn sign_up(
            &self,
            email: &str,
            password: &str,
            attributes: &crate::backend::SignUpAttributes,
        ) -> Result<Option<AuthSession>, BackendError> {
            self.inner.sign_up(email, password, attributes).await
        }

        async fn sign_out(&self) -> Result<(), BackendError> {
            self.inner.sign_out().await
        }

        async fn current_session(&self) -> Option<AuthSession> {
            self.inner.current_session().await
        }

        fn subscribe(&self) -> tokio::sync::broadcast::Receiver<SessionEvent> {
            self.inner.subscribe()
        }

        async fn read_profile(&self, user_id: &str) -> Result<Profile, BackendError> {
            self.gate.notified().await;
            self.inner.read_profile(user_id).await
        }

        async fn update_profile(
            &self,
            user_id: &str,
            fields: &ProfileUpdate,
        ) -> Result<Profile, BackendError> {
            self.inner.update_profile(user_id, fields).await
        }
    }

    #[tokio::test]
    async fn sign_out_during_profile_fetch_wins() {
        let inner = Arc::new(MemoryBackend::with_demo_accounts());
        let gated = Arc::new(GatedProfiles {
            inner: inner.clone(),
            gate: tokio::sync::Notify::new(),
        });
        let settings = Arc::new(LibSqlBackend::new_memory().await.unwrap());
        let mirror = Arc::new(SessionMirror::new(gated.clone(), settings.clone()));

        let session = inner
            .sign_in("student@waypoint.com", DEMO_PASSWORD)
            .await
            .unwrap();
        let pending = {
            let mirror = Arc::clone(&mirror);
            tokio::spawn(async move { mirror.apply(SessionEvent::SignedIn(session)).await })
        };
        wait_for(&mirror, |s| *s == SessionState::Loading).await;

        inner.sign_out().await.unwrap();
        mirror.apply(SessionEvent::SignedOut).await.unwrap();
        gated.gate.notify_one();

        let result = pending.await.unwrap();
        assert!(matches!(result, Err(BackendError::NoSession)));
        assert_eq!(mirror.snapshot().await, SessionState::Unauthenticated);
        assert!(
            settings
                .get_setting(DEFAULT_USER, SESSION_USER_KEY)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn identity_watch_tracks_user_changes() {
        let (backend, _, mirror) = setup().await;
        let identity = mirror.watch_identity();
        assert_eq!(*identity.borrow(), None);

        let session = backend
            .sign_in("student@waypoint.com", DEMO_PASSWORD)
            .await
            .unwrap();
        mirror.apply(SessionEvent::SignedIn(session)).await.unwrap();
        assert_eq!(identity.borrow().as_deref(), Some("3"));

        backend.sign_out().await.unwrap();
        mirror.apply(SessionEvent::SignedOut).await.unwrap();
        assert_eq!(*identity.borrow(), None);
    }
}
