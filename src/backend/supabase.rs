//! Hosted backend: GoTrue auth (`/auth/v1`) and PostgREST records (`/rest/v1`).
//!
//! Every request carries the project's `apikey` header. Record and profile
//! calls authenticate with the current session's access token, falling back
//! to the anon key when signed out (row-level security then applies). Tokens
//! are refreshed shortly before expiry and once after a 401; a session that
//! cannot be refreshed ends with a sign-out event.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio::sync::{Mutex, RwLock, broadcast};

use super::records::{
    AssessmentInsert, AssessmentRow, ProfileRow, QuestionInsert, QuestionRow, TemplateInsert,
    TemplateRow, ingest_one, ingest_rows,
};
use super::{AuthService, AuthSession, Profile, RecordStore, Scope, SessionEvent, SignUpAttributes};
use crate::assessment::history::{AssessmentRecord, NewAssessment};
use crate::auth::ProfileUpdate;
use crate::educator::questions::{BankQuestion, QuestionDraft};
use crate::educator::templates::{AssessmentTemplate, TemplateDraft};
use crate::error::BackendError;

const QUESTIONS: &str = "assessment_questions";
const TEMPLATES: &str = "assessment_templates";
const ASSESSMENTS: &str = "assessments";
const PROFILES: &str = "profiles";

/// GoTrue token response (sign-in, and sign-up when auto-confirm is on).
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: GoTrueUser,
}

#[derive(Debug, Deserialize)]
struct GoTrueUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

/// Sign-up returns either a session or the bare user awaiting confirmation.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(TokenResponse),
    Pending(GoTrueUser),
}

impl TokenResponse {
    fn into_session(self, fallback_email: &str) -> AuthSession {
        AuthSession {
            user_id: self.user.id,
            email: self.user.email.unwrap_or_else(|| fallback_email.to_string()),
            access_token: SecretString::from(self.access_token),
            refresh_token: self.refresh_token.map(SecretString::from),
            expires_at: self
                .expires_at
                .and_then(|ts| Utc.timestamp_opt(ts, 0).single()),
        }
    }
}

/// Client for a hosted Supabase project.
pub struct SupabaseBackend {
    base_url: String,
    anon_key: SecretString,
    client: reqwest::Client,
    session: RwLock<Option<AuthSession>>,
    /// Serializes token refreshes.
    refreshing: Mutex<()>,
    events: broadcast::Sender<SessionEvent>,
}

impl SupabaseBackend {
    pub fn new(base_url: impl Into<String>, anon_key: SecretString) -> Self {
        let (events, _) = broadcast::channel(32);
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            anon_key,
            client: reqwest::Client::new(),
            session: RwLock::new(None),
            refreshing: Mutex::new(()),
            events,
        }
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{path}", self.base_url)
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }

    /// Build a request with the project key and the session's bearer token,
    /// or the anon key when signed out.
    fn request(
        &self,
        method: reqwest::Method,
        url: &str,
        session: Option<&AuthSession>,
    ) -> reqwest::RequestBuilder {
        let bearer = match session {
            Some(s) => s.access_token.expose_secret(),
            None => self.anon_key.expose_secret(),
        };
        self.client
            .request(method, url)
            .header("apikey", self.anon_key.expose_secret())
            .bearer_auth(bearer)
    }

    fn publish(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    /// The stored session, refreshed when it is about to expire. An expired
    /// session that cannot be refreshed is dropped and reported as signed out.
    async fn live_session(&self) -> Option<AuthSession> {
        let session = self.session.read().await.clone()?;
        if !needs_refresh(&session) {
            return Some(session);
        }
        let _refreshing = self.refreshing.lock().await;
        // Another caller may have refreshed while we waited.
        let session = self.session.read().await.clone()?;
        if !needs_refresh(&session) {
            return Some(session);
        }
        match self.refresh(&session).await {
            Ok(fresh) => Some(fresh),
            Err(e) if is_expired(&session) => {
                tracing::warn!(error = %e, "Session expired and could not be refreshed");
                self.drop_session(&session).await;
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "Token refresh failed; keeping current token");
                Some(session)
            }
        }
    }

    /// Exchange the refresh token for a new session.
    async fn refresh(&self, stale: &AuthSession) -> Result<AuthSession, BackendError> {
        let Some(refresh_token) = stale.refresh_token.as_ref() else {
            return Err(BackendError::NoSession);
        };
        let resp = self
            .client
            .post(self.auth_url("token"))
            .query(&[("grant_type", "refresh_token")])
            .header("apikey", self.anon_key.expose_secret())
            .json(&serde_json::json!({ "refresh_token": refresh_token.expose_secret() }))
            .send()
            .await?;
        let body = json_or_error(resp).await?;
        let token: TokenResponse = serde_json::from_value(body)
            .map_err(|e| BackendError::Http(format!("unexpected token response: {e}")))?;
        let session = token.into_session(&stale.email);

        {
            let mut guard = self.session.write().await;
            match guard.as_ref() {
                Some(current) if same_token(current, stale) => {}
                // Signed in again while refreshing.
                Some(current) => return Ok(current.clone()),
                None => return Err(BackendError::NoSession),
            }
            *guard = Some(session.clone());
        }
        tracing::info!(user_id = %session.user_id, "Session refreshed");
        self.publish(SessionEvent::SignedIn(session.clone()));
        Ok(session)
    }

    /// Forget `stale` if it is still the stored session.
    async fn drop_session(&self, stale: &AuthSession) {
        let mut guard = self.session.write().await;
        if guard.as_ref().is_some_and(|s| same_token(s, stale)) {
            *guard = None;
            drop(guard);
            tracing::info!(user_id = %stale.user_id, "Session ended");
            self.publish(SessionEvent::SignedOut);
        }
    }

    /// After the server rejected `rejected`, refresh it once or end it.
    async fn recover_rejected(&self, rejected: &AuthSession) -> Option<AuthSession> {
        let _refreshing = self.refreshing.lock().await;
        let current = self.session.read().await.clone()?;
        if !same_token(&current, rejected) {
            return Some(current);
        }
        match self.refresh(&current).await {
            Ok(fresh) => Some(fresh),
            Err(e) => {
                tracing::warn!(error = %e, "Rejected token could not be refreshed");
                self.drop_session(&current).await;
                None
            }
        }
    }

    /// Send a record request, retrying once with a refreshed token on 401.
    async fn send<F>(
        &self,
        method: reqwest::Method,
        url: String,
        build: F,
    ) -> Result<serde_json::Value, BackendError>
    where
        F: Fn(reqwest::RequestBuilder) -> reqwest::RequestBuilder + Send + Sync,
    {
        let session = self.live_session().await;
        let resp = build(self.request(method.clone(), &url, session.as_ref()))
            .send()
            .await?;
        if resp.status() == reqwest::StatusCode::UNAUTHORIZED {
            if let Some(rejected) = session {
                tracing::debug!(url = %url, "Access token rejected; refreshing");
                if let Some(fresh) = self.recover_rejected(&rejected).await {
                    let retry = build(self.request(method, &url, Some(&fresh)))
                        .send()
                        .await?;
                    return json_or_error(retry).await;
                }
            }
        }
        json_or_error(resp).await
    }

    async fn select(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<serde_json::Value, BackendError> {
        self.send(reqwest::Method::GET, self.rest_url(table), |req| {
            req.query(query)
        })
        .await
    }

    async fn insert<B: serde::Serialize + Sync>(
        &self,
        table: &str,
        body: &B,
    ) -> Result<serde_json::Value, BackendError> {
        self.send(reqwest::Method::POST, self.rest_url(table), |req| {
            req.header("Prefer", "return=representation").json(body)
        })
        .await
    }

    async fn patch<B: serde::Serialize + Sync>(
        &self,
        table: &str,
        id: &str,
        body: &B,
    ) -> Result<serde_json::Value, BackendError> {
        self.send(reqwest::Method::PATCH, self.rest_url(table), |req| {
            req.query(&[("id", format!("eq.{id}"))])
                .header("Prefer", "return=representation")
                .json(body)
        })
        .await
    }

    async fn delete(&self, table: &str, id: &str) -> Result<(), BackendError> {
        self.send(reqwest::Method::DELETE, self.rest_url(table), |req| {
            req.query(&[("id", format!("eq.{id}"))])
        })
        .await
        .map(|_| ())
    }
}

fn same_token(a: &AuthSession, b: &AuthSession) -> bool {
    a.access_token.expose_secret() == b.access_token.expose_secret()
}

fn is_expired(session: &AuthSession) -> bool {
    session.expires_at.is_some_and(|exp| exp <= Utc::now())
}

/// Refresh tokens that expire within this many seconds.
const REFRESH_MARGIN_SECS: i64 = 60;

fn needs_refresh(session: &AuthSession) -> bool {
    session
        .expires_at
        .is_some_and(|exp| exp - chrono::Duration::seconds(REFRESH_MARGIN_SECS) <= Utc::now())
}

/// Pull the human-readable message out of a GoTrue/PostgREST error body.
fn error_message(body: &str) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    parsed
        .as_ref()
        .and_then(|v| {
            ["error_description", "msg", "message", "error"]
                .iter()
                .find_map(|k| v.get(*k).and_then(|m| m.as_str()))
        })
        .map(str::to_string)
        .unwrap_or_else(|| body.trim().to_string())
}

async fn json_or_error(resp: reqwest::Response) -> Result<serde_json::Value, BackendError> {
    let status = resp.status();
    let body = resp.text().await?;
    if !status.is_success() {
        return Err(BackendError::Remote {
            status: status.as_u16(),
            message: error_message(&body),
        });
    }
    if body.trim().is_empty() {
        return Ok(serde_json::Value::Null);
    }
    serde_json::from_str(&body).map_err(|e| BackendError::Http(format!("invalid JSON body: {e}")))
}

/// Newest-first listing, optionally restricted to one creator.
fn owner_query(scope: Scope<'_>) -> Vec<(&'static str, String)> {
    let mut query = vec![
        ("select", "*".to_string()),
        ("order", "created_at.desc".to_string()),
    ];
    if let Scope::Owner(id) = scope {
        query.push(("creator_id", format!("eq.{id}")));
    }
    query
}

#[async_trait]
impl AuthService for SupabaseBackend {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, BackendError> {
        let resp = self
            .client
            .post(self.auth_url("token"))
            .query(&[("grant_type", "password")])
            .header("apikey", self.anon_key.expose_secret())
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;
        let body = json_or_error(resp).await?;
        let token: TokenResponse = serde_json::from_value(body)
            .map_err(|e| BackendError::Http(format!("unexpected token response: {e}")))?;
        let session = token.into_session(email);

        *self.session.write().await = Some(session.clone());
        tracing::info!(user_id = %session.user_id, "Signed in");
        self.publish(SessionEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        attributes: &SignUpAttributes,
    ) -> Result<Option<AuthSession>, BackendError> {
        let resp = self
            .client
            .post(self.auth_url("signup"))
            .header("apikey", self.anon_key.expose_secret())
            .json(&serde_json::json!({
                "email": email,
                "password": password,
                "data": attributes,
            }))
            .send()
            .await?;
        let body = json_or_error(resp).await?;
        let parsed: SignUpResponse = serde_json::from_value(body)
            .map_err(|e| BackendError::Http(format!("unexpected sign-up response: {e}")))?;

        match parsed {
            SignUpResponse::Session(token) => {
                let session = token.into_session(email);
                *self.session.write().await = Some(session.clone());
                tracing::info!(user_id = %session.user_id, "Registered and signed in");
                self.publish(SessionEvent::SignedIn(session.clone()));
                Ok(Some(session))
            }
            SignUpResponse::Pending(user) => {
                tracing::info!(user_id = %user.id, "Registered; awaiting email confirmation");
                Ok(None)
            }
        }
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        let Some(session) = self.session.write().await.take() else {
            return Ok(());
        };
        let resp = self
            .client
            .post(self.auth_url("logout"))
            .header("apikey", self.anon_key.expose_secret())
            .bearer_auth(session.access_token.expose_secret())
            .send()
            .await;
        // The local session is gone either way; a failed revoke only logs.
        match resp {
            Ok(r) if !r.status().is_success() => {
                tracing::warn!(status = %r.status(), "Remote sign-out rejected");
            }
            Err(e) => tracing::warn!(error = %e, "Remote sign-out failed"),
            Ok(_) => {}
        }
        self.publish(SessionEvent::SignedOut);
        Ok(())
    }

    async fn current_session(&self) -> Option<AuthSession> {
        self.live_session().await
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    async fn read_profile(&self, user_id: &str) -> Result<Profile, BackendError> {
        let body = self
            .select(
                PROFILES,
                &[("select", "*".to_string()), ("id", format!("eq.{user_id}"))],
            )
            .await?;
        match ingest_rows::<ProfileRow, Profile>("profile", body)?.into_iter().next() {
            Some(p) => Ok(p),
            None => Err(BackendError::NotFound {
                entity: "profile".into(),
                id: user_id.into(),
            }),
        }
    }

    async fn update_profile(
        &self,
        user_id: &str,
        fields: &ProfileUpdate,
    ) -> Result<Profile, BackendError> {
        let mut body = serde_json::to_value(fields)
            .map_err(|e| BackendError::Http(format!("cannot encode profile update: {e}")))?;
        if let Some(obj) = body.as_object_mut() {
            obj.insert("updated_at".into(), serde_json::json!(Utc::now()));
        }
        let body = self.patch(PROFILES, user_id, &body).await?;
        ingest_one::<ProfileRow, Profile>("profile", body)
    }
}

#[async_trait]
impl RecordStore for SupabaseBackend {
    async fn list_questions(&self, scope: Scope<'_>) -> Result<Vec<BankQuestion>, BackendError> {
        let body = self.select(QUESTIONS, &owner_query(scope)).await?;
        ingest_rows::<QuestionRow, _>("assessment_question", body)
    }

    async fn insert_question(
        &self,
        creator_id: &str,
        draft: &QuestionDraft,
    ) -> Result<BankQuestion, BackendError> {
        let body = self
            .insert(QUESTIONS, &QuestionInsert::new(creator_id, draft))
            .await?;
        ingest_one::<QuestionRow, _>("assessment_question", body)
    }

    async fn delete_question(&self, id: &str) -> Result<(), BackendError> {
        self.delete(QUESTIONS, id).await
    }

    async fn list_templates(
        &self,
        scope: Scope<'_>,
    ) -> Result<Vec<AssessmentTemplate>, BackendError> {
        let body = self.select(TEMPLATES, &owner_query(scope)).await?;
        ingest_rows::<TemplateRow, _>("assessment_template", body)
    }

    async fn insert_template(
        &self,
        creator_id: &str,
        draft: &TemplateDraft,
    ) -> Result<AssessmentTemplate, BackendError> {
        let body = self
            .insert(TEMPLATES, &TemplateInsert::new(creator_id, draft))
            .await?;
        ingest_one::<TemplateRow, _>("assessment_template", body)
    }

    async fn set_template_published(
        &self,
        id: &str,
        published: bool,
    ) -> Result<AssessmentTemplate, BackendError> {
        let body = self
            .patch(TEMPLATES, id, &serde_json::json!({ "published": published }))
            .await?;
        match body {
            serde_json::Value::Array(ref rows) if rows.is_empty() => Err(BackendError::NotFound {
                entity: "assessment_template".into(),
                id: id.into(),
            }),
            body => ingest_one::<TemplateRow, _>("assessment_template", body),
        }
    }

    async fn delete_template(&self, id: &str) -> Result<(), BackendError> {
        self.delete(TEMPLATES, id).await
    }

    async fn insert_assessment(
        &self,
        record: &NewAssessment,
    ) -> Result<AssessmentRecord, BackendError> {
        let body = self
            .insert(ASSESSMENTS, &AssessmentInsert::from(record))
            .await?;
        ingest_one::<AssessmentRow, _>("assessment", body)
    }

    async fn list_assessments(
        &self,
        user_id: &str,
    ) -> Result<Vec<AssessmentRecord>, BackendError> {
        let query = [
            ("select", "*".to_string()),
            ("user_id", format!("eq.{user_id}")),
            ("order", "completed_at.desc".to_string()),
        ];
        let body = self.select(ASSESSMENTS, &query).await?;
        ingest_rows::<AssessmentRow, _>("assessment", body)
    }
}
