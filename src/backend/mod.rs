//! External collaborators: the hosted auth/profile service and the record store.
//!
//! Both are consumed as opaque async calls returning typed records or a
//! `BackendError`. `SupabaseBackend` talks to a hosted project over HTTP;
//! `MemoryBackend` is an in-process stand-in seeded with demo accounts.

pub mod memory;
pub mod records;
pub mod supabase;

pub use memory::MemoryBackend;
pub use supabase::SupabaseBackend;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::assessment::history::{AssessmentRecord, NewAssessment};
use crate::auth::{ProfileUpdate, UserRole};
use crate::educator::questions::{BankQuestion, QuestionDraft};
use crate::educator::templates::{AssessmentTemplate, TemplateDraft};
use crate::error::BackendError;

/// A live session issued by the auth service.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user_id: String,
    pub email: String,
    pub access_token: SecretString,
    pub refresh_token: Option<SecretString>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Session-change events published by the auth service.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    SignedIn(AuthSession),
    SignedOut,
}

/// Attributes stored alongside a new account.
#[derive(Debug, Clone, Serialize)]
pub struct SignUpAttributes {
    pub username: String,
    pub role: UserRole,
}

/// Validated profile record owned by the profile service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub id: String,
    pub username: Option<String>,
    pub role: UserRole,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub avatar_url: Option<String>,
}

/// Which records a listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope<'a> {
    /// Only records created by this user.
    Owner(&'a str),
    /// Every record (administrator review).
    All,
}

/// Auth + profile operations.
#[async_trait]
pub trait AuthService: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, BackendError>;

    /// Create an account. Returns `None` when the service requires email
    /// confirmation before issuing a session.
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        attributes: &SignUpAttributes,
    ) -> Result<Option<AuthSession>, BackendError>;

    async fn sign_out(&self) -> Result<(), BackendError>;

    async fn current_session(&self) -> Option<AuthSession>;

    /// Subscribe to session changes from now on.
    fn subscribe(&self) -> broadcast::Receiver<SessionEvent>;

    async fn read_profile(&self, user_id: &str) -> Result<Profile, BackendError>;

    async fn update_profile(
        &self,
        user_id: &str,
        fields: &ProfileUpdate,
    ) -> Result<Profile, BackendError>;
}

/// Question, template and assessment records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Newest first.
    async fn list_questions(&self, scope: Scope<'_>) -> Result<Vec<BankQuestion>, BackendError>;

    async fn insert_question(
        &self,
        creator_id: &str,
        draft: &QuestionDraft,
    ) -> Result<BankQuestion, BackendError>;

    async fn delete_question(&self, id: &str) -> Result<(), BackendError>;

    /// Newest first.
    async fn list_templates(
        &self,
        scope: Scope<'_>,
    ) -> Result<Vec<AssessmentTemplate>, BackendError>;

    async fn insert_template(
        &self,
        creator_id: &str,
        draft: &TemplateDraft,
    ) -> Result<AssessmentTemplate, BackendError>;

    async fn set_template_published(
        &self,
        id: &str,
        published: bool,
    ) -> Result<AssessmentTemplate, BackendError>;

    async fn delete_template(&self, id: &str) -> Result<(), BackendError>;

    async fn insert_assessment(
        &self,
        record: &NewAssessment,
    ) -> Result<AssessmentRecord, BackendError>;

    /// Most recent first.
    async fn list_assessments(&self, user_id: &str)
    -> Result<Vec<AssessmentRecord>, BackendError>;
}
