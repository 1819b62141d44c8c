//! In-process backend for demo mode and tests.
//!
//! Seeded with three demo accounts (one per role, password `password`).
//! Errors mimic the hosted service's wording so the same message mapping
//! applies.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use secrecy::SecretString;
use tokio::sync::{RwLock, broadcast};
use uuid::Uuid;

use super::{AuthService, AuthSession, Profile, RecordStore, Scope, SessionEvent, SignUpAttributes};
use crate::assessment::history::{AssessmentRecord, NewAssessment};
use crate::auth::{ProfileUpdate, UserRole};
use crate::educator::questions::{BankQuestion, QuestionDraft};
use crate::educator::templates::{AssessmentTemplate, TemplateDraft};
use crate::error::BackendError;

/// Password shared by the seeded demo accounts.
pub const DEMO_PASSWORD: &str = "password";

struct Account {
    user_id: String,
    password: String,
    confirmed: bool,
}

#[derive(Default)]
struct Records {
    // Insertion order; listings walk it backwards for newest-first.
    questions: Vec<BankQuestion>,
    templates: Vec<AssessmentTemplate>,
    assessments: Vec<AssessmentRecord>,
}

pub struct MemoryBackend {
    accounts: RwLock<HashMap<String, Account>>,
    profiles: RwLock<HashMap<String, Profile>>,
    session: RwLock<Option<AuthSession>>,
    records: RwLock<Records>,
    events: broadcast::Sender<SessionEvent>,
    require_confirmation: bool,
    calls: AtomicUsize,
}

impl MemoryBackend {
    /// Backend with no accounts.
    pub fn empty() -> Self {
        let (events, _) = broadcast::channel(32);
        Self {
            accounts: RwLock::new(HashMap::new()),
            profiles: RwLock::new(HashMap::new()),
            session: RwLock::new(None),
            records: RwLock::new(Records::default()),
            events,
            require_confirmation: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// Backend seeded with the demo administrator, educator and student.
    pub fn with_demo_accounts() -> Self {
        let seeds = [
            ("1", "admin@waypoint.com", "admin", UserRole::Administrator, "Admin", "User"),
            ("2", "teacher@waypoint.com", "teacher", UserRole::Educator, "Teacher", "Example"),
            ("3", "student@waypoint.com", "student", UserRole::Student, "Student", "Example"),
        ];

        let mut accounts = HashMap::new();
        let mut profiles = HashMap::new();
        for (id, email, username, role, first, last) in seeds {
            accounts.insert(
                email.to_string(),
                Account {
                    user_id: id.to_string(),
                    password: DEMO_PASSWORD.to_string(),
                    confirmed: true,
                },
            );
            profiles.insert(
                id.to_string(),
                Profile {
                    id: id.to_string(),
                    username: Some(username.to_string()),
                    role,
                    first_name: Some(first.to_string()),
                    last_name: Some(last.to_string()),
                    avatar_url: None,
                },
            );
        }

        let backend = Self::empty();
        Self {
            accounts: RwLock::new(accounts),
            profiles: RwLock::new(profiles),
            ..backend
        }
    }

    /// New sign-ups must confirm their email before they can sign in.
    pub fn requiring_confirmation(mut self) -> Self {
        self.require_confirmation = true;
        self
    }

    /// Number of service calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Drop the live session as if it had expired upstream.
    pub async fn expire_session(&self) {
        if self.session.write().await.take().is_some() {
            tracing::info!("Demo session expired");
            let _ = self.events.send(SessionEvent::SignedOut);
        }
    }

    fn count(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn issue_session(user_id: &str, email: &str) -> AuthSession {
        AuthSession {
            user_id: user_id.to_string(),
            email: email.to_string(),
            access_token: SecretString::from(Uuid::new_v4().to_string()),
            refresh_token: None,
            expires_at: None,
        }
    }

    async fn start_session(&self, session: AuthSession) {
        *self.session.write().await = Some(session.clone());
        let _ = self.events.send(SessionEvent::SignedIn(session));
    }
}

fn remote(status: u16, message: &str) -> BackendError {
    BackendError::Remote {
        status,
        message: message.to_string(),
    }
}

fn not_found(entity: &str, id: &str) -> BackendError {
    BackendError::NotFound {
        entity: entity.to_string(),
        id: id.to_string(),
    }
}

#[async_trait]
impl AuthService for MemoryBackend {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, BackendError> {
        self.count();
        let session = {
            let accounts = self.accounts.read().await;
            let account = accounts
                .get(&email.to_lowercase())
                .filter(|a| a.password == password)
                .ok_or_else(|| remote(400, "Invalid login credentials"))?;
            if !account.confirmed {
                return Err(remote(400, "Email not confirmed"));
            }
            Self::issue_session(&account.user_id, email)
        };
        self.start_session(session.clone()).await;
        Ok(session)
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        attributes: &SignUpAttributes,
    ) -> Result<Option<AuthSession>, BackendError> {
        self.count();
        let key = email.to_lowercase();
        let user_id = Uuid::new_v4().to_string();
        {
            let mut accounts = self.accounts.write().await;
            if accounts.contains_key(&key) {
                return Err(remote(422, "User already registered"));
            }
            accounts.insert(
                key,
                Account {
                    user_id: user_id.clone(),
                    password: password.to_string(),
                    confirmed: !self.require_confirmation,
                },
            );
        }
        self.profiles.write().await.insert(
            user_id.clone(),
            Profile {
                id: user_id.clone(),
                username: Some(attributes.username.clone()),
                role: attributes.role,
                first_name: None,
                last_name: None,
                avatar_url: None,
            },
        );

        if self.require_confirmation {
            return Ok(None);
        }
        let session = Self::issue_session(&user_id, email);
        self.start_session(session.clone()).await;
        Ok(Some(session))
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        self.count();
        if self.session.write().await.take().is_some() {
            let _ = self.events.send(SessionEvent::SignedOut);
        }
        Ok(())
    }

    async fn current_session(&self) -> Option<AuthSession> {
        self.count();
        self.session.read().await.clone()
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    async fn read_profile(&self, user_id: &str) -> Result<Profile, BackendError> {
        self.count();
        self.profiles
            .read()
            .await
            .get(user_id)
            .cloned()
            .ok_or_else(|| not_found("profile", user_id))
    }

    async fn update_profile(
        &self,
        user_id: &str,
        fields: &ProfileUpdate,
    ) -> Result<Profile, BackendError> {
        self.count();
        let mut profiles = self.profiles.write().await;
        let profile = profiles
            .get_mut(user_id)
            .ok_or_else(|| not_found("profile", user_id))?;
        if let Some(ref username) = fields.username {
            profile.username = Some(username.clone());
        }
        if let Some(ref first) = fields.first_name {
            profile.first_name = Some(first.clone());
        }
        if let Some(ref last) = fields.last_name {
            profile.last_name = Some(last.clone());
        }
        if let Some(ref avatar) = fields.avatar_url {
            profile.avatar_url = Some(avatar.clone());
        }
        Ok(profile.clone())
    }
}

#[async_trait]
impl RecordStore for MemoryBackend {
    async fn list_questions(&self, scope: Scope<'_>) -> Result<Vec<BankQuestion>, BackendError> {
        self.count();
        let records = self.records.read().await;
        Ok(records
            .questions
            .iter()
            .rev()
            .filter(|q| match scope {
                Scope::Owner(id) => q.creator_id == id,
                Scope::All => true,
            })
            .cloned()
            .collect())
    }

    async fn insert_question(
        &self,
        creator_id: &str,
        draft: &QuestionDraft,
    ) -> Result<BankQuestion, BackendError> {
        self.count();
        let question = BankQuestion {
            id: Uuid::new_v4().to_string(),
            creator_id: creator_id.to_string(),
            question_text: draft.question_text.clone(),
            category: draft.category.clone(),
            options: draft.options.clone(),
            created_at: Utc::now(),
        };
        self.records.write().await.questions.push(question.clone());
        Ok(question)
    }

    async fn delete_question(&self, id: &str) -> Result<(), BackendError> {
        self.count();
        let mut records = self.records.write().await;
        let before = records.questions.len();
        records.questions.retain(|q| q.id != id);
        if records.questions.len() == before {
            return Err(not_found("assessment_question", id));
        }
        Ok(())
    }

    async fn list_templates(
        &self,
        scope: Scope<'_>,
    ) -> Result<Vec<AssessmentTemplate>, BackendError> {
        self.count();
        let records = self.records.read().await;
        Ok(records
            .templates
            .iter()
            .rev()
            .filter(|t| match scope {
                Scope::Owner(id) => t.creator_id == id,
                Scope::All => true,
            })
            .cloned()
            .collect())
    }

    async fn insert_template(
        &self,
        creator_id: &str,
        draft: &TemplateDraft,
    ) -> Result<AssessmentTemplate, BackendError> {
        self.count();
        let template = AssessmentTemplate {
            id: Uuid::new_v4().to_string(),
            creator_id: creator_id.to_string(),
            title: draft.title.clone(),
            description: Some(draft.description.clone()).filter(|d| !d.is_empty()),
            question_ids: draft.question_ids.clone(),
            published: draft.published,
            created_at: Utc::now(),
        };
        self.records.write().await.templates.push(template.clone());
        Ok(template)
    }

    async fn set_template_published(
        &self,
        id: &str,
        published: bool,
    ) -> Result<AssessmentTemplate, BackendError> {
        self.count();
        let mut records = self.records.write().await;
        let template = records
            .templates
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| not_found("assessment_template", id))?;
        template.published = published;
        Ok(template.clone())
    }

    async fn delete_template(&self, id: &str) -> Result<(), BackendError> {
        self.count();
        let mut records = self.records.write().await;
        let before = records.templates.len();
        records.templates.retain(|t| t.id != id);
        if records.templates.len() == before {
            return Err(not_found("assessment_template", id));
        }
        Ok(())
    }

    async fn insert_assessment(
        &self,
        record: &NewAssessment,
    ) -> Result<AssessmentRecord, BackendError> {
        self.count();
        let stored = AssessmentRecord {
            id: Uuid::new_v4().to_string(),
            user_id: record.user_id.clone(),
            assessment_type: record.assessment_type.clone(),
            responses: record.responses.clone(),
            completed_at: record.completed_at,
        };
        self.records.write().await.assessments.push(stored.clone());
        Ok(stored)
    }

    async fn list_assessments(
        &self,
        user_id: &str,
    ) -> Result<Vec<AssessmentRecord>, BackendError> {
        self.count();
        let records = self.records.read().await;
        Ok(records
            .assessments
            .iter()
            .rev()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect())
    }
}
