//! Error types for WayPoint.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Message shown when a failure does not match any known pattern.
pub const GENERIC_FAILURE: &str = "An unexpected error occurred. Please try again.";

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("Quiz error: {0}")]
    Quiz(#[from] QuizError),

    #[error("Access error: {0}")]
    Access(#[from] AccessError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {key}. {hint}")]
    MissingRequired { key: String, hint: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Local persistence errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Failures talking to the hosted auth/profile service or record store.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The service answered with an error payload.
    #[error("{message}")]
    Remote { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("No active session")]
    NoSession,

    #[error("Malformed {entity} record: {reason}")]
    Ingest { entity: String, reason: String },
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e.to_string())
    }
}

impl BackendError {
    /// Map the error to the message shown to the user.
    ///
    /// Remote errors are matched on their text; everything else falls back to
    /// the generic failure message.
    pub fn user_message(&self) -> String {
        match self {
            Self::Remote { message, .. } => {
                if message.contains("Email not confirmed") {
                    "Please check your email to confirm your account before logging in.".into()
                } else if message.contains("Invalid login credentials") {
                    "Invalid email or password. Please try again.".into()
                } else if message.contains("already registered")
                    || message.contains("already exists")
                {
                    "User with this email already exists".into()
                } else {
                    GENERIC_FAILURE.into()
                }
            }
            Self::NoSession => "You must be logged in to do that".into(),
            Self::NotFound { .. } => "The requested item no longer exists".into(),
            Self::Http(_) | Self::Ingest { .. } => GENERIC_FAILURE.into(),
        }
    }
}

/// Form validation failures. `Display` is the exact user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("All fields are required")]
    MissingFields,

    #[error("Email and password are required")]
    MissingCredentials,

    #[error("Please enter a valid email address")]
    InvalidEmail,

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Password must be at least {min} characters long")]
    PasswordTooShort { min: usize },

    #[error("{field} is required")]
    Required { field: &'static str },

    #[error("Minimum {min} options required")]
    TooFewOptions { min: usize },

    #[error("Maximum {max} options allowed per question")]
    TooManyOptions { max: usize },

    #[error("All options must have text")]
    BlankOption,

    #[error("Please select a correct answer")]
    NoCorrectOption,

    #[error("Only one option can be marked correct")]
    MultipleCorrectOptions,

    #[error("Please select at least one question")]
    NoQuestionsSelected,

    #[error("Selected question not found")]
    UnknownQuestion { id: String },

    #[error("Please provide both a title and content for your post")]
    IncompletePost,

    #[error("Please fill in all fields to share your testimonial.")]
    IncompleteTestimonial,
}

/// Rejected quiz interactions. State is unchanged when these are returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuizError {
    #[error("Question index {index} is out of range (quiz has {total} questions)")]
    IndexOutOfRange { index: usize, total: usize },

    #[error("\"{value}\" is not an option for question {index}")]
    UnknownOption { index: usize, value: String },

    #[error("The assessment is already completed")]
    AlreadyCompleted,

    #[error("The assessment is not completed yet")]
    NotCompleted,
}

/// Authorization failures at the role boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    #[error("You must be logged in to do that")]
    Unauthenticated,

    #[error("Your {role} role cannot {action}")]
    Forbidden { role: String, action: String },
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// HTTP-facing error. Renders `{"error": message}` with a matching status.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        match e {
            Error::Validation(e) => e.into(),
            Error::Quiz(e) => e.into(),
            Error::Access(e) => e.into(),
            Error::Backend(e) => e.into(),
            Error::Config(_) | Error::Database(_) => {
                tracing::error!(error = %e, "Internal failure");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, GENERIC_FAILURE)
            }
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::bad_request(e.to_string())
    }
}

impl From<QuizError> for ApiError {
    fn from(e: QuizError) -> Self {
        let status = match e {
            QuizError::IndexOutOfRange { .. } | QuizError::UnknownOption { .. } => {
                StatusCode::BAD_REQUEST
            }
            QuizError::AlreadyCompleted | QuizError::NotCompleted => StatusCode::CONFLICT,
        };
        Self::new(status, e.to_string())
    }
}

impl From<AccessError> for ApiError {
    fn from(e: AccessError) -> Self {
        let status = match e {
            AccessError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AccessError::Forbidden { .. } => StatusCode::FORBIDDEN,
        };
        Self::new(status, e.to_string())
    }
}

impl From<BackendError> for ApiError {
    fn from(e: BackendError) -> Self {
        let status = match &e {
            BackendError::NotFound { .. } => StatusCode::NOT_FOUND,
            BackendError::NoSession | BackendError::Remote { status: 401, .. } => {
                StatusCode::UNAUTHORIZED
            }
            BackendError::Remote { status, .. } if (400..500).contains(status) => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::BAD_GATEWAY,
        };
        tracing::warn!(error = %e, "Backend call failed");
        Self::new(status, e.user_message())
    }
}

impl From<DatabaseError> for ApiError {
    fn from(e: DatabaseError) -> Self {
        Error::Database(e).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}
