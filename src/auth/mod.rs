//! Identity: the mirrored user, roles and capabilities, form validation.

pub mod mirror;
pub mod role;
pub mod routes;
pub mod user;
pub mod validation;

pub use mirror::{SessionMirror, SessionState};
pub use role::{Capability, UserRole, authorize};
pub use user::{ProfileUpdate, User};
pub use validation::{LoginForm, Registration, RegistrationForm};
