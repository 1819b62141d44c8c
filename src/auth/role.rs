//! Roles, capabilities, and the single authorization boundary.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::mirror::SessionState;
use super::user::User;
use crate::error::AccessError;

/// The three account roles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    #[default]
    Student,
    Educator,
    Administrator,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Student => "student",
            Self::Educator => "educator",
            Self::Administrator => "administrator",
        };
        write!(f, "{s}")
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "student" => Ok(Self::Student),
            "educator" => Ok(Self::Educator),
            "administrator" => Ok(Self::Administrator),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// Things a signed-in user may do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    TakeAssessment,
    ViewResults,
    ManageOwnQuestions,
    ManageOwnTemplates,
    ReviewAllContent,
    ParticipateInCommunity,
}

impl Capability {
    /// Phrase used in the "cannot ..." error message.
    fn action(&self) -> &'static str {
        match self {
            Self::TakeAssessment => "take assessments",
            Self::ViewResults => "view results",
            Self::ManageOwnQuestions => "manage assessment questions",
            Self::ManageOwnTemplates => "manage assessment templates",
            Self::ReviewAllContent => "review all content",
            Self::ParticipateInCommunity => "participate in the community",
        }
    }
}

impl UserRole {
    /// Whether this role holds `capability`.
    pub fn permits(&self, capability: Capability) -> bool {
        use Capability::*;
        match self {
            Self::Student => matches!(
                capability,
                TakeAssessment | ViewResults | ParticipateInCommunity
            ),
            Self::Educator => matches!(
                capability,
                TakeAssessment
                    | ViewResults
                    | ManageOwnQuestions
                    | ManageOwnTemplates
                    | ParticipateInCommunity
            ),
            Self::Administrator => matches!(
                capability,
                TakeAssessment | ViewResults | ReviewAllContent | ParticipateInCommunity
            ),
        }
    }

    /// Static privilege list shown on the profile card.
    pub fn privileges(&self) -> &'static [&'static str] {
        match self {
            Self::Student => &[
                "Take career assessments",
                "View personalized recommendations",
                "Access learning resources",
                "Track progress over time",
            ],
            Self::Educator => &[
                "Create assessment templates",
                "View student results",
                "Access teaching resources",
                "Track student progress",
                "Provide personalized guidance",
            ],
            Self::Administrator => &[
                "Manage user accounts",
                "Configure system settings",
                "View analytics and reports",
                "Create and edit assessments",
                "Manage educational content",
            ],
        }
    }

    /// Dashboard subtitle for this role.
    pub fn dashboard_blurb(&self) -> &'static str {
        match self {
            Self::Student => "Track your career exploration journey and access your assessments.",
            Self::Educator => "Monitor student progress and access career guidance resources.",
            Self::Administrator => "Manage user accounts and access system analytics.",
        }
    }
}

/// Check that the mirrored session holds `capability` and return its user.
pub fn authorize(session: &SessionState, capability: Capability) -> Result<User, AccessError> {
    let user = session.user().ok_or(AccessError::Unauthenticated)?;
    if user.role.permits(capability) {
        Ok(user.clone())
    } else {
        Err(AccessError::Forbidden {
            role: user.role.to_string(),
            action: capability.action().to_string(),
        })
    }
}
