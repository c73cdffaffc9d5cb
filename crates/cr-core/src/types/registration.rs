use crate::types::group::GroupRef;
use crate::types::ids::{RegistrationId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Registration {
    pub id: RegistrationId,
    pub name: String,
    pub slug: String,
    pub repository_type: String,
    pub location: String,
    pub creator: UserId,
    /// `None` for global registrations.
    pub group: Option<GroupRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Registration {
    /// Whether this registration is listed under `scope` (`None` being the
    /// global listing).
    pub fn in_scope(&self, scope: Option<&GroupRef>) -> bool {
        self.group.as_ref() == scope
    }
}

impl fmt::Display for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.repository_type, self.name)
    }
}
