use crate::types::group::GroupRef;
use crate::types::ids::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CreateRegistrationInput {
    pub name: String,
    pub slug: String,
    pub repository_type: String,
    pub location: String,
}

/// Repository type is not editable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UpdateRegistrationInput {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub location: Option<String>,
}

/// Validated fields handed to the store, which assigns id and timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRegistration {
    pub name: String,
    pub slug: String,
    pub repository_type: String,
    pub location: String,
    pub creator: UserId,
    pub group: Option<GroupRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema, IntoParams)]
pub struct CommitsQuery {
    pub since: Option<DateTime<Utc>>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema, IntoParams)]
pub struct BrowseQuery {
    #[serde(default)]
    pub path: String,
    pub rev: Option<String>,
}
