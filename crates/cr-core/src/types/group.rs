use crate::groups::Group;
use crate::types::ids::UserId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// Identity of a group owned by some other part of the system: the kind of
/// entity acting as a group plus its id within that kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
pub struct GroupRef {
    pub kind: String,
    pub id: String,
}

impl GroupRef {
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for GroupRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

impl FromStr for GroupRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((kind, id)) if !kind.is_empty() && !id.is_empty() => Ok(Self::new(kind, id)),
            _ => Err(format!("invalid group reference: {s}")),
        }
    }
}

/// A group whose membership was loaded up front.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MemberGroup {
    pub group: GroupRef,
    pub name: String,
    pub members: Vec<UserId>,
}

impl Group for MemberGroup {
    fn group_ref(&self) -> &GroupRef {
        &self.group
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn is_member(&self, user: &UserId) -> bool {
        self.members.contains(user)
    }

    fn members(&self) -> Vec<UserId> {
        self.members.clone()
    }
}
