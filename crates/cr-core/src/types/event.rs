use crate::types::{GroupRef, Registration, RegistrationId, UserId};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", content = "payload")]
pub enum EventBody {
    RepositoryCreated {
        registration: Registration,
    },
    RepositoryUpdated {
        registration: Registration,
    },
    RepositoryDeleted {
        id: RegistrationId,
        slug: String,
        group: Option<GroupRef>,
        deleted_by: UserId,
    },
}
