//! Who may create, edit and delete registrations. Listing is scoped by
//! group and needs no check.
//!
//! Every rule is a pure function of the registration (when one exists), the
//! requesting user and the group context the request was made in.

use crate::error::{GroupError, RegistrationError};
use crate::groups::Group;
use crate::types::{Registration, UserId};

pub const MEMBERSHIP_REQUIRED: &str = "You must be a member to create tasks";
pub const EDIT_MEMBERSHIP_REQUIRED: &str = "You must be a member to edit repositories";
pub const NOT_CREATOR: &str = "You can't delete repositories that aren't yours";
pub const MANAGE_MEMBERSHIP_REQUIRED: &str = "You must be a member to manage group members";

/// Without a group there is no membership to check.
pub fn is_member(user: &UserId, group: Option<&dyn Group>) -> bool {
    group.is_none_or(|group| group.is_member(user))
}

pub fn check_create(user: &UserId, group: Option<&dyn Group>) -> Result<(), RegistrationError> {
    if is_member(user, group) {
        Ok(())
    } else {
        Err(RegistrationError::Validation {
            message: MEMBERSHIP_REQUIRED.to_string(),
        })
    }
}

/// Members of the owning group may edit; the creator is not re-checked.
/// A registration outside the request's group scope is reported as missing.
pub fn check_edit(
    registration: &Registration,
    user: &UserId,
    group: Option<&dyn Group>,
) -> Result<(), RegistrationError> {
    check_scope(registration, group)?;
    if !is_member(user, group) {
        return Err(RegistrationError::PermissionDenied {
            message: EDIT_MEMBERSHIP_REQUIRED.to_string(),
        });
    }
    check_create(user, group)
}

pub fn check_delete(
    registration: &Registration,
    user: &UserId,
    group: Option<&dyn Group>,
) -> Result<(), RegistrationError> {
    check_scope(registration, group)?;
    if registration.creator != *user {
        return Err(RegistrationError::PermissionDenied {
            message: NOT_CREATOR.to_string(),
        });
    }
    Ok(())
}

/// Only current members may add or remove members of a group.
pub fn check_manage_members(actor: &UserId, group: &dyn Group) -> Result<(), GroupError> {
    if group.is_member(actor) {
        Ok(())
    } else {
        Err(GroupError::PermissionDenied {
            message: MANAGE_MEMBERSHIP_REQUIRED.to_string(),
        })
    }
}

fn check_scope(
    registration: &Registration,
    group: Option<&dyn Group>,
) -> Result<(), RegistrationError> {
    if registration.in_scope(group.map(|group| group.group_ref())) {
        Ok(())
    } else {
        Err(RegistrationError::NotFound)
    }
}
