use crate::error::GroupError;
use crate::types::{GroupRef, MemberGroup, UserId};

/// Capabilities a registration's owning group must provide. Any kind of
/// entity can act as a group; only identity and membership are needed here.
pub trait Group {
    fn group_ref(&self) -> &GroupRef;
    fn name(&self) -> &str;
    fn is_member(&self, user: &UserId) -> bool;
    fn members(&self) -> Vec<UserId>;
}

/// Stored groups and their memberships.
pub trait GroupRepository {
    fn create(&self, group: GroupRef, name: &str) -> Result<MemberGroup, GroupError>;
    /// Loads the group with its current membership.
    fn get(&self, group: &GroupRef) -> Result<Option<MemberGroup>, GroupError>;
    fn list(&self) -> Result<Vec<MemberGroup>, GroupError>;
    fn add_member(&self, group: &GroupRef, user: &UserId) -> Result<(), GroupError>;
    fn remove_member(&self, group: &GroupRef, user: &UserId) -> Result<(), GroupError>;
}
