use cr_core::error::GroupError;
use cr_core::groups::GroupRepository;
use cr_core::types::{GroupRef, MemberGroup, UserId};
use rusqlite::{Connection, params};
use std::fmt::Display;

use crate::util::{is_constraint_violation, to_rfc3339};

pub struct GroupRepo<'a> {
    pub conn: &'a Connection,
}

impl<'a> GroupRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn members(&self, group: &GroupRef) -> Result<Vec<UserId>, GroupError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT user_id FROM group_members WHERE group_kind = ?1 AND group_id = ?2 ORDER BY user_id ASC",
            )
            .map_err(storage)?;
        let mut rows = stmt.query(params![group.kind, group.id]).map_err(storage)?;
        let mut members = Vec::new();
        while let Some(row) = rows.next().map_err(storage)? {
            let user: String = row.get(0).map_err(storage)?;
            members.push(UserId::new(user).map_err(storage)?);
        }
        Ok(members)
    }

    fn require(&self, group: &GroupRef) -> Result<(), GroupError> {
        let exists: bool = self
            .conn
            .query_row(
                "SELECT EXISTS (SELECT 1 FROM user_groups WHERE kind = ?1 AND id = ?2)",
                params![group.kind, group.id],
                |row| row.get(0),
            )
            .map_err(storage)?;
        if !exists {
            return Err(GroupError::NotFound {
                group: group.to_string(),
            });
        }
        Ok(())
    }
}

fn storage(err: impl Display) -> GroupError {
    GroupError::Storage {
        message: err.to_string(),
    }
}

impl<'a> GroupRepository for GroupRepo<'a> {
    fn create(&self, group: GroupRef, name: &str) -> Result<MemberGroup, GroupError> {
        self.conn
            .execute(
                "INSERT INTO user_groups (kind, id, name, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![group.kind, group.id, name, to_rfc3339(&chrono::Utc::now())],
            )
            .map_err(|err| {
                if is_constraint_violation(&err) {
                    GroupError::InvalidInput {
                        message: format!("group already exists: {group}"),
                    }
                } else {
                    storage(err)
                }
            })?;
        Ok(MemberGroup {
            group,
            name: name.to_string(),
            members: Vec::new(),
        })
    }

    fn get(&self, group: &GroupRef) -> Result<Option<MemberGroup>, GroupError> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM user_groups WHERE kind = ?1 AND id = ?2")
            .map_err(storage)?;
        let mut rows = stmt.query(params![group.kind, group.id]).map_err(storage)?;
        let Some(row) = rows.next().map_err(storage)? else {
            return Ok(None);
        };
        let name: String = row.get(0).map_err(storage)?;
        Ok(Some(MemberGroup {
            group: group.clone(),
            name,
            members: self.members(group)?,
        }))
    }

    fn list(&self) -> Result<Vec<MemberGroup>, GroupError> {
        let mut stmt = self
            .conn
            .prepare("SELECT kind, id, name FROM user_groups ORDER BY kind ASC, id ASC")
            .map_err(storage)?;
        let mut rows = stmt.query([]).map_err(storage)?;
        let mut groups = Vec::new();
        while let Some(row) = rows.next().map_err(storage)? {
            let kind: String = row.get(0).map_err(storage)?;
            let id: String = row.get(1).map_err(storage)?;
            let name: String = row.get(2).map_err(storage)?;
            groups.push((GroupRef::new(kind, id), name));
        }
        groups
            .into_iter()
            .map(|(group, name)| {
                let members = self.members(&group)?;
                Ok(MemberGroup {
                    group,
                    name,
                    members,
                })
            })
            .collect()
    }

    fn add_member(&self, group: &GroupRef, user: &UserId) -> Result<(), GroupError> {
        self.require(group)?;
        self.conn
            .execute(
                "INSERT OR IGNORE INTO group_members (group_kind, group_id, user_id, added_at) VALUES (?1, ?2, ?3, ?4)",
                params![
                    group.kind,
                    group.id,
                    user.as_str(),
                    to_rfc3339(&chrono::Utc::now())
                ],
            )
            .map_err(storage)?;
        Ok(())
    }

    fn remove_member(&self, group: &GroupRef, user: &UserId) -> Result<(), GroupError> {
        self.require(group)?;
        self.conn
            .execute(
                "DELETE FROM group_members WHERE group_kind = ?1 AND group_id = ?2 AND user_id = ?3",
                params![group.kind, group.id, user.as_str()],
            )
            .map_err(storage)?;
        Ok(())
    }
}
