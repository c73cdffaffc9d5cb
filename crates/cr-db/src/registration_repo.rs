use cr_core::error::RegistrationError;
use cr_core::registrations::RegistrationRepository;
use cr_core::types::{GroupRef, NewRegistration, Registration, RegistrationId, UserId};
use rusqlite::{Connection, params};
use std::fmt::Display;

use crate::util::{from_rfc3339, is_constraint_violation, to_rfc3339};

const COLUMNS: &str = "id, name, slug, repository_type, location, creator, group_kind, group_id, created_at, updated_at";

pub struct RegistrationRepo<'a> {
    pub conn: &'a Connection,
}

impl<'a> RegistrationRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn query(
        &self,
        filter: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<Registration>, RegistrationError> {
        let sql = format!("SELECT {COLUMNS} FROM repositories {filter}");
        let mut stmt = self.conn.prepare(&sql).map_err(storage)?;
        let mut rows = stmt.query(params).map_err(storage)?;
        let mut registrations = Vec::new();
        while let Some(row) = rows.next().map_err(storage)? {
            registrations.push(map_registration_row(row)?);
        }
        Ok(registrations)
    }
}

fn storage(err: impl Display) -> RegistrationError {
    RegistrationError::Storage {
        message: err.to_string(),
    }
}

fn scope_params(scope: Option<&GroupRef>) -> (Option<&str>, Option<&str>) {
    match scope {
        Some(group) => (Some(group.kind.as_str()), Some(group.id.as_str())),
        None => (None, None),
    }
}

impl<'a> RegistrationRepository for RegistrationRepo<'a> {
    fn create(&self, input: NewRegistration) -> Result<Registration, RegistrationError> {
        let now = chrono::Utc::now();
        let registration = Registration {
            id: RegistrationId::generate(),
            name: input.name,
            slug: input.slug,
            repository_type: input.repository_type,
            location: input.location,
            creator: input.creator,
            group: input.group,
            created_at: now,
            updated_at: now,
        };
        let (group_kind, group_id) = scope_params(registration.group.as_ref());
        let sql = format!(
            "INSERT INTO repositories ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
        );
        self.conn
            .execute(
                &sql,
                params![
                    registration.id.as_str(),
                    registration.name,
                    registration.slug,
                    registration.repository_type,
                    registration.location,
                    registration.creator.as_str(),
                    group_kind,
                    group_id,
                    to_rfc3339(&registration.created_at),
                    to_rfc3339(&registration.updated_at),
                ],
            )
            .map_err(|err| {
                if is_constraint_violation(&err) {
                    RegistrationError::SlugTaken {
                        slug: registration.slug.clone(),
                    }
                } else {
                    storage(err)
                }
            })?;
        Ok(registration)
    }

    fn get(&self, id: &RegistrationId) -> Result<Option<Registration>, RegistrationError> {
        let mut found = self.query("WHERE id = ?1", [id.as_str()])?;
        Ok(found.pop())
    }

    fn get_by_slug(
        &self,
        scope: Option<&GroupRef>,
        slug: &str,
    ) -> Result<Option<Registration>, RegistrationError> {
        let (group_kind, group_id) = scope_params(scope);
        let mut found = self.query(
            "WHERE slug = ?1 AND group_kind IS ?2 AND group_id IS ?3",
            params![slug, group_kind, group_id],
        )?;
        Ok(found.pop())
    }

    fn slug_exists(&self, slug: &str) -> Result<bool, RegistrationError> {
        self.conn
            .query_row(
                "SELECT EXISTS (SELECT 1 FROM repositories WHERE slug = ?1)",
                [slug],
                |row| row.get(0),
            )
            .map_err(storage)
    }

    fn list(&self, scope: Option<&GroupRef>) -> Result<Vec<Registration>, RegistrationError> {
        let (group_kind, group_id) = scope_params(scope);
        self.query(
            "WHERE group_kind IS ?1 AND group_id IS ?2 ORDER BY created_at ASC, id ASC",
            params![group_kind, group_id],
        )
    }

    fn list_all(&self) -> Result<Vec<Registration>, RegistrationError> {
        self.query("ORDER BY created_at ASC, id ASC", [])
    }

    fn update(&self, mut registration: Registration) -> Result<Registration, RegistrationError> {
        registration.updated_at = chrono::Utc::now();
        let affected = self
            .conn
            .execute(
                "UPDATE repositories SET name = ?1, slug = ?2, location = ?3, updated_at = ?4 WHERE id = ?5",
                params![
                    registration.name,
                    registration.slug,
                    registration.location,
                    to_rfc3339(&registration.updated_at),
                    registration.id.as_str(),
                ],
            )
            .map_err(|err| {
                if is_constraint_violation(&err) {
                    RegistrationError::SlugTaken {
                        slug: registration.slug.clone(),
                    }
                } else {
                    storage(err)
                }
            })?;
        if affected == 0 {
            return Err(RegistrationError::NotFound);
        }
        Ok(registration)
    }

    fn delete(&self, id: &RegistrationId) -> Result<(), RegistrationError> {
        let affected = self
            .conn
            .execute("DELETE FROM repositories WHERE id = ?1", [id.as_str()])
            .map_err(storage)?;
        if affected == 0 {
            return Err(RegistrationError::NotFound);
        }
        Ok(())
    }
}

fn map_registration_row(row: &rusqlite::Row<'_>) -> Result<Registration, RegistrationError> {
    let id: String = row.get(0).map_err(storage)?;
    let name: String = row.get(1).map_err(storage)?;
    let slug: String = row.get(2).map_err(storage)?;
    let repository_type: String = row.get(3).map_err(storage)?;
    let location: String = row.get(4).map_err(storage)?;
    let creator: String = row.get(5).map_err(storage)?;
    let group_kind: Option<String> = row.get(6).map_err(storage)?;
    let group_id: Option<String> = row.get(7).map_err(storage)?;
    let created_at: String = row.get(8).map_err(storage)?;
    let updated_at: String = row.get(9).map_err(storage)?;

    let group = match (group_kind, group_id) {
        (Some(kind), Some(id)) => Some(GroupRef::new(kind, id)),
        (None, None) => None,
        _ => return Err(storage("registration has a partial group reference")),
    };

    Ok(Registration {
        id: RegistrationId::new(id).map_err(storage)?,
        name,
        slug,
        repository_type,
        location,
        creator: UserId::new(creator).map_err(storage)?,
        group,
        created_at: from_rfc3339(&created_at).map_err(storage)?,
        updated_at: from_rfc3339(&updated_at).map_err(storage)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::with_test_db;

    fn new_registration(slug: &str, group: Option<GroupRef>) -> NewRegistration {
        NewRegistration {
            name: format!("Repo {slug}"),
            slug: slug.to_string(),
            repository_type: "git".to_string(),
            location: format!("/srv/git/{slug}"),
            creator: UserId::new("u".to_string()).unwrap(),
            group,
        }
    }

    #[test]
    fn create_then_get() {
        let conn = with_test_db().unwrap();
        let repo = RegistrationRepo::new(&conn);
        let created = repo.create(new_registration("alpha", None)).unwrap();

        assert_eq!(repo.get(&created.id).unwrap(), Some(created.clone()));
        assert_eq!(repo.get_by_slug(None, "alpha").unwrap(), Some(created));
    }

    #[test]
    fn slug_lookup_is_scoped() {
        let conn = with_test_db().unwrap();
        let repo = RegistrationRepo::new(&conn);
        let group = GroupRef::new("project", "1");
        let other = GroupRef::new("project", "2");
        repo.create(new_registration("grouped", Some(group.clone())))
            .unwrap();

        assert!(repo.get_by_slug(Some(&group), "grouped").unwrap().is_some());
        assert!(repo.get_by_slug(None, "grouped").unwrap().is_none());
        assert!(repo.get_by_slug(Some(&other), "grouped").unwrap().is_none());
        assert!(repo.slug_exists("grouped").unwrap());
    }

    #[test]
    fn listings_partition_registrations() {
        let conn = with_test_db().unwrap();
        let repo = RegistrationRepo::new(&conn);
        let group = GroupRef::new("project", "1");
        repo.create(new_registration("a", None)).unwrap();
        repo.create(new_registration("b", Some(group.clone())))
            .unwrap();
        repo.create(new_registration("c", Some(GroupRef::new("team", "1"))))
            .unwrap();

        let global: Vec<_> = repo.list(None).unwrap().into_iter().map(|r| r.slug).collect();
        let grouped: Vec<_> = repo
            .list(Some(&group))
            .unwrap()
            .into_iter()
            .map(|r| r.slug)
            .collect();
        assert_eq!(global, vec!["a"]);
        assert_eq!(grouped, vec!["b"]);
        assert_eq!(repo.list_all().unwrap().len(), 3);
    }

    #[test]
    fn duplicate_slug_is_rejected() {
        let conn = with_test_db().unwrap();
        let repo = RegistrationRepo::new(&conn);
        repo.create(new_registration("dup", None)).unwrap();
        let err = repo
            .create(new_registration("dup", Some(GroupRef::new("project", "1"))))
            .unwrap_err();
        assert!(matches!(err, RegistrationError::SlugTaken { slug } if slug == "dup"));
    }

    #[test]
    fn update_and_delete() {
        let conn = with_test_db().unwrap();
        let repo = RegistrationRepo::new(&conn);
        let mut created = repo.create(new_registration("old", None)).unwrap();
        created.slug = "new".to_string();
        created.name = "Renamed".to_string();
        let updated = repo.update(created.clone()).unwrap();
        assert_eq!(updated.slug, "new");
        assert!(repo.get_by_slug(None, "old").unwrap().is_none());
        assert_eq!(repo.get_by_slug(None, "new").unwrap().unwrap().name, "Renamed");

        repo.delete(&created.id).unwrap();
        assert!(repo.get(&created.id).unwrap().is_none());
        assert!(matches!(
            repo.delete(&created.id),
            Err(RegistrationError::NotFound)
        ));
    }
}
