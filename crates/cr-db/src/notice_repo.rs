use crate::util::{decode_json, encode_json, from_rfc3339, to_rfc3339};
use cr_core::error::CodeReposError;
use cr_core::notices::NoticeRepository;
use cr_core::types::UserId;
use cr_events::notice::{Notice, Recipients, StoredNotice};
use rusqlite::{Connection, params};
use std::fmt::Display;

// `users` rows reach the listed users; `all_except` rows reach everyone else.
const LIST_FOR_USER: &str = "SELECT seq, label, context_json, at FROM notices
    WHERE seq > ?1
      AND ((audience = 'users'
              AND EXISTS (SELECT 1 FROM json_each(notices.users_json) WHERE json_each.value = ?2))
        OR (audience = 'all_except'
              AND NOT EXISTS (SELECT 1 FROM json_each(notices.users_json) WHERE json_each.value = ?2)))
    ORDER BY seq ASC
    LIMIT ?3";

pub struct NoticeRepo<'a> {
    pub conn: &'a Connection,
}

impl<'a> NoticeRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

fn internal(err: impl Display) -> CodeReposError {
    CodeReposError::Internal {
        message: err.to_string(),
    }
}

impl<'a> NoticeRepository for NoticeRepo<'a> {
    fn record(&self, notice: &Notice) -> Result<StoredNotice, CodeReposError> {
        let (audience, users) = match &notice.recipients {
            Recipients::Users(users) => ("users", users),
            Recipients::AllExcept(users) => ("all_except", users),
        };
        self.conn
            .execute(
                "INSERT INTO notices (label, audience, users_json, context_json, at) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    notice.label,
                    audience,
                    encode_json(users).map_err(internal)?,
                    encode_json(&notice.context).map_err(internal)?,
                    to_rfc3339(&notice.at),
                ],
            )
            .map_err(internal)?;
        Ok(StoredNotice {
            seq: self.conn.last_insert_rowid(),
            label: notice.label.clone(),
            context: notice.context.clone(),
            at: notice.at,
        })
    }

    fn list_for(
        &self,
        user: &UserId,
        after: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<StoredNotice>, CodeReposError> {
        let mut stmt = self.conn.prepare(LIST_FOR_USER).map_err(internal)?;
        let limit = limit.map_or(-1, i64::from);
        let mut rows = stmt
            .query(params![after.unwrap_or(0), user.as_str(), limit])
            .map_err(internal)?;
        let mut notices = Vec::new();
        while let Some(row) = rows.next().map_err(internal)? {
            let context: String = row.get(2).map_err(internal)?;
            let at: String = row.get(3).map_err(internal)?;
            notices.push(StoredNotice {
                seq: row.get(0).map_err(internal)?,
                label: row.get(1).map_err(internal)?,
                context: decode_json(&context).map_err(internal)?,
                at: from_rfc3339(&at).map_err(internal)?,
            });
        }
        Ok(notices)
    }
}
