use cr_core::error::CodeReposError;
use cr_core::store::Store;
use rusqlite::Connection;

use crate::event_repo::EventRepo;
use crate::group_repo::GroupRepo;
use crate::notice_repo::NoticeRepo;
use crate::registration_repo::RegistrationRepo;

pub struct DbStore {
    conn: Connection,
}

impl DbStore {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

fn tx_error(err: rusqlite::Error) -> CodeReposError {
    CodeReposError::Internal {
        message: format!("transaction failed: {err}"),
    }
}

impl Store for DbStore {
    type Registrations<'a>
        = RegistrationRepo<'a>
    where
        Self: 'a;
    type Groups<'a>
        = GroupRepo<'a>
    where
        Self: 'a;
    type Events<'a>
        = EventRepo<'a>
    where
        Self: 'a;
    type Notices<'a>
        = NoticeRepo<'a>
    where
        Self: 'a;

    fn registrations(&self) -> Self::Registrations<'_> {
        RegistrationRepo::new(&self.conn)
    }

    fn groups(&self) -> Self::Groups<'_> {
        GroupRepo::new(&self.conn)
    }

    fn events(&self) -> Self::Events<'_> {
        EventRepo::new(&self.conn)
    }

    fn notices(&self) -> Self::Notices<'_> {
        NoticeRepo::new(&self.conn)
    }

    fn with_tx<F, T>(&self, f: F) -> Result<T, CodeReposError>
    where
        F: FnOnce(&Self) -> Result<T, CodeReposError>,
    {
        self.conn.execute_batch("BEGIN IMMEDIATE").map_err(tx_error)?;
        match f(self) {
            Ok(value) => {
                self.conn.execute_batch("COMMIT").map_err(tx_error)?;
                Ok(value)
            }
            Err(err) => {
                self.conn.execute_batch("ROLLBACK").map_err(tx_error)?;
                Err(err)
            }
        }
    }
}
