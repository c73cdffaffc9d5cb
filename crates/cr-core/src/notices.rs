use crate::error::CodeReposError;
use crate::types::UserId;
use cr_events::notice::{Notice, StoredNotice};

pub trait NoticeRepository {
    fn record(&self, notice: &Notice) -> Result<StoredNotice, CodeReposError>;
    /// Notices addressed to `user`, oldest first.
    fn list_for(
        &self,
        user: &UserId,
        after: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<StoredNotice>, CodeReposError>;
}
