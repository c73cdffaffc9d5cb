use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub id: String,
    pub short_id: String,
    pub author: String,
    pub author_email: String,
    pub time: DateTime<Utc>,
    pub message: String,
    pub parents: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ChangeKind {
    Added,
    Deleted,
    Modified,
    Renamed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedFile {
    pub path: String,
    pub change: ChangeKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitDetail {
    pub commit: Commit,
    pub files: Vec<ChangedFile>,
    pub unified: String,
}

/// Entry names directly below a folder, split by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderContents {
    pub files: Vec<String>,
    pub folders: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContents {
    pub path: String,
    pub name: String,
    /// Commit the content was read at.
    pub revision: String,
    pub size: u64,
    pub binary: bool,
    pub content: String,
}

#[derive(Debug, Error)]
pub enum VcsError {
    #[error("unknown repository type: {name}")]
    UnknownBackend { name: String },
    #[error("repository not found at {location}")]
    RepoNotFound { location: String },
    #[error("commit not found: {id}")]
    CommitNotFound { id: String },
    #[error("file not found: {path}")]
    FileNotFound { path: String },
    #[error("folder not found: {path}")]
    FolderNotFound { path: String },
    #[error("backend error: {reason}")]
    BackendError { reason: String },
}

pub type CommitIter<'a> = Box<dyn Iterator<Item = Result<Commit, VcsError>> + 'a>;

/// Read-only view of one opened repository.
pub trait RepositoryConnection {
    fn get_commit_by_id(&self, id: &str) -> Result<CommitDetail, VcsError>;
    /// Commits reachable from the default head, newest first by commit time.
    /// With `since`, the walk ends at the first commit older than that instant.
    fn recent_commits(&self, since: Option<DateTime<Utc>>) -> Result<CommitIter<'_>, VcsError>;
    fn list_directory(&self, path: &str, rev: Option<&str>) -> Result<FolderContents, VcsError>;
    fn file_contents(&self, path: &str, rev: Option<&str>) -> Result<FileContents, VcsError>;
}

pub trait BackendFactory: Send + Sync {
    fn name(&self) -> &str;
    fn open(&self, location: &str) -> Result<Box<dyn RepositoryConnection>, VcsError>;
}

/// Strips leading and trailing separators; the repository root becomes `""`.
pub fn normalize_path(path: &str) -> &str {
    path.trim_matches('/')
}
