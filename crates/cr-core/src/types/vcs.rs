use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Commit {
    pub id: String,
    pub short_id: String,
    pub author: String,
    pub author_email: String,
    pub time: DateTime<Utc>,
    pub message: String,
    pub parents: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub enum ChangeKind {
    Added,
    Deleted,
    Modified,
    Renamed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ChangedFile {
    pub path: String,
    pub change: ChangeKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CommitDetail {
    pub commit: Commit,
    pub files: Vec<ChangedFile>,
    pub unified: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FolderContents {
    pub files: Vec<String>,
    pub folders: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FileContents {
    pub path: String,
    pub name: String,
    pub revision: String,
    pub size: u64,
    pub binary: bool,
    pub content: String,
}

impl From<cr_vcs::Commit> for Commit {
    fn from(value: cr_vcs::Commit) -> Self {
        Self {
            id: value.id,
            short_id: value.short_id,
            author: value.author,
            author_email: value.author_email,
            time: value.time,
            message: value.message,
            parents: value.parents,
        }
    }
}

impl From<cr_vcs::ChangeKind> for ChangeKind {
    fn from(value: cr_vcs::ChangeKind) -> Self {
        match value {
            cr_vcs::ChangeKind::Added => Self::Added,
            cr_vcs::ChangeKind::Deleted => Self::Deleted,
            cr_vcs::ChangeKind::Modified => Self::Modified,
            cr_vcs::ChangeKind::Renamed => Self::Renamed,
        }
    }
}

impl From<cr_vcs::CommitDetail> for CommitDetail {
    fn from(value: cr_vcs::CommitDetail) -> Self {
        Self {
            commit: value.commit.into(),
            files: value
                .files
                .into_iter()
                .map(|file| ChangedFile {
                    path: file.path,
                    change: file.change.into(),
                })
                .collect(),
            unified: value.unified,
        }
    }
}

impl From<cr_vcs::FolderContents> for FolderContents {
    fn from(value: cr_vcs::FolderContents) -> Self {
        Self {
            files: value.files,
            folders: value.folders,
        }
    }
}

impl From<cr_vcs::FileContents> for FileContents {
    fn from(value: cr_vcs::FileContents) -> Self {
        Self {
            path: value.path,
            name: value.name,
            revision: value.revision,
            size: value.size,
            binary: value.binary,
            content: value.content,
        }
    }
}
