pub mod backend;
pub mod git;
pub mod registry;

pub use crate::backend::{
    BackendFactory, ChangeKind, ChangedFile, Commit, CommitDetail, CommitIter, FileContents,
    FolderContents, RepositoryConnection, VcsError,
};
pub use crate::registry::BackendRegistry;
