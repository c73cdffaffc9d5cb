use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("repository not found")]
    NotFound,
    #[error("slug already in use: {slug}")]
    SlugTaken { slug: String },
    #[error("unknown repository type: {name}")]
    UnknownRepositoryType { name: String },
    #[error("{message}")]
    Validation { message: String },
    #[error("{message}")]
    PermissionDenied { message: String },
    #[error("storage error: {message}")]
    Storage { message: String },
}

#[derive(Debug, Error)]
pub enum GroupError {
    #[error("group not found: {group}")]
    NotFound { group: String },
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("{message}")]
    PermissionDenied { message: String },
    #[error("storage error: {message}")]
    Storage { message: String },
}

#[derive(Debug, Error)]
pub enum VcsError {
    #[error("unknown repository type: {name}")]
    UnknownBackend { name: String },
    #[error("repository unavailable at {location}")]
    RepoUnavailable { location: String },
    #[error("{message}")]
    NotFound { message: String },
    #[error("backend error: {reason}")]
    BackendError { reason: String },
}

impl From<cr_vcs::VcsError> for VcsError {
    fn from(value: cr_vcs::VcsError) -> Self {
        match value {
            cr_vcs::VcsError::UnknownBackend { name } => Self::UnknownBackend { name },
            cr_vcs::VcsError::RepoNotFound { location } => Self::RepoUnavailable { location },
            err @ (cr_vcs::VcsError::CommitNotFound { .. }
            | cr_vcs::VcsError::FileNotFound { .. }
            | cr_vcs::VcsError::FolderNotFound { .. }) => Self::NotFound {
                message: err.to_string(),
            },
            cr_vcs::VcsError::BackendError { reason } => Self::BackendError { reason },
        }
    }
}

#[derive(Debug, Error)]
pub enum CodeReposError {
    #[error(transparent)]
    Registration(#[from] RegistrationError),
    #[error(transparent)]
    Group(#[from] GroupError),
    #[error(transparent)]
    Vcs(#[from] VcsError),
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl From<cr_vcs::VcsError> for CodeReposError {
    fn from(value: cr_vcs::VcsError) -> Self {
        CodeReposError::Vcs(VcsError::from(value))
    }
}
