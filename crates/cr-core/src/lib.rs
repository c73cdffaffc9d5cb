pub mod access;
pub mod error;
pub mod events;
pub mod facade;
pub mod groups;
pub mod notices;
pub mod notify;
pub mod registrations;
pub mod service;
pub mod store;
pub mod validation;

pub mod types;

pub use crate::error::CodeReposError;
pub use crate::facade::{FacadeState, RepositoryFacade};
pub use crate::service::{CodeRepos, RequestContext};
pub use crate::store::Store;
