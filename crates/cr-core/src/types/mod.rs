pub mod browse;
pub mod event;
pub mod group;
pub mod ids;
pub mod io;
pub mod registration;
pub mod vcs;

pub use browse::{BrowseResult, FolderEntry};
pub use event::EventBody;
pub use group::{GroupRef, MemberGroup};
pub use ids::{IdError, RegistrationId, UserId};
pub use io::{
    BrowseQuery, CommitsQuery, CreateRegistrationInput, NewRegistration, UpdateRegistrationInput,
};
pub use registration::Registration;
pub use vcs::{ChangeKind, ChangedFile, Commit, CommitDetail, FileContents, FolderContents};
