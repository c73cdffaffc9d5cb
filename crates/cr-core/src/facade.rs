//! Read access to the repository behind one registration.

use crate::error::VcsError;
use crate::types::{Commit, CommitDetail, FileContents, FolderContents, Registration};
use chrono::{DateTime, Utc};
use cr_vcs::{BackendRegistry, RepositoryConnection};
use std::cell::OnceCell;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacadeState {
    Unbound,
    Bound,
}

/// Opens the backend connection on first use and keeps it for the rest of
/// its own lifetime. Each facade owns its connection; nothing is shared
/// between facades and nothing is ever reopened.
pub struct RepositoryFacade {
    registration: Registration,
    registry: Arc<BackendRegistry>,
    connection: OnceCell<Box<dyn RepositoryConnection>>,
}

impl RepositoryFacade {
    pub fn new(registration: Registration, registry: Arc<BackendRegistry>) -> Self {
        Self {
            registration,
            registry,
            connection: OnceCell::new(),
        }
    }

    pub fn registration(&self) -> &Registration {
        &self.registration
    }

    pub fn state(&self) -> FacadeState {
        if self.connection.get().is_some() {
            FacadeState::Bound
        } else {
            FacadeState::Unbound
        }
    }

    pub fn get_commit(&self, commit_id: &str) -> Result<Option<CommitDetail>, VcsError> {
        match self.connection()?.get_commit_by_id(commit_id) {
            Ok(detail) => Ok(Some(detail.into())),
            Err(cr_vcs::VcsError::CommitNotFound { .. }) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Newest first, in whatever order the backend walks history. Commits are
    /// produced lazily; the caller decides how many to take.
    pub fn get_recent_commits(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<impl Iterator<Item = Result<Commit, VcsError>> + '_, VcsError> {
        let commits = self.connection()?.recent_commits(since)?;
        Ok(commits.map(|commit| commit.map(Commit::from).map_err(VcsError::from)))
    }

    pub fn get_folder_contents(
        &self,
        path: &str,
        revision: Option<&str>,
    ) -> Result<Option<FolderContents>, VcsError> {
        match self.connection()?.list_directory(path, revision) {
            Ok(contents) => Ok(Some(contents.into())),
            Err(cr_vcs::VcsError::FolderNotFound { .. }) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    pub fn get_file_contents(
        &self,
        path: &str,
        revision: Option<&str>,
    ) -> Result<Option<FileContents>, VcsError> {
        match self.connection()?.file_contents(path, revision) {
            Ok(contents) => Ok(Some(contents.into())),
            Err(cr_vcs::VcsError::FileNotFound { .. }) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn connection(&self) -> Result<&dyn RepositoryConnection, VcsError> {
        if let Some(connection) = self.connection.get() {
            return Ok(connection.as_ref());
        }
        let factory = self.registry.resolve(&self.registration.repository_type)?;
        let connection = factory.open(&self.registration.location)?;
        tracing::debug!(
            slug = %self.registration.slug,
            backend = factory.name(),
            location = %self.registration.location,
            "bound repository connection"
        );
        Ok(self.connection.get_or_init(|| connection).as_ref())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::types::{RegistrationId, UserId};
    use cr_vcs::{BackendFactory, CommitIter};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory backend: one commit `c1`, a `docs/` folder holding
    /// `index.md`, and a `README` file. Counts how often it is opened.
    #[derive(Default)]
    pub(crate) struct FakeBackend {
        pub opens: AtomicUsize,
    }

    struct FakeConnection;

    pub(crate) fn fake_commit(id: &str, hours_ago: i64) -> cr_vcs::Commit {
        cr_vcs::Commit {
            id: id.to_string(),
            short_id: id.to_string(),
            author: "Ada".to_string(),
            author_email: "ada@example.com".to_string(),
            time: Utc::now() - chrono::Duration::hours(hours_ago),
            message: format!("commit {id}"),
            parents: Vec::new(),
        }
    }

    impl BackendFactory for FakeBackend {
        fn name(&self) -> &str {
            "fake"
        }

        fn open(&self, location: &str) -> Result<Box<dyn RepositoryConnection>, cr_vcs::VcsError> {
            self.opens.fetch_add(1, Ordering::SeqCst);
            if location == "missing" {
                return Err(cr_vcs::VcsError::RepoNotFound {
                    location: location.to_string(),
                });
            }
            Ok(Box::new(FakeConnection))
        }
    }

    impl RepositoryConnection for FakeConnection {
        fn get_commit_by_id(&self, id: &str) -> Result<cr_vcs::CommitDetail, cr_vcs::VcsError> {
            match id {
                "c1" => Ok(cr_vcs::CommitDetail {
                    commit: fake_commit("c1", 1),
                    files: Vec::new(),
                    unified: String::new(),
                }),
                "broken" => Err(cr_vcs::VcsError::BackendError {
                    reason: "corrupt object".to_string(),
                }),
                _ => Err(cr_vcs::VcsError::CommitNotFound { id: id.to_string() }),
            }
        }

        fn recent_commits(
            &self,
            since: Option<DateTime<Utc>>,
        ) -> Result<CommitIter<'_>, cr_vcs::VcsError> {
            let commits = vec![fake_commit("c3", 1), fake_commit("c2", 5), fake_commit("c1", 48)];
            Ok(Box::new(
                commits
                    .into_iter()
                    .filter(move |commit| since.is_none_or(|since| commit.time >= since))
                    .map(Ok),
            ))
        }

        fn list_directory(
            &self,
            path: &str,
            _rev: Option<&str>,
        ) -> Result<cr_vcs::FolderContents, cr_vcs::VcsError> {
            match cr_vcs::backend::normalize_path(path) {
                "" => Ok(cr_vcs::FolderContents {
                    files: vec!["README".to_string()],
                    folders: vec!["docs".to_string()],
                }),
                "docs" => Ok(cr_vcs::FolderContents {
                    files: vec!["index.md".to_string()],
                    folders: Vec::new(),
                }),
                _ => Err(cr_vcs::VcsError::FolderNotFound {
                    path: path.to_string(),
                }),
            }
        }

        fn file_contents(
            &self,
            path: &str,
            rev: Option<&str>,
        ) -> Result<cr_vcs::FileContents, cr_vcs::VcsError> {
            let path = cr_vcs::backend::normalize_path(path);
            let content = match path {
                "README" => "hello\n",
                "docs/index.md" => "# Docs\n",
                _ => {
                    return Err(cr_vcs::VcsError::FileNotFound {
                        path: path.to_string(),
                    });
                }
            };
            Ok(cr_vcs::FileContents {
                path: path.to_string(),
                name: path.rsplit('/').next().unwrap_or(path).to_string(),
                revision: rev.unwrap_or("c3").to_string(),
                size: content.len() as u64,
                binary: false,
                content: content.to_string(),
            })
        }
    }

    pub(crate) fn fake_registry(backend: Arc<FakeBackend>) -> Arc<BackendRegistry> {
        let mut registry = BackendRegistry::new();
        registry.register(backend);
        Arc::new(registry)
    }

    fn registration(location: &str) -> Registration {
        let now = Utc::now();
        Registration {
            id: RegistrationId::generate(),
            name: "Widgets".to_string(),
            slug: "widgets".to_string(),
            repository_type: "fake".to_string(),
            location: location.to_string(),
            creator: UserId::new("u".to_string()).unwrap(),
            group: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn binds_once_on_first_read() {
        let backend = Arc::new(FakeBackend::default());
        let facade = RepositoryFacade::new(registration("here"), fake_registry(backend.clone()));
        assert_eq!(facade.state(), FacadeState::Unbound);
        assert_eq!(backend.opens.load(Ordering::SeqCst), 0);

        facade.get_commit("c1").unwrap();
        facade.get_folder_contents("", None).unwrap();
        facade.get_file_contents("README", None).unwrap();

        assert_eq!(facade.state(), FacadeState::Bound);
        assert_eq!(backend.opens.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn not_found_signals_become_absent() {
        let backend = Arc::new(FakeBackend::default());
        let facade = RepositoryFacade::new(registration("here"), fake_registry(backend));

        assert_eq!(facade.get_commit("nope").unwrap(), None);
        assert_eq!(facade.get_folder_contents("nope", None).unwrap(), None);
        assert_eq!(facade.get_file_contents("nope", None).unwrap(), None);
    }

    #[test]
    fn other_failures_propagate() {
        let backend = Arc::new(FakeBackend::default());
        let facade = RepositoryFacade::new(registration("here"), fake_registry(backend.clone()));
        assert!(matches!(
            facade.get_commit("broken"),
            Err(VcsError::BackendError { .. })
        ));

        let unreachable = RepositoryFacade::new(registration("missing"), fake_registry(backend));
        assert!(matches!(
            unreachable.get_file_contents("README", None),
            Err(VcsError::RepoUnavailable { .. })
        ));
        assert_eq!(unreachable.state(), FacadeState::Unbound);
    }

    #[test]
    fn docs_is_a_folder_not_a_file() {
        let backend = Arc::new(FakeBackend::default());
        let facade = RepositoryFacade::new(registration("here"), fake_registry(backend));

        assert_eq!(facade.get_file_contents("docs/", None).unwrap(), None);
        let folder = facade.get_folder_contents("docs/", None).unwrap().unwrap();
        assert_eq!(folder.files, vec!["index.md".to_string()]);
    }

    #[test]
    fn repeated_reads_agree() {
        let backend = Arc::new(FakeBackend::default());
        let facade = RepositoryFacade::new(registration("here"), fake_registry(backend));

        let first = facade.get_file_contents("README", Some("c1")).unwrap();
        let second = facade.get_file_contents("README", Some("c1")).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn recent_commits_are_lazy_and_bounded_by_since() {
        let backend = Arc::new(FakeBackend::default());
        let facade = RepositoryFacade::new(registration("here"), fake_registry(backend));

        let first: Vec<_> = facade
            .get_recent_commits(None)
            .unwrap()
            .take(1)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].id, "c3");

        let since = Utc::now() - chrono::Duration::hours(24);
        let ids: Vec<String> = facade
            .get_recent_commits(Some(since))
            .unwrap()
            .map(|commit| commit.unwrap().id)
            .collect();
        assert_eq!(ids, vec!["c3".to_string(), "c2".to_string()]);
    }
}
