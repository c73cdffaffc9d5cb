use crate::backend::{
    normalize_path, BackendFactory, ChangeKind, ChangedFile, Commit, CommitDetail, CommitIter,
    FileContents, FolderContents, RepositoryConnection, VcsError,
};
use chrono::{DateTime, TimeZone, Utc};
use gix::bstr::ByteSlice;
use gix::diff::blob::intern::InternedInput;
use gix::diff::blob::sink::Counter;
use gix::diff::blob::sources::lines_with_terminator;
use gix::diff::blob::{Algorithm, UnifiedDiffBuilder};
use gix::objs::tree::{EntryKind as TreeEntryKind, EntryMode};
use gix::revision::walk::Sorting;
use gix::traverse::commit::simple::CommitTimeOrder;
use gix::ObjectId;
use std::fmt::Write as _;

const DEFAULT_REVISION: &str = "HEAD";

pub struct GitBackend;

impl GitBackend {
    pub const NAME: &'static str = "git";
}

impl BackendFactory for GitBackend {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn open(&self, location: &str) -> Result<Box<dyn RepositoryConnection>, VcsError> {
        let repo = gix::open(location).map_err(|_| VcsError::RepoNotFound {
            location: location.to_string(),
        })?;
        tracing::debug!(location, "opened git repository");
        Ok(Box::new(GitConnection { repo }))
    }
}

pub struct GitConnection {
    repo: gix::Repository,
}

impl GitConnection {
    fn resolve_commit(&self, rev: &str) -> Option<gix::Commit<'_>> {
        if rev.trim().is_empty() {
            return None;
        }
        let id = self.repo.rev_parse_single(rev).ok()?;
        self.repo.find_commit(id.detach()).ok()
    }

    fn root_tree(&self, rev: Option<&str>) -> Option<(String, gix::Tree<'_>)> {
        let commit = self.resolve_commit(rev.unwrap_or(DEFAULT_REVISION))?;
        let tree = commit.tree().ok()?;
        Some((commit.id.to_string(), tree))
    }
}

impl RepositoryConnection for GitConnection {
    fn get_commit_by_id(&self, id: &str) -> Result<CommitDetail, VcsError> {
        let commit = self
            .resolve_commit(id)
            .ok_or_else(|| VcsError::CommitNotFound { id: id.to_string() })?;
        let summary = commit_summary(&commit)?;

        let head_tree = commit.tree().map_err(map_backend_error("commit tree"))?;
        let base_tree = match commit.parent_ids().next() {
            Some(parent) => self
                .repo
                .find_commit(parent.detach())
                .map_err(map_backend_error("load parent commit"))?
                .tree()
                .map_err(map_backend_error("parent tree"))?,
            None => self.repo.empty_tree(),
        };
        let changes = self
            .repo
            .diff_tree_to_tree(&base_tree, &head_tree, None)
            .map_err(map_backend_error("tree diff"))?;

        let mut files = Vec::new();
        let mut unified = String::new();
        for change in changes {
            match change {
                gix::object::tree::diff::ChangeDetached::Addition {
                    location,
                    entry_mode,
                    id,
                    ..
                } => {
                    if !is_blob_entry(entry_mode) {
                        continue;
                    }
                    let path = location.to_str_lossy().to_string();
                    let new_text = blob_text(&self.repo, id)?;
                    append_unified_diff(&mut unified, &path, &path, None, Some(new_text.as_str()))?;
                    files.push(ChangedFile {
                        path,
                        change: ChangeKind::Added,
                    });
                }
                gix::object::tree::diff::ChangeDetached::Deletion {
                    location,
                    entry_mode,
                    id,
                    ..
                } => {
                    if !is_blob_entry(entry_mode) {
                        continue;
                    }
                    let path = location.to_str_lossy().to_string();
                    let old_text = blob_text(&self.repo, id)?;
                    append_unified_diff(&mut unified, &path, &path, Some(old_text.as_str()), None)?;
                    files.push(ChangedFile {
                        path,
                        change: ChangeKind::Deleted,
                    });
                }
                gix::object::tree::diff::ChangeDetached::Modification {
                    location,
                    previous_entry_mode,
                    entry_mode,
                    previous_id,
                    id,
                    ..
                } => {
                    if !is_blob_entry(entry_mode) || !is_blob_entry(previous_entry_mode) {
                        continue;
                    }
                    let path = location.to_str_lossy().to_string();
                    let old_text = blob_text(&self.repo, previous_id)?;
                    let new_text = blob_text(&self.repo, id)?;
                    append_unified_diff(
                        &mut unified,
                        &path,
                        &path,
                        Some(old_text.as_str()),
                        Some(new_text.as_str()),
                    )?;
                    files.push(ChangedFile {
                        path,
                        change: ChangeKind::Modified,
                    });
                }
                gix::object::tree::diff::ChangeDetached::Rewrite {
                    source_location,
                    location,
                    source_entry_mode,
                    entry_mode,
                    source_id,
                    id,
                    ..
                } => {
                    if !is_blob_entry(entry_mode) || !is_blob_entry(source_entry_mode) {
                        continue;
                    }
                    let old_path = source_location.to_str_lossy().to_string();
                    let new_path = location.to_str_lossy().to_string();
                    let old_text = blob_text(&self.repo, source_id)?;
                    let new_text = blob_text(&self.repo, id)?;
                    append_unified_diff(
                        &mut unified,
                        &old_path,
                        &new_path,
                        Some(old_text.as_str()),
                        Some(new_text.as_str()),
                    )?;
                    files.push(ChangedFile {
                        path: new_path,
                        change: ChangeKind::Renamed,
                    });
                }
            }
        }

        Ok(CommitDetail {
            commit: summary,
            files,
            unified,
        })
    }

    fn recent_commits(&self, since: Option<DateTime<Utc>>) -> Result<CommitIter<'_>, VcsError> {
        let head = self.repo.head().map_err(map_backend_error("head"))?;
        let Some(head_id) = head.id() else {
            return Ok(Box::new(std::iter::empty()));
        };
        let walk = self
            .repo
            .rev_walk([head_id.detach()])
            .sorting(Sorting::ByCommitTime(CommitTimeOrder::NewestFirst))
            .all()
            .map_err(map_backend_error("rev walk"))?;
        // Newest first, so the walk ends at the first commit older than `since`.
        let commits = walk
            .map(|info| {
                let info = info.map_err(map_backend_error("walk commit"))?;
                let commit = info.object().map_err(map_backend_error("load commit"))?;
                commit_summary(&commit)
            })
            .take_while(move |item| match (item, since) {
                (Ok(commit), Some(since)) => commit.time >= since,
                _ => true,
            });
        Ok(Box::new(commits))
    }

    fn list_directory(&self, path: &str, rev: Option<&str>) -> Result<FolderContents, VcsError> {
        let missing = || VcsError::FolderNotFound {
            path: path.to_string(),
        };
        let (_, root) = self.root_tree(rev).ok_or_else(missing)?;
        let relative = normalize_path(path);
        let tree = if relative.is_empty() {
            root
        } else {
            let entry = root
                .lookup_entry_by_path(relative)
                .map_err(map_backend_error("lookup path"))?
                .ok_or_else(missing)?;
            if !is_tree_entry(entry.mode()) {
                return Err(missing());
            }
            self.repo
                .find_tree(entry.id().detach())
                .map_err(map_backend_error("load tree"))?
        };

        let decoded = tree.decode().map_err(map_backend_error("decode tree"))?;
        let mut contents = FolderContents::default();
        for entry in &decoded.entries {
            let name = entry.filename.to_str_lossy().to_string();
            if is_tree_entry(entry.mode) {
                contents.folders.push(name);
            } else {
                contents.files.push(name);
            }
        }
        Ok(contents)
    }

    fn file_contents(&self, path: &str, rev: Option<&str>) -> Result<FileContents, VcsError> {
        let missing = || VcsError::FileNotFound {
            path: path.to_string(),
        };
        let relative = normalize_path(path);
        if relative.is_empty() {
            return Err(missing());
        }
        let (revision, root) = self.root_tree(rev).ok_or_else(missing)?;
        let entry = root
            .lookup_entry_by_path(relative)
            .map_err(map_backend_error("lookup path"))?
            .ok_or_else(missing)?;
        if !is_blob_entry(entry.mode()) {
            return Err(missing());
        }
        let blob = self
            .repo
            .find_blob(entry.id().detach())
            .map_err(map_backend_error("load blob"))?;
        let name = relative.rsplit('/').next().unwrap_or(relative).to_string();
        Ok(FileContents {
            path: relative.to_string(),
            name,
            revision,
            size: blob.data.len() as u64,
            binary: blob.data.contains(&0),
            content: String::from_utf8_lossy(&blob.data).to_string(),
        })
    }
}

fn commit_summary(commit: &gix::Commit<'_>) -> Result<Commit, VcsError> {
    let decoded = commit.decode().map_err(map_backend_error("decode commit"))?;
    let message = decoded.message.to_str_lossy().trim().to_string();
    let parents = decoded.parents().map(|id| id.to_string()).collect();
    let (author, author_email, time) = match decoded.author() {
        Ok(signature) => {
            let time = signature
                .time()
                .ok()
                .and_then(|t| Utc.timestamp_opt(t.seconds, 0).single())
                .unwrap_or_default();
            (
                signature.name.to_str_lossy().to_string(),
                signature.email.to_str_lossy().to_string(),
                time,
            )
        }
        Err(_) => ("Unknown".to_string(), String::new(), DateTime::<Utc>::default()),
    };
    let id = commit.id.to_string();
    Ok(Commit {
        short_id: id.chars().take(12).collect(),
        id,
        author,
        author_email,
        time,
        message,
        parents,
    })
}

fn map_backend_error<E: std::fmt::Display>(context: &'static str) -> impl FnOnce(E) -> VcsError {
    move |err| VcsError::BackendError {
        reason: format!("{context}: {err}"),
    }
}

fn is_blob_entry(mode: EntryMode) -> bool {
    matches!(
        TreeEntryKind::from(mode),
        TreeEntryKind::Blob | TreeEntryKind::BlobExecutable
    )
}

fn is_tree_entry(mode: EntryMode) -> bool {
    matches!(TreeEntryKind::from(mode), TreeEntryKind::Tree)
}

fn blob_text(repo: &gix::Repository, id: ObjectId) -> Result<String, VcsError> {
    let blob = repo.find_blob(id).map_err(map_backend_error("load blob"))?;
    Ok(String::from_utf8_lossy(&blob.data).to_string())
}

fn append_unified_diff(
    output: &mut String,
    old_path: &str,
    new_path: &str,
    old_text: Option<&str>,
    new_text: Option<&str>,
) -> Result<(), VcsError> {
    writeln!(output, "diff --git a/{old_path} b/{new_path}")
        .map_err(map_backend_error("write diff"))?;
    let left_header = if old_text.is_some() {
        format!("a/{old_path}")
    } else {
        "/dev/null".to_string()
    };
    let right_header = if new_text.is_some() {
        format!("b/{new_path}")
    } else {
        "/dev/null".to_string()
    };
    writeln!(output, "--- {left_header}").map_err(map_backend_error("write diff"))?;
    writeln!(output, "+++ {right_header}").map_err(map_backend_error("write diff"))?;

    let diff = diff_text(old_text, new_text);
    if !diff.wrapped.is_empty() {
        output.push_str(diff.wrapped.as_str());
        if !output.ends_with('\n') {
            output.push('\n');
        }
    }
    Ok(())
}

fn diff_text(old_text: Option<&str>, new_text: Option<&str>) -> Counter<String> {
    let input = InternedInput::new(
        lines_with_terminator(old_text.unwrap_or_default()),
        lines_with_terminator(new_text.unwrap_or_default()),
    );
    gix::diff::blob::diff(
        Algorithm::Histogram,
        &input,
        Counter::new(UnifiedDiffBuilder::new(&input)),
    )
}
