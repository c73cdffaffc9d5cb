use crate::types::vcs::{FileContents, FolderContents};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FolderEntry {
    /// Path relative to the repository root, usable for the next browse call.
    pub path: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "PascalCase")]
pub enum BrowseResult {
    File {
        path: String,
        file: FileContents,
    },
    Folder {
        path: String,
        files: Vec<FolderEntry>,
        folders: Vec<FolderEntry>,
    },
}

impl BrowseResult {
    pub fn folder(path: &str, contents: FolderContents) -> Self {
        let entries = |names: Vec<String>| {
            names
                .into_iter()
                .map(|name| FolderEntry {
                    path: join_path(path, &name),
                    name,
                })
                .collect()
        };
        Self::Folder {
            path: path.to_string(),
            files: entries(contents.files),
            folders: entries(contents.folders),
        }
    }
}

pub fn join_path(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else if base.ends_with('/') {
        format!("{base}{name}")
    } else {
        format!("{base}/{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_path_matches_posix_join() {
        assert_eq!(join_path("", "README"), "README");
        assert_eq!(join_path("docs/", "index.md"), "docs/index.md");
        assert_eq!(join_path("docs", "index.md"), "docs/index.md");
    }

    #[test]
    fn folder_entries_carry_joined_paths() {
        let result = BrowseResult::folder(
            "docs/",
            FolderContents {
                files: vec!["index.md".to_string()],
                folders: vec!["guide".to_string()],
            },
        );
        let BrowseResult::Folder { files, folders, .. } = result else {
            panic!("expected folder");
        };
        assert_eq!(files[0].path, "docs/index.md");
        assert_eq!(files[0].name, "index.md");
        assert_eq!(folders[0].path, "docs/guide");
    }
}
