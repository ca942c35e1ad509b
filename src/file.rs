use std::path::{Path, PathBuf};

/// A file or directory as handed over by the file manager
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct FileRef {
    pub path: PathBuf,
    pub is_dir: bool,
}

impl FileRef {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            is_dir: false,
        }
    }

    pub fn dir(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            is_dir: true,
        }
    }

    /// Build from a path on disk, querying whether it is a directory
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let is_dir = path.is_dir();
        Self { path, is_dir }
    }

    /// Directory a command about this file runs in: the directory itself,
    /// or the parent of a regular file.
    pub fn working_dir(&self) -> &Path {
        if self.is_dir {
            &self.path
        } else {
            self.path.parent().unwrap_or(&self.path)
        }
    }

    /// The containing directory, `None` at the filesystem root
    pub fn parent(&self) -> Option<FileRef> {
        self.path.parent().map(FileRef::dir)
    }
}
