use crate::error::{DefscopeError, Result};
use crate::lang::SourceText;
use crate::path;
use ignore::{DirEntry, WalkBuilder};
use std::fs;
use std::path::{Path, PathBuf};

/// A file or directory under the project root.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct TreeEntry {
    pub rel_path: String,
    pub is_dir: bool,
}

impl TreeEntry {
    pub fn name(&self) -> &str {
        self.rel_path.rsplit('/').next().unwrap_or(&self.rel_path)
    }
}

/// A source file selected for indexing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectFile {
    pub rel_path: String,
    pub abs_path: PathBuf,
}

/// Directory walker honoring `.gitignore`/`.ignore` rules.
///
/// Hidden entries and symlinks are skipped. Ignore files apply whether or not
/// the root is a git checkout.
#[derive(Debug, Clone)]
pub struct ProjectWalker {
    root: PathBuf,
}

impl ProjectWalker {
    pub fn new(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            return Err(DefscopeError::PathNotFound(root.display().to_string()));
        }
        let root = root.canonicalize()?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn abs_path(&self, rel: &str) -> PathBuf {
        let rel = path::normalize(rel);
        if rel == path::ROOT {
            self.root.clone()
        } else {
            self.root.join(rel)
        }
    }

    fn builder(&self, start: &Path) -> WalkBuilder {
        let mut builder = WalkBuilder::new(start);
        builder.follow_links(false).require_git(false);
        builder
    }

    fn to_entry(&self, entry: &DirEntry) -> Option<TreeEntry> {
        if entry.path_is_symlink() {
            return None;
        }
        let rel_path = path::to_rel(&self.root, entry.path())?;
        let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
        Some(TreeEntry { rel_path, is_dir })
    }

    /// Every `(path, is_dir)` pair below the root, root excluded, sorted by path.
    pub fn walk(&self) -> Vec<TreeEntry> {
        let mut entries: Vec<TreeEntry> = self
            .builder(&self.root)
            .build()
            .filter_map(|entry| match entry {
                Ok(entry) if entry.depth() > 0 => self.to_entry(&entry),
                Ok(_) => None,
                Err(e) => {
                    tracing::warn!("Walk error: {}", e);
                    None
                }
            })
            .collect();
        entries.sort();
        entries
    }

    /// Direct children of `rel_dir`, directories and files alike.
    pub fn list_dir(&self, rel_dir: &str) -> Result<Vec<TreeEntry>> {
        let dir = self.abs_path(rel_dir);
        if !dir.is_dir() {
            return Err(DefscopeError::PathNotFound(rel_dir.to_string()));
        }
        let mut entries: Vec<TreeEntry> = self
            .builder(&dir)
            .max_depth(Some(1))
            .build()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.depth() == 1)
            .filter_map(|entry| self.to_entry(&entry))
            .collect();
        entries.sort();
        Ok(entries)
    }

    /// Files accepted by `accept`, sorted by path.
    pub fn source_files(&self, accept: impl Fn(&Path) -> bool) -> Vec<ProjectFile> {
        self.walk()
            .into_iter()
            .filter(|e| !e.is_dir)
            .map(|e| ProjectFile {
                abs_path: self.abs_path(&e.rel_path),
                rel_path: e.rel_path,
            })
            .filter(|f| accept(&f.abs_path))
            .collect()
    }
}

/// Reads one source file. Unreadable or non-UTF-8 files are logged and
/// skipped.
pub fn read_source(file: &ProjectFile) -> Option<SourceText> {
    let bytes = match fs::read(&file.abs_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!("Failed to read {}: {}", file.rel_path, e);
            return None;
        }
    };
    match String::from_utf8(bytes) {
        Ok(text) => Some(SourceText::new(file.rel_path.clone(), text)),
        Err(_) => {
            tracing::warn!("Skipping non UTF-8 file {}", file.rel_path);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn touch(root: &Path, rel: &str, content: &str) {
        let p = root.join(rel);
        fs::create_dir_all(p.parent().unwrap()).unwrap();
        fs::write(p, content).unwrap();
    }

    #[test]
    fn test_walk_honors_ignore_files() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "a/x.go", "package a");
        touch(dir.path(), "vendor/v.go", "package v");
        touch(dir.path(), ".gitignore", "vendor/\n");

        let walker = ProjectWalker::new(dir.path()).unwrap();
        let paths: Vec<_> = walker.walk().into_iter().map(|e| e.rel_path).collect();
        assert_eq!(paths, vec!["a", "a/x.go"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_are_skipped() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "a/x.go", "package a");
        std::os::unix::fs::symlink(dir.path().join("a"), dir.path().join("link")).unwrap();

        let walker = ProjectWalker::new(dir.path()).unwrap();
        assert!(walker.walk().iter().all(|e| !e.rel_path.starts_with("link")));
        assert!(walker.list_dir(".").unwrap().iter().all(|e| e.rel_path != "link"));
    }

    #[test]
    fn test_list_dir_is_shallow() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "a/b/deep.go", "package b");
        touch(dir.path(), "a/x.go", "package a");

        let walker = ProjectWalker::new(dir.path()).unwrap();
        let entries = walker.list_dir("a").unwrap();
        assert_eq!(
            entries,
            vec![
                TreeEntry {
                    rel_path: "a/b".into(),
                    is_dir: true
                },
                TreeEntry {
                    rel_path: "a/x.go".into(),
                    is_dir: false
                },
            ]
        );
        assert_eq!(entries[1].name(), "x.go");
        assert!(walker.list_dir("missing").is_err());
    }

    #[test]
    fn test_source_files_and_reads() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "a/x.go", "package a");
        touch(dir.path(), "README.md", "# readme");
        fs::write(dir.path().join("bad.go"), [0xff, 0xfe, 0x00]).unwrap();

        let walker = ProjectWalker::new(dir.path()).unwrap();
        let files = walker.source_files(|p| p.extension().is_some_and(|e| e == "go"));
        assert_eq!(files.len(), 2);
        let mut texts: Vec<SourceText> = files.iter().filter_map(read_source).collect();
        texts.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
        assert_eq!(texts.len(), 1);
        assert_eq!(texts[0].rel_path, "a/x.go");
        assert_eq!(&*texts[0].text, "package a");
    }

    #[test]
    fn test_missing_root_is_error() {
        assert!(ProjectWalker::new(Path::new("/definitely/not/here")).is_err());
    }
}
