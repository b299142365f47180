use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use crate::error::{Error, Result};
use crate::logging::Diagnostics;
use crate::processing::classify;
use crate::types::{ContentType, SourceFile};

/// Directories and files left out of a walk, as absolute paths
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    dirs: HashSet<PathBuf>,
    files: HashSet<PathBuf>,
}

impl ExclusionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the set from literal entries plus the lines of an optional exclusions file.
    ///
    /// Each entry is looked up on disk to decide whether it excludes a directory or a
    /// file; entries that are neither are reported and ignored. The exclusions file
    /// itself is always excluded.
    pub fn compile(
        entries: &[PathBuf],
        excludes_file: Option<&Path>,
        diagnostics: &Diagnostics,
    ) -> Result<Self> {
        let mut set = Self::new();

        for entry in entries {
            if !set.add(entry) {
                diagnostics.skipped(entry, "exclusion is neither a directory nor a file");
            }
        }

        if let Some(list) = excludes_file {
            let contents = fs::read_to_string(list).map_err(|e| {
                Error::Configuration(format!(
                    "Failed to read excludes file {}: {}",
                    list.display(),
                    e
                ))
            })?;

            for line in contents.lines().map(str::trim_end).filter(|l| !l.is_empty()) {
                if !set.add(Path::new(line)) {
                    diagnostics.skipped(Path::new(line), "exclusion is neither a directory nor a file");
                }
            }

            set.files.insert(absolute(list));
        }

        diagnostics.trace(format_args!(
            "Excluding {} directories and {} files",
            set.dirs.len(),
            set.files.len()
        ));

        Ok(set)
    }

    /// Add an entry, classifying it by what it is on disk.
    ///
    /// Returns false if the path is neither a directory nor a file.
    pub fn add(&mut self, entry: &Path) -> bool {
        if entry.is_dir() {
            self.dirs.insert(absolute(entry));
        } else if entry.is_file() {
            self.files.insert(absolute(entry));
        } else {
            return false;
        }
        true
    }

    /// Exclude a directory whether or not it exists yet
    pub fn exclude_dir(&mut self, dir: &Path) {
        self.dirs.insert(absolute(dir));
    }

    pub fn is_excluded_dir(&self, path: &Path) -> bool {
        self.dirs.contains(path)
    }

    pub fn is_excluded_file(&self, path: &Path) -> bool {
        self.files.contains(path)
    }

    pub fn dirs(&self) -> impl Iterator<Item = &Path> {
        self.dirs.iter().map(PathBuf::as_path)
    }

    pub fn files(&self) -> impl Iterator<Item = &Path> {
        self.files.iter().map(PathBuf::as_path)
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty() && self.files.is_empty()
    }
}

/// Canonical absolute form of an existing path, falling back to joining the
/// current directory
pub fn absolute(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(path))
                .unwrap_or_else(|_| path.to_path_buf())
        }
    })
}

/// What the walker made of one file
#[derive(Debug)]
pub enum WalkEntry {
    /// An image or video to thumbnail
    Eligible(SourceFile),

    /// Listed in the exclusion set; never read
    Excluded(PathBuf),

    /// Neither an image nor a video
    Unsupported(PathBuf),

    /// Could not be read or listed
    Unreadable(PathBuf, Error),
}

/// Pre-order traversal of a source tree
#[derive(Debug)]
pub struct TreeWalker {
    root: PathBuf,
    exclusions: ExclusionSet,
    diagnostics: Diagnostics,
}

impl TreeWalker {
    pub fn new(root: &Path, exclusions: ExclusionSet, diagnostics: Diagnostics) -> Self {
        Self {
            root: absolute(root),
            exclusions,
            diagnostics,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn exclusions(&self) -> &ExclusionSet {
        &self.exclusions
    }

    /// Lazily yield every eligible file under the root.
    ///
    /// Each call starts a fresh traversal from the root.
    pub fn walk(&self) -> impl Iterator<Item = SourceFile> + '_ {
        self.entries().filter_map(|entry| match entry {
            WalkEntry::Eligible(source) => Some(source),
            _ => None,
        })
    }

    /// Lazily yield the outcome for every file under the root.
    ///
    /// Excluded directories are pruned before descent and excluded files are reported
    /// before any read, so neither is ever classified or hashed.
    pub fn entries(&self) -> impl Iterator<Item = WalkEntry> + '_ {
        let diagnostics = self.diagnostics;

        WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |entry| {
                let pruned = entry.depth() > 0
                    && entry.file_type().is_dir()
                    && self.exclusions.is_excluded_dir(entry.path());
                if pruned {
                    diagnostics.detail(format_args!(
                        "Skipping excluded directory {}",
                        entry.path().display()
                    ));
                }
                !pruned
            })
            .filter_map(move |result| match result {
                Ok(entry) if is_dir(&entry) => None,
                Ok(entry) if is_file_or_link(&entry) => Some(self.inspect(entry.into_path())),
                Ok(entry) => {
                    diagnostics.detail(format_args!(
                        "{} is not a regular file",
                        entry.path().display()
                    ));
                    Some(WalkEntry::Unsupported(entry.into_path()))
                }
                Err(err) => {
                    let path = err
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| self.root.clone());
                    diagnostics.file_error(&path, "walk", &err);
                    Some(WalkEntry::Unreadable(path, Error::Io(err.into())))
                }
            })
    }

    fn inspect(&self, path: PathBuf) -> WalkEntry {
        if self.exclusions.is_excluded_file(&path) {
            self.diagnostics
                .detail(format_args!("Skipping excluded file {}", path.display()));
            return WalkEntry::Excluded(path);
        }

        match classify(&path) {
            Ok(content) => match content.media_kind() {
                Some(kind) => WalkEntry::Eligible(SourceFile { path, kind }),
                None => {
                    debug_assert_eq!(content, ContentType::Unsupported);
                    self.diagnostics
                        .detail(format_args!("{} is not an image or video", path.display()));
                    WalkEntry::Unsupported(path)
                }
            },
            Err(err) => {
                self.diagnostics.file_error(&path, "classify", &err);
                WalkEntry::Unreadable(path, err)
            }
        }
    }
}

/// Directories, and symlinks that resolve to directories (never followed)
fn is_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir() || (entry.path_is_symlink() && entry.path().is_dir())
}

/// Regular files and any remaining symlinks, dangling ones included, so a broken
/// link surfaces as unreadable instead of disappearing from the walk
fn is_file_or_link(entry: &DirEntry) -> bool {
    entry.file_type().is_file() || entry.path_is_symlink()
}

// -- Tests --

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::Verbosity;
    use crate::types::MediaKind;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    const JPEG_HEADER: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];
    const MP4_HEADER: &[u8] = b"\x00\x00\x00\x20ftypisom\x00\x00\x02\x00";

    fn create_file(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
        fs::create_dir_all(dir).unwrap();
        let file_path = dir.join(name);
        let mut file = File::create(&file_path).unwrap();
        file.write_all(data).unwrap();
        absolute(&file_path)
    }

    fn setup_test_directory() -> tempfile::TempDir {
        let dir = tempdir().unwrap();
        let root = dir.path();

        create_file(root, "cat.jpg", JPEG_HEADER);
        create_file(root, "note.txt", b"NOT AN IMAGE");
        create_file(root, "clip.mp4", MP4_HEADER);
        create_file(&root.join("private"), "secret.jpg", JPEG_HEADER);
        create_file(&root.join("sub"), "dog.jpeg", JPEG_HEADER);
        create_file(&root.join("sub/deeper"), "unnamed", JPEG_HEADER);

        dir
    }

    fn names(sources: &[SourceFile]) -> Vec<String> {
        sources
            .iter()
            .map(|s| s.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_walk_classifies_by_content() {
        let dir = setup_test_directory();
        let exclusions = ExclusionSet::new();
        let walker = TreeWalker::new(dir.path(), exclusions.clone(), Diagnostics::default());

        let found: Vec<SourceFile> = walker.walk().collect();
        assert_eq!(
            names(&found),
            vec!["cat.jpg", "clip.mp4", "secret.jpg", "unnamed", "dog.jpeg"]
        );

        let clip = found.iter().find(|s| s.path.ends_with("clip.mp4")).unwrap();
        assert_eq!(clip.kind, MediaKind::Video);
        assert!(found.iter().all(|s| s.path.is_absolute()));
    }

    #[test]
    fn test_excluded_directory_is_pruned() {
        let dir = setup_test_directory();
        let exclusions =
            ExclusionSet::compile(&[dir.path().join("private")], None, &Diagnostics::default())
                .unwrap();
        let walker = TreeWalker::new(dir.path(), exclusions.clone(), Diagnostics::default());

        let entries: Vec<WalkEntry> = walker.entries().collect();
        let private = absolute(&dir.path().join("private"));
        for entry in &entries {
            let path = match entry {
                WalkEntry::Eligible(s) => &s.path,
                WalkEntry::Excluded(p) | WalkEntry::Unsupported(p) | WalkEntry::Unreadable(p, _) => p,
            };
            assert!(!path.starts_with(&private), "visited {}", path.display());
        }
        assert_eq!(walker.walk().count(), 4);
    }

    #[test]
    fn test_excluded_file_is_reported_not_classified() {
        let dir = setup_test_directory();
        let cat = dir.path().join("cat.jpg");
        let exclusions = ExclusionSet::compile(&[cat.clone()], None, &Diagnostics::default()).unwrap();
        let walker = TreeWalker::new(dir.path(), exclusions.clone(), Diagnostics::default());

        let excluded: Vec<PathBuf> = walker
            .entries()
            .filter_map(|e| match e {
                WalkEntry::Excluded(p) => Some(p),
                _ => None,
            })
            .collect();
        assert_eq!(excluded, vec![absolute(&cat)]);
        assert!(walker.walk().all(|s| !s.path.ends_with("cat.jpg")));
    }

    #[test]
    fn test_unsupported_files_are_reported() {
        let dir = setup_test_directory();
        let exclusions = ExclusionSet::new();
        let walker = TreeWalker::new(dir.path(), exclusions.clone(), Diagnostics::new(Verbosity(2)));

        let unsupported: Vec<PathBuf> = walker
            .entries()
            .filter_map(|e| match e {
                WalkEntry::Unsupported(p) => Some(p),
                _ => None,
            })
            .collect();
        assert_eq!(unsupported.len(), 1);
        assert!(unsupported[0].ends_with("note.txt"));
    }

    #[test]
    fn test_excludes_file_lines_and_itself() {
        let dir = setup_test_directory();
        let list = create_file(
            dir.path(),
            "excludes.txt",
            format!(
                "{}\n{}\n\n/nonexistent/path\n",
                dir.path().join("sub").display(),
                dir.path().join("clip.mp4").display()
            )
            .as_bytes(),
        );

        let exclusions = ExclusionSet::compile(&[], Some(&list), &Diagnostics::default()).unwrap();
        assert!(exclusions.is_excluded_dir(&absolute(&dir.path().join("sub"))));
        assert!(exclusions.is_excluded_file(&absolute(&dir.path().join("clip.mp4"))));
        assert!(exclusions.is_excluded_file(&list));
        assert_eq!(exclusions.dirs().count(), 1);
        assert_eq!(exclusions.files().count(), 2);

        let walker = TreeWalker::new(dir.path(), exclusions.clone(), Diagnostics::default());
        let found: Vec<SourceFile> = walker.walk().collect();
        assert_eq!(names(&found), vec!["cat.jpg", "secret.jpg"]);
    }

    #[test]
    fn test_missing_excludes_file_is_configuration_error() {
        let result = ExclusionSet::compile(
            &[],
            Some(Path::new("/nonexistent/excludes.txt")),
            &Diagnostics::default(),
        );
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_symlink_is_unreadable() {
        let dir = tempdir().unwrap();
        create_file(dir.path(), "cat.jpg", JPEG_HEADER);
        std::os::unix::fs::symlink(dir.path().join("gone.jpg"), dir.path().join("link.jpg"))
            .unwrap();

        let diagnostics = Diagnostics::new(Verbosity(1));
        let walker = TreeWalker::new(dir.path(), ExclusionSet::new(), diagnostics);
        let entries: Vec<WalkEntry> = walker.entries().collect();

        assert_eq!(entries.len(), 2);
        assert!(matches!(&entries[0], WalkEntry::Eligible(s) if s.path.ends_with("cat.jpg")));
        assert!(matches!(
            &entries[1],
            WalkEntry::Unreadable(p, Error::Io(_)) if p.ends_with("link.jpg")
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_directory_is_not_followed() {
        let dir = setup_test_directory();
        std::os::unix::fs::symlink(dir.path().join("sub"), dir.path().join("alias")).unwrap();

        let walker = TreeWalker::new(dir.path(), ExclusionSet::new(), Diagnostics::default());
        assert_eq!(walker.entries().count(), 6);
        assert!(walker.walk().all(|s| !s.path.to_string_lossy().contains("alias")));
    }

    #[test]
    fn test_walk_is_restartable() {
        let dir = setup_test_directory();
        let exclusions = ExclusionSet::new();
        let walker = TreeWalker::new(dir.path(), exclusions.clone(), Diagnostics::default());

        let first: Vec<SourceFile> = walker.walk().take(2).collect();
        let again: Vec<SourceFile> = walker.walk().collect();
        assert_eq!(first.len(), 2);
        assert_eq!(again.len(), 5);
        assert_eq!(first[..], again[..2]);
    }
}
