//! Filesystem document source.
//!
//! Discovers Markdown files on disk and reads them safely.
//! Security properties enforced here:
//! - Symlinks are not followed by default (`follow_links: false`)
//! - Resolved paths are checked to remain within the scan root
//! - Device files, pipes, and sockets are skipped
//! - Maximum directory depth is enforced to prevent infinite recursion
//! - Bounded streaming reads prevent TOCTOU and memory `DoS`

use std::collections::HashMap;
use std::io::Read;
use std::path::{Component, Path, PathBuf};

use glob::Pattern;
use tracing::debug;
use walkdir::WalkDir;

use crate::config::FsSourceConfig;
use crate::error::{ScanError, ScanErrorKind};

/// Directories never descended into.
pub const SKIP_DIRS: &[&str] = &["target", "node_modules", ".git", "vendor"];

/// A Markdown file selected for loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    /// Path on disk, as reached from the configured root.
    pub path: PathBuf,
    /// Document id: the path relative to its root, `/`-separated.
    pub id: String,
}

/// A path that was found but could not be walked or checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    /// Document id, derived like [`DiscoveredFile::id`].
    pub id: String,
    /// Why it was skipped.
    pub error: ScanError,
}

impl SkippedFile {
    /// The root itself, or anything with no relative form, keeps its full path.
    fn under(root: &Path, error: ScanError) -> Self {
        let relative = relative_id(root, &error.file);
        let id = if relative.is_empty() {
            error.file.to_string_lossy().replace('\\', "/")
        } else {
            relative
        };
        Self { id, error }
    }
}

/// Compile exclude globs, failing on the first invalid one.
///
/// # Errors
///
/// Returns an error naming the pattern that does not parse.
pub fn compile_excludes(patterns: &[String]) -> anyhow::Result<Vec<Pattern>> {
    patterns
        .iter()
        .map(|raw| {
            Pattern::new(raw)
                .map_err(|e| anyhow::anyhow!("Invalid exclude glob pattern '{raw}': {e}"))
        })
        .collect()
}

fn matches_exclude(path: &Path, exclude_patterns: &[Pattern]) -> bool {
    let path_str = path.to_string_lossy();
    exclude_patterns.iter().any(|pattern| {
        pattern.matches(&path_str)
            || path
                .file_name()
                .is_some_and(|name| pattern.matches(&name.to_string_lossy()))
    })
}

/// `WalkDir::filter_entry` predicate: `true` keeps the entry.
fn is_not_skip_dir(entry: &walkdir::DirEntry) -> bool {
    if entry.depth() > 0
        && entry.file_type().is_dir()
        && let Some(name) = entry.file_name().to_str()
    {
        return !SKIP_DIRS.contains(&name);
    }
    true
}

fn is_markdown(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("md" | "markdown")
    )
}

/// Build the id of `path` relative to `root`.
fn relative_id(root: &Path, path: &Path) -> String {
    let relative = if root.is_file() {
        path.file_name().map_or(path, Path::new)
    } else {
        path.strip_prefix(root).unwrap_or(path)
    };
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// A path that canonicalizes outside `canonical_root`, or not at all.
fn boundary_violation(root: &Path, canonical_root: &Path, file_path: &Path) -> Option<SkippedFile> {
    let error = match file_path.canonicalize() {
        Ok(canonical_path) if !canonical_path.starts_with(canonical_root) => ScanError::new(
            file_path.to_path_buf(),
            ScanErrorKind::OutsideRoot,
            format!(
                "Path resolves outside scan root: {} -> {}",
                file_path.display(),
                canonical_path.display()
            ),
        ),
        Ok(_) => return None,
        Err(e) => ScanError::new(
            file_path.to_path_buf(),
            ScanErrorKind::IoError,
            format!("Failed to canonicalize path: {e}"),
        ),
    };
    Some(SkippedFile::under(root, error))
}

/// Find all Markdown files under the configured paths.
///
/// Returns `(files, skipped)` with files in id order. Walk errors and
/// boundary violations are returned as skipped files, never dropped.
///
/// # Errors
///
/// Returns an error if an exclude pattern is not a valid glob.
pub fn find_files(
    config: &FsSourceConfig,
) -> anyhow::Result<(Vec<DiscoveredFile>, Vec<SkippedFile>)> {
    let exclude_patterns = compile_excludes(&config.exclude)?;
    let mut files = Vec::new();
    let mut skipped = Vec::new();

    for root in &config.paths {
        // Canonicalize the root once so the boundary check is cheap per entry.
        let canonical_root = match root.canonicalize() {
            Ok(r) => r,
            Err(e) => {
                skipped.push(SkippedFile::under(
                    root,
                    ScanError::new(
                        root.clone(),
                        ScanErrorKind::IoError,
                        format!("Failed to canonicalize root path: {e}"),
                    ),
                ));
                continue;
            }
        };

        if root.is_file() {
            if is_markdown(root) && !matches_exclude(root, &exclude_patterns) {
                files.push(DiscoveredFile {
                    path: root.clone(),
                    id: relative_id(root, root),
                });
            }
            continue;
        }

        if !root.is_dir() {
            continue;
        }

        for entry_result in WalkDir::new(root)
            .follow_links(config.follow_links)
            .max_depth(config.max_depth)
            .into_iter()
            .filter_entry(is_not_skip_dir)
        {
            let entry = match entry_result {
                Ok(e) => e,
                Err(walk_err) => {
                    let path = walk_err
                        .path()
                        .map_or_else(|| root.clone(), Path::to_path_buf);
                    skipped.push(SkippedFile::under(
                        root,
                        ScanError::new(
                            path,
                            ScanErrorKind::WalkError,
                            format!("Directory traversal error: {walk_err}"),
                        ),
                    ));
                    continue;
                }
            };

            let file_path = entry.path();
            if !file_path.is_file() || !is_markdown(file_path) {
                continue;
            }

            if let Some(skip) = boundary_violation(root, &canonical_root, file_path) {
                skipped.push(skip);
                continue;
            }

            // Only regular files
            #[cfg(unix)]
            {
                use std::os::unix::fs::FileTypeExt;
                if let Ok(ft) = entry.metadata().map(|m| m.file_type())
                    && (ft.is_block_device()
                        || ft.is_char_device()
                        || ft.is_fifo()
                        || ft.is_socket())
                {
                    continue;
                }
            }

            if matches_exclude(file_path, &exclude_patterns) {
                debug!(path = %file_path.display(), "excluded");
                continue;
            }

            files.push(DiscoveredFile {
                path: file_path.to_path_buf(),
                id: relative_id(root, file_path),
            });
        }
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    files.dedup_by(|a, b| a.path == b.path);
    disambiguate_ids(&mut files);
    files.sort_by(|a, b| a.id.cmp(&b.id));
    Ok((files, skipped))
}

/// Files from different roots may share a relative id; those fall back to
/// their full path.
fn disambiguate_ids(files: &mut [DiscoveredFile]) {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    for file in files.iter() {
        *seen.entry(file.id.as_str()).or_default() += 1;
    }
    let clashing: Vec<String> = seen
        .into_iter()
        .filter(|&(_, count)| count > 1)
        .map(|(id, _)| id.to_owned())
        .collect();
    for file in files.iter_mut() {
        if clashing.contains(&file.id) {
            file.id = file.path.to_string_lossy().replace('\\', "/");
        }
    }
}

/// Read a file using a bounded streaming read, enforcing `max_file_size`.
///
/// `Read::take` makes the size check and the read one operation, so a file
/// growing between stat and read cannot blow past the limit.
///
/// # Errors
///
/// Returns a `ScanError` if the file exceeds `max_file_size`, an I/O error
/// occurs, or the content is not valid UTF-8.
pub fn read_file_bounded(path: &Path, max_file_size: u64) -> Result<String, ScanError> {
    let file = std::fs::File::open(path).map_err(|e| {
        ScanError::new(
            path.to_owned(),
            ScanErrorKind::IoError,
            format!("Failed to open file: {e}"),
        )
    })?;

    // One byte past the limit is enough to detect an oversized file.
    let mut buffer = Vec::new();
    file.take(max_file_size.saturating_add(1))
        .read_to_end(&mut buffer)
        .map_err(|e| {
            ScanError::new(
                path.to_owned(),
                ScanErrorKind::IoError,
                format!("Failed to read file: {e}"),
            )
        })?;

    if buffer.len() as u64 > max_file_size {
        return Err(ScanError::new(
            path.to_owned(),
            ScanErrorKind::FileTooLarge,
            format!("File exceeds maximum size of {max_file_size} bytes"),
        ));
    }

    String::from_utf8(buffer).map_err(|_| {
        ScanError::new(
            path.to_owned(),
            ScanErrorKind::InvalidEncoding,
            "File is not valid UTF-8".to_owned(),
        )
    })
}
