// File selection: turns one of the three selection modes into a sorted,
// deduplicated list of readable CSX files.
//
// Everything here takes the working directory and home directory as
// arguments so the selection can be exercised against a temporary tree.

use glob::Pattern;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;
use tracing::{debug, warn};

/// Extension (without the dot) of the files this tool publishes.
pub const CSX_EXTENSION: &str = "csx";

/// How the files to upload are chosen. Exactly one mode applies per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Most recently modified CSX in the working directory.
    LastHere,
    /// Literal file names and glob strings, as typed on the command line.
    Files(Vec<String>),
    /// Every CSX in or below a directory.
    Within(PathBuf),
}

/// Nothing usable was found. The messages are what the user sees before the
/// run stops.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectError {
    #[error("No readable CSX in globs {globs:?} or files {files:?}")]
    NoneInArguments {
        globs: Vec<String>,
        files: Vec<String>,
    },
    #[error("No readable CSX in or below directory {}", .0.display())]
    NoneWithin(PathBuf),
    #[error("No CSX files in current directory")]
    NoneHere,
    #[error("No readable CSX files in current directory")]
    NoneReadableHere,
}

/// Run the selection and return absolute paths in string order.
pub fn select_files(
    selection: &Selection,
    cwd: &Path,
    home: Option<&Path>,
) -> Result<Vec<PathBuf>, SelectError> {
    let mut found = Vec::new();

    match selection {
        Selection::Files(args) => {
            let (globs, files): (Vec<String>, Vec<String>) =
                args.iter().cloned().partition(|a| is_glob(a));

            for file in &files {
                let path = absolutize(Path::new(file), cwd);
                if is_readable_csx(&path) {
                    found.push(canonical(&path));
                } else {
                    debug!(file = %file, "skipping argument: not a readable CSX");
                }
            }
            for arg in &globs {
                let expanded = expand_arg(arg, home);
                let pattern = absolutize(Path::new(&expanded), cwd);
                let before = found.len();
                for path in glob_paths(&pattern.to_string_lossy()) {
                    if is_readable_csx(&path) {
                        found.push(canonical(&path));
                    }
                }
                // A name like `run[1].csx` is a file, not a pattern.
                if found.len() == before && is_readable_csx(&pattern) {
                    found.push(canonical(&pattern));
                }
            }

            if found.is_empty() {
                return Err(SelectError::NoneInArguments { globs, files });
            }
        }
        Selection::Within(dir) => {
            let dir = absolutize(dir, cwd);
            let pattern = format!(
                "{}/**/*.{}",
                Pattern::escape(&dir.to_string_lossy()),
                CSX_EXTENSION
            );
            for path in glob_paths(&pattern) {
                if is_readable_csx(&path) {
                    found.push(canonical(&path));
                }
            }
            if found.is_empty() {
                return Err(SelectError::NoneWithin(dir));
            }
        }
        Selection::LastHere => {
            let latest = latest_csx_in(cwd).ok_or(SelectError::NoneHere)?;
            if !is_readable(&latest) {
                return Err(SelectError::NoneReadableHere);
            }
            found.push(canonical(&latest));
        }
    }

    sort_paths(&mut found);
    found.dedup();
    debug!(count = found.len(), "selected CSX files");
    Ok(found)
}

/// Order paths by their full string, so `b-c/y.csx` comes before `b/x.csx`.
pub fn sort_paths(paths: &mut [PathBuf]) {
    paths.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));
}

/// Most recently modified `*.csx` directly inside `dir`.
fn latest_csx_in(dir: &Path) -> Option<PathBuf> {
    let pattern = format!(
        "{}/*.{}",
        Pattern::escape(&dir.to_string_lossy()),
        CSX_EXTENSION
    );
    glob_paths(&pattern)
        .into_iter()
        .filter(|p| p.is_file())
        .max_by_key(|p| modified(p).unwrap_or(SystemTime::UNIX_EPOCH))
}

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

fn glob_paths(pattern: &str) -> Vec<PathBuf> {
    match glob::glob(pattern) {
        Ok(paths) => paths
            .filter_map(|entry| match entry {
                Ok(path) => Some(path),
                Err(e) => {
                    debug!(error = %e, "unreadable entry during glob");
                    None
                }
            })
            .collect(),
        Err(e) => {
            warn!(pattern = %pattern, error = %e, "invalid glob pattern");
            Vec::new()
        }
    }
}

/// Whether a command-line argument should be treated as a glob string.
pub fn is_glob(arg: &str) -> bool {
    arg.contains(['*', '?', '['])
}

fn has_csx_extension(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(CSX_EXTENSION)
}

fn is_readable(path: &Path) -> bool {
    path.is_file() && fs::File::open(path).is_ok()
}

fn is_readable_csx(path: &Path) -> bool {
    has_csx_extension(path) && is_readable(path)
}

fn absolutize(path: &Path, cwd: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

fn canonical(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Expand environment variables and a leading `~` in a glob argument.
/// Unknown variables are left as written.
pub fn expand_arg(arg: &str, home: Option<&Path>) -> String {
    expand_arg_with(arg, home, |k| std::env::var(k).ok())
}

pub fn expand_arg_with<F>(arg: &str, home: Option<&Path>, lookup: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    shellexpand::full_with_context_no_errors(arg, || home.map(|p| p.to_string_lossy()), lookup).into_owned()
}
