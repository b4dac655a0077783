//! Local package resolution against GOPATH
//!
//! A build target given as a filesystem path is turned back into its Go
//! import path, and every GOPATH source root gets mounted read-only into the
//! container so unpublished code can be cross compiled.

use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

use anyhow::Result;

use crate::error::XgoError;

/// Container directory under which GOPATH entries are mounted
pub const CONTAINER_GOPATH_ROOT: &str = "/ext-go";

/// One GOPATH entry exposed to the container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceMount {
    /// `<gopath>/src` on the host
    pub host: PathBuf,
    /// `/ext-go/<n>/src` in the container
    pub container: String,
    /// `/ext-go/<n>`, the container-side GOPATH entry
    pub root: String,
}

/// Whether a build target names a directory rather than an import path
pub fn looks_like_path(target: &str) -> bool {
    Path::new(target).is_absolute() || target.starts_with('.')
}

/// GOPATH entries from the environment, defaulting to `$HOME/go`
pub fn gopath_from_env() -> Vec<PathBuf> {
    let home = directories::BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf());
    gopath_list(std::env::var_os("GOPATH"), home.as_deref())
}

/// GOROOT from the environment, if set
pub fn goroot_from_env() -> Option<PathBuf> {
    std::env::var_os("GOROOT")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Split a GOPATH value into its entries.
///
/// Empty entries are skipped. When nothing is left, Go's default of
/// `$HOME/go` applies.
pub fn gopath_list(value: Option<OsString>, home: Option<&Path>) -> Vec<PathBuf> {
    let entries: Vec<PathBuf> = value
        .as_deref()
        .map(|v| {
            std::env::split_paths(v)
                .filter(|p| !p.as_os_str().is_empty())
                .collect()
        })
        .unwrap_or_default();

    if entries.is_empty() {
        home.map(|h| vec![h.join("go")]).unwrap_or_default()
    } else {
        entries
    }
}

/// Read-only mounts for every GOPATH entry, numbered in GOPATH order
pub fn source_mounts(gopath: &[PathBuf]) -> Vec<SourceMount> {
    gopath
        .iter()
        .enumerate()
        .map(|(i, entry)| SourceMount {
            host: entry.join("src"),
            container: format!("{}/{}/src", CONTAINER_GOPATH_ROOT, i),
            root: format!("{}/{}", CONTAINER_GOPATH_ROOT, i),
        })
        .collect()
}

/// Resolve a local package directory to its import path.
///
/// `target` is taken relative to `cwd`. It must be an existing directory
/// below `$GOROOT/src` or one of the GOPATH `src` roots.
pub fn resolve_local(
    target: &str,
    cwd: &Path,
    goroot: Option<&Path>,
    gopath: &[PathBuf],
) -> Result<String> {
    let dir = clean(&cwd.join(target));
    if !dir.is_dir() {
        return Err(XgoError::InvalidPath { path: dir }.into());
    }

    let roots: Vec<PathBuf> = goroot
        .into_iter()
        .chain(gopath.iter().map(PathBuf::as_path))
        .map(|root| root.join("src"))
        .collect();

    match import_path_in(&dir, &roots) {
        Some(import_path) => {
            tracing::debug!(dir = %dir.display(), %import_path, "resolved local package");
            Ok(import_path)
        }
        None => Err(XgoError::UnresolvedImport { dir, roots }.into()),
    }
}

/// Import path of `dir` relative to the first source root containing it.
///
/// Tries a lexical match first and falls back to canonical paths so that
/// symlinked roots still resolve.
fn import_path_in(dir: &Path, roots: &[PathBuf]) -> Option<String> {
    let lexical = roots.iter().find_map(|root| relative_import(dir, &clean(root)));
    lexical.or_else(|| {
        let dir = dir.canonicalize().ok()?;
        roots
            .iter()
            .filter_map(|root| root.canonicalize().ok())
            .find_map(|root| relative_import(&dir, &root))
    })
}

fn relative_import(dir: &Path, root: &Path) -> Option<String> {
    let rel = dir.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    (!parts.is_empty()).then(|| parts.join("/"))
}

/// Lexically normalize a path, dropping `.` and folding `..`
fn clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() && !out.has_root() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}
