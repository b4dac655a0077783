//! Error types and helpers for user-friendly error messages
//!
//! Every failure in the pipeline is terminal. The variants exist so the
//! binary can print an actionable hint and pick an exit status; nothing
//! downstream tries to recover from them.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures of the cross compilation pipeline
#[derive(Error, Debug)]
pub enum XgoError {
    /// The container runtime is missing or not responding
    #[error("Failed to check docker installation: {message}")]
    RuntimeUnavailable { program: String, message: String },

    /// Listing local images failed
    #[error("Failed to check docker image availability: {message}")]
    ImageQuery { message: String },

    /// Pulling the toolchain image failed
    #[error("Failed to pull docker image {image} from the registry: {message}")]
    ImagePull { image: String, message: String },

    /// The working directory could not be determined
    #[error("Failed to retrieve the working directory")]
    WorkingDir {
        #[source]
        source: io::Error,
    },

    /// A filesystem path argument does not name an existing directory
    #[error("Requested path invalid: {}", .path.display())]
    InvalidPath { path: PathBuf },

    /// A local directory lies outside every GOROOT/GOPATH source root
    #[error("Failed to resolve import path for {}", .dir.display())]
    UnresolvedImport { dir: PathBuf, roots: Vec<PathBuf> },

    /// The containerized build exited unsuccessfully
    #[error("Failed to cross compile package {package}: {}", describe_exit(.code))]
    BuildFailed { package: String, code: Option<i32> },
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("build exited with status {}", code),
        None => "build terminated by signal".to_string(),
    }
}

impl XgoError {
    /// Process exit status for this error.
    ///
    /// A failed build hands its own exit status through when it fits in a
    /// process exit code; everything else exits with 1.
    pub fn exit_code(&self) -> u8 {
        match self {
            XgoError::BuildFailed {
                code: Some(code), ..
            } => u8::try_from(*code).ok().filter(|c| *c != 0).unwrap_or(1),
            _ => 1,
        }
    }

    /// Suggestion printed below the error, if any
    pub fn hint(&self) -> Option<String> {
        match self {
            XgoError::RuntimeUnavailable { program, .. } => Some(hints::docker(program)),
            XgoError::ImagePull { .. } => Some(hints::image_pull().to_string()),
            XgoError::UnresolvedImport { roots, .. } => Some(hints::gopath(roots)),
            XgoError::InvalidPath { .. } => Some(hints::invalid_path().to_string()),
            _ => None,
        }
    }

    /// Display error with formatting and hints
    pub fn display_with_hints(&self) {
        use console::style;

        eprintln!("\n{} {}", style("ERROR:").red().bold(), self);

        if let Some(hint) = self.hint() {
            eprintln!("\n{} {}", style("HINT:").yellow().bold(), hint);
        }

        eprintln!();
    }
}

/// Common error hints
pub mod hints {
    use std::path::PathBuf;

    /// Hint for a missing or stopped container runtime
    pub fn docker(program: &str) -> String {
        format!(
            "Make sure '{}' is installed, on your PATH and that its daemon is running:\n\
             • Install Docker from https://docs.docker.com/get-docker/\n\
             • Check the daemon with: {} version\n\
             • Set XGO_DOCKER to use a different runtime binary",
            program, program
        )
    }

    /// Hint for a failed image pull
    pub fn image_pull() -> &'static str {
        "Check your network connection and registry access.\n\
         • Use -go to select an existing toolchain release\n\
         • Or pass -image with a locally built toolchain image"
    }

    /// Hint for a local path that is not a directory
    pub fn invalid_path() -> &'static str {
        "Local builds expect a path to an existing package directory, e.g. ./ or /path/to/pkg"
    }

    /// Hint for a directory outside every source root
    pub fn gopath(roots: &[PathBuf]) -> String {
        let mut hint = String::from(
            "Local packages must live below a GOPATH (or GOROOT) src directory.\n\
             Searched source roots:",
        );
        if roots.is_empty() {
            hint.push_str("\n  (none)");
        }
        for root in roots {
            hint.push_str(&format!("\n  • {}", root.display()));
        }
        hint
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_failure_propagates_exit_code() {
        let err = XgoError::BuildFailed {
            package: "myorg/mypkg".to_string(),
            code: Some(3),
        };
        assert_eq!(err.exit_code(), 3);
        assert!(err.to_string().contains("status 3"));
    }

    #[test]
    fn test_out_of_range_exit_codes_fall_back_to_one() {
        for code in [None, Some(-1), Some(0), Some(300)] {
            let err = XgoError::BuildFailed {
                package: "p".to_string(),
                code,
            };
            assert_eq!(err.exit_code(), 1, "code {:?}", code);
        }
    }

    #[test]
    fn test_other_errors_exit_with_one() {
        let err = XgoError::ImageQuery {
            message: "boom".to_string(),
        };
        assert_eq!(err.exit_code(), 1);
        assert!(err.hint().is_none());
    }

    #[test]
    fn test_gopath_hint_lists_roots() {
        let hint = hints::gopath(&[PathBuf::from("/home/me/go/src")]);
        assert!(hint.contains("/home/me/go/src"));
        assert!(hints::gopath(&[]).contains("(none)"));
    }
}
