//! Docker runtime integration
//!
//! Talks to the container runtime CLI: version probe, local image lookup,
//! image pull and the final `docker run`.

use anyhow::Result;

use super::invocation::Invocation;
use crate::error::XgoError;
use crate::exec::ProcessRunner;
use crate::utils::terminal;

/// Prefix of the official toolchain images, completed by the Go release
pub const DOCKER_DIST: &str = "karalabe/xgo-";

/// Runtime binary used unless `XGO_DOCKER` says otherwise
pub const DEFAULT_RUNTIME: &str = "docker";

/// Environment variable overriding the runtime binary
pub const RUNTIME_ENV: &str = "XGO_DOCKER";

/// Toolchain image for a Go release, unless a custom image is given
pub fn image_name(go_version: &str, custom: Option<&str>) -> String {
    match custom {
        Some(image) if !image.is_empty() => image.to_string(),
        _ => format!("{}{}", DOCKER_DIST, go_version),
    }
}

/// Container runtime driven through its command line
pub struct Docker<R> {
    runner: R,
    program: String,
}

impl<R: ProcessRunner> Docker<R> {
    /// Runtime using `program` as its CLI binary
    pub fn new(runner: R, program: impl Into<String>) -> Self {
        Self {
            runner,
            program: program.into(),
        }
    }

    /// Runtime named by `XGO_DOCKER`, falling back to `docker`
    pub fn from_env(runner: R) -> Self {
        let program = std::env::var(RUNTIME_ENV)
            .ok()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_RUNTIME.to_string());
        Self::new(runner, program)
    }

    /// Runtime CLI binary
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Check that docker is installed and its daemon answers
    pub fn check_docker(&self) -> Result<()> {
        terminal::print_step("Checking docker installation...");

        let result = self
            .runner
            .run_inherited(&self.program, &args(&["version"]))
            .map_err(|e| self.unavailable(format!("{:#}", e)))?;

        if !result.success {
            return Err(self.unavailable(result.failure_reason()).into());
        }

        println!();
        Ok(())
    }

    fn unavailable(&self, message: String) -> XgoError {
        XgoError::RuntimeUnavailable {
            program: self.program.clone(),
            message,
        }
    }

    /// Whether `image` shows up in the local image list.
    ///
    /// Matches by substring against `docker images --no-trunc`, so a
    /// repository/tag name that contains `image` also counts.
    pub fn image_available(&self, image: &str) -> Result<bool> {
        let result = self
            .runner
            .run_captured(&self.program, &args(&["images", "--no-trunc"]))
            .map_err(|e| XgoError::ImageQuery {
                message: format!("{:#}", e),
            })?;

        if !result.success {
            return Err(XgoError::ImageQuery {
                message: result.failure_reason(),
            }
            .into());
        }

        Ok(result.stdout.contains(image))
    }

    /// Pull `image` from the default registry
    pub fn pull_image(&self, image: &str) -> Result<()> {
        terminal::print_step(&format!("Pulling {} from docker registry...", image));

        let pull_failed = |message: String| XgoError::ImagePull {
            image: image.to_string(),
            message,
        };

        let result = self
            .runner
            .run_inherited(&self.program, &args(&["pull", image]))
            .map_err(|e| pull_failed(format!("{:#}", e)))?;

        if !result.success {
            return Err(pull_failed(result.failure_reason()).into());
        }
        Ok(())
    }

    /// Make sure `image` is available locally, pulling it if needed
    pub fn ensure_image(&self, image: &str) -> Result<()> {
        terminal::print_prompt(&format!("Checking for required docker image {}...", image));

        if self.image_available(image)? {
            terminal::print_found();
            return Ok(());
        }

        terminal::print_missing();
        self.pull_image(image)
    }

    /// Run the cross compilation container, streaming its output
    pub fn run_build(&self, invocation: &Invocation) -> Result<()> {
        let result = self.runner.run_inherited(&self.program, invocation.args())?;

        if !result.success {
            return Err(XgoError::BuildFailed {
                package: invocation.import_path().to_string(),
                code: result.code(),
            }
            .into());
        }
        Ok(())
    }
}

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}
