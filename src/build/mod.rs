//! Cross compilation pipeline
//!
//! [`CrossBuilder::execute`] runs the whole build as a strict sequence:
//! probe docker, make sure the toolchain image is local, resolve a local
//! package path if one was given, assemble the `docker run` invocation and
//! run it. Any failing stage aborts the pipeline with an [`XgoError`].

pub mod docker;
pub mod gopath;
pub mod invocation;

use std::path::PathBuf;

use anyhow::Result;

use crate::error::XgoError;
use crate::exec::{ProcessRunner, SystemRunner};
use crate::utils::terminal;

pub use docker::{image_name, Docker};
pub use gopath::SourceMount;
pub use invocation::Invocation;

/// Target list used when none is given: every platform, every architecture
pub const DEFAULT_TARGETS: &str = "*/*";

/// Everything one cross compilation needs, built once from the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    /// Go import path, or a local directory to resolve into one
    pub target: String,
    /// Go release selecting the official toolchain image
    pub go_version: String,
    /// Custom toolchain image replacing the official one
    pub image_override: Option<String>,
    /// Sub-package to build if not root import
    pub sub_package: String,
    /// Output name prefix
    pub out_prefix: String,
    /// Version control remote to build from
    pub remote: String,
    /// Version control branch to build
    pub branch: String,
    /// CGO dependency archives
    pub deps: String,
    /// `os/arch` pairs, `*` being a wildcard
    pub targets: Vec<String>,
    /// `go build -v`
    pub verbose: bool,
    /// `go build -x`
    pub steps: bool,
    /// `go build -race`
    pub race: bool,
}

impl BuildRequest {
    /// Request for `target` with every option at its default
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            go_version: "latest".to_string(),
            image_override: None,
            sub_package: String::new(),
            out_prefix: String::new(),
            remote: String::new(),
            branch: String::new(),
            deps: String::new(),
            targets: Self::parse_targets(DEFAULT_TARGETS),
            verbose: false,
            steps: false,
            race: false,
        }
    }

    /// Split a comma separated target list, dropping blank entries.
    /// An empty list falls back to [`DEFAULT_TARGETS`].
    pub fn parse_targets(spec: &str) -> Vec<String> {
        let targets: Vec<String> = spec
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect();

        if targets.is_empty() {
            vec![DEFAULT_TARGETS.to_string()]
        } else {
            targets
        }
    }

    /// Target list as the toolchain expects it: space separated, with `*`
    /// wildcards rewritten to the regex wildcard `.`
    pub fn targets_env(&self) -> String {
        self.targets.join(" ").replace('*', ".")
    }

    /// Toolchain image to build with
    pub fn image(&self) -> String {
        image_name(&self.go_version, self.image_override.as_deref())
    }
}

/// Drives one cross compilation against a container runtime
pub struct CrossBuilder<R> {
    docker: Docker<R>,
    workdir: PathBuf,
    gopath: Vec<PathBuf>,
    goroot: Option<PathBuf>,
}

impl CrossBuilder<SystemRunner> {
    /// Builder for the real docker installation, configured from the
    /// process environment
    pub fn from_env() -> Result<Self> {
        let workdir = std::env::current_dir().map_err(|source| XgoError::WorkingDir { source })?;
        Ok(Self::new(
            Docker::from_env(SystemRunner),
            workdir,
            gopath::gopath_from_env(),
            gopath::goroot_from_env(),
        ))
    }
}

impl<R: ProcessRunner> CrossBuilder<R> {
    /// Create a builder
    ///
    /// `workdir` receives the build output and is mounted as `/build`.
    /// `gopath` and `goroot` are only consulted for local package paths.
    pub fn new(
        docker: Docker<R>,
        workdir: PathBuf,
        gopath: Vec<PathBuf>,
        goroot: Option<PathBuf>,
    ) -> Self {
        Self {
            docker,
            workdir,
            gopath,
            goroot,
        }
    }

    /// Resolve the package to build and assemble the container invocation.
    ///
    /// Import paths are passed through as-is with no local mounts. Local
    /// paths are resolved to their import path and every GOPATH source
    /// root is mounted read-only.
    pub fn prepare(&self, request: &BuildRequest, image: &str) -> Result<Invocation> {
        let (import_path, mounts) = if gopath::looks_like_path(&request.target) {
            let import_path = gopath::resolve_local(
                &request.target,
                &self.workdir,
                self.goroot.as_deref(),
                &self.gopath,
            )?;
            (import_path, gopath::source_mounts(&self.gopath))
        } else {
            (request.target.clone(), Vec::new())
        };

        tracing::debug!(%import_path, mounts = mounts.len(), "resolved build target");
        Ok(Invocation::new(request, &self.workdir, image, &import_path, &mounts))
    }

    /// Run the full pipeline
    pub fn execute(&self, request: &BuildRequest) -> Result<()> {
        // 1. Check docker
        self.docker.check_docker()?;

        // 2. Make sure the toolchain image is local
        let image = request.image();
        self.docker.ensure_image(&image)?;

        // 3. Resolve the package and assemble the invocation
        let invocation = self.prepare(request, &image)?;

        // 4. Cross compile into the working directory
        terminal::print_step(&format!("Cross compiling {}...", invocation.import_path()));
        tracing::info!(command = %invocation.preview(self.docker.program()), "starting build");
        self.docker.run_build(&invocation)
    }
}
