//! `docker run` argument assembly
//!
//! The toolchain image is configured entirely through environment
//! variables; the build output lands in the working directory mounted at
//! `/build`.

use std::path::Path;

use super::gopath::SourceMount;
use super::BuildRequest;

/// Container directory receiving the build output
pub const BUILD_DIR: &str = "/build";

/// Fully assembled runtime arguments for one cross compilation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    args: Vec<String>,
    import_path: String,
}

impl Invocation {
    /// Assemble the `run` invocation.
    ///
    /// Argument order is fixed: output mount, build parameters, read-only
    /// source mounts, `EXT_GOPATH`, then image and import path.
    pub fn new(
        request: &BuildRequest,
        workdir: &Path,
        image: &str,
        import_path: &str,
        mounts: &[SourceMount],
    ) -> Self {
        let mut inv = Self {
            args: vec!["run".to_string()],
            import_path: import_path.to_string(),
        };

        inv.volume(format!("{}:{}", workdir.display(), BUILD_DIR));
        inv.env("REPO_REMOTE", &request.remote);
        inv.env("REPO_BRANCH", &request.branch);
        inv.env("PACK", &request.sub_package);
        inv.env("DEPS", &request.deps);
        inv.env("OUT", &request.out_prefix);
        inv.env("FLAG_V", &request.verbose.to_string());
        inv.env("FLAG_X", &request.steps.to_string());
        inv.env("FLAG_RACE", &request.race.to_string());
        inv.env("TARGETS", &request.targets_env());

        for mount in mounts {
            inv.volume(format!("{}:{}:ro", mount.host.display(), mount.container));
        }

        let roots: Vec<&str> = mounts.iter().map(|m| m.root.as_str()).collect();
        inv.env("EXT_GOPATH", &roots.join(":"));

        inv.args.push(image.to_string());
        inv.args.push(import_path.to_string());
        inv
    }

    fn volume(&mut self, spec: String) {
        self.args.push("-v".to_string());
        self.args.push(spec);
    }

    fn env(&mut self, key: &str, value: &str) {
        self.args.push("-e".to_string());
        self.args.push(format!("{}={}", key, value));
    }

    /// Runtime arguments, starting with `run`
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Import path being built
    pub fn import_path(&self) -> &str {
        &self.import_path
    }

    /// Value of an environment variable passed with `-e`
    pub fn env_var(&self, key: &str) -> Option<&str> {
        self.flag_values("-e").find_map(|kv| kv.strip_prefix(key)?.strip_prefix('='))
    }

    /// Volume specs passed with `-v`
    pub fn volumes(&self) -> Vec<&str> {
        self.flag_values("-v").collect()
    }

    /// Volume specs mounted read-only
    pub fn read_only_volumes(&self) -> Vec<&str> {
        self.flag_values("-v").filter(|v| v.ends_with(":ro")).collect()
    }

    fn flag_values<'a>(&'a self, flag: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.args
            .windows(2)
            .filter(move |pair| pair[0] == flag)
            .map(|pair| pair[1].as_str())
    }

    /// Shell-like rendering for logs
    pub fn preview(&self, program: &str) -> String {
        let mut line = program.to_string();
        for arg in &self.args {
            line.push(' ');
            if arg.is_empty() || arg.contains(|c: char| c.is_whitespace() || c == '*') {
                line.push_str(&format!("'{}'", arg));
            } else {
                line.push_str(arg);
            }
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::build::gopath::source_mounts;

    #[test]
    fn test_import_path_invocation() {
        let mut request = BuildRequest::new("github.com/me/tool");
        request.remote = "https://example.com/tool.git".to_string();
        request.branch = "dev".to_string();
        request.verbose = true;

        let inv = Invocation::new(
            &request,
            Path::new("/work"),
            "karalabe/xgo-latest",
            "github.com/me/tool",
            &[],
        );

        let expected: Vec<String> = [
            "run",
            "-v",
            "/work:/build",
            "-e",
            "REPO_REMOTE=https://example.com/tool.git",
            "-e",
            "REPO_BRANCH=dev",
            "-e",
            "PACK=",
            "-e",
            "DEPS=",
            "-e",
            "OUT=",
            "-e",
            "FLAG_V=true",
            "-e",
            "FLAG_X=false",
            "-e",
            "FLAG_RACE=false",
            "-e",
            "TARGETS=./.",
            "-e",
            "EXT_GOPATH=",
            "karalabe/xgo-latest",
            "github.com/me/tool",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        #[cfg(unix)]
        assert_eq!(inv.args(), expected.as_slice());
        assert!(inv.read_only_volumes().is_empty());
        assert_eq!(inv.env_var("EXT_GOPATH"), Some(""));
    }

    #[test]
    fn test_local_mounts() {
        let request = BuildRequest::new("./tool");
        let mounts = source_mounts(&[PathBuf::from("/a"), PathBuf::from("/b")]);
        let inv = Invocation::new(&request, Path::new("/work"), "img", "me/tool", &mounts);

        let ro = inv.read_only_volumes();
        assert_eq!(ro.len(), 2);
        assert!(ro[0].ends_with(":/ext-go/0/src:ro"));
        assert!(ro[1].ends_with(":/ext-go/1/src:ro"));
        assert_eq!(inv.volumes().len(), 3);
        assert_eq!(inv.env_var("EXT_GOPATH"), Some("/ext-go/0:/ext-go/1"));

        let tail = &inv.args()[inv.args().len() - 2..];
        assert_eq!(tail, ["img", "me/tool"]);
    }

    #[test]
    fn test_env_var_lookup_is_exact() {
        let inv = Invocation::new(&BuildRequest::new("p"), Path::new("/w"), "img", "p", &[]);
        assert_eq!(inv.env_var("FLAG_X"), Some("false"));
        assert_eq!(inv.env_var("FLAG"), None);
    }

    #[test]
    fn test_preview_quotes() {
        let inv = Invocation::new(&BuildRequest::new("p"), Path::new("/w"), "img", "p", &[]);
        let preview = inv.preview("docker");
        assert!(preview.starts_with("docker run -v /w:/build"));
        assert!(preview.contains("-e 'TARGETS=./.'") || preview.contains("-e TARGETS=./."));
        assert!(preview.ends_with("img p"));
    }
}
