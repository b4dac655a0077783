//! CLI argument parsing using clap derive macros
//!
//! xgo keeps Go's flag conventions (`-targets=linux/amd64`, `-race`), which
//! clap does not speak natively. [`normalize_args`] rewrites them into
//! clap's double-dash form before parsing.

use std::ffi::OsString;

use clap::builder::{BoolishValueParser, NonEmptyStringValueParser};
use clap::{ArgAction, Parser};

use crate::build::BuildRequest;

/// Flags taking a value
const VALUE_FLAGS: &[&str] = &["go", "pkg", "out", "remote", "branch", "deps", "targets", "image"];

/// Flags that are plain switches
const BOOL_FLAGS: &[&str] = &["v", "x", "race", "no-color", "help", "version"];

/// Go CGO cross compiler
///
/// Cross compiles a Go package with CGO dependencies inside a prebuilt
/// docker toolchain, writing the binaries into the current directory.
#[derive(Parser, Debug)]
#[command(name = "xgo")]
#[command(version, about, long_about = None)]
#[command(override_usage = "xgo [options] <go import path>")]
pub struct Cli {
    /// Go release to use for cross compilation
    #[arg(long = "go", value_name = "VERSION", default_value = "latest")]
    pub go_version: String,

    /// Sub-package to build if not root import
    #[arg(long = "pkg", value_name = "PATH", default_value = "")]
    pub pkg: String,

    /// Prefix to use for output naming (empty = package name)
    #[arg(long = "out", value_name = "PREFIX", default_value = "")]
    pub out: String,

    /// Version control remote repository to build
    #[arg(long = "remote", value_name = "URL", default_value = "")]
    pub remote: String,

    /// Version control branch to build
    #[arg(long = "branch", value_name = "BRANCH", default_value = "")]
    pub branch: String,

    /// CGO dependencies (configure/make based archives)
    #[arg(long = "deps", value_name = "URLS", default_value = "")]
    pub deps: String,

    /// Comma separated targets to build for
    #[arg(long = "targets", value_name = "OS/ARCH,...", default_value = "*/*")]
    pub targets: String,

    /// Use custom docker image instead of official distribution
    #[arg(long = "image", value_name = "IMAGE", default_value = "")]
    pub image: String,

    /// Print the names of packages as they are compiled
    #[arg(
        long = "v",
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new(),
        num_args = 0..=1,
        require_equals = true,
        default_value_t = false,
        default_missing_value = "true"
    )]
    pub verbose: bool,

    /// Print the command as executing the builds
    #[arg(
        long = "x",
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new(),
        num_args = 0..=1,
        require_equals = true,
        default_value_t = false,
        default_missing_value = "true"
    )]
    pub steps: bool,

    /// Enable data race detection (supported only on amd64)
    #[arg(
        long = "race",
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new(),
        num_args = 0..=1,
        require_equals = true,
        default_value_t = false,
        default_missing_value = "true"
    )]
    pub race: bool,

    /// Disable colored output
    #[arg(
        long = "no-color",
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new(),
        num_args = 0..=1,
        require_equals = true,
        default_value_t = false,
        default_missing_value = "true"
    )]
    pub no_color: bool,

    /// Go import path, or a local package directory (absolute or ./relative)
    #[arg(value_name = "IMPORT_PATH", value_parser = NonEmptyStringValueParser::new())]
    pub import_path: String,
}

impl Cli {
    /// Parse Go-style command line arguments, exiting with a usage message
    /// on error
    pub fn parse_go_style<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self::parse_from(normalize_args(args))
    }

    /// Fallible variant of [`Cli::parse_go_style`]
    pub fn try_parse_go_style<I, S>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self::try_parse_from(normalize_args(args))
    }

    /// Turn the parsed flags into the build configuration
    pub fn into_request(self) -> BuildRequest {
        BuildRequest {
            target: self.import_path,
            go_version: self.go_version,
            image_override: Some(self.image).filter(|image| !image.is_empty()),
            sub_package: self.pkg,
            out_prefix: self.out,
            remote: self.remote,
            branch: self.branch,
            deps: self.deps,
            targets: BuildRequest::parse_targets(&self.targets),
            verbose: self.verbose,
            steps: self.steps,
            race: self.race,
        }
    }
}

/// Rewrite Go-style flags into the form clap expects.
///
/// `-name`, `-name=value` and `-name value` become `--name`,
/// `--name=value` and `--name=value`. Flag scanning stops at the first
/// non-flag argument (or an explicit `--`), after which everything is
/// positional, exactly like Go's `flag` package. The first element is the
/// program name and passes through untouched. Unknown flags are left alone
/// for clap to reject.
///
/// Arguments stay `OsString`s; anything that is not valid UTF-8 is handed
/// to clap unchanged so it can report it as a usage error.
pub fn normalize_args<I, S>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
{
    let mut iter = args.into_iter().map(Into::into);
    let mut out = Vec::new();

    if let Some(program) = iter.next() {
        out.push(program);
    }

    while let Some(arg) = iter.next() {
        let lossy = arg.to_string_lossy();
        if lossy == "--" || lossy == "-" || !lossy.starts_with('-') {
            out.push(OsString::from("--"));
            if lossy != "--" {
                out.push(arg);
            }
            out.extend(iter);
            break;
        }

        let Some(text) = arg.to_str() else {
            out.push(arg);
            continue;
        };

        let body = text
            .strip_prefix("--")
            .or_else(|| text.strip_prefix('-'))
            .unwrap_or(text);
        let name = body.split_once('=').map_or(body, |(name, _)| name);

        if VALUE_FLAGS.contains(&name) {
            if body.contains('=') {
                out.push(format!("--{}", body).into());
            } else if let Some(value) = iter.next() {
                let mut joined = OsString::from(format!("--{}=", name));
                joined.push(value);
                out.push(joined);
            } else {
                out.push(format!("--{}", name).into());
            }
        } else if BOOL_FLAGS.contains(&name) {
            out.push(format!("--{}", body).into());
        } else {
            out.push(arg);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        let mut argv = vec!["xgo"];
        argv.extend_from_slice(args);
        Cli::try_parse_go_style(argv)
    }

    #[test]
    fn test_normalize_single_dash_flags() {
        let argv = normalize_args(["xgo", "-go=1.5", "-race", "-out", "bin", "a/b"]);
        assert_eq!(argv, vec!["xgo", "--go=1.5", "--race", "--out=bin", "--", "a/b"]);
    }

    #[test]
    fn test_normalize_stops_at_first_positional() {
        let argv = normalize_args(["xgo", "pkg", "-v"]);
        assert_eq!(argv, vec!["xgo", "--", "pkg", "-v"]);
    }

    #[test]
    fn test_normalize_keeps_value_starting_with_dash() {
        let argv = normalize_args(["xgo", "-out", "-weird", "pkg"]);
        assert_eq!(argv, vec!["xgo", "--out=-weird", "--", "pkg"]);
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&["github.com/a/b"]).unwrap();
        assert_eq!(cli.go_version, "latest");
        assert_eq!(cli.targets, "*/*");
        assert!(cli.image.is_empty());
        assert!(!cli.verbose && !cli.steps && !cli.race);
    }

    #[test]
    fn test_exactly_one_positional() {
        assert!(parse(&["github.com/a/b"]).is_ok());
        assert!(parse(&[]).is_err());
        assert!(parse(&["a", "b"]).is_err());
        assert!(parse(&["a", "-v"]).is_err());
    }

    #[test]
    fn test_empty_import_path_rejected() {
        let err = parse(&[""]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
        assert_eq!(err.exit_code(), 2);
        assert!(parse(&["-race", ""]).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_import_path_is_usage_error() {
        use std::os::unix::ffi::OsStrExt;

        let path = std::ffi::OsStr::from_bytes(b"./caf\xe9");
        let argv = normalize_args([std::ffi::OsStr::new("xgo"), path]);
        assert_eq!(argv[2].as_os_str(), path);

        let err = Cli::try_parse_go_style([std::ffi::OsStr::new("xgo"), path]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidUtf8);
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_bool_flag_forms() {
        let cli = parse(&["-v", "-x=true", "-race=false", "pkg"]).unwrap();
        assert!(cli.verbose);
        assert!(cli.steps);
        assert!(!cli.race);
    }

    #[test]
    fn test_bool_flags_accept_go_spellings() {
        let cli = parse(&["-v=t", "-x=TRUE", "-race=1", "-no-color=True", "pkg"]).unwrap();
        assert!(cli.verbose && cli.steps && cli.race && cli.no_color);

        let cli = parse(&["-v=F", "-x=0", "-race=False", "-no-color=false", "pkg"]).unwrap();
        assert!(!cli.verbose && !cli.steps && !cli.race && !cli.no_color);

        assert!(parse(&["-race=maybe", "pkg"]).is_err());
    }

    #[test]
    fn test_double_dash_flags_accepted() {
        let cli = parse(&["--targets=linux/arm", "--image", "me/xgo", "pkg"]).unwrap();
        assert_eq!(cli.targets, "linux/arm");
        assert_eq!(cli.image, "me/xgo");
    }

    #[test]
    fn test_unknown_flag_rejected() {
        assert!(parse(&["-bogus", "pkg"]).is_err());
    }

    #[test]
    fn test_into_request() {
        let request = parse(&[
            "-targets=linux/386,darwin/amd64",
            "-race",
            "-pkg=cmd/tool",
            "-image=me/toolchain",
            "myorg/mypkg",
        ])
        .unwrap()
        .into_request();

        assert_eq!(request.target, "myorg/mypkg");
        assert_eq!(request.sub_package, "cmd/tool");
        assert_eq!(request.image_override.as_deref(), Some("me/toolchain"));
        assert_eq!(request.targets, vec!["linux/386", "darwin/amd64"]);
        assert!(request.race);
    }
}
