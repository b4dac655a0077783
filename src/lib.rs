//! xgo - Go CGO cross compiler
//!
//! Thin front end over a prebuilt docker toolchain image. The crate only
//! decides *what* to run: it probes the container runtime, makes sure the
//! toolchain image is present, translates flags into container environment
//! and mounts, then hands the build over to the container.
//!
//! ## Pipeline
//!
//! ```text
//! parse → probe docker → resolve image → (resolve local path) → build invocation → run
//! ```

pub mod build;
pub mod cli;
pub mod error;
pub mod exec;
pub mod utils;

pub use build::{BuildRequest, CrossBuilder};
pub use error::XgoError;
