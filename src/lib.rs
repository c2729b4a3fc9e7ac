//! Feature/release/bugfix/hotfix branch lifecycles on top of git.
//!
//! Only one invocation may run against a working directory at a time; there
//! is no locking, and concurrent runs against the same repository are
//! unsupported.

pub mod config;
pub mod conflict;
pub mod domain;
pub mod error;
pub mod git;
pub mod init;
pub mod lifecycle;
pub mod queue;
pub mod report;
pub mod ui;

pub use error::{LifecycleError, Result};
pub use lifecycle::LifecycleController;
