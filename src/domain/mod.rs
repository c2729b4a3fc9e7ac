//! Domain logic - pure business rules independent of git operations

pub mod branch;
pub mod validate;

pub use branch::{BaseBranch, BranchKind, KindDescriptor};
pub use validate::{validate_branch_name, validate_version};
