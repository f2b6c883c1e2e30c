//! Domain logic - pure release rules independent of files and git

pub mod branch;
pub mod version;

pub use branch::{normalize_branch_name, BranchPolicy};
pub use version::{ReleaseType, SemanticVersion};
