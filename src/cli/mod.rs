pub mod orchestration;

pub use orchestration::{PhaseOutcome, ReleaseWorkflow, RotateOutcome, VersionOutcome};
