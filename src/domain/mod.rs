//! Domain layer - pure business logic
//!
//! This module contains types with no external I/O.
//! Types and functions here can be unit tested without mocking.

pub mod cleanup;
pub mod release;
pub mod resource;

// Re-export commonly used types
pub use cleanup::{ExitStatus, Phase, PhaseFailure, RunReport, StripSummary};
pub use release::{ReleaseInfo, ReleaseOutcome, ReleaseReport};
pub use resource::{BindingRef, ObjectSummary, TrackedKind};
