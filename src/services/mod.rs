//! Services layer - cleanup phases
//!
//! Each phase talks to the cluster only through the traits in
//! [`crate::infrastructure`], so the whole run can be exercised against an
//! in-memory cluster.

pub mod finalizer_stripper;
pub mod orchestrator;
pub mod release_remover;
pub mod resource_reaper;
pub mod settle;

// Re-export commonly used types
pub use orchestrator::Orchestrator;
