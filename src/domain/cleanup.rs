//! Cleanup run domain types
//!
//! The run is a fixed sequence of phases. Each phase reports a typed result
//! and the orchestrator decides whether the run continues.

use std::process::ExitCode;

use crate::error::ClusterError;

use super::release::ReleaseReport;

/// Phases of a cleanup run, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    RemoveReleases,
    StripFinalizers,
    ReapResources,
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Self::RemoveReleases => "Removing releases",
            Self::StripFinalizers => "Removing finalizers",
            Self::ReapResources => "Deleting resources",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Self::RemoveReleases => "📦",
            Self::StripFinalizers => "🔓",
            Self::ReapResources => "🧹",
        }
    }
}

/// A phase that stopped the run
#[derive(Debug)]
pub struct PhaseFailure {
    pub phase: Phase,
    pub error: ClusterError,
}

/// Counters reported by the finalizer stripping phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StripSummary {
    pub finalizers_removed: usize,
    pub owner_references_cleared: usize,
    pub bindings_released: usize,
}

/// Everything a run did, in order
#[derive(Debug, Default)]
pub struct RunReport {
    pub releases: Vec<ReleaseReport>,
    pub stripped: Option<StripSummary>,
    /// Number of (kind, scope) bulk deletes issued
    pub reaped: Option<usize>,
    pub failure: Option<PhaseFailure>,
}

impl RunReport {
    pub fn release_failures(&self) -> usize {
        self.releases
            .iter()
            .filter(|r| r.outcome.is_failure())
            .count()
    }

    pub fn exit_status(&self) -> ExitStatus {
        if self.failure.is_some() {
            ExitStatus::Fatal
        } else if self.release_failures() > 0 {
            ExitStatus::ReleaseFailures
        } else {
            ExitStatus::Success
        }
    }
}

/// Process exit status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    /// Cleanup finished but some releases could not be removed
    ReleaseFailures,
    Fatal,
    Interrupted,
}

impl ExitStatus {
    pub fn code(&self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Fatal => 1,
            Self::ReleaseFailures => 2,
            Self::Interrupted => 130,
        }
    }
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        ExitCode::from(status.code())
    }
}
