//! Cleanup orchestrator - runs the phases in their fixed order
//!
//! ```text
//! remove releases → settle → strip finalizers → settle → reap resources
//! ```
//!
//! Release failures are recorded and the run continues. Stripping and
//! reaping failures stop the run. The returned [`RunReport`] carries both,
//! and `main` turns it into an exit code.

use std::convert::Infallible;
use tracing::{error, info, warn};

use super::finalizer_stripper::{residual_finalizers, FinalizerStripper};
use super::release_remover::{ReleaseRemover, Removal};
use super::resource_reaper::ResourceReaper;
use super::settle::{self, SettleOutcome};
use crate::config::CleanupConfig;
use crate::domain::{Phase, PhaseFailure, ReleaseOutcome, ReleaseReport, RunReport};
use crate::infrastructure::{ClusterApi, ReleaseBackend};
use crate::ui;

pub struct Orchestrator<'a> {
    config: &'a CleanupConfig,
}

impl<'a> Orchestrator<'a> {
    pub fn new(config: &'a CleanupConfig) -> Self {
        Self { config }
    }

    pub async fn run<C, B>(&self, cluster: &C, releases: &B) -> RunReport
    where
        C: ClusterApi,
        B: ReleaseBackend,
    {
        let mut report = RunReport::default();

        ui::print_phase(Phase::RemoveReleases);
        let remover = ReleaseRemover::new(
            releases,
            &self.config.release_namespace,
            self.config.uninstall_timeout,
        );
        let mut uninstalled = Vec::new();

        for name in &self.config.release_names {
            info!("Removing {} release", name);
            let outcome = match remover.remove(name).await {
                Ok(Removal::Uninstalled) => {
                    uninstalled.push(name.as_str());
                    ReleaseOutcome::Removed
                }
                Ok(Removal::NotFound) => ReleaseOutcome::NotFound,
                Err(e) => {
                    error!("Failed to remove {} release: {}", name, e);
                    ReleaseOutcome::Failed(e.to_string())
                }
            };
            report.releases.push(ReleaseReport {
                name: name.clone(),
                outcome,
            });
        }
        self.settle_releases(&remover, &uninstalled).await;

        ui::print_phase(Phase::StripFinalizers);
        match FinalizerStripper::new(cluster, self.config).strip().await {
            Ok(summary) => report.stripped = Some(summary),
            Err(error) => {
                error!("Removing finalizers failed: {}", error);
                report.failure = Some(PhaseFailure {
                    phase: Phase::StripFinalizers,
                    error,
                });
                return report;
            }
        }
        self.settle_finalizers(cluster).await;

        ui::print_phase(Phase::ReapResources);
        match ResourceReaper::new(cluster, &self.config.deletable_kinds)
            .reap()
            .await
        {
            Ok(issued) => report.reaped = Some(issued),
            Err(error) => {
                println!("{}", error);
                error!("Deleting resources failed: {}", error);
                report.failure = Some(PhaseFailure {
                    phase: Phase::ReapResources,
                    error,
                });
            }
        }

        report
    }

    /// Wait until every uninstalled release stops being reported
    async fn settle_releases<B: ReleaseBackend>(
        &self,
        remover: &ReleaseRemover<'_, B>,
        names: &[&str],
    ) {
        if names.is_empty() {
            return;
        }

        let check = move || async move {
            for name in names {
                if !remover.is_gone(name).await {
                    return Ok::<_, Infallible>(false);
                }
            }
            Ok(true)
        };
        let outcome = settle::wait_until(&self.config.settle, "release removal", check).await;

        match outcome {
            Ok(outcome) => report_settle("Uninstalled releases", outcome),
            Err(never) => match never {},
        }
    }

    /// Wait until no finalizer-bearing object still shows finalizers
    async fn settle_finalizers<C: ClusterApi>(&self, cluster: &C) {
        let kinds = &self.config.finalizer_kinds;
        let check =
            move || async move { residual_finalizers(cluster, kinds).await.map(|n| n == 0) };
        let outcome = settle::wait_until(&self.config.settle, "finalizer removal", check).await;

        match outcome {
            Ok(outcome) => report_settle("Finalizer removal", outcome),
            Err(e) => warn!("Could not confirm finalizer removal: {}", e),
        }
    }
}

fn report_settle(what: &str, outcome: SettleOutcome) {
    match outcome {
        SettleOutcome::Settled { attempts } => {
            info!("{} observed by the cluster ({} check(s))", what, attempts)
        }
        SettleOutcome::DeadlineExpired { attempts } => warn!(
            "{} not yet observed after {} check(s), continuing",
            what, attempts
        ),
    }
}
