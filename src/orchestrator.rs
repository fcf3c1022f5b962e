//! # Batch Orchestration
//!
//! Entry points for whole runs. Both modes follow the same flow:
//!
//! 1.  Load and concatenate the configuration files (missing ones are fatal).
//! 2.  Load the ignore files (missing ones are skipped) and split off ignored
//!     repositories, which are reported as skipped and never reach a job.
//! 3.  Dispatch one job per remaining repository through the bounded
//!     scheduler and wait for all of them.
//! 4.  Return the first fatal error raised by any job, or one status row per
//!     declared repository in declaration order.

use std::path::PathBuf;

use log::{debug, info, warn};

use crate::config::{self, RepositorySpec};
use crate::defaults::MIRROR_SCRATCH_PREFIX;
use crate::error::Result;
use crate::exec::CommandRunner;
use crate::ignore::IgnoreSet;
use crate::mirror::{self, MirrorOptions};
use crate::provider::MirrorProvider;
use crate::reconcile::{self, GetOptions, RepositoryOutcome};
use crate::scheduler;
use crate::status::{StatusRow, Summary};

/// Inputs of a `get` run.
#[derive(Debug, Clone)]
pub struct GetRequest {
    pub config_files: Vec<PathBuf>,
    pub ignore_files: Vec<PathBuf>,
    pub concurrency: usize,
    pub options: GetOptions,
}

/// Inputs of a `mirror` run.
#[derive(Debug, Clone)]
pub struct MirrorRequest {
    pub config_files: Vec<PathBuf>,
    pub ignore_files: Vec<PathBuf>,
    pub concurrency: usize,
    pub options: MirrorOptions,
}

/// Declared repositories split by the ignore filter.
struct Batch {
    declared: Vec<RepositorySpec>,
    ignored: Vec<bool>,
}

impl Batch {
    fn load(config_files: &[PathBuf], ignore_files: &[PathBuf]) -> Result<Self> {
        let declared = config::load_repositories(config_files)?;
        let ignore = IgnoreSet::from_entries(&config::load_ignore_entries(ignore_files)?);
        let ignored: Vec<bool> = declared
            .iter()
            .map(|spec| ignore.should_ignore(&spec.url))
            .collect();

        for spec in declared.iter().filter(|spec| ignore.should_ignore(&spec.url)) {
            info!("Skipping ignored repository '{}'", spec.url);
        }
        debug!(
            "{} repositories declared, {} ignored",
            declared.len(),
            ignored.iter().filter(|i| **i).count()
        );

        Ok(Self { declared, ignored })
    }

    fn active(&self) -> Vec<&RepositorySpec> {
        self.declared
            .iter()
            .zip(&self.ignored)
            .filter(|(_, ignored)| !**ignored)
            .map(|(spec, _)| spec)
            .collect()
    }

    /// Merges job outcomes back into declaration order, failing with the first
    /// fatal job error.
    fn into_rows(self, outcomes: Vec<Result<RepositoryOutcome>>) -> Result<Vec<StatusRow>> {
        let mut outcomes = outcomes.into_iter();
        let mut rows = Vec::with_capacity(self.declared.len());
        for (spec, ignored) in self.declared.into_iter().zip(self.ignored) {
            if ignored {
                rows.push(StatusRow::skipped(spec.url));
                continue;
            }
            match outcomes.next() {
                Some(outcome) => rows.push(outcome?.into_row()),
                None => warn!("No outcome recorded for '{}'", spec.url),
            }
        }
        log_summary(&rows);
        Ok(rows)
    }
}

fn log_summary(rows: &[StatusRow]) {
    let summary = Summary::of(rows);
    info!(
        "Processed {} repositories: {} clean, {} with errors, {} skipped",
        summary.total, summary.clean, summary.errors, summary.skipped
    );
}

/// Clones or refreshes every declared repository.
pub fn get_repositories(
    request: &GetRequest,
    runner: &dyn CommandRunner,
) -> Result<Vec<StatusRow>> {
    let batch = Batch::load(&request.config_files, &request.ignore_files)?;
    let active = batch.active();

    let outcomes = scheduler::run_bounded(&active, request.concurrency, |spec| {
        reconcile::reconcile(spec, &request.options, runner)
    })?;

    batch.into_rows(outcomes)
}

/// Mirrors every declared repository.
///
/// `destination` is `None` for a dry run: repositories are mirror-cloned but
/// no provider is contacted and nothing is pushed.
pub fn mirror_repositories(
    request: &MirrorRequest,
    destination: Option<&dyn MirrorProvider>,
    runner: &dyn CommandRunner,
) -> Result<Vec<StatusRow>> {
    let batch = Batch::load(&request.config_files, &request.ignore_files)?;
    let active = batch.active();

    let scratch = tempfile::Builder::new()
        .prefix(MIRROR_SCRATCH_PREFIX)
        .tempdir()?;
    debug!("Mirror scratch directory: {}", scratch.path().display());

    let outcomes = scheduler::run_bounded(&active, request.concurrency, |spec| {
        mirror::mirror_repository(spec, scratch.path(), &request.options, destination, runner)
    });

    let scratch_path = scratch.path().display().to_string();
    if let Err(e) = scratch.close() {
        warn!("Could not remove scratch directory {}: {}", scratch_path, e);
    }
    let outcomes = outcomes?;

    batch.into_rows(outcomes)
}
