//! # Repository Reconciliation
//!
//! This module implements the per-repository decision procedure of `get`
//! mode. One job owns one repository and walks it through the following
//! steps, strictly in order:
//!
//! 1.  **Resolve**: derive the full path, default the ref and compute the
//!     fingerprint (see [`crate::identity`]).
//! 2.  **Clone** when the full path does not exist
//!     (`git clone --branch {ref} {url} {path}`).
//! 3.  **Refresh** when it does. If the checked-out branch is not the ref,
//!     the job remembers it, checks out the ref, syncs, and (unless
//!     stay-on-ref is set) checks the remembered branch out again.
//! 4.  **Sync the work tree**: a clean tree is pulled directly; a dirty tree
//!     is stashed, pulled and popped. Only branch refs are pulled, tags do not
//!     move.
//! 5.  **Materialize symlinks** pointing at the full path.
//!
//! Git failures never abort the job. They are logged with the repository's
//! fingerprint and recorded in its [`RepositoryStatus`]; later steps still
//! run. In shallow mode, step 2/3 is replaced by a fresh depth-1 clone whose
//! `.git` directory is removed afterwards.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};

use crate::config::RepositorySpec;
use crate::error::Result;
use crate::exec::{CommandOutput, CommandRunner, CommandSpec};
use crate::identity::{self, ResolvedRepository};
use crate::output::OutputConfig;
use crate::status::{RepositoryStatus, StatusRow};

/// Read-only settings shared by every job of a `get` run.
#[derive(Debug, Clone)]
pub struct GetOptions {
    /// Directory that relative `path` and symlink entries are resolved in.
    pub base_dir: PathBuf,
    /// Ref used for entries without one.
    pub default_ref: String,
    /// Stay on the declared ref after refreshing instead of restoring the
    /// previously checked-out branch.
    pub stay_on_ref: bool,
    /// Replace repositories with depth-1 clones without `.git`.
    pub shallow: bool,
    pub output: OutputConfig,
}

/// What a repository looks like on disk before it is refreshed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoState {
    Absent,
    PresentOnRefBranch,
    /// `current` is `None` when the checked-out branch could not be read.
    PresentOffRefBranch { current: Option<String> },
}

/// Whether the work tree carries local modifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkTreeState {
    Clean,
    Dirty,
}

/// The finished result of one repository job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryOutcome {
    pub repository: ResolvedRepository,
    pub status: RepositoryStatus,
}

impl RepositoryOutcome {
    /// Status row located at the mirror destination in mirror mode and at the
    /// full path otherwise.
    pub fn into_row(self) -> StatusRow {
        let location = match self.repository.mirror_url {
            Some(mirror_url) => mirror_url,
            None => self.repository.full_path.display().to_string(),
        };
        StatusRow::finished(self.repository.spec.url, location, self.status)
    }
}

/// Runs the full get-mode pipeline for one repository.
///
/// Only a failure to create the repository's parent directory is returned as
/// an error; everything else is recorded in the outcome's status.
pub fn reconcile(
    spec: &RepositorySpec,
    options: &GetOptions,
    runner: &dyn CommandRunner,
) -> Result<RepositoryOutcome> {
    let repository = identity::resolve(spec, &options.base_dir, &options.default_ref)?;
    info!(
        "{}: url: {} ({}) -> {}",
        repository.fingerprint,
        repository.url(),
        options.output.paint_ref(repository.r#ref()),
        repository.full_path.display()
    );
    debug!("{}: Repository structure: '{:?}'", repository.fingerprint, repository);

    let mut job = Reconciler::new(&repository, options, runner);
    if options.shallow {
        job.replace_with_shallow_clone();
    } else {
        match job.inspect() {
            RepoState::Absent => {
                debug!(
                    "{}: path '{}' missing - cloning",
                    repository.fingerprint,
                    repository.full_path.display()
                );
                job.clone_repository();
            }
            RepoState::PresentOnRefBranch => {
                debug!("{}: Current branch is ref", repository.fingerprint);
                job.sync_work_tree();
            }
            RepoState::PresentOffRefBranch { current } => {
                debug!("{}: Current branch is not ref", repository.fingerprint);
                job.refresh_off_ref(current);
            }
        }
    }
    job.materialize_symlinks();
    let status = job.finish();

    Ok(RepositoryOutcome { repository, status })
}

/// Executes the git steps of a single repository and accumulates its status.
pub struct Reconciler<'a> {
    repo: &'a ResolvedRepository,
    options: &'a GetOptions,
    runner: &'a dyn CommandRunner,
    status: RepositoryStatus,
}

impl<'a> Reconciler<'a> {
    pub fn new(
        repo: &'a ResolvedRepository,
        options: &'a GetOptions,
        runner: &'a dyn CommandRunner,
    ) -> Self {
        Self {
            repo,
            options,
            runner,
            status: RepositoryStatus::new(),
        }
    }

    fn fp(&self) -> &str {
        &self.repo.fingerprint
    }

    fn ref_name(&self) -> &str {
        self.repo.r#ref()
    }

    fn exec(&self, command: CommandSpec) -> CommandOutput {
        debug!("{}: running '{}'", self.fp(), command);
        match self.runner.run(&command) {
            Ok(output) => output,
            Err(e) => CommandOutput::failed(e.to_string()),
        }
    }

    /// Runs git inside the repository's full path.
    fn git_in_repo(&self, args: &[&str]) -> CommandOutput {
        self.exec(CommandSpec::git(args.iter().copied()).in_dir(&self.repo.full_path))
    }

    /// Determines whether the repository exists and which branch it is on.
    pub fn inspect(&mut self) -> RepoState {
        if !self.repo.full_path.exists() {
            return RepoState::Absent;
        }
        debug!(
            "{}: path '{}' exists, will refresh from remote",
            self.fp(),
            self.repo.full_path.display()
        );

        match self.current_branch() {
            Some(branch) if branch == self.ref_name() => RepoState::PresentOnRefBranch,
            current => RepoState::PresentOffRefBranch { current },
        }
    }

    fn current_branch(&mut self) -> Option<String> {
        let output = self.git_in_repo(&["rev-parse", "--abbrev-ref", "HEAD"]);
        if output.success {
            Some(output.stdout.trim().to_string())
        } else {
            error!(
                "{}: cannot determine current branch: {}",
                self.fp(),
                output.stderr.trim()
            );
            self.status.mark_error();
            None
        }
    }

    /// `git clone --branch {ref} {url} {full_path}`
    pub fn clone_repository(&mut self) {
        info!("{}: Clone repository '{}'", self.fp(), self.repo.url());
        let full_path = self.repo.full_path.display().to_string();
        let output = self.exec(CommandSpec::git([
            "clone",
            "--branch",
            self.ref_name(),
            self.repo.url(),
            full_path.as_str(),
        ]));
        if !output.success {
            error!("{}: clone failed: {}", self.fp(), output.stderr.trim());
            self.status.mark_error();
        }
    }

    /// Removes any existing checkout, clones at depth 1 and drops `.git`.
    pub fn replace_with_shallow_clone(&mut self) {
        let full_path = self.repo.full_path.clone();
        if full_path.exists() {
            debug!(
                "{}: path '{}' exists - removing target path",
                self.fp(),
                full_path.display()
            );
            if let Err(e) = fs::remove_dir_all(&full_path) {
                error!("{}: cannot remove '{}': {}", self.fp(), full_path.display(), e);
                self.status.mark_error();
                return;
            }
        }

        info!("{}: Shallow clone repository '{}'", self.fp(), self.repo.url());
        let target = full_path.display().to_string();
        let output = self.exec(CommandSpec::git([
            "clone",
            "--depth",
            "1",
            "--branch",
            self.ref_name(),
            self.repo.url(),
            target.as_str(),
        ]));
        if !output.success {
            error!("{}: shallow clone failed: {}", self.fp(), output.stderr.trim());
            self.status.mark_error();
            return;
        }

        let dot_git = full_path.join(".git");
        if dot_git.exists() {
            if let Err(e) = fs::remove_dir_all(&dot_git) {
                error!("{}: cannot remove '{}': {}", self.fp(), dot_git.display(), e);
                self.status.mark_error();
            }
        }
    }

    /// Checks out the ref, syncs, then restores the original branch unless
    /// stay-on-ref is set.
    pub fn refresh_off_ref(&mut self, current: Option<String>) {
        let target = self.ref_name().to_string();
        self.checkout(&target);
        self.sync_work_tree();

        match current {
            Some(branch) if !self.options.stay_on_ref => self.checkout(&branch),
            Some(_) => debug!(
                "{}: Stay on ref branch '{}'",
                self.fp(),
                self.options.output.paint_ref(&target)
            ),
            None => warn!(
                "{}: original branch unknown, staying on '{}'",
                self.fp(),
                self.options.output.paint_ref(&target)
            ),
        }
    }

    /// `git checkout {branch}`; any target other than the ref marks the
    /// repository as not on its ref.
    pub fn checkout(&mut self, branch: &str) {
        info!(
            "{}: Checkout to '{}' branch in '{}'",
            self.fp(),
            self.options.output.paint_branch(branch),
            self.repo.full_path.display()
        );
        if branch != self.ref_name() {
            self.status.mark_not_on_ref_branch();
        }
        let output = self.git_in_repo(&["checkout", branch]);
        if !output.success {
            warn!("{}: checkout failed: {}", self.fp(), output.stderr.trim());
            self.status.mark_error();
        }
    }

    /// Clean iff neither unstaged nor staged changes exist.
    pub fn work_tree_state(&self) -> WorkTreeState {
        let unstaged = self.git_in_repo(&["diff", "--quiet"]).success;
        let staged = self.git_in_repo(&["diff", "--staged", "--quiet"]).success;
        if unstaged && staged {
            WorkTreeState::Clean
        } else {
            WorkTreeState::Dirty
        }
    }

    /// Pulls, protecting local modifications with a stash.
    pub fn sync_work_tree(&mut self) {
        match self.work_tree_state() {
            WorkTreeState::Clean => {
                debug!("{}: Repo Status is clean", self.fp());
                self.pull();
            }
            WorkTreeState::Dirty => {
                debug!("{}: Repo is NOT clean", self.fp());
                self.status.mark_uncommitted_changes();
                self.stash("save", "Stash unsaved changes");
                self.pull();
                self.stash("pop", "Restore stashed changes");
            }
        }
    }

    fn stash(&mut self, action: &str, description: &str) {
        info!("{}: {}", self.fp(), description);
        let output = self.git_in_repo(&["stash", action]);
        if !output.success {
            warn!("{}: stash {} failed: {}", self.fp(), action, output.stderr.trim());
            self.status.mark_error();
        }
    }

    fn ref_exists(&self, namespace: &str) -> bool {
        let full_ref = format!("refs/{}/{}", namespace, self.ref_name());
        self.git_in_repo(&["show-ref", "--quiet", "--verify", full_ref.as_str()])
            .success
    }

    /// `git pull -f`, only when the ref is a branch.
    pub fn pull(&mut self) {
        if !self.ref_exists("heads") {
            let kind = if self.ref_exists("tags") { "a tag" } else { "not a branch" };
            debug!(
                "{}: Skip pulling upstream changes for '{}' which is {}",
                self.fp(),
                self.options.output.paint_ref(self.ref_name()),
                kind
            );
            return;
        }

        info!("{}: Pulling upstream changes", self.fp());
        let output = self.git_in_repo(&["pull", "-f"]);
        if !output.success {
            error!("{}: pull failed: {}", self.fp(), output.stderr.trim());
            self.status.mark_error();
        }
    }

    /// Creates every declared symlink that does not exist yet.
    pub fn materialize_symlinks(&mut self) {
        let symlinks = self.repo.spec.symlinks.clone();
        for symlink in symlinks {
            let link = self.options.base_dir.join(&symlink);
            self.create_symlink(&link);
        }
    }

    fn create_symlink(&mut self, link: &Path) {
        info!("{}: Processing symlink '{}'", self.fp(), link.display());
        if fs::symlink_metadata(link).is_ok() {
            debug!(
                "{}: path for symlink '{}' exists (may not be symlink, don't care)",
                self.fp(),
                link.display()
            );
            return;
        }

        if let Some(parent) = link.parent().filter(|p| !p.as_os_str().is_empty()) {
            match fs::metadata(parent) {
                Ok(meta) if !meta.is_dir() => {
                    error!(
                        "{}: path for symlink '{}' directory '{}' exists, but is not directory - check configuration",
                        self.fp(),
                        link.display(),
                        parent.display()
                    );
                    self.status.mark_error();
                    return;
                }
                Ok(_) => {}
                Err(_) => {
                    if let Err(e) = fs::create_dir_all(parent) {
                        error!("{}: cannot create '{}': {}", self.fp(), parent.display(), e);
                        self.status.mark_error();
                        return;
                    }
                }
            }
        }

        if let Err(e) = symlink_dir(&self.repo.full_path, link) {
            error!(
                "{}: cannot create symlink '{}': {}",
                self.fp(),
                link.display(),
                e
            );
            self.status.mark_error();
        }
    }

    /// Marks the job processed and hands its status back.
    pub fn finish(mut self) -> RepositoryStatus {
        self.status.mark_processed();
        self.status
    }
}

#[cfg(unix)]
fn symlink_dir(original: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(original, link)
}

#[cfg(windows)]
fn symlink_dir(original: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_dir(original, link)
}
