//! # Mirror Pipeline
//!
//! Replicates a repository onto another hosting provider: a bare mirror clone
//! is made inside the run's scratch directory and pushed wholesale to
//! `{mirror_root}/{name}.git`, creating the destination first when it does
//! not exist yet.
//!
//! The scratch directory is owned by the orchestrator. Each job only writes
//! below its own `{scratch}/{name}` subdirectory.

use std::path::Path;

use log::{debug, error, info};

use crate::config::RepositorySpec;
use crate::error::Result;
use crate::exec::{CommandOutput, CommandRunner, CommandSpec};
use crate::identity;
use crate::provider::{MirrorProvider, Visibility};
use crate::reconcile::RepositoryOutcome;
use crate::status::RepositoryStatus;

/// Read-only settings shared by every job of a mirror run.
#[derive(Debug, Clone)]
pub struct MirrorOptions {
    /// Destination prefix, e.g. `git@gitlab.com:acme/mirrors`.
    pub mirror_root: String,
    /// Visibility of destinations created during the run.
    pub visibility: Visibility,
    /// Ref used for entries without one.
    pub default_ref: String,
}

/// Mirrors one repository.
///
/// `destination` is the provider used to ensure the destination exists before
/// pushing; `None` is a dry run that stops after the local mirror clone.
/// Provider failures while creating the destination are returned as errors,
/// git failures are recorded in the outcome's status.
pub fn mirror_repository(
    spec: &RepositorySpec,
    scratch_dir: &Path,
    options: &MirrorOptions,
    destination: Option<&dyn MirrorProvider>,
    runner: &dyn CommandRunner,
) -> Result<RepositoryOutcome> {
    let repository = identity::resolve_for_mirror(
        spec,
        scratch_dir,
        &options.mirror_root,
        &options.default_ref,
    );
    let fp = repository.fingerprint.as_str();
    // Always set by `resolve_for_mirror`; the status row reports the same value.
    let mirror_url = repository.mirror_url.clone().unwrap_or_default();
    info!("{}: url: {} -> {}", fp, repository.url(), mirror_url);

    let mut status = RepositoryStatus::new();
    let full_path = repository.full_path.display().to_string();

    debug!("{}: path '{}' cloning for mirror", fp, full_path);
    let clone = run(
        runner,
        fp,
        CommandSpec::git(["clone", "--mirror", repository.url(), full_path.as_str()]),
    );
    if !clone.success {
        error!("{}: mirror clone failed: {}", fp, clone.stderr.trim());
        status.mark_error();
    } else if let Some(provider) = destination {
        provider.ensure_mirror_exists(&mirror_url, repository.url(), options.visibility, fp)?;

        info!("{}: Pushing mirror to '{}'", fp, mirror_url);
        let push = run(
            runner,
            fp,
            CommandSpec::git(["push", "--mirror", mirror_url.as_str()])
                .in_dir(&repository.full_path),
        );
        if !push.success {
            error!("{}: mirror push failed: {}", fp, push.stderr.trim());
            status.mark_error();
        }
    } else {
        info!(
            "{}: skipping '{}' remote push per user request",
            fp,
            repository.url()
        );
    }

    status.mark_processed();
    Ok(RepositoryOutcome { repository, status })
}

fn run(runner: &dyn CommandRunner, fp: &str, command: CommandSpec) -> CommandOutput {
    debug!("{}: running '{}'", fp, command);
    runner
        .run(&command)
        .unwrap_or_else(|e| CommandOutput::failed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::provider::{OwnerFilters, ProviderKind, RemoteLocation, RemoteRepository};
    use std::path::PathBuf;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingRunner {
        calls: Mutex<Vec<CommandSpec>>,
        fail_clone: bool,
    }

    impl CommandRunner for RecordingRunner {
        fn run(&self, command: &CommandSpec) -> Result<CommandOutput> {
            self.calls.lock().unwrap().push(command.clone());
            if self.fail_clone && command.subcommand() == Some("clone") {
                return Ok(CommandOutput::failed("Repository not found"));
            }
            Ok(CommandOutput::ok(""))
        }
    }

    #[derive(Default)]
    struct FakeDestination {
        existing: bool,
        fail_create: bool,
        exists_calls: Mutex<Vec<String>>,
        created: Mutex<Vec<String>>,
    }

    impl MirrorProvider for FakeDestination {
        fn kind(&self) -> ProviderKind {
            ProviderKind::GitLab
        }

        fn repository_exists(&self, location: &RemoteLocation, _fp: &str) -> bool {
            self.exists_calls
                .lock()
                .unwrap()
                .push(location.full_path.clone());
            self.existing
        }

        fn create_repository(
            &self,
            location: &RemoteLocation,
            _visibility: Visibility,
            _description: &str,
            _fp: &str,
        ) -> Result<()> {
            if self.fail_create {
                return Err(Error::NamespaceNotFound {
                    namespace: location.namespace().to_string(),
                });
            }
            self.created.lock().unwrap().push(location.full_path.clone());
            Ok(())
        }

        fn fetch_owner_repos(
            &self,
            _owner: &str,
            _filters: &OwnerFilters,
        ) -> Result<Vec<RemoteRepository>> {
            Ok(Vec::new())
        }
    }

    fn options() -> MirrorOptions {
        MirrorOptions {
            mirror_root: "git@gitlab.com:acme/mirrors".to_string(),
            visibility: Visibility::Private,
            default_ref: "master".to_string(),
        }
    }

    fn scratch() -> PathBuf {
        PathBuf::from("/tmp/gitgetmirror-test")
    }

    #[test]
    fn test_dry_run_only_clones() {
        let runner = RecordingRunner::default();
        let spec = RepositorySpec::new("git@github.com:upstream/tool.git");

        let outcome = mirror_repository(&spec, &scratch(), &options(), None, &runner).unwrap();

        let calls = runner.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].args,
            vec![
                "clone",
                "--mirror",
                "git@github.com:upstream/tool.git",
                "/tmp/gitgetmirror-test/tool"
            ]
        );
        assert!(outcome.status.processed());
        assert!(!outcome.status.error());
        assert_eq!(
            outcome.repository.mirror_url.as_deref(),
            Some("git@gitlab.com:acme/mirrors/tool.git")
        );
    }

    #[test]
    fn test_push_creates_missing_destination_then_pushes() {
        let runner = RecordingRunner::default();
        let destination = FakeDestination::default();
        let spec = RepositorySpec::new("git@github.com:upstream/tool.git");

        let outcome =
            mirror_repository(&spec, &scratch(), &options(), Some(&destination), &runner).unwrap();

        assert_eq!(*destination.created.lock().unwrap(), vec!["acme/mirrors/tool"]);
        let calls = runner.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(
            calls[1].args,
            vec!["push", "--mirror", "git@gitlab.com:acme/mirrors/tool.git"]
        );
        assert_eq!(calls[1].dir, Some(scratch().join("tool")));
        assert!(!outcome.status.error());
    }

    #[test]
    fn test_push_target_matches_reported_location() {
        let runner = RecordingRunner::default();
        let destination = FakeDestination::default();
        let spec = RepositorySpec::new("git@github.com:upstream/tool.git");
        let options = MirrorOptions {
            mirror_root: "git@gitlab.com:acme/mirrors/".to_string(),
            ..options()
        };

        let outcome =
            mirror_repository(&spec, &scratch(), &options, Some(&destination), &runner).unwrap();

        let calls = runner.calls.lock().unwrap();
        let row = outcome.into_row();
        assert_eq!(row.location.as_deref(), Some(calls[1].args[2].as_str()));
        assert_eq!(calls[1].args[2], "git@gitlab.com:acme/mirrors/tool.git");
    }

    #[test]
    fn test_existing_destination_is_not_recreated() {
        let runner = RecordingRunner::default();
        let destination = FakeDestination {
            existing: true,
            ..FakeDestination::default()
        };
        let spec = RepositorySpec::new("git@github.com:upstream/tool.git");

        mirror_repository(&spec, &scratch(), &options(), Some(&destination), &runner).unwrap();

        assert_eq!(destination.exists_calls.lock().unwrap().len(), 1);
        assert!(destination.created.lock().unwrap().is_empty());
        assert_eq!(runner.calls.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_failed_clone_skips_destination_and_push() {
        let runner = RecordingRunner {
            fail_clone: true,
            ..RecordingRunner::default()
        };
        let destination = FakeDestination::default();
        let spec = RepositorySpec::new("git@github.com:upstream/tool.git");

        let outcome =
            mirror_repository(&spec, &scratch(), &options(), Some(&destination), &runner).unwrap();

        assert!(outcome.status.error());
        assert!(outcome.status.processed());
        assert!(destination.exists_calls.lock().unwrap().is_empty());
        assert_eq!(runner.calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_destination_creation_failure_is_fatal() {
        let runner = RecordingRunner::default();
        let destination = FakeDestination {
            fail_create: true,
            ..FakeDestination::default()
        };
        let spec = RepositorySpec::new("git@github.com:upstream/tool.git");

        let err = mirror_repository(&spec, &scratch(), &options(), Some(&destination), &runner)
            .unwrap_err();
        assert!(matches!(err, Error::NamespaceNotFound { namespace } if namespace == "acme/mirrors"));
        // No push after a failed creation
        assert_eq!(runner.calls.lock().unwrap().len(), 1);
    }
}
