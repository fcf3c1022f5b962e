//! # git-get Library
//!
//! This library reconciles a declared fleet of git repositories against their
//! local and remote state. It backs the `git-get` command-line tool: cloning
//! and refreshing a multi-repository workspace, mirroring repositories onto
//! another hosting provider, and generating repository lists from a provider.
//!
//! ## Quick Example
//!
//! ```
//! use git_get::config;
//! use git_get::identity;
//! use git_get::ignore::IgnoreSet;
//! use std::path::Path;
//!
//! let yaml = r#"
//! - url: git@github.com:acme/service.git
//!   ref: main
//! - url: git@github.com:acme/legacy.git
//! "#;
//! let repositories = config::parse(yaml, Path::new("Gitfile")).unwrap();
//! assert_eq!(identity::local_name(&repositories[0]), "service");
//!
//! let ignore = IgnoreSet::from_urls(["git@github.com:acme/legacy.git"]);
//! assert!(ignore.should_ignore(&repositories[1].url));
//! ```
//!
//! ## Core Concepts
//!
//! - **Configuration (`config`, `ignore`)**: `Gitfile`-style YAML lists of
//!   [`RepositorySpec`](config::RepositorySpec) records and the ignore lists
//!   that exclude some of them.
//! - **Identity (`identity`)**: local name, full path, ref defaulting and the
//!   log fingerprint of a repository job.
//! - **Reconciliation (`reconcile`)**: the per-repository state machine that
//!   clones, refreshes, protects local changes and restores the checked-out
//!   branch.
//! - **Scheduling (`scheduler`)**: runs jobs with a bounded number in flight
//!   and joins them all.
//! - **Mirroring (`mirror`, `provider`)**: bare mirror clones pushed to a
//!   destination that GitLab, GitHub or Bitbucket adapters create on demand.
//! - **Process execution (`exec`)**: every git invocation goes through the
//!   [`CommandRunner`](exec::CommandRunner) seam.
//!
//! ## Execution Flow
//!
//! The entry points live in `orchestrator`:
//!
//! 1.  **Load**: concatenate configuration files and ignore files.
//! 2.  **Filter**: drop ignored repositories, reporting them as skipped.
//! 3.  **Dispatch**: one job per repository through the bounded scheduler.
//! 4.  **Join**: wait for every job, then surface the first fatal error or
//!     the status rows of the batch.

pub mod config;
pub mod defaults;
pub mod error;
pub mod exec;
pub mod generate;
pub mod identity;
pub mod ignore;
pub mod mirror;
pub mod orchestrator;
pub mod output;
pub mod provider;
pub mod reconcile;
pub mod scheduler;
pub mod status;
