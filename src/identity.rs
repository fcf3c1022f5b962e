//! # Repository Identity
//!
//! Derives everything a job needs to know about where a declared repository
//! lives: its local name, its absolute path, the ref it tracks and a short
//! fingerprint used to correlate log lines of the same job.
//!
//! Resolution happens once, at the start of the job that owns the
//! repository. The result is immutable afterwards.

use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::config::RepositorySpec;
use crate::defaults::FINGERPRINT_LEN;
use crate::error::{Error, Result};

/// A repository with its derived, per-run identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRepository {
    /// The declared spec with `ref` defaulted.
    pub spec: RepositorySpec,
    /// Local directory name.
    pub name: String,
    /// Directory the repository is (or will be) cloned into.
    pub full_path: PathBuf,
    /// Short digest of `(url, ref, full_path)`.
    pub fingerprint: String,
    /// Destination remote in mirror mode.
    pub mirror_url: Option<String>,
}

impl ResolvedRepository {
    pub fn url(&self) -> &str {
        &self.spec.url
    }

    pub fn r#ref(&self) -> &str {
        &self.spec.r#ref
    }
}

/// Returns the local directory name for a spec.
///
/// `altname` wins when set. Otherwise everything up to the last `/` of the
/// URL is dropped, then a trailing `.git`.
pub fn local_name(spec: &RepositorySpec) -> String {
    if !spec.alt_name.is_empty() {
        return spec.alt_name.clone();
    }
    let tail = match spec.url.rfind('/') {
        Some(idx) => &spec.url[idx + 1..],
        None => spec.url.as_str(),
    };
    tail.strip_suffix(".git").unwrap_or(tail).to_string()
}

/// Sets `ref` to `default_ref` when it is empty. A non-empty ref is never
/// touched.
pub fn set_default_ref(spec: &mut RepositorySpec, default_ref: &str) {
    if spec.r#ref.is_empty() {
        spec.r#ref = default_ref.to_string();
    }
}

/// Computes the log correlation fingerprint.
///
/// Pure function of its inputs; collisions are acceptable.
pub fn fingerprint(url: &str, r#ref: &str, full_path: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{} ({}) {}", url, r#ref, full_path.display()));
    let mut digest = hex::encode(hasher.finalize());
    digest.truncate(FINGERPRINT_LEN);
    digest
}

/// Returns the mirror destination for a repository name.
pub fn mirror_url(mirror_root: &str, name: &str) -> String {
    format!("{}/{}.git", mirror_root.trim_end_matches('/'), name)
}

/// Resolves a spec for get mode under `base_dir`.
///
/// A relative `base_dir` is taken from the current directory, so the
/// resolved `full_path` is always absolute. A non-empty `path` is created
/// (with parents) below `base_dir`. Failing to create it is fatal: every job
/// shares the same filesystem assumptions.
pub fn resolve(
    spec: &RepositorySpec,
    base_dir: &Path,
    default_ref: &str,
) -> Result<ResolvedRepository> {
    let base_dir = std::path::absolute(base_dir)?;
    let parent = if spec.local_path.is_empty() {
        base_dir
    } else {
        let dir = base_dir.join(&spec.local_path);
        fs::create_dir_all(&dir).map_err(|e| Error::CreateDirectory {
            path: dir.display().to_string(),
            message: e.to_string(),
        })?;
        dir
    };

    Ok(build(spec, parent, default_ref, None))
}

/// Resolves a spec for mirror mode: the bare clone lives directly under the
/// shared scratch directory and the destination URL is derived from
/// `mirror_root`.
pub fn resolve_for_mirror(
    spec: &RepositorySpec,
    scratch_dir: &Path,
    mirror_root: &str,
    default_ref: &str,
) -> ResolvedRepository {
    let name = local_name(spec);
    let mirror = mirror_url(mirror_root, &name);
    build(spec, scratch_dir.to_path_buf(), default_ref, Some(mirror))
}

fn build(
    spec: &RepositorySpec,
    parent: PathBuf,
    default_ref: &str,
    mirror_url: Option<String>,
) -> ResolvedRepository {
    let mut spec = spec.clone();
    set_default_ref(&mut spec, default_ref);
    let name = local_name(&spec);
    let full_path = parent.join(&name);
    let fingerprint = fingerprint(&spec.url, &spec.r#ref, &full_path);

    ResolvedRepository {
        spec,
        name,
        full_path,
        fingerprint,
        mirror_url,
    }
}
