//! Source acquisition: resolve the checkout that holds the documentation.
//!
//! A configured `local_path` (or `--local-path`) is used as-is. Otherwise
//! the repository is cloned with the `git` binary into `clone_dir`, which
//! defaults to `<persist_dir>/.git-cache/<url hash>`. A directory that
//! already holds a checkout is reused without fetching.

use anyhow::{bail, Context, Result};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::{Config, SourceConfig};

/// Return the checkout root, cloning first when necessary.
pub fn resolve_root(config: &Config, local_override: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = local_override.or(config.source.local_path.as_deref()) {
        tracing::debug!(path = %path.display(), "using local checkout");
        return Ok(path.to_path_buf());
    }

    let dest = clone_dir(config);
    if dest.join(".git").exists() {
        let sha = git_head_sha(&dest).unwrap_or_else(|_| "unknown".to_string());
        tracing::info!(dest = %dest.display(), head = %sha, "reusing existing checkout");
        return Ok(dest);
    }

    git_clone(&config.source, &dest)?;
    Ok(dest)
}

pub fn clone_dir(config: &Config) -> PathBuf {
    match &config.source.clone_dir {
        Some(dir) => dir.clone(),
        None => config
            .store
            .persist_dir
            .join(".git-cache")
            .join(short_hash(&config.source.repo)),
    }
}

fn git_clone(source: &SourceConfig, dest: &Path) -> Result<()> {
    std::fs::create_dir_all(dest)
        .with_context(|| format!("Failed to create clone directory: {}", dest.display()))?;

    eprintln!("Cloning {} -> {}", source.repo, dest.display());

    let mut cmd = Command::new("git");
    cmd.arg("clone");
    if let Some(branch) = &source.branch {
        cmd.args(["--branch", branch, "--single-branch"]);
    }
    if source.shallow {
        cmd.args(["--depth", "1"]);
    }
    cmd.arg(&source.repo);
    cmd.arg(dest);

    let output = cmd
        .output()
        .with_context(|| "Failed to execute 'git clone'. Is git installed?")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("git clone failed: {}", stderr.trim());
    }

    Ok(())
}

fn git_head_sha(repo_dir: &Path) -> Result<String> {
    let output = Command::new("git")
        .args(["rev-parse", "HEAD"])
        .current_dir(repo_dir)
        .output()
        .with_context(|| "Failed to get HEAD SHA")?;

    if !output.status.success() {
        bail!("git rev-parse HEAD failed");
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

fn short_hash(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())[..12].to_string()
}
