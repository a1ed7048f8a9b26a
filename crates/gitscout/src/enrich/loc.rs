//! Optional code-line counting over a transient shallow clone.
//!
//! The version-control client is an external collaborator with a narrow
//! contract: clone the repository at depth one into a scratch path, nothing
//! else. The walk and line count happen in-process; no shell output is
//! parsed. Every failure degrades to a zero count with a warning.

use std::path::{Path, PathBuf};

use tokio::process::Command;
use tracing::{debug, warn};

use crate::github::RepoDetails;

/// File extensions whose lines are counted.
const COUNTED_EXTENSIONS: &[&str] = &[
    "rs", "py", "js", "jsx", "ts", "tsx", "go", "java", "c", "h", "cpp", "hpp", "cc", "cs", "rb",
    "php", "swift", "kt", "scala", "sh", "pl", "lua", "r", "sql", "html", "css", "scss", "vue",
    "svelte", "toml", "yaml", "yml", "json",
];

/// Directories excluded from the walk (build output, vendored code).
const SKIPPED_DIRS: &[&str] = &[
    ".git",
    "node_modules",
    "target",
    "vendor",
    "dist",
    "build",
    ".venv",
    "third_party",
];

/// Repositories larger than this reported size (in kilobytes) are skipped.
const MAX_REPO_KB: u64 = 512_000;

#[derive(Debug, Clone)]
pub struct LocOptions {
    /// Size ceiling in kilobytes; larger repositories are skipped.
    pub max_repo_kb: u64,
    /// Where the scratch clone is created.
    pub scratch_root: PathBuf,
}

impl Default for LocOptions {
    fn default() -> Self {
        Self {
            max_repo_kb: MAX_REPO_KB,
            scratch_root: PathBuf::from("."),
        }
    }
}

/// Count source lines of the repository's default branch.
///
/// Skips entirely (returning zero) when the reported size exceeds the
/// ceiling or the available disk space at the scratch location.
pub async fn count_code_lines(details: &RepoDetails, options: &LocOptions) -> u64 {
    let Some(clone_url) = details.clone_url.as_deref() else {
        debug!(repo = %details.full_name, "no clone url; skipping line count");
        return 0;
    };

    if details.size > options.max_repo_kb {
        warn!(
            repo = %details.full_name,
            size_kb = details.size,
            ceiling_kb = options.max_repo_kb,
            "repository too large; skipping line count"
        );
        return 0;
    }

    match fs2::available_space(&options.scratch_root) {
        Ok(available) if available / 1024 > details.size => {}
        Ok(available) => {
            warn!(
                repo = %details.full_name,
                size_kb = details.size,
                available_kb = available / 1024,
                "insufficient disk space; skipping line count"
            );
            return 0;
        }
        Err(e) => {
            warn!(repo = %details.full_name, error = %e, "disk space probe failed; skipping line count");
            return 0;
        }
    }

    let scratch = match tempfile::tempdir_in(&options.scratch_root) {
        Ok(dir) => dir,
        Err(e) => {
            warn!(repo = %details.full_name, error = %e, "scratch dir creation failed; skipping line count");
            return 0;
        }
    };

    let checkout = scratch.path().join("checkout");
    if let Err(e) = clone_shallow(clone_url, details.default_branch.as_deref(), &checkout).await {
        warn!(repo = %details.full_name, error = %e, "shallow clone failed; skipping line count");
        return 0;
    }

    // The scratch clone is removed when `scratch` drops.
    count_lines_in_tree(&checkout)
}

/// Clone `url` at depth one into `dest`.
async fn clone_shallow(url: &str, branch: Option<&str>, dest: &Path) -> std::io::Result<()> {
    let mut cmd = Command::new("git");
    cmd.arg("clone").arg("--depth").arg("1").arg("--quiet");
    if let Some(branch) = branch {
        cmd.arg("--branch").arg(branch);
    }
    cmd.arg(url)
        .arg(dest)
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null());

    let status = cmd.status().await?;
    if !status.success() {
        return Err(std::io::Error::other(format!("git clone exited with {status}")));
    }
    Ok(())
}

/// Walk `root` and sum line counts of files on the extension allow-list.
///
/// Non-UTF8 files count as zero lines.
pub fn count_lines_in_tree(root: &Path) -> u64 {
    walkdir::WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| !is_skipped_dir(entry))
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file() && has_counted_extension(entry.path()))
        .map(|entry| {
            std::fs::read_to_string(entry.path())
                .map(|contents| contents.lines().count() as u64)
                .unwrap_or(0)
        })
        .sum()
}

fn is_skipped_dir(entry: &walkdir::DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| SKIPPED_DIRS.contains(&name))
}

fn has_counted_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| COUNTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}
