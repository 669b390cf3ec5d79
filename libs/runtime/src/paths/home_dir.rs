use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

/// Platform base directory used when no explicit home dir is configured:
/// `%APPDATA%` on Windows, `$HOME` elsewhere.
fn platform_base() -> Result<PathBuf> {
    #[cfg(target_os = "windows")]
    let var = "APPDATA";
    #[cfg(not(target_os = "windows"))]
    let var = "HOME";

    match std::env::var_os(var) {
        Some(v) if !v.is_empty() => Ok(PathBuf::from(v)),
        _ => bail!("environment variable {var} is not set"),
    }
}

/// Expand a leading `~` against the platform base directory.
fn expand_tilde(raw: &str) -> Result<PathBuf> {
    if raw == "~" {
        return platform_base();
    }
    if let Some(rest) = raw.strip_prefix("~/").or_else(|| raw.strip_prefix("~\\")) {
        return Ok(platform_base()?.join(rest));
    }
    Ok(PathBuf::from(raw))
}

/// Resolve the server home directory to an absolute path.
///
/// `None` selects `<platform base>/<default_subdir>`. Relative paths are
/// resolved against the current working directory. With `create`, the
/// directory is created if missing.
pub fn resolve_home_dir(
    configured: Option<String>,
    default_subdir: &str,
    create: bool,
) -> Result<PathBuf> {
    let path = match configured {
        Some(raw) => expand_tilde(raw.trim())?,
        None => platform_base()?.join(default_subdir),
    };

    let path = if path.is_absolute() {
        path
    } else {
        std::env::current_dir()
            .context("cannot read current directory")?
            .join(path)
    };

    if create {
        ensure_dir(&path)?;
    }
    Ok(path)
}

fn ensure_dir(path: &Path) -> Result<()> {
    if path.exists() && !path.is_dir() {
        bail!("home dir {} exists and is not a directory", path.display());
    }
    std::fs::create_dir_all(path)
        .with_context(|| format!("cannot create home dir {}", path.display()))
}
