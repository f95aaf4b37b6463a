use std::path::PathBuf;

use color_eyre::eyre::{eyre, Result};

/// Environment variable overriding the default log location.
pub const LOG_FILE_ENV: &str = "DLENS_LOG_FILE";

/// Environment variable holding the tracing filter for `dlens` itself.
pub const LOG_FILTER_ENV: &str = "DLENS_LOG";

const DEFAULT_DIR: &str = ".dlens";
const DEFAULT_FILE: &str = "delegations.jsonl";

/// Resolve the delegation log path: explicit flag, then environment, then
/// `$HOME/.dlens/delegations.jsonl`. The file itself need not exist.
pub fn resolve_log_path(flag: Option<PathBuf>) -> Result<PathBuf> {
    resolve_with(flag, std::env::var_os(LOG_FILE_ENV).map(PathBuf::from), home_dir())
}

fn resolve_with(flag: Option<PathBuf>, env: Option<PathBuf>, home: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = flag {
        return Ok(path);
    }
    if let Some(path) = env.filter(|p| !p.as_os_str().is_empty()) {
        return Ok(path);
    }
    let home = home.ok_or_else(|| eyre!("HOME is not set; pass --log or set {LOG_FILE_ENV}"))?;
    Ok(home.join(DEFAULT_DIR).join(DEFAULT_FILE))
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}
