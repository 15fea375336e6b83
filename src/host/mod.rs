//! Host probes backing the default confine collaborators.
//!
//! The existence confine needs a filesystem probe and a search-path lookup;
//! the global-feature confine needs a process-wide oracle. Subjects may
//! override any of these through [`ConfineSubject`](crate::ConfineSubject),
//! but the defaults here answer against the real host.

use std::collections::HashSet;
use std::env;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use parking_lot::RwLock;

/// Process-wide feature flags, e.g. "posix" or the availability of an
/// optional library. Distinct from the per-type features declared on a
/// resource type.
static GLOBAL_FEATURES: Lazy<RwLock<HashSet<String>>> =
    Lazy::new(|| RwLock::new(HashSet::new()));

/// Record a process-wide feature as available.
pub fn add_global_feature(name: &str) {
    GLOBAL_FEATURES.write().insert(name.trim().to_ascii_lowercase());
}

/// Is a process-wide feature available? Unknown names are simply absent.
pub fn global_feature_available(name: &str) -> bool {
    GLOBAL_FEATURES
        .read()
        .contains(&name.trim().to_ascii_lowercase())
}

/// Does the path exist on the local filesystem? Probe failures of any kind
/// (permissions, dangling links) count as absent.
pub fn path_exists(path: &str) -> bool {
    !path.is_empty() && std::fs::metadata(path).is_ok()
}

/// Locate an executable by name on the `PATH` search path.
///
/// Inputs containing a path separator are probed directly instead of being
/// searched for. A hit must be a regular file and, on Unix, carry an
/// execute bit.
pub fn find_on_search_path(name: &str) -> Option<PathBuf> {
    if name.is_empty() {
        return None;
    }
    let direct = Path::new(name);
    if direct.components().count() > 1 {
        if is_executable(direct) {
            return Some(direct.to_path_buf());
        }
        return None;
    }
    let search_path = env::var_os("PATH")?;
    for dir in env::split_paths(&search_path) {
        let candidate = dir.join(name);
        if is_executable(&candidate) {
            return Some(candidate);
        }
    }
    None
}

fn is_executable(path: &Path) -> bool {
    let Ok(meta) = std::fs::metadata(path) else {
        return false;
    };
    if !meta.is_file() {
        return false;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        meta.permissions().mode() & 0o111 != 0
    }
    #[cfg(not(unix))]
    {
        true
    }
}
