use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::auth::credential::Credential;

/// Load the stored credential if present.
///
/// A file that exists but does not decode is reported as absent so the
/// caller falls through to a fresh consent.
pub fn load_credential(path: &Path) -> Result<Option<Credential>> {
    if !path.exists() {
        return Ok(None);
    }
    let bytes =
        fs::read(path).with_context(|| format!("reading token file {}", path.display()))?;
    match serde_json::from_slice::<Credential>(&bytes) {
        Ok(c) => Ok(Some(c)),
        Err(e) => {
            log::warn!("ignoring unreadable token file {}: {e}", path.display());
            Ok(None)
        }
    }
}

/// Overwrite the token file with `cred`.
pub fn save_credential(path: &Path, cred: &Credential) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    let s = serde_json::to_string_pretty(cred)?;
    fs::write(path, s).with_context(|| format!("writing token file {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }
    Ok(())
}
