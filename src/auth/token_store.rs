use anyhow::{Result, anyhow};
use keyring::{Entry, Error as KeyringError};

const SERVICE: &str = "inbox_digest";
const API_KEY_USER: &str = "gemini_api_key";

/// Save the Gemini API key into the OS keyring
pub fn save_api_key(api_key: &str) -> Result<()> {
    let entry = Entry::new(SERVICE, API_KEY_USER);
    entry?
        .set_password(api_key)
        .map_err(|e| anyhow!(e.to_string()))?;
    Ok(())
}

/// Load the Gemini API key from the keyring, `None` when never stored
pub fn load_api_key() -> Result<Option<String>> {
    let entry = Entry::new(SERVICE, API_KEY_USER);
    match entry?.get_password() {
        Ok(v) => Ok(Some(v)),
        Err(KeyringError::NoEntry) => Ok(None),
        Err(e) => Err(anyhow!(e.to_string())),
    }
}
