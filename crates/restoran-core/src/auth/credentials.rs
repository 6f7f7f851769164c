use anyhow::{Context, Result};
use keyring::Entry;

const SERVICE_NAME: &str = "restoran";

/// Remembered login passwords, kept in the OS keychain and keyed by email.
pub struct CredentialStore;

impl CredentialStore {
    /// Store the password for an email address
    pub fn remember(email: &str, password: &str) -> Result<()> {
        let entry = Self::entry(email)?;
        entry
            .set_password(password)
            .context("Failed to store password in keychain")?;
        Ok(())
    }

    /// Retrieve the stored password for an email address
    pub fn recall(email: &str) -> Result<String> {
        Self::entry(email)?
            .get_password()
            .context("Failed to retrieve password from keychain")
    }

    /// Delete the stored password for an email address
    pub fn forget(email: &str) -> Result<()> {
        Self::entry(email)?
            .delete_credential()
            .context("Failed to delete credential from keychain")?;
        Ok(())
    }

    pub fn has_password(email: &str) -> bool {
        Self::entry(email)
            .and_then(|entry| Ok(entry.get_password()?))
            .is_ok()
    }

    fn entry(email: &str) -> Result<Entry> {
        Entry::new(SERVICE_NAME, email).context("Failed to create keyring entry")
    }
}
