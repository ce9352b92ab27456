use anyhow::{Context, Result};
use keyring::Entry;

const SERVICE_NAME: &str = "crewcache";

/// Remember-me storage: keeps the login password in the OS keychain so an
/// interactive client can re-authenticate without prompting.
pub struct CredentialStore;

impl CredentialStore {
    /// Save the password for an email in the OS keychain.
    pub fn save(email: &str, password: &str) -> Result<()> {
        let entry =
            Entry::new(SERVICE_NAME, email).context("Failed to create keyring entry")?;
        entry
            .set_password(password)
            .context("Failed to store password in keychain")?;
        Ok(())
    }

    /// Retrieve the saved password for an email.
    pub fn load(email: &str) -> Result<String> {
        let entry =
            Entry::new(SERVICE_NAME, email).context("Failed to create keyring entry")?;
        entry
            .get_password()
            .context("Failed to retrieve password from keychain")
    }

    /// Forget the saved password for an email.
    pub fn forget(email: &str) -> Result<()> {
        let entry =
            Entry::new(SERVICE_NAME, email).context("Failed to create keyring entry")?;
        entry
            .delete_credential()
            .context("Failed to delete credential from keychain")?;
        Ok(())
    }

    /// Whether a password is saved for this email.
    pub fn has_saved(email: &str) -> bool {
        Entry::new(SERVICE_NAME, email)
            .map(|entry| entry.get_password().is_ok())
            .unwrap_or(false)
    }
}
