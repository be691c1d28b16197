//! Keyring integration for secure secret storage
//! Falls back to file storage if keyring is unavailable

use anyhow::{Result, Context};
use std::path::PathBuf;
use std::fs;

const SERVICE_NAME: &str = "startup-box";

/// A secret kept in the keyring, with its fallback file name
#[derive(Debug, Clone, Copy)]
struct SecretSlot {
    username: &'static str,
    file: &'static str,
    hint: &'static str,
}

const API_KEY: SecretSlot = SecretSlot {
    username: "llm-gateway-api-key",
    file: "api_key.txt",
    hint: "Run 'startup-box config --set-api-key YOUR_KEY' first.",
};

const FUNCTIONS_TOKEN: SecretSlot = SecretSlot {
    username: "agent-functions-token",
    file: "functions_token.txt",
    hint: "Run 'startup-box config --set-functions-token TOKEN' first.",
};

/// Get the path for a fallback secret file
fn secret_file_path(slot: SecretSlot) -> Result<PathBuf> {
    let base = directories::ProjectDirs::from("com", "startup-box", "startup-box")
        .context("Failed to get project directories")?;
    let dir = base.config_dir();
    fs::create_dir_all(dir).context("Failed to create config directory")?;
    Ok(dir.join(slot.file))
}

fn set_secret(slot: SecretSlot, value: &str) -> Result<()> {
    // Try keyring first
    if let Ok(entry) = keyring::Entry::new(SERVICE_NAME, slot.username) {
        if entry.set_password(value).is_ok() {
            // Also save to file as backup in case keyring retrieval fails
            let _ = save_to_file(&secret_file_path(slot)?, value);
            return Ok(());
        }
    }

    // Fallback to file storage
    save_to_file(&secret_file_path(slot)?, value)?;
    println!("Note: Using file-based storage (keyring unavailable)");
    Ok(())
}

fn save_to_file(path: &std::path::Path, value: &str) -> Result<()> {
    fs::write(path, value).context("Failed to write secret file")?;

    // Set restrictive permissions on Unix
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))
            .context("Failed to set file permissions")?;
    }

    Ok(())
}

fn get_secret(slot: SecretSlot) -> Result<String> {
    if let Ok(entry) = keyring::Entry::new(SERVICE_NAME, slot.username) {
        if let Ok(value) = entry.get_password() {
            return Ok(value);
        }
    }

    let path = secret_file_path(slot)?;
    let value = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}. {}", slot.username, slot.hint))?;
    Ok(value.trim().to_string())
}

fn delete_secret(slot: SecretSlot) -> Result<()> {
    if let Ok(entry) = keyring::Entry::new(SERVICE_NAME, slot.username) {
        let _ = entry.delete_credential();
    }

    let path = secret_file_path(slot)?;
    if path.exists() {
        fs::remove_file(&path).context("Failed to delete secret file")?;
    }

    Ok(())
}

fn has_secret(slot: SecretSlot) -> bool {
    if let Ok(entry) = keyring::Entry::new(SERVICE_NAME, slot.username) {
        if entry.get_password().is_ok() {
            return true;
        }
    }

    secret_file_path(slot).map(|p| p.exists()).unwrap_or(false)
}

/// Set the LLM gateway API key
pub fn set_api_key(key: &str) -> Result<()> {
    set_secret(API_KEY, key)
}

/// Get the LLM gateway API key
pub fn get_api_key() -> Result<String> {
    get_secret(API_KEY)
}

/// Delete the LLM gateway API key from both keyring and file
pub fn delete_api_key() -> Result<()> {
    delete_secret(API_KEY)
}

/// Check if the gateway API key is set (in either keyring or file)
pub fn has_api_key() -> bool {
    has_secret(API_KEY)
}

/// Set the bearer token sent to remote agent functions
pub fn set_functions_token(token: &str) -> Result<()> {
    set_secret(FUNCTIONS_TOKEN, token)
}

pub fn get_functions_token() -> Result<String> {
    get_secret(FUNCTIONS_TOKEN)
}
