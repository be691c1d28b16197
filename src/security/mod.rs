//! Security module
//!
//! Secrets (gateway API key, agent function token) are kept in the OS
//! keyring, never in the config or session files.

pub mod keyring;

use anyhow::Result;

/// Set API key in secure keyring
pub fn set_api_key(key: &str) -> Result<()> {
    keyring::set_api_key(key)
}

/// Get API key from secure keyring
pub fn get_api_key() -> Result<String> {
    keyring::get_api_key()
}

/// Delete API key from keyring
pub fn delete_api_key() -> Result<()> {
    keyring::delete_api_key()
}

/// Check if an API key is stored
pub fn has_api_key() -> bool {
    keyring::has_api_key()
}

/// Token for remote agent functions, if one has been stored
pub fn functions_token() -> Option<String> {
    keyring::get_functions_token().ok().filter(|t| !t.is_empty())
}
