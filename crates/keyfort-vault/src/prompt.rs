// SPDX-FileCopyrightText: 2026 Keyfort Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Passphrase acquisition via TTY prompt or KEYFORT_PASSPHRASE environment variable.

use keyfort_core::VaultError;
use secrecy::SecretString;

/// The environment variable name for providing the vault passphrase.
pub const PASSPHRASE_ENV_VAR: &str = "KEYFORT_PASSPHRASE";

/// Get the vault passphrase from the environment or an interactive TTY prompt.
///
/// Priority:
/// 1. `KEYFORT_PASSPHRASE` environment variable (for headless/CI use)
/// 2. Interactive TTY prompt via `rpassword` (for human operators)
///
/// Returns an error if neither source is available.
pub fn get_passphrase() -> Result<SecretString, VaultError> {
    // Check env var first.
    if let Ok(value) = std::env::var(PASSPHRASE_ENV_VAR)
        && !value.is_empty()
    {
        return Ok(SecretString::from(value));
    }

    // Try interactive prompt.
    if std::io::IsTerminal::is_terminal(&std::io::stdin()) {
        eprint!("Vault passphrase: ");
        let passphrase = rpassword::read_password()
            .map_err(|e| VaultError::Internal(format!("failed to read passphrase: {e}")))?;
        if passphrase.is_empty() {
            return Err(VaultError::InvalidPassphrase);
        }
        return Ok(SecretString::from(passphrase));
    }

    Err(VaultError::InvalidPassphrase)
}

/// Get the vault passphrase with a confirmation prompt (for vault creation).
///
/// Prompts twice and verifies the passphrases match. Only works in
/// interactive TTY mode; falls back to the env var if not a terminal.
pub fn get_passphrase_with_confirm() -> Result<SecretString, VaultError> {
    // Env var does not need confirmation.
    if let Ok(value) = std::env::var(PASSPHRASE_ENV_VAR)
        && !value.is_empty()
    {
        return Ok(SecretString::from(value));
    }

    if std::io::IsTerminal::is_terminal(&std::io::stdin()) {
        eprint!("New vault passphrase: ");
        let first = rpassword::read_password()
            .map_err(|e| VaultError::Internal(format!("failed to read passphrase: {e}")))?;
        eprint!("Confirm vault passphrase: ");
        let second = rpassword::read_password()
            .map_err(|e| VaultError::Internal(format!("failed to read passphrase: {e}")))?;

        if first != second || first.is_empty() {
            return Err(VaultError::InvalidPassphrase);
        }
        return Ok(SecretString::from(first));
    }

    Err(VaultError::InvalidPassphrase)
}
