// SPDX-FileCopyrightText: 2026 pwkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Master password acquisition via PWKEEP_MASTER_PASSWORD or a TTY prompt.

use std::io::{BufRead, IsTerminal};

use pwkeep_core::PwkeepError;
use secrecy::SecretString;

/// The environment variable name for providing the master password.
pub const MASTER_PASSWORD_ENV_VAR: &str = "PWKEEP_MASTER_PASSWORD";

fn from_env() -> Option<SecretString> {
    std::env::var(MASTER_PASSWORD_ENV_VAR)
        .ok()
        .filter(|value| !value.is_empty())
        .map(SecretString::from)
}

fn read_hidden(label: &str) -> Result<String, PwkeepError> {
    rpassword::prompt_password(label)
        .map_err(|e| PwkeepError::Prompt(format!("failed to read input: {e}")))
}

fn no_password_error() -> PwkeepError {
    PwkeepError::Prompt(format!(
        "No master password provided. Set {MASTER_PASSWORD_ENV_VAR} or run interactively."
    ))
}

/// Get the master password from the environment or an interactive prompt.
///
/// Priority:
/// 1. `PWKEEP_MASTER_PASSWORD` environment variable (scripts, CI)
/// 2. Interactive TTY prompt via `rpassword`
pub fn get_master_password() -> Result<SecretString, PwkeepError> {
    if let Some(password) = from_env() {
        return Ok(password);
    }

    if std::io::stdin().is_terminal() {
        let password = read_hidden("Master password: ")?;
        if password.is_empty() {
            return Err(PwkeepError::Prompt("empty password not allowed".to_string()));
        }
        return Ok(SecretString::from(password));
    }

    Err(no_password_error())
}

/// Get a new master password, prompting twice on a TTY.
pub fn get_master_password_with_confirm() -> Result<SecretString, PwkeepError> {
    // Env var does not need confirmation.
    if let Some(password) = from_env() {
        return Ok(password);
    }

    if std::io::stdin().is_terminal() {
        let first = read_hidden("New master password: ")?;
        let second = read_hidden("Confirm master password: ")?;

        if first != second {
            return Err(PwkeepError::Prompt("passwords do not match".to_string()));
        }
        if first.is_empty() {
            return Err(PwkeepError::Prompt("empty password not allowed".to_string()));
        }
        return Ok(SecretString::from(first));
    }

    Err(no_password_error())
}

/// Read a credential value: hidden prompt on a TTY, otherwise one line of stdin.
pub fn read_secret_value(name: &str) -> Result<SecretString, PwkeepError> {
    if std::io::stdin().is_terminal() {
        return read_hidden(&format!("Value for {name}: ")).map(SecretString::from);
    }

    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| PwkeepError::Prompt(format!("failed to read value from stdin: {e}")))?;
    let value = line.trim_end_matches(['\r', '\n']).to_string();
    Ok(SecretString::from(value))
}
