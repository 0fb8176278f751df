use kasira_core::{AppError, AppResult};

const PASSWORD_LENGTH: usize = 12;
const ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZabcdefghjkmnpqrstuvwxyz23456789";

/// Generates a random temporary password without look-alike characters.
pub(super) fn generate() -> AppResult<String> {
    let mut bytes = [0u8; PASSWORD_LENGTH];
    getrandom::fill(&mut bytes).map_err(|error| {
        AppError::Internal(format!("failed to generate temporary password: {error}"))
    })?;

    Ok(bytes
        .iter()
        .map(|byte| {
            let index = (*byte as usize) % ALPHABET.len();
            ALPHABET[index] as char
        })
        .collect())
}
