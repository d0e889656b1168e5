//! Form checks run before credentials reach the session state machine.
//!
//! The state machine passes whatever it is given to the provider; these
//! checks give the user an immediate message for obviously bad input.

const MIN_PASSWORD_LEN: usize = 8;
const MIN_NAME_LEN: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    #[error("Please enter email and password")]
    MissingSignIn,
    #[error("Please enter email, password, and name")]
    MissingSignUp,
    #[error("Please enter a valid email address")]
    InvalidEmail,
    #[error("Password must be at least 8 characters long")]
    PasswordTooShort,
    #[error("Name must be at least 2 characters long")]
    NameTooShort,
}

/// Loose `local@domain.tld` shape check: one `@`, no whitespace, and a dot
/// inside the domain.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = email.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    !local.is_empty()
        && domain
            .char_indices()
            .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

/// # Errors
///
/// Returns the first problem found with the sign-in form.
pub fn validate_sign_in(email: &str, password: &str) -> Result<(), CredentialError> {
    if email.is_empty() || password.is_empty() {
        return Err(CredentialError::MissingSignIn);
    }
    if !is_valid_email(email) {
        return Err(CredentialError::InvalidEmail);
    }
    Ok(())
}

/// # Errors
///
/// Returns the first problem found with the sign-up form.
pub fn validate_sign_up(email: &str, password: &str, name: &str) -> Result<(), CredentialError> {
    if email.is_empty() || password.is_empty() || name.is_empty() {
        return Err(CredentialError::MissingSignUp);
    }
    if !is_valid_email(email) {
        return Err(CredentialError::InvalidEmail);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(CredentialError::PasswordTooShort);
    }
    if name.trim().chars().count() < MIN_NAME_LEN {
        return Err(CredentialError::NameTooShort);
    }
    Ok(())
}

#[cfg(test)]
#[path = "credentials_test.rs"]
mod tests;
