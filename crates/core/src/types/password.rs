//! Customer password strength policy.

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Reasons a password is rejected.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordError {
    #[error("password must be at least {min} characters")]
    TooShort { min: usize },
    #[error("password must contain a lowercase letter")]
    MissingLowercase,
    #[error("password must contain an uppercase letter")]
    MissingUppercase,
    #[error("password must contain a digit")]
    MissingDigit,
    #[error("password must contain a symbol")]
    MissingSymbol,
}

/// Check a candidate password against the strength policy.
///
/// A strong password has at least [`MIN_PASSWORD_LENGTH`] characters and at
/// least one lowercase letter, uppercase letter, digit and symbol.
///
/// # Errors
///
/// Returns the first [`PasswordError`] rule the password breaks.
pub fn check_password_strength(password: &str) -> Result<(), PasswordError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(PasswordError::TooShort {
            min: MIN_PASSWORD_LENGTH,
        });
    }
    if !password.chars().any(char::is_lowercase) {
        return Err(PasswordError::MissingLowercase);
    }
    if !password.chars().any(char::is_uppercase) {
        return Err(PasswordError::MissingUppercase);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(PasswordError::MissingDigit);
    }
    if !password
        .chars()
        .any(|c| !c.is_alphanumeric() && !c.is_whitespace())
    {
        return Err(PasswordError::MissingSymbol);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strong_password() {
        assert_eq!(check_password_strength("Test123!"), Ok(()));
        assert_eq!(check_password_strength("c0rrect-Horse"), Ok(()));
    }

    #[test]
    fn test_weak_passwords() {
        assert_eq!(
            check_password_strength("Te1!"),
            Err(PasswordError::TooShort { min: 8 })
        );
        assert_eq!(
            check_password_strength("TEST123!"),
            Err(PasswordError::MissingLowercase)
        );
        assert_eq!(
            check_password_strength("test123!"),
            Err(PasswordError::MissingUppercase)
        );
        assert_eq!(
            check_password_strength("Testtest!"),
            Err(PasswordError::MissingDigit)
        );
        assert_eq!(
            check_password_strength("Test1234"),
            Err(PasswordError::MissingSymbol)
        );
    }
}
