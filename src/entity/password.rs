//! Password shape policy.

use crate::error::AuthError;

/// Minimum password length, in characters.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length, in characters.
pub const MAX_PASSWORD_LENGTH: usize = 50;

/// Check a candidate password against the shape policy.
///
/// Length must fall in `[MIN_PASSWORD_LENGTH, MAX_PASSWORD_LENGTH]`; a
/// violation short-circuits before any character classification. Otherwise
/// all four classes must be present: digit, uppercase, lowercase, and a
/// symbol or punctuation character.
///
/// # Errors
/// Returns [`AuthError::InvalidPassword`]; the message never echoes the
/// candidate.
pub fn validate_password(candidate: &str) -> Result<(), AuthError> {
    let length = candidate.chars().count();
    if !(MIN_PASSWORD_LENGTH..=MAX_PASSWORD_LENGTH).contains(&length) {
        return Err(AuthError::InvalidPassword);
    }

    let (mut digit, mut upper, mut lower, mut symbol) = (false, false, false, false);
    for ch in candidate.chars() {
        if ch.is_numeric() {
            digit = true;
        } else if ch.is_uppercase() {
            upper = true;
        } else if ch.is_lowercase() {
            lower = true;
        } else if is_symbol(ch) {
            symbol = true;
        }
    }

    if digit && upper && lower && symbol {
        Ok(())
    } else {
        Err(AuthError::InvalidPassword)
    }
}

/// Policy check plus the password/confirmation match check.
///
/// # Errors
/// [`AuthError::PasswordMismatch`] when the pair differs,
/// [`AuthError::InvalidPassword`] on a policy violation.
pub fn validate_password_pair(password: &str, confirm: &str) -> Result<(), AuthError> {
    if password != confirm {
        return Err(AuthError::PasswordMismatch);
    }
    validate_password(password)
}

fn is_symbol(ch: char) -> bool {
    !ch.is_alphanumeric() && !ch.is_whitespace() && !ch.is_control()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_table() {
        // (candidate, accepted)
        let cases = [
            ("Ab3#defg", true),
            ("abcdefgh", false), // no digit, upper, or symbol
            ("ABCDEFG1", false), // no lower or symbol
            ("Ab3#de", false),   // length 6 < 8
            ("Ab3#defgAb3#defgAb3#defgAb3#defgAb3#defgAb3#defg89", true), // length 50
            ("Ab3#defgAb3#defgAb3#defgAb3#defgAb3#defgAb3#defg890", false), // length 51
            ("", false),
        ];

        for (candidate, accepted) in cases {
            assert_eq!(
                validate_password(candidate).is_ok(),
                accepted,
                "candidate {candidate:?}"
            );
        }
    }

    #[test]
    fn length_violation_short_circuits_classification() {
        // Too short but otherwise all four classes present.
        assert!(matches!(
            validate_password("Ab3#d"),
            Err(AuthError::InvalidPassword)
        ));
    }

    #[test]
    fn pair_mismatch_is_reported_before_policy() {
        assert!(matches!(
            validate_password_pair("Ab3#defg", "Ab3#defh"),
            Err(AuthError::PasswordMismatch)
        ));
        assert!(validate_password_pair("Ab3#defg", "Ab3#defg").is_ok());
    }
}
