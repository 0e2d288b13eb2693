use colored::Colorize;
use inquire::Text;
use validator::ValidateEmail;

use crate::{error::AppError, profile::Identity, sync::NewIdentity};

/// Maximum length for Git username
const MAX_USERNAME_LENGTH: usize = 30;
/// Maximum length for Git email address
const MAX_EMAIL_LENGTH: usize = 100;
/// Maximum length for user alias
const MAX_ALIAS_LENGTH: usize = 30;

/// Prompts user for input until valid input is provided
pub fn prompt_until_valid<F>(prompt_message: &str, input_validation: F) -> Result<String, AppError>
where
    F: Fn(&str) -> Result<(), AppError>,
{
    loop {
        let input: String = Text::new(prompt_message).prompt()?;
        let input = input.trim().to_string();
        match input_validation(&input) {
            Ok(_) => break Ok(input),
            Err(AppError::Validation(msg)) => println!("{}", msg.red()),
            Err(e) => return Err(e),
        }
    }
}

/// Validates every field of a new identity against the existing ones
pub fn validate_new_identity(new: &NewIdentity, existing_users: &[Identity]) -> Result<(), AppError> {
    validate_input_username(&new.name)?;
    validate_input_email(&new.email)?;
    validate_input_alias(&new.alias, existing_users)
}

// Validate input helper functions

/// Validates username input
pub fn validate_input_username(name: &str) -> Result<(), AppError> {
    if name.trim().is_empty() {
        Err(AppError::Validation("Username cannot be empty".to_string()))
    } else if name.chars().count() > MAX_USERNAME_LENGTH {
        Err(AppError::Validation(format!("Username too long (max {} characters)", MAX_USERNAME_LENGTH)))
    } else {
        Ok(())
    }
}

/// Validates email input
pub fn validate_input_email(email: &str) -> Result<(), AppError> {
    if email.is_empty() {
        Err(AppError::Validation("Email cannot be empty".to_string()))
    } else if email.len() > MAX_EMAIL_LENGTH {
        Err(AppError::Validation(format!("Email too long (max {} characters)", MAX_EMAIL_LENGTH)))
    } else if !email.validate_email() {
        Err(AppError::Validation("Invalid email format".to_string()))
    } else {
        Ok(())
    }
}

/// Validates an alias input
///
/// The alias ends up in an SSH `Host` line and a key file name. OpenSSH
/// lowercases host names before matching, so only lowercase ASCII letters,
/// digits, `-`, `_` and `.` are allowed, and uniqueness ignores case.
pub fn validate_input_alias(alias: &str, existing_users: &[Identity]) -> Result<(), AppError> {
    if alias.is_empty() {
        Err(AppError::Validation("Alias cannot be empty".to_string()))
    } else if alias.len() > MAX_ALIAS_LENGTH {
        Err(AppError::Validation(format!("Alias too long (max {} characters)", MAX_ALIAS_LENGTH)))
    } else if !alias
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '_' | '.'))
    {
        Err(AppError::Validation(
            "Alias may only contain lowercase letters, digits, '-', '_' and '.'".to_string(),
        ))
    } else if existing_users.iter().any(|user| user.alias.eq_ignore_ascii_case(alias)) {
        Err(AppError::Validation("Alias already exists".to_string()))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn existing() -> Vec<Identity> {
        vec![Identity {
            id: 1,
            name: "Jane Doe".to_string(),
            email: "jane@x.com".to_string(),
            alias: "jane".to_string(),
            ssh_key_path: PathBuf::from("/k"),
        }]
    }

    #[test]
    fn test_username_rules() {
        assert!(validate_input_username("Jane Doe").is_ok());
        assert!(validate_input_username("   ").is_err());
        assert!(validate_input_username(&"x".repeat(31)).is_err());
    }

    #[test]
    fn test_email_rules() {
        assert!(validate_input_email("jane@x.com").is_ok());
        assert!(validate_input_email("").is_err());
        assert!(validate_input_email("not-an-email").is_err());
    }

    #[test]
    fn test_alias_must_be_unique() {
        let err = validate_input_alias("jane", &existing()).unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg == "Alias already exists"));
        assert!(validate_input_alias("work", &existing()).is_ok());
    }

    #[test]
    fn test_alias_rejects_uppercase_and_case_variants() {
        assert!(validate_input_alias("Jane", &[]).is_err());
        let mut users = existing();
        users[0].alias = "Work".to_string();
        let err = validate_input_alias("work", &users).unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg == "Alias already exists"));
    }

    #[test]
    fn test_alias_rejects_unsafe_characters() {
        assert!(validate_input_alias("my alias", &[]).is_err());
        assert!(validate_input_alias("../evil", &[]).is_err());
        assert!(validate_input_alias("work.2-eu_x", &[]).is_ok());
    }

    #[test]
    fn test_validate_new_identity_checks_all_fields() {
        let new = NewIdentity {
            name: "John".to_string(),
            email: "bad".to_string(),
            alias: "john".to_string(),
        };
        assert!(validate_new_identity(&new, &existing()).is_err());
    }
}
