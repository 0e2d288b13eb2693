use inquire::Confirm as ConfirmPrompt;

use crate::error::AppError;

/// Yes/no confirmation before touching key material
pub trait Confirm {
    fn confirm(&self, message: &str) -> Result<bool, AppError>;
}

/// Asks on the terminal, defaulting to no
#[derive(Debug, Default, Clone, Copy)]
pub struct InquireConfirm;

impl Confirm for InquireConfirm {
    fn confirm(&self, message: &str) -> Result<bool, AppError> {
        Ok(ConfirmPrompt::new(message).with_default(false).prompt()?)
    }
}

/// Answers yes to everything (`--yes`)
#[derive(Debug, Default, Clone, Copy)]
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&self, _message: &str) -> Result<bool, AppError> {
        Ok(true)
    }
}
