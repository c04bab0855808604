//! Application error type.
//!
//! Every fallible operation in the crate returns `Result<_, AppError>`. The
//! error carries the process exit code alongside a user-facing message so the
//! binary can report failures without further mapping:
//!
//! - `2`: usage, configuration, or local I/O problems
//! - `3`: the input contained no usable sales rows
//! - `4`: remote service or runtime failures

pub const EXIT_USAGE: u8 = 2;
pub const EXIT_NO_DATA: u8 = 3;
pub const EXIT_RUNTIME: u8 = 4;

#[derive(Clone, PartialEq, Eq)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, message)
    }

    pub fn no_data(message: impl Into<String>) -> Self {
        Self::new(EXIT_NO_DATA, message)
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self::new(EXIT_RUNTIME, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_carry_exit_codes() {
        assert_eq!(AppError::usage("x").exit_code(), 2);
        assert_eq!(AppError::no_data("x").exit_code(), 3);
        assert_eq!(AppError::runtime("x").exit_code(), 4);
        assert_eq!(AppError::runtime("boom").to_string(), "boom");
    }
}
