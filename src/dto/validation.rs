//! Validation helpers for DTOs.

use validator::ValidationError;

/// Length of a generated room code.
pub const ROOM_CODE_LENGTH: usize = 6;

const SESSION_ID_MAX_LENGTH: usize = 128;

/// Validates that a room code is exactly six uppercase alphanumeric
/// characters, the shape produced by the code generator.
///
/// # Examples
///
/// ```ignore
/// validate_room_code("AB12CD") // Ok
/// validate_room_code("ab12cd") // Err - lowercase
/// validate_room_code("AB12C")  // Err - too short
/// ```
pub fn validate_room_code(code: &str) -> Result<(), ValidationError> {
    if code.len() != ROOM_CODE_LENGTH {
        let mut err = ValidationError::new("room_code_length");
        err.message = Some(
            format!(
                "Room code must be exactly {} characters (got {})",
                ROOM_CODE_LENGTH,
                code.len()
            )
            .into(),
        );
        return Err(err);
    }

    if !code
        .chars()
        .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
    {
        let mut err = ValidationError::new("room_code_format");
        err.message = Some("Room code must contain only uppercase letters and digits".into());
        return Err(err);
    }

    Ok(())
}

/// Validates an opaque session identifier: non-empty, bounded, no
/// whitespace or control characters.
pub fn validate_session_id(session_id: &str) -> Result<(), ValidationError> {
    if session_id.is_empty() || session_id.len() > SESSION_ID_MAX_LENGTH {
        let mut err = ValidationError::new("session_id_length");
        err.message = Some(
            format!("Session id must be between 1 and {SESSION_ID_MAX_LENGTH} characters").into(),
        );
        return Err(err);
    }

    if session_id
        .chars()
        .any(|c| c.is_whitespace() || c.is_control())
    {
        let mut err = ValidationError::new("session_id_format");
        err.message = Some("Session id must not contain whitespace or control characters".into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_room_code_valid() {
        assert!(validate_room_code("AB12CD").is_ok());
        assert!(validate_room_code("ZZZZZZ").is_ok());
        assert!(validate_room_code("000000").is_ok());
    }

    #[test]
    fn test_validate_room_code_invalid_length() {
        assert!(validate_room_code("AB12C").is_err()); // too short
        assert!(validate_room_code("AB12CDE").is_err()); // too long
        assert!(validate_room_code("").is_err()); // empty
    }

    #[test]
    fn test_validate_room_code_invalid_format() {
        assert!(validate_room_code("ab12cd").is_err()); // lowercase
        assert!(validate_room_code("AB 2CD").is_err()); // space
        assert!(validate_room_code("AB12C$").is_err()); // symbol
    }

    #[test]
    fn test_validate_session_id() {
        assert!(validate_session_id("f3a9c1e0-77aa-4b1d-9c2e-0f6d6a2b9a01").is_ok());
        assert!(validate_session_id("").is_err());
        assert!(validate_session_id("has space").is_err());
        assert!(validate_session_id(&"x".repeat(129)).is_err());
    }
}
