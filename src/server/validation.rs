use crate::server::response::ApiError;

const MAX_NAME_LEN: usize = 200;
const MAX_PERMISSION_NAME_LEN: usize = 64;
pub const MIN_PASSWORD_LEN: usize = 6;

/// Trims `value` and checks it is non-empty and not too long.
pub fn validate_required(value: &str, field: &str) -> Result<String, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::bad_request(format!("{field} cannot be empty")));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(ApiError::bad_request(format!(
            "{field} cannot exceed {MAX_NAME_LEN} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Returns the lowercased address.
pub fn validate_email(email: &str) -> Result<String, ApiError> {
    let email = email.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(ApiError::bad_request(format!("Invalid email address: {email}")));
    }
    Ok(email)
}

pub fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::bad_request(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Accepts `#RGB` or `#RRGGBB`.
pub fn validate_color(color: &str) -> Result<(), ApiError> {
    let hex = color
        .strip_prefix('#')
        .filter(|h| (h.len() == 3 || h.len() == 6) && h.chars().all(|c| c.is_ascii_hexdigit()));
    if hex.is_none() {
        return Err(ApiError::bad_request(format!(
            "Invalid color '{color}', expected #RRGGBB"
        )));
    }
    Ok(())
}

/// Permission names look like `resource:action`, lowercase with underscores.
pub fn validate_permission_name(name: &str) -> Result<(), ApiError> {
    let is_part = |s: &str| {
        !s.is_empty()
            && s.chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
    };
    let valid = name.len() <= MAX_PERMISSION_NAME_LEN
        && name
            .split_once(':')
            .is_some_and(|(resource, action)| is_part(resource) && is_part(action));
    if !valid {
        return Err(ApiError::bad_request(format!(
            "Invalid permission name '{name}', expected resource:action"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_required_trims() {
        assert_eq!(validate_required("  Journey ", "name").unwrap(), "Journey");
        assert!(validate_required("   ", "name").is_err());
        assert!(validate_required(&"x".repeat(201), "name").is_err());
    }

    #[test]
    fn test_validate_email() {
        assert_eq!(validate_email(" Ana@Demo.com ").unwrap(), "ana@demo.com");
        assert!(validate_email("ana").is_err());
        assert!(validate_email("@demo.com").is_err());
        assert!(validate_email("ana@demo").is_err());
        assert!(validate_email("a b@demo.com").is_err());
    }

    #[test]
    fn test_validate_color() {
        assert!(validate_color("#3B82F6").is_ok());
        assert!(validate_color("#fff").is_ok());
        assert!(validate_color("3B82F6").is_err());
        assert!(validate_color("#3B82FZ").is_err());
    }

    #[test]
    fn test_validate_permission_name() {
        assert!(validate_permission_name("reports:export").is_ok());
        assert!(validate_permission_name("reports").is_err());
        assert!(validate_permission_name("Reports:Export").is_err());
        assert!(validate_permission_name(":export").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("demo123").is_ok());
        assert!(validate_password("abc").is_err());
    }
}
