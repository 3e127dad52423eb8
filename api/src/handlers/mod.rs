pub mod auth;
pub mod catalog;
pub mod health;
pub mod manage;
pub mod permissions;
pub mod users;

use authz::AuthzError;

/// Parse an optional numeric id from a query string. Blank counts as absent.
pub(crate) fn parse_optional_id(raw: Option<&str>, what: &str) -> Result<Option<i64>, AuthzError> {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| AuthzError::InvalidArgument(format!("Invalid {}", what))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_optional_id() {
        assert_eq!(parse_optional_id(None, "Category ID").unwrap(), None);
        assert_eq!(parse_optional_id(Some("  "), "Category ID").unwrap(), None);
        assert_eq!(parse_optional_id(Some("7"), "Category ID").unwrap(), Some(7));
        assert!(matches!(
            parse_optional_id(Some("seven"), "Category ID"),
            Err(AuthzError::InvalidArgument(msg)) if msg == "Invalid Category ID"
        ));
    }
}
