use super::ApiError;

const MAX_TEXT: usize = 255;
const MIN_PASSWORD: usize = 8;
const MAX_PASSWORD: usize = 40;
const MAX_LIMIT: i64 = 1000;

pub fn validate_email(email: &str) -> Result<String, ApiError> {
    let email = email.trim();
    let invalid = || ApiError::validation("email", "value is not a valid email address");

    if email.is_empty() || email.chars().count() > MAX_TEXT || email.contains(char::is_whitespace)
    {
        return Err(invalid());
    }

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|label| label.is_empty()) {
        return Err(invalid());
    }

    Ok(email.to_string())
}

pub fn validate_password<'a>(field: &str, password: &'a str) -> Result<&'a str, ApiError> {
    let len = password.chars().count();
    if !(MIN_PASSWORD..=MAX_PASSWORD).contains(&len) {
        return Err(ApiError::validation(
            field,
            format!("Password must be between {MIN_PASSWORD} and {MAX_PASSWORD} characters"),
        ));
    }
    Ok(password)
}

pub fn validate_full_name(full_name: Option<&str>) -> Result<(), ApiError> {
    max_length("full_name", full_name, MAX_TEXT)
}

pub fn validate_title(title: &str) -> Result<&str, ApiError> {
    if title.is_empty() {
        return Err(ApiError::validation("title", "Title cannot be empty"));
    }
    max_length("title", Some(title), MAX_TEXT)?;
    Ok(title)
}

pub fn validate_description(description: Option<&str>) -> Result<(), ApiError> {
    max_length("description", description, MAX_TEXT)
}

pub fn validate_key_name(name: &str) -> Result<&str, ApiError> {
    if name.is_empty() {
        return Err(ApiError::validation("name", "Name cannot be empty"));
    }
    max_length("name", Some(name), MAX_TEXT)?;
    Ok(name)
}

/// Checks `skip`/`limit` and returns them as an (offset, limit) pair.
pub fn validate_pagination(skip: i64, limit: i64) -> Result<(u64, u64), ApiError> {
    let offset = u64::try_from(skip)
        .map_err(|_| ApiError::validation("skip", "skip must be zero or greater"))?;

    if !(1..=MAX_LIMIT).contains(&limit) {
        return Err(ApiError::validation(
            "limit",
            format!("Invalid limit: {limit}. Limit must be between 1 and {MAX_LIMIT}"),
        ));
    }

    Ok((offset, limit.unsigned_abs()))
}

fn max_length(field: &str, value: Option<&str>, max: usize) -> Result<(), ApiError> {
    match value {
        Some(v) if v.chars().count() > max => Err(ApiError::validation(
            field,
            format!("{field} must be {max} characters or less"),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert_eq!(validate_email(" a@b.com ").unwrap(), "a@b.com");
        assert!(validate_email("first.last@sub.example.org").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("@b.com").is_err());
        assert!(validate_email("a@b").is_err());
        assert!(validate_email("a@b..com").is_err());
        assert!(validate_email("a@@b.com").is_err());
        assert!(validate_email("a b@c.com").is_err());
        assert!(validate_email(&format!("{}@b.com", "a".repeat(260))).is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("password", "12345678").is_ok());
        assert!(validate_password("password", &"x".repeat(40)).is_ok());
        assert!(validate_password("password", "1234567").is_err());
        assert!(validate_password("password", &"x".repeat(41)).is_err());
    }

    #[test]
    fn test_validate_title_and_description() {
        assert!(validate_title("Widget").is_ok());
        assert!(validate_title("").is_err());
        assert!(validate_title(&"t".repeat(256)).is_err());

        assert!(validate_description(None).is_ok());
        assert!(validate_description(Some(&"d".repeat(255))).is_ok());
        assert!(validate_description(Some(&"d".repeat(256))).is_err());
    }

    #[test]
    fn test_validate_pagination() {
        assert_eq!(validate_pagination(0, 100).unwrap(), (0, 100));
        assert_eq!(validate_pagination(5, 1000).unwrap(), (5, 1000));
        assert!(validate_pagination(-1, 10).is_err());
        assert!(validate_pagination(0, 0).is_err());
        assert!(validate_pagination(0, 1001).is_err());
    }

    #[test]
    fn test_validate_key_name() {
        assert!(validate_key_name("ci-runner").is_ok());
        assert!(validate_key_name("").is_err());
    }
}
