//! Identifier validation
//!
//! Values are always bound, never spliced into SQL. Table and column names
//! cannot be bound, so everything the builder splices is checked here
//! first: dotted names made of letters, digits and underscores, an optional
//! trailing `*`, and `AS alias` in select lists.

/// Maximum identifier segment length accepted by both dialects
const MAX_SEGMENT_LEN: usize = 63;

fn validate_segment(identifier: &str, segment: &str) -> Result<(), String> {
    if segment.is_empty() {
        return Err(format!("identifier '{}' has an empty segment", identifier));
    }
    if segment.len() > MAX_SEGMENT_LEN {
        return Err(format!(
            "identifier '{}' is too long (max {} characters per segment)",
            identifier, MAX_SEGMENT_LEN
        ));
    }
    if let Some(c) = segment.chars().find(|c| !(c.is_ascii_alphanumeric() || *c == '_')) {
        return Err(format!("identifier '{}' contains invalid character '{}'", identifier, c));
    }
    if segment.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(format!("identifier '{}' cannot start with a number", identifier));
    }
    Ok(())
}

/// Validate a table or column name, optionally qualified (`table.column`)
pub fn validate_identifier(identifier: &str) -> Result<(), String> {
    if identifier.is_empty() {
        return Err("identifier cannot be empty".to_string());
    }
    for segment in identifier.split('.') {
        validate_segment(identifier, segment)?;
    }
    Ok(())
}

/// Validate a column reference that may also be `*` or `table.*`
pub fn validate_column(column: &str) -> Result<(), String> {
    if column == "*" {
        return Ok(());
    }
    match column.strip_suffix(".*") {
        Some(table) => validate_identifier(table),
        None => validate_identifier(column),
    }
}

/// Validate one select-list entry: a column reference with an optional alias
pub fn validate_select_expression(expression: &str) -> Result<(), String> {
    let parts: Vec<&str> = expression.split_whitespace().collect();
    match parts.as_slice() {
        [column] => validate_column(column),
        [column, keyword, alias] if keyword.eq_ignore_ascii_case("as") => {
            validate_identifier(column)?;
            validate_identifier(alias)
        }
        _ => Err(format!("select expression '{}' is not allowed", expression)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_identifiers() {
        assert!(validate_identifier("users").is_ok());
        assert!(validate_identifier("post_tag.post_id").is_ok());
        assert!(validate_column("*").is_ok());
        assert!(validate_column("tags.*").is_ok());
        assert!(validate_select_expression("email AS login").is_ok());
        assert!(validate_select_expression("users.id as user_id").is_ok());
    }

    #[test]
    fn test_invalid_identifiers() {
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("1users").is_err());
        assert!(validate_identifier("users; DROP TABLE users").is_err());
        assert!(validate_identifier("users..id").is_err());
        assert!(validate_identifier("na\"me").is_err());
        assert!(validate_column("*.users").is_err());
        assert!(validate_select_expression("id, password").is_err());
        assert!(validate_select_expression("id AS").is_err());
        assert!(validate_identifier(&"x".repeat(64)).is_err());
    }
}
