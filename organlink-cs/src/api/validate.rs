//! Registration payload validation helpers
//!
//! Shared by the four registration handlers. Field checks answer 400 with
//! a message naming the offending field.

use organlink_common::matching::Urgency;

use crate::error::ApiError;

/// Trim a required text field, rejecting empty values.
pub fn require_non_empty(field: &str, value: &str) -> Result<String, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::BadRequest(format!("{} must not be empty", field)));
    }
    Ok(trimmed.to_string())
}

/// Trim an optional text field, mapping blank to None.
pub fn optional_trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Age must fall in the range the schema accepts.
pub fn validate_age(age: Option<i64>) -> Result<Option<i64>, ApiError> {
    if let Some(age) = age {
        if !(1..130).contains(&age) {
            return Err(ApiError::BadRequest(format!(
                "age must be between 1 and 129, got {}",
                age
            )));
        }
    }
    Ok(age)
}

/// Trim list entries and drop blanks, preserving order and case.
pub fn clean_string_list(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

/// A donor must pledge at least one organ.
pub fn require_organs(values: Vec<String>) -> Result<Vec<String>, ApiError> {
    let cleaned = clean_string_list(values);
    if cleaned.is_empty() {
        return Err(ApiError::BadRequest(
            "organs must contain at least one organ".to_string(),
        ));
    }
    Ok(cleaned)
}

/// Resolve the urgency inputs to a numeric level in [1,10].
///
/// A numeric `urgency_level` wins over the categorical `urgency`; the
/// categorical form maps to its representative level. Supplying neither
/// is an error.
pub fn resolve_urgency(
    urgency_level: Option<i64>,
    urgency: Option<String>,
) -> Result<i64, ApiError> {
    if let Some(level) = urgency_level {
        if !(1..=10).contains(&level) {
            return Err(ApiError::BadRequest(format!(
                "urgency_level must be between 1 and 10, got {}",
                level
            )));
        }
        return Ok(level);
    }

    if let Some(raw) = urgency {
        let tier: Urgency = raw.parse()?;
        return Ok(tier.representative_level());
    }

    Err(ApiError::BadRequest(
        "either urgency_level (1-10) or urgency (low/medium/high/critical) is required".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_non_empty() {
        assert_eq!(require_non_empty("name", "  Meena ").unwrap(), "Meena");
        assert!(require_non_empty("name", "   ").is_err());
        assert!(require_non_empty("name", "").is_err());
    }

    #[test]
    fn test_optional_trimmed() {
        assert_eq!(
            optional_trimmed(Some(" Chennai ".to_string())).as_deref(),
            Some("Chennai")
        );
        assert_eq!(optional_trimmed(Some("  ".to_string())), None);
        assert_eq!(optional_trimmed(None), None);
    }

    #[test]
    fn test_validate_age_bounds() {
        assert_eq!(validate_age(None).unwrap(), None);
        assert_eq!(validate_age(Some(1)).unwrap(), Some(1));
        assert_eq!(validate_age(Some(129)).unwrap(), Some(129));
        assert!(validate_age(Some(0)).is_err());
        assert!(validate_age(Some(130)).is_err());
        assert!(validate_age(Some(-5)).is_err());
    }

    #[test]
    fn test_require_organs_drops_blanks() {
        let organs = require_organs(vec![
            " Kidney ".to_string(),
            "".to_string(),
            "Liver".to_string(),
        ])
        .unwrap();
        assert_eq!(organs, vec!["Kidney", "Liver"]);

        assert!(require_organs(vec!["  ".to_string()]).is_err());
        assert!(require_organs(vec![]).is_err());
    }

    #[test]
    fn test_resolve_urgency_level_wins() {
        assert_eq!(resolve_urgency(Some(7), Some("low".to_string())).unwrap(), 7);
        assert_eq!(resolve_urgency(Some(1), None).unwrap(), 1);
        assert!(resolve_urgency(Some(0), None).is_err());
        assert!(resolve_urgency(Some(11), None).is_err());
    }

    #[test]
    fn test_resolve_urgency_categorical() {
        assert_eq!(resolve_urgency(None, Some("critical".to_string())).unwrap(), 10);
        assert_eq!(resolve_urgency(None, Some("Low".to_string())).unwrap(), 2);
        assert!(resolve_urgency(None, Some("urgent".to_string())).is_err());
        assert!(resolve_urgency(None, None).is_err());
    }
}
