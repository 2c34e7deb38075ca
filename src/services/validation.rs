//! Row validation for the nodes worksheet.
//!
//! Validation never fails: it returns the map of problems found, and an empty
//! map means the row can be stored. All checks run on every row so a user sees
//! every problem with a row at once.

use url::Url;

use crate::database::entities::FieldErrors;
use crate::services::category_resolver::CategoryIndex;
use crate::sources::NodeRow;

pub const FIELD_NAME: &str = "name";
pub const FIELD_CONTEXT_URL: &str = "Context Url";
pub const FIELD_IMPORTANCE: &str = "Importance";
pub const FIELD_CATEGORIES: &str = "Categories";

pub const MSG_REQUIRED: &str = "This field is required.";
pub const MSG_INVALID_URL: &str = "Enter a valid URL.";
pub const MSG_INVALID_INTEGER: &str = "Enter a whole number.";

const URL_SCHEMES: [&str; 4] = ["http", "https", "ftp", "ftps"];

/// Inclusive importance bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportanceRange {
    pub min: i64,
    pub max: i64,
}

impl Default for ImportanceRange {
    fn default() -> Self {
        Self { min: 1, max: 30 }
    }
}

impl ImportanceRange {
    pub fn contains(&self, value: i64) -> bool {
        self.min <= value && value <= self.max
    }
}

pub fn min_value_message(limit: i64) -> String {
    format!("Ensure this value is greater than or equal to {limit}.")
}

pub fn max_value_message(limit: i64) -> String {
    format!("Ensure this value is less than or equal to {limit}.")
}

pub fn invalid_choice_message(value: &str) -> String {
    format!("Select a valid choice. {value} is not one of the available choices.")
}

/// Category names listed in a row's categories cell, in listed order.
/// Only the ends of each name are trimmed, so `Hard Rock` stays one name.
pub fn list_categories(row: &NodeRow) -> Vec<String> {
    row.categories
        .as_deref()
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Parsed importance of a row that passed validation
pub fn parse_importance(raw: Option<&str>) -> Option<i64> {
    raw.map(str::trim).and_then(|value| value.parse().ok())
}

pub fn is_valid_url(raw: &str) -> bool {
    match Url::parse(raw.trim()) {
        Ok(url) => {
            URL_SCHEMES.contains(&url.scheme())
                && url.host_str().is_some_and(|host| !host.is_empty())
        }
        Err(_) => false,
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.map(str::trim).map_or(true, str::is_empty)
}

pub fn validate_node(
    row: &NodeRow,
    categories: &CategoryIndex,
    importance: ImportanceRange,
) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if is_blank(row.name.as_deref()) {
        errors.insert(FIELD_NAME.to_string(), vec![MSG_REQUIRED.to_string()]);
    }

    if let Some(url) = row.context_url.as_deref().filter(|url| !url.trim().is_empty()) {
        if !is_valid_url(url) {
            errors.insert(FIELD_CONTEXT_URL.to_string(), vec![MSG_INVALID_URL.to_string()]);
        }
    }

    match row.importance.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        None => {
            errors.insert(FIELD_IMPORTANCE.to_string(), vec![MSG_REQUIRED.to_string()]);
        }
        Some(raw) => match raw.parse::<i64>() {
            Err(_) => {
                errors.insert(
                    FIELD_IMPORTANCE.to_string(),
                    vec![MSG_INVALID_INTEGER.to_string()],
                );
            }
            Ok(value) if !importance.contains(value) => {
                errors.insert(
                    FIELD_IMPORTANCE.to_string(),
                    vec![
                        min_value_message(importance.min),
                        max_value_message(importance.max),
                    ],
                );
            }
            Ok(_) => {}
        },
    }

    let listed = list_categories(row);
    if listed.is_empty() {
        errors.insert(FIELD_CATEGORIES.to_string(), vec![MSG_REQUIRED.to_string()]);
    } else {
        let unknown: Vec<String> = listed
            .iter()
            .filter(|name| !categories.contains(name))
            .map(|name| invalid_choice_message(name))
            .collect();
        if !unknown.is_empty() {
            errors.insert(FIELD_CATEGORIES.to_string(), unknown);
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn categories() -> CategoryIndex {
        let mut index = CategoryIndex::default();
        index.insert("Metal".to_string(), 1);
        index.insert("Punk".to_string(), 2);
        index
    }

    fn row(name: &str, categories: &str, importance: &str) -> NodeRow {
        NodeRow {
            name: Some(name.to_string()).filter(|v| !v.is_empty()),
            categories: Some(categories.to_string()).filter(|v| !v.is_empty()),
            importance: Some(importance.to_string()).filter(|v| !v.is_empty()),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_row() {
        let errors = validate_node(
            &row("Bruce Dickinson", "Metal", "5"),
            &categories(),
            ImportanceRange::default(),
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn test_missing_name() {
        for name in [None, Some(""), Some("   ")] {
            let mut node = row("x", "Metal", "5");
            node.name = name.map(str::to_string);
            let errors = validate_node(&node, &categories(), ImportanceRange::default());
            assert_eq!(errors.get(FIELD_NAME), Some(&vec![MSG_REQUIRED.to_string()]));
            assert_eq!(errors.len(), 1);
        }
    }

    #[test]
    fn test_importance_bounds() {
        let range = ImportanceRange::default();
        for value in ["1", "15", "30"] {
            let errors = validate_node(&row("n", "Metal", value), &categories(), range);
            assert!(!errors.contains_key(FIELD_IMPORTANCE), "{value} should be accepted");
        }
        for value in ["0", "31", "-100", "999999"] {
            let errors = validate_node(&row("n", "Metal", value), &categories(), range);
            assert_eq!(
                errors.get(FIELD_IMPORTANCE),
                Some(&vec![
                    "Ensure this value is greater than or equal to 1.".to_string(),
                    "Ensure this value is less than or equal to 30.".to_string(),
                ]),
                "{value} should be rejected"
            );
        }
    }

    #[test]
    fn test_importance_required_and_integer() {
        let range = ImportanceRange::default();
        let errors = validate_node(&row("n", "Metal", ""), &categories(), range);
        assert_eq!(errors[FIELD_IMPORTANCE], vec![MSG_REQUIRED.to_string()]);

        let errors = validate_node(&row("n", "Metal", "5.5"), &categories(), range);
        assert_eq!(errors[FIELD_IMPORTANCE], vec![MSG_INVALID_INTEGER.to_string()]);
    }

    #[test]
    fn test_configured_range() {
        let range = ImportanceRange { min: 10, max: 20 };
        let errors = validate_node(&row("n", "Metal", "5"), &categories(), range);
        assert_eq!(
            errors[FIELD_IMPORTANCE][0],
            "Ensure this value is greater than or equal to 10."
        );
    }

    #[test]
    fn test_categories() {
        let range = ImportanceRange::default();
        let errors = validate_node(&row("n", "Metal, Punk", "5"), &categories(), range);
        assert!(!errors.contains_key(FIELD_CATEGORIES));

        let errors = validate_node(&row("n", "Metal, Jazz, Noise", "5"), &categories(), range);
        assert_eq!(
            errors[FIELD_CATEGORIES],
            vec![
                invalid_choice_message("Jazz"),
                invalid_choice_message("Noise"),
            ]
        );

        let errors = validate_node(&row("n", " , ", "5"), &categories(), range);
        assert_eq!(errors[FIELD_CATEGORIES], vec![MSG_REQUIRED.to_string()]);
    }

    #[test]
    fn test_context_url() {
        let range = ImportanceRange::default();
        let mut node = row("n", "Metal", "5");
        node.context_url = Some("not a url".to_string());
        let errors = validate_node(&node, &categories(), range);
        assert_eq!(errors[FIELD_CONTEXT_URL], vec![MSG_INVALID_URL.to_string()]);

        node.context_url = Some("https://www.youtube.com/watch?v=abc".to_string());
        assert!(validate_node(&node, &categories(), range).is_empty());

        node.context_url = Some("mailto:someone@example.com".to_string());
        assert!(validate_node(&node, &categories(), range).contains_key(FIELD_CONTEXT_URL));
    }

    #[test]
    fn test_all_checks_run_in_order() {
        let node = NodeRow {
            context_url: Some("nope".to_string()),
            importance: Some("-100".to_string()),
            categories: Some("noise".to_string()),
            ..Default::default()
        };
        let errors = validate_node(&node, &categories(), ImportanceRange::default());
        let keys: Vec<&str> = errors.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec![FIELD_NAME, FIELD_CONTEXT_URL, FIELD_IMPORTANCE, FIELD_CATEGORIES]
        );
    }

    #[test]
    fn test_list_categories() {
        let node = row("n", " Metal ,Punk,, ", "1");
        assert_eq!(list_categories(&node), vec!["Metal", "Punk"]);
        let node = row("n", "Hard Rock, Punk", "1");
        assert_eq!(list_categories(&node), vec!["Hard Rock", "Punk"]);
        assert_eq!(parse_importance(Some(" 7 ")), Some(7));
        assert_eq!(parse_importance(None), None);
    }
}
