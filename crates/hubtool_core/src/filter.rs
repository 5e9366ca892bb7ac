use anyhow::{Context, Result};
use regex::Regex;

use crate::model::ContentItem;
use crate::target::RemovalTarget;

/// A `--name` or `--contentType` value: `/.../` is a regular expression,
/// anything else must match exactly.
#[derive(Debug, Clone)]
pub enum Pattern {
    Literal(String),
    Regex(Regex),
}

impl Pattern {
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.len() >= 2 && raw.starts_with('/') && raw.ends_with('/') {
            let source = &raw[1..raw.len() - 1];
            let regex = Regex::new(source)
                .with_context(|| format!("invalid regular expression in pattern {raw}"))?;
            return Ok(Self::Regex(regex));
        }
        Ok(Self::Literal(raw.to_string()))
    }

    pub fn matches(&self, value: &str) -> bool {
        match self {
            Self::Literal(literal) => literal == value,
            Self::Regex(regex) => regex.is_match(value),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ItemFilter {
    pub names: Vec<String>,
    pub content_types: Vec<String>,
}

impl ItemFilter {
    pub fn is_empty(&self) -> bool {
        self.names.is_empty() && self.content_types.is_empty()
    }
}

/// Keep items that carry the target field and match the name patterns, or,
/// when no name pattern is given, the content-type patterns.
pub fn filter_items(
    items: Vec<ContentItem>,
    target: RemovalTarget,
    filter: &ItemFilter,
) -> Result<Vec<ContentItem>> {
    let with_field = items
        .into_iter()
        .filter(|item| target.carries_field(item));

    if !filter.names.is_empty() {
        let patterns = parse_patterns(&filter.names)?;
        return Ok(with_field
            .filter(|item| any_match(&patterns, &item.label))
            .collect());
    }

    if !filter.content_types.is_empty() {
        let patterns = parse_patterns(&filter.content_types)?;
        return Ok(with_field
            .filter(|item| any_match(&patterns, item.schema()))
            .collect());
    }

    Ok(with_field.collect())
}

fn parse_patterns(raw: &[String]) -> Result<Vec<Pattern>> {
    raw.iter().map(|value| Pattern::parse(value)).collect()
}

fn any_match(patterns: &[Pattern], value: &str) -> bool {
    patterns.iter().any(|pattern| pattern.matches(value))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{ItemFilter, Pattern, filter_items};
    use crate::model::ContentItem;
    use crate::target::RemovalTarget;

    fn keyed(id: &str, label: &str, schema: &str, key: Option<&str>) -> ContentItem {
        serde_json::from_value(json!({
            "id": id,
            "label": label,
            "status": "ARCHIVED",
            "version": 1,
            "body": { "_meta": { "schema": schema, "deliveryKey": key } }
        }))
        .expect("decode item")
    }

    fn ids(items: &[ContentItem]) -> Vec<&str> {
        items.iter().map(|item| item.id.as_str()).collect()
    }

    fn sample() -> Vec<ContentItem> {
        vec![
            keyed("1", "header-main", "https://s/banner.json", Some("k1")),
            keyed("2", "header", "https://s/text.json", Some("k2")),
            keyed("3", "footer", "https://s/banner.json", Some("k3")),
            keyed("4", "header-nokey", "https://s/banner.json", None),
        ]
    }

    #[test]
    fn literal_pattern_requires_exact_match() {
        let pattern = Pattern::parse("header").expect("parse");
        assert!(pattern.matches("header"));
        assert!(!pattern.matches("header-main"));
        assert!(!pattern.matches("Header"));
    }

    #[test]
    fn slash_delimited_pattern_is_a_regex() {
        let pattern = Pattern::parse("/^header/").expect("parse");
        assert!(pattern.matches("header-main"));
        assert!(!pattern.matches("main-header"));
        assert!(matches!(Pattern::parse("/").expect("parse"), Pattern::Literal(_)));
    }

    #[test]
    fn invalid_regex_is_an_error() {
        let error = Pattern::parse("/([a-z/").expect_err("must fail");
        assert!(error.to_string().contains("invalid regular expression"));
    }

    #[test]
    fn items_without_the_field_never_survive() {
        let selected =
            filter_items(sample(), RemovalTarget::DeliveryKey, &ItemFilter::default())
                .expect("filter");
        assert_eq!(ids(&selected), vec!["1", "2", "3"]);

        let by_name = filter_items(
            sample(),
            RemovalTarget::DeliveryKey,
            &ItemFilter {
                names: vec!["/header/".to_string()],
                content_types: Vec::new(),
            },
        )
        .expect("filter");
        assert_eq!(ids(&by_name), vec!["1", "2"]);
    }

    #[test]
    fn repeated_names_are_ored() {
        let selected = filter_items(
            sample(),
            RemovalTarget::DeliveryKey,
            &ItemFilter {
                names: vec!["footer".to_string(), "header".to_string()],
                content_types: Vec::new(),
            },
        )
        .expect("filter");
        assert_eq!(ids(&selected), vec!["2", "3"]);
    }

    #[test]
    fn content_type_filter_matches_schema() {
        let selected = filter_items(
            sample(),
            RemovalTarget::DeliveryKey,
            &ItemFilter {
                names: Vec::new(),
                content_types: vec!["/banner\\.json$/".to_string()],
            },
        )
        .expect("filter");
        assert_eq!(ids(&selected), vec!["1", "3"]);
    }

    #[test]
    fn name_filter_takes_precedence_over_content_type() {
        let name_only = ItemFilter {
            names: vec!["header".to_string()],
            content_types: Vec::new(),
        };
        let both = ItemFilter {
            names: vec!["header".to_string()],
            content_types: vec!["https://s/banner.json".to_string()],
        };

        let expected =
            filter_items(sample(), RemovalTarget::DeliveryKey, &name_only).expect("filter");
        let actual = filter_items(sample(), RemovalTarget::DeliveryKey, &both).expect("filter");
        assert_eq!(ids(&actual), ids(&expected));
        assert_eq!(ids(&actual), vec!["2"]);
    }
}
