//! Descriptor resolution from request query parameters.
//!
//! A descriptor identifies the logical source of a touch: a `(name, type)`
//! pair. Two parameter shapes are recognized, evaluated once per request:
//!
//! 1. `campaign=<type>_<name>`: the combined form. Without an underscore
//!    the whole value is the name and the type is empty. A `campaign`
//!    parameter that is present but invalid claims the request and yields
//!    no descriptor; the UTM parameters are not consulted as a fallback.
//! 2. `utm_campaign=<name>&utm_source=<type>[&utm_medium=<medium>]`: the
//!    UTM form. The medium, when present, is concatenated onto the
//!    source as `source_medium`.
//!
//! No descriptor means the request carries no campaign signal; the cycle
//! performs no store mutation and writes no cookie.

use std::borrow::Cow;

use url::form_urlencoded;

use crate::constants::{
    DESCRIPTOR_SEPARATOR, PARAM_CAMPAIGN, PARAM_UTM_CAMPAIGN, PARAM_UTM_MEDIUM, PARAM_UTM_SOURCE,
};

/// The `(name, type)` pair identifying a campaign touch's logical source.
/// Both parts are non-empty by construction except `kind`, which may be
/// empty for bare `campaign=<name>` links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    /// Campaign name.
    pub name: String,
    /// Campaign type.
    pub kind: String,
}

impl Descriptor {
    /// Create a descriptor. Returns `None` when the name is empty, which
    /// is never a valid touch key.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Option<Self> {
        let name = name.into();
        if name.is_empty() {
            return None;
        }
        Some(Self {
            name,
            kind: kind.into(),
        })
    }
}

/// Resolve a descriptor from a raw (percent-encoded) query string.
///
/// Returns `None` when no campaign signal is present; this is the normal
/// case for most requests, not an error.
#[must_use]
pub fn resolve_query(query: &str) -> Option<Descriptor> {
    let pairs: Vec<(Cow<'_, str>, Cow<'_, str>)> =
        form_urlencoded::parse(query.as_bytes()).collect();
    resolve_params(pairs.iter().map(|(k, v)| (k.as_ref(), v.as_ref())))
}

/// Resolve a descriptor from already-decoded query parameters.
///
/// First occurrence wins for each recognized parameter name.
pub fn resolve_params<'a>(
    params: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> Option<Descriptor> {
    let mut campaign = None;
    let mut utm_campaign = None;
    let mut utm_source = None;
    let mut utm_medium = None;

    for (key, value) in params {
        let slot = match key {
            PARAM_CAMPAIGN => &mut campaign,
            PARAM_UTM_CAMPAIGN => &mut utm_campaign,
            PARAM_UTM_SOURCE => &mut utm_source,
            PARAM_UTM_MEDIUM => &mut utm_medium,
            _ => continue,
        };
        if slot.is_none() {
            *slot = Some(value);
        }
    }

    if let Some(value) = campaign {
        return resolve_combined(value);
    }

    if let (Some(name), Some(source)) = (utm_campaign, utm_source)
        && !name.is_empty()
        && !source.is_empty()
    {
        let kind = match utm_medium.filter(|m| !m.is_empty()) {
            Some(medium) => format!("{source}{DESCRIPTOR_SEPARATOR}{medium}"),
            None => source.to_string(),
        };
        return Descriptor::new(name, kind);
    }

    None
}

/// Resolve the combined `campaign=<type>_<name>` form. Split once, type
/// first; an empty side after splitting invalidates the parameter.
fn resolve_combined(value: &str) -> Option<Descriptor> {
    match value.split_once(DESCRIPTOR_SEPARATOR) {
        Some((kind, name)) => {
            if kind.is_empty() || name.is_empty() {
                return None;
            }
            Descriptor::new(name, kind)
        }
        None => Descriptor::new(value, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combined_type_and_name() {
        let d = resolve_query("campaign=visit_spring-sale").expect("should resolve");
        assert_eq!(d.name, "spring-sale");
        assert_eq!(d.kind, "visit");
    }

    #[test]
    fn test_combined_splits_once() {
        // Only the first underscore separates; the rest stays in the name.
        let d = resolve_query("campaign=visit_spring_sale").expect("should resolve");
        assert_eq!(d.name, "spring_sale");
        assert_eq!(d.kind, "visit");
    }

    #[test]
    fn test_combined_without_underscore_is_bare_name() {
        let d = resolve_query("campaign=testname").expect("should resolve");
        assert_eq!(d.name, "testname");
        assert_eq!(d.kind, "");
    }

    #[test]
    fn test_combined_missing_name_rejected() {
        assert_eq!(resolve_query("campaign=visit_"), None);
    }

    #[test]
    fn test_combined_missing_type_rejected() {
        assert_eq!(resolve_query("campaign=_testname"), None);
    }

    #[test]
    fn test_combined_empty_value_rejected() {
        assert_eq!(resolve_query("campaign="), None);
    }

    #[test]
    fn test_invalid_combined_does_not_fall_back_to_utm() {
        assert_eq!(
            resolve_query("campaign=visit_&utm_campaign=testname&utm_source=visit"),
            None
        );
    }

    #[test]
    fn test_utm_name_and_source() {
        let d = resolve_query("utm_campaign=testname&utm_source=visit").expect("should resolve");
        assert_eq!(d.name, "testname");
        assert_eq!(d.kind, "visit");
    }

    #[test]
    fn test_utm_medium_concatenated() {
        let d = resolve_query("utm_campaign=testname&utm_source=visit&utm_medium=video")
            .expect("should resolve");
        assert_eq!(d.name, "testname");
        assert_eq!(d.kind, "visit_video");
    }

    #[test]
    fn test_utm_empty_medium_ignored() {
        let d = resolve_query("utm_campaign=testname&utm_source=visit&utm_medium=")
            .expect("should resolve");
        assert_eq!(d.kind, "visit");
    }

    #[test]
    fn test_utm_requires_both_name_and_source() {
        assert_eq!(resolve_query("utm_campaign=testname"), None);
        assert_eq!(resolve_query("utm_source=visit"), None);
        assert_eq!(resolve_query("utm_campaign=&utm_source=visit"), None);
    }

    #[test]
    fn test_no_recognized_params() {
        assert_eq!(resolve_query(""), None);
        assert_eq!(resolve_query("page=2&sort=asc"), None);
    }

    #[test]
    fn test_combined_takes_precedence_over_utm() {
        let d = resolve_query("utm_campaign=other&utm_source=email&campaign=visit_primary")
            .expect("should resolve");
        assert_eq!(d.name, "primary");
        assert_eq!(d.kind, "visit");
    }

    #[test]
    fn test_percent_encoded_values() {
        let d = resolve_query("utm_campaign=schedule&utm_source=random_page&utm_medium=Arbitrary%20Whitespace%20Cookie")
            .expect("should resolve");
        assert_eq!(d.name, "schedule");
        assert_eq!(d.kind, "random_page_Arbitrary Whitespace Cookie");
    }

    #[test]
    fn test_first_occurrence_wins() {
        let d = resolve_query("campaign=visit_first&campaign=visit_second").expect("should resolve");
        assert_eq!(d.name, "first");
    }

    #[test]
    fn test_resolve_params_direct() {
        let d = resolve_params([("campaign", "visit_spring")]).expect("should resolve");
        assert_eq!(d.name, "spring");
        assert_eq!(d.kind, "visit");
    }
}
