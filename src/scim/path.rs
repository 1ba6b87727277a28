//! SCIM attribute path parsing.
//!
//! ## Grammar
//!
//! ```text
//! path   = attribute [ "[" filter "]" ] *( "." subpath )
//! filter = filterAttr SP operator SP DQUOTE parameter DQUOTE
//! ```
//!
//! Only a single value filter is supported per path. The leading attribute is
//! matched against the configured top-level attribute names, longest first, so
//! names that themselves contain dots (URN-qualified extension attributes)
//! survive intact.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::patch::PatchError;

/// Comparison operator inside a value filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOperator {
    /// Equal
    Eq,
    /// Not equal
    Ne,
    /// Contains
    Co,
    /// Starts with
    Sw,
    /// Ends with
    Ew,
    /// Greater than
    Gt,
    /// Greater than or equal
    Ge,
    /// Less than
    Lt,
    /// Less than or equal
    Le,
}

impl FilterOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Eq => "eq",
            FilterOperator::Ne => "ne",
            FilterOperator::Co => "co",
            FilterOperator::Sw => "sw",
            FilterOperator::Ew => "ew",
            FilterOperator::Gt => "gt",
            FilterOperator::Ge => "ge",
            FilterOperator::Lt => "lt",
            FilterOperator::Le => "le",
        }
    }

    /// Apply the operator to two string values.
    ///
    /// String equality and substring tests are case-insensitive, ordering
    /// comparisons are lexicographic on the raw strings.
    pub fn evaluate(&self, actual: &str, expected: &str) -> bool {
        let actual_lower = actual.to_lowercase();
        let expected_lower = expected.to_lowercase();
        match self {
            FilterOperator::Eq => actual_lower == expected_lower,
            FilterOperator::Ne => actual_lower != expected_lower,
            FilterOperator::Co => actual_lower.contains(&expected_lower),
            FilterOperator::Sw => actual_lower.starts_with(&expected_lower),
            FilterOperator::Ew => actual_lower.ends_with(&expected_lower),
            FilterOperator::Gt => actual > expected,
            FilterOperator::Ge => actual >= expected,
            FilterOperator::Lt => actual < expected,
            FilterOperator::Le => actual <= expected,
        }
    }
}

impl FromStr for FilterOperator {
    type Err = PatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "eq" => Ok(FilterOperator::Eq),
            "ne" => Ok(FilterOperator::Ne),
            "co" => Ok(FilterOperator::Co),
            "sw" => Ok(FilterOperator::Sw),
            "ew" => Ok(FilterOperator::Ew),
            "gt" => Ok(FilterOperator::Gt),
            "ge" => Ok(FilterOperator::Ge),
            "lt" => Ok(FilterOperator::Lt),
            "le" => Ok(FilterOperator::Le),
            other => Err(PatchError::MalformedFilter(format!(
                "unknown operator '{other}'"
            ))),
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single `attribute operator "parameter"` clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathFilter {
    pub attribute: String,
    pub operator: FilterOperator,
    pub parameter: String,
}

impl fmt::Display for PathFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} \"{}\"", self.attribute, self.operator, self.parameter)
    }
}

/// A parsed SCIM attribute path.
///
/// `emails[type eq "work"].value` parses to attribute `emails`, filter
/// `type eq "work"` and rest path `["value"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathScim {
    /// Leading attribute, never empty
    pub attribute: String,
    /// Value filter selecting one element of a multi-valued attribute
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<PathFilter>,
    /// Sub-attribute names after the leading attribute, in order
    #[serde(default)]
    pub rest_path: Vec<String>,
}

impl fmt::Display for PathScim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.attribute)?;
        if let Some(ref filter) = self.filter {
            write!(f, "[{}]", filter)?;
        }
        for segment in &self.rest_path {
            write!(f, ".{}", segment)?;
        }
        Ok(())
    }
}

/// Parse a raw PATCH path against the known top-level attribute names.
///
/// # Examples
///
/// ```
/// use patchgate::scim::parse_path_scim;
///
/// let path = parse_path_scim("emails[type eq \"work\"].value", ["emails", "name"]).unwrap();
/// assert_eq!(path.attribute, "emails");
/// assert_eq!(path.rest_path, vec!["value".to_string()]);
/// ```
pub fn parse_path_scim<'a>(
    path: &str,
    attributes: impl IntoIterator<Item = &'a str>,
) -> Result<PathScim, PatchError> {
    let path = path.trim();
    if path.is_empty() {
        return Err(PatchError::UnsupportedPatchRequest(
            "path is required".to_string(),
        ));
    }

    let (unfiltered, filter) = extract_filter(path)?;

    let mut elements = split_elements(&unfiltered, attributes).into_iter();
    let attribute = elements
        .next()
        .filter(|attribute| !attribute.is_empty())
        .ok_or_else(|| {
            PatchError::UnsupportedPatchRequest(format!("path '{path}' has no attribute name"))
        })?;
    let rest_path: Vec<String> = elements.collect();

    if rest_path.iter().any(String::is_empty) {
        return Err(PatchError::UnsupportedPatchRequest(format!(
            "path '{path}' contains an empty sub-attribute"
        )));
    }

    Ok(PathScim {
        attribute,
        filter,
        rest_path,
    })
}

/// Parse the inside of a `[...]` value filter.
pub fn parse_filter(input: &str) -> Result<PathFilter, PatchError> {
    let tokens: Vec<&str> = input.split_whitespace().collect();
    let [attribute, operator, parameter] = tokens.as_slice() else {
        return Err(PatchError::MalformedFilter(format!(
            "expected 'attribute operator \"value\"', got '{input}'"
        )));
    };

    let operator = operator.parse::<FilterOperator>()?;
    let parameter = parameter
        .strip_prefix('"')
        .and_then(|p| p.strip_suffix('"'))
        .ok_or_else(|| {
            PatchError::MalformedFilter(format!(
                "filter value {parameter} must be enclosed in double quotes"
            ))
        })?;

    Ok(PathFilter {
        attribute: attribute.to_string(),
        operator,
        parameter: parameter.to_string(),
    })
}

/// Remove the first `[...]` group from `path` and parse it.
fn extract_filter(path: &str) -> Result<(String, Option<PathFilter>), PatchError> {
    let Some(open) = path.find('[') else {
        if path.contains(']') {
            return Err(PatchError::MalformedFilter(format!(
                "unbalanced ']' in path '{path}'"
            )));
        }
        return Ok((path.to_string(), None));
    };

    let close = path[open..]
        .find(']')
        .map(|offset| open + offset)
        .ok_or_else(|| PatchError::MalformedFilter(format!("unclosed '[' in path '{path}'")))?;

    let unfiltered = format!("{}{}", &path[..open], &path[close + 1..]);
    if unfiltered.contains(['[', ']']) {
        return Err(PatchError::UnsupportedPatchRequest(format!(
            "multiple value filters are not supported: '{path}'"
        )));
    }

    let filter = parse_filter(&path[open + 1..close])?;
    Ok((unfiltered, Some(filter)))
}

/// Split a filter-free path into its leading attribute and sub-attributes.
fn split_elements<'a>(path: &str, attributes: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let matched = attributes
        .into_iter()
        .filter(|attribute| !attribute.is_empty())
        .filter(|attribute| {
            path.strip_prefix(attribute).is_some_and(|rest| {
                rest.is_empty()
                    || rest.starts_with('.')
                    || (rest.starts_with(':') && attribute.starts_with("urn:"))
            })
        })
        .max_by_key(|attribute| attribute.len());

    let Some(attribute) = matched else {
        tracing::debug!(path, "No configured attribute prefixes path, splitting on '.'");
        return path.split('.').map(str::to_string).collect();
    };

    let mut elements = vec![attribute.to_string()];
    let rest = &path[attribute.len()..];
    // Skip the single separator: '.', or ':' after a URN schema name.
    if let Some(separator) = rest.chars().next() {
        elements.extend(rest[separator.len_utf8()..].split('.').map(str::to_string));
    }
    elements
}

// =============================================================================
// Tests
// =============================================================================
