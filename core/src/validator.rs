//! Declarative shape validation for service configurations.
//!
//! # Design
//! A [`Validator`] checks one JSON value and either accepts it or returns a
//! [`Failure`]: the path to the offending value plus what was wrong with it.
//! Validators compose (`required`, `one_of`, `array_of`, `shape`, ...) and
//! failures bubble up by prefixing path segments, so the rendered message
//! always names the dotted path to the culprit.
//!
//! A value that is absent or `null` passes every validator that is not
//! wrapped in [`required`]. Shape validation reports a single failing field
//! on its own and enumerates fields only when two or more fail.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

const DEFAULT_ERROR_PATH: &str = "value";
const NEWLINE_INDENT: &str = "\n  ";

/// Rendered validation failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// One step of the path to a failing value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Key(String),
    Index(usize),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(key) => f.write_str(key),
            Segment::Index(index) => write!(f, "{index}"),
        }
    }
}

/// What went wrong at the end of a failure path.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The value is not what was expected; holds a noun phrase such as
    /// `"string"` or `"\"car\" or \"bike\""`.
    Expected(String),
    /// A required value is absent or null.
    Required,
    /// Two or more fields of one object failed.
    InvalidProperties(Vec<Failure>),
    /// A strict shape saw keys it does not declare.
    InvalidKeys(Vec<String>),
}

/// A failed check, with the path relative to the validator that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    path: Vec<Segment>,
    outcome: Outcome,
}

impl Failure {
    pub fn new(outcome: Outcome) -> Self {
        Self {
            path: Vec::new(),
            outcome,
        }
    }

    pub fn expected(noun_phrase: impl Into<String>) -> Self {
        Self::new(Outcome::Expected(noun_phrase.into()))
    }

    pub fn path(&self) -> &[Segment] {
        &self.path
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    fn at(mut self, segment: Segment) -> Self {
        self.path.insert(0, segment);
        self
    }

    fn is_simple(&self) -> bool {
        self.path.is_empty() && matches!(self.outcome, Outcome::Expected(_))
    }

    /// Human-readable message for this failure.
    pub fn message(&self) -> String {
        let path = if self.path.is_empty() {
            vec![Segment::Key(DEFAULT_ERROR_PATH.to_string())]
        } else {
            self.path.clone()
        };

        match &self.outcome {
            Outcome::Expected(noun_phrase) => {
                format_error_message(&path, &format!("must be {}.", add_article(noun_phrase)))
            }
            Outcome::Required => {
                let reason = if is_array_culprit(&path) {
                    "cannot be undefined/null."
                } else {
                    "is required."
                };
                format_error_message(&path, reason)
            }
            Outcome::InvalidKeys(keys) => {
                format!("The following keys are invalid: {}", keys.join(", "))
            }
            Outcome::InvalidProperties(failures) => {
                let lines: Vec<String> = failures
                    .iter()
                    .map(|failure| {
                        let key = failure
                            .path
                            .first()
                            .map(ToString::to_string)
                            .unwrap_or_default();
                        let rendered = failure.message().split('\n').collect::<Vec<_>>().join(NEWLINE_INDENT);
                        format!("- {key}: {rendered}")
                    })
                    .collect();
                let object_id = join_path(&path);
                let of_phrase = if object_id == DEFAULT_ERROR_PATH {
                    String::new()
                } else {
                    format!(" of {object_id}")
                };
                format!(
                    "The following properties{of_phrase} have invalid values:{NEWLINE_INDENT}{}",
                    lines.join(NEWLINE_INDENT)
                )
            }
        }
    }
}

type Check = dyn Fn(&Value) -> Option<Failure> + Send + Sync;

/// A composable check over one JSON value.
#[derive(Clone)]
pub struct Validator {
    check: Arc<Check>,
    required: bool,
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field("required", &self.required)
            .finish_non_exhaustive()
    }
}

impl Validator {
    /// Wrap a custom check. Absent and null values never reach it unless the
    /// validator is made [`required`].
    pub fn new<F>(check: F) -> Self
    where
        F: Fn(&Value) -> Option<Failure> + Send + Sync + 'static,
    {
        Self {
            check: Arc::new(check),
            required: false,
        }
    }

    /// Check `value`; `None` stands for an absent field.
    pub fn validate(&self, value: Option<&Value>) -> Option<Failure> {
        match value {
            None | Some(Value::Null) if self.required => Some(Failure::new(Outcome::Required)),
            None | Some(Value::Null) => None,
            Some(value) => (self.check)(value),
        }
    }
}

/// Ordered field declarations for [`shape`] and [`strict_shape`].
#[derive(Debug, Clone, Default)]
pub struct Shape {
    fields: Vec<(String, Validator)>,
}

impl Shape {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>, validator: Validator) -> Self {
        self.fields.push((name.into(), validator));
        self
    }

    fn declares(&self, key: &str) -> bool {
        self.fields.iter().any(|(name, _)| name == key)
    }
}

// ---------------------------------------------------------------------------
// Runners
// ---------------------------------------------------------------------------

/// Turn a root validator into an assertion. `api_name`, when given, prefixes
/// every message.
pub fn assert_with(
    validator: Validator,
    api_name: Option<&str>,
) -> impl Fn(&Value) -> Result<(), ValidationError> {
    let api_name = api_name.map(str::to_string);
    move |value: &Value| match validator.validate(Some(value)) {
        None => Ok(()),
        Some(failure) => {
            let message = failure.message();
            let message = match &api_name {
                Some(name) => format!("{name}: {message}"),
                None => message,
            };
            Err(ValidationError { message })
        }
    }
}

/// Strict shape assertion: every declared field is checked and any key the
/// shape does not declare is rejected.
pub fn assert_shape(shape: Shape) -> impl Fn(&Value) -> Result<(), ValidationError> {
    assert_with(strict_shape(shape), None)
}

// ---------------------------------------------------------------------------
// Higher-order validators
// ---------------------------------------------------------------------------

/// Fail with "is required." when the value is absent or null.
pub fn required(validator: Validator) -> Validator {
    Validator {
        required: true,
        ..validator
    }
}

/// Check each declared field of an object.
pub fn shape(shape: Shape) -> Validator {
    let object = plain_object();
    Validator::new(move |value| {
        if let Some(failure) = object.validate(Some(value)) {
            return Some(failure);
        }
        let mut failures: Vec<Failure> = shape
            .fields
            .iter()
            .filter_map(|(name, validator)| {
                validator
                    .validate(value.get(name))
                    .map(|failure| failure.at(Segment::Key(name.clone())))
            })
            .collect();
        if failures.len() < 2 {
            return failures.pop();
        }
        Some(Failure::new(Outcome::InvalidProperties(failures)))
    })
}

/// [`shape`], then reject keys the shape does not declare.
pub fn strict_shape(declared: Shape) -> Validator {
    let fields = shape(declared.clone());
    Validator::new(move |value| {
        if let Some(failure) = fields.validate(Some(value)) {
            return Some(failure);
        }
        let invalid: Vec<String> = value
            .as_object()
            .map(|object| {
                object
                    .keys()
                    .filter(|key| !declared.declares(key))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        if invalid.is_empty() {
            None
        } else {
            Some(Failure::new(Outcome::InvalidKeys(invalid)))
        }
    })
}

/// Every item of an array must pass `validator`. Stops at the first bad item.
pub fn array_of(validator: Validator) -> Validator {
    array_validator(Items::Each(validator))
}

/// A fixed-length array whose items pass the positional validators.
pub fn tuple(validators: Vec<Validator>) -> Validator {
    array_validator(Items::Positional(validators))
}

enum Items {
    Each(Validator),
    Positional(Vec<Validator>),
}

impl Items {
    fn get(&self, index: usize) -> Option<&Validator> {
        match self {
            Items::Each(validator) => Some(validator),
            Items::Positional(validators) => validators.get(index),
        }
    }
}

fn array_validator(items: Items) -> Validator {
    let array = plain_array();
    Validator::new(move |value| {
        if let Some(failure) = array.validate(Some(value)) {
            return Some(failure);
        }
        let values = value.as_array()?;
        if let Items::Positional(validators) = &items {
            if values.len() != validators.len() {
                return Some(Failure::expected(format!(
                    "an array with {} items",
                    validators.len()
                )));
            }
        }
        values.iter().enumerate().find_map(|(index, item)| {
            items
                .get(index)?
                .validate(Some(item))
                .map(|failure| failure.at(Segment::Index(index)))
        })
    })
}

/// Pass when at least one alternative passes.
pub fn one_of_type(validators: Vec<Validator>) -> Validator {
    Validator::new(move |value| {
        if validators.is_empty() {
            return None;
        }
        let failures: Vec<Failure> = validators
            .iter()
            .filter_map(|validator| validator.validate(Some(value)))
            .collect();
        if failures.len() != validators.len() {
            return None;
        }
        if failures.iter().all(Failure::is_simple) {
            let alternatives: Vec<String> = failures
                .iter()
                .filter_map(|failure| match &failure.outcome {
                    Outcome::Expected(noun_phrase) => Some(noun_phrase.clone()),
                    _ => None,
                })
                .collect();
            return Some(Failure::expected(or_list(&alternatives)));
        }
        failures
            .into_iter()
            .fold(None, |longest: Option<Failure>, failure| match longest {
                Some(current) if current.path.len() >= failure.path.len() => Some(current),
                _ => Some(failure),
            })
    })
}

/// The value must equal one of `values`.
pub fn one_of<I, V>(values: I) -> Validator
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    one_of_type(values.into_iter().map(|value| equal(value.into())).collect())
}

// ---------------------------------------------------------------------------
// Meta validators
// ---------------------------------------------------------------------------

/// The value must equal `expected`.
pub fn equal(expected: Value) -> Validator {
    Validator::new(move |value| (value != &expected).then(|| Failure::expected(expected.to_string())))
}

/// A number within `min..=max`.
pub fn range(min: f64, max: f64) -> Validator {
    Validator::new(move |value| {
        let in_range = value.as_f64().is_some_and(|n| n >= min && n <= max);
        (!in_range).then(|| {
            Failure::expected(format!(
                "number between {} & {} (inclusive)",
                format_number(min),
                format_number(max)
            ))
        })
    })
}

// ---------------------------------------------------------------------------
// Primitive validators
// ---------------------------------------------------------------------------

pub fn any() -> Validator {
    Validator::new(|_| None)
}

pub fn boolean() -> Validator {
    primitive("boolean", Value::is_boolean)
}

pub fn number() -> Validator {
    primitive("number", Value::is_number)
}

pub fn string() -> Validator {
    primitive("string", Value::is_string)
}

pub fn plain_array() -> Validator {
    primitive("array", Value::is_array)
}

pub fn plain_object() -> Validator {
    primitive("object", Value::is_object)
}

/// A path to a file on disk.
pub fn file() -> Validator {
    primitive("Filename", Value::is_string)
}

/// An epoch timestamp in milliseconds or a parseable date string.
pub fn date() -> Validator {
    primitive("date", |value| match value {
        Value::Number(_) => true,
        Value::String(s) => parses_as_date(s),
        _ => false,
    })
}

/// A `[longitude, latitude]`-style pair of numbers.
pub fn coordinates() -> Validator {
    tuple(vec![number(), number()])
}

fn primitive(noun_phrase: &'static str, accepts: fn(&Value) -> bool) -> Validator {
    Validator::new(move |value| (!accepts(value)).then(|| Failure::expected(noun_phrase)))
}

fn parses_as_date(s: &str) -> bool {
    DateTime::parse_from_rfc3339(s).is_ok()
        || DateTime::parse_from_rfc2822(s).is_ok()
        || NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").is_ok()
        || NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

// ---------------------------------------------------------------------------
// Message helpers
// ---------------------------------------------------------------------------

fn or_list(list: &[String]) -> String {
    match list {
        [] => String::new(),
        [only] => only.clone(),
        [first, second] => format!("{first} or {second}"),
        [init @ .., last] => format!("{}, or {last}", init.join(", ")),
    }
}

fn add_article(noun_phrase: &str) -> String {
    if noun_phrase.starts_with("a ") || noun_phrase.starts_with("an ") {
        return noun_phrase.to_string();
    }
    match noun_phrase.chars().next() {
        Some(c) if "aeiouAEIOU".contains(c) => format!("an {noun_phrase}"),
        Some(c) if c.is_ascii_alphabetic() => format!("a {noun_phrase}"),
        _ => noun_phrase.to_string(),
    }
}

fn format_error_message(path: &[Segment], pretty_result: &str) -> String {
    let prefix = if is_array_culprit(path) {
        "Item at position "
    } else {
        ""
    };
    format!("{prefix}{} {pretty_result}", join_path(path))
}

fn is_array_culprit(path: &[Segment]) -> bool {
    matches!(path.last(), Some(Segment::Index(_))) || matches!(path.first(), Some(Segment::Index(_)))
}

fn join_path(path: &[Segment]) -> String {
    path.iter().map(ToString::to_string).collect::<Vec<_>>().join(".")
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}
