//! URL construction: query encoding, origin prefixing and route parameters.
//!
//! All functions are pure and work on strings. Values are JSON values so
//! that service configurations can flow into a URL without an intermediate
//! typed representation:
//!
//! - `false` and `null` drop the parameter entirely, `true` and `""` emit the
//!   bare key.
//! - A list passed to [`append_query_param`] has each item encoded on its own
//!   and joined with literal commas.
//! - [`append_query_object`] first drops falsy list items and joins the rest
//!   with commas, then encodes the joined string as a single value.

use serde_json::Value;

use crate::error::{Error, Result};
use crate::http::Query;

/// Append one `key=value` pair to `url`.
pub fn append_query_param(url: &str, key: &str, value: &Value) -> String {
    if matches!(value, Value::Null | Value::Bool(false)) {
        return url.to_string();
    }
    let punctuation = if url.contains('?') { '&' } else { '?' };
    let mut query = urlencoding::encode(key).into_owned();
    match value {
        Value::Bool(true) => {}
        Value::String(s) if s.is_empty() => {}
        other => {
            query.push('=');
            query.push_str(&encode_value(other));
        }
    }
    format!("{url}{punctuation}{query}")
}

/// Append every entry of `query` to `url`, in map order.
pub fn append_query_object(url: &str, query: &Query) -> String {
    query.iter().fold(url.to_string(), |acc, (key, value)| {
        let flattened;
        let value = match value {
            Value::Array(items) => {
                let joined: Vec<String> = items
                    .iter()
                    .filter(|item| is_truthy(item))
                    .map(plain_string)
                    .collect();
                flattened = Value::String(joined.join(","));
                &flattened
            }
            other => other,
        };
        append_query_param(&acc, key, value)
    })
}

/// Prefix `url` with `origin` unless it is already absolute.
pub fn prepend_origin(url: &str, origin: Option<&str>) -> String {
    let origin = match origin {
        Some(origin) if !origin.is_empty() => origin,
        _ => return url.to_string(),
    };
    if url.starts_with("http") {
        return url.to_string();
    }
    let origin = origin.strip_suffix('/').unwrap_or(origin);
    let delimiter = if url.starts_with('/') { "" } else { "/" };
    format!("{origin}{delimiter}{url}")
}

/// Replace every `/:name` segment of `route` with the encoded `params[name]`.
///
/// Fails with a usage error naming the first parameter missing from
/// `params`.
pub fn interpolate_route_params(route: &str, params: &Query) -> Result<String> {
    let mut out = String::with_capacity(route.len());
    let mut rest = route;
    while let Some(pos) = rest.find("/:") {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos + 2..];
        let name_len = tail
            .bytes()
            .take_while(|b| b.is_ascii_alphanumeric())
            .count();
        if name_len == 0 {
            out.push_str("/:");
            rest = tail;
            continue;
        }
        let name = &tail[..name_len];
        let value = params
            .get(name)
            .ok_or_else(|| Error::Usage(format!("Unspecified route parameter {name}")))?;
        out.push('/');
        out.push_str(&encode_value(value));
        rest = &tail[name_len..];
    }
    out.push_str(rest);
    Ok(out)
}

fn encode_value(value: &Value) -> String {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|item| urlencoding::encode(&plain_string(item)).into_owned())
            .collect::<Vec<_>>()
            .join(","),
        other => urlencoding::encode(&plain_string(other)).into_owned(),
    }
}

/// Text form of a value as it appears in a URL.
fn plain_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(plain_string).collect::<Vec<_>>().join(","),
        other => other.to_string(),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
