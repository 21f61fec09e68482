//! Flattens the response shapes the Tally gateway emits into a list of records.
//!
//! Depending on gateway version and endpoint a list arrives as:
//!
//! - a bare array: `[{..}, {..}]`
//! - wrapped: `{"data": [..]}`, `{"companies": [..]}`, `{"ledgers": [..]}`
//! - converted from Tally XML: `{"ENVELOPE": {"BODY": {"DATA": {"COLLECTION": {"LEDGER": ..}}}}}`
//!
//! XML conversion yields a single object instead of a one-element array when
//! there is exactly one record, and an empty string or null when there are
//! none. All of these come out as a `Vec`.

use serde_json::Value;

/// Which collection a response holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Companies,
    Ledgers,
    Sales,
}

impl Collection {
    /// Element name inside `COLLECTION` in XML-derived payloads.
    pub fn xml_tag(&self) -> &'static str {
        match self {
            Collection::Companies => "COMPANY",
            Collection::Ledgers => "LEDGER",
            Collection::Sales => "VOUCHER",
        }
    }

    /// Wrapper keys used by the JSON gateway.
    fn wrapper_keys(&self) -> &'static [&'static str] {
        match self {
            Collection::Companies => &["data", "companies"],
            Collection::Ledgers => &["data", "ledgers"],
            Collection::Sales => &["data", "sales", "vouchers"],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Companies => "companies",
            Collection::Ledgers => "ledgers",
            Collection::Sales => "sales",
        }
    }
}

/// Case-insensitive object lookup; XML converters disagree on case.
fn get_ci<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    let map = value.as_object()?;
    map.get(key).or_else(|| {
        map.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    })
}

fn one_or_many(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items.into_iter().filter(|v| !v.is_null()).collect(),
        Value::Object(_) => vec![value],
        _ => Vec::new(),
    }
}

fn take_path(mut value: Value, path: &[&str]) -> Option<Value> {
    for key in path {
        let next = get_ci(&value, key)?.clone();
        value = next;
    }
    Some(value)
}

pub fn normalize(value: Value, collection: Collection) -> Vec<Value> {
    match value {
        Value::Array(_) => one_or_many(value),
        Value::Object(_) => {
            if get_ci(&value, "ENVELOPE").is_some() {
                let path = ["ENVELOPE", "BODY", "DATA", "COLLECTION", collection.xml_tag()];
                return take_path(value, &path).map(one_or_many).unwrap_or_default();
            }

            for key in collection.wrapper_keys() {
                if let Some(inner) = get_ci(&value, key) {
                    return normalize(inner.clone(), collection);
                }
            }

            Vec::new()
        }
        _ => Vec::new(),
    }
}
