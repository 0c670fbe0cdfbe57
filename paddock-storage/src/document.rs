//! Loosely-typed store documents and lenient field decoders.
//!
//! A [`Document`] is the record shape the durable store speaks. It never
//! leaves the store boundary: the mapper turns it into typed entities
//! immediately. Every decoder here is total. A missing, null or
//! mistyped field yields the zero value of the target type.

use serde_json::{Map, Value};

/// A loosely-typed store record.
pub type Document = Map<String, Value>;

/// Top-level field equality filter. An empty filter matches everything.
pub type Filter = Document;

/// One insert-or-replace instruction, targeted by natural key.
#[derive(Debug, Clone, PartialEq)]
pub struct Upsert {
    pub filter: Filter,
    pub document: Document,
}

impl Upsert {
    pub fn new(filter: Filter, document: Document) -> Self {
        Self { filter, document }
    }
}

/// Stable text form of a natural-key filter, independent of field order.
pub fn natural_key(filter: &Filter) -> String {
    let mut fields: Vec<(&String, &Value)> = filter.iter().collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));
    fields
        .into_iter()
        .map(|(field, value)| format!("{}={}", field, value))
        .collect::<Vec<_>>()
        .join(",")
}

/// True when every filter field is present in `doc` with an equal value.
pub fn matches_filter(doc: &Document, filter: &Filter) -> bool {
    filter
        .iter()
        .all(|(field, expected)| doc.get(field) == Some(expected))
}

// ============================================================================
// LENIENT DECODERS
// ============================================================================

/// 32-bit integer field. Floats, strings and out-of-range values decode to 0.
pub fn int_field(doc: &Document, field: &str) -> i32 {
    doc.get(field)
        .and_then(Value::as_i64)
        .and_then(|v| i32::try_from(v).ok())
        .unwrap_or_default()
}

/// 64-bit integer field, used for Unix timestamps.
pub fn long_field(doc: &Document, field: &str) -> i64 {
    doc.get(field).and_then(Value::as_i64).unwrap_or_default()
}

pub fn str_field(doc: &Document, field: &str) -> String {
    doc.get(field)
        .and_then(Value::as_str)
        .map(str::to_owned)
        .unwrap_or_default()
}

pub fn bool_field(doc: &Document, field: &str) -> bool {
    doc.get(field).and_then(Value::as_bool).unwrap_or_default()
}

/// Optional text field. Anything but a string is absent.
pub fn opt_str_field(doc: &Document, field: &str) -> Option<String> {
    doc.get(field).and_then(Value::as_str).map(str::to_owned)
}

/// Nested document field.
pub fn doc_field<'a>(doc: &'a Document, field: &str) -> Option<&'a Document> {
    doc.get(field).and_then(Value::as_object)
}

/// List of nested documents. Elements that are not documents are skipped,
/// and a missing or mistyped list is empty.
pub fn doc_list_field<'a>(doc: &'a Document, field: &str) -> impl Iterator<Item = &'a Document> {
    doc.get(field)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
}
