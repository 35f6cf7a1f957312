// =============================================================================
// NORMALIZE MODULE
// =============================================================================
// Turns whatever the upstream sends into `StockItem`s.
//
// Two jobs live here:
// - list extraction: find the record array inside one of the response
//   envelopes the upstream is known to use
// - field resolution: map each logical field to the first matching key from
//   a fixed alias table. The spreadsheet lookup uses the same table.
//
// Nothing in this module can fail. Missing or oddly typed values become "".
// =============================================================================

use serde_json::{Map, Value};

use crate::models::StockItem;

// =============================================================================
// FIELD ALIASES
// =============================================================================
// Candidate keys per logical field, highest priority first. Matching is
// case-insensitive; JSON keys and spreadsheet headers share these lists.

pub const NUM_ALIASES: &[&str] = &["num", "id", "sku", "编号"];
pub const PRODUCT_ALIASES: &[&str] = &["name", "product", "title", "名称", "品名"];
pub const OE_ALIASES: &[&str] = &["oe", "oeCode", "oe_code", "OE号"];
pub const BRAND_ALIASES: &[&str] = &["car", "brand", "品牌"];
pub const MODEL_ALIASES: &[&str] = &["carCode", "model", "车型"];
pub const PRICE_ALIASES: &[&str] = &["price", "salePrice", "价格"];
pub const IMAGE_ALIASES: &[&str] = &["pics", "image", "图片"];

/// Anything records can be read from: a JSON object or a spreadsheet row.
pub trait FieldSource {
    /// Text stored under `key` (compared case-insensitively), if any.
    fn text_for(&self, key: &str) -> Option<String>;

    /// Picture URLs stored under `key`.
    fn pictures_for(&self, key: &str) -> Vec<String> {
        self.text_for(key).map(|raw| split_pictures(&raw)).unwrap_or_default()
    }
}

/// Returns the first non-empty value found under any alias, or "".
pub fn resolve(source: &impl FieldSource, aliases: &[&str]) -> String {
    aliases
        .iter()
        .filter_map(|alias| source.text_for(alias))
        .find(|value| !value.is_empty())
        .unwrap_or_default()
}

fn resolve_pictures(source: &impl FieldSource) -> Vec<String> {
    IMAGE_ALIASES
        .iter()
        .map(|alias| source.pictures_for(alias))
        .find(|pictures| !pictures.is_empty())
        .unwrap_or_default()
}

/// Builds a `StockItem` from any field source. `year` stays empty: no
/// upstream carries one.
pub fn item_from_source(source: &impl FieldSource) -> StockItem {
    let images = resolve_pictures(source);
    StockItem {
        num: resolve(source, NUM_ALIASES),
        product: resolve(source, PRODUCT_ALIASES),
        oe: resolve(source, OE_ALIASES),
        brand: resolve(source, BRAND_ALIASES),
        model: resolve(source, MODEL_ALIASES),
        year: String::new(),
        image: images.first().cloned().unwrap_or_default(),
        price: resolve(source, PRICE_ALIASES),
        images,
    }
}

/// Splits a picture cell like `a.jpg, b.jpg` into URLs.
fn split_pictures(raw: &str) -> Vec<String> {
    raw.split([',', ';', '\n'])
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(str::to_string)
        .collect()
}

// =============================================================================
// JSON RECORDS
// =============================================================================

impl FieldSource for Map<String, Value> {
    fn text_for(&self, key: &str) -> Option<String> {
        lookup_ci(self, key).map(scalar_text)
    }

    fn pictures_for(&self, key: &str) -> Vec<String> {
        match lookup_ci(self, key) {
            Some(Value::Array(entries)) => entries
                .iter()
                .map(scalar_text)
                .filter(|url| !url.is_empty())
                .collect(),
            Some(Value::String(raw)) => split_pictures(raw),
            _ => Vec::new(),
        }
    }
}

/// Exact key first, then a case-insensitive scan.
fn lookup_ci<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    object.get(key).or_else(|| {
        let wanted = key.to_lowercase();
        object
            .iter()
            .find(|(candidate, _)| candidate.trim().to_lowercase() == wanted)
            .map(|(_, value)| value)
    })
}

/// Strings are trimmed, numbers and booleans printed, everything else is "".
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
    }
}

/// Normalizes one raw upstream record. Non-object input yields an empty item.
pub fn normalize(raw: &Value) -> StockItem {
    match raw {
        Value::Object(object) => item_from_source(object),
        _ => StockItem::default(),
    }
}

/// Normalizes a record list, dropping records without a key or a name.
pub fn normalize_list(raw: &[Value]) -> Vec<StockItem> {
    raw.iter()
        .map(normalize)
        .filter(StockItem::is_listable)
        .collect()
}

// =============================================================================
// LIST EXTRACTION
// =============================================================================

/// Outcome of trying one response envelope.
#[derive(Debug, PartialEq)]
pub enum ShapeMatch<'a> {
    Matched(&'a [Value]),
    NoMatch,
}

type ShapeStrategy = for<'a> fn(&'a Value) -> ShapeMatch<'a>;

/// Envelopes in the order they are tried. First match wins.
const SHAPES: &[(&str, ShapeStrategy)] = &[
    ("array", bare_array),
    ("content", content),
    ("data.content", data_content),
    ("data.data", data_data),
];

fn as_match(value: Option<&Value>) -> ShapeMatch<'_> {
    match value {
        Some(Value::Array(records)) => ShapeMatch::Matched(records),
        _ => ShapeMatch::NoMatch,
    }
}

fn bare_array(value: &Value) -> ShapeMatch<'_> {
    as_match(Some(value))
}

fn content(value: &Value) -> ShapeMatch<'_> {
    as_match(value.get("content"))
}

fn data_content(value: &Value) -> ShapeMatch<'_> {
    as_match(value.get("data").and_then(|data| data.get("content")))
}

fn data_data(value: &Value) -> ShapeMatch<'_> {
    as_match(value.get("data").and_then(|data| data.get("data")))
}

/// Finds the record array in an upstream response; empty when no known
/// envelope matches.
pub fn extract_list(value: &Value) -> &[Value] {
    for (name, strategy) in SHAPES {
        if let ShapeMatch::Matched(records) = strategy(value) {
            tracing::trace!(shape = name, count = records.len(), "Matched upstream list shape");
            return records;
        }
    }
    &[]
}
