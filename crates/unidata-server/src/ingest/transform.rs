//! Per-source mapping of raw items to Unified Records
//!
//! Each source layout gets one [`TransformFn`]. Shared coercion rules:
//!
//! - a missing or `null` field is absent
//! - `id` and `city` accept strings, and numbers as their decimal text
//! - availability accepts booleans and the strings `"true"` / `"false"`
//! - price accepts numbers and strings holding a finite number; a blank
//!   string is absent
//!
//! Any other shape fails the item with [`UnidataError::Transform`].

use serde_json::{Map, Value};
use unidata_common::{
    types::{RawData, UnifiedRecord},
    Result, UnidataError,
};

/// Maps one raw item of a source into a Unified Record
pub type TransformFn = fn(&str, Value) -> Result<UnifiedRecord>;

/// Source 1 layout: `{ id, address: { city }, isAvailable, priceForNight }`
pub fn structured_listing(source_id: &str, item: Value) -> Result<UnifiedRecord> {
    let fields = into_object(source_id, item)?;
    let item = Fields::new(source_id, &fields);

    let city = match fields.get("address") {
        None | Some(Value::Null) => None,
        Some(Value::Object(address)) => {
            Fields::new(source_id, address).text("city", "address.city")?
        },
        Some(_) => {
            return Err(UnidataError::transform(source_id, "address is not an object"));
        },
    };

    let mut record = UnifiedRecord::new(source_id, RawData::default());
    record.id = item.text("id", "id")?;
    record.city = city;
    record.is_available = item.flag("isAvailable")?;
    record.price = item.number("priceForNight")?;
    record.raw_data = RawData::new(fields);
    Ok(record)
}

/// Source 2 layout: `{ id, city, availability, pricePerNight }`
pub fn flat_listing(source_id: &str, item: Value) -> Result<UnifiedRecord> {
    let fields = into_object(source_id, item)?;
    let item = Fields::new(source_id, &fields);

    let mut record = UnifiedRecord::new(source_id, RawData::default());
    record.id = item.text("id", "id")?;
    record.city = item.text("city", "city")?;
    record.is_available = item.flag("availability")?;
    record.price = item.number("pricePerNight")?;
    record.raw_data = RawData::new(fields);
    Ok(record)
}

fn into_object(source_id: &str, item: Value) -> Result<Map<String, Value>> {
    match item {
        Value::Object(fields) => Ok(fields),
        other => Err(UnidataError::transform(
            source_id,
            format!("item is not a JSON object: {}", truncate(&other.to_string())),
        )),
    }
}

fn truncate(text: &str) -> &str {
    match text.char_indices().nth(64) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

struct Fields<'a> {
    source_id: &'a str,
    map: &'a Map<String, Value>,
}

impl<'a> Fields<'a> {
    fn new(source_id: &'a str, map: &'a Map<String, Value>) -> Self {
        Self { source_id, map }
    }

    fn get(&self, key: &str) -> Option<&'a Value> {
        self.map.get(key).filter(|v| !v.is_null())
    }

    fn invalid(&self, path: &str, expected: &str, found: &Value) -> UnidataError {
        UnidataError::transform(
            self.source_id,
            format!("{} must be {}, found {}", path, expected, truncate(&found.to_string())),
        )
    }

    fn text(&self, key: &str, path: &str) -> Result<Option<String>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(other) => Err(self.invalid(path, "a string", other)),
        }
    }

    fn flag(&self, key: &str) -> Result<Option<bool>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(Value::String(s)) if s == "true" => Ok(Some(true)),
            Some(Value::String(s)) if s == "false" => Ok(Some(false)),
            Some(other) => Err(self.invalid(key, "a boolean", other)),
        }
    }

    fn number(&self, key: &str) -> Result<Option<f64>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Number(n)) => n
                .as_f64()
                .map(Some)
                .ok_or_else(|| self.invalid(key, "a number", &Value::Number(n.clone()))),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(value @ Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map(Some)
                .ok_or_else(|| self.invalid(key, "a number", value)),
            Some(other) => Err(self.invalid(key, "a number", other)),
        }
    }
}
