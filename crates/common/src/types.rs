use glam::Vec2;
use serde::de::{self, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Dense identifier of an entity, `0..N-1` in original list order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityIndex(pub u32);

impl EntityIndex {
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

/// A raw attribute value as it arrives from the data source.
///
/// Booleans, arrays and objects load as [`RawValue::Unsupported`] so one odd
/// attribute never rejects the whole entity list. They serialize as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
    Null,
    Unsupported,
}

impl<'de> Deserialize<'de> for RawValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(RawValueVisitor)
    }
}

struct RawValueVisitor;

impl<'de> Visitor<'de> for RawValueVisitor {
    type Value = RawValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any attribute value")
    }

    fn visit_bool<E: de::Error>(self, _: bool) -> Result<RawValue, E> {
        Ok(RawValue::Unsupported)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<RawValue, E> {
        Ok(RawValue::Number(v as f64))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<RawValue, E> {
        Ok(RawValue::Number(v as f64))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<RawValue, E> {
        Ok(RawValue::Number(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<RawValue, E> {
        Ok(RawValue::Text(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<RawValue, E> {
        Ok(RawValue::Text(v))
    }

    fn visit_bytes<E: de::Error>(self, _: &[u8]) -> Result<RawValue, E> {
        Ok(RawValue::Unsupported)
    }

    fn visit_unit<E: de::Error>(self) -> Result<RawValue, E> {
        Ok(RawValue::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<RawValue, E> {
        Ok(RawValue::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<RawValue, D::Error> {
        deserializer.deserialize_any(self)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<RawValue, A::Error> {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(RawValue::Unsupported)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<RawValue, A::Error> {
        while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
        Ok(RawValue::Unsupported)
    }
}

impl RawValue {
    /// Text content, if this value is a string.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            RawValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric content. Numeric strings are accepted; anything else is `None`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            RawValue::Number(n) => Some(*n),
            RawValue::Text(s) => s.trim().parse().ok(),
            RawValue::Null | RawValue::Unsupported => None,
        }
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

impl From<f64> for RawValue {
    fn from(n: f64) -> Self {
        RawValue::Number(n)
    }
}

/// Per-entity metadata record: a footprint centroid plus named raw attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityMetadata {
    #[serde(default)]
    pub centroid: Option<Vec2>,
    #[serde(flatten)]
    pub attributes: BTreeMap<String, RawValue>,
}

impl EntityMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style centroid setter.
    pub fn with_centroid(mut self, centroid: Vec2) -> Self {
        self.centroid = Some(centroid);
        self
    }

    /// Builder-style attribute setter.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Raw value of a color-code field. `Null` counts as absent.
    pub fn field(&self, field: ColorCodeField) -> Option<&RawValue> {
        self.attributes
            .get(field.key())
            .filter(|v| !matches!(v, RawValue::Null))
    }
}

/// The closed set of attributes that can drive entity color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ColorCodeField {
    YearBuilt,
    ZoneDist1,
    BldgClass,
}

impl ColorCodeField {
    pub const ALL: [ColorCodeField; 3] = [
        ColorCodeField::YearBuilt,
        ColorCodeField::ZoneDist1,
        ColorCodeField::BldgClass,
    ];

    /// Attribute key used in metadata records.
    pub fn key(self) -> &'static str {
        match self {
            ColorCodeField::YearBuilt => "YearBuilt",
            ColorCodeField::ZoneDist1 => "ZoneDist1",
            ColorCodeField::BldgClass => "BldgClass",
        }
    }

    /// Metadata slot (texel offset within an entity run) holding this field's color.
    pub fn slot(self) -> u32 {
        match self {
            ColorCodeField::YearBuilt => 0,
            ColorCodeField::ZoneDist1 => 1,
            ColorCodeField::BldgClass => 2,
        }
    }

    /// Parse a field key. Unknown keys select no field.
    pub fn parse(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.key() == key)
    }
}

impl fmt::Display for ColorCodeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_parse_roundtrips_keys() {
        for field in ColorCodeField::ALL {
            assert_eq!(ColorCodeField::parse(field.key()), Some(field));
        }
        assert_eq!(ColorCodeField::parse("LotArea"), None);
        assert_eq!(ColorCodeField::parse(""), None);
    }

    #[test]
    fn slots_are_distinct() {
        let slots: Vec<u32> = ColorCodeField::ALL.iter().map(|f| f.slot()).collect();
        assert_eq!(slots, vec![0, 1, 2]);
    }

    #[test]
    fn numeric_strings_are_numbers() {
        assert_eq!(RawValue::from("1931").as_number(), Some(1931.0));
        assert_eq!(RawValue::from("n/a").as_number(), None);
        assert_eq!(RawValue::Null.as_number(), None);
        assert_eq!(RawValue::from(12.0).as_text(), None);
    }

    #[test]
    fn null_field_counts_as_absent() {
        let meta = EntityMetadata::new()
            .with("BldgClass", RawValue::Null)
            .with("ZoneDist1", "R6");
        assert!(meta.field(ColorCodeField::BldgClass).is_none());
        assert!(meta.field(ColorCodeField::YearBuilt).is_none());
        assert_eq!(
            meta.field(ColorCodeField::ZoneDist1),
            Some(&RawValue::from("R6"))
        );
    }

    #[test]
    fn metadata_from_json() {
        let json = r#"[
            {"centroid": [10.0, 20.5], "YearBuilt": 1931, "ZoneDist1": "C6-4", "BldgClass": null},
            null
        ]"#;
        let list: Vec<Option<EntityMetadata>> = serde_json::from_str(json).unwrap();
        assert_eq!(list.len(), 2);
        let first = list[0].as_ref().unwrap();
        assert_eq!(first.centroid, Some(Vec2::new(10.0, 20.5)));
        assert_eq!(
            first.field(ColorCodeField::YearBuilt).and_then(RawValue::as_number),
            Some(1931.0)
        );
        assert!(first.field(ColorCodeField::BldgClass).is_none());
        assert!(list[1].is_none());
    }

    #[test]
    fn unsupported_attribute_shapes_still_load() {
        let json = r#"[
            {"centroid": [10.0, 20.5], "YearBuilt": 1931, "Landmark": true},
            {"BldgClass": ["A1"], "ZoneDist1": {"primary": "R6"}, "YearBuilt": false}
        ]"#;
        let list: Vec<Option<EntityMetadata>> = serde_json::from_str(json).unwrap();
        assert_eq!(list.len(), 2);

        let first = list[0].as_ref().unwrap();
        assert_eq!(first.attributes.get("Landmark"), Some(&RawValue::Unsupported));
        assert_eq!(
            first.field(ColorCodeField::YearBuilt).and_then(RawValue::as_number),
            Some(1931.0)
        );

        let second = list[1].as_ref().unwrap();
        for field in ColorCodeField::ALL {
            let value = second.field(field).unwrap();
            assert_eq!(value, &RawValue::Unsupported);
            assert_eq!(value.as_text(), None);
            assert_eq!(value.as_number(), None);
        }
    }
}
