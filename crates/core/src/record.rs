use std::fmt;

use serde::{Deserialize, Serialize};

/// A single stored item.
///
/// Attribute names on the wire are the camelCase field names, so
/// `external_id_list` is persisted as `externalIdList`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Record {
    pub id: String,
    pub boolean: bool,
    pub string: String,
    /// Tri-state on the wire (`S`, `S("")`, `NULL`), two-state here.
    pub nullable: Option<String>,
    pub number: u64,
    pub external_id_list: Vec<String>,
    pub number_list: Vec<i64>,
    pub nested: Nested,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Nested {
    pub any: AnyLevel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnyLevel {
    pub level: Level,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Level {
    pub supported: bool,
}

impl Nested {
    pub fn supported(supported: bool) -> Self {
        Self {
            any: AnyLevel {
                level: Level { supported },
            },
        }
    }
}

/// The attributes of a [`Record`], in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Id,
    Boolean,
    String,
    Nullable,
    Number,
    ExternalIdList,
    NumberList,
    Nested,
}

impl Field {
    pub const ALL: [Field; 8] = [
        Field::Id,
        Field::Boolean,
        Field::String,
        Field::Nullable,
        Field::Number,
        Field::ExternalIdList,
        Field::NumberList,
        Field::Nested,
    ];

    /// The attribute name used on the wire.
    pub fn attribute_name(&self) -> &'static str {
        match self {
            Field::Id => "id",
            Field::Boolean => "boolean",
            Field::String => "string",
            Field::Nullable => "nullable",
            Field::Number => "number",
            Field::ExternalIdList => "externalIdList",
            Field::NumberList => "numberList",
            Field::Nested => "nested",
        }
    }

    /// Looks up a field by its wire attribute name.
    pub fn from_attribute_name(name: &str) -> Option<Field> {
        Field::ALL
            .into_iter()
            .find(|field| field.attribute_name() == name)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.attribute_name())
    }
}

/// A scalar attribute value, as used in predicates.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Number(i64),
    String(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(value) => write!(f, "{value}"),
            Scalar::Number(value) => write!(f, "{value}"),
            Scalar::String(value) => write!(f, "{value:?}"),
        }
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Number(value)
    }
}

impl From<u64> for Scalar {
    fn from(value: u64) -> Self {
        Scalar::Number(value as i64)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::String(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::String(value)
    }
}

impl Record {
    /// Returns the scalar value of a field, or `None` for list, nested
    /// and absent nullable fields.
    pub fn scalar(&self, field: Field) -> Option<Scalar> {
        match field {
            Field::Id => Some(Scalar::String(self.id.clone())),
            Field::Boolean => Some(Scalar::Bool(self.boolean)),
            Field::String => Some(Scalar::String(self.string.clone())),
            Field::Nullable => self.nullable.clone().map(Scalar::String),
            Field::Number => Some(Scalar::Number(self.number as i64)),
            Field::ExternalIdList | Field::NumberList | Field::Nested => None,
        }
    }

    /// Renders a field for diagnostics.
    pub fn render_field(&self, field: Field) -> String {
        match field {
            Field::Id => format!("{:?}", self.id),
            Field::Boolean => self.boolean.to_string(),
            Field::String => format!("{:?}", self.string),
            Field::Nullable => match &self.nullable {
                Some(value) => format!("{value:?}"),
                None => "null".to_string(),
            },
            Field::Number => self.number.to_string(),
            Field::ExternalIdList => format!("{:?}", self.external_id_list),
            Field::NumberList => format!("{:?}", self.number_list),
            Field::Nested => serde_json::to_string(&self.nested).unwrap_or_default(),
        }
    }

    /// Returns the fields whose values differ between `self` and `other`.
    pub fn diff(&self, other: &Record) -> Vec<Field> {
        Field::ALL
            .into_iter()
            .filter(|field| match field {
                Field::Id => self.id != other.id,
                Field::Boolean => self.boolean != other.boolean,
                Field::String => self.string != other.string,
                Field::Nullable => self.nullable != other.nullable,
                Field::Number => self.number != other.number,
                Field::ExternalIdList => self.external_id_list != other.external_id_list,
                Field::NumberList => self.number_list != other.number_list,
                Field::Nested => self.nested != other.nested,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> Record {
        Record {
            id: "550e8400-e29b-41d4-a716-446655440001".to_string(),
            boolean: false,
            string: "Lion".to_string(),
            nullable: None,
            number: 42,
            external_id_list: vec!["a".to_string(), "b".to_string()],
            number_list: vec![1, 2, 3],
            nested: Nested::supported(true),
        }
    }

    #[test]
    fn test_serializes_with_wire_names() {
        let json = serde_json::to_value(sample_record()).unwrap();

        assert_eq!(json["externalIdList"], serde_json::json!(["a", "b"]));
        assert_eq!(json["numberList"], serde_json::json!([1, 2, 3]));
        assert_eq!(json["nullable"], serde_json::Value::Null);
        assert_eq!(json["nested"]["any"]["level"]["supported"], true);
    }

    #[test]
    fn test_rejects_unknown_fields() {
        let mut json = serde_json::to_value(sample_record()).unwrap();
        json["extra"] = serde_json::json!("surprise");

        assert!(serde_json::from_value::<Record>(json).is_err());
    }

    #[test]
    fn test_field_attribute_names_round_trip() {
        for field in Field::ALL {
            assert_eq!(Field::from_attribute_name(field.attribute_name()), Some(field));
        }
        assert_eq!(Field::from_attribute_name("missing"), None);
    }

    #[test]
    fn test_diff_reports_changed_fields() {
        let record = sample_record();
        let mut other = record.clone();
        other.nullable = Some(String::new());
        other.number = 43;

        assert_eq!(record.diff(&other), vec![Field::Nullable, Field::Number]);
        assert!(record.diff(&record).is_empty());
    }

    #[test]
    fn test_scalar_skips_composite_fields() {
        let record = sample_record();

        assert_eq!(record.scalar(Field::Number), Some(Scalar::Number(42)));
        assert_eq!(record.scalar(Field::Nullable), None);
        assert_eq!(record.scalar(Field::Nested), None);
    }
}
