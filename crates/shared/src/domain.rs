use std::{borrow::Cow, convert::Infallible, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Identifier assigned by the remote store.
///
/// The store hands out integers, but rows that went through other tooling can
/// carry textual ids, so both shapes are accepted and kept as received.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(i64),
    Text(String),
}

impl RecordId {
    /// Numeric reading of the identifier, used for display ordering.
    pub fn numeric(&self) -> Option<f64> {
        match self {
            RecordId::Number(value) => Some(*value as f64),
            RecordId::Text(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    return None;
                }
                trimmed.parse::<f64>().ok().filter(|value| value.is_finite())
            }
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Number(value) => write!(f, "{value}"),
            RecordId::Text(text) => f.write_str(text),
        }
    }
}

impl FromStr for RecordId {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().parse::<i64>() {
            Ok(value) => RecordId::Number(value),
            Err(_) => RecordId::Text(s.to_string()),
        })
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        RecordId::Number(value)
    }
}

/// One row of the sensor reading table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorRecord {
    pub id: RecordId,
    #[serde(default)]
    pub topicsensor: Option<String>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub system: Option<String>,
    /// Store-defined columns (payload length, receipt time, ...) passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SensorRecord {
    pub fn new(id: impl Into<RecordId>) -> Self {
        Self {
            id: id.into(),
            topicsensor: None,
            temperature: None,
            location: None,
            system: None,
            extra: Map::new(),
        }
    }

    pub fn value(&self, key: &FieldKey) -> FieldValue<'_> {
        match key {
            FieldKey::Column(field) => self.column(*field),
            FieldKey::Aux(name) => self
                .extra
                .get(name)
                .map(FieldValue::from_json)
                .unwrap_or(FieldValue::Null),
        }
    }

    pub fn column(&self, field: RecordField) -> FieldValue<'_> {
        fn text(value: &Option<String>) -> FieldValue<'_> {
            value
                .as_deref()
                .map(|v| FieldValue::Text(Cow::Borrowed(v)))
                .unwrap_or(FieldValue::Null)
        }

        match field {
            RecordField::Id => match &self.id {
                RecordId::Number(value) => FieldValue::Number(*value as f64),
                RecordId::Text(value) => FieldValue::Text(Cow::Borrowed(value)),
            },
            RecordField::TopicSensor => text(&self.topicsensor),
            RecordField::Temperature => self
                .temperature
                .map(FieldValue::Number)
                .unwrap_or(FieldValue::Null),
            RecordField::Location => text(&self.location),
            RecordField::System => text(&self.system),
        }
    }

    /// Every value of the row: the fixed columns first, then auxiliary fields in key order.
    pub fn values(&self) -> impl Iterator<Item = FieldValue<'_>> {
        RecordField::ALL
            .iter()
            .map(|field| self.column(*field))
            .chain(self.extra.values().map(FieldValue::from_json))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordField {
    Id,
    TopicSensor,
    Temperature,
    Location,
    System,
}

impl RecordField {
    pub const ALL: [RecordField; 5] = [
        RecordField::Id,
        RecordField::TopicSensor,
        RecordField::Temperature,
        RecordField::Location,
        RecordField::System,
    ];

    pub const EDITABLE: [RecordField; 4] = [
        RecordField::TopicSensor,
        RecordField::Temperature,
        RecordField::Location,
        RecordField::System,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RecordField::Id => "id",
            RecordField::TopicSensor => "topicsensor",
            RecordField::Temperature => "temperature",
            RecordField::Location => "location",
            RecordField::System => "system",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RecordField::Id => "ID",
            RecordField::TopicSensor => "Topic Sensor",
            RecordField::Temperature => "Temperature",
            RecordField::Location => "Location",
            RecordField::System => "System",
        }
    }

    pub fn is_editable(self) -> bool {
        self != RecordField::Id
    }
}

impl fmt::Display for RecordField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown record field '{0}'")]
pub struct UnknownField(pub String);

impl FromStr for RecordField {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "id" => Ok(RecordField::Id),
            "topicsensor" | "topic_sensor" | "topic" => Ok(RecordField::TopicSensor),
            "temperature" | "temp" => Ok(RecordField::Temperature),
            "location" => Ok(RecordField::Location),
            "system" => Ok(RecordField::System),
            _ => Err(UnknownField(s.to_string())),
        }
    }
}

/// Addresses a value inside a record: one of the fixed columns or a pass-through field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldKey {
    Column(RecordField),
    Aux(String),
}

impl From<RecordField> for FieldKey {
    fn from(value: RecordField) -> Self {
        FieldKey::Column(value)
    }
}

impl FromStr for FieldKey {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.parse::<RecordField>() {
            Ok(field) => FieldKey::Column(field),
            Err(_) => FieldKey::Aux(s.trim().to_string()),
        })
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKey::Column(field) => field.fmt(f),
            FieldKey::Aux(name) => f.write_str(name),
        }
    }
}

/// Borrowed view of a single record value with its natural type.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue<'a> {
    Null,
    Bool(bool),
    Number(f64),
    Text(Cow<'a, str>),
}

impl<'a> FieldValue<'a> {
    pub fn from_json(value: &'a Value) -> Self {
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(flag) => FieldValue::Bool(*flag),
            Value::Number(number) => number
                .as_f64()
                .map(FieldValue::Number)
                .unwrap_or_else(|| FieldValue::Text(Cow::Owned(number.to_string()))),
            Value::String(text) => FieldValue::Text(Cow::Borrowed(text)),
            other => FieldValue::Text(Cow::Owned(other.to_string())),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

impl fmt::Display for FieldValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => Ok(()),
            FieldValue::Bool(flag) => write!(f, "{flag}"),
            FieldValue::Number(number) => write!(f, "{number}"),
            FieldValue::Text(text) => f.write_str(text),
        }
    }
}
