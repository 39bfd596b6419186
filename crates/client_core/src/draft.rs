//! In-progress edit of a single record.

use shared::{
    domain::{RecordField, RecordId, SensorRecord},
    protocol::UpdateSensorRecordInput,
};
use thiserror::Error;

/// Temperature as typed by the user.
#[derive(Debug, Clone, PartialEq)]
pub enum TemperatureInput {
    /// Parsed value; `None` clears the column.
    Value(Option<f64>),
    /// Raw text that is not a finite number. Never sent to the store.
    Invalid(String),
}

impl TemperatureInput {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return TemperatureInput::Value(None);
        }
        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => TemperatureInput::Value(Some(value)),
            _ => TemperatureInput::Invalid(raw.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftFieldError {
    #[error("temperature must be a number, got '{input}'")]
    NotANumber { input: String },
    #[error("{field} cannot be edited")]
    ReadOnly { field: RecordField },
}

impl DraftFieldError {
    pub fn field(&self) -> RecordField {
        match self {
            DraftFieldError::NotANumber { .. } => RecordField::Temperature,
            DraftFieldError::ReadOnly { field } => *field,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EditDraft {
    base: SensorRecord,
    topicsensor: Option<String>,
    temperature: TemperatureInput,
    location: Option<String>,
    system: Option<String>,
}

impl EditDraft {
    /// Opens a draft holding the record's current values.
    pub fn seed(record: &SensorRecord) -> Self {
        Self {
            base: record.clone(),
            topicsensor: record.topicsensor.clone(),
            temperature: TemperatureInput::Value(record.temperature),
            location: record.location.clone(),
            system: record.system.clone(),
        }
    }

    pub fn id(&self) -> &RecordId {
        &self.base.id
    }

    /// The record as it was when the draft was opened.
    pub fn base(&self) -> &SensorRecord {
        &self.base
    }

    pub fn temperature(&self) -> &TemperatureInput {
        &self.temperature
    }

    pub fn text(&self, field: RecordField) -> Option<&str> {
        match field {
            RecordField::TopicSensor => self.topicsensor.as_deref(),
            RecordField::Location => self.location.as_deref(),
            RecordField::System => self.system.as_deref(),
            RecordField::Id | RecordField::Temperature => None,
        }
    }

    /// Merges one field. An unparsable temperature is still kept so the
    /// input can be shown back, but the draft stops validating.
    pub fn set_field(&mut self, field: RecordField, value: &str) -> Result<(), DraftFieldError> {
        match field {
            RecordField::Id => return Err(DraftFieldError::ReadOnly { field }),
            RecordField::TopicSensor => self.topicsensor = Some(value.to_string()),
            RecordField::Location => self.location = Some(value.to_string()),
            RecordField::System => self.system = Some(value.to_string()),
            RecordField::Temperature => {
                self.temperature = TemperatureInput::parse(value);
                if let TemperatureInput::Invalid(input) = &self.temperature {
                    return Err(DraftFieldError::NotANumber {
                        input: input.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), DraftFieldError> {
        match &self.temperature {
            TemperatureInput::Invalid(input) => Err(DraftFieldError::NotANumber {
                input: input.clone(),
            }),
            TemperatureInput::Value(_) => Ok(()),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Editable fields whose draft value differs from the record the draft was seeded from.
    pub fn changed_fields(&self) -> Vec<RecordField> {
        RecordField::EDITABLE
            .into_iter()
            .filter(|field| match field {
                RecordField::Temperature => {
                    self.temperature != TemperatureInput::Value(self.base.temperature)
                }
                RecordField::TopicSensor => self.topicsensor != self.base.topicsensor,
                RecordField::Location => self.location != self.base.location,
                RecordField::System => self.system != self.base.system,
                RecordField::Id => false,
            })
            .collect()
    }

    /// Update request carrying the draft values over the record's required fields.
    pub fn to_input(&self) -> Result<UpdateSensorRecordInput, DraftFieldError> {
        let temperature = match &self.temperature {
            TemperatureInput::Value(value) => *value,
            TemperatureInput::Invalid(input) => {
                return Err(DraftFieldError::NotANumber {
                    input: input.clone(),
                })
            }
        };
        Ok(UpdateSensorRecordInput {
            id: self.base.id.clone(),
            topicsensor: self.topicsensor.clone(),
            temperature,
            location: self.location.clone(),
            system: self.system.clone(),
        })
    }
}
