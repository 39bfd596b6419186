use serde::{Deserialize, Deserializer, Serialize};

use crate::{
    domain::{RecordId, SensorRecord},
    error::ErrorDetail,
};

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Result envelope of the store's list operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: Vec<SensorRecord>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub errors: Vec<ErrorDetail>,
}

impl ListResponse {
    pub fn ok(data: Vec<SensorRecord>) -> Self {
        Self {
            data,
            errors: Vec::new(),
        }
    }
}

/// Result envelope of the store's single-record update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateResponse {
    #[serde(default)]
    pub data: Option<SensorRecord>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub errors: Vec<ErrorDetail>,
}

impl UpdateResponse {
    pub fn ok(record: SensorRecord) -> Self {
        Self {
            data: Some(record),
            errors: Vec::new(),
        }
    }

    pub fn failed(errors: Vec<ErrorDetail>) -> Self {
        Self { data: None, errors }
    }
}

/// Body of an update request. Editable fields are always sent; `null` clears a value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateSensorRecordInput {
    pub id: RecordId,
    pub topicsensor: Option<String>,
    pub temperature: Option<f64>,
    pub location: Option<String>,
    pub system: Option<String>,
}

impl UpdateSensorRecordInput {
    /// Applies the editable fields onto `record`, leaving id and pass-through fields alone.
    pub fn apply_to(&self, record: &mut SensorRecord) {
        record.topicsensor = self.topicsensor.clone();
        record.temperature = self.temperature;
        record.location = self.location.clone();
        record.system = self.system.clone();
    }
}
