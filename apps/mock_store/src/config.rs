use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use client_core::DEFAULT_MODEL;
use serde_json::json;
use shared::domain::SensorRecord;

#[derive(Debug)]
pub struct Settings {
    pub bind_addr: String,
    pub model: String,
    pub seed_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8787".into(),
            model: DEFAULT_MODEL.into(),
            seed_path: None,
        }
    }
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("mock_store.toml") {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(&raw) {
            if let Some(v) = file_cfg.get("bind_addr") {
                settings.bind_addr = v.clone();
            }
            if let Some(v) = file_cfg.get("model") {
                settings.model = v.clone();
            }
            if let Some(v) = file_cfg.get("seed_path") {
                settings.seed_path = Some(PathBuf::from(v));
            }
        }
    }

    if let Ok(v) = std::env::var("MOCK_STORE_BIND") {
        settings.bind_addr = v;
    }
    if let Ok(v) = std::env::var("APP__BIND_ADDR") {
        settings.bind_addr = v;
    }

    if let Ok(v) = std::env::var("APP__MODEL") {
        settings.model = v;
    }

    if let Ok(v) = std::env::var("APP__SEED_PATH") {
        settings.seed_path = Some(PathBuf::from(v));
    }

    settings
}

/// Rows to start with: a JSON array from `path`, or a built-in sample table.
pub fn load_seed(path: Option<&Path>) -> anyhow::Result<Vec<SensorRecord>> {
    let Some(path) = path else {
        return Ok(sample_rows());
    };
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read seed file '{}'", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("seed file '{}' is not a JSON array of records", path.display()))
}

fn sample_rows() -> Vec<SensorRecord> {
    const LOCATIONS: [&str; 4] = ["Room 23", "Boiler room", "Roof", "Server room"];
    const SYSTEMS: [&str; 3] = ["HVAC", "Heating", "Cooling"];

    // Stored out of order; the dashboard orders by id itself.
    [7_i64, 3, 12, 1, 9, 4, 11, 2, 8, 5, 10, 6]
        .into_iter()
        .map(|id| {
            let mut row = SensorRecord::new(id);
            let slot = id as usize;
            row.topicsensor = Some(format!("building/sensor-{id:02}/temperature"));
            row.temperature = (id % 5 != 0).then(|| 17.5 + (id as f64) * 0.75);
            row.location = Some(LOCATIONS[slot % LOCATIONS.len()].to_string());
            row.system = Some(SYSTEMS[slot % SYSTEMS.len()].to_string());
            row.extra.insert("payloadlength".into(), json!(48 + id));
            row.extra.insert(
                "received_at".into(),
                json!(format!("2024-05-01T10:{:02}:00Z", id * 4)),
            );
            row
        })
        .collect()
}
