//! Client-side core of the sensor dashboard: the remote store seam, the
//! list-edit controller and the derived views it exposes.

pub mod controller;
pub mod draft;
pub mod error;
pub mod store;
pub mod views;

pub use controller::{CommitOutcome, ControllerSnapshot, ListEditController};
pub use draft::{DraftFieldError, EditDraft, TemperatureInput};
pub use error::{ControllerError, ErrorKind, OpResult};
pub use store::{HttpRecordStore, MemoryRecordStore, RecordStore, DEFAULT_MODEL};
pub use views::{Page, SortDirection, SortSpec, ViewQuery};
