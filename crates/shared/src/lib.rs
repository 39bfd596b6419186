//! Types shared between the dashboard, the client core and the mock store.

pub mod domain;
pub mod error;
pub mod protocol;
