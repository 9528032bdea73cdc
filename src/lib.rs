//! Menu freshness control loop: snapshot diffing, confidence and drift
//! scoring, and refresh scheduling for merged menus.

pub mod alert;
pub mod confidence;
pub mod config;
pub mod diff;
pub mod error;
pub mod inputs;
pub mod menu;
pub mod output;
pub mod scheduler;
pub mod snapshot;
