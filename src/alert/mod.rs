pub mod engine;
pub mod rules;
pub mod sink;

pub use engine::{evaluate_alerts, AlertEvent, AlertsReport};
pub use rules::{AlertEventKind, AlertPolicy, AlertSeverity};
