pub mod csv;
pub mod json;
pub mod table;

pub(crate) fn price_label(cents: Option<i64>) -> String {
    cents
        .map(|c| format!("{:.2}", c as f64 / 100.0))
        .unwrap_or_else(|| "-".to_string())
}
