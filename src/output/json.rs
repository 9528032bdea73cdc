use anyhow::Result;
use serde::Serialize;
use serde_json::json;

pub fn render_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

pub fn render_json_line<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

pub fn render_failure(message: &str) -> String {
    json!({ "ok": false, "error": message }).to_string()
}
