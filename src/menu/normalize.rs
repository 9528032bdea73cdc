/// Name key used to match items across menus when stable identifiers are
/// unavailable: lowercase, keep only `[a-z0-9 ]`, collapse whitespace, trim.
pub fn normalize_name(raw: &str) -> String {
    let kept: String = raw
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == ' ')
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}
