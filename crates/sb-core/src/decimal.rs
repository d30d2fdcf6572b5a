/// Formats a float the way scene files store numbers: shortest round-trip
/// digits, with a trailing `.0` on integral values.
pub fn format_decimal(value: f64) -> String {
    let text = value.to_string();
    if !value.is_finite() || text.contains('.') || text.contains('e') {
        return text;
    }
    format!("{}.0", text)
}
