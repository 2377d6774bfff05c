use crate::Cents;

/// Parse a boolean flag from a string value, or return the given default value otherwise.
pub fn parse_boolean_flag(value: Option<String>, default: bool) -> bool {
    let value = match value {
        Some(v) => v,
        None => return default,
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

/// Parse a cent amount from a string value, or return the given default value otherwise.
pub fn parse_cents(value: Option<String>, default: Cents) -> Cents {
    value.and_then(|v| v.trim().parse::<i64>().ok()).map(Cents::from).unwrap_or(default)
}
