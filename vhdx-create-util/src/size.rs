/// Parses a byte count such as `4096`, `64M`, `1GiB` or `2T`.
///
/// Suffixes are binary multiples and case-insensitive. Zero is rejected.
pub fn parse_size(text: &str) -> Result<u64, String> {
    let text = text.trim();
    let split = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());
    let (digits, suffix) = text.split_at(split);

    if digits.is_empty() {
        return Err(format!("'{text}' does not start with a number"));
    }

    let value: u64 = digits
        .parse()
        .map_err(|e| format!("invalid number '{digits}': {e}"))?;

    let shift = match suffix.to_ascii_uppercase().as_str() {
        "" | "B" => 0,
        "K" | "KB" | "KIB" => 10,
        "M" | "MB" | "MIB" => 20,
        "G" | "GB" | "GIB" => 30,
        "T" | "TB" | "TIB" => 40,
        _ => return Err(format!("unknown size suffix '{suffix}'")),
    };

    if value == 0 {
        return Err("size must not be zero".to_owned());
    }

    value
        .checked_mul(1 << shift)
        .ok_or_else(|| format!("'{text}' is too large"))
}
