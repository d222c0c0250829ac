//! Temperature extraction from `ipmitool sensor` listings.
//!
//! Each line looks like `CPU Temp | 45.000 | degrees C | ok | ...`. Lines
//! whose name field does not mention a temperature, lines without a value
//! field, and values outside the plausible range are dropped silently.

/// Readings at or beyond these bounds are treated as noise.
pub const MIN_PLAUSIBLE_TEMP: f32 = -50.0;
pub const MAX_PLAUSIBLE_TEMP: f32 = 200.0;

pub fn parse_temperatures(raw: &str) -> Vec<f32> {
    raw.lines().filter_map(parse_line).collect()
}

fn parse_line(line: &str) -> Option<f32> {
    let mut fields = line.split('|');
    let name = fields.next()?;
    if !name.to_ascii_lowercase().contains("temp") {
        return None;
    }

    let value_field = fields.next()?.trim();
    let value: f32 = first_number(value_field)?.parse().ok()?;

    (value > MIN_PLAUSIBLE_TEMP && value < MAX_PLAUSIBLE_TEMP).then_some(value)
}

/// Returns the first `-?\d+(\.\d+)?` token in `field`.
fn first_number(field: &str) -> Option<&str> {
    let bytes = field.as_bytes();
    let digits_start = bytes.iter().position(u8::is_ascii_digit)?;
    let start = if digits_start > 0 && bytes[digits_start - 1] == b'-' {
        digits_start - 1
    } else {
        digits_start
    };

    let mut end = digits_start;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }

    if end + 1 < bytes.len() && bytes[end] == b'.' && bytes[end + 1].is_ascii_digit() {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }

    Some(&field[start..end])
}
