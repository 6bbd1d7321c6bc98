//! Display-only number formatting. Nothing here feeds back into pricing.

/// en-US style: `,` thousands separator, at most `max_decimals` fraction
/// digits, trailing zeros dropped. `1234.5678` with 2 -> `"1,234.57"`.
pub fn format_number(value: f64, max_decimals: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let fixed = format!("{:.*}", max_decimals, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((int_part, frac)) => (int_part, frac.trim_end_matches('0')),
        None => (fixed.as_str(), ""),
    };

    let mut out = String::with_capacity(fixed.len() + int_part.len() / 3 + 1);
    if value < 0.0 && (int_part != "0" || !frac_part.is_empty()) {
        out.push('-');
    }
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if !frac_part.is_empty() {
        out.push('.');
        out.push_str(frac_part);
    }
    out
}

/// Fixed number of decimals, no grouping.
pub fn format_fixed(value: f64, decimals: usize) -> String {
    format!("{:.*}", decimals, value)
}

/// `100` -> `"0.01%"`.
pub fn format_fee_tier(fee_tier: u32) -> String {
    format!("{}%", format_number(fee_tier as f64 / 10_000.0, 4))
}
