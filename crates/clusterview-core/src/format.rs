//! Display helpers for addresses and USD figures.

const ADDRESS_KEEP: usize = 4;
const ADDRESS_ABBREVIATE_ABOVE: usize = 10;

/// Tooltip volume label: `$` followed by a thousands-grouped amount.
pub fn format_usd(value: f64) -> String {
    format!("${}", group_thousands(value, 3))
}

/// Groups the integer part with commas and keeps at most
/// `max_fraction_digits` decimals, trailing zeros trimmed.
pub fn group_thousands(value: f64, max_fraction_digits: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let rounded = format!("{:.*}", max_fraction_digits, value.abs());
    let (int_part, frac_part) = rounded.split_once('.').unwrap_or((rounded.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');

    let mut out = String::with_capacity(rounded.len() + int_part.len() / 3 + 1);
    let is_zero = int_part.bytes().all(|b| b == b'0') && frac_part.is_empty();
    if value.is_sign_negative() && !is_zero {
        out.push('-');
    }

    let digits = int_part.len();
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (digits - i) % 3 == 0 {
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

/// Short node label, `5zsb...uTdm`.
pub fn abbreviate_address(address: &str) -> String {
    let count = address.chars().count();
    if count <= ADDRESS_ABBREVIATE_ABOVE {
        return address.to_string();
    }
    let head: String = address.chars().take(ADDRESS_KEEP).collect();
    let tail: String = address.chars().skip(count - ADDRESS_KEEP).collect();
    format!("{head}...{tail}")
}

/// Compact figure for summaries: `1.23K`, `2.50M`, `999`.
pub fn abbreviate_number(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let abs = value.abs();
    let (scale, suffix) = if abs >= 1e12 {
        (1e12, "T")
    } else if abs >= 1e9 {
        (1e9, "B")
    } else if abs >= 1e6 {
        (1e6, "M")
    } else if abs >= 1e3 {
        (1e3, "K")
    } else if value.fract() == 0.0 {
        return format!("{value:.0}");
    } else {
        return format!("{value:.2}");
    };

    format!("{:.2}{suffix}", value / scale)
}
