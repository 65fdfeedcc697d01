//! UPnP time strings (`H+:MM:SS[.fff]`)

const NOT_IMPLEMENTED: &str = "NOT_IMPLEMENTED";

/// Format milliseconds as a REL_TIME target, `HH:MM:SS`
///
/// Sub-second precision is dropped; many renderers reject fractional seek
/// targets.
pub fn format_rel_time(millis: u64) -> String {
    let total_secs = millis / 1000;
    format!(
        "{:02}:{:02}:{:02}",
        total_secs / 3600,
        (total_secs / 60) % 60,
        total_secs % 60
    )
}

/// Whether a device reported that it does not track this time value
pub fn is_unreported(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value.eq_ignore_ascii_case(NOT_IMPLEMENTED)
}

/// Parse `H+:MM:SS[.fff]` into milliseconds
///
/// Empty and `NOT_IMPLEMENTED` values read as zero. Returns `None` for
/// anything else that does not match the format, and for hour counts too
/// large to represent in milliseconds.
pub fn parse_rel_time(value: &str) -> Option<u64> {
    if is_unreported(value) {
        return Some(0);
    }

    let mut parts = value.trim().split(':');
    let hours: u64 = parse_digits(parts.next()?)?;
    let minutes: u64 = parse_digits(parts.next()?)?;
    let seconds_part = parts.next()?;
    if parts.next().is_some() || minutes >= 60 {
        return None;
    }

    let (seconds, fraction) = match seconds_part.split_once('.') {
        Some((secs, frac)) => (parse_digits(secs)?, Some(frac)),
        None => (parse_digits(seconds_part)?, None),
    };
    if seconds >= 60 {
        return None;
    }

    let millis = match fraction {
        Some(frac) => {
            let frac: String = frac.chars().take(3).collect();
            let scale = 10u64.pow(3 - frac.len() as u32);
            parse_digits(&frac)? * scale
        }
        None => 0,
    };

    hours
        .checked_mul(60)?
        .checked_add(minutes)?
        .checked_mul(60)?
        .checked_add(seconds)?
        .checked_mul(1000)?
        .checked_add(millis)
}

fn parse_digits(text: &str) -> Option<u64> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}
