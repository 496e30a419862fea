//! Dialpad input handling

/// Keys on the dialpad with the letters printed under them
pub const DIALPAD_KEYS: [(&str, &str); 12] = [
    ("1", ""),
    ("2", "ABC"),
    ("3", "DEF"),
    ("4", "GHI"),
    ("5", "JKL"),
    ("6", "MNO"),
    ("7", "PQRS"),
    ("8", "TUV"),
    ("9", "WXYZ"),
    ("*", ""),
    ("0", "+"),
    ("#", ""),
];

const CLIENT_PREFIX: &str = "client:";

/// Clean up whatever was typed or pasted into the number field.
/// `client:` addresses, and a `client:` prefix still being typed, are kept
/// verbatim. Anything else keeps digits and a leading `+`.
pub fn sanitize_input(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with(CLIENT_PREFIX) {
        return trimmed.to_string();
    }

    let lowered = trimmed.to_ascii_lowercase();
    if !lowered.is_empty() && CLIENT_PREFIX.starts_with(lowered.as_str()) {
        return lowered;
    }

    let mut cleaned = String::with_capacity(trimmed.len());
    for c in trimmed.chars() {
        if c.is_ascii_digit() || (c == '+' && cleaned.is_empty()) {
            cleaned.push(c);
        }
    }
    cleaned
}

/// North American display format: `(555) 123-4567`
pub fn format_phone_number(number: &str) -> String {
    let cleaned: String = number.chars().filter(|c| c.is_ascii_digit()).collect();

    match cleaned.len() {
        0..=3 => cleaned,
        4..=6 => format!("({}) {}", &cleaned[..3], &cleaned[3..]),
        len => format!(
            "({}) {}-{}",
            &cleaned[..3],
            &cleaned[3..6],
            &cleaned[6..len.min(10)]
        ),
    }
}

/// What the number field shows for the current input.
/// Only a plain national number of up to ten digits is formatted; the field
/// is read back through [`sanitize_input`], so nothing may be hidden.
pub fn display_number(input: &str) -> String {
    if input.len() <= 10 && input.chars().all(|c| c.is_ascii_digit()) {
        format_phone_number(input)
    } else {
        input.to_string()
    }
}

/// Format phone number to E.164 format (+1XXXXXXXXXX for US)
pub fn format_e164(number: &str) -> String {
    let cleaned: String = number
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect();

    if cleaned.starts_with('+') {
        return cleaned;
    }

    if cleaned.len() == 10 {
        return format!("+1{}", cleaned);
    }

    if cleaned.len() == 11 && cleaned.starts_with('1') {
        return format!("+{}", cleaned);
    }

    format!("+{}", cleaned)
}

/// The `To` parameter for a call from the current input, if it is dialable
pub fn dial_target(input: &str) -> Option<String> {
    let input = input.trim();
    if let Some(identity) = input.strip_prefix(CLIENT_PREFIX) {
        return (!identity.trim().is_empty()).then(|| input.to_string());
    }

    if input.chars().any(|c| c.is_ascii_digit()) {
        Some(format_e164(input))
    } else {
        None
    }
}
