use std::collections::HashSet;

/// Sample invoices carry this prefix in front of the numeric part.
pub const SAMPLE_PREFIX: &str = "S-";

/// Leading run of digits in an invoice number, ignoring an `S-` prefix and
/// anything after the digits. `None` when there are no digits or the run
/// does not fit in a `u64`.
pub fn extract_number(number: &str) -> Option<u64> {
    let trimmed = number.trim();
    let rest = trimmed.strip_prefix(SAMPLE_PREFIX).unwrap_or(trimmed);
    let start = rest.find(|c: char| c.is_ascii_digit())?;
    let digits: String = rest[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Next free invoice number: one past the largest numeric part in use,
/// bumped further while that exact string is already taken.
pub fn next_number_from<I, S>(existing: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut used = HashSet::new();
    let mut max = 0u64;
    for number in existing {
        let number = number.as_ref();
        if let Some(n) = extract_number(number) {
            max = max.max(n);
        }
        used.insert(number.trim().to_string());
    }

    let mut candidate = max.saturating_add(1);
    while used.contains(&candidate.to_string()) {
        match candidate.checked_add(1) {
            Some(next) => candidate = next,
            None => break,
        }
    }
    candidate.to_string()
}
