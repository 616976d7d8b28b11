//! English text helpers shared by the rollup and daily summary messages.

/// Joins items the way `Intl.ListFormat('en')` does: `"A"`, `"A and B"`,
/// `"A, B, and C"`.
#[must_use]
pub fn format_list<S: AsRef<str>>(items: &[S]) -> String {
    match items {
        [] => String::new(),
        [only] => only.as_ref().to_string(),
        [first, second] => format!("{} and {}", first.as_ref(), second.as_ref()),
        [init @ .., last] => {
            let head: Vec<&str> = init.iter().map(AsRef::as_ref).collect();
            format!("{}, and {}", head.join(", "), last.as_ref())
        }
    }
}

/// `singular` when `count == 1`, otherwise `plural`.
#[must_use]
pub const fn pluralize<'a>(count: u64, singular: &'a str, plural: &'a str) -> &'a str {
    if count == 1 { singular } else { plural }
}

/// `"1 incident"`, `"3 incidents"`.
#[must_use]
pub fn incident_count(count: u64) -> String {
    format!("{count} {}", pluralize(count, "incident", "incidents"))
}
