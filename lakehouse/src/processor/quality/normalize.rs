use arrow::array::StringArray;
use once_cell::sync::Lazy;
use regex::Regex;

static SEPARATOR_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[-\s]+").expect("Invalid separator regex"));

const SYNONYMS: [(&str, &str); 4] = [
    ("brew_pub", "brewpub"),
    ("beer_garden", "beergarden"),
    ("beer-garden", "beergarden"),
    ("beer garden", "beergarden"),
];

// Tokens the upstream feed uses for "no category".
const GARBAGE_TOKENS: [&str; 2] = ["location", ""];

/// Canonical form of a raw `brewery_type`, or `None` when the value carries no
/// category at all. Applying it twice gives the same result as once.
pub fn normalize_brewery_type(raw: Option<&str>) -> Option<String> {
    let lowered = raw.unwrap_or_default().to_lowercase();
    let collapsed = SEPARATOR_RUNS.replace_all(lowered.trim(), "_");

    let canonical = SYNONYMS
        .iter()
        .find(|(from, _)| *from == collapsed)
        .map(|(_, to)| (*to).to_string())
        .unwrap_or_else(|| collapsed.into_owned());

    if GARBAGE_TOKENS.contains(&canonical.as_str()) {
        None
    } else {
        Some(canonical)
    }
}

pub fn normalize_brewery_type_column(column: &StringArray) -> StringArray {
    column.iter().map(normalize_brewery_type).collect()
}
