use std::sync::LazyLock;

use regex::Regex;

static LOWER_UPPER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z])([A-Z])").expect("valid regex"));
static UPPER_LOWER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Z])([a-z])").expect("valid regex"));
static SPACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" +").expect("valid regex"));

/// Turn a camel-case field name into display text: `businessDays` becomes `Business Days`.
pub fn normalize_label(name: &str) -> String {
    let split = LOWER_UPPER.replace_all(name, "$1 $2");
    let split = UPPER_LOWER.replace_all(&split, " $1$2");
    let collapsed = SPACES.replace_all(&split, " ");
    let trimmed = collapsed.trim();

    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
