//! Canadian postal code handling.

use std::sync::LazyLock;

use regex::Regex;

static POSTAL_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[ABCEGHJKLMNPRSTVXY]\d[ABCEGHJ-NPRSTV-Z]\s?\d[ABCEGHJ-NPRSTV-Z]\d$")
        .expect("static postal code pattern")
});

static FIRST_SIX_WORD_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\w{3})(\w{3})").expect("static split pattern"));

pub fn is_valid(value: &str) -> bool {
    POSTAL_CODE.is_match(value.trim())
}

/// Keyup behaviour: uppercase only.
pub fn uppercase(value: &str) -> String {
    value.to_uppercase()
}

/// Submit-time normalization: uppercase, then a space after the third
/// character of the first six-character run (`a1b2c3` becomes `A1B 2C3`).
pub fn normalize(value: &str) -> String {
    let upper = value.to_uppercase();
    FIRST_SIX_WORD_CHARS.replacen(&upper, 1, "$1 $2").into_owned()
}
