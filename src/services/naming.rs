//! File-name conventions used by the shop.
//!
//! Job files are named `ID_COUNT_..._YYYYMMDD.ext`: the first `_` token orders parts on
//! the machine, the second carries the planned detail count, and ready markers end in an
//! eight-character date token. Everything here is best-effort: a name that does not
//! follow the convention simply yields `None`.

use crate::models::DetailCountConvention;
use camino::Utf8Path;

/// Separator between tokens of a file stem
pub const TOKEN_SEPARATOR: char = '_';

/// File name without its last extension.
pub fn file_stem(file_name: &str) -> &str {
    Utf8Path::new(file_name).file_stem().unwrap_or(file_name)
}

/// Last extension, lower-cased, without the dot.
pub fn extension_lowercase(file_name: &str) -> Option<String> {
    Utf8Path::new(file_name)
        .extension()
        .filter(|ext| !ext.is_empty())
        .map(str::to_lowercase)
}

/// Planned detail count from the second token of `stem`, digits only.
pub fn detail_count(stem: &str, convention: DetailCountConvention) -> Option<&str> {
    let tokens: Vec<&str> = stem.split(TOKEN_SEPARATOR).collect();
    if tokens.len() < convention.min_tokens() {
        return None;
    }

    let count = tokens[1];
    if !count.is_empty() && count.chars().all(|c| c.is_ascii_digit()) {
        Some(count)
    } else {
        None
    }
}

/// Last token of `stem` when it is exactly eight characters long.
pub fn ready_date_token(stem: &str) -> Option<&str> {
    stem.rsplit(TOKEN_SEPARATOR)
        .next()
        .filter(|token| token.chars().count() == 8)
}

/// Ready date of a marker file as `YYYY-MM-DD`.
///
/// The token is sliced, not validated: `20231332` becomes `2023-13-32`.
pub fn ready_date(file_name: &str) -> Option<String> {
    let token: Vec<char> = ready_date_token(file_stem(file_name))?.chars().collect();
    let year: String = token[0..4].iter().collect();
    let month: String = token[4..6].iter().collect();
    let day: String = token[6..8].iter().collect();
    Some(format!("{}-{}-{}", year, month, day))
}

/// First token of `stem`, used to order files on the machine.
pub fn sort_key(stem: &str) -> &str {
    stem.split(TOKEN_SEPARATOR).next().unwrap_or(stem)
}

/// Case-insensitive substring test against the stop words.
pub fn has_stop_word<S: AsRef<str>>(name: &str, stop_words: &[S]) -> bool {
    let name = name.to_lowercase();
    stop_words
        .iter()
        .any(|word| name.contains(&word.as_ref().to_lowercase()))
}

/// Case-insensitive substring test for a single marker word.
pub fn contains_word(name: &str, word: &str) -> bool {
    name.to_lowercase().contains(&word.to_lowercase())
}

/// `YYYY-MM-DD` to `YYYYMMDD`, as used in marker file names.
pub fn compact_date(date: &str) -> Option<String> {
    let chars: Vec<char> = date.chars().collect();
    if chars.len() != 10 {
        return None;
    }
    let mut compact = String::with_capacity(8);
    compact.extend(&chars[0..4]);
    compact.extend(&chars[5..7]);
    compact.extend(&chars[8..10]);
    Some(compact)
}

/// `YYYY-MM` prefix of a `YYYY-MM-DD` date.
pub fn month_of(date: &str) -> Option<&str> {
    let (end, _) = date.char_indices().nth(7)?;
    Some(&date[..end])
}
