//! Slug generation and validation
//!
//! Slugs identify notes in URLs. Titles may be written in Cyrillic, so
//! generation transliterates before stripping everything that is not
//! URL-safe.

use regex::Regex;
use std::sync::LazyLock;

/// Maximum slug length, matching the title length limit
pub const MAX_SLUG_LENGTH: usize = 100;

static SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-a-zA-Z0-9_]+$").expect("static slug regex"));

/// Transliterate a single lowercase Cyrillic letter to Latin.
fn translit(c: char) -> Option<&'static str> {
    let s = match c {
        'а' => "a",
        'б' => "b",
        'в' => "v",
        'г' => "g",
        'д' => "d",
        'е' => "e",
        'ё' => "yo",
        'ж' => "zh",
        'з' => "z",
        'и' => "i",
        'й' => "j",
        'к' => "k",
        'л' => "l",
        'м' => "m",
        'н' => "n",
        'о' => "o",
        'п' => "p",
        'р' => "r",
        'с' => "s",
        'т' => "t",
        'у' => "u",
        'ф' => "f",
        'х' => "h",
        'ц' => "ts",
        'ч' => "ch",
        'ш' => "sh",
        'щ' => "sch",
        'ъ' => "",
        'ы' => "y",
        'ь' => "",
        'э' => "e",
        'ю' => "yu",
        'я' => "ya",
        _ => return None,
    };
    Some(s)
}

/// Build a slug from a note title.
///
/// Lowercases, transliterates Cyrillic, collapses every run of characters
/// outside `[a-z0-9_-]` into a single `-`, trims dashes from both ends and
/// truncates to [`MAX_SLUG_LENGTH`].
pub fn slugify(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut pending_dash = false;

    fn push(piece: &str, out: &mut String, pending_dash: &mut bool) {
        if piece.is_empty() {
            return;
        }
        if *pending_dash && !out.is_empty() {
            out.push('-');
        }
        *pending_dash = false;
        out.push_str(piece);
    }

    for c in title.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() || c == '_' {
            let mut buf = [0u8; 4];
            push(c.encode_utf8(&mut buf), &mut out, &mut pending_dash);
        } else if let Some(latin) = translit(c) {
            push(latin, &mut out, &mut pending_dash);
        } else {
            // whitespace, '-', punctuation and anything untranslatable
            pending_dash = true;
        }
    }

    out.chars()
        .take(MAX_SLUG_LENGTH)
        .collect::<String>()
        .trim_end_matches('-')
        .to_string()
}

/// Whether `s` can be used as a slug (and therefore as a URL segment).
pub fn is_valid_slug(s: &str) -> bool {
    s.len() <= MAX_SLUG_LENGTH && SLUG_RE.is_match(s)
}
