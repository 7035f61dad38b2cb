//! Text normalization shared by hint extraction and candidate selection.

use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// `à <words>` / `a <words>` marker; group 1 is the first letter after it.
static PLACE_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:^|\s)(?:à|a)\s+(\p{L})").expect("valid regex"));

/// Category and marketing words that precede or trail a place name in
/// listing titles. Compared in folded form.
const MARKETING_WORDS: &[&str] = &[
    "vente",
    "vendre",
    "location",
    "louer",
    "achat",
    "acheter",
    "maison",
    "maisons",
    "appartement",
    "appartements",
    "terrain",
    "terrains",
    "villa",
    "villas",
    "studio",
    "studios",
    "loft",
    "duplex",
    "propriete",
    "proprietes",
    "immobilier",
    "immeuble",
    "annonce",
    "annonces",
    "ferme",
    "longere",
    "chalet",
    "gite",
    "manoir",
    "bastide",
    "piece",
    "pieces",
    "chambre",
    "chambres",
    "superbe",
    "magnifique",
    "charmant",
    "charmante",
    "exceptionnel",
    "exceptionnelle",
];

const MAX_SANITIZE_PASSES: usize = 16;

/// Lowercases and strips diacritical marks: `"Montférrand"` → `"montferrand"`.
#[must_use]
pub fn fold(s: &str) -> String {
    s.to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| if c == '’' { '\'' } else { c })
        .collect()
}

/// Case- and accent-insensitive equality of two place names.
#[must_use]
pub fn same_place(a: &str, b: &str) -> bool {
    fold(&collapse_whitespace(a)) == fold(&collapse_whitespace(b))
}

/// Collapses runs of whitespace into single spaces and trims the ends.
#[must_use]
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Returns the whitespace-collapsed value, or `None` when it is empty.
#[must_use]
pub fn non_blank(s: Option<&str>) -> Option<String> {
    s.map(collapse_whitespace).filter(|v| !v.is_empty())
}

/// Reduces marketing copy to a plausible bare place name.
///
/// `"Vente maison à Montferrand — superbe..."` → `"Montferrand"`.
/// The rules are applied until the value stops changing, so
/// `sanitize_city(sanitize_city(x)) == sanitize_city(x)`.
#[must_use]
pub fn sanitize_city(raw: &str) -> Option<String> {
    let mut current = raw.to_owned();
    for _ in 0..MAX_SANITIZE_PASSES {
        let next = sanitize_once(&current);
        if next == current {
            break;
        }
        current = next;
    }
    (!current.is_empty()).then_some(current)
}

fn sanitize_once(raw: &str) -> String {
    let after_marker = PLACE_MARKER_RE
        .captures_iter(raw)
        .last()
        .and_then(|caps| caps.get(1))
        .map_or(raw, |m| &raw[m.start()..]);

    let without_marketing = strip_marketing_words(after_marker);
    let run = longest_name_run(&without_marketing);

    collapse_whitespace(run)
        .trim_matches(|c: char| c == '-' || c == '\'' || c == '’' || c.is_whitespace())
        .to_owned()
}

/// Drops leading marketing words, then cuts the string at the first
/// marketing word that follows the place name.
fn strip_marketing_words(s: &str) -> String {
    let words: Vec<&str> = s.split_whitespace().collect();
    let start = words.iter().take_while(|w| is_marketing_word(w)).count();
    let rest = &words[start..];
    let end = rest
        .iter()
        .position(|w| is_marketing_word(w))
        .unwrap_or(rest.len());
    rest[..end].join(" ")
}

fn is_marketing_word(word: &str) -> bool {
    let folded = fold(word.trim_matches(|c: char| !c.is_alphanumeric()));
    MARKETING_WORDS.contains(&folded.as_str())
}

fn is_name_char(c: char) -> bool {
    c.is_alphabetic() || c == '\'' || c == '’' || c == '-' || c == ' '
}

/// Longest run of letters, apostrophes, hyphens, and spaces. Ties keep the first.
fn longest_name_run(s: &str) -> &str {
    let mut best = (0usize, 0usize);
    let mut run_start: Option<usize> = None;

    for (idx, c) in s.char_indices().chain(std::iter::once((s.len(), '\0'))) {
        if idx < s.len() && is_name_char(c) {
            run_start.get_or_insert(idx);
            continue;
        }
        if let Some(start) = run_start.take() {
            let len = s[start..idx].chars().count();
            if len > s[best.0..best.1].chars().count() {
                best = (start, idx);
            }
        }
    }

    &s[best.0..best.1]
}

/// Upper-cases the first letter of every space- or hyphen-separated word.
#[must_use]
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if at_word_start {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        at_word_start = c == ' ' || c == '-';
    }
    out
}

/// Minimal HTML entity decoding for text pulled out of markup.
#[must_use]
pub fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_owned();
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail
            .find(';')
            .filter(|&semi| semi <= 10)
            .and_then(|semi| decode_entity(&tail[1..semi]).map(|c| (c, semi)));
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &tail[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        return char::from_u32(code);
    }
    let c = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => ' ',
        "rsquo" => '’',
        "eacute" => 'é',
        "Eacute" => 'É',
        "egrave" => 'è',
        "ecirc" => 'ê',
        "euml" => 'ë',
        "agrave" => 'à',
        "acirc" => 'â',
        "ccedil" => 'ç',
        "icirc" => 'î',
        "iuml" => 'ï',
        "ocirc" => 'ô',
        "ucirc" => 'û',
        "ugrave" => 'ù',
        _ => return None,
    };
    Some(c)
}

#[cfg(test)]
#[path = "text_test.rs"]
mod tests;
