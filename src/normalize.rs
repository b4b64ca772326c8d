// 🔤 Text Normalizer
// Diacritic folding, markup cleanup, and the amount parse/format helpers
// shared by every section extractor.

use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref BREAK_TAG: Regex = Regex::new(r"(?i)<br\s*/?>").unwrap();
    static ref PARAGRAPH_TAG: Regex = Regex::new(r"(?i)<p(\s[^>]*)?>").unwrap();
    static ref ANCHOR: Regex =
        Regex::new(r#"(?is)<a\s[^>]*?href="([^"]*)"[^>]*>(.*?)</a>"#).unwrap();
    static ref ANY_TAG: Regex = Regex::new(r"<[^>]+>").unwrap();
    static ref LINE_BREAKS: Regex = Regex::new(r"[\r\n]+").unwrap();
    static ref SPACES: Regex = Regex::new(r" +").unwrap();
    static ref WHITESPACE_RUN: Regex = Regex::new(r"\s\s+").unwrap();
}

// ============================================================================
// FOLDING + MARKUP
// ============================================================================

/// Strip combining marks after NFD decomposition and uppercase.
///
/// `"Όνομα"` → `"ΟΝΟΜΑ"`. Empty input stays empty.
pub fn to_uppercase_fold(s: &str) -> String {
    if s.is_empty() {
        return String::new();
    }

    s.nfd()
        .filter(|c| !('\u{0300}'..='\u{036f}').contains(c))
        .collect::<String>()
        .to_uppercase()
}

/// Remove HTML artifacts, keeping anchors as inline `(Link->href)` notes.
pub fn normalize_markup(s: &str) -> String {
    let text = s.trim();

    let text = BREAK_TAG.replace_all(text, "\n");
    let text = PARAGRAPH_TAG.replace_all(&text, "\n");
    // Anchors go before generic stripping, otherwise the href is lost
    let text = ANCHOR.replace_all(&text, " ${2} (Link->${1}) ");
    let text = ANY_TAG.replace_all(&text, "");
    let text = LINE_BREAKS.replace_all(&text, "\n\n");
    let text = SPACES.replace_all(&text, " ");

    text.into_owned()
}

/// Flatten one extracted table cell for the auxiliary dump
pub fn normalize_cell(s: &str) -> String {
    let flat = s.replace(['\r', '\n'], " ");
    let flat = flat.trim()
        .replace('\\', " ")
        .replace('/', " / ")
        .replace('=', " = ");
    let flat = WHITESPACE_RUN.replace_all(&flat, " ");

    normalize_markup(&to_uppercase_fold(&flat))
}

// ============================================================================
// AMOUNTS
// ============================================================================

/// Parse an amount cell.
///
/// The form prints `1.234,56`; hand-filled or re-exported tables sometimes
/// carry `1234.56`. Both are accepted. With a single separator, a dot
/// followed by exactly three digits is a thousands mark (`1.500` = 1500)
/// when 1-3 non-zero leading digits precede it; `0.125` stays a fraction.
/// Parenthesised or leading-minus values are negative. `None` when the cell
/// holds no digits.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let negative = trimmed.starts_with('-')
        || (trimmed.starts_with('(') && trimmed.ends_with(')'));

    let kept: String = trimmed
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();

    if !kept.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let canonical = match (kept.rfind(','), kept.rfind('.')) {
        (Some(comma), Some(dot)) if comma > dot => kept.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => kept.replace(',', ""),
        (Some(_), None) => {
            if kept.matches(',').count() > 1 {
                kept.replace(',', "")
            } else {
                kept.replace(',', ".")
            }
        }
        (None, Some(dot)) => {
            let decimals = kept.len() - dot - 1;
            let integer = &kept[..dot];
            let grouped = decimals == 3
                && (1..=3).contains(&integer.len())
                && !integer.starts_with('0');
            if kept.matches('.').count() > 1 || grouped {
                kept.replace('.', "")
            } else {
                kept
            }
        }
        (None, None) => kept,
    };

    let value: f64 = canonical.parse().ok()?;
    Some(if negative { -value } else { value })
}

/// Amount or zero, the way the subtotal sums treat blank cells
pub fn amount_or_zero(raw: &str) -> f64 {
    parse_amount(raw).unwrap_or(0.0)
}

/// `1234.5` → `"1,234.50"`
pub fn format_number(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let is_zero = int_part.chars().all(|c| c == '0') && frac_part.chars().all(|c| c == '0');
    let sign = if value < 0.0 && !is_zero { "-" } else { "" };

    format!("{}{}.{}", sign, grouped, frac_part)
}

/// `1234.5` → `"1,234.50 €"`
pub fn format_money(value: f64) -> String {
    format!("{} €", format_number(value))
}

// ============================================================================
// TESTS
// ============================================================================
