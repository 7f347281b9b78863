use crate::record::Field;
use regex::Regex;
use std::sync::LazyLock;

/// Characters stripped before numeric parsing: the lira sign plus the
/// letters of "try"/"TRY" (suffix markers like "1.250,00 TL" or "45 try").
fn is_currency_marker(c: char) -> bool {
    matches!(c, '₺' | 't' | 'r' | 'y' | 'T' | 'R' | 'Y')
}

/// Locale-aware numeric parsing for price/quantity cells.
///
/// Turkish spreadsheets mix "1.234,56", "1234,56" and plain "1234.56".
/// When both separators are present the dot is a thousands separator;
/// a lone comma is the decimal point.
pub fn parse_number(raw: &str) -> Option<f64> {
    let stripped: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && !is_currency_marker(*c))
        .collect();
    if stripped.is_empty() {
        return None;
    }
    let has_comma = stripped.contains(',');
    let has_dot = stripped.contains('.');
    let normalised = if has_comma && has_dot {
        stripped.replace('.', "").replace(',', ".")
    } else if has_comma {
        stripped.replace(',', ".")
    } else {
        stripped
    };
    normalised.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Numeric value of a cell: native numbers pass straight through,
/// text goes through `parse_number`.
pub fn field_number(field: &Field) -> Option<f64> {
    match field {
        Field::Number(value) => value.is_finite().then_some(*value),
        Field::Text(text) => parse_number(text),
        Field::Empty => None,
    }
}

/// Turkish case folding: dotted/dotless I pairs fold the Turkish way,
/// everything else uses the standard lowercase mapping.
fn tr_lowercase(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            'I' => out.push('ı'),
            'İ' => out.push('i'),
            _ => out.extend(c.to_lowercase()),
        }
    }
    out
}

fn is_match_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, 'ç' | 'ğ' | 'ı' | 'ö' | 'ş' | 'ü')
}

/// Comparison key for all fuzzy matching: Turkish-folded lowercase,
/// everything outside the letter/digit allow-list collapsed to single
/// spaces, trimmed. Two strings match when their keys are equal or one
/// contains the other.
pub fn normalise_for_match(text: &str) -> String {
    let replaced: String = tr_lowercase(text)
        .chars()
        .map(|c| if is_match_char(c) { c } else { ' ' })
        .collect();
    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

static SKU_SEPARATOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z0-9ÇĞİÖŞÜ]+(?:[-_./][A-Z0-9ÇĞİÖŞÜ]+)+$").unwrap()
});

/// Shape heuristic: does this token read as a product code rather than
/// a descriptive name? Anything with embedded whitespace is descriptive.
pub fn looks_like_sku(text: &str) -> bool {
    let token = text.trim();
    if token.is_empty() || token.chars().any(char::is_whitespace) {
        return false;
    }
    let len = token.chars().count();
    if len <= 3 {
        return true;
    }
    let letters = token.chars().filter(|c| c.is_alphabetic()).count();
    let digits = token.chars().filter(|c| c.is_ascii_digit()).count();
    if letters > 0 && digits > 0 && letters <= 3 {
        return true;
    }
    if digits == 0
        && (2..=4).contains(&len)
        && token.chars().all(|c| c.is_alphabetic() && c.is_uppercase())
    {
        return true;
    }
    SKU_SEPARATOR_RE.is_match(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_forms_agree() {
        for form in ["1.234,56", "1234.56", "1234,56", "1234.56 ₺"] {
            assert_eq!(parse_number(form), Some(1234.56), "form: {form}");
        }
    }

    #[test]
    fn currency_markers_are_stripped() {
        assert_eq!(parse_number("1.250,00 TL"), Some(1250.0));
        assert_eq!(parse_number("45 try"), Some(45.0));
        assert_eq!(parse_number("₺99,90"), Some(99.9));
    }

    #[test]
    fn non_numbers_fail() {
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("Plastik Boru"), None);
        assert_eq!(parse_number("12,34,56"), None);
    }

    #[test]
    fn native_numbers_pass_through() {
        assert_eq!(field_number(&Field::Number(42.5)), Some(42.5));
        assert_eq!(field_number(&Field::Text("42,5".into())), Some(42.5));
        assert_eq!(field_number(&Field::Empty), None);
    }

    #[test]
    fn turkish_case_folding() {
        assert_eq!(normalise_for_match("IŞIK"), "ışık");
        assert_eq!(normalise_for_match("İstanbul"), "istanbul");
    }

    #[test]
    fn punctuation_collapses_to_single_spaces() {
        assert_eq!(
            normalise_for_match("  Kırmızı -- Boru / 20mm  "),
            "kırmızı boru 20mm"
        );
    }

    #[test]
    fn sku_shapes() {
        // short tokens are always codes
        assert!(looks_like_sku("A12"));
        assert!(looks_like_sku("7,5"));
        // mixed letters+digits with few letters
        assert!(looks_like_sku("AB1234"));
        // all-uppercase short token without digits
        assert!(looks_like_sku("PPRC"));
        // separator-joined uppercase alnum
        assert!(looks_like_sku("A-102"));
        assert!(looks_like_sku("PL/200-X"));
        // descriptive text
        assert!(!looks_like_sku("Galvanized Elbow"));
        assert!(!looks_like_sku("Kırmızı"));
        assert!(!looks_like_sku("radyatör"));
        assert!(!looks_like_sku(""));
    }
}
