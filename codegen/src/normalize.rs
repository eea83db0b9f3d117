//! Registry text → identifier fragment.
//!
//! [`normalize`] is total and deterministic. It never fails; text that
//! yields nothing usable becomes [`UNDEFINED_NAME`] and the caller records a
//! diagnostic.

/// Fallback identifier for empty or degenerate descriptions.
pub const UNDEFINED_NAME: &str = "undefinedName";

/// Characters folded into token separators.
fn is_separator(c: char) -> bool {
    matches!(
        c,
        ',' | '-' | '\u{2013}' | '\u{2014}' | '.' | '&' | '/' | '\\' | '"' | '\u{201C}' | '\u{201D}'
    ) || c.is_whitespace()
}

/// Characters removed outright.
fn is_stripped(c: char) -> bool {
    matches!(
        c,
        '(' | ')' | '[' | ']' | '{' | '}' | '\'' | '\u{2018}' | '\u{2019}' | '`'
    )
}

/// Turns raw descriptive text into an identifier fragment.
///
/// Separators become single underscores, except one directly after a
/// leading letter (`"X Band"` → `XBand`). Brackets and apostrophes are
/// dropped, operator glyphs are spelled out, and a leading digit gains an
/// underscore prefix.
///
/// ```
/// use disenum_codegen::normalize::normalize;
///
/// assert_eq!(normalize("Fixed Wing Aircraft"), "Fixed_Wing_Aircraft");
/// assert_eq!(normalize("X-Band"), "XBand");
/// assert_eq!(normalize("Range >= 10%"), "Range_GTE_10pct");
/// assert_eq!(normalize("737 (passenger)"), "_737_passenger");
/// assert_eq!(normalize("  "), "undefinedName");
/// ```
#[must_use]
pub fn normalize(raw: &str) -> String {
    // 1. separators
    let folded: String = raw
        .chars()
        .map(|c| if is_separator(c) { ' ' } else { c })
        .collect();
    let mut s = folded.split_whitespace().collect::<Vec<_>>().join("_");

    // 2. no divider after a leading letter
    let mut chars = s.chars();
    if let (Some(first), Some('_')) = (chars.next(), chars.next()) {
        if first.is_alphabetic() {
            s = format!("{first}{}", chars.as_str());
        }
    }

    // 3. brackets and apostrophes
    s.retain(|c| !is_stripped(c));

    // 4. plus, underscore runs
    s = s.replace('+', "PLUS");
    s = collapse_underscores(&s);

    // 5. operator glyphs
    s = s
        .replace("<=", "LTE")
        .replace(">=", "GTE")
        .replace('<', "LT")
        .replace('>', "GT")
        .replace('=', "EQ")
        .replace('%', "pct");

    s.retain(|c| c.is_ascii_alphanumeric() || c == '_');
    let s = collapse_underscores(&s);
    let s = s.trim_matches('_');

    // 6. digit-leading guard
    let s = match s.chars().next() {
        Some(c) if c.is_ascii_digit() => format!("_{s}"),
        _ => s.to_string(),
    };

    // 7. fallback
    if s.is_empty() || s == "_" {
        UNDEFINED_NAME.to_string()
    } else {
        s
    }
}

/// Returns true when the identifier carries no letters: only digits and
/// underscores, ignoring a leading underscore.
#[must_use]
pub fn is_numeric(s: &str) -> bool {
    let core = s.trim_start_matches('_');
    !core.is_empty()
        && core.chars().any(|c| c.is_ascii_digit())
        && core.chars().all(|c| c.is_ascii_digit() || c == '_')
}

fn collapse_underscores(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_underscore = false;
    for c in s.chars() {
        if c == '_' {
            if !prev_underscore {
                out.push(c);
            }
            prev_underscore = true;
        } else {
            out.push(c);
            prev_underscore = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separators_become_underscores() {
        assert_eq!(normalize("Entity State"), "Entity_State");
        assert_eq!(normalize("Munition, Guided / Unguided"), "Munition_Guided_Unguided");
        assert_eq!(normalize("Air\u{2013}to\u{2014}Air"), "Air_to_Air");
        assert_eq!(normalize("  Tank   Destroyer  "), "Tank_Destroyer");
        assert_eq!(normalize("Fixed_Wing"), "Fixed_Wing");
    }

    #[test]
    fn single_letter_prefix_is_joined() {
        assert_eq!(normalize("X Band"), "XBand");
        assert_eq!(normalize("M-1 Abrams"), "M1_Abrams");
    }

    #[test]
    fn brackets_and_apostrophes_are_stripped() {
        assert_eq!(normalize("Cote d'Ivoire"), "Cote_dIvoire");
        assert_eq!(normalize("Heavy [Tracked]"), "Heavy_Tracked");
        assert_eq!(normalize("(Reserved)"), "Reserved");
    }

    #[test]
    fn operators_are_spelled_out() {
        assert_eq!(normalize("A+"), "APLUS");
        assert_eq!(normalize("Speed < 5"), "Speed_LT_5");
        assert_eq!(normalize("Speed > 5"), "Speed_GT_5");
        assert_eq!(normalize("Speed <= 5"), "Speed_LTE_5");
        assert_eq!(normalize("Mode = Auto"), "Mode_EQ_Auto");
        assert_eq!(normalize("50% Duty"), "_50pct_Duty");
    }

    #[test]
    fn digit_leading_text_gets_prefix() {
        assert_eq!(normalize("0"), "_0");
        assert_eq!(normalize("2.5 kHz"), "_2_5_kHz");
    }

    #[test]
    fn degenerate_text_falls_back() {
        assert_eq!(normalize(""), UNDEFINED_NAME);
        assert_eq!(normalize("---"), UNDEFINED_NAME);
        assert_eq!(normalize("()"), UNDEFINED_NAME);
        assert_eq!(normalize("_"), UNDEFINED_NAME);
    }

    #[test]
    fn numeric_detection() {
        assert!(is_numeric("_0"));
        assert!(is_numeric("12_0"));
        assert!(!is_numeric("_"));
        assert!(!is_numeric("Fixed_Wing_0"));
        assert!(!is_numeric(UNDEFINED_NAME));
    }

    #[test]
    fn normalization_is_idempotent_on_its_output() {
        for raw in ["Entity State", "0", "X Band", "Cote d'Ivoire", "A+", "", "2.5 kHz"] {
            let once = normalize(raw);
            assert_eq!(normalize(&once), once, "not idempotent for {raw:?}");
        }
    }
}
