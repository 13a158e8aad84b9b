use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PrefixError {
    #[error("プレフィックスに使用できない文字が含まれています: {0:?}")]
    DisallowedChar(char),
}

/// Cleans a metadata string reported by a platform reader so it can be
/// parsed as a date. Control and invisible formatting characters (bidi marks,
/// zero-width spaces, BOM) are dropped, and whitespace runs collapse to one
/// space.
pub fn sanitize_property_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut prev_space = true;

    for ch in value.chars() {
        if ch.is_whitespace() {
            if !prev_space {
                out.push(' ');
                prev_space = true;
            }
            continue;
        }
        if ch.is_control() || is_invisible_format_char(ch) {
            continue;
        }
        out.push(ch);
        prev_space = false;
    }

    if out.ends_with(' ') {
        out.pop();
    }
    out
}

/// Checks an operator-supplied filename prefix. The prefix ends up inside a
/// single path component, so separators and reserved characters are refused.
pub fn validate_prefix(prefix: &str) -> Result<(), PrefixError> {
    if let Some(ch) = prefix.chars().find(|ch| is_disallowed_char(*ch)) {
        return Err(PrefixError::DisallowedChar(ch));
    }
    Ok(())
}

fn is_disallowed_char(ch: char) -> bool {
    matches!(ch, '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|')
        || ch == '\0'
        || ch.is_control()
}

fn is_invisible_format_char(ch: char) -> bool {
    matches!(
        ch,
        '\u{00AD}'
            | '\u{061C}'
            | '\u{180E}'
            | '\u{200B}'..='\u{200F}'
            | '\u{202A}'..='\u{202E}'
            | '\u{2060}'..='\u{2064}'
            | '\u{2066}'..='\u{206F}'
            | '\u{FEFF}'
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_bidi_marks_inside_date() {
        let value = sanitize_property_value("2023\u{200E}:01:01 10:00:00");
        assert_eq!(value, "2023:01:01 10:00:00");
    }

    #[test]
    fn strips_shell_style_marks_and_collapses_whitespace() {
        let raw = "\u{200E}1/\u{200E}15/\u{200E}2023 \u{200F}\u{200E}  10:04\tAM\r\n";
        assert_eq!(sanitize_property_value(raw), "1/15/2023 10:04 AM");
    }

    #[test]
    fn drops_nul_and_bom() {
        assert_eq!(
            sanitize_property_value("\u{FEFF}2023-01-01T10:00:00Z\0"),
            "2023-01-01T10:00:00Z"
        );
    }

    #[test]
    fn empty_after_cleanup() {
        assert_eq!(sanitize_property_value(" \u{200B}\t "), "");
    }

    #[test]
    fn prefix_rejects_separators() {
        assert_eq!(
            validate_prefix("trip/"),
            Err(PrefixError::DisallowedChar('/'))
        );
        assert_eq!(
            validate_prefix("a\\b"),
            Err(PrefixError::DisallowedChar('\\'))
        );
        assert!(validate_prefix("").is_ok());
        assert!(validate_prefix("hokkaido_").is_ok());
    }
}
