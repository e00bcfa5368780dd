//! `KEY=VALUE` line files.
//!
//! The single-field version of the line patch: one line is replaced (or
//! appended), every other line is kept byte for byte.

/// Value of the first line starting with `KEY=`.
pub fn get_key<'a>(text: &'a str, key: &str) -> Option<&'a str> {
    text.split('\n').find_map(|line| {
        line.strip_prefix(key)
            .and_then(|rest| rest.strip_prefix('='))
            .map(|value| value.strip_suffix('\r').unwrap_or(value))
    })
}

/// Replace the first `KEY=` line, or append one.
///
/// A replaced line keeps its `\r`. An appended line goes before the final
/// newline so the text still ends the way it did.
pub fn set_key(text: &str, key: &str, value: &str) -> String {
    let prefix = format!("{key}=");
    let mut lines: Vec<String> = text.split('\n').map(str::to_owned).collect();

    if let Some(line) = lines.iter_mut().find(|l| l.starts_with(&prefix)) {
        let cr = if line.ends_with('\r') { "\r" } else { "" };
        *line = format!("{prefix}{value}{cr}");
    } else if text.is_empty() {
        lines = vec![format!("{prefix}{value}")];
    } else if text.ends_with('\n') {
        let at = lines.len() - 1;
        lines.insert(at, format!("{prefix}{value}"));
    } else {
        lines.push(format!("{prefix}{value}"));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAT: &str = "#Mon Jan 01 00:00:00 UTC 2024\nPROFILE_ID=Cracked\nLANGUAGE=en-US\nSLOTS=\n";

    #[test]
    fn test_get_key() {
        assert_eq!(get_key(DAT, "LANGUAGE"), Some("en-US"));
        assert_eq!(get_key(DAT, "SLOTS"), Some(""));
        assert_eq!(get_key(DAT, "MISSING"), None);
        // Prefix of another key does not match.
        assert_eq!(get_key("LANGUAGES=x\n", "LANGUAGE"), None);
    }

    #[test]
    fn test_set_key_in_place() {
        let out = set_key(DAT, "LANGUAGE", "fr-FR");
        assert_eq!(
            out,
            "#Mon Jan 01 00:00:00 UTC 2024\nPROFILE_ID=Cracked\nLANGUAGE=fr-FR\nSLOTS=\n"
        );
    }

    #[test]
    fn test_set_key_first_occurrence_only() {
        let out = set_key("LANGUAGE=a\nLANGUAGE=b", "LANGUAGE", "c");
        assert_eq!(out, "LANGUAGE=c\nLANGUAGE=b");
    }

    #[test]
    fn test_set_key_appends() {
        assert_eq!(set_key("A=1\n", "LANGUAGE", "de"), "A=1\nLANGUAGE=de\n");
        assert_eq!(set_key("A=1", "LANGUAGE", "de"), "A=1\nLANGUAGE=de");
        assert_eq!(set_key("", "LANGUAGE", "de"), "LANGUAGE=de");
    }

    #[test]
    fn test_crlf() {
        let text = "A=1\r\nLANGUAGE=en\r\n";
        assert_eq!(get_key(text, "LANGUAGE"), Some("en"));
        assert_eq!(set_key(text, "LANGUAGE", "ja"), "A=1\r\nLANGUAGE=ja\r\n");
    }
}
