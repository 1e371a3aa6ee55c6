// Identifier and literal codec
//
// MySQL string literals use C-style escapes and may carry NUL bytes; SQLite
// literals support neither. Everything that turns a MySQL literal or name
// into SQLite text goes through here.

use chrono::{NaiveDate, NaiveTime};

/// Zero-date sentinel MySQL stores for invalid datetimes
pub const ZERO_DATETIME: &str = "0000-00-00 00:00:00";

/// Quote an identifier with backticks
/// e.g., users → `users`, we`ird → `we``ird`
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Strip a bounding quote pair and un-double embedded quotes.
///
/// The first character decides the quote style; text that is not quoted
/// by one of `` ` ``, `"` or `'` is returned unchanged.
pub fn unquote_identifier(text: &str) -> String {
    let trimmed = text.trim();
    let mut chars = trimmed.chars();
    let first = match chars.next() {
        Some(c @ ('`' | '"' | '\'')) => c,
        _ => return trimmed.to_string(),
    };
    if trimmed.len() < 2 || !trimmed.ends_with(first) {
        return trimmed.to_string();
    }
    let inner = &trimmed[1..trimmed.len() - 1];
    let doubled: String = [first, first].iter().collect();
    inner.replace(&doubled, &first.to_string())
}

/// Quote a plain string value for SQLite (no escape processing)
pub fn quote_string(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Translate the raw body of a MySQL string literal to a SQLite expression.
///
/// `raw` is the literal content with its bounding quotes removed but with
/// every escape sequence still in place.
pub fn translate_string_literal(raw: &str, quote: char) -> String {
    let mut value = unescape_string_content(raw, quote);

    // Timestamps are normalized so that lookups against stored values match
    if value.chars().count() >= 19 && value.starts_with(|c: char| c.is_ascii_digit()) {
        value = translate_datetime_literal(&value);
    }

    encode_nul_bytes(&value)
}

/// Resolve MySQL escaping inside a literal body, keeping `\%` and `\_`.
pub fn unescape_string_content(raw: &str, quote: char) -> String {
    let protected = protect_wildcard_escapes(raw);
    let doubled: String = [quote, quote].iter().collect();
    let undoubled = protected.replace(&doubled, &quote.to_string());
    c_unescape(&undoubled)
}

/// MySQL keeps the backslash in `\%` and `\_`, unlike any other escape.
/// An odd run of backslashes before a wildcard gets one more so the
/// backslash survives the C-style unescape step.
fn protect_wildcard_escapes(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 4);
    let mut run = 0usize;
    for ch in raw.chars() {
        if ch == '\\' {
            run += 1;
            out.push(ch);
            continue;
        }
        if (ch == '%' || ch == '_') && run % 2 == 1 {
            out.push('\\');
        }
        run = 0;
        out.push(ch);
    }
    out
}

fn c_unescape(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    let mut out = String::with_capacity(value.len());
    let mut i = 0;
    while i < chars.len() {
        let ch = chars[i];
        if ch != '\\' || i + 1 == chars.len() {
            out.push(ch);
            i += 1;
            continue;
        }
        let next = chars[i + 1];
        i += 2;
        match next {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'a' => out.push('\x07'),
            'v' => out.push('\x0B'),
            'b' => out.push('\x08'),
            'f' => out.push('\x0C'),
            'x' if i < chars.len() && chars[i].is_ascii_hexdigit() => {
                let mut code = 0u32;
                let mut taken = 0;
                while taken < 2 && i < chars.len() && chars[i].is_ascii_hexdigit() {
                    code = code * 16 + chars[i].to_digit(16).unwrap_or(0);
                    i += 1;
                    taken += 1;
                }
                out.push(char::from(code as u8));
            }
            '0'..='7' => {
                let mut code = next.to_digit(8).unwrap_or(0);
                let mut taken = 1;
                while taken < 3 && i < chars.len() && ('0'..='7').contains(&chars[i]) {
                    code = code * 8 + chars[i].to_digit(8).unwrap_or(0);
                    i += 1;
                    taken += 1;
                }
                out.push(char::from((code & 0xFF) as u8));
            }
            other => out.push(other),
        }
    }
    out
}

/// Split on NUL bytes and re-join them with CHAR(0).
/// SQLite cannot carry a NUL inside a single string literal.
fn encode_nul_bytes(value: &str) -> String {
    if !value.contains('\0') {
        return quote_string(value);
    }
    let parts: Vec<String> = value.split('\0').map(quote_string).collect();
    format!("({})", parts.join(" || CHAR(0) || "))
}

/// Normalize a datetime-looking literal.
///
/// "2016-01-15T00:00:00Z" becomes "2016-01-15 00:00:00". A datetime whose
/// date or time part is not a real value becomes the zero sentinel, like
/// MySQL's truncation of invalid dates.
pub fn translate_datetime_literal(value: &str) -> String {
    let mut value = value.to_string();

    if value.len() == 20 && value.ends_with('Z') && value.as_bytes().get(10) == Some(&b'T') {
        let (date, time) = (&value[..10], &value[11..19]);
        if is_datetime_shape(date, time) {
            value = format!("{} {}", date, time);
        }
    }

    if value.len() == 19 && value.as_bytes().get(10) == Some(&b' ') {
        let (date, time) = (&value[..10], &value[11..]);
        if is_datetime_shape(date, time) && value != ZERO_DATETIME && !is_valid_datetime(date, time)
        {
            value = ZERO_DATETIME.to_string();
        }
    }

    value
}

// Matches \d{4}-\d{2}-\d{2} and \d{2}:\d{2}:\d{2}
fn is_datetime_shape(date: &str, time: &str) -> bool {
    let shape = |s: &str, pattern: &str| {
        s.len() == pattern.len()
            && s.bytes().zip(pattern.bytes()).all(|(c, p)| match p {
                b'd' => c.is_ascii_digit(),
                _ => c == p,
            })
    };
    shape(date, "dddd-dd-dd") && shape(time, "dd:dd:dd")
}

fn is_valid_datetime(date: &str, time: &str) -> bool {
    let field = |s: &str| s.parse::<u32>().unwrap_or(u32::MAX);
    let year = date[..4].parse::<i32>().unwrap_or(0);
    let valid_date = NaiveDate::from_ymd_opt(year, field(&date[5..7]), field(&date[8..10])).is_some();
    let valid_time =
        NaiveTime::from_hms_opt(field(&time[..2]), field(&time[3..5]), field(&time[6..8])).is_some();
    valid_date && valid_time
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========== Identifiers ==========

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("users"), "`users`");
        assert_eq!(quote_identifier("we`ird"), "`we``ird`");
    }

    #[test]
    fn test_unquote_identifier() {
        assert_eq!(unquote_identifier("`users`"), "users");
        assert_eq!(unquote_identifier("`we``ird`"), "we`ird");
        assert_eq!(unquote_identifier("\"a\"\"b\""), "a\"b");
        assert_eq!(unquote_identifier("plain"), "plain");
        // Mismatched quotes are left alone
        assert_eq!(unquote_identifier("`abc\""), "`abc\"");
    }

    // ========== String literals ==========

    #[test]
    fn test_plain_literal() {
        assert_eq!(translate_string_literal("abc", '\''), "'abc'");
    }

    #[test]
    fn test_doubled_quotes_are_collapsed_then_requoted() {
        assert_eq!(translate_string_literal("it''s", '\''), "'it''s'");
        assert_eq!(translate_string_literal("say \"\"hi\"\"", '"'), "'say \"hi\"'");
    }

    #[test]
    fn test_c_style_escapes() {
        assert_eq!(translate_string_literal("a\\nb", '\''), "'a\nb'");
        assert_eq!(translate_string_literal("a\\'b", '\''), "'a''b'");
        assert_eq!(translate_string_literal("\\x41", '\''), "'A'");
        assert_eq!(translate_string_literal("\\q", '\''), "'q'");
    }

    #[test]
    fn test_wildcard_escapes_keep_backslash() {
        assert_eq!(translate_string_literal("a\\%b", '\''), "'a\\%b'");
        assert_eq!(translate_string_literal("a\\_b", '\''), "'a\\_b'");
        // Escaped backslash followed by a real wildcard
        assert_eq!(translate_string_literal("a\\\\%", '\''), "'a\\%'");
    }

    #[test]
    fn test_nul_bytes_are_concatenated() {
        assert_eq!(
            translate_string_literal("a\\0b", '\''),
            "('a' || CHAR(0) || 'b')"
        );
    }

    // ========== Datetime ==========

    #[test]
    fn test_iso_datetime_is_normalized() {
        assert_eq!(
            translate_datetime_literal("2016-01-15T00:00:00Z"),
            "2016-01-15 00:00:00"
        );
    }

    #[test]
    fn test_invalid_date_is_truncated() {
        assert_eq!(translate_datetime_literal("2022-31-01 14:24:12"), ZERO_DATETIME);
        assert_eq!(translate_datetime_literal("2020-12-41 14:15:27"), ZERO_DATETIME);
        assert_eq!(translate_datetime_literal("2022-02-30 10:00:00"), ZERO_DATETIME);
    }

    #[test]
    fn test_valid_date_passes_through() {
        assert_eq!(
            translate_datetime_literal("2022-01-01 14:24:12"),
            "2022-01-01 14:24:12"
        );
        assert_eq!(translate_datetime_literal(ZERO_DATETIME), ZERO_DATETIME);
        // Not a datetime at all
        assert_eq!(
            translate_datetime_literal("1234567890123456789012"),
            "1234567890123456789012"
        );
    }

    #[test]
    fn test_literal_pipeline_applies_datetime_rules() {
        assert_eq!(
            translate_string_literal("2022-31-01 14:24:12", '\''),
            "'0000-00-00 00:00:00'"
        );
    }
}
