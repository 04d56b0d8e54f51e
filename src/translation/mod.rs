use std::borrow::Cow;

mod parsers;
mod scanner;

use parsers::{closes_quote, is_block_comment_end, is_block_comment_start, is_line_comment_start};
use scanner::{State, scan_identifier};

/// Rewrite `@name` parameter references into positional `@P<n>` placeholders.
///
/// `names` are bare parameter names in binding order; the first name becomes
/// `@P1`. References inside string literals, quoted or bracketed identifiers and
/// comments are left alone, as are `@@` system functions and variables that are
/// not in `names` (for example ones declared by the script itself). Names
/// match case-insensitively, as variables do under SQL Server's default collation.
///
/// ```rust
/// use sql_dal::translation::translate_named_parameters;
///
/// let sql = "UPDATE t SET a = @a, note = '@a' WHERE id = @id -- @id";
/// let out = translate_named_parameters(sql, &["id", "a"]);
/// assert_eq!(out, "UPDATE t SET a = @P2, note = '@a' WHERE id = @P1 -- @id");
/// ```
/// Returns a borrowed `Cow` when nothing was rewritten.
#[must_use]
pub fn translate_named_parameters<'a>(sql: &'a str, names: &[&str]) -> Cow<'a, str> {
    if names.is_empty() {
        return Cow::Borrowed(sql);
    }

    let bytes = sql.as_bytes();
    let mut out: Option<String> = None;
    let mut copied = 0;
    let mut state = State::Normal;
    let mut idx = 0;

    while idx < bytes.len() {
        let b = bytes[idx];
        match state {
            State::Normal => match b {
                b'\'' => state = State::SingleQuoted,
                b'"' => state = State::DoubleQuoted,
                b'[' => state = State::Bracketed,
                _ if is_line_comment_start(bytes, idx) => state = State::LineComment,
                _ if is_block_comment_start(bytes, idx) => {
                    state = State::BlockComment(1);
                    idx += 1;
                }
                b'@' if bytes.get(idx + 1) == Some(&b'@') => {
                    idx = scan_identifier(bytes, idx + 2);
                    continue;
                }
                b'@' => {
                    let end = scan_identifier(bytes, idx + 1);
                    let name = &sql[idx + 1..end];
                    if let Some(pos) = names.iter().position(|candidate| same_name(candidate, name)) {
                        let buf = out.get_or_insert_with(|| String::with_capacity(sql.len() + 8));
                        buf.push_str(&sql[copied..idx]);
                        buf.push_str("@P");
                        buf.push_str(&(pos + 1).to_string());
                        copied = end;
                    }
                    idx = end.max(idx + 1);
                    continue;
                }
                _ => {}
            },
            State::SingleQuoted => match closes_quote(bytes, idx, b'\'') {
                Some(true) => state = State::Normal,
                Some(false) => idx += 1, // escaped quote
                None => {}
            },
            State::DoubleQuoted => match closes_quote(bytes, idx, b'"') {
                Some(true) => state = State::Normal,
                Some(false) => idx += 1,
                None => {}
            },
            State::Bracketed => match closes_quote(bytes, idx, b']') {
                Some(true) => state = State::Normal,
                Some(false) => idx += 1,
                None => {}
            },
            State::LineComment => {
                if b == b'\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment(depth) => {
                if is_block_comment_start(bytes, idx) {
                    state = State::BlockComment(depth + 1);
                    idx += 1;
                } else if is_block_comment_end(bytes, idx) {
                    state = if depth == 1 {
                        State::Normal
                    } else {
                        State::BlockComment(depth - 1)
                    };
                    idx += 1;
                }
            }
        }
        idx += 1;
    }

    match out {
        Some(mut buf) => {
            buf.push_str(&sql[copied..]);
            Cow::Owned(buf)
        }
        None => Cow::Borrowed(sql),
    }
}

/// T-SQL variable names compare case-insensitively.
fn same_name(candidate: &str, name: &str) -> bool {
    if candidate.is_ascii() && name.is_ascii() {
        candidate.eq_ignore_ascii_case(name)
    } else {
        candidate.to_lowercase() == name.to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_in_binding_order() {
        let sql = "INSERT INTO t(x, y) VALUES(@y, @x)";
        let res = translate_named_parameters(sql, &["x", "y"]);
        assert_eq!(res, "INSERT INTO t(x, y) VALUES(@P2, @P1)");
    }

    #[test]
    fn repeated_references_share_a_placeholder() {
        let sql = "SELECT @x + @x";
        assert_eq!(translate_named_parameters(sql, &["x"]), "SELECT @P1 + @P1");
    }

    #[test]
    fn skips_literals_identifiers_and_comments() {
        let sql = "SELECT '@x', 'it''s @x', [@x], \"@x\" /* @x /* @x */ */ -- @x\nFROM t WHERE a = @x";
        let res = translate_named_parameters(sql, &["x"]);
        assert_eq!(
            res,
            "SELECT '@x', 'it''s @x', [@x], \"@x\" /* @x /* @x */ */ -- @x\nFROM t WHERE a = @P1"
        );
    }

    #[test]
    fn leaves_system_functions_and_unknown_variables() {
        let sql = "DECLARE @n int = @@ROWCOUNT; SELECT @n, @name";
        let res = translate_named_parameters(sql, &["name"]);
        assert_eq!(res, "DECLARE @n int = @@ROWCOUNT; SELECT @n, @P1");
    }

    #[test]
    fn prefix_names_do_not_match_longer_variables() {
        let sql = "SELECT @id2, @id";
        assert_eq!(translate_named_parameters(sql, &["id"]), "SELECT @id2, @P1");
    }

    #[test]
    fn keeps_non_ascii_text_intact() {
        let sql = "SELECT N'grüße @x', @wert_ä, @x";
        let res = translate_named_parameters(sql, &["x", "wert_ä"]);
        assert_eq!(res, "SELECT N'grüße @x', @P2, @P1");
    }

    #[test]
    fn matches_names_case_insensitively() {
        let sql = "SELECT * FROM t WHERE id = @ID";
        assert_eq!(translate_named_parameters(sql, &["id"]), "SELECT * FROM t WHERE id = @P1");
        assert_eq!(translate_named_parameters("SELECT @WERT_Ä", &["wert_ä"]), "SELECT @P1");
    }

    #[test]
    fn untouched_sql_is_borrowed() {
        let sql = "SELECT 1";
        assert!(matches!(translate_named_parameters(sql, &["x"]), Cow::Borrowed(_)));
        assert!(matches!(translate_named_parameters(sql, &[]), Cow::Borrowed(_)));
    }
}
