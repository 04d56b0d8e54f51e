#[derive(Clone, Copy)]
pub(super) enum State {
    Normal,
    SingleQuoted,
    DoubleQuoted,
    Bracketed,
    LineComment,
    BlockComment(u32),
}

/// End of a T-SQL variable name starting at `start`.
///
/// Non-ASCII bytes count as identifier bytes, so the returned index always
/// lands on a char boundary.
pub(super) fn scan_identifier(bytes: &[u8], start: usize) -> usize {
    let mut idx = start;
    while idx < bytes.len() {
        let b = bytes[idx];
        if b.is_ascii_alphanumeric() || matches!(b, b'_' | b'#' | b'$') || !b.is_ascii() {
            idx += 1;
        } else {
            break;
        }
    }
    idx
}
