pub(super) fn is_line_comment_start(bytes: &[u8], idx: usize) -> bool {
    bytes.get(idx) == Some(&b'-') && bytes.get(idx + 1) == Some(&b'-')
}

pub(super) fn is_block_comment_start(bytes: &[u8], idx: usize) -> bool {
    bytes.get(idx) == Some(&b'/') && bytes.get(idx + 1) == Some(&b'*')
}

pub(super) fn is_block_comment_end(bytes: &[u8], idx: usize) -> bool {
    bytes.get(idx) == Some(&b'*') && bytes.get(idx + 1) == Some(&b'/')
}

/// Closing delimiter at `idx`; a doubled delimiter is an escape, not a close.
///
/// Returns `Some(true)` for a close, `Some(false)` for an escaped pair, `None` otherwise.
pub(super) fn closes_quote(bytes: &[u8], idx: usize, delimiter: u8) -> Option<bool> {
    if bytes.get(idx) != Some(&delimiter) {
        return None;
    }
    Some(bytes.get(idx + 1) != Some(&delimiter))
}
