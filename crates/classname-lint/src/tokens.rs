//! Splitting class attribute values into tokens.

/// One class name inside an attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    /// The class name text.
    pub text: &'a str,
    /// Byte offset from the start of the attribute value.
    pub offset: u32,
    /// Length in bytes.
    pub len: u32,
}

/// Splits `value` on single spaces, skipping the empty pieces that
/// consecutive spaces produce.
///
/// Each piece advances the running offset by its length plus one separator,
/// so offsets stay exact however the spacing varies.
pub fn class_tokens(value: &str) -> impl Iterator<Item = Token<'_>> {
    let mut offset = 0u32;
    value.split(' ').filter_map(move |piece| {
        let start = offset;
        let len = piece.len() as u32;
        offset += len + 1;
        (len > 0).then_some(Token {
            text: piece,
            offset: start,
            len,
        })
    })
}
