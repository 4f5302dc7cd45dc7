use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
/// Something in the input that was silently dropped or corrected.
///
/// Diagnostics never affect the produced tree; parsing itself can't fail.
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Byte offset in the source.
    pub pos: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// Closing tag that doesn't match the current element. Holds the folded name.
    UnmatchedClosingTag(String),
    /// Input ended while a tag was still being scanned.
    UnterminatedTag,
    /// A `<` turned out to be text, because another `<` came before the tag ended.
    LiteralLessThan,
    DuplicateAttribute(String),
    CommentDropped,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DiagnosticKind::UnmatchedClosingTag(name) => {
                write!(f, "ignored unmatched closing tag '{name}'")?
            }
            DiagnosticKind::UnterminatedTag => f.write_str("dropped unterminated tag")?,
            DiagnosticKind::LiteralLessThan => f.write_str("treated '<' as text")?,
            DiagnosticKind::DuplicateAttribute(name) => {
                write!(f, "overwrote duplicate attribute '{name}'")?
            }
            DiagnosticKind::CommentDropped => f.write_str("dropped comment")?,
        }
        write!(f, " at position {}", self.pos)
    }
}
