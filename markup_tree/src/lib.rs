#![doc = include_str!("../README.md")]

mod ast;
pub mod config;
mod diagnostic;
pub mod entities;
mod helpers;
mod parser;
mod tree;

use crate::{config::ParseOptions, parser::Parser};
pub use crate::{ast::*, diagnostic::*, helpers::is_void_element, parser::ParseOutput};

/// Parse markup into a tree rooted at a [`Node::Document`].
///
/// This never fails: malformed input is corrected or dropped silently.
///
/// ```
/// use markup_tree::parse;
///
/// let root = parse("<p class=intro>1 < 2</p>");
/// let p = &root.children()[0];
/// assert_eq!(p.name(), "p");
/// assert_eq!(p.attrs().and_then(|attrs| attrs.get("class")), Some("intro"));
/// assert_eq!(p.children()[0].text(), Some("1 < 2"));
/// ```
pub fn parse(source: &str) -> Node<'_> {
    parse_with_options(source, &ParseOptions::default())
}

/// Parse markup with the given options.
///
/// ```
/// use markup_tree::{config::ParseOptions, parse_with_options};
///
/// let options = ParseOptions {
///     auto_close_void_elements: true,
///     decode_entities: true,
/// };
/// let root = parse_with_options("<p>a<br>b &amp; c</p>", &options);
/// let p = &root.children()[0];
/// assert_eq!(p.children()[1].name(), "br");
/// assert_eq!(p.children()[2].text(), Some("b & c"));
/// ```
pub fn parse_with_options<'s>(source: &'s str, options: &ParseOptions) -> Node<'s> {
    parse_with_diagnostics(source, options).root
}

/// Parse markup, and also report what was silently corrected or dropped.
///
/// ```
/// use markup_tree::{parse_with_diagnostics, DiagnosticKind};
///
/// let output = parse_with_diagnostics("111</p1>222", &Default::default());
/// assert_eq!(output.root.children()[0].text(), Some("111222"));
/// assert_eq!(
///     output.diagnostics[0].kind,
///     DiagnosticKind::UnmatchedClosingTag("p1".into())
/// );
/// ```
pub fn parse_with_diagnostics<'s>(source: &'s str, options: &ParseOptions) -> ParseOutput<'s> {
    Parser::new(source, options).parse_root()
}
