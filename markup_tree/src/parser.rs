//! A single forward pass over the source, driven by a byte-level state machine.
//!
//! Every structural character is ASCII, so scanning bytes is enough
//! and every recorded span boundary falls on a char boundary.
//! Tree building happens during the same pass: there is no token stream.

use crate::{
    ast::{Attributes, Element, Node},
    config::ParseOptions,
    diagnostic::{Diagnostic, DiagnosticKind},
    entities::DecodingMode,
    helpers,
    tree::{self, TreeBuilder},
};
use memchr::memchr;
use std::{borrow::Cow, mem};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Text,
    BeforeTagName,
    InTagName,
    BeforeClosingTagName,
    InClosingTagName,
    BeforeAttrName,
    InAttrName,
    AfterAttrName,
    BeforeAttrValue,
    InAttrValue,
    SelfClosingStartTag,
    Comment,
}

/// Tag whose name has been scanned but whose `>` hasn't been seen yet.
struct PendingTag<'s> {
    /// `None` for comments, which never produce a node.
    name: Option<Cow<'s, str>>,
    attrs: Attributes<'s>,
}

/// Result of [`parse_with_diagnostics`](crate::parse_with_diagnostics).
#[derive(Clone, Debug)]
pub struct ParseOutput<'s> {
    /// Always a [`Node::Document`].
    pub root: Node<'s>,
    pub diagnostics: Vec<Diagnostic>,
}

pub(crate) struct Parser<'s> {
    source: &'s str,
    options: ParseOptions,
    state: State,
    index: usize,
    /// Start of the span being accumulated; it ends at `index`.
    start: usize,
    /// Position of the `<` that opened the tag being scanned.
    tag_start: usize,
    tag: Option<PendingTag<'s>>,
    attr_name: Cow<'s, str>,
    attr_quote: Option<u8>,
    tree: TreeBuilder<'s>,
    diagnostics: Vec<Diagnostic>,
}

impl<'s> Parser<'s> {
    pub(crate) fn new(source: &'s str, options: &ParseOptions) -> Self {
        Self {
            source,
            options: options.clone(),
            state: State::Text,
            index: 0,
            start: 0,
            tag_start: 0,
            tag: None,
            attr_name: Cow::Borrowed(""),
            attr_quote: None,
            tree: TreeBuilder::new(),
            diagnostics: vec![],
        }
    }

    pub(crate) fn parse_root(mut self) -> ParseOutput<'s> {
        let source = self.source;
        let bytes = source.as_bytes();
        while self.index < bytes.len() {
            if self.state == State::Text {
                // `<` is the only interesting byte in text.
                match memchr(b'<', &bytes[self.index..]) {
                    Some(offset) => self.index += offset,
                    None => {
                        self.index = bytes.len();
                        break;
                    }
                }
            }

            let c = bytes[self.index];
            match self.state {
                State::Text => self.state_text(c),
                State::BeforeTagName => self.state_before_tag_name(c),
                State::InTagName => self.state_in_tag_name(c),
                State::BeforeClosingTagName => self.state_before_closing_tag_name(c),
                State::InClosingTagName => self.state_in_closing_tag_name(c),
                State::BeforeAttrName => self.state_before_attr_name(c),
                State::InAttrName => self.state_in_attr_name(c),
                State::AfterAttrName => self.state_after_attr_name(c),
                State::BeforeAttrValue => self.state_before_attr_value(c),
                State::InAttrValue => self.state_in_attr_value(c),
                State::SelfClosingStartTag => self.state_self_closing_start_tag(c),
                State::Comment => self.state_comment(c),
            }
            self.index += 1;
        }

        self.finalize()
    }

    fn state_text(&mut self, c: u8) {
        if c == b'<' {
            self.flush_text();
            self.state = State::BeforeTagName;
            self.tag_start = self.index;
            self.start = self.index;
        }
    }

    fn state_before_tag_name(&mut self, c: u8) {
        match c {
            b'/' => self.state = State::BeforeClosingTagName,
            b'<' => self.rewind(),
            // `<>` stays in the text; `start` still points at the `<`.
            b'>' => self.state = State::Text,
            c if helpers::is_whitespace(c) => {}
            _ => {
                self.state = State::InTagName;
                self.start = self.index;
            }
        }
    }

    fn state_in_tag_name(&mut self, c: u8) {
        match c {
            b'>' => {
                self.begin_tag();
                self.emit_tag(false);
            }
            b'<' => self.rewind(),
            b'/' => {
                self.begin_tag();
                self.state = State::SelfClosingStartTag;
            }
            c if helpers::is_whitespace(c) => {
                self.begin_tag();
                self.state = State::BeforeAttrName;
            }
            b'-' if &self.source[self.start..=self.index] == "!--" => {
                self.tag = Some(PendingTag {
                    name: None,
                    attrs: Attributes::new(),
                });
                self.state = State::Comment;
            }
            _ => {}
        }
    }

    /// Everything up to the next `-->` belongs to the comment.
    /// The dashes of the opening `!--` may close it, so `<!-->` is a whole comment.
    fn state_comment(&mut self, c: u8) {
        if c == b'>' && self.index - 2 > self.start && self.source[..self.index].ends_with("--") {
            self.emit_tag(false);
        }
    }

    fn state_before_closing_tag_name(&mut self, c: u8) {
        self.state = State::InClosingTagName;
        self.start = self.index;
        // `</>` is a closing tag with an empty name.
        self.state_in_closing_tag_name(c);
    }

    fn state_in_closing_tag_name(&mut self, c: u8) {
        if c == b'>' {
            let name = helpers::normalize_name(&self.source[self.start..self.index]);
            if !self.tree.close_element(&name) {
                log::debug!(
                    target: "markup_tree::parser",
                    "ignored closing tag '{name}' at {}",
                    self.tag_start
                );
                self.report(DiagnosticKind::UnmatchedClosingTag(name.into_owned()));
            }
            self.state = State::Text;
            self.start = self.index + 1;
        }
    }

    fn state_before_attr_name(&mut self, c: u8) {
        match c {
            b'>' => self.emit_tag(false),
            b'<' => self.rewind(),
            b'/' => self.state = State::SelfClosingStartTag,
            c if helpers::is_whitespace(c) => {}
            _ => {
                self.state = State::InAttrName;
                self.start = self.index;
            }
        }
    }

    fn state_in_attr_name(&mut self, c: u8) {
        match c {
            b'=' => {
                self.capture_attr_name();
                self.state = State::BeforeAttrValue;
            }
            b'>' => {
                self.capture_attr_name();
                self.set_attribute("");
                self.emit_tag(false);
            }
            b'/' => {
                self.capture_attr_name();
                self.set_attribute("");
                self.state = State::SelfClosingStartTag;
            }
            b'<' => self.rewind(),
            c if helpers::is_whitespace(c) => {
                self.capture_attr_name();
                self.state = State::AfterAttrName;
            }
            _ => {}
        }
    }

    fn state_after_attr_name(&mut self, c: u8) {
        match c {
            b'=' => self.state = State::BeforeAttrValue,
            b'>' => {
                self.set_attribute("");
                self.emit_tag(false);
            }
            b'/' => {
                self.set_attribute("");
                self.state = State::SelfClosingStartTag;
            }
            b'<' => self.rewind(),
            c if helpers::is_whitespace(c) => {}
            _ => {
                // previous attribute has no value
                self.set_attribute("");
                self.state = State::InAttrName;
                self.start = self.index;
            }
        }
    }

    fn state_before_attr_value(&mut self, c: u8) {
        match c {
            b'"' | b'\'' => {
                self.attr_quote = Some(c);
                self.state = State::InAttrValue;
                self.start = self.index + 1;
            }
            b'>' => {
                self.set_attribute("");
                self.emit_tag(false);
            }
            c if helpers::is_whitespace(c) => {}
            _ => {
                self.attr_quote = None;
                self.state = State::InAttrValue;
                self.start = self.index;
            }
        }
    }

    fn state_in_attr_value(&mut self, c: u8) {
        match self.attr_quote {
            Some(quote) => {
                if c == quote {
                    self.set_attribute(&self.source[self.start..self.index]);
                    self.state = State::BeforeAttrName;
                }
            }
            None => {
                if helpers::is_whitespace(c) {
                    self.set_attribute(&self.source[self.start..self.index]);
                    self.state = State::BeforeAttrName;
                } else if c == b'>' {
                    self.set_attribute(&self.source[self.start..self.index]);
                    self.emit_tag(false);
                }
            }
        }
    }

    fn state_self_closing_start_tag(&mut self, c: u8) {
        match c {
            b'>' => self.emit_tag(true),
            b'<' => self.rewind(),
            // a stray `/`, not a self-closing tag
            b'/' => {}
            c if helpers::is_whitespace(c) => self.state = State::BeforeAttrName,
            _ => {
                self.state = State::InAttrName;
                self.start = self.index;
            }
        }
    }

    /// Take the tag name span `[start, index)` as the pending tag.
    fn begin_tag(&mut self) {
        self.tag = Some(PendingTag {
            name: Some(helpers::normalize_tag_name(
                &self.source[self.start..self.index],
            )),
            attrs: Attributes::new(),
        });
    }

    /// Called on the `>` that completes the pending tag.
    fn emit_tag(&mut self, self_closing: bool) {
        self.state = State::Text;
        self.start = self.index + 1;

        match self.tag.take() {
            Some(PendingTag {
                name: Some(name),
                attrs,
            }) => {
                let leaf = self_closing
                    || (self.options.auto_close_void_elements && helpers::is_void_element(&name));
                self.tree.open_element(Element::new(name, attrs), leaf);
            }
            Some(PendingTag { name: None, .. }) => {
                log::debug!(target: "markup_tree::parser", "dropped comment at {}", self.tag_start);
                self.report(DiagnosticKind::CommentDropped);
            }
            None => {}
        }
    }

    fn capture_attr_name(&mut self) {
        self.attr_name = helpers::normalize_name(&self.source[self.start..self.index]);
    }

    fn set_attribute(&mut self, value: &'s str) {
        let name = mem::take(&mut self.attr_name);
        let mut value = Cow::Borrowed(value);
        if self.options.decode_entities {
            tree::decode_in_place(&mut value, DecodingMode::Attribute);
        }
        let Some(tag) = &mut self.tag else {
            return;
        };
        if tag.attrs.insert(name.clone(), value).is_some() {
            self.report(DiagnosticKind::DuplicateAttribute(name.into_owned()));
        }
    }

    /// The `<` at `tag_start` didn't start a tag after all.
    ///
    /// Everything from it up to the current `<` becomes text,
    /// then the current `<` is scanned as a new tag.
    fn rewind(&mut self) {
        log::debug!(
            target: "markup_tree::parser",
            "treated '<' at {} as text, found '<' at {}",
            self.tag_start,
            self.index
        );
        self.report(DiagnosticKind::LiteralLessThan);
        self.tag = None;
        self.state = State::Text;
        self.start = self.tag_start;
        self.state_text(b'<');
    }

    fn flush_text(&mut self) {
        if self.index > self.start {
            self.tree.append_text(&self.source[self.start..self.index]);
        }
    }

    fn report(&mut self, kind: DiagnosticKind) {
        self.diagnostics.push(Diagnostic {
            kind,
            pos: self.tag_start,
        });
    }

    fn finalize(mut self) -> ParseOutput<'s> {
        if self.state == State::Text {
            self.flush_text();
        } else {
            log::debug!(
                target: "markup_tree::parser",
                "dropped unterminated tag at {}",
                self.tag_start
            );
            self.report(DiagnosticKind::UnterminatedTag);
        }

        if self.tree.depth() > 0 {
            log::debug!(
                target: "markup_tree::parser",
                "{} element(s) left open at end of input",
                self.tree.depth()
            );
        }
        let mut root = self.tree.finish();
        if self.options.decode_entities {
            tree::decode_text_nodes(&mut root);
        }
        ParseOutput {
            root,
            diagnostics: self.diagnostics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ast::{Document, Text},
        parse, parse_with_diagnostics, parse_with_options,
    };

    fn text(content: &str) -> Node<'_> {
        Node::Text(Text {
            content: content.into(),
        })
    }

    fn element<'s>(name: &'s str, children: Vec<Node<'s>>) -> Node<'s> {
        Node::Element(Element {
            name: name.into(),
            attrs: Attributes::new(),
            children,
        })
    }

    fn doc(children: Vec<Node<'_>>) -> Node<'_> {
        Node::Document(Document { children })
    }

    fn diagnostics(source: &str) -> Vec<Diagnostic> {
        parse_with_diagnostics(source, &Default::default()).diagnostics
    }

    #[test]
    fn empty_input() {
        assert_eq!(parse(""), doc(vec![]));
        assert!(diagnostics("").is_empty());
    }

    #[test]
    fn plain_text_is_borrowed() {
        let root = parse("just text");
        assert_eq!(root, doc(vec![text("just text")]));
        let Node::Text(Text { content }) = &root.children()[0] else {
            panic!("expected text node");
        };
        assert!(matches!(content, Cow::Borrowed(..)));
    }

    #[test]
    fn nested_elements() {
        assert_eq!(
            parse("<p><span>123</span></p>"),
            doc(vec![element("p", vec![element("span", vec![text("123")])])])
        );
    }

    #[test]
    fn tag_names_are_lowercased() {
        assert_eq!(
            parse("<DIV>x</Div>"),
            doc(vec![element("div", vec![text("x")])])
        );
    }

    #[test]
    fn whitespace_around_tag_names() {
        assert_eq!(
            parse("< p></p><div>123</div>"),
            doc(vec![element("p", vec![]), element("div", vec![text("123")])])
        );
        assert_eq!(
            parse("<p\n></ p >"),
            doc(vec![element("p", vec![])])
        );
    }

    #[test]
    fn unmatched_closing_tag_is_reported() {
        let source = "<a>x</b></a>";
        assert_eq!(parse(source), doc(vec![element("a", vec![text("x")])]));
        assert_eq!(
            diagnostics(source),
            [Diagnostic {
                kind: DiagnosticKind::UnmatchedClosingTag("b".into()),
                pos: 4,
            }]
        );
    }

    #[test]
    fn rewind_keeps_text_and_restarts_at_second_lt() {
        let source = "a <b <i>c</i>";
        assert_eq!(
            parse(source),
            doc(vec![text("a <b "), element("i", vec![text("c")])])
        );
        assert_eq!(
            diagnostics(source),
            [Diagnostic {
                kind: DiagnosticKind::LiteralLessThan,
                pos: 2,
            }]
        );
    }

    #[test]
    fn rewind_at_start_of_input() {
        assert_eq!(parse("<<p>x"), doc(vec![text("<"), element("p", vec![text("x")])]));
        assert_eq!(parse("<a <b>"), doc(vec![text("<a "), element("b", vec![])]));
    }

    #[test]
    fn rewind_from_attribute_states_drops_pending_tag() {
        assert_eq!(
            parse(r#"<p id="x" 1 < 2"#),
            doc(vec![text(r#"<p id="x" 1 "#)])
        );
        assert_eq!(
            parse(r#"<p a="<" b <i>"#),
            doc(vec![text(r#"<p a="<" b "#), element("i", vec![])])
        );
    }

    #[test]
    fn empty_angle_brackets_are_text() {
        assert_eq!(parse("a <> b"), doc(vec![text("a <> b")]));
        assert_eq!(parse("a </> b"), doc(vec![text("a  b")]));
    }

    #[test]
    fn unterminated_tag_is_dropped() {
        assert_eq!(parse("abc<br"), doc(vec![text("abc")]));
        assert_eq!(parse("<p>abc</p"), doc(vec![element("p", vec![text("abc")])]));
        assert_eq!(parse(r#"<p a="1>x"#), doc(vec![]));
        assert_eq!(
            diagnostics("x <"),
            [Diagnostic {
                kind: DiagnosticKind::UnterminatedTag,
                pos: 2,
            }]
        );
    }

    #[test]
    fn comments_are_dropped() {
        let source = "<p><!-- comment -->123<!--x--></p>";
        assert_eq!(parse(source), doc(vec![element("p", vec![text("123")])]));
        assert_eq!(
            diagnostics(source)
                .into_iter()
                .map(|diagnostic| diagnostic.kind)
                .collect::<Vec<_>>(),
            [DiagnosticKind::CommentDropped, DiagnosticKind::CommentDropped]
        );
    }

    #[test]
    fn comment_body_is_not_scanned_as_attributes() {
        assert_eq!(
            parse("<p><!--hello world-->123</p>"),
            doc(vec![element("p", vec![text("123")])])
        );
        assert_eq!(
            parse("<div><!--a/b-->x</div>y"),
            doc(vec![element("div", vec![text("x")]), text("y")])
        );
        assert_eq!(
            parse("<p><!-- a < b -- c > d -->1</p>"),
            doc(vec![element("p", vec![text("1")])])
        );
        assert_eq!(parse("a<!-->b<!--->c"), doc(vec![text("abc")]));
    }

    #[test]
    fn unterminated_comment_is_dropped() {
        assert_eq!(parse("x<!-- y >"), doc(vec![text("x")]));
        assert_eq!(
            diagnostics("x<!-- y >")
                .into_iter()
                .map(|diagnostic| diagnostic.kind)
                .collect::<Vec<_>>(),
            [DiagnosticKind::UnterminatedTag]
        );
    }

    #[test]
    fn self_closing_variants() {
        for source in ["<p>11<foo/>22</p>", "<p>11<foo />22</p>", "<p>11<FOO a=1 />22</p>"] {
            let root = parse(source);
            let p = &root.children()[0];
            assert_eq!(p.children().len(), 3, "{source}");
            assert_eq!(p.children()[1].name(), "foo");
            assert!(p.children()[1].children().is_empty());
            assert_eq!(p.children()[2].text(), Some("22"));
        }
    }

    #[test]
    fn stray_slash_is_not_self_closing() {
        assert_eq!(
            parse("<a / >x"),
            doc(vec![element("a", vec![text("x")])])
        );
    }

    #[test]
    fn unquoted_value_keeps_trailing_slash() {
        let root = parse("<img src=a.png/>x");
        let img = &root.children()[0];
        assert_eq!(img.attrs().and_then(|attrs| attrs.get("src")), Some("a.png/"));
        assert_eq!(img.children()[0].text(), Some("x"));
    }

    #[test]
    fn valueless_attributes() {
        let root = parse("<input disabled checked = x readonly/><b a>");
        let input = &root.children()[0];
        let attrs = input.attrs().unwrap();
        assert_eq!(
            attrs.iter().collect::<Vec<_>>(),
            [("disabled", ""), ("checked", "x"), ("readonly", "")]
        );
        let b = &root.children()[1];
        assert_eq!(b.attrs().and_then(|attrs| attrs.get("a")), Some(""));
    }

    #[test]
    fn empty_value_before_gt() {
        let root = parse("<p a=>x</p>");
        assert_eq!(root.children()[0].attrs().and_then(|attrs| attrs.get("a")), Some(""));
    }

    #[test]
    fn quoted_values_are_literal() {
        let root = parse(r#"<p a=" spaced " b='&amp;'>"#);
        let attrs = root.children()[0].attrs().unwrap();
        assert_eq!(attrs.get("a"), Some(" spaced "));
        assert_eq!(attrs.get("b"), Some("&amp;"));
    }

    #[test]
    fn duplicate_attribute_last_wins() {
        let source = "<p a=1 A=2>";
        let output = parse_with_diagnostics(source, &Default::default());
        let attrs = output.root.children()[0].attrs().unwrap();
        assert_eq!(attrs.iter().collect::<Vec<_>>(), [("a", "2")]);
        assert_eq!(
            output.diagnostics,
            [Diagnostic {
                kind: DiagnosticKind::DuplicateAttribute("a".into()),
                pos: 0,
            }]
        );
    }

    #[test]
    fn void_elements_nest_by_default() {
        assert_eq!(
            parse("<p>11<br>22</p>"),
            doc(vec![element(
                "p",
                vec![text("11"), element("br", vec![text("22")])]
            )])
        );
    }

    #[test]
    fn void_elements_auto_close_when_enabled() {
        let options = ParseOptions {
            auto_close_void_elements: true,
            ..Default::default()
        };
        assert_eq!(
            parse_with_options("<p>11<br>22<img src=x>33</p>", &options),
            doc(vec![element(
                "p",
                vec![
                    text("11"),
                    element("br", vec![]),
                    text("22"),
                    Node::Element(Element {
                        name: "img".into(),
                        attrs: [("src", "x")].into_iter().collect(),
                        children: vec![],
                    }),
                    text("33"),
                ]
            )])
        );
    }

    #[test]
    fn decode_entities_when_enabled() {
        let options = ParseOptions {
            decode_entities: true,
            ..Default::default()
        };
        let root = parse_with_options(r#"<a href="?x=1&copy=2&amp;y">&lt;&am</b>p;</a>"#, &options);
        let a = &root.children()[0];
        assert_eq!(
            a.attrs().and_then(|attrs| attrs.get("href")),
            Some("?x=1&copy=2&y")
        );
        assert_eq!(a.children(), [text("<&")]);
    }

    #[test]
    fn utf8_content() {
        assert_eq!(
            parse("<p>中文 < 😀</p>"),
            doc(vec![element("p", vec![text("中文 < 😀")])])
        );
        assert_eq!(
            parse("<Ä>ü</ä>"),
            doc(vec![element("ä", vec![text("ü")])])
        );
    }
}
