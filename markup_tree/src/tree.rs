use crate::{
    ast::{Document, Element, Node, Text},
    entities::{self, DecodingMode},
};
use std::borrow::Cow;

/// Builds the tree with a stack of open elements.
///
/// An element is attached to its parent when it's popped, so the current
/// insertion point is always the top of the stack, or the document when the
/// stack is empty. Nothing else can be appended to a parent while one of its
/// children is open, which keeps children in document order.
pub(crate) struct TreeBuilder<'s> {
    document: Document<'s>,
    stack: Vec<Element<'s>>,
}

impl<'s> TreeBuilder<'s> {
    pub(crate) fn new() -> Self {
        Self {
            document: Document::default(),
            stack: vec![],
        }
    }

    fn current_children(&mut self) -> &mut Vec<Node<'s>> {
        match self.stack.last_mut() {
            Some(element) => &mut element.children,
            None => &mut self.document.children,
        }
    }

    /// Leaves are attached right away; other elements become the new insertion point.
    pub(crate) fn open_element(&mut self, element: Element<'s>, leaf: bool) {
        log::trace!(target: "markup_tree::tree", "open element: {} (leaf: {leaf})", element.name);
        if leaf {
            self.current_children().push(Node::Element(element));
        } else {
            self.stack.push(element);
        }
    }

    /// Pop only if the current element has this name; ancestors are never searched.
    pub(crate) fn close_element(&mut self, name: &str) -> bool {
        if !self
            .stack
            .last()
            .is_some_and(|element| element.name.eq_ignore_ascii_case(name))
        {
            return false;
        }
        if let Some(element) = self.stack.pop() {
            log::trace!(target: "markup_tree::tree", "close element: {}", element.name);
            self.current_children().push(Node::Element(element));
        }
        true
    }

    /// Merge into the last child if that's a text node.
    pub(crate) fn append_text(&mut self, text: &'s str) {
        if text.is_empty() {
            return;
        }
        log::trace!(target: "markup_tree::tree", "append text: {text:?}");
        let children = self.current_children();
        if let Some(Node::Text(last)) = children.last_mut() {
            last.content.to_mut().push_str(text);
        } else {
            children.push(Node::Text(Text {
                content: Cow::Borrowed(text),
            }));
        }
    }

    pub(crate) fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Elements still open at the end are kept, nested as they were opened.
    pub(crate) fn finish(mut self) -> Node<'s> {
        while let Some(element) = self.stack.pop() {
            self.current_children().push(Node::Element(element));
        }
        Node::Document(self.document)
    }
}

pub(crate) fn decode_text_nodes(node: &mut Node<'_>) {
    match node {
        Node::Document(Document { children }) | Node::Element(Element { children, .. }) => {
            children.iter_mut().for_each(decode_text_nodes);
        }
        Node::Text(text) => decode_in_place(&mut text.content, DecodingMode::Text),
    }
}

pub(crate) fn decode_in_place(content: &mut Cow<'_, str>, mode: DecodingMode) {
    let decoded = match content {
        Cow::Borrowed(raw) => entities::decode(*raw, mode),
        Cow::Owned(raw) => match entities::decode(raw, mode) {
            Cow::Borrowed(..) => return,
            Cow::Owned(decoded) => Cow::Owned(decoded),
        },
    };
    *content = decoded;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Attributes;

    fn element(name: &str) -> Element<'_> {
        Element::new(name.into(), Attributes::new())
    }

    #[test]
    fn close_only_matches_top() {
        let mut builder = TreeBuilder::new();
        builder.open_element(element("div"), false);
        builder.open_element(element("span"), false);
        assert!(!builder.close_element("div"));
        assert_eq!(builder.depth(), 2);
        assert!(builder.close_element("span"));
        assert!(builder.close_element("DIV"));
        assert_eq!(builder.depth(), 0);
        assert!(!builder.close_element("div"));
    }

    #[test]
    fn adjacent_text_is_merged() {
        let mut builder = TreeBuilder::new();
        builder.append_text("a");
        builder.append_text("");
        builder.append_text("b");
        builder.open_element(element("br"), true);
        builder.append_text("c");
        let root = builder.finish();
        let children = root.children();
        assert_eq!(children.len(), 3);
        assert_eq!(children[0].text(), Some("ab"));
        assert_eq!(children[1].name(), "br");
        assert_eq!(children[2].text(), Some("c"));
    }

    #[test]
    fn unclosed_elements_stay_nested() {
        let mut builder = TreeBuilder::new();
        builder.open_element(element("p1"), false);
        builder.append_text("111");
        builder.open_element(element("p2"), false);
        builder.append_text("222");
        let root = builder.finish();
        let p1 = &root.children()[0];
        assert_eq!(p1.name(), "p1");
        assert_eq!(p1.children()[0].text(), Some("111"));
        let p2 = &p1.children()[1];
        assert_eq!(p2.name(), "p2");
        assert_eq!(p2.children()[0].text(), Some("222"));
    }

    #[test]
    fn decode_borrowed_and_owned() {
        let mut borrowed = Cow::Borrowed("a&amp;b");
        decode_in_place(&mut borrowed, DecodingMode::Text);
        assert_eq!(borrowed, "a&b");

        let mut owned: Cow<str> = Cow::Owned("no refs".into());
        decode_in_place(&mut owned, DecodingMode::Text);
        assert_eq!(owned, "no refs");
    }
}
