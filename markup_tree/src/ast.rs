use std::borrow::Cow;

/// A node of the parsed tree.
///
/// Strings borrow from the source whenever the captured span is used as is.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node<'s> {
    /// The synthetic root. It's never closed by any tag.
    Document(Document<'s>),
    Element(Element<'s>),
    Text(Text<'s>),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Document<'s> {
    pub children: Vec<Node<'s>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element<'s> {
    /// Lowercased tag name.
    pub name: Cow<'s, str>,
    pub attrs: Attributes<'s>,
    pub children: Vec<Node<'s>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Text<'s> {
    pub content: Cow<'s, str>,
}

impl<'s> Node<'s> {
    /// Type name of this node: `"doc"`, `"text"`, or the tag name of an element.
    pub fn name(&self) -> &str {
        match self {
            Node::Document(..) => "doc",
            Node::Element(element) => &element.name,
            Node::Text(..) => "text",
        }
    }

    /// Children in document order. Text nodes have none.
    pub fn children(&self) -> &[Node<'s>] {
        match self {
            Node::Document(document) => &document.children,
            Node::Element(element) => &element.children,
            Node::Text(..) => &[],
        }
    }

    pub fn attrs(&self) -> Option<&Attributes<'s>> {
        if let Node::Element(element) = self {
            Some(&element.attrs)
        } else {
            None
        }
    }

    pub fn text(&self) -> Option<&str> {
        if let Node::Text(text) = self {
            Some(&text.content)
        } else {
            None
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Node::Text(..))
    }

    /// Detach the tree from the source string.
    pub fn into_owned(self) -> Node<'static> {
        match self {
            Node::Document(document) => Node::Document(Document {
                children: into_owned_children(document.children),
            }),
            Node::Element(element) => Node::Element(Element {
                name: Cow::Owned(element.name.into_owned()),
                attrs: element.attrs.into_owned(),
                children: into_owned_children(element.children),
            }),
            Node::Text(text) => Node::Text(Text {
                content: Cow::Owned(text.content.into_owned()),
            }),
        }
    }
}

fn into_owned_children(children: Vec<Node<'_>>) -> Vec<Node<'static>> {
    children.into_iter().map(Node::into_owned).collect()
}

impl<'s> Element<'s> {
    pub(crate) fn new(name: Cow<'s, str>, attrs: Attributes<'s>) -> Self {
        Self {
            name,
            attrs,
            children: vec![],
        }
    }
}

/// Attributes of an element, kept in the order they were first seen.
///
/// Names are unique: inserting an existing name replaces its value in place.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Attributes<'s> {
    entries: Vec<(Cow<'s, str>, Cow<'s, str>)>,
}

impl<'s> Attributes<'s> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite. Returns the previous value if the name was present.
    pub fn insert(
        &mut self,
        name: impl Into<Cow<'s, str>>,
        value: impl Into<Cow<'s, str>>,
    ) -> Option<Cow<'s, str>> {
        let name = name.into();
        let value = value.into();
        if let Some((_, existing)) = self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some(std::mem::replace(existing, value))
        } else {
            self.entries.push((name, value));
            None
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| &**value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(key, _)| key == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (&**name, &**value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn into_owned(self) -> Attributes<'static> {
        Attributes {
            entries: self
                .entries
                .into_iter()
                .map(|(name, value)| {
                    (
                        Cow::Owned(name.into_owned()),
                        Cow::Owned(value.into_owned()),
                    )
                })
                .collect(),
        }
    }
}

impl<'s, N, V> FromIterator<(N, V)> for Attributes<'s>
where
    N: Into<Cow<'s, str>>,
    V: Into<Cow<'s, str>>,
{
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut attrs = Attributes::new();
        iter.into_iter().for_each(|(name, value)| {
            attrs.insert(name, value);
        });
        attrs
    }
}

#[cfg(feature = "serde")]
mod serialize {
    use super::{Attributes, Node};
    use serde::ser::{Serialize, SerializeMap, Serializer};

    /// Serialized as `{"type", "attrs", "content"}` or `{"type": "text", "text"}`,
    /// omitting `attrs` and `content` when they're empty.
    impl Serialize for Node<'_> {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            let mut map = serializer.serialize_map(None)?;
            map.serialize_entry("type", self.name())?;
            match self {
                Node::Text(text) => {
                    map.serialize_entry("text", &text.content)?;
                }
                Node::Document(..) | Node::Element(..) => {
                    if let Some(attrs) = self.attrs().filter(|attrs| !attrs.is_empty()) {
                        map.serialize_entry("attrs", attrs)?;
                    }
                    if !self.children().is_empty() {
                        map.serialize_entry("content", self.children())?;
                    }
                }
            }
            map.end()
        }
    }

    impl Serialize for Attributes<'_> {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.collect_map(self.iter())
        }
    }
}
