use std::borrow::Cow;

/// Space, tab, line feed, carriage return, form feed and vertical tab.
///
/// Vertical tab is included on purpose, so this is not [`u8::is_ascii_whitespace`].
pub(crate) fn is_whitespace(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | b'\r' | 0x0C | 0x0B)
}

pub(crate) static VOID_ELEMENTS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Check if the given (already case-folded) name is in the void element allow-list.
pub fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

/// Lowercase a name, borrowing when there's nothing to fold.
pub(crate) fn fold_case(name: &str) -> Cow<'_, str> {
    if name.bytes().any(|b| b.is_ascii_uppercase() || !b.is_ascii()) {
        Cow::Owned(name.to_lowercase())
    } else {
        Cow::Borrowed(name)
    }
}

/// Tag names are lowercased, trimmed, and lose a single trailing `/`.
pub(crate) fn normalize_tag_name(raw: &str) -> Cow<'_, str> {
    match fold_case(raw) {
        Cow::Borrowed(name) => {
            let name = name.trim();
            Cow::Borrowed(name.strip_suffix('/').unwrap_or(name))
        }
        Cow::Owned(name) => {
            let name = name.trim();
            Cow::Owned(name.strip_suffix('/').unwrap_or(name).to_owned())
        }
    }
}

/// Attribute names and closing tag names are lowercased and trimmed.
pub(crate) fn normalize_name(raw: &str) -> Cow<'_, str> {
    match fold_case(raw) {
        Cow::Borrowed(name) => Cow::Borrowed(name.trim()),
        Cow::Owned(name) => Cow::Owned(name.trim().to_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_includes_vertical_tab() {
        for byte in [b' ', b'\t', b'\n', b'\r', 0x0C, 0x0B] {
            assert!(is_whitespace(byte));
        }
        assert!(!is_whitespace(b'a'));
        assert!(!is_whitespace(b'<'));
    }

    #[test]
    fn tag_name_normalization() {
        assert_eq!(normalize_tag_name("DIV"), "div");
        assert_eq!(normalize_tag_name(" br/"), "br");
        assert_eq!(normalize_tag_name("p"), "p");
        assert!(matches!(normalize_tag_name("span"), Cow::Borrowed(_)));
        assert_eq!(normalize_tag_name("ÄB"), "äb");
    }

    #[test]
    fn void_allow_list() {
        assert!(is_void_element("br"));
        assert!(is_void_element("wbr"));
        assert!(!is_void_element("p"));
        assert!(!is_void_element("BR"));
    }
}
