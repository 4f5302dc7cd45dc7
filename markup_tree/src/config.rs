//! Types about configuration.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
/// Options of the parser.
///
/// Defaults keep attribute values and text exactly as written,
/// and only treat explicit `/>` as self-closing.
pub struct ParseOptions {
    /// Decode character references in attribute values and text.
    pub decode_entities: bool,
    /// Close void elements such as `<br>` or `<img>` even without a trailing slash.
    ///
    /// When disabled, `<p>11<br>22</p>` puts `22` inside `br`.
    pub auto_close_void_elements: bool,
}
