//! Decoding of character references.
//!
//! The parser calls this only when [`ParseOptions::decode_entities`](crate::config::ParseOptions)
//! is enabled; it's also usable on its own.

use aho_corasick::{AhoCorasick, Anchored, Input, MatchKind, StartKind};
use memchr::memchr;
use std::{borrow::Cow, sync::LazyLock};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Where the decoded string comes from.
///
/// This only matters for legacy named references written without `;`:
/// inside attribute values, they're left alone when followed by `=` or an alphanumeric,
/// so query strings like `?a=1&copy=2` survive.
pub enum DecodingMode {
    Text,
    Attribute,
}

/// Replace numeric and named character references in `input`.
///
/// At each `&`, the longest known reference wins.
/// Named references are the HTML 4 set plus `&apos;`;
/// names added in HTML5, like `&check;` or `&NewLine;`, are not recognized.
/// Anything unrecognized, including a bare `&`, is kept verbatim.
/// Returns the input itself if it doesn't contain `&` at all.
///
/// ```
/// use markup_tree::entities::{decode, DecodingMode};
///
/// assert_eq!(decode("a &lt; b &amp;&amp; c", DecodingMode::Text), "a < b && c");
/// assert_eq!(decode("&#x1F600;&#65", DecodingMode::Text), "😀A");
/// assert_eq!(decode("?x=1&copy=2", DecodingMode::Attribute), "?x=1&copy=2");
/// ```
pub fn decode(input: &str, mode: DecodingMode) -> Cow<'_, str> {
    let bytes = input.as_bytes();
    let Some(mut offset) = memchr(b'&', bytes) else {
        return Cow::Borrowed(input);
    };

    let mut out = String::with_capacity(input.len());
    let mut copy_start = 0;
    loop {
        out.push_str(&input[copy_start..offset]);
        let rest = &input[offset + 1..];
        copy_start = match decode_reference(rest, mode, &mut out) {
            Some(consumed) => offset + 1 + consumed,
            None => {
                out.push('&');
                offset + 1
            }
        };
        match memchr(b'&', &bytes[copy_start..]) {
            Some(i) => offset = copy_start + i,
            None => break,
        }
    }
    out.push_str(&input[copy_start..]);

    Cow::Owned(out)
}

/// Returns how many bytes after `&` were consumed, if anything was decoded.
fn decode_reference(rest: &str, mode: DecodingMode, out: &mut String) -> Option<usize> {
    if let Some(numeric) = rest.strip_prefix('#') {
        let (c, consumed) = decode_numeric(numeric)?;
        out.push(c);
        return Some(consumed + 1);
    }

    let references = &*NAMED_REFERENCES;
    let matched = references
        .ac
        .find(Input::new(rest).anchored(Anchored::Yes))?;
    let (c, terminated) = references.targets[matched.pattern().as_usize()];
    if !terminated
        && mode == DecodingMode::Attribute
        && rest
            .as_bytes()
            .get(matched.end())
            .is_some_and(|b| *b == b'=' || b.is_ascii_alphanumeric())
    {
        return None;
    }
    out.push(c);
    Some(matched.end())
}

/// `rest` starts right after `&#`.
fn decode_numeric(rest: &str) -> Option<(char, usize)> {
    let (prefix_len, radix) = match rest.as_bytes().first() {
        Some(b'x' | b'X') => (1, 16),
        _ => (0, 10),
    };
    let digits = &rest[prefix_len..];
    let len = digits
        .bytes()
        .take_while(|b| {
            if radix == 16 {
                b.is_ascii_hexdigit()
            } else {
                b.is_ascii_digit()
            }
        })
        .count();
    if len == 0 {
        return None;
    }

    let code_point = digits[..len].chars().fold(0u32, |acc, c| {
        let digit = c.to_digit(radix).unwrap_or_default();
        acc.saturating_mul(radix).saturating_add(digit).min(0x11_0000)
    });

    let mut consumed = prefix_len + len;
    if digits.as_bytes().get(len) == Some(&b';') {
        consumed += 1;
    }
    Some((replace_code_point(code_point), consumed))
}

fn replace_code_point(code_point: u32) -> char {
    let replaced = match code_point {
        0 | 0xD800..=0xDFFF | 0x11_0000.. => 0xFFFD,
        // windows-1252
        0x80 => 0x20AC,
        0x82 => 0x201A,
        0x83 => 0x0192,
        0x84 => 0x201E,
        0x85 => 0x2026,
        0x86 => 0x2020,
        0x87 => 0x2021,
        0x88 => 0x02C6,
        0x89 => 0x2030,
        0x8A => 0x0160,
        0x8B => 0x2039,
        0x8C => 0x0152,
        0x8E => 0x017D,
        0x91 => 0x2018,
        0x92 => 0x2019,
        0x93 => 0x201C,
        0x94 => 0x201D,
        0x95 => 0x2022,
        0x96 => 0x2013,
        0x97 => 0x2014,
        0x98 => 0x02DC,
        0x99 => 0x2122,
        0x9A => 0x0161,
        0x9B => 0x203A,
        0x9C => 0x0153,
        0x9E => 0x017E,
        0x9F => 0x0178,
        _ => code_point,
    };
    char::from_u32(replaced).unwrap_or(char::REPLACEMENT_CHARACTER)
}

struct NamedReferences {
    ac: AhoCorasick,
    /// Decoded char, and whether the pattern ends with `;`. Indexed by pattern ID.
    targets: Vec<(char, bool)>,
}

static NAMED_REFERENCES: LazyLock<NamedReferences> = LazyLock::new(|| {
    let mut patterns = Vec::with_capacity(NAMED.len() + LEGACY_COUNT);
    let mut targets = Vec::with_capacity(NAMED.len() + LEGACY_COUNT);
    for (name, c, legacy) in NAMED {
        patterns.push(format!("{name};"));
        targets.push((*c, true));
        if *legacy {
            patterns.push((*name).to_owned());
            targets.push((*c, false));
        }
    }
    NamedReferences {
        ac: AhoCorasick::builder()
            .match_kind(MatchKind::LeftmostLongest)
            .start_kind(StartKind::Anchored)
            .build(patterns)
            .unwrap(),
        targets,
    }
});

const LEGACY_COUNT: usize = 106;

/// HTML 4 references plus `apos`.
/// The last field marks legacy names that are also recognized without `;`.
static NAMED: &[(&str, char, bool)] = &[
    ("QUOT", '\u{22}', true),
    ("quot", '\u{22}', true),
    ("AMP", '\u{26}', true),
    ("amp", '\u{26}', true),
    ("apos", '\u{27}', false),
    ("LT", '\u{3C}', true),
    ("lt", '\u{3C}', true),
    ("GT", '\u{3E}', true),
    ("gt", '\u{3E}', true),
    ("nbsp", '\u{A0}', true),
    ("iexcl", '\u{A1}', true),
    ("cent", '\u{A2}', true),
    ("pound", '\u{A3}', true),
    ("curren", '\u{A4}', true),
    ("yen", '\u{A5}', true),
    ("brvbar", '\u{A6}', true),
    ("sect", '\u{A7}', true),
    ("uml", '\u{A8}', true),
    ("COPY", '\u{A9}', true),
    ("copy", '\u{A9}', true),
    ("ordf", '\u{AA}', true),
    ("laquo", '\u{AB}', true),
    ("not", '\u{AC}', true),
    ("shy", '\u{AD}', true),
    ("REG", '\u{AE}', true),
    ("reg", '\u{AE}', true),
    ("macr", '\u{AF}', true),
    ("deg", '\u{B0}', true),
    ("plusmn", '\u{B1}', true),
    ("sup2", '\u{B2}', true),
    ("sup3", '\u{B3}', true),
    ("acute", '\u{B4}', true),
    ("micro", '\u{B5}', true),
    ("para", '\u{B6}', true),
    ("middot", '\u{B7}', true),
    ("cedil", '\u{B8}', true),
    ("sup1", '\u{B9}', true),
    ("ordm", '\u{BA}', true),
    ("raquo", '\u{BB}', true),
    ("frac14", '\u{BC}', true),
    ("frac12", '\u{BD}', true),
    ("frac34", '\u{BE}', true),
    ("iquest", '\u{BF}', true),
    ("Agrave", '\u{C0}', true),
    ("Aacute", '\u{C1}', true),
    ("Acirc", '\u{C2}', true),
    ("Atilde", '\u{C3}', true),
    ("Auml", '\u{C4}', true),
    ("Aring", '\u{C5}', true),
    ("AElig", '\u{C6}', true),
    ("Ccedil", '\u{C7}', true),
    ("Egrave", '\u{C8}', true),
    ("Eacute", '\u{C9}', true),
    ("Ecirc", '\u{CA}', true),
    ("Euml", '\u{CB}', true),
    ("Igrave", '\u{CC}', true),
    ("Iacute", '\u{CD}', true),
    ("Icirc", '\u{CE}', true),
    ("Iuml", '\u{CF}', true),
    ("ETH", '\u{D0}', true),
    ("Ntilde", '\u{D1}', true),
    ("Ograve", '\u{D2}', true),
    ("Oacute", '\u{D3}', true),
    ("Ocirc", '\u{D4}', true),
    ("Otilde", '\u{D5}', true),
    ("Ouml", '\u{D6}', true),
    ("times", '\u{D7}', true),
    ("Oslash", '\u{D8}', true),
    ("Ugrave", '\u{D9}', true),
    ("Uacute", '\u{DA}', true),
    ("Ucirc", '\u{DB}', true),
    ("Uuml", '\u{DC}', true),
    ("Yacute", '\u{DD}', true),
    ("THORN", '\u{DE}', true),
    ("szlig", '\u{DF}', true),
    ("agrave", '\u{E0}', true),
    ("aacute", '\u{E1}', true),
    ("acirc", '\u{E2}', true),
    ("atilde", '\u{E3}', true),
    ("auml", '\u{E4}', true),
    ("aring", '\u{E5}', true),
    ("aelig", '\u{E6}', true),
    ("ccedil", '\u{E7}', true),
    ("egrave", '\u{E8}', true),
    ("eacute", '\u{E9}', true),
    ("ecirc", '\u{EA}', true),
    ("euml", '\u{EB}', true),
    ("igrave", '\u{EC}', true),
    ("iacute", '\u{ED}', true),
    ("icirc", '\u{EE}', true),
    ("iuml", '\u{EF}', true),
    ("eth", '\u{F0}', true),
    ("ntilde", '\u{F1}', true),
    ("ograve", '\u{F2}', true),
    ("oacute", '\u{F3}', true),
    ("ocirc", '\u{F4}', true),
    ("otilde", '\u{F5}', true),
    ("ouml", '\u{F6}', true),
    ("divide", '\u{F7}', true),
    ("oslash", '\u{F8}', true),
    ("ugrave", '\u{F9}', true),
    ("uacute", '\u{FA}', true),
    ("ucirc", '\u{FB}', true),
    ("uuml", '\u{FC}', true),
    ("yacute", '\u{FD}', true),
    ("thorn", '\u{FE}', true),
    ("yuml", '\u{FF}', true),
    ("OElig", '\u{152}', false),
    ("oelig", '\u{153}', false),
    ("Scaron", '\u{160}', false),
    ("scaron", '\u{161}', false),
    ("Yuml", '\u{178}', false),
    ("fnof", '\u{192}', false),
    ("circ", '\u{2C6}', false),
    ("tilde", '\u{2DC}', false),
    ("Alpha", '\u{391}', false),
    ("Beta", '\u{392}', false),
    ("Gamma", '\u{393}', false),
    ("Delta", '\u{394}', false),
    ("Epsilon", '\u{395}', false),
    ("Zeta", '\u{396}', false),
    ("Eta", '\u{397}', false),
    ("Theta", '\u{398}', false),
    ("Iota", '\u{399}', false),
    ("Kappa", '\u{39A}', false),
    ("Lambda", '\u{39B}', false),
    ("Mu", '\u{39C}', false),
    ("Nu", '\u{39D}', false),
    ("Xi", '\u{39E}', false),
    ("Omicron", '\u{39F}', false),
    ("Pi", '\u{3A0}', false),
    ("Rho", '\u{3A1}', false),
    ("Sigma", '\u{3A3}', false),
    ("Tau", '\u{3A4}', false),
    ("Upsilon", '\u{3A5}', false),
    ("Phi", '\u{3A6}', false),
    ("Chi", '\u{3A7}', false),
    ("Psi", '\u{3A8}', false),
    ("Omega", '\u{3A9}', false),
    ("alpha", '\u{3B1}', false),
    ("beta", '\u{3B2}', false),
    ("gamma", '\u{3B3}', false),
    ("delta", '\u{3B4}', false),
    ("epsilon", '\u{3B5}', false),
    ("zeta", '\u{3B6}', false),
    ("eta", '\u{3B7}', false),
    ("theta", '\u{3B8}', false),
    ("iota", '\u{3B9}', false),
    ("kappa", '\u{3BA}', false),
    ("lambda", '\u{3BB}', false),
    ("mu", '\u{3BC}', false),
    ("nu", '\u{3BD}', false),
    ("xi", '\u{3BE}', false),
    ("omicron", '\u{3BF}', false),
    ("pi", '\u{3C0}', false),
    ("rho", '\u{3C1}', false),
    ("sigmaf", '\u{3C2}', false),
    ("sigma", '\u{3C3}', false),
    ("tau", '\u{3C4}', false),
    ("upsilon", '\u{3C5}', false),
    ("phi", '\u{3C6}', false),
    ("chi", '\u{3C7}', false),
    ("psi", '\u{3C8}', false),
    ("omega", '\u{3C9}', false),
    ("thetasym", '\u{3D1}', false),
    ("upsih", '\u{3D2}', false),
    ("piv", '\u{3D6}', false),
    ("ensp", '\u{2002}', false),
    ("emsp", '\u{2003}', false),
    ("thinsp", '\u{2009}', false),
    ("zwnj", '\u{200C}', false),
    ("zwj", '\u{200D}', false),
    ("lrm", '\u{200E}', false),
    ("rlm", '\u{200F}', false),
    ("ndash", '\u{2013}', false),
    ("mdash", '\u{2014}', false),
    ("lsquo", '\u{2018}', false),
    ("rsquo", '\u{2019}', false),
    ("sbquo", '\u{201A}', false),
    ("ldquo", '\u{201C}', false),
    ("rdquo", '\u{201D}', false),
    ("bdquo", '\u{201E}', false),
    ("dagger", '\u{2020}', false),
    ("Dagger", '\u{2021}', false),
    ("bull", '\u{2022}', false),
    ("hellip", '\u{2026}', false),
    ("permil", '\u{2030}', false),
    ("prime", '\u{2032}', false),
    ("Prime", '\u{2033}', false),
    ("lsaquo", '\u{2039}', false),
    ("rsaquo", '\u{203A}', false),
    ("oline", '\u{203E}', false),
    ("frasl", '\u{2044}', false),
    ("euro", '\u{20AC}', false),
    ("image", '\u{2111}', false),
    ("weierp", '\u{2118}', false),
    ("real", '\u{211C}', false),
    ("trade", '\u{2122}', false),
    ("alefsym", '\u{2135}', false),
    ("larr", '\u{2190}', false),
    ("uarr", '\u{2191}', false),
    ("rarr", '\u{2192}', false),
    ("darr", '\u{2193}', false),
    ("harr", '\u{2194}', false),
    ("crarr", '\u{21B5}', false),
    ("lArr", '\u{21D0}', false),
    ("uArr", '\u{21D1}', false),
    ("rArr", '\u{21D2}', false),
    ("dArr", '\u{21D3}', false),
    ("hArr", '\u{21D4}', false),
    ("forall", '\u{2200}', false),
    ("part", '\u{2202}', false),
    ("exist", '\u{2203}', false),
    ("empty", '\u{2205}', false),
    ("nabla", '\u{2207}', false),
    ("isin", '\u{2208}', false),
    ("notin", '\u{2209}', false),
    ("ni", '\u{220B}', false),
    ("prod", '\u{220F}', false),
    ("sum", '\u{2211}', false),
    ("minus", '\u{2212}', false),
    ("lowast", '\u{2217}', false),
    ("radic", '\u{221A}', false),
    ("prop", '\u{221D}', false),
    ("infin", '\u{221E}', false),
    ("ang", '\u{2220}', false),
    ("and", '\u{2227}', false),
    ("or", '\u{2228}', false),
    ("cap", '\u{2229}', false),
    ("cup", '\u{222A}', false),
    ("int", '\u{222B}', false),
    ("there4", '\u{2234}', false),
    ("sim", '\u{223C}', false),
    ("cong", '\u{2245}', false),
    ("asymp", '\u{2248}', false),
    ("ne", '\u{2260}', false),
    ("equiv", '\u{2261}', false),
    ("le", '\u{2264}', false),
    ("ge", '\u{2265}', false),
    ("sub", '\u{2282}', false),
    ("sup", '\u{2283}', false),
    ("nsub", '\u{2284}', false),
    ("sube", '\u{2286}', false),
    ("supe", '\u{2287}', false),
    ("oplus", '\u{2295}', false),
    ("otimes", '\u{2297}', false),
    ("perp", '\u{22A5}', false),
    ("sdot", '\u{22C5}', false),
    ("lceil", '\u{2308}', false),
    ("rceil", '\u{2309}', false),
    ("lfloor", '\u{230A}', false),
    ("rfloor", '\u{230B}', false),
    ("lang", '\u{2329}', false),
    ("rang", '\u{232A}', false),
    ("loz", '\u{25CA}', false),
    ("spades", '\u{2660}', false),
    ("clubs", '\u{2663}', false),
    ("hearts", '\u{2665}', false),
    ("diams", '\u{2666}', false),
];
