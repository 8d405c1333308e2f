//! HTML-style character entities.
//!
//! Grammar text may embed `&name;`, `&#NN;`, or `&#xHH;` in string,
//! terminal, and Unicode literals and in prose; each decodes to a single
//! code point inline during scanning.

use crate::cursor::Cursor;

/// Named entities the scanner recognizes.
///
/// Sorted by name for binary search. This is the subset that shows up in
/// real grammar files (typography, set operators, common markup escapes),
/// not the full HTML5 list.
static NAMED_ENTITIES: &[(&str, char)] = &[
    ("Tab", '\t'),
    ("amp", '&'),
    ("apos", '\''),
    ("ast", '*'),
    ("bull", '\u{2022}'),
    ("circ", '\u{02C6}'),
    ("copy", '\u{00A9}'),
    ("dagger", '\u{2020}'),
    ("darr", '\u{2193}'),
    ("deg", '\u{00B0}'),
    ("divide", '\u{00F7}'),
    ("ge", '\u{2265}'),
    ("gt", '>'),
    ("harr", '\u{2194}'),
    ("hellip", '\u{2026}'),
    ("infin", '\u{221E}'),
    ("isin", '\u{2208}'),
    ("laquo", '\u{00AB}'),
    ("larr", '\u{2190}'),
    ("ldquo", '\u{201C}'),
    ("le", '\u{2264}'),
    ("lsquo", '\u{2018}'),
    ("lt", '<'),
    ("mdash", '\u{2014}'),
    ("minus", '\u{2212}'),
    ("nbsp", '\u{00A0}'),
    ("ndash", '\u{2013}'),
    ("ne", '\u{2260}'),
    ("not", '\u{00AC}'),
    ("notin", '\u{2209}'),
    ("para", '\u{00B6}'),
    ("plusmn", '\u{00B1}'),
    ("quot", '"'),
    ("raquo", '\u{00BB}'),
    ("rarr", '\u{2192}'),
    ("rdquo", '\u{201D}'),
    ("rsquo", '\u{2019}'),
    ("sect", '\u{00A7}'),
    ("times", '\u{00D7}'),
    ("uarr", '\u{2191}'),
];

fn named_entity(name: &str) -> Option<char> {
    NAMED_ENTITIES
        .binary_search_by_key(&name, |&(n, _)| n)
        .ok()
        .map(|index| NAMED_ENTITIES[index].1)
}

/// A decoded entity: the code point and the byte length consumed,
/// including the `&` and `;`.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct DecodedEntity {
    pub value: char,
    pub len: u32,
}

/// Try to decode an entity at `cursor`, which must sit on the `&`.
///
/// Returns `None` without consuming anything when the text at the cursor
/// is not a well-formed, recognized entity.
pub fn decode_entity(cursor: &Cursor<'_>) -> Option<DecodedEntity> {
    let mut probe = *cursor;
    let start = probe.pos();
    if !probe.eat('&') {
        return None;
    }

    let value = if probe.eat('#') {
        let radix = if probe.eat('x') || probe.eat('X') {
            16
        } else {
            10
        };
        let digits_start = probe.pos();
        probe.advance_while(|c| c.is_digit(radix));
        if probe.pos() == digits_start {
            return None;
        }
        let digits = probe.slice(digits_start, probe.pos());
        let code = u32::from_str_radix(digits, radix).ok()?;
        char::from_u32(code)?
    } else {
        let name_start = probe.pos();
        probe.advance_while(|c| c.is_ascii_alphanumeric());
        named_entity(probe.slice(name_start, probe.pos()))?
    };

    if !probe.eat(';') {
        return None;
    }
    Some(DecodedEntity {
        value,
        len: probe.pos() - start,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn decode(text: &str) -> Option<DecodedEntity> {
        decode_entity(&Cursor::new(text))
    }

    #[test]
    fn table_is_sorted_for_binary_search() {
        for pair in NAMED_ENTITIES.windows(2) {
            assert!(pair[0].0 < pair[1].0, "{} >= {}", pair[0].0, pair[1].0);
        }
    }

    #[test]
    fn named_entities_decode() {
        assert_eq!(
            decode("&ldquo;rest"),
            Some(DecodedEntity {
                value: '\u{201C}',
                len: 7
            })
        );
        assert_eq!(decode("&amp;").map(|e| e.value), Some('&'));
        // Neighbours in the table; lookups stay exact around them.
        assert_eq!(decode("&laquo;").map(|e| e.value), Some('\u{00AB}'));
        assert_eq!(decode("&larr;").map(|e| e.value), Some('\u{2190}'));
    }

    #[test]
    fn numeric_entities_decode() {
        assert_eq!(decode("&#65;").map(|e| e.value), Some('A'));
        assert_eq!(decode("&#x2208;").map(|e| e.value), Some('\u{2208}'));
        assert_eq!(decode("&#X41;").map(|e| e.value), Some('A'));
    }

    #[test]
    fn malformed_entities_do_not_decode() {
        assert_eq!(decode("&bogusname;"), None);
        assert_eq!(decode("&amp"), None); // no semicolon
        assert_eq!(decode("&#;"), None); // no digits
        assert_eq!(decode("&#x110000;"), None); // out of range
        assert_eq!(decode("&;"), None);
    }
}
