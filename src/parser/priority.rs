use std::fmt;

use serde::{Serialize, Serializer};

/// A ranked department preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rank {
    First,
    Second,
    Third,
}

impl Rank {
    pub fn value(self) -> u8 {
        match self {
            Rank::First => 1,
            Rank::Second => 2,
            Rank::Third => 3,
        }
    }

    /// `①`, `②`, `③`; any other circled number is not a rank.
    pub fn from_glyph(c: char) -> Option<Rank> {
        match c {
            '①' => Some(Rank::First),
            '②' => Some(Rank::Second),
            '③' => Some(Rank::Third),
            _ => None,
        }
    }

    /// ASCII `1`-`3` as written in "1.事務局" style lists.
    pub fn from_digit(c: char) -> Option<Rank> {
        match c {
            '1' => Some(Rank::First),
            '2' => Some(Rank::Second),
            '3' => Some(Rank::Third),
            _ => None,
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

impl Serialize for Rank {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.value())
    }
}

/// First recognized circled-digit glyph, scanning left to right.
pub fn map_priority(fragment: &str) -> Option<Rank> {
    fragment.chars().find_map(Rank::from_glyph)
}

/// Circled numbers ① through ⑳, whether or not they map to a rank.
pub fn is_circled_number(c: char) -> bool {
    ('\u{2460}'..='\u{2473}').contains(&c)
}

/// Nothing but circled glyphs (and spacing), as left when OCR breaks a mark onto its own line.
pub fn is_mark_only(text: &str) -> bool {
    let text = text.trim();
    !text.is_empty() && text.chars().all(|c| c.is_whitespace() || is_circled_number(c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_the_three_glyphs() {
        assert_eq!(map_priority("①"), Some(Rank::First));
        assert_eq!(map_priority("②"), Some(Rank::Second));
        assert_eq!(map_priority("③"), Some(Rank::Third));
        assert_eq!(map_priority("①").map(Rank::value), Some(1));
        assert_eq!(map_priority("③").map(Rank::value), Some(3));
    }

    #[test]
    fn higher_circled_numbers_are_absent() {
        assert_eq!(map_priority("④"), None);
        assert_eq!(map_priority("⑩"), None);
        assert_eq!(map_priority(""), None);
        assert_eq!(map_priority("事務局"), None);
        assert!(is_circled_number('④'));
        assert!(!is_circled_number('1'));
    }

    #[test]
    fn first_glyph_wins() {
        assert_eq!(map_priority("会計②書記①"), Some(Rank::Second));
        assert_eq!(map_priority("④③①"), Some(Rank::Third));
    }

    #[test]
    fn mark_only_lines() {
        assert!(is_mark_only("①"));
        assert!(is_mark_only(" ② "));
        assert!(!is_mark_only(""));
        assert!(!is_mark_only("事務局①"));
    }

    #[test]
    fn digit_forms() {
        assert_eq!(Rank::from_digit('2'), Some(Rank::Second));
        assert_eq!(Rank::from_digit('4'), None);
        assert_eq!(Rank::Third.to_string(), "3");
    }
}
