/// Full-width digits ０-９ occupy U+FF10..=U+FF19.
const FULLWIDTH_ZERO: u32 = 0xFF10;

/// Dash look-alikes OCR produces between digits of phone and lot numbers.
const DASH_LIKE: &[char] = &['-', '−', '－', 'ー', '一', '‐', '‑', '–', '—', '=', '＝'];

/// Replace every full-width digit with its ASCII equivalent; everything else passes through.
pub fn normalize_digits(text: &str) -> String {
    text.chars().map(halfwidth_digit).collect()
}

fn halfwidth_digit(c: char) -> char {
    match c {
        '０'..='９' => char::from(b'0' + (c as u32 - FULLWIDTH_ZERO) as u8),
        _ => c,
    }
}

/// Digit normalization plus folding of dash look-alikes that sit between two digits.
///
/// `ー` and `一` are only touched when wedged between digits, so katakana and kanji survive.
pub fn normalize_line(text: &str) -> String {
    let chars: Vec<char> = text.chars().map(halfwidth_digit).collect();
    let mut out = String::with_capacity(text.len());

    for (i, &c) in chars.iter().enumerate() {
        if c != '-' && DASH_LIKE.contains(&c) && between_digits(&chars, i) {
            out.push('-');
        } else {
            out.push(c);
        }
    }
    out
}

fn between_digits(chars: &[char], idx: usize) -> bool {
    let before = idx
        .checked_sub(1)
        .and_then(|i| chars.get(i))
        .is_some_and(|c| c.is_ascii_digit());
    let after = chars.get(idx + 1).is_some_and(|c| c.is_ascii_digit());
    before && after
}

pub fn has_fullwidth_digit(text: &str) -> bool {
    text.chars().any(|c| matches!(c, '０'..='９'))
}
