use std::sync::LazyLock;

use regex::Regex;

use super::priority::{map_priority, Rank};

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(?:\.[A-Za-z0-9\-]+)+").unwrap()
});
static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\([0-9]{2,4}\)\s*[0-9]{2,4}-[0-9]{3,4}|[0-9]{2,4}-[0-9]{2,4}-[0-9]{2,4}|0[0-9]{9,10}")
        .unwrap()
});
static HEADER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^([0-9]{1,3})\s*班\s*(.*)$").unwrap());
static LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:(?i:tel(?:ephone)?|fax|e-?mail|mail)\.?|電話番号|電話|携帯電話|携帯|メールアドレス|メール|アドレス|住所|連絡先)\s*[:：]?\s*",
    )
    .unwrap()
});
static EMPTY_BRACKETS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(\s*\)|（\s*）|「\s*」").unwrap());
static ADDRESS_KEYWORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\p{Han}[都道府県市区町村郡]|丁目|番地|[0-9]+号|〒|[ヶケが]丘|マンション|ハイツ|コーポ|アパート|レジデンス|団地")
        .unwrap()
});
static LOT_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]{1,4}(?:-[0-9]{1,4}){1,3}").unwrap());
/// Circled glyph before a name: `①回覧広報`, `① 回覧広報`, `①)回覧広報`.
static PRE_GLYPH_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([①-⑳])\s*[.．)）]?\s*$").unwrap());
static POST_GLYPH_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*([①-⑳])").unwrap());
/// List-style digit before a name: `1.書記`, `2)名簿`.
static PRE_DIGIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[\s、,，・/／])([1-3])\s*[.．)）]?\s*$").unwrap());
static COUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[0-9]+\s*(?:時|分|月|日|年|歳|才|回|人|名|件|円|週)").unwrap()
});

/// List punctuation trimmed from the edges of leftover text.
const TRIM_CHARS: &[char] = &['、', ',', '，', '・', '/', '／', ':', '：', ';', '；', '。'];

const HONORIFICS: &[&str] = &["様", "殿", "さん"];

const PHONE_DIGITS: std::ops::RangeInclusive<usize> = 10..=11;

/// One tagged piece of a normalized line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Phone(Vec<String>),
    Email(String),
    DepartmentMark { department: String, rank: Rank },
    Header { team: String, name: String },
    AddressFragment(String),
    Unclassified(String),
}

impl Fragment {
    pub fn kind(&self) -> &'static str {
        match self {
            Fragment::Phone(_) => "phone",
            Fragment::Email(_) => "email",
            Fragment::DepartmentMark { .. } => "department",
            Fragment::Header { .. } => "header",
            Fragment::AddressFragment(_) => "address",
            Fragment::Unclassified(_) => "note",
        }
    }
}

/// A match inside a fragment: byte range plus the canonical value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderMatch<'a> {
    pub team: String,
    pub name: String,
    pub rest: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct DepartmentHit {
    start: usize,
    end: usize,
    department: String,
    rank: Option<Rank>,
}

/// Ordered rule chain: email, phone, department mark, header, address, note.
#[derive(Debug, Clone)]
pub struct Classifier {
    departments: Vec<String>,
    name_re: Regex,
}

impl Classifier {
    pub fn new(departments: &[String]) -> Result<Self, regex::Error> {
        // longest first so a name that prefixes another never shadows it
        let mut names: Vec<&String> = departments.iter().collect();
        names.sort_by_key(|n| std::cmp::Reverse(n.chars().count()));
        let alternation = names
            .iter()
            .map(|n| regex::escape(n))
            .collect::<Vec<_>>()
            .join("|");

        Ok(Classifier {
            departments: departments.to_vec(),
            name_re: Regex::new(&alternation)?,
        })
    }

    pub fn departments(&self) -> &[String] {
        &self.departments
    }

    /// Split a normalized line into tagged fragments, in rule priority order.
    pub fn classify(&self, line: &str) -> Vec<Fragment> {
        let mut out = Vec::new();
        self.classify_into(line, &mut out);
        out
    }

    /// Whether the line opens a new record.
    pub fn starts_record(&self, line: &str) -> bool {
        self.classify(line)
            .iter()
            .any(|f| matches!(f, Fragment::Header { .. }))
    }

    /// The line ends in a department name that carries no mark yet.
    pub fn ends_with_bare_department(&self, line: &str) -> bool {
        let line = line.trim_end();
        let ends_in_name = self.name_re.find_iter(line).last().is_some_and(|m| m.end() == line.len());
        ends_in_name && !self.find_departments(line).iter().any(|h| h.end == line.len())
    }

    pub fn starts_with_department(&self, line: &str) -> bool {
        let line = line.trim_start();
        self.name_re.find(line).is_some_and(|m| m.start() == 0)
    }

    fn classify_into(&self, text: &str, out: &mut Vec<Fragment>) {
        if text.trim().is_empty() {
            return;
        }

        if let Some(email) = find_email(text) {
            out.push(Fragment::Email(email.value));
            self.classify_into(&text[..email.start], out);
            self.classify_into(&text[email.end..], out);
            return;
        }

        let phones = find_phones(text);
        if !phones.is_empty() {
            out.push(Fragment::Phone(phones.iter().map(|p| p.value.clone()).collect()));
            self.classify_gaps(text, phones.iter().map(|p| (p.start, p.end)), out);
            return;
        }

        let hits = self.find_departments(text);
        if !hits.is_empty() {
            for hit in &hits {
                match hit.rank {
                    Some(rank) => out.push(Fragment::DepartmentMark {
                        department: hit.department.clone(),
                        rank,
                    }),
                    // unrecognized mark: keep the text, never guess a rank
                    None => out.push(Fragment::Unclassified(text[hit.start..hit.end].trim().to_string())),
                }
            }
            self.classify_gaps(text, hits.iter().map(|h| (h.start, h.end)), out);
            return;
        }

        let Some(cleaned) = clean_fragment(text) else {
            return;
        };

        if let Some(header) = parse_header(&cleaned) {
            out.push(Fragment::Header {
                team: header.team,
                name: header.name,
            });
            self.classify_into(header.rest, out);
            return;
        }

        if let Some(inner) = bracketed(&cleaned) {
            out.push(Fragment::Unclassified(inner.to_string()));
        } else if is_address_like(&cleaned) {
            out.push(Fragment::AddressFragment(cleaned));
        } else {
            out.push(Fragment::Unclassified(cleaned));
        }
    }

    fn classify_gaps(
        &self,
        text: &str,
        spans: impl Iterator<Item = (usize, usize)>,
        out: &mut Vec<Fragment>,
    ) {
        let mut cursor = 0;
        for (start, end) in spans {
            self.classify_into(&text[cursor..start], out);
            cursor = end;
        }
        self.classify_into(&text[cursor..], out);
    }

    /// Names resolved left to right; each glyph belongs to one name.
    ///
    /// A glyph before the name wins over one after it. `floor` moves past every
    /// consumed mark so a trailing glyph taken by one name is never read again
    /// as the leading glyph of the next. The digit form only counts when no glyph
    /// sits next to the name.
    fn find_departments(&self, text: &str) -> Vec<DepartmentHit> {
        let mut hits = Vec::new();
        let mut floor = 0;

        for m in self.name_re.find_iter(text) {
            let before = &text[floor..m.start()];
            let after = &text[m.end()..];

            let mark = if let Some(glyph) = PRE_GLYPH_RE.captures(before).and_then(|c| c.get(1)) {
                Some((floor + glyph.start(), m.end(), map_priority(glyph.as_str())))
            } else if let Some(glyph) = POST_GLYPH_RE.captures(after).and_then(|c| c.get(1)) {
                Some((m.start(), m.end() + glyph.end(), map_priority(glyph.as_str())))
            } else if let Some(digit) = PRE_DIGIT_RE.captures(before).and_then(|c| c.get(1)) {
                let rank = digit.as_str().chars().next().and_then(Rank::from_digit);
                Some((floor + digit.start(), m.end(), rank))
            } else {
                None
            };

            match mark {
                Some((start, end, rank)) => {
                    hits.push(DepartmentHit {
                        start,
                        end,
                        department: m.as_str().to_string(),
                        rank,
                    });
                    floor = end;
                }
                None => floor = m.end(),
            }
        }
        hits
    }
}

/// First email address in the text.
pub fn find_email(text: &str) -> Option<Span> {
    EMAIL_RE.find(text).map(|m| Span {
        start: m.start(),
        end: m.end(),
        value: m.as_str().to_string(),
    })
}

/// Every phone number in the text, left to right, separators canonicalised to `-`.
///
/// A match glued to more digits or dashes is rejected, which keeps postal codes and
/// lot numbers out. Brackets wrapped around a number are swallowed with it.
pub fn find_phones(text: &str) -> Vec<Span> {
    PHONE_RE
        .find_iter(text)
        .filter(|m| {
            let before = text[..m.start()].chars().next_back();
            let after = text[m.end()..].chars().next();
            !before.is_some_and(is_number_glue) && !after.is_some_and(is_number_glue)
        })
        .filter(|m| PHONE_DIGITS.contains(&m.as_str().chars().filter(char::is_ascii_digit).count()))
        .map(|m| {
            let (start, end) = widen_over_brackets(text, m.start(), m.end());
            Span {
                start,
                end,
                value: canonical_phone(m.as_str()),
            }
        })
        .collect()
}

fn is_number_glue(c: char) -> bool {
    c.is_ascii_digit() || c == '-'
}

fn widen_over_brackets(text: &str, start: usize, end: usize) -> (usize, usize) {
    let open = text[..start].chars().next_back();
    let close = text[end..].chars().next();
    match (open, close) {
        (Some(o @ ('(' | '（')), Some(c @ (')' | '）'))) => (start - o.len_utf8(), end + c.len_utf8()),
        _ => (start, end),
    }
}

fn canonical_phone(raw: &str) -> String {
    match raw.strip_prefix('(') {
        Some(rest) => {
            let (area, local) = rest.split_once(')').unwrap_or((rest, ""));
            format!("{}-{}", area, local.trim())
        }
        None => raw.to_string(),
    }
}

/// Team number at the start, then a name token.
///
/// The name must not start with a digit, hiragana (furigana lines) or punctuation. A short
/// second kana/kanji token after a surname of up to three characters is taken as the given
/// name. A trailing honorific is consumed and dropped.
pub fn parse_header(text: &str) -> Option<HeaderMatch<'_>> {
    let caps = HEADER_RE.captures(text)?;
    let team = format!("{}班", &caps[1]);
    let body = caps.get(2)?.as_str();

    let (first, mut end) = next_token(body, 0)?;
    if !starts_like_name(first) {
        return None;
    }
    let surname = strip_honorific(first);
    let mut name = surname.to_string();

    if let Some((second, second_end)) = next_token(body, end) {
        if surname.chars().count() <= 3 && !is_honorific(second) && is_given_name(strip_honorific(second)) {
            name.push(' ');
            name.push_str(strip_honorific(second));
            end = second_end;
        }
    }
    if let Some((token, token_end)) = next_token(body, end) {
        if is_honorific(token) {
            end = token_end;
        }
    }

    Some(HeaderMatch {
        team,
        name,
        rest: &body[end..],
    })
}

/// Next whitespace-separated token at or after `from`, with its end offset.
fn next_token(body: &str, from: usize) -> Option<(&str, usize)> {
    let after = &body[from..];
    let token = after.split_whitespace().next()?;
    let start = from + (after.len() - after.trim_start().len());
    Some((token, start + token.len()))
}

fn is_honorific(token: &str) -> bool {
    HONORIFICS.contains(&token)
}

fn strip_honorific(token: &str) -> &str {
    HONORIFICS
        .iter()
        .find_map(|h| token.strip_suffix(h))
        .filter(|rest| !rest.is_empty())
        .unwrap_or(token)
}

fn starts_like_name(token: &str) -> bool {
    token
        .chars()
        .next()
        .is_some_and(|c| c.is_alphabetic() && !is_hiragana(c))
}

fn is_given_name(token: &str) -> bool {
    let len = token.chars().count();
    (1..=4).contains(&len)
        && token.chars().all(|c| is_kana(c) || is_han(c))
        && !ADDRESS_KEYWORD_RE.is_match(token)
}

fn is_hiragana(c: char) -> bool {
    ('\u{3041}'..='\u{309F}').contains(&c)
}

fn is_kana(c: char) -> bool {
    is_hiragana(c) || ('\u{30A0}'..='\u{30FF}').contains(&c)
}

fn is_han(c: char) -> bool {
    matches!(c, '\u{3005}' | '\u{3400}'..='\u{4DBF}' | '\u{4E00}'..='\u{9FFF}' | '\u{F900}'..='\u{FAFF}')
}

/// Address keywords, a bare lot number, or kanji mixed with digits that are not a count.
pub fn is_address_like(text: &str) -> bool {
    if bracketed(text).is_some() {
        return false;
    }
    if ADDRESS_KEYWORD_RE.is_match(text) || LOT_NUMBER_RE.is_match(text) {
        return true;
    }
    let has_digit = text.chars().any(|c| c.is_ascii_digit());
    has_digit && text.chars().any(is_han) && !COUNT_RE.is_match(text)
}

fn bracketed(text: &str) -> Option<&str> {
    let inner = text
        .strip_prefix('(')
        .and_then(|t| t.strip_suffix(')'))
        .or_else(|| text.strip_prefix('（').and_then(|t| t.strip_suffix('）')))?;
    let inner = inner.trim();
    (!inner.is_empty()).then_some(inner)
}

/// Trim list punctuation and leftover brackets, strip field labels; `None` if nothing is left.
///
/// Stray circled glyphs are kept so they surface in notes.
pub fn clean_fragment(text: &str) -> Option<String> {
    let mut current = EMPTY_BRACKETS_RE.replace_all(text, "").into_owned();
    loop {
        let trimmed = current.trim_matches(|c: char| c.is_whitespace() || TRIM_CHARS.contains(&c));
        let stripped = LABEL_RE.replace(trimmed, "");
        if stripped.len() == trimmed.len() {
            current = trimmed.to_string();
            break;
        }
        current = stripped.into_owned();
    }

    let only_noise = current
        .chars()
        .all(|c| c.is_whitespace() || TRIM_CHARS.contains(&c));
    if only_noise {
        None
    } else {
        Some(current)
    }
}
