use std::iter::Peekable;
use std::str::Lines;
use std::sync::LazyLock;

use regex::Regex;

use super::classify::Classifier;
use super::numerals::normalize_line;

/// Page separator written between pages by the OCR stage: `=== ページ 3 ===`.
static PAGE_BREAK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^=+\s*ページ\s*[0-9]+\s*=+$").unwrap());

/// The raw lines of one person's entry; the first line is the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block<'a> {
    pub lines: Vec<&'a str>,
}

impl<'a> Block<'a> {
    pub fn header(&self) -> &'a str {
        self.lines[0]
    }
}

/// Splits a document into per-record blocks anchored on header lines.
#[derive(Debug, Clone, Copy)]
pub struct Segmenter<'a> {
    text: &'a str,
    classifier: &'a Classifier,
}

impl<'a> Segmenter<'a> {
    pub fn new(text: &'a str, classifier: &'a Classifier) -> Self {
        Segmenter { text, classifier }
    }

    /// Lazily yield blocks; each call starts over from the top of the text.
    pub fn blocks(&self) -> Blocks<'a> {
        Blocks {
            lines: self.text.lines().peekable(),
            classifier: self.classifier,
        }
    }
}

pub struct Blocks<'a> {
    lines: Peekable<Lines<'a>>,
    classifier: &'a Classifier,
}

impl<'a> Blocks<'a> {
    fn is_header(&self, line: &str) -> bool {
        self.classifier.starts_record(normalize_line(line).trim())
    }
}

impl<'a> Iterator for Blocks<'a> {
    type Item = Block<'a>;

    fn next(&mut self) -> Option<Block<'a>> {
        // preamble (titles, instructions) before the first header is skipped here
        let header = loop {
            let line = self.lines.next()?;
            if self.is_header(line) {
                break line;
            }
        };

        let mut lines = vec![header.trim()];
        while let Some(&line) = self.lines.peek() {
            if self.is_header(line) {
                break;
            }
            self.lines.next();
            if !is_filler(line) {
                lines.push(line.trim());
            }
        }

        Some(Block { lines })
    }
}

fn is_filler(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || PAGE_BREAK_RE.is_match(&normalize_line(trimmed))
}
