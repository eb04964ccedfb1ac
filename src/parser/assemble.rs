use std::collections::BTreeMap;

use tracing::debug;

use super::classify::{Classifier, Fragment};
use super::numerals::normalize_line;
use super::priority::{is_mark_only, Rank};
use super::segment::Block;
use crate::record::{Preference, Record};
use crate::settings::Settings;

/// Field values gathered while folding over a block's lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Accumulator {
    team: Option<String>,
    name: Option<String>,
    address: Vec<String>,
    phones: Vec<String>,
    email: Option<String>,
    ranks: BTreeMap<String, Rank>,
    notes: Vec<String>,
}

impl Accumulator {
    pub fn absorb(self, fragments: Vec<Fragment>) -> Self {
        fragments.into_iter().fold(self, Accumulator::apply)
    }

    pub fn apply(mut self, fragment: Fragment) -> Self {
        match fragment {
            Fragment::Header { team, name } => {
                if self.team.is_none() {
                    self.team = Some(team);
                    self.name = Some(name);
                } else {
                    self.notes.push(format!("{} {}", team, name));
                }
            }
            Fragment::Email(email) => {
                if self.email.is_none() {
                    self.phones.retain(|p| *p != email);
                    self.email = Some(email);
                } else if self.email.as_deref() != Some(email.as_str()) {
                    self.notes.push(email);
                }
            }
            Fragment::Phone(phones) => {
                for phone in phones {
                    if !self.phones.contains(&phone) && self.email.as_ref() != Some(&phone) {
                        self.phones.push(phone);
                    }
                }
            }
            Fragment::DepartmentMark { department, rank } => {
                if let Some(existing) = self.ranks.get(&department) {
                    debug!(%department, kept = %existing, ignored = %rank, "duplicate department mark");
                } else {
                    self.ranks.insert(department, rank);
                }
            }
            Fragment::AddressFragment(text) => self.address.push(text),
            Fragment::Unclassified(text) => self.notes.push(text),
        }
        self
    }

    /// Close the record: every department present, absent scalars set to the sentinel.
    pub fn finish(self, settings: &Settings) -> Record {
        let or_sentinel = |value: Option<String>| value.unwrap_or_else(|| settings.sentinel.clone());
        let joined = |parts: Vec<String>, sep: &str| (!parts.is_empty()).then(|| parts.join(sep));

        let preferences = settings
            .departments
            .iter()
            .map(|dept| Preference {
                department: dept.clone(),
                rank: self.ranks.get(dept).copied(),
            })
            .collect();

        Record {
            team_number: or_sentinel(self.team),
            name: or_sentinel(self.name),
            address: or_sentinel(joined(self.address, " ")),
            phones: self.phones,
            email: or_sentinel(self.email),
            preferences,
            notes: or_sentinel(joined(self.notes, settings.notes_separator.as_str())),
        }
    }
}

/// Fold one block into a record: normalize, classify, accumulate.
pub fn assemble(block: &Block<'_>, classifier: &Classifier, settings: &Settings) -> Record {
    let lines = block.lines.iter().map(|line| normalize_line(line)).collect();
    let record = rejoin_split_marks(lines, classifier)
        .iter()
        .fold(Accumulator::default(), |acc, normalized| {
            let fragments = classifier.classify(normalized);
            let kinds: Vec<&str> = fragments.iter().map(Fragment::kind).collect();
            debug!(line = %normalized, ?kinds, "classified line");
            acc.absorb(fragments)
        })
        .finish(settings);

    debug!(team = %record.team_number, name = %record.name, "assembled record");
    record
}

/// Put a glyph that OCR moved onto its own line back next to its department name.
///
/// It joins the end of the previous line when that line ends in an unmarked name,
/// otherwise the start of the next line when that one opens with a name. A glyph
/// that fits neither stays a line of its own.
fn rejoin_split_marks(lines: Vec<String>, classifier: &Classifier) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut pending: Option<String> = None;

    for line in lines {
        if let Some(mark) = pending.take() {
            if classifier.starts_with_department(&line) {
                out.push(format!("{}{}", mark, line.trim_start()));
                continue;
            }
            out.push(mark);
        }

        if is_mark_only(&line) {
            match out.last_mut() {
                Some(prev) if classifier.ends_with_bare_department(prev.as_str()) => prev.push_str(line.trim()),
                _ => pending = Some(line.trim().to_string()),
            }
            continue;
        }
        out.push(line);
    }
    out.extend(pending);
    out
}
