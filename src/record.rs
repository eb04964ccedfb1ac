use serde::Serialize;

use crate::parser::priority::Rank;
use crate::settings::Settings;

pub const TEAM_COLUMN: &str = "班";
pub const NAME_COLUMN: &str = "氏名";
pub const ADDRESS_COLUMN: &str = "住所";
pub const PHONE_COLUMN: &str = "TEL";
pub const EMAIL_COLUMN: &str = "メールアドレス";
pub const NOTES_COLUMN: &str = "補足事項";

/// One person's roster entry. Absent scalars hold the configured sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub team_number: String,
    pub name: String,
    pub address: String,
    pub phones: Vec<String>,
    pub email: String,
    pub preferences: Vec<Preference>,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Preference {
    pub department: String,
    pub rank: Option<Rank>,
}

impl Record {
    /// Rank given to `department`, if any.
    pub fn preference(&self, department: &str) -> Option<Rank> {
        self.preferences
            .iter()
            .find(|p| p.department == department)
            .and_then(|p| p.rank)
    }

    pub fn ranked(&self) -> impl Iterator<Item = (&str, Rank)> {
        self.preferences
            .iter()
            .filter_map(|p| p.rank.map(|r| (p.department.as_str(), r)))
    }

    /// Cells in `column_headers` order.
    pub fn to_row(&self, settings: &Settings) -> Vec<String> {
        let phones = if self.phones.is_empty() {
            settings.sentinel.clone()
        } else {
            self.phones.join(settings.phone_separator.as_str())
        };

        let mut row = vec![
            self.team_number.clone(),
            self.name.clone(),
            self.address.clone(),
            phones,
            self.email.clone(),
        ];
        row.extend(settings.departments.iter().map(|dept| {
            self.preference(dept)
                .map(|r| r.to_string())
                .unwrap_or_else(|| settings.sentinel.clone())
        }));
        row.push(self.notes.clone());
        row
    }
}

pub fn column_headers(settings: &Settings) -> Vec<String> {
    let mut headers: Vec<String> = [TEAM_COLUMN, NAME_COLUMN, ADDRESS_COLUMN, PHONE_COLUMN, EMAIL_COLUMN]
        .iter()
        .map(|c| c.to_string())
        .collect();
    headers.extend(settings.departments.iter().cloned());
    headers.push(NOTES_COLUMN.to_string());
    headers
}
