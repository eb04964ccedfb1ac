use std::collections::HashSet;
use std::path::Path;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_DEPARTMENTS: &[&str] = &[
    "事務局",
    "会計",
    "書記",
    "名簿",
    "防犯防災",
    "回覧広報",
    "地域コミュ",
    "環境美化",
    "厚生福祉",
];

const ENV_PREFIX: &str = "ROSTER";
const LOCAL_CONFIG: &str = "roster.toml";

/// Deployment-level knobs shared by the classifier, the assembler and the exporters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Department names in output column order.
    pub departments: Vec<String>,
    /// Placeholder written for every absent value.
    pub sentinel: String,
    pub phone_separator: String,
    pub notes_separator: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            departments: DEFAULT_DEPARTMENTS.iter().map(|d| d.to_string()).collect(),
            sentinel: "null".to_string(),
            phone_separator: "/".to_string(),
            notes_separator: "、".to_string(),
        }
    }
}

impl Settings {
    /// Layer defaults, an optional TOML file and `ROSTER_*` environment variables.
    ///
    /// Without an explicit path, `roster.toml` in the working directory is read if present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => File::from(p).required(true),
            None => File::with_name(LOCAL_CONFIG).required(false),
        };

        let settings: Settings = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("departments"),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.departments.is_empty() {
            return Err(invalid("at least one department is required"));
        }
        let mut seen = HashSet::new();
        for dept in &self.departments {
            if dept.trim().is_empty() {
                return Err(invalid("department names cannot be blank"));
            }
            if !seen.insert(dept.as_str()) {
                return Err(invalid(&format!("duplicate department: {}", dept)));
            }
        }
        if self.sentinel.is_empty() {
            return Err(invalid("sentinel cannot be empty"));
        }
        Ok(())
    }
}

fn invalid(message: &str) -> Error {
    Error::InvalidSettings {
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;

    // `load` reads the process environment; tests that call it take this lock.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn toml_file(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[test]
    fn defaults_match_column_layout() {
        let s = Settings::default();
        assert_eq!(s.departments.len(), 9);
        assert_eq!(s.departments[0], "事務局");
        assert_eq!(s.departments[8], "厚生福祉");
        assert_eq!(s.sentinel, "null");
        assert_eq!(s.phone_separator, "/");
        assert!(s.validate().is_ok());
    }

    #[test]
    fn rejects_duplicates_and_blanks() {
        let mut s = Settings::default();
        s.departments.push("会計".to_string());
        assert!(s.validate().is_err());

        let mut s = Settings::default();
        s.departments = vec!["  ".to_string()];
        assert!(s.validate().is_err());

        let mut s = Settings::default();
        s.departments.clear();
        assert!(s.validate().is_err());

        let mut s = Settings::default();
        s.sentinel.clear();
        assert!(s.validate().is_err());
    }

    #[test]
    fn file_overrides_defaults() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let file = toml_file(&["sentinel = \"-\"", "departments = [\"会計\", \"書記\"]"]);

        let s = Settings::load(Some(file.path())).unwrap();
        assert_eq!(s.sentinel, "-");
        assert_eq!(s.departments, vec!["会計", "書記"]);
        // untouched keys keep their defaults
        assert_eq!(s.phone_separator, "/");
    }

    #[test]
    fn environment_overrides_file() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let file = toml_file(&[
            "sentinel = \"-\"",
            "phone_separator = \";\"",
            "departments = [\"事務局\"]",
        ]);

        std::env::set_var("ROSTER_DEPARTMENTS", "会計,書記");
        std::env::set_var("ROSTER_PHONE_SEPARATOR", "・");
        let loaded = Settings::load(Some(file.path()));
        std::env::remove_var("ROSTER_DEPARTMENTS");
        std::env::remove_var("ROSTER_PHONE_SEPARATOR");

        let s = loaded.unwrap();
        assert_eq!(s.departments, vec!["会計", "書記"]);
        assert_eq!(s.phone_separator, "・");
        // keys without an env override keep the file value
        assert_eq!(s.sentinel, "-");
        assert_eq!(s.notes_separator, "、");
    }

    #[test]
    fn environment_departments_are_validated() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let file = toml_file(&["sentinel = \"null\""]);

        std::env::set_var("ROSTER_DEPARTMENTS", "会計,会計");
        let loaded = Settings::load(Some(file.path()));
        std::env::remove_var("ROSTER_DEPARTMENTS");

        assert!(matches!(loaded, Err(Error::InvalidSettings { .. })));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = Settings::load(Some(Path::new("/definitely/not/here.toml")));
        assert!(err.is_err());
    }
}
