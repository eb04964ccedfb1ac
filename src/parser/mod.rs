pub mod assemble;
pub mod classify;
pub mod numerals;
pub mod priority;
pub mod segment;

use tracing::{info, warn};

use crate::error::Result;
use crate::record::Record;
use crate::settings::Settings;
use classify::Classifier;
use segment::Segmenter;

/// Three-pass pipeline: text → blocks → classified fragments → records.
#[derive(Debug, Clone)]
pub struct Extractor {
    settings: Settings,
    classifier: Classifier,
}

impl Extractor {
    pub fn new(settings: Settings) -> Result<Self> {
        settings.validate()?;
        let classifier = Classifier::new(&settings.departments)?;
        Ok(Extractor {
            settings,
            classifier,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn segmenter<'a>(&'a self, text: &'a str) -> Segmenter<'a> {
        Segmenter::new(text, &self.classifier)
    }

    /// Lazily assemble one record per block.
    pub fn records<'a>(&'a self, text: &'a str) -> impl Iterator<Item = Record> + 'a {
        self.segmenter(text)
            .blocks()
            .map(move |block| assemble::assemble(&block, &self.classifier, &self.settings))
    }

    pub fn extract(&self, text: &str) -> Vec<Record> {
        let records: Vec<Record> = self.records(text).collect();
        if records.is_empty() && !text.trim().is_empty() {
            warn!(chars = text.chars().count(), "no team headers found, document yielded no records");
        } else {
            info!(records = records.len(), "extracted records");
        }
        records
    }
}
