pub mod error;
pub mod export;
pub mod parser;
pub mod record;
pub mod settings;

pub use error::{Error, Result};
pub use parser::Extractor;
pub use record::Record;
pub use settings::Settings;
