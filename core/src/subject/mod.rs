mod load;
mod sanitize;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use load::{load_subjects, subjects_from_value, NAME_SEPARATOR};
pub use sanitize::sanitize;

/// One entity the collection is run against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub name: String,
    /// Extra key/value pairs merged into the run's iteration data.
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl Subject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Map::new(),
        }
    }

    pub fn with_attributes(name: impl Into<String>, attributes: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            attributes,
        }
    }
}
