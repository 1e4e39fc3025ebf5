use serde::{Deserialize, Serialize};

/// One failed assertion, or one synthetic entry for a run that left nothing
/// to inspect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    #[serde(rename = "file")]
    pub source_file: String,
    #[serde(rename = "request")]
    pub request_label: String,
    #[serde(rename = "error")]
    pub error_message: String,
}

impl FailureRecord {
    pub fn new(
        source_file: impl Into<String>,
        request_label: impl Into<String>,
        error_message: impl Into<String>,
    ) -> Self {
        Self {
            source_file: source_file.into(),
            request_label: request_label.into(),
            error_message: error_message.into(),
        }
    }
}

// Shape of the tool's json reporter export; only the parts read here.

#[derive(Debug, Deserialize)]
pub(crate) struct ResultArtifact {
    pub run: RunSection,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RunSection {
    #[serde(default)]
    pub failures: Vec<FailureEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FailureEntry {
    #[serde(default)]
    pub source: Option<FailureSource>,
    #[serde(default)]
    pub error: Option<FailureError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FailureSource {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FailureError {
    #[serde(default)]
    pub message: Option<String>,
}
