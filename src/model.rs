use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A locally cached photo ready for composition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedImage {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribution: Option<String>,
    pub path: PathBuf,
}

impl StagedImage {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            attribution: None,
            path: path.into(),
        }
    }

    pub fn with_attribution(mut self, attribution: impl Into<String>) -> Self {
        let attribution = attribution.into();
        if !attribution.trim().is_empty() {
            self.attribution = Some(attribution);
        }
        self
    }
}

/// Overlay kinds that yield one composite each per staged image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayKind {
    /// No overlay enabled: the normalized photo itself.
    Plain,
    Weather,
    Calendar,
}

/// A rendered image waiting in the render folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Composite {
    pub index: usize,
    pub kind: OverlayKind,
    /// Name of the staged image this composite was drawn from.
    pub source: String,
    pub path: PathBuf,
}
