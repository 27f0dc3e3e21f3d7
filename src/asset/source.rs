use super::{AssetVariant, ContentKey};
use serde::{Deserialize, Serialize};

/// Attribution: the data source an observation came from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Source {
    pub name: String,
    /// Confidence in the source, 0-100
    pub confidence: u8,
}

impl Source {
    pub fn new(name: impl Into<String>, confidence: u8) -> Self {
        Self {
            name: name.into(),
            confidence: confidence.min(100),
        }
    }
}

impl AssetVariant for Source {
    fn content_key(&self) -> ContentKey {
        ContentKey::text("name", &self.name)
    }
}
