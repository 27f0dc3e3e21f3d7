use super::{AssetVariant, ContentKey};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Person {
    pub full_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
}

impl Person {
    pub fn new(
        full_name: impl Into<String>,
        first_name: impl Into<String>,
        family_name: impl Into<String>,
    ) -> Self {
        Self {
            full_name: full_name.into(),
            first_name: Some(first_name.into()),
            family_name: Some(family_name.into()),
            ..Default::default()
        }
    }
}

impl AssetVariant for Person {
    fn content_key(&self) -> ContentKey {
        ContentKey::text("full_name", &self.full_name)
    }
}
