use serde::{Deserialize, Serialize};

pub const DEFAULT_PRACTICE_NAME: &str = "My Private Practice";
pub const DEFAULT_PROVIDER_NAME: &str = "Dr. Alex Smith";

/// Practice-wide settings singleton.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    pub practice_name: String,
    pub provider_name: String,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            practice_name: DEFAULT_PRACTICE_NAME.to_string(),
            provider_name: DEFAULT_PROVIDER_NAME.to_string(),
        }
    }
}
