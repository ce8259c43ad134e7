//! Supported model identifiers.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use crate::error::ParleyError;

/// Models an agent session can be initialized with.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
)]
pub enum ModelId {
    #[default]
    #[strum(serialize = "gpt-4o-mini")]
    #[serde(rename = "gpt-4o-mini")]
    Gpt4oMini,
    #[strum(serialize = "gpt-4o")]
    #[serde(rename = "gpt-4o")]
    Gpt4o,
    #[strum(serialize = "gpt-4")]
    #[serde(rename = "gpt-4")]
    Gpt4,
    #[strum(serialize = "gpt-3.5-turbo")]
    #[serde(rename = "gpt-3.5-turbo")]
    Gpt35Turbo,
}

impl ModelId {
    /// Get the API model identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gpt4oMini => "gpt-4o-mini",
            Self::Gpt4o => "gpt-4o",
            Self::Gpt4 => "gpt-4",
            Self::Gpt35Turbo => "gpt-3.5-turbo",
        }
    }

    /// All supported models, default first.
    pub fn supported() -> Vec<ModelId> {
        Self::iter().collect()
    }

    /// Parse a model identifier, rejecting anything unsupported as an init failure.
    pub fn parse_supported(model_id: &str) -> Result<Self, ParleyError> {
        let trimmed = model_id.trim();
        trimmed.parse().map_err(|_| {
            let known = Self::iter()
                .map(|m| m.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            ParleyError::init(format!(
                "Unsupported model '{trimmed}' (expected one of: {known})"
            ))
        })
    }
}
