//! Secret API keys and the credentials an agent session is built from.

use std::fmt;

use serde::Deserialize;
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::ParleyError;
use crate::models::ModelId;

/// An API key held in memory only for as long as a session needs it.
///
/// The backing buffer is wiped when the key is dropped. `Debug` and `Display`
/// never print the key; use [`ApiKey::fingerprint`] to identify it in logs.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop, Deserialize)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The raw key, for the HTTP layer only.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// First 8 hex characters of the SHA-256 of the key.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.0.as_bytes());
        digest
            .iter()
            .take(4)
            .map(|b| format!("{b:02x}"))
            .collect()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiKey({})", self.fingerprint())
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("********")
    }
}

impl From<String> for ApiKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl From<&str> for ApiKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

/// Key and model an agent handle is bound to. Never written to the history log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    api_key: ApiKey,
    model: ModelId,
}

impl Credentials {
    /// Validate and build credentials from caller input.
    ///
    /// Fails with [`ParleyError::Init`] when the key is blank or the model is
    /// not one of [`ModelId::supported`].
    pub fn new(api_key: impl Into<ApiKey>, model_id: &str) -> Result<Self, ParleyError> {
        let model = ModelId::parse_supported(model_id)?;
        Self::with_model(api_key, model)
    }

    pub fn with_model(api_key: impl Into<ApiKey>, model: ModelId) -> Result<Self, ParleyError> {
        let api_key = api_key.into();
        if api_key.is_blank() {
            return Err(ParleyError::init("API key must not be empty"));
        }
        Ok(Self { api_key, model })
    }

    pub fn api_key(&self) -> &ApiKey {
        &self.api_key
    }

    pub fn model(&self) -> ModelId {
        self.model
    }
}
