//! ERC721 contract generation.

use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;

use super::SideEffect;
use crate::agent::AgentHandle;
use crate::config::ParleyConfig;
use crate::error::{AgentError, ParleyError};

const DEFAULT_CONTRACT_NAME: &str = "ParleyCollectible";

fn address_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^0x[0-9a-fA-F]{40}$").expect("address pattern is valid"))
}

fn fenced_block() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?s)```(?:solidity|sol)?\s*\n(.*?)```").expect("fence pattern is valid")
    })
}

/// Asks the agent for an ERC721 contract owned by a fixed address.
#[derive(Debug, Clone)]
pub struct Erc721ContractAction {
    owner_address: String,
    contract_name: String,
}

impl Erc721ContractAction {
    /// `owner_address` must be a `0x`-prefixed, 20-byte hex address.
    pub fn new(owner_address: impl Into<String>) -> Result<Self, ParleyError> {
        let owner_address = owner_address.into().trim().to_string();
        if !address_pattern().is_match(&owner_address) {
            return Err(ParleyError::Configuration(format!(
                "Invalid owner address '{owner_address}' (expected 0x followed by 40 hex digits)"
            )));
        }
        Ok(Self {
            owner_address,
            contract_name: DEFAULT_CONTRACT_NAME.to_string(),
        })
    }

    pub fn from_config(config: &ParleyConfig) -> Result<Self, ParleyError> {
        let owner = config.owner_address.as_deref().ok_or_else(|| {
            ParleyError::Configuration(
                "No owner address configured (set PARLEY_OWNER_ADDRESS)".to_string(),
            )
        })?;
        Self::new(owner)
    }

    pub fn with_contract_name(mut self, name: impl Into<String>) -> Self {
        self.contract_name = name.into();
        self
    }

    pub fn owner_address(&self) -> &str {
        &self.owner_address
    }

    fn prompt(&self) -> String {
        format!(
            "Write a complete Solidity ERC721 contract named {name} using OpenZeppelin. \
             The contract owner must be hard-coded to {owner}, and only the owner may mint. \
             Reply with the contract source in a single ```solidity code block.",
            name = self.contract_name,
            owner = self.owner_address,
        )
    }
}

/// Pull the contract source out of a reply, preferring a fenced code block.
fn extract_source(reply: &str) -> Option<&str> {
    let source = fenced_block()
        .captures(reply)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(reply)
        .trim();
    source.contains("contract ").then_some(source)
}

#[async_trait]
impl SideEffect for Erc721ContractAction {
    fn name(&self) -> &str {
        "erc721-contract"
    }

    async fn perform(&self, agent: &AgentHandle) -> Result<String, AgentError> {
        let reply = agent.respond(&self.prompt()).await?;
        let source = extract_source(&reply).ok_or_else(|| {
            AgentError::MalformedResponse("reply does not contain a Solidity contract".into())
        })?;
        Ok(format!(
            "Generated ERC721 contract {} (owner {}):\n\n{}",
            self.contract_name, self.owner_address, source
        ))
    }
}
