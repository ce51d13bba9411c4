//! Immutable catalog of projects, monitored accounts and topic keywords.
//!
//! Built once at startup and handed to the jobs by reference. Sampling is
//! unseeded: callers may only rely on cardinality and membership.

use crate::config::CatalogConfig;
use crate::error::ConfigError;
use crate::types::{KeywordSet, ProjectEntry};
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct Catalog {
    projects: Vec<ProjectEntry>,
    accounts: Vec<String>,
    keywords: KeywordSet,
}

impl Catalog {
    pub fn new(
        projects: Vec<ProjectEntry>,
        accounts: Vec<String>,
        keywords: KeywordSet,
    ) -> Result<Self, ConfigError> {
        let mut names = HashSet::new();
        for project in &projects {
            if project.name.trim().is_empty() {
                return Err(ConfigError::MissingField {
                    field: "catalog.projects.name".to_string(),
                });
            }
            if !names.insert(project.name.to_lowercase()) {
                return Err(ConfigError::ValidationFailed {
                    reason: format!("duplicate project name '{}'", project.name),
                });
            }
        }

        let mut seen = HashSet::new();
        let accounts: Vec<String> = accounts
            .into_iter()
            .map(|handle| handle.trim().trim_start_matches('@').to_string())
            .filter(|handle| !handle.is_empty())
            .filter(|handle| seen.insert(handle.to_lowercase()))
            .collect();

        Ok(Self {
            projects,
            accounts,
            keywords,
        })
    }

    /// Uses the `[catalog]` config section when present, the built-in lists
    /// otherwise. Empty lists in the section fall back to the built-in ones.
    pub fn from_config(config: Option<&CatalogConfig>) -> Result<Self, ConfigError> {
        let builtin = Self::builtin();
        let Some(config) = config else {
            return Ok(builtin);
        };

        let projects = if config.projects.is_empty() {
            builtin.projects
        } else {
            config.projects.clone()
        };
        let accounts = if config.accounts.is_empty() {
            builtin.accounts
        } else {
            config.accounts.clone()
        };
        let keywords = if config.keywords.is_empty() {
            builtin.keywords
        } else {
            KeywordSet::new(config.keywords.iter().cloned())
        };

        Self::new(projects, accounts, keywords)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: CatalogConfig = toml::from_str(content)?;
        Self::from_config(Some(&config))
    }

    pub fn builtin() -> Self {
        let projects = BUILTIN_PROJECTS
            .iter()
            .map(|(name, handle, website, category)| ProjectEntry {
                name: name.to_string(),
                handle: handle.to_string(),
                website: website.to_string(),
                category: category.to_string(),
            })
            .collect();

        Self {
            projects,
            accounts: BUILTIN_ACCOUNTS.iter().map(|a| a.to_string()).collect(),
            keywords: KeywordSet::new(BUILTIN_KEYWORDS.iter().copied()),
        }
    }

    pub fn projects(&self) -> &[ProjectEntry] {
        &self.projects
    }

    pub fn accounts(&self) -> &[String] {
        &self.accounts
    }

    pub fn keywords(&self) -> &KeywordSet {
        &self.keywords
    }

    pub fn sample_projects(&self, n: usize) -> Vec<ProjectEntry> {
        sample(&self.projects, n)
    }

    pub fn sample_accounts(&self, n: usize) -> Vec<String> {
        sample(&self.accounts, n)
    }
}

/// Unbiased sample without replacement. Returns the whole collection, in
/// catalog order, when it holds no more than `n` items.
fn sample<T: Clone>(items: &[T], n: usize) -> Vec<T> {
    if items.len() <= n {
        return items.to_vec();
    }
    let mut indices: Vec<usize> = (0..items.len()).collect();
    fastrand::shuffle(&mut indices);
    indices
        .into_iter()
        .take(n)
        .map(|i| items[i].clone())
        .collect()
}

const BUILTIN_PROJECTS: &[(&str, &str, &str, &str)] = &[
    ("Monad", "@monad_xyz", "https://www.monad.xyz", "Parallel EVM"),
    ("Berachain", "@berachain", "https://www.berachain.com", "Proof of Liquidity L1"),
    ("Eclipse", "@EclipseFND", "https://www.eclipse.xyz", "SVM Layer 2"),
    ("Movement", "@movementlabsxyz", "https://movementlabs.xyz", "Move Layer 2"),
    ("Celestia", "@CelestiaOrg", "https://celestia.org", "Modular Data Availability"),
    ("EigenLayer", "@eigenlayer", "https://www.eigenlayer.xyz", "Restaking"),
    ("Hyperliquid", "@HyperliquidX", "https://hyperliquid.xyz", "Perpetuals DEX"),
    ("Ethena", "@ethena_labs", "https://ethena.fi", "Synthetic Dollar"),
    ("Jupiter", "@JupiterExchange", "https://jup.ag", "DEX Aggregator"),
    ("Aave", "@aave", "https://aave.com", "Lending"),
    ("Uniswap", "@Uniswap", "https://uniswap.org", "DEX"),
    ("Arbitrum", "@arbitrum", "https://arbitrum.io", "Optimistic Rollup"),
    ("Starknet", "@Starknet", "https://www.starknet.io", "ZK Rollup"),
    ("zkSync", "@zksync", "https://zksync.io", "ZK Rollup"),
    ("Sui", "@SuiNetwork", "https://sui.io", "Move Layer 1"),
    ("Aptos", "@Aptos", "https://aptosfoundation.org", "Move Layer 1"),
    ("Pyth Network", "@PythNetwork", "https://pyth.network", "Oracle"),
    ("Chainlink", "@chainlink", "https://chain.link", "Oracle"),
    ("Bittensor", "@opentensor", "https://bittensor.com", "Decentralized AI"),
    ("Render", "@rendernetwork", "https://rendernetwork.com", "GPU Network"),
    ("Immutable", "@Immutable", "https://www.immutable.com", "Web3 Gaming"),
    ("Ondo Finance", "@OndoFinance", "https://ondo.finance", "Real World Assets"),
];

const BUILTIN_ACCOUNTS: &[&str] = &[
    "VitalikButerin",
    "cz_binance",
    "brian_armstrong",
    "aeyakovenko",
    "haydenzadams",
    "StaniKulechov",
    "sreeramkannan",
    "balajis",
    "cobie",
    "hasufl",
    "punk6529",
    "DefiIgnas",
    "MessariCrypto",
    "Delphi_Digital",
    "santiagoroel",
];

const BUILTIN_KEYWORDS: &[&str] = &[
    "DeFi",
    "NFT",
    "Layer 2",
    "rollup",
    "zero knowledge",
    "airdrop",
    "staking",
    "restaking",
    "liquidity",
    "yield",
    "Bitcoin",
    "Ethereum",
    "Solana",
    "stablecoin",
    "memecoin",
    "tokenomics",
    "mainnet",
    "testnet",
    "AI agents",
    "regulation",
    "gaming",
    "metaverse",
    "Web3",
    "DAO",
    "RWA",
];
