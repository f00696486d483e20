//! Shared types for the Lnswap Client SDK.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Serde module for serializing byte vectors as hex strings.
pub(crate) mod hex_bytes {
    use super::*;

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        hex::decode(&s).map_err(serde::de::Error::custom)
    }
}

/// Bitcoin network type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Bitcoin mainnet.
    Bitcoin,
    /// Bitcoin testnet.
    Testnet,
    /// Bitcoin regtest (local development).
    Regtest,
}

impl Network {
    /// Convert to bitcoin crate's Network type.
    pub fn to_bitcoin_network(self) -> bitcoin::Network {
        match self {
            Network::Bitcoin => bitcoin::Network::Bitcoin,
            Network::Testnet => bitcoin::Network::Testnet,
            Network::Regtest => bitcoin::Network::Regtest,
        }
    }

    /// Default swap service API URL for this network.
    pub fn default_api_url(self) -> &'static str {
        match self {
            Network::Bitcoin => "https://api.boltz.exchange/v2",
            Network::Testnet => "https://api.testnet.boltz.exchange/v2",
            Network::Regtest => "http://localhost:9001/v2",
        }
    }
}

impl std::str::FromStr for Network {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bitcoin" | "mainnet" => Ok(Network::Bitcoin),
            "testnet" | "testnet3" => Ok(Network::Testnet),
            "regtest" => Ok(Network::Regtest),
            _ => Err(crate::error::Error::Parse(format!(
                "Unknown network: {}",
                s
            ))),
        }
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Network::Bitcoin => write!(f, "bitcoin"),
            Network::Testnet => write!(f, "testnet"),
            Network::Regtest => write!(f, "regtest"),
        }
    }
}

/// Which way value flows through the swap service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// On-chain in, Lightning out: the user funds an escrow and the service pays their invoice.
    Submarine,
    /// Lightning in, on-chain out: the user pays an invoice and the service locks coins for them.
    Reverse,
}

impl Direction {
    /// The other direction.
    pub fn toggled(self) -> Self {
        match self {
            Direction::Submarine => Direction::Reverse,
            Direction::Reverse => Direction::Submarine,
        }
    }

    /// Path segment used by the swap service API.
    pub fn as_path(self) -> &'static str {
        match self {
            Direction::Submarine => "submarine",
            Direction::Reverse => "reverse",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_path())
    }
}

/// Endpoints and network the client talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the swap service REST API.
    pub api_url: String,
    /// URL of the push-event websocket.
    pub ws_url: String,
    /// Network lockup addresses are expected on.
    pub network: Network,
}

impl ClientConfig {
    /// Configuration pointing at the default service for `network`.
    pub fn for_network(network: Network) -> Self {
        Self::with_api_url(network.default_api_url(), network)
    }

    /// Configuration for a custom API URL; the websocket URL is derived from it.
    pub fn with_api_url(api_url: impl Into<String>, network: Network) -> Self {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        let ws_url = websocket_url(&api_url);
        Self {
            api_url,
            ws_url,
            network,
        }
    }
}

/// `http(s)://host/v2` becomes `ws(s)://host/v2/ws`.
fn websocket_url(api_url: &str) -> String {
    let base = if let Some(rest) = api_url.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = api_url.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        api_url.to_string()
    };
    format!("{base}/ws")
}
