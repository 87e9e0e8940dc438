use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::dispatch::{RpcDispatch, SubscriptionDispatch};
use crate::init::ProviderSlot;

// ==============================================================================
// Network Keys
// ==============================================================================

/// Networks a multi-chain provider exposes as separate sub-interfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NetworkKey {
    Everscale,
    EverscaleDevnet,
    Gosh,
    Ton,
    TonTestnet,
    Venom,
    VenomTestnet,
}

impl NetworkKey {
    pub const ALL: [NetworkKey; 7] = [
        Self::Everscale,
        Self::EverscaleDevnet,
        Self::Gosh,
        Self::Ton,
        Self::TonTestnet,
        Self::Venom,
        Self::VenomTestnet,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Everscale => "everscale",
            Self::EverscaleDevnet => "everscaleDevnet",
            Self::Gosh => "gosh",
            Self::Ton => "ton",
            Self::TonTestnet => "tonTestnet",
            Self::Venom => "venom",
            Self::VenomTestnet => "venomTestnet",
        }
    }

    pub fn is_testnet(self) -> bool {
        matches!(
            self,
            Self::EverscaleDevnet | Self::TonTestnet | Self::VenomTestnet
        )
    }
}

impl std::fmt::Display for NetworkKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NetworkKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| format!("unknown network `{s}`"))
    }
}

// ==============================================================================
// Multiplexer
// ==============================================================================

/// One RPC and subscription proxy per [`NetworkKey`], all reading the same
/// provider slot. Built once; holds nothing beyond the mapping.
#[derive(Debug, Clone)]
pub struct NetworkMultiplexer {
    rpc: HashMap<NetworkKey, RpcDispatch>,
    subscriptions: HashMap<NetworkKey, SubscriptionDispatch>,
}

impl NetworkMultiplexer {
    pub(crate) fn new(slot: &Arc<ProviderSlot>) -> Self {
        let rpc = NetworkKey::ALL
            .into_iter()
            .map(|key| (key, RpcDispatch::for_network(Arc::clone(slot), key)))
            .collect();
        let subscriptions = NetworkKey::ALL
            .into_iter()
            .map(|key| (key, SubscriptionDispatch::for_network(Arc::clone(slot), key)))
            .collect();
        Self { rpc, subscriptions }
    }

    pub fn rpc(&self, key: NetworkKey) -> &RpcDispatch {
        // Every key is inserted at construction.
        &self.rpc[&key]
    }

    pub fn subscriptions(&self, key: NetworkKey) -> &SubscriptionDispatch {
        &self.subscriptions[&key]
    }
}
