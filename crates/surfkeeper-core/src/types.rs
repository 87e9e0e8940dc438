//! Wire data contracts for the wallet provider methods.
//!
//! These mirror the JSON shapes the injected provider accepts and returns,
//! so every struct uses camelCase field names on the wire. The dispatch layer
//! never inspects them; the typing lives in [`crate::api`].

use serde::{Deserialize, Serialize};

/// Contract ABI as a JSON string.
pub type Abi = String;

/// Raw account address, e.g. `0:abc...`.
pub type Address = String;

// ==============================================================================
// Network Names
// ==============================================================================

/// Name of the network a message or transaction is sent in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EverscaleNetNameKey {
    Mainnet,
    Devnet,
}

impl std::fmt::Display for EverscaleNetNameKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mainnet => write!(f, "mainnet"),
            Self::Devnet => write!(f, "devnet"),
        }
    }
}

impl std::str::FromStr for EverscaleNetNameKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mainnet" => Ok(Self::Mainnet),
            "devnet" => Ok(Self::Devnet),
            other => Err(format!("unknown net name `{other}`; expected mainnet or devnet")),
        }
    }
}

// ==============================================================================
// Connection
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectResponse {
    pub is_connected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisconnectResponse {
    pub is_connected: bool,
}

// ==============================================================================
// Signing
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignDataParams {
    /// Base64 encoded arbitrary bytes.
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignDataOutput {
    /// Base64 encoded signature bytes (64 bytes once decoded).
    pub signature: String,
}

// ==============================================================================
// Messages and Transactions
// ==============================================================================

/// Optional message header passed alongside a contract call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionHeader {
    /// Message expiration time in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expire: Option<u32>,
    /// Message creation time in milliseconds; `now` when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<u64>,
    /// Hex encoded public key checked by the contract.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pubkey: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallSet {
    pub function_name: String,
    pub input: serde_json::Map<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<FunctionHeader>,
}

/// Internal message sent from the user account. The wallet shows an
/// approval window before sending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageParams {
    pub abi: Abi,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    pub address: Address,
    /// Amount of nano tokens to attach.
    pub amount: String,
    pub bounce: bool,
    pub call_set: CallSet,
    pub net: EverscaleNetNameKey,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendTransactionParams {
    /// Amount of nano tokens to send.
    pub amount: String,
    pub bounce: bool,
    /// Comment placed in the transaction payload.
    pub comment: String,
    pub net: EverscaleNetNameKey,
    pub to: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultOfSendMessage {
    /// Last shard block of the destination account before sending.
    pub shard_block_id: String,
    pub sending_endpoints: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendResult {
    #[serde(rename = "sendMessageResult")]
    pub send_message_result: ResultOfSendMessage,
    #[serde(rename = "messageID")]
    pub message_id: String,
}

/// Output of operations that may fail inside the wallet after the call
/// itself went through (user rejected, not enough balance, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationResponse<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> OperationResponse<T> {
    pub fn is_err(&self) -> bool {
        self.error.is_some()
    }

    /// Collapse the response into a `Result`. A response carrying neither a
    /// result nor an error is treated as an empty success.
    pub fn into_result(self) -> Result<Option<T>, String> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.result),
        }
    }
}

// ==============================================================================
// Unsubscription
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsubscriptionResponse {
    pub is_unsubscribed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
