//! The closed method surface of the provider.
//!
//! [`RequestMethod`] names every method the provider's generic `request`
//! entry point accepts. [`ApiMethod`] ties each name to its parameter and
//! output types at compile time, so the forwarding layer in
//! [`crate::dispatch`] can stay generic: adding a method means adding a
//! marker type here, never a new wrapper there.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::types::{
    ConnectResponse, DisconnectResponse, OperationResponse, SendMessageParams,
    SendResult, SendTransactionParams, SignDataOutput, SignDataParams,
};

// ==============================================================================
// Method Names
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RequestMethod {
    CheckConnection,
    Connect,
    Disconnect,
    SendMessage,
    SendTransaction,
    SignData,
}

impl RequestMethod {
    pub const ALL: [RequestMethod; 6] = [
        Self::CheckConnection,
        Self::Connect,
        Self::Disconnect,
        Self::SendMessage,
        Self::SendTransaction,
        Self::SignData,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::CheckConnection => "checkConnection",
            Self::Connect => "connect",
            Self::Disconnect => "disconnect",
            Self::SendMessage => "sendMessage",
            Self::SendTransaction => "sendTransaction",
            Self::SignData => "signData",
        }
    }
}

impl std::fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==============================================================================
// Request Envelope
// ==============================================================================

/// What the provider's `request` entry point receives:
/// `{"method": "...", "params": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    pub method: RequestMethod,
    pub params: serde_json::Value,
}

impl RequestEnvelope {
    pub fn new(method: RequestMethod, params: serde_json::Value) -> Self {
        Self { method, params }
    }
}

// ==============================================================================
// Typed Methods
// ==============================================================================

/// Compile-time description of one provider method.
pub trait ApiMethod {
    const METHOD: RequestMethod;
    type Params: Serialize + Send;
    type Output: DeserializeOwned + Send;
}

/// Parameters of methods that take none. Serialized as `{}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoParams {}

pub struct CheckConnection;
pub struct Connect;
pub struct Disconnect;
pub struct SendMessage;
pub struct SendTransaction;
pub struct SignData;

impl ApiMethod for CheckConnection {
    const METHOD: RequestMethod = RequestMethod::CheckConnection;
    type Params = NoParams;
    type Output = ConnectResponse;
}

impl ApiMethod for Connect {
    const METHOD: RequestMethod = RequestMethod::Connect;
    type Params = NoParams;
    type Output = ConnectResponse;
}

impl ApiMethod for Disconnect {
    const METHOD: RequestMethod = RequestMethod::Disconnect;
    type Params = NoParams;
    type Output = DisconnectResponse;
}

impl ApiMethod for SendMessage {
    const METHOD: RequestMethod = RequestMethod::SendMessage;
    type Params = SendMessageParams;
    type Output = OperationResponse<SendResult>;
}

impl ApiMethod for SendTransaction {
    const METHOD: RequestMethod = RequestMethod::SendTransaction;
    type Params = SendTransactionParams;
    type Output = OperationResponse<SendResult>;
}

impl ApiMethod for SignData {
    const METHOD: RequestMethod = RequestMethod::SignData;
    type Params = SignDataParams;
    type Output = SignDataOutput;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_names_match_serde_names() {
        for method in RequestMethod::ALL {
            let value = serde_json::to_value(method).expect("method must serialize");
            assert_eq!(value, serde_json::json!(method.as_str()));
        }
    }

    #[test]
    fn envelope_wire_shape() {
        let envelope = RequestEnvelope::new(
            RequestMethod::SignData,
            serde_json::json!({ "data": "aGk=" }),
        );
        let value = serde_json::to_value(&envelope).expect("envelope must serialize");
        assert_eq!(
            value,
            serde_json::json!({ "method": "signData", "params": { "data": "aGk=" } })
        );
    }
}
