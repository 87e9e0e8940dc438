/// Failures raised by the provider client.
///
/// Data-level failures reported by the wallet (the `error` field of
/// [`OperationResponse`](crate::types::OperationResponse) and
/// [`UnsubscriptionResponse`](crate::types::UnsubscriptionResponse)) are not
/// represented here; they come back as successful values.
///
/// `Clone` so a memoized initialization outcome can be handed to every waiter.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    #[error("surfkeeper provider was not found")]
    NotFound,

    #[error("surfkeeper provider was not initialized yet")]
    NotInitialized,

    #[error("provider request failed: {0}")]
    Rpc(#[from] RpcError),

    #[error("invalid payload for `{method}`: {message}")]
    InvalidPayload { method: String, message: String },

    #[error("provider does not support `{0}`")]
    Unsupported(&'static str),

    #[error("fallback provider could not be created: {0}")]
    Fallback(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Transport-level failures surfaced by provider implementations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RpcError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("server error {code}: {message}")]
    ServerError { code: i64, message: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for RpcError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}
