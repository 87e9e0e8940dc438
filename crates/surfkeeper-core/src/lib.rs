pub mod api;
pub mod client;
pub mod dispatch;
pub mod environment;
pub mod error;
pub mod init;
pub mod locator;
pub mod network;
pub mod provider;
pub mod subscription;
#[cfg(test)]
mod test_util;
pub mod types;

pub use client::{NetworkScope, ProviderRpcClient};
pub use error::{ProviderError, RpcError};
pub use init::{ClientProperties, InitializationState};
pub use network::NetworkKey;
pub use provider::{HttpProvider, HttpProviderConfig, Provider};
