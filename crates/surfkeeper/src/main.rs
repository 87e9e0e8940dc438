mod cli;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use eyre::{eyre, WrapErr};
use serde::Serialize;

use surfkeeper_core::api::{self, ApiMethod, NoParams};
use surfkeeper_core::environment::HeadlessEnvironment;
use surfkeeper_core::subscription::{
    SubscriptionKind, SubscriptionListener, SubscriptionRequest, SubscriptionUpdate,
};
use surfkeeper_core::types::{SendMessageParams, SendTransactionParams, SignDataParams};
use surfkeeper_core::{
    ClientProperties, HttpProvider, HttpProviderConfig, NetworkKey, Provider, ProviderError,
    ProviderRpcClient,
};

use cli::Command;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let args = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_file(true)
        .with_line_number(true)
        .with_level(true)
        .init();

    let config = HttpProviderConfig {
        url: args.bridge_url.clone(),
        user: args.bridge_user.clone(),
        pass: args.bridge_pass.clone(),
        requests_per_second: args.requests_per_second,
        poll_interval: Duration::from_millis(args.poll_interval_ms),
    };

    // No page hosts this process, so the bridge provider is the only option.
    let client = ProviderRpcClient::new(
        Arc::new(HeadlessEnvironment),
        ClientProperties::new()
            .force_use_fallback(true)
            .with_fallback(move || async move {
                Ok(Arc::new(HttpProvider::new(config)?) as Arc<dyn Provider>)
            }),
    );
    client
        .ensure_initialized()
        .await
        .wrap_err("while configuring the wallet bridge provider")?;
    tracing::info!(url = %args.bridge_url, network = ?args.network, "bridge provider ready");

    let network = args.network;
    match args.command {
        Command::Status => {
            let status = call::<api::CheckConnection>(&client, network, NoParams {}).await;
            print_json(&bridge_result(&args.bridge_url, status)?)
        }
        Command::Connect => {
            let status = call::<api::Connect>(&client, network, NoParams {}).await;
            print_json(&bridge_result(&args.bridge_url, status)?)
        }
        Command::Disconnect => {
            let status = call::<api::Disconnect>(&client, network, NoParams {}).await;
            print_json(&bridge_result(&args.bridge_url, status)?)
        }
        Command::SignData { data } => {
            let signed = call::<api::SignData>(&client, network, SignDataParams { data }).await;
            print_json(&bridge_result(&args.bridge_url, signed)?)
        }
        Command::SendTransaction {
            to,
            amount,
            comment,
            bounce,
            net,
        } => {
            let params = SendTransactionParams {
                amount,
                bounce,
                comment,
                net,
                to,
            };
            let sent = call::<api::SendTransaction>(&client, network, params).await;
            let sent = bridge_result(&args.bridge_url, sent)?;
            if let Some(error) = &sent.error {
                tracing::warn!(%error, "wallet rejected the transaction");
            }
            print_json(&sent)
        }
        Command::SendMessage { params } => {
            let params: SendMessageParams =
                serde_json::from_str(&params).context("parse --params as send message JSON")?;
            let sent = call::<api::SendMessage>(&client, network, params).await;
            let sent = bridge_result(&args.bridge_url, sent)?;
            if let Some(error) = &sent.error {
                tracing::warn!(%error, "wallet rejected the message");
            }
            print_json(&sent)
        }
        Command::WatchBalance { address } => {
            watch(&client, network, SubscriptionKind::balance(address)).await
        }
        Command::WatchConnection => watch(&client, network, SubscriptionKind::IsConnected).await,
    }
}

/// Issue a typed call, through the per-network sub-interface when one is
/// selected.
async fn call<M: ApiMethod>(
    client: &ProviderRpcClient,
    network: Option<NetworkKey>,
    params: M::Params,
) -> Result<M::Output, ProviderError> {
    match network {
        Some(key) => client.on(key).call::<M>(params).await,
        None => {
            client.ensure_initialized().await?;
            client.api().call::<M>(params).await
        }
    }
}

async fn watch(
    client: &ProviderRpcClient,
    network: Option<NetworkKey>,
    kind: SubscriptionKind,
) -> eyre::Result<()> {
    let request = SubscriptionRequest::new(
        kind.clone(),
        SubscriptionListener::new(|update| {
            let line = match update {
                SubscriptionUpdate::Balance(balance) => serde_json::json!({ "balance": balance }),
                SubscriptionUpdate::IsConnected(connected) => {
                    serde_json::json!({ "isConnected": connected })
                }
            };
            println!("{line}");
        }),
    );
    let disposer = match network {
        Some(key) => client.on(key).subscribe(request).await,
        None => client.subscribe(request).await,
    }
    .wrap_err("subscribe to wallet updates")?;

    tracing::info!(subscription = %kind.subscription_type(), "watching; press Ctrl-C to stop");
    tokio::signal::ctrl_c()
        .await
        .context("wait for Ctrl-C")?;

    disposer.remove();
    tracing::info!("subscription removed");
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> eyre::Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("render JSON output")?;
    println!("{rendered}");
    Ok(())
}

fn bridge_result<T>(bridge_url: &str, result: Result<T, ProviderError>) -> eyre::Result<T> {
    result.map_err(|err| {
        let message = format_bridge_error(bridge_url, &err.to_string());
        eyre!(message).wrap_err("while calling the wallet bridge")
    })
}

fn format_bridge_error(bridge_url: &str, source_error: &str) -> String {
    let mut lines = vec![
        format!("wallet bridge request to `{bridge_url}` failed"),
        format!("error: {source_error}"),
    ];

    if source_error.contains("dns error") {
        lines.push(
            "hint: hostname resolution failed; verify the bridge hostname and your network".into(),
        );
    } else if source_error.contains("certificate") || source_error.contains("tls") {
        lines.push(
            "hint: TLS handshake failed; verify certificate trust and that the bridge uses HTTPS"
                .into(),
        );
    } else if source_error.contains("401") || source_error.contains("403") {
        lines.push("hint: authentication failed; verify --bridge-user/--bridge-pass".into());
    } else if source_error.contains("not initialized") {
        lines.push("hint: the bridge does not expose the selected --network".into());
    } else if source_error.contains("error sending request") {
        lines.push("hint: request could not be sent; verify the bridge is running and reachable".into());
    }

    lines.join("\n")
}
