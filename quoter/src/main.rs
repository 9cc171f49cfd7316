//! Veil Quoter - Main entry point
//!
//! One-shot CLI over the bridge client registry: fetches the bridge data
//! snapshot, builds the asset catalog, and answers expected-output, expiry,
//! and APR queries for a chosen bridge.

use std::sync::Arc;
use std::time::Duration;

use clap::{Arg, ArgMatches, Command};
use ethers::types::U256;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use veil_bridge_data::{
    AssetCatalog, BridgeClientName, BridgeClientRegistry, BridgeClientSource, DataProviderClient,
    EthereumRpc, RollupProviderClient,
};
use veil_quoter::{
    config::QuoterConfig,
    error::{QuoterError, Result},
    query::{ExpectedOutputArgs, ExpectedOutputQuery, QueryInput},
    VERSION,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let matches = Command::new("veil-quoter")
        .version(VERSION)
        .about("Veil Quoter - expected-output quotes through the rollup's bridges")
        .arg(
            Arg::new("rpc-url")
                .long("rpc-url")
                .value_name("URL")
                .help("Ethereum JSON-RPC URL (overrides config)"),
        )
        .arg(
            Arg::new("data-provider")
                .long("data-provider")
                .value_name("ADDRESS")
                .help("On-chain data provider address (overrides config)"),
        )
        .arg(
            Arg::new("falafel-url")
                .long("falafel-url")
                .value_name("URL")
                .help("Rollup provider base URL (overrides config)"),
        )
        .arg(
            Arg::new("bridge")
                .short('b')
                .long("bridge")
                .value_name("NAME")
                .help("Bridge to quote through (curve-lido, dca, euler, element, yearn)")
                .default_value("curve-lido"),
        )
        .arg(
            Arg::new("input-asset")
                .long("input-asset")
                .value_name("ID")
                .help("Input asset id")
                .default_value("0"),
        )
        .arg(
            Arg::new("input-asset-b")
                .long("input-asset-b")
                .value_name("ID")
                .help("Second input asset id (optional)"),
        )
        .arg(
            Arg::new("output-asset")
                .long("output-asset")
                .value_name("ID")
                .help("Output asset id")
                .default_value("2"),
        )
        .arg(
            Arg::new("output-asset-b")
                .long("output-asset-b")
                .value_name("ID")
                .help("Second output asset id (optional)"),
        )
        .arg(
            Arg::new("aux-data")
                .long("aux-data")
                .value_name("VALUE")
                .help("Bridge-specific auxiliary value (e.g. tranche expiry)")
                .default_value("0"),
        )
        .arg(
            Arg::new("amount")
                .short('a')
                .long("amount")
                .value_name("AMOUNT")
                .help("Input amount in the asset's smallest units")
                .default_value("1000000000000000000"),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .help("Log level (trace, debug, info, warn, error)")
                .default_value("info"),
        )
        .arg(
            Arg::new("list-bridges")
                .long("list-bridges")
                .help("List supported bridges and registered deployments, then exit")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("expiries")
                .long("expiries")
                .help("List valid aux-data values for the input asset, then exit")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("apr")
                .long("apr")
                .help("Print the bridge's APR for the output asset, then exit")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    // Initialize logging
    let log_level = matches.get_one::<String>("log-level").unwrap();
    init_logging(log_level);

    info!(version = VERSION, "Starting Veil Quoter");

    // Load configuration and apply command line overrides
    let mut config = QuoterConfig::load()?;
    if let Some(url) = matches.get_one::<String>("rpc-url") {
        config.rpc.http_url = url.clone();
    }
    if let Some(address) = matches.get_one::<String>("data-provider") {
        config.rollup.data_provider_address = address.clone();
    }
    if let Some(url) = matches.get_one::<String>("falafel-url") {
        config.rollup.falafel_url = url.clone();
    }
    config.validate()?;

    // Optional Prometheus listener
    if config.metrics.enabled {
        install_metrics(&config)?;
    }

    // Fetch the shared bridge data snapshot
    let rpc = EthereumRpc::connect(&config.rpc.http_url)?;
    let data_provider = DataProviderClient::new(rpc.clone(), config.data_provider_address()?);
    let snapshot = data_provider.fetch_snapshot().await?;

    // Build the asset catalog, falling back to the built-in set
    let rollup_provider = RollupProviderClient::new(config.rollup.falafel_url.clone());
    let catalog = match rollup_provider.status().await {
        Ok(status) => AssetCatalog::from_rollup_status(&status)?,
        Err(err) => {
            warn!(error = %err, "Rollup provider unreachable, using built-in asset catalog");
            AssetCatalog::testnet()
        }
    };

    let registry = Arc::new(BridgeClientRegistry::new(rpc, snapshot));

    if matches.get_flag("list-bridges") {
        println!("Supported bridges:");
        for name in BridgeClientName::all() {
            println!("  {}", name);
        }
        println!("Registered deployments:");
        for (label, deployment) in registry.bridges() {
            println!(
                "  {} -> {:?} (address id {})",
                label, deployment.address, deployment.address_id
            );
        }
        return Ok(());
    }

    let bridge: BridgeClientName = matches.get_one::<String>("bridge").unwrap().parse()?;
    let input_asset = parse_u32(&matches, "input-asset")?;
    let output_asset = parse_u32(&matches, "output-asset")?;
    let catalog = Arc::new(catalog);

    if matches.get_flag("expiries") {
        let client = registry.get(bridge)?;
        let asset = catalog.bridge_asset(Some(input_asset))?;
        let expiries = client.aux_data_options(asset).await?;
        println!("Valid aux-data values for {} on {}:", symbol(&catalog, input_asset), bridge);
        for expiry in expiries {
            println!("  {}", expiry);
        }
        return Ok(());
    }

    if matches.get_flag("apr") {
        let client = registry.get(bridge)?;
        let asset = catalog.bridge_asset(Some(output_asset))?;
        let apr = client.apr(asset).await?;
        println!("{} APR for {}: {:.2}%", bridge, symbol(&catalog, output_asset), apr);
        return Ok(());
    }

    let args = ExpectedOutputArgs {
        input_asset_id_a: input_asset,
        input_asset_id_b: parse_opt_u32(&matches, "input-asset-b")?,
        output_asset_id_a: output_asset,
        output_asset_id_b: parse_opt_u32(&matches, "output-asset-b")?,
        aux_data: parse_u64(&matches, "aux-data")?,
        input_value: parse_amount(&matches, "amount")?,
    };

    info!(
        bridge = %bridge,
        input_asset = args.input_asset_id_a,
        output_asset = args.output_asset_id_a,
        amount = %args.input_value,
        "Requesting expected output"
    );

    let source: Arc<dyn BridgeClientSource> = registry;
    let query = ExpectedOutputQuery::new(source, catalog.clone());
    let mut rx = query.subscribe();
    query.set_input(QueryInput {
        client_name: bridge,
        skip: false,
        args: Some(args.clone()),
    });

    let timeout = Duration::from_secs(config.rpc.timeout_seconds);
    let state = tokio::time::timeout(timeout, async {
        loop {
            let state = rx.borrow_and_update().clone();
            if !state.is_loading {
                return state;
            }
            if rx.changed().await.is_err() {
                return state;
            }
        }
    })
    .await
    .map_err(|_| QuoterError::Timeout {
        seconds: config.rpc.timeout_seconds,
    })?;

    match (state.output, state.error) {
        (Some(output), _) => {
            println!(
                "{} {} -> {} {}",
                args.input_value,
                symbol(&catalog, args.input_asset_id_a),
                output.value_a.value,
                symbol(&catalog, output.value_a.asset_id),
            );
            if let Some(value_b) = output.value_b {
                println!(
                    "  plus {} {}",
                    value_b.value,
                    symbol(&catalog, value_b.asset_id)
                );
            }
            Ok(())
        }
        (None, Some(error)) => Err(QuoterError::Query(error)),
        (None, None) => Err(QuoterError::InvalidArgument(
            "query finished without output".to_string(),
        )),
    }
}

/// Initialize logging with the specified level
fn init_logging(log_level: &str) {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => {
            eprintln!("Invalid log level: {}. Using 'info'", log_level);
            tracing::Level::INFO
        }
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("veil_quoter={},veil_bridge_data={}", level, level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Start the Prometheus listener
fn install_metrics(config: &QuoterConfig) -> Result<()> {
    let addr: std::net::SocketAddr =
        format!("{}:{}", config.metrics.bind_address, config.metrics.port)
            .parse()
            .map_err(|_| {
                QuoterError::InvalidArgument(format!(
                    "invalid metrics bind address {}:{}",
                    config.metrics.bind_address, config.metrics.port
                ))
            })?;
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| QuoterError::InvalidArgument(format!("failed to start metrics listener: {}", e)))?;
    info!(address = %addr, "Prometheus listener started");
    Ok(())
}

/// Symbol for an asset id, falling back to the raw id
fn symbol(catalog: &AssetCatalog, id: u32) -> String {
    catalog
        .get(id)
        .map(|asset| asset.symbol.clone())
        .unwrap_or_else(|_| format!("asset {}", id))
}

fn parse_u32(matches: &ArgMatches, name: &str) -> Result<u32> {
    matches
        .get_one::<String>(name)
        .unwrap()
        .parse()
        .map_err(|_| QuoterError::InvalidArgument(format!("{} must be an unsigned integer", name)))
}

fn parse_opt_u32(matches: &ArgMatches, name: &str) -> Result<Option<u32>> {
    match matches.get_one::<String>(name) {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| QuoterError::InvalidArgument(format!("{} must be an unsigned integer", name))),
    }
}

fn parse_u64(matches: &ArgMatches, name: &str) -> Result<u64> {
    matches
        .get_one::<String>(name)
        .unwrap()
        .parse()
        .map_err(|_| QuoterError::InvalidArgument(format!("{} must be an unsigned integer", name)))
}

fn parse_amount(matches: &ArgMatches, name: &str) -> Result<U256> {
    let raw = matches.get_one::<String>(name).unwrap();
    U256::from_dec_str(raw)
        .map_err(|_| QuoterError::InvalidArgument(format!("{} must be a decimal amount", name)))
}
