//! Bridge client registry
//!
//! Single point of truth mapping a bridge name to its constructed client.
//! Clients are built lazily on first request from a static factory table and
//! cached for the registry's lifetime; construction happens at most once per
//! name, and a failed construction caches nothing.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use ethers::types::H160;
use once_cell::sync::Lazy;
use tracing::info;

use crate::{
    clients::{BridgeClient, CurveStethClient, DcaClient, ElementClient, EulerClient, YearnClient},
    error::{BridgeDataError, Result},
    rpc::EthereumRpc,
    types::{BridgeDataSnapshot, BridgeDeployment},
    BridgeClientName,
};

/// Shared inputs handed to every client factory
pub struct BuildArgs<'a> {
    pub rpc: &'a EthereumRpc,
    pub rollup_address: H160,
    pub bridges: &'a HashMap<String, BridgeDeployment>,
}

impl BuildArgs<'_> {
    /// Look up a deployment a factory depends on
    fn deployment(&self, bridge: &str, label: &str) -> Result<&BridgeDeployment> {
        self.bridges.get(label).ok_or_else(|| {
            BridgeDataError::configuration(
                bridge.to_string(),
                format!("no deployment registered under label {}", label),
            )
        })
    }
}

type ClientFactory = fn(&BuildArgs<'_>) -> Result<Arc<dyn BridgeClient>>;

fn build_curve_lido(args: &BuildArgs<'_>) -> Result<Arc<dyn BridgeClient>> {
    Ok(Arc::new(CurveStethClient::create(
        args.rpc.clone(),
        "0x7f39C581F595B53c5cb19bD0b3f8dA6c935E2Ca0".parse().unwrap(), // wstETH
        "0x442af784A788A5bd6F42A01Ebe9F287a871243fb".parse().unwrap(), // Lido oracle
        "0xDC24316b9AE028F1497c275EB9192a3Ea0f67022".parse().unwrap(), // Curve stETH pool
    )))
}

fn build_dca(args: &BuildArgs<'_>) -> Result<Arc<dyn BridgeClient>> {
    let deployment = args.deployment("dca", "DCA400K")?;
    Ok(Arc::new(DcaClient::create(args.rpc.clone(), deployment.address)))
}

fn build_euler(args: &BuildArgs<'_>) -> Result<Arc<dyn BridgeClient>> {
    Ok(Arc::new(EulerClient::create_with_lido(
        args.rpc.clone(),
        "0x442af784A788A5bd6F42A01Ebe9F287a871243fb".parse().unwrap(), // Lido oracle
    )))
}

fn build_element(args: &BuildArgs<'_>) -> Result<Arc<dyn BridgeClient>> {
    let deployment = args.deployment("element", "ElementBridge")?;
    Ok(Arc::new(ElementClient::create(
        args.rpc.clone(),
        deployment.address,
        "0xBA12222222228d8Ba445958a75a0704d566BF2C8".parse().unwrap(), // Balancer vault
        args.rollup_address,
    )))
}

fn build_yearn(args: &BuildArgs<'_>) -> Result<Arc<dyn BridgeClient>> {
    Ok(Arc::new(YearnClient::create(args.rpc.clone())))
}

/// One factory per supported bridge name
static CLIENT_FACTORIES: Lazy<HashMap<BridgeClientName, ClientFactory>> = Lazy::new(|| {
    let mut factories: HashMap<BridgeClientName, ClientFactory> = HashMap::new();
    factories.insert(BridgeClientName::CurveLido, build_curve_lido);
    factories.insert(BridgeClientName::Dca, build_dca);
    factories.insert(BridgeClientName::Euler, build_euler);
    factories.insert(BridgeClientName::Element, build_element);
    factories.insert(BridgeClientName::Yearn, build_yearn);
    factories
});

/// Anything that can resolve a bridge name to a client
///
/// The registry is the production implementation; the quoting layer depends
/// on this seam so tests can substitute their own sources.
pub trait BridgeClientSource: Send + Sync {
    /// Resolve a client for the given bridge
    fn get(&self, name: BridgeClientName) -> Result<Arc<dyn BridgeClient>>;
}

/// Lazily-constructing client registry
pub struct BridgeClientRegistry {
    rpc: EthereumRpc,
    rollup_address: H160,
    bridges: HashMap<String, BridgeDeployment>,
    clients: DashMap<BridgeClientName, Arc<dyn BridgeClient>>,
}

impl BridgeClientRegistry {
    /// Create a registry from a fetched bridge data snapshot
    pub fn new(rpc: EthereumRpc, snapshot: BridgeDataSnapshot) -> Self {
        Self {
            rpc,
            rollup_address: snapshot.rollup_address,
            bridges: snapshot.bridges,
            clients: DashMap::new(),
        }
    }

    /// Rollup processor address the registry was built with
    pub fn rollup_address(&self) -> H160 {
        self.rollup_address
    }

    /// Registered bridge deployments
    pub fn bridges(&self) -> &HashMap<String, BridgeDeployment> {
        &self.bridges
    }

    /// Get the client for a bridge, constructing it on first request
    ///
    /// The vacant entry holds its shard's write lock across the factory
    /// call, so concurrent first requests for the same name construct once.
    pub fn get(&self, name: BridgeClientName) -> Result<Arc<dyn BridgeClient>> {
        if let Some(client) = self.clients.get(&name) {
            return Ok(client.clone());
        }

        match self.clients.entry(name) {
            Entry::Occupied(entry) => Ok(entry.get().clone()),
            Entry::Vacant(entry) => {
                let factory = CLIENT_FACTORIES
                    .get(&name)
                    .ok_or_else(|| BridgeDataError::UnknownBridge(name.to_string()))?;
                let args = BuildArgs {
                    rpc: &self.rpc,
                    rollup_address: self.rollup_address,
                    bridges: &self.bridges,
                };
                let client = factory(&args)?;

                info!(bridge = %name, "Constructed bridge client");
                metrics::counter!("bridge_clients_constructed_total", 1);

                entry.insert(client.clone());
                Ok(client)
            }
        }
    }
}

impl BridgeClientSource for BridgeClientRegistry {
    fn get(&self, name: BridgeClientName) -> Result<Arc<dyn BridgeClient>> {
        BridgeClientRegistry::get(self, name)
    }
}
