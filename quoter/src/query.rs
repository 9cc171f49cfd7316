//! Expected-output query engine
//!
//! Long-lived, input-driven quote computation. Each input change invalidates
//! whatever is in flight and starts a fresh computation stamped with a
//! generation number; a completion is published only while its generation is
//! still current, so a slow stale computation can never overwrite a newer
//! result. State reaches consumers over a watch channel.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use ethers::types::U256;
use parking_lot::{Mutex, MutexGuard};
use tokio::sync::watch;
use tracing::{debug, warn};
use uuid::Uuid;

use veil_bridge_data::{
    AssetCatalog, AssetValue, BridgeAsset, BridgeClientName, BridgeClientSource, BridgeDataError,
};

use crate::error::QueryError;

/// Swap parameters for an expected-output computation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedOutputArgs {
    pub input_asset_id_a: u32,
    pub input_asset_id_b: Option<u32>,
    pub output_asset_id_a: u32,
    pub output_asset_id_b: Option<u32>,
    pub aux_data: u64,
    pub input_value: U256,
}

/// Full input to the query: which bridge, whether to pause, and with what
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryInput {
    pub client_name: BridgeClientName,
    pub skip: bool,
    pub args: Option<ExpectedOutputArgs>,
}

/// Computed output amounts, keyed to the requested output assets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedOutput {
    pub value_a: AssetValue,
    pub value_b: Option<AssetValue>,
}

/// Published query state
///
/// `stale` marks an output whose inputs have since changed without a new
/// computation being started (paused or incomplete inputs); a stale output
/// should not be treated as current.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpectedOutputState {
    pub is_loading: bool,
    pub output: Option<ExpectedOutput>,
    pub error: Option<QueryError>,
    pub stale: bool,
    pub updated_at: DateTime<Utc>,
}

impl ExpectedOutputState {
    fn loading() -> Self {
        Self {
            is_loading: true,
            output: None,
            error: None,
            stale: false,
            updated_at: Utc::now(),
        }
    }

    fn ready(output: ExpectedOutput) -> Self {
        Self {
            is_loading: false,
            output: Some(output),
            error: None,
            stale: false,
            updated_at: Utc::now(),
        }
    }

    fn failed(error: QueryError) -> Self {
        Self {
            is_loading: false,
            output: None,
            error: Some(error),
            stale: false,
            updated_at: Utc::now(),
        }
    }
}

struct Generations {
    current: u64,
    last_input: Option<QueryInput>,
}

struct Inner {
    generations: Mutex<Generations>,
    tx: watch::Sender<ExpectedOutputState>,
    // Keeps the channel open while no external subscriber exists
    _rx: watch::Receiver<ExpectedOutputState>,
}

/// Input-driven expected-output query over the bridge client registry
///
/// Computations are spawned onto the ambient Tokio runtime, so inputs must
/// be set from within one.
pub struct ExpectedOutputQuery {
    clients: Arc<dyn BridgeClientSource>,
    assets: Arc<AssetCatalog>,
    inner: Arc<Inner>,
}

impl ExpectedOutputQuery {
    /// Create a query over the given client source and asset catalog
    pub fn new(clients: Arc<dyn BridgeClientSource>, assets: Arc<AssetCatalog>) -> Self {
        let (tx, rx) = watch::channel(ExpectedOutputState::loading());
        Self {
            clients,
            assets,
            inner: Arc::new(Inner {
                generations: Mutex::new(Generations {
                    current: 0,
                    last_input: None,
                }),
                tx,
                _rx: rx,
            }),
        }
    }

    /// Subscribe to state updates
    pub fn subscribe(&self) -> watch::Receiver<ExpectedOutputState> {
        self.inner.tx.subscribe()
    }

    /// Current state snapshot
    pub fn state(&self) -> ExpectedOutputState {
        self.inner.tx.borrow().clone()
    }

    /// Drive the query with new input
    ///
    /// Setting an input identical to the previous one is a no-op. Any other
    /// input invalidates the in-flight computation before deciding whether
    /// to start a new one.
    pub fn set_input(&self, input: QueryInput) {
        let mut guard = self.inner.generations.lock();
        if guard.last_input.as_ref() == Some(&input) {
            return;
        }
        guard.last_input = Some(input.clone());
        guard.current += 1;
        let generation = guard.current;
        self.start(input, generation, guard);
    }

    /// Re-run the computation for the current input
    pub fn refresh(&self) {
        let mut guard = self.inner.generations.lock();
        let input = match guard.last_input.clone() {
            Some(input) => input,
            None => return,
        };
        guard.current += 1;
        let generation = guard.current;
        self.start(input, generation, guard);
    }

    // Publishes under the generations lock so a completion checking its
    // stamp can never interleave between the bump and the state update.
    fn start(
        &self,
        input: QueryInput,
        generation: u64,
        guard: MutexGuard<'_, Generations>,
    ) {
        if input.skip {
            debug!(bridge = %input.client_name, "Expected-output query paused");
            self.mark_stale();
            return;
        }

        let args = match input.args {
            Some(args) => args,
            None => {
                warn!(bridge = %input.client_name, "Missing arguments for expected-output query");
                self.mark_stale();
                return;
            }
        };

        let client = match self.clients.get(input.client_name) {
            Ok(client) => client,
            Err(err) => {
                warn!(bridge = %input.client_name, error = %err, "Failed to resolve bridge client");
                self.fail(&err);
                return;
            }
        };

        if !client.supports_expected_output() {
            let err =
                BridgeDataError::capability(input.client_name.name(), "expected_output");
            self.fail(&err);
            return;
        }

        let assets = match self.translate(&args) {
            Ok(assets) => assets,
            Err(err) => {
                warn!(bridge = %input.client_name, error = %err, "Failed to translate query assets");
                self.fail(&err);
                return;
            }
        };

        self.inner.tx.send_replace(ExpectedOutputState::loading());
        drop(guard);

        let query_id = Uuid::new_v4();
        debug!(
            query_id = %query_id,
            bridge = %input.client_name,
            generation,
            input_value = %args.input_value,
            "Starting expected-output computation"
        );

        let inner = self.inner.clone();
        let bridge = input.client_name;
        tokio::spawn(async move {
            let [input_a, input_b, output_a, output_b] = assets;
            let result = client
                .expected_output(
                    input_a,
                    input_b,
                    output_a,
                    output_b,
                    args.aux_data,
                    args.input_value,
                )
                .await;
            let outcome = match result {
                Ok(values) => wrap_output(&args, values),
                Err(err) => Err(QueryError::from(&err)),
            };

            let current_guard = inner.generations.lock();
            if current_guard.current != generation {
                metrics::counter!("quoter_expected_output_superseded_total", 1);
                debug!(
                    query_id = %query_id,
                    generation,
                    current = current_guard.current,
                    "Discarding superseded expected-output result"
                );
                return;
            }

            match outcome {
                Ok(output) => {
                    metrics::counter!("quoter_expected_output_ready_total", 1);
                    debug!(query_id = %query_id, bridge = %bridge, "Expected-output computation ready");
                    inner.tx.send_replace(ExpectedOutputState::ready(output));
                }
                Err(error) => {
                    metrics::counter!("quoter_expected_output_errors_total", 1);
                    warn!(
                        query_id = %query_id,
                        bridge = %bridge,
                        error = %error,
                        "Expected-output computation failed"
                    );
                    inner.tx.send_replace(ExpectedOutputState::failed(error));
                }
            }
        });
    }

    fn translate(&self, args: &ExpectedOutputArgs) -> Result<[BridgeAsset; 4], BridgeDataError> {
        Ok([
            self.assets.bridge_asset(Some(args.input_asset_id_a))?,
            self.assets.bridge_asset(args.input_asset_id_b)?,
            self.assets.bridge_asset(Some(args.output_asset_id_a))?,
            self.assets.bridge_asset(args.output_asset_id_b)?,
        ])
    }

    // Previous output stays visible but is flagged; the generation has
    // already moved on, so in-flight results cannot land after this.
    fn mark_stale(&self) {
        self.inner.tx.send_modify(|state| {
            state.stale = true;
            state.updated_at = Utc::now();
        });
    }

    fn fail(&self, err: &BridgeDataError) {
        metrics::counter!("quoter_expected_output_errors_total", 1);
        self.inner
            .tx
            .send_replace(ExpectedOutputState::failed(QueryError::from(err)));
    }
}

/// Key the raw magnitudes to the requested output assets
fn wrap_output(
    args: &ExpectedOutputArgs,
    values: Vec<U256>,
) -> Result<ExpectedOutput, QueryError> {
    let first = values
        .first()
        .ok_or_else(|| QueryError::transient("bridge returned no output values"))?;
    let value_a = AssetValue {
        asset_id: args.output_asset_id_a,
        value: *first,
    };

    let value_b = match args.output_asset_id_b {
        None => None,
        Some(asset_id) => {
            let second = values
                .get(1)
                .ok_or_else(|| QueryError::transient("bridge returned a single output value"))?;
            Some(AssetValue {
                asset_id,
                value: *second,
            })
        }
    };

    Ok(ExpectedOutput { value_a, value_b })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(output_b: Option<u32>) -> ExpectedOutputArgs {
        ExpectedOutputArgs {
            input_asset_id_a: 0,
            input_asset_id_b: None,
            output_asset_id_a: 1,
            output_asset_id_b: output_b,
            aux_data: 0,
            input_value: U256::exp10(18),
        }
    }

    #[test]
    fn test_wrap_output_single_value() {
        let output = wrap_output(&args(None), vec![U256::from(1500u64)]).unwrap();
        assert_eq!(output.value_a.asset_id, 1);
        assert_eq!(output.value_a.value, U256::from(1500u64));
        assert!(output.value_b.is_none());
    }

    #[test]
    fn test_wrap_output_keys_second_value_to_second_asset() {
        let output =
            wrap_output(&args(Some(2)), vec![U256::from(1500u64), U256::from(7u64)]).unwrap();
        let value_b = output.value_b.unwrap();
        assert_eq!(value_b.asset_id, 2);
        assert_eq!(value_b.value, U256::from(7u64));
    }

    #[test]
    fn test_wrap_output_missing_second_value_fails() {
        let result = wrap_output(&args(Some(2)), vec![U256::from(1500u64)]);
        assert!(result.is_err());
    }

    #[test]
    fn test_wrap_output_empty_fails() {
        let result = wrap_output(&args(None), Vec::new());
        assert!(result.is_err());
    }
}
