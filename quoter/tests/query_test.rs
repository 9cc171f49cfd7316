//! Expected-output query integration tests - lifecycle, staleness, errors

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ethers::types::U256;

use veil_bridge_data::{
    AssetCatalog, BridgeAsset, BridgeClient, BridgeClientName, BridgeClientSource, BridgeDataError,
};
use veil_quoter::{
    ExpectedOutputArgs, ExpectedOutputQuery, ExpectedOutputState, QueryErrorKind, QueryInput,
};

/// In-process bridge client answering quotes as input * multiplier
struct MockBridgeClient {
    multiplier: u64,
    outputs: usize,
    supports: bool,
    fail: bool,
    slow_value: Option<U256>,
    delay: Duration,
}

impl Default for MockBridgeClient {
    fn default() -> Self {
        Self {
            multiplier: 2,
            outputs: 1,
            supports: true,
            fail: false,
            slow_value: None,
            delay: Duration::ZERO,
        }
    }
}

#[async_trait]
impl BridgeClient for MockBridgeClient {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn supports_expected_output(&self) -> bool {
        self.supports
    }

    async fn expected_output(
        &self,
        _input_a: BridgeAsset,
        _input_b: BridgeAsset,
        _output_a: BridgeAsset,
        _output_b: BridgeAsset,
        _aux_data: u64,
        input_value: U256,
    ) -> veil_bridge_data::Result<Vec<U256>> {
        if Some(input_value) == self.slow_value {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail {
            return Err(BridgeDataError::quote("mock", "rpc unavailable"));
        }
        let out = input_value * U256::from(self.multiplier);
        if self.outputs == 2 {
            Ok(vec![out, out / U256::from(2u64)])
        } else {
            Ok(vec![out])
        }
    }
}

/// Client source with a fixed set of clients and a resolution counter
struct MockSource {
    clients: HashMap<BridgeClientName, Arc<dyn BridgeClient>>,
    gets: AtomicUsize,
}

impl MockSource {
    fn new(clients: Vec<(BridgeClientName, MockBridgeClient)>) -> Arc<Self> {
        Arc::new(Self {
            clients: clients
                .into_iter()
                .map(|(name, client)| (name, Arc::new(client) as Arc<dyn BridgeClient>))
                .collect(),
            gets: AtomicUsize::new(0),
        })
    }

    fn resolutions(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }
}

impl BridgeClientSource for MockSource {
    fn get(&self, name: BridgeClientName) -> veil_bridge_data::Result<Arc<dyn BridgeClient>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.clients.get(&name).cloned().ok_or_else(|| {
            BridgeDataError::configuration(name.name(), "bridge not configured")
        })
    }
}

fn catalog() -> Arc<AssetCatalog> {
    Arc::new(AssetCatalog::testnet())
}

fn args_with_amount(amount: U256) -> ExpectedOutputArgs {
    ExpectedOutputArgs {
        input_asset_id_a: 0,
        input_asset_id_b: None,
        output_asset_id_a: 1,
        output_asset_id_b: None,
        aux_data: 0,
        input_value: amount,
    }
}

fn element_input(args: ExpectedOutputArgs) -> QueryInput {
    QueryInput {
        client_name: BridgeClientName::Element,
        skip: false,
        args: Some(args),
    }
}

fn one_eth() -> U256 {
    U256::exp10(18)
}

/// Wait until the published state satisfies a predicate
async fn wait_until<F>(query: &ExpectedOutputQuery, pred: F) -> ExpectedOutputState
where
    F: Fn(&ExpectedOutputState) -> bool,
{
    let mut rx = query.subscribe();
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            let state = rx.borrow_and_update().clone();
            if pred(&state) {
                return state;
            }
            rx.changed().await.expect("query channel closed");
        }
    })
    .await
    .expect("timed out waiting for query state")
}

#[tokio::test]
async fn test_initial_state_is_loading() {
    let source = MockSource::new(vec![(BridgeClientName::Element, MockBridgeClient::default())]);
    let query = ExpectedOutputQuery::new(source, catalog());

    let state = query.state();
    assert!(state.is_loading);
    assert!(state.output.is_none());
    assert!(state.error.is_none());
    assert!(!state.stale);
}

#[tokio::test]
async fn test_quote_resolves_to_ready_state() {
    let source = MockSource::new(vec![(
        BridgeClientName::Element,
        MockBridgeClient {
            multiplier: 3,
            ..Default::default()
        },
    )]);
    let query = ExpectedOutputQuery::new(source.clone(), catalog());

    query.set_input(element_input(args_with_amount(one_eth())));
    let state = wait_until(&query, |s| !s.is_loading).await;

    let output = state.output.expect("quote should produce an output");
    assert_eq!(output.value_a.asset_id, 1);
    assert_eq!(output.value_a.value, one_eth() * U256::from(3u64));
    assert!(output.value_b.is_none());
    assert!(state.error.is_none());
    assert!(!state.stale);
    assert_eq!(source.resolutions(), 1);
}

#[tokio::test]
async fn test_second_output_is_keyed_to_second_asset() {
    let source = MockSource::new(vec![(
        BridgeClientName::Element,
        MockBridgeClient {
            outputs: 2,
            ..Default::default()
        },
    )]);
    let query = ExpectedOutputQuery::new(source, catalog());

    let mut args = args_with_amount(one_eth());
    args.output_asset_id_b = Some(2);
    query.set_input(element_input(args));
    let state = wait_until(&query, |s| !s.is_loading).await;

    let output = state.output.expect("quote should produce an output");
    assert_eq!(output.value_a.value, one_eth() * U256::from(2u64));
    let value_b = output.value_b.expect("second output was requested");
    assert_eq!(value_b.asset_id, 2);
    assert_eq!(value_b.value, one_eth());
}

#[tokio::test]
async fn test_stale_result_never_overwrites_newer_one() {
    // The first computation is slow; the re-triggered one resolves first
    let source = MockSource::new(vec![(
        BridgeClientName::Element,
        MockBridgeClient {
            slow_value: Some(one_eth()),
            delay: Duration::from_millis(300),
            ..Default::default()
        },
    )]);
    let query = ExpectedOutputQuery::new(source, catalog());

    query.set_input(element_input(args_with_amount(one_eth())));
    query.set_input(element_input(args_with_amount(one_eth() * U256::from(3u64))));

    let state = wait_until(&query, |s| s.output.is_some()).await;
    assert_eq!(state.output.unwrap().value_a.value, one_eth() * U256::from(6u64));

    // Let the slow first computation finish; its result must be discarded
    tokio::time::sleep(Duration::from_millis(400)).await;
    let state = query.state();
    assert_eq!(state.output.unwrap().value_a.value, one_eth() * U256::from(6u64));
    assert!(state.error.is_none());
}

#[tokio::test]
async fn test_skip_preserves_output_and_marks_it_stale() {
    let source = MockSource::new(vec![(BridgeClientName::Element, MockBridgeClient::default())]);
    let query = ExpectedOutputQuery::new(source.clone(), catalog());

    query.set_input(element_input(args_with_amount(one_eth())));
    let ready = wait_until(&query, |s| !s.is_loading).await;
    let expected = ready.output.clone().expect("quote should produce an output");

    query.set_input(QueryInput {
        client_name: BridgeClientName::Element,
        skip: true,
        args: Some(args_with_amount(one_eth())),
    });

    let state = query.state();
    assert!(!state.is_loading);
    assert_eq!(state.output, Some(expected));
    assert!(state.stale);
    // The skip path never resolves a client
    assert_eq!(source.resolutions(), 1);
}

#[tokio::test]
async fn test_skip_invalidates_in_flight_computation() {
    let source = MockSource::new(vec![(
        BridgeClientName::Element,
        MockBridgeClient {
            slow_value: Some(one_eth()),
            delay: Duration::from_millis(200),
            ..Default::default()
        },
    )]);
    let query = ExpectedOutputQuery::new(source, catalog());

    query.set_input(element_input(args_with_amount(one_eth())));
    query.set_input(QueryInput {
        client_name: BridgeClientName::Element,
        skip: true,
        args: Some(args_with_amount(one_eth())),
    });

    tokio::time::sleep(Duration::from_millis(400)).await;
    let state = query.state();
    assert!(state.output.is_none(), "in-flight result must not land after skip");
    assert!(state.stale);
}

#[tokio::test]
async fn test_missing_args_starts_nothing() {
    let source = MockSource::new(vec![(BridgeClientName::Element, MockBridgeClient::default())]);
    let query = ExpectedOutputQuery::new(source.clone(), catalog());

    query.set_input(element_input(args_with_amount(one_eth())));
    let ready = wait_until(&query, |s| !s.is_loading).await;
    let expected = ready.output.clone().expect("quote should produce an output");

    query.set_input(QueryInput {
        client_name: BridgeClientName::Element,
        skip: false,
        args: None,
    });

    let state = query.state();
    assert_eq!(state.output, Some(expected));
    assert!(state.stale);
    assert_eq!(source.resolutions(), 1);
}

#[tokio::test]
async fn test_identical_input_is_a_noop() {
    let source = MockSource::new(vec![(BridgeClientName::Element, MockBridgeClient::default())]);
    let query = ExpectedOutputQuery::new(source.clone(), catalog());

    let input = element_input(args_with_amount(one_eth()));
    query.set_input(input.clone());
    wait_until(&query, |s| !s.is_loading).await;
    query.set_input(input);

    let state = query.state();
    assert!(!state.is_loading);
    assert!(!state.stale);
    assert_eq!(source.resolutions(), 1);
}

#[tokio::test]
async fn test_unconfigured_bridge_fails_closed() {
    let source = MockSource::new(vec![(BridgeClientName::Element, MockBridgeClient::default())]);
    let query = ExpectedOutputQuery::new(source, catalog());

    query.set_input(QueryInput {
        client_name: BridgeClientName::Dca,
        skip: false,
        args: Some(args_with_amount(one_eth())),
    });

    let state = wait_until(&query, |s| s.error.is_some()).await;
    assert!(!state.is_loading);
    assert!(state.output.is_none());
    assert_eq!(state.error.unwrap().kind, QueryErrorKind::Configuration);
}

#[tokio::test]
async fn test_unsupported_quote_capability_is_reported() {
    let source = MockSource::new(vec![(
        BridgeClientName::Element,
        MockBridgeClient {
            supports: false,
            ..Default::default()
        },
    )]);
    let query = ExpectedOutputQuery::new(source, catalog());

    query.set_input(element_input(args_with_amount(one_eth())));
    let state = wait_until(&query, |s| s.error.is_some()).await;
    assert_eq!(state.error.unwrap().kind, QueryErrorKind::Capability);
    assert!(state.output.is_none());
}

#[tokio::test]
async fn test_unknown_asset_is_a_configuration_error() {
    let source = MockSource::new(vec![(BridgeClientName::Element, MockBridgeClient::default())]);
    let query = ExpectedOutputQuery::new(source, catalog());

    let mut args = args_with_amount(one_eth());
    args.input_asset_id_a = 99;
    query.set_input(element_input(args));

    let state = wait_until(&query, |s| s.error.is_some()).await;
    assert_eq!(state.error.unwrap().kind, QueryErrorKind::Configuration);
}

#[tokio::test]
async fn test_transient_failure_surfaces_and_next_input_recovers() {
    let source = MockSource::new(vec![
        (
            BridgeClientName::Element,
            MockBridgeClient {
                fail: true,
                ..Default::default()
            },
        ),
        (BridgeClientName::Yearn, MockBridgeClient::default()),
    ]);
    let query = ExpectedOutputQuery::new(source, catalog());

    query.set_input(element_input(args_with_amount(one_eth())));
    let state = wait_until(&query, |s| s.error.is_some()).await;
    assert_eq!(state.error.unwrap().kind, QueryErrorKind::Transient);
    assert!(state.output.is_none());

    query.set_input(QueryInput {
        client_name: BridgeClientName::Yearn,
        skip: false,
        args: Some(args_with_amount(one_eth())),
    });
    let state = wait_until(&query, |s| s.output.is_some()).await;
    assert!(state.error.is_none());
    assert_eq!(state.output.unwrap().value_a.value, one_eth() * U256::from(2u64));
}
