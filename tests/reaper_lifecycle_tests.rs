//! Integration Tests for the Reaper Lifecycle
//!
//! Drives a reaper through start/stop/failure sequences with substitute
//! datasources injected through the registry.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dataspace_reaper::dataspace::null::{NULL_MODULE, NULL_NAME};
use dataspace_reaper::{DataSource, DataSourceRegistry, Reaper, ReaperError, State};
use serde_json::{json, Value};

// == Helper Types ==

/// Datasource whose delete call sleeps and can be switched to fail.
#[derive(Default)]
struct ScriptedDataSource {
    calls: AtomicUsize,
    failing: AtomicBool,
    sleep: Duration,
}

impl ScriptedDataSource {
    fn sleeping(sleep: Duration) -> Arc<Self> {
        Arc::new(Self {
            sleep,
            ..Self::default()
        })
    }

    fn failing() -> Arc<Self> {
        let source = Self::default();
        source.failing.store(true, Ordering::SeqCst);
        Arc::new(source)
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DataSource for ScriptedDataSource {
    async fn delete_data_older_than(&self, _days: u64) -> anyhow::Result<u64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.sleep.is_zero() {
            tokio::time::sleep(self.sleep).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("datasource unavailable");
        }
        Ok(0)
    }
}

// == Helper Functions ==

fn config() -> Value {
    json!({
        "dataspace": {
            "retention_interval_in_days": 365,
            "datasource": {
                "module": NULL_MODULE,
                "name": NULL_NAME,
                "config": {"key": "value"}
            }
        }
    })
}

fn scripted_config() -> Value {
    json!({
        "dataspace": {
            "retention_interval_in_days": 365,
            "datasource": {"module": "tests", "name": "Scripted"}
        }
    })
}

fn reaper_with(source: Arc<ScriptedDataSource>) -> Reaper {
    let mut registry = DataSourceRegistry::default();
    registry.register("tests", "Scripted", move |_| {
        Ok(Box::new(Arc::clone(&source)) as Box<dyn DataSource>)
    });
    Reaper::with_registry(&scripted_config(), &registry).unwrap()
}

fn running(state: State) -> bool {
    matches!(state, State::Idle | State::Active | State::Steady)
}

fn stopped(state: State) -> bool {
    matches!(state, State::ShuttingDown | State::Shutdown)
}

// == Construction ==

#[tokio::test]
async fn test_reap_default_state() {
    let reaper = Reaper::new(&config()).unwrap();
    assert_eq!(reaper.state().get(), State::Boot);
}

#[tokio::test]
async fn test_reaper_can_reap() {
    let reaper = Reaper::new(&config()).unwrap();
    reaper.reap().await.unwrap();
    assert_eq!(reaper.state().get(), State::Boot);
}

#[test]
fn test_fail_missing_config() {
    let mut cfg = config();
    cfg.as_object_mut().unwrap().remove("dataspace");
    assert!(matches!(
        Reaper::new(&cfg),
        Err(ReaperError::Configuration(_))
    ));
}

#[test]
fn test_fail_bad_config() {
    let mut cfg = config();
    cfg["dataspace"] = json!("somestring");
    assert!(matches!(
        Reaper::new(&cfg),
        Err(ReaperError::Configuration(_))
    ));
}

#[test]
fn test_fail_missing_config_key() {
    let mut cfg = config();
    cfg["dataspace"]
        .as_object_mut()
        .unwrap()
        .remove("retention_interval_in_days");
    assert!(matches!(
        Reaper::new(&cfg),
        Err(ReaperError::Configuration(_))
    ));
}

#[test]
fn test_fail_wrong_config_key() {
    let mut cfg = config();
    cfg["dataspace"]["retention_interval_in_days"] = json!("abc");
    assert!(matches!(Reaper::new(&cfg), Err(ReaperError::Value(_))));
}

#[test]
fn test_fail_small_retain() {
    let mut reaper = Reaper::new(&config()).unwrap();
    assert!(matches!(
        reaper.set_retention_interval(1),
        Err(ReaperError::Value(_))
    ));
    assert_eq!(reaper.retention_interval(), 365);
}

#[test]
fn test_fail_small_run_interval() {
    let mut reaper = Reaper::new(&config()).unwrap();
    assert!(matches!(
        reaper.set_seconds_between_runs(1),
        Err(ReaperError::Value(_))
    ));

    reaper.set_min_seconds_between_runs(1);
    reaper.set_seconds_between_runs(1).unwrap();
    assert_eq!(reaper.seconds_between_runs(), 1);
}

// == Start / Stop ==

#[tokio::test]
async fn test_just_stop_no_error() {
    let mut reaper = Reaper::new(&config()).unwrap();
    reaper.stop().await;
    assert_eq!(reaper.state().get(), State::Boot);
}

#[tokio::test]
async fn test_start_stop() {
    let mut reaper = Reaper::new(&config()).unwrap();

    reaper.start(Duration::ZERO).unwrap();
    assert!(running(reaper.state().get()));

    reaper.stop().await;
    assert!(stopped(reaper.state().get()));
}

#[tokio::test]
async fn test_start_stop_stop() {
    let mut reaper = Reaper::new(&config()).unwrap();

    reaper.start(Duration::ZERO).unwrap();
    assert!(running(reaper.state().get()));

    reaper.stop().await;
    assert!(stopped(reaper.state().get()));

    reaper.stop().await;
    assert!(stopped(reaper.state().get()));
}

#[tokio::test]
async fn test_start_delay() {
    let mut reaper = Reaper::new(&config()).unwrap();

    reaper.start(Duration::from_secs(90)).unwrap();
    assert_eq!(reaper.state().get(), State::Idle);

    reaper.stop().await;
    assert_eq!(reaper.state().get(), State::Shutdown);
}

#[tokio::test]
async fn test_loop_of_start_stop_in_clumps() {
    let mut reaper = Reaper::new(&config()).unwrap();

    for _ in 0..3 {
        reaper.start(Duration::ZERO).unwrap();
        assert!(running(reaper.state().get()));
        reaper.stop().await;
        assert!(stopped(reaper.state().get()));
    }
}

#[tokio::test]
async fn test_fail_start_two_reapers() {
    let source = ScriptedDataSource::sleeping(Duration::from_millis(200));
    let mut reaper = reaper_with(Arc::clone(&source));

    reaper.start(Duration::ZERO).unwrap();
    assert!(running(reaper.state().get()));

    let second = reaper.start(Duration::ZERO);
    assert!(matches!(second, Err(ReaperError::ConcurrencyConflict(_))));
    assert!(reaper.is_running());

    reaper.stop().await;
    assert_eq!(reaper.state().get(), State::Shutdown);
    assert!(source.calls() <= 1);
}

// == Cycle Observation ==

#[tokio::test]
async fn test_state_can_be_active() {
    let source = ScriptedDataSource::sleeping(Duration::from_secs(3));
    let mut reaper = reaper_with(source);

    reaper.start(Duration::ZERO).unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(reaper.state().get(), State::Active);

    reaper.stop().await;
    assert_eq!(reaper.state().get(), State::Shutdown);
}

#[tokio::test]
async fn test_state_sets_timer_and_uses_it() {
    let source = ScriptedDataSource::sleeping(Duration::from_secs(3));
    let mut reaper = reaper_with(Arc::clone(&source));
    reaper.set_min_seconds_between_runs(1);
    reaper.set_seconds_between_runs(1).unwrap();

    reaper.start(Duration::from_secs(2)).unwrap();
    assert_eq!(reaper.seconds_between_runs(), 1);

    let state = reaper.state().clone();
    let observed = tokio::time::timeout(Duration::from_secs(20), async move {
        let mut seen = vec![state.wait_while(State::Idle).await];
        seen.push(state.wait_while(State::Active).await);
        seen.push(state.wait_while(State::Idle).await);
        seen.push(state.wait_while(State::Active).await);
        seen
    })
    .await
    .expect("reaper did not complete two cycles in time");

    assert_eq!(
        observed,
        vec![State::Active, State::Idle, State::Active, State::Steady]
    );
    assert_eq!(source.calls(), 2);

    reaper.stop().await;
}

// == Failure Handling ==

#[tokio::test]
async fn test_source_fail_can_be_fixed() {
    let source = ScriptedDataSource::failing();
    let mut reaper = reaper_with(Arc::clone(&source));

    reaper.start(Duration::ZERO).unwrap();
    let reached = reaper
        .state()
        .wait_until_timeout(State::Error, Duration::from_secs(5))
        .await;
    assert_eq!(reached, Some(State::Error));
    assert_eq!(source.calls(), 1);

    reaper.stop().await;
    assert_eq!(reaper.state().get(), State::Error);

    source.failing.store(false, Ordering::SeqCst);
    reaper.start(Duration::from_secs(30)).unwrap();
    assert_eq!(reaper.state().get(), State::Idle);

    reaper.stop().await;
    assert_eq!(reaper.state().get(), State::Shutdown);
}

#[tokio::test]
async fn test_forced_reap_surfaces_backend_error() {
    let source = ScriptedDataSource::failing();
    let reaper = reaper_with(source);

    let result = reaper.reap().await;
    assert!(matches!(result, Err(ReaperError::Backend(_))));
    assert_eq!(reaper.state().get(), State::Boot);
}

#[tokio::test]
async fn test_stop_times_out_on_hung_backend() {
    let source = ScriptedDataSource::sleeping(Duration::from_secs(3));
    let mut reaper = reaper_with(source);
    reaper.set_stop_timeout(Duration::from_millis(200));

    reaper.start(Duration::ZERO).unwrap();
    reaper
        .state()
        .wait_until_timeout(State::Active, Duration::from_secs(1))
        .await
        .expect("cycle did not begin");

    reaper.stop().await;
    assert_eq!(reaper.state().get(), State::ShuttingDown);
    assert!(reaper.is_running());
    assert!(matches!(
        reaper.start(Duration::ZERO),
        Err(ReaperError::ConcurrencyConflict(_))
    ));

    // Once the in-flight call returns, the worker exits instead of looping.
    let reached = reaper
        .state()
        .wait_until_timeout(State::Shutdown, Duration::from_secs(10))
        .await;
    assert_eq!(reached, Some(State::Shutdown));
}

#[tokio::test]
async fn test_offline_override_stops_worker() {
    let mut reaper = Reaper::new(&config()).unwrap();
    reaper.start(Duration::from_secs(60)).unwrap();

    reaper.state().set(State::Offline);
    reaper.stop().await;

    assert_eq!(reaper.state().get(), State::Offline);
    assert!(!reaper.is_running());
}
