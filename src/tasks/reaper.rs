//! Reaper Task
//!
//! Background task that periodically purges dataspace records older than
//! the retention window.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::dataspace::{DataSource, DataSourceRegistry, LifecycleState, ReaperConfig, State};
use crate::error::{ReaperError, Result};

// == Public Constants ==
/// Shortest retention window accepted, in days
pub const MIN_RETENTION_INTERVAL_DAYS: u64 = 7;

/// Default floor for the pause between cycles, in seconds
pub const MIN_SECONDS_BETWEEN_RUNS: u64 = 60 * 60;

/// Pause between cycles when none is configured (8 hours)
pub const DEFAULT_SECONDS_BETWEEN_RUNS: u64 = 8 * 60 * 60;

/// How long `stop` waits for the worker before giving up
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(30);

type SharedDataSource = Arc<Mutex<Box<dyn DataSource>>>;

// == Settings Snapshot ==
/// Copy of a reaper's tunables, readable without holding the reaper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaperSettings {
    pub retention_interval_in_days: u64,
    pub seconds_between_runs: u64,
    pub min_seconds_between_runs: u64,
}

// == Forced Reap ==
/// One purge cycle detached from its [`Reaper`], so the caller can release
/// the reaper before awaiting the datasource.
pub struct ForcedReap {
    datasource: SharedDataSource,
    retention_interval: u64,
}

impl ForcedReap {
    /// Retention window the cycle purges with.
    pub fn retention_interval(&self) -> u64 {
        self.retention_interval
    }

    /// Runs the cycle and returns the number of records removed.
    pub async fn run(self) -> Result<u64> {
        reap_once(&self.datasource, self.retention_interval).await
    }
}

// == Reaper ==
/// Owns a datasource and a single background worker that purges aged
/// records from it on a fixed interval.
///
/// The worker and its controller communicate only through the
/// [`LifecycleState`]. The datasource sits behind an async mutex, so reap
/// cycles never overlap, including forced ones started through [`Reaper::reap`].
///
/// # Example
/// ```ignore
/// let mut reaper = Reaper::new(&config)?;
/// reaper.start(Duration::ZERO)?;
/// // Later, during shutdown:
/// reaper.stop().await;
/// ```
pub struct Reaper {
    state: LifecycleState,
    datasource: SharedDataSource,
    retention_interval: u64,
    seconds_between_runs: u64,
    min_seconds_between_runs: u64,
    stop_timeout: Duration,
    worker: Option<JoinHandle<()>>,
}

impl Reaper {
    // == Constructors ==
    /// Validates `config` and builds a reaper with a built-in datasource.
    pub fn new(config: &Value) -> Result<Self> {
        Self::from_config(ReaperConfig::from_value(config)?)
    }

    /// Validates `config`, resolving the datasource through `registry`.
    pub fn with_registry(config: &Value, registry: &DataSourceRegistry) -> Result<Self> {
        Self::from_config(ReaperConfig::from_value_with(config, registry)?)
    }

    /// Builds a reaper from validated inputs. The retention window still has
    /// to clear [`MIN_RETENTION_INTERVAL_DAYS`].
    pub fn from_config(config: ReaperConfig) -> Result<Self> {
        check_retention(config.retention_interval_in_days)?;

        Ok(Self {
            state: LifecycleState::new(),
            datasource: Arc::new(Mutex::new(config.datasource)),
            retention_interval: config.retention_interval_in_days,
            seconds_between_runs: DEFAULT_SECONDS_BETWEEN_RUNS,
            min_seconds_between_runs: MIN_SECONDS_BETWEEN_RUNS,
            stop_timeout: DEFAULT_STOP_TIMEOUT,
            worker: None,
        })
    }

    // == Accessors ==
    /// Returns the lifecycle state handle.
    pub fn state(&self) -> &LifecycleState {
        &self.state
    }

    /// Retention window in days.
    pub fn retention_interval(&self) -> u64 {
        self.retention_interval
    }

    /// Pause between cycles in seconds.
    pub fn seconds_between_runs(&self) -> u64 {
        self.seconds_between_runs
    }

    /// Floor applied by [`Reaper::set_seconds_between_runs`].
    pub fn min_seconds_between_runs(&self) -> u64 {
        self.min_seconds_between_runs
    }

    /// Longest time [`Reaper::stop`] waits for the worker to exit.
    pub fn stop_timeout(&self) -> Duration {
        self.stop_timeout
    }

    /// Snapshot of the current tunables.
    pub fn settings(&self) -> ReaperSettings {
        ReaperSettings {
            retention_interval_in_days: self.retention_interval,
            seconds_between_runs: self.seconds_between_runs,
            min_seconds_between_runs: self.min_seconds_between_runs,
        }
    }

    /// Returns true while a worker task is alive, whatever the state says.
    pub fn is_running(&self) -> bool {
        self.worker
            .as_ref()
            .map_or(false, |handle| !handle.is_finished())
    }

    // == Setters ==
    /// Sets the retention window. Values under [`MIN_RETENTION_INTERVAL_DAYS`]
    /// are rejected and the previous value stays in effect.
    ///
    /// A running worker keeps the value it was started with.
    pub fn set_retention_interval(&mut self, days: u64) -> Result<()> {
        check_retention(days)?;
        self.retention_interval = days;
        Ok(())
    }

    /// Sets the pause between cycles. Values under
    /// [`Reaper::min_seconds_between_runs`] are rejected.
    pub fn set_seconds_between_runs(&mut self, seconds: u64) -> Result<()> {
        if seconds < self.min_seconds_between_runs {
            return Err(ReaperError::Value(format!(
                "seconds between runs must be at least {}, got {}",
                self.min_seconds_between_runs, seconds
            )));
        }
        self.seconds_between_runs = seconds;
        Ok(())
    }

    /// Overrides the floor for this instance only.
    pub fn set_min_seconds_between_runs(&mut self, seconds: u64) {
        self.min_seconds_between_runs = seconds;
    }

    /// Sets how long [`Reaper::stop`] waits before leaving the worker behind.
    pub fn set_stop_timeout(&mut self, timeout: Duration) {
        self.stop_timeout = timeout;
    }

    // == Reap ==
    /// Runs one purge cycle in the calling task and returns the number of
    /// records removed. Leaves the lifecycle state alone.
    pub async fn reap(&self) -> Result<u64> {
        self.forced_reap().run().await
    }

    /// Packages a purge cycle with the current retention window, to be run
    /// after the reaper itself is no longer borrowed.
    pub fn forced_reap(&self) -> ForcedReap {
        ForcedReap {
            datasource: Arc::clone(&self.datasource),
            retention_interval: self.retention_interval,
        }
    }

    // == Start ==
    /// Spawns the background worker and returns immediately.
    ///
    /// With a non-zero `delay` the worker stays `IDLE` for that long before
    /// its first cycle. Fails with a concurrency conflict while a previous
    /// worker is still alive. Must be called from within a tokio runtime.
    pub fn start(&mut self, delay: Duration) -> Result<()> {
        if self.is_running() {
            return Err(ReaperError::ConcurrencyConflict(
                "reaper worker is already running".to_string(),
            ));
        }
        self.worker = None;

        self.state.set(State::Idle);

        let worker = Worker {
            state: self.state.clone(),
            datasource: Arc::clone(&self.datasource),
            retention_interval: self.retention_interval,
            interval: Duration::from_secs(self.seconds_between_runs),
            delay,
        };
        self.worker = Some(tokio::spawn(worker.run()));

        info!(
            "Reaper started: retention={}d, interval={}s, delay={:?}",
            self.retention_interval, self.seconds_between_runs, delay
        );
        Ok(())
    }

    // == Stop ==
    /// Asks the worker to exit after its current cycle and waits for it, at
    /// most [`Reaper::stop_timeout`].
    ///
    /// No-op without a live worker; an `ERROR` state is left in place. If the
    /// worker does not exit in time the state stays `SHUTTINGDOWN` and the
    /// worker keeps counting as running.
    pub async fn stop(&mut self) {
        let Some(mut handle) = self.worker.take() else {
            debug!("Reaper stop requested with no worker");
            return;
        };

        if handle.is_finished() {
            if let Err(err) = handle.await {
                error!("Reaper worker ended abnormally: {}", err);
                self.state.set(State::Error);
            }
            return;
        }

        let intent = self.state.request_stop();
        info!("Reaper stopping (state: {})", intent);

        match tokio::time::timeout(self.stop_timeout, &mut handle).await {
            Ok(Ok(())) => {
                self.state.finish_shutdown();
                info!("Reaper stopped (state: {})", self.state.get());
            }
            Ok(Err(err)) => {
                error!("Reaper worker ended abnormally: {}", err);
                self.state.set(State::Error);
            }
            Err(_) => {
                warn!(
                    "Reaper worker did not exit within {:?}, leaving it to finish",
                    self.stop_timeout
                );
                self.worker = Some(handle);
            }
        }
    }
}

impl Drop for Reaper {
    fn drop(&mut self) {
        if self.is_running() {
            self.state.request_stop();
        }
    }
}

// == Worker ==
/// Settings snapshot and shared handles moved into the background task.
struct Worker {
    state: LifecycleState,
    datasource: SharedDataSource,
    retention_interval: u64,
    interval: Duration,
    delay: Duration,
}

impl Worker {
    async fn run(self) {
        if !self.delay.is_zero() {
            debug!("Reaper delaying first cycle by {:?}", self.delay);
            self.state.wait_while_timeout(State::Idle, self.delay).await;
        }

        let mut completed: u64 = 0;
        while !self.state.should_stop() {
            if !self.state.advance(State::Active) {
                break;
            }

            match reap_once(&self.datasource, self.retention_interval).await {
                Ok(removed) => {
                    completed += 1;
                    info!("Reap cycle {} removed {} records", completed, removed);
                }
                Err(err) => {
                    error!("Reap cycle failed: {}", err);
                    self.state.set(State::Error);
                    return;
                }
            }

            // IDLE after the first cycle, STEADY once earlier cycles exist
            let resting = if completed > 1 {
                State::Steady
            } else {
                State::Idle
            };
            if !self.state.advance(resting) {
                break;
            }

            self.state.wait_while_timeout(resting, self.interval).await;
        }

        if self.state.finish_shutdown() {
            info!("Reaper worker shut down after {} cycles", completed);
        }
    }
}

// == Helpers ==
async fn reap_once(datasource: &SharedDataSource, days: u64) -> Result<u64> {
    let datasource = datasource.lock().await;
    debug!("Reaping records older than {} days", days);
    datasource
        .delete_data_older_than(days)
        .await
        .map_err(ReaperError::Backend)
}

fn check_retention(days: u64) -> Result<()> {
    if days < MIN_RETENTION_INTERVAL_DAYS {
        return Err(ReaperError::Value(format!(
            "retention interval must be at least {} days, got {}",
            MIN_RETENTION_INTERVAL_DAYS, days
        )));
    }
    Ok(())
}
