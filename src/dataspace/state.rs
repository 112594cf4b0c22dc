//! Lifecycle State Module
//!
//! Observable status of the reaper worker, with wait primitives that other
//! tasks can use to synchronize on transitions.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;

// == State ==
/// Every status the reaper worker can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum State {
    /// Constructed, never started
    Boot,
    /// Worker alive, waiting for the next cycle
    Idle,
    /// A reap cycle is running against the datasource
    Active,
    /// Worker alive and waiting, with completed cycles behind it
    Steady,
    /// Stop requested, worker unwinding
    ShuttingDown,
    /// Worker exited cleanly
    Shutdown,
    /// Forced terminal state set by a supervisor
    Offline,
    /// Most recent cycle failed
    Error,
}

impl State {
    /// Returns true for states that carry stop intent.
    pub fn is_stopping(self) -> bool {
        matches!(
            self,
            State::ShuttingDown | State::Shutdown | State::Offline | State::Error
        )
    }

    /// Returns true while the worker is alive and healthy.
    pub fn is_running(self) -> bool {
        matches!(self, State::Idle | State::Active | State::Steady)
    }

    /// Returns true for states only a live worker reports, including one
    /// still unwinding after a stop request.
    pub fn has_worker(self) -> bool {
        self.is_running() || self == State::ShuttingDown
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            State::Boot => "BOOT",
            State::Idle => "IDLE",
            State::Active => "ACTIVE",
            State::Steady => "STEADY",
            State::ShuttingDown => "SHUTTINGDOWN",
            State::Shutdown => "SHUTDOWN",
            State::Offline => "OFFLINE",
            State::Error => "ERROR",
        };
        f.write_str(name)
    }
}

// == Lifecycle State ==
/// Shared handle on the current [`State`].
///
/// All mutations go through a single `watch` sender, so transitions are
/// totally ordered and every waiter sees them in issue order. Waiting uses
/// `watch::Receiver::wait_for`, which inspects the current value before
/// parking; a transition that lands before the wait begins is never missed.
#[derive(Debug, Clone)]
pub struct LifecycleState {
    tx: Arc<watch::Sender<State>>,
}

impl LifecycleState {
    // == Constructor ==
    /// Creates a new handle in [`State::Boot`].
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(State::Boot);
        Self { tx: Arc::new(tx) }
    }

    // == Get ==
    /// Returns the current state without blocking.
    pub fn get(&self) -> State {
        *self.tx.borrow()
    }

    // == Set ==
    /// Unconditionally replaces the state and wakes every waiter.
    pub fn set(&self, state: State) {
        self.tx.send_replace(state);
    }

    // == Should Stop ==
    /// Returns true when the current state carries stop intent.
    pub fn should_stop(&self) -> bool {
        self.get().is_stopping()
    }

    // == Subscribe ==
    /// Returns a receiver that observes every subsequent transition.
    pub fn subscribe(&self) -> watch::Receiver<State> {
        self.tx.subscribe()
    }

    // == Wait While ==
    /// Waits until the state differs from `state` and returns the new value.
    ///
    /// Returns immediately if the state already differs. There is no implicit
    /// timeout; see [`LifecycleState::wait_while_timeout`].
    pub async fn wait_while(&self, state: State) -> State {
        self.wait_for(|current| current != state).await
    }

    /// Like [`LifecycleState::wait_while`], giving up after `timeout`.
    ///
    /// `None` means the timeout elapsed with the state still equal to `state`.
    pub async fn wait_while_timeout(&self, state: State, timeout: Duration) -> Option<State> {
        tokio::time::timeout(timeout, self.wait_while(state))
            .await
            .ok()
    }

    // == Wait Until ==
    /// Waits until the state equals `state`.
    pub async fn wait_until(&self, state: State) -> State {
        self.wait_for(|current| current == state).await
    }

    /// Like [`LifecycleState::wait_until`], giving up after `timeout`.
    pub async fn wait_until_timeout(&self, state: State, timeout: Duration) -> Option<State> {
        tokio::time::timeout(timeout, self.wait_until(state))
            .await
            .ok()
    }

    // == Conditional Transitions ==
    /// Moves to `next` unless stop intent is already present.
    ///
    /// Returns false, leaving the state untouched, if it is stopping.
    pub(crate) fn advance(&self, next: State) -> bool {
        self.tx.send_if_modified(|current| {
            if current.is_stopping() {
                false
            } else {
                *current = next;
                true
            }
        })
    }

    /// Marks stop intent unless the state is already terminal.
    pub(crate) fn request_stop(&self) -> State {
        self.tx.send_if_modified(|current| {
            if current.is_stopping() {
                false
            } else {
                *current = State::ShuttingDown;
                true
            }
        });
        self.get()
    }

    /// Completes a requested shutdown. Only `ShuttingDown` moves on.
    pub(crate) fn finish_shutdown(&self) -> bool {
        self.tx.send_if_modified(|current| {
            if *current == State::ShuttingDown {
                *current = State::Shutdown;
                true
            } else {
                false
            }
        })
    }

    async fn wait_for(&self, mut predicate: impl FnMut(State) -> bool) -> State {
        let mut rx = self.tx.subscribe();
        let reached = match rx.wait_for(|current| predicate(*current)).await {
            Ok(current) => *current,
            // The sender lives as long as `self`, so the channel cannot close.
            Err(_) => self.get(),
        };
        reached
    }
}

impl Default for LifecycleState {
    fn default() -> Self {
        Self::new()
    }
}
