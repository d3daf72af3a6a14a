//! Task wiring for a running controller.
//!
//! The relay sequencer and the access control tick loop run as independent
//! tokio tasks, so a tick blocked on a token read or an authentication call
//! never stalls relay settling. Debounce tasks are owned by the
//! [`MonitorHandle`](rpac_hardware::MonitorHandle) and started separately.

use crate::controller::AccessController;
use crate::indicator::IndicatorSink;
use crate::relay::{RelayHandle, RelaySequencer};
use crate::state_machine::AccessState;
use rpac_core::Authenticator;
use rpac_hardware::{ByteSource, OutputPin};
use tokio::sync::watch;
use tokio::task::{JoinError, JoinSet};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Handle for a spawned controller.
pub struct ControllerHandle {
    state: watch::Receiver<AccessState>,
    relay: RelayHandle,
    cancel: CancellationToken,
    tasks: JoinSet<()>,
}

impl ControllerHandle {
    /// Current access state.
    pub fn state(&self) -> AccessState {
        *self.state.borrow()
    }

    /// Receiver for state changes.
    pub fn subscribe(&self) -> watch::Receiver<AccessState> {
        self.state.clone()
    }

    pub fn relay(&self) -> &RelayHandle {
        &self.relay
    }

    /// Stop both loops.
    ///
    /// The relay is requested off first; the sequencer drives it off as it
    /// exits, and any in-flight token read is dropped, which releases reader
    /// power.
    pub async fn shutdown(mut self) {
        self.relay.request(false);
        self.cancel.cancel();

        let mut panics = 0;
        while let Some(result) = self.tasks.join_next().await {
            if let Err(e) = result {
                panics += log_join_error(e);
            }
        }
        info!("Controller stopped ({} task panics)", panics);
    }
}

fn log_join_error(e: JoinError) -> usize {
    if e.is_cancelled() {
        0
    } else {
        error!("Controller task panicked: {}", e);
        1
    }
}

/// Start the relay sequencer and the tick loop.
///
/// Must be called from within a tokio runtime.
pub fn spawn_controller<A, S, P, I, R>(
    mut controller: AccessController<A, S, P, I>,
    sequencer: RelaySequencer<R>,
) -> ControllerHandle
where
    A: Authenticator + 'static,
    S: ByteSource + 'static,
    P: OutputPin + 'static,
    I: IndicatorSink + 'static,
    R: OutputPin + 'static,
{
    let cancel = CancellationToken::new();
    let state = controller.subscribe();
    let relay = controller.relay().clone();
    let tick_interval = controller.config().tick_interval();
    let mut tasks = JoinSet::new();

    tasks.spawn(sequencer.run(cancel.child_token()));

    let tick_cancel = cancel.child_token();
    tasks.spawn(async move {
        let mut interval = tokio::time::interval(tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = tick_cancel.cancelled() => break,
                _ = async {
                    interval.tick().await;
                    controller.tick().await;
                } => {}
            }
        }
        info!("Access control loop stopped in state {}", controller.state());
    });

    ControllerHandle {
        state,
        relay,
        cancel,
        tasks,
    }
}
