use std::{future::Future, time::Duration};

use shared::domain::OperationKind;
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};
use tracing::debug;

const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Flush cadence per operation kind. Growing the id space is rare and can
/// wait; selection and ordering are interactive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlushSchedule {
    pub membership: Duration,
    pub interactive: Duration,
}

impl FlushSchedule {
    pub fn interval(&self, kind: OperationKind) -> Duration {
        match kind {
            OperationKind::AddItem => self.membership,
            OperationKind::Select | OperationKind::Deselect | OperationKind::Reorder => {
                self.interactive
            }
        }
    }
}

impl Default for FlushSchedule {
    fn default() -> Self {
        Self {
            membership: Duration::from_secs(10),
            interactive: Duration::from_secs(1),
        }
    }
}

/// Runs `flush` every `period` until `shutdown` turns true or its sender drops.
/// A flush in progress always finishes before the loop observes shutdown.
/// A zero `period` is raised to one millisecond.
pub fn spawn_flush_loop<F, Fut>(
    name: &'static str,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
    mut flush: F,
) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = interval(period.max(MIN_PERIOD));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => flush().await,
            }
        }
        debug!(queue = name, "flush loop stopped");
    })
}
