use std::sync::mpsc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Messages timer tasks deliver to the state owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// Carries the generation of the ticker that sent it.
    GatewayTick(u64),
    NoticeExpired(u64),
}

/// A spawned timer task. Dropping the handle cancels the task.
#[derive(Debug)]
pub struct TimerHandle {
    task: JoinHandle<()>,
}

impl TimerHandle {
    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Spawns timer tasks on a tokio runtime. Tasks never touch state; they only
/// send [`TimerEvent`]s, which the owner drains and applies.
pub struct Scheduler {
    handle: Handle,
    tx: mpsc::Sender<TimerEvent>,
    rx: mpsc::Receiver<TimerEvent>,
}

impl Scheduler {
    pub fn new(handle: Handle) -> Self {
        let (tx, rx) = mpsc::channel();
        Self { handle, tx, rx }
    }

    /// Sends `event` every `period`, first after one full period.
    pub fn every(&self, period: Duration, event: TimerEvent) -> TimerHandle {
        let tx = self.tx.clone();
        let task = self.handle.spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if tx.send(event).is_err() {
                    break;
                }
            }
        });
        TimerHandle { task }
    }

    /// Sends `event` once after `delay`.
    pub fn after(&self, delay: Duration, event: TimerEvent) -> TimerHandle {
        let tx = self.tx.clone();
        let task = self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(event);
        });
        TimerHandle { task }
    }

    /// Everything delivered so far, without blocking.
    pub fn drain(&self) -> Vec<TimerEvent> {
        self.rx.try_iter().collect()
    }
}
