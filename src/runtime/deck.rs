use std::time::Duration;
use tokio::runtime::Handle;
use tracing::debug;

use crate::config::{Config, ConfigError};
use crate::gateway::Simulator;
use crate::runtime::{Scheduler, TimerEvent, TimerHandle};
use crate::store::Store;

/// The single owner of a [`Store`] and of every timer that feeds it.
///
/// Timers are tied to the deck's lifetime: dropping the deck, restarting the
/// gateway, or posting a new notice cancels the timer it replaces.
pub struct Deck {
    store: Store,
    simulator: Simulator,
    scheduler: Scheduler,
    gateway_timer: Option<TimerHandle>,
    gateway_generation: u64,
    notice_timer: Option<TimerHandle>,
    armed_notice: Option<u64>,
    notice_ttl: Duration,
}

impl Deck {
    /// Fails if `config` does not pass [`Config::validate`].
    pub fn new(store: Store, config: &Config, handle: Handle) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            store,
            simulator: Simulator::new(config.gateway.clone())?,
            scheduler: Scheduler::new(handle),
            gateway_timer: None,
            gateway_generation: 0,
            notice_timer: None,
            armed_notice: None,
            notice_ttl: Duration::from_millis(config.ui.notification_ms),
        })
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn simulator(&self) -> &Simulator {
        &self.simulator
    }

    /// Runs a mutation and re-arms the notice timer if it posted a notice.
    pub fn apply<T>(&mut self, mutate: impl FnOnce(&mut Store) -> T) -> T {
        let out = mutate(&mut self.store);
        self.settle();
        out
    }

    /// Starts the gateway ticker if enabled, cancelling any running one.
    /// Ticks the old ticker already queued are discarded.
    pub fn start_gateway(&mut self) {
        self.stop_gateway();
        if !self.simulator.enabled() {
            debug!("gateway disabled by config");
            return;
        }
        let period = self.simulator.interval();
        let generation = self.gateway_generation;
        self.gateway_timer = Some(self.scheduler.every(period, TimerEvent::GatewayTick(generation)));
        debug!(?period, generation, "gateway started");
    }

    pub fn stop_gateway(&mut self) {
        self.gateway_generation += 1;
        if let Some(timer) = self.gateway_timer.take() {
            timer.cancel();
            debug!("gateway stopped");
        }
    }

    pub fn gateway_running(&self) -> bool {
        self.gateway_timer.is_some()
    }

    /// Applies every timer event delivered so far. Returns how many were
    /// handled.
    pub fn pump(&mut self) -> usize {
        let events = self.scheduler.drain();
        for event in &events {
            match *event {
                TimerEvent::GatewayTick(generation) => {
                    if generation == self.gateway_generation && self.gateway_timer.is_some() {
                        self.store.gateway_tick(&self.simulator);
                    }
                }
                TimerEvent::NoticeExpired(seq) => {
                    if self.store.dismiss_notice(seq) {
                        self.armed_notice = None;
                        self.notice_timer = None;
                    }
                }
            }
        }
        events.len()
    }

    fn settle(&mut self) {
        let current = self.store.notice().map(|n| n.seq);
        if current == self.armed_notice {
            return;
        }
        self.notice_timer = current
            .map(|seq| self.scheduler.after(self.notice_ttl, TimerEvent::NoticeExpired(seq)));
        self.armed_notice = current;
    }
}
