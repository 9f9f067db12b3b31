// Tick scheduler
//
// Runs every tracker in a fixed order on each tick, diffs their snapshots,
// buffers the changes and lets the dispatcher decide when to flush. Single
// threaded: nothing here blocks and nothing waits on the transport.

use crate::config::{changed_keys, BridgeConfig};
use crate::dispatch::{Dispatcher, Transport};
use crate::entity::PlayerId;
use crate::state::ChangeDetector;
use crate::tracker::{
    default_trackers, Delivery, Outbox, SignalContext, TickContext, Tracker,
};
use crate::world::{GameState, LifecycleSignal, World};
use std::sync::Arc;
use tracing::{debug, info, warn};


/// A tracker and the last state emitted on its behalf
struct Slot {
    tracker: Box<dyn Tracker>,
    detector: ChangeDetector,
}

pub struct Pipeline {
    config: BridgeConfig,
    slots: Vec<Slot>,
    dispatcher: Dispatcher,
    tick: u64,
    logged_in: bool,
    /// Last identity resolved from the world
    player: Option<PlayerId>,
}

impl Pipeline {
    /// Pipeline with every tracker registered
    pub fn new(config: BridgeConfig, transport: Arc<dyn Transport>) -> Self {
        let trackers = default_trackers(&config);
        Self::with_trackers(config, transport, trackers)
    }

    /// Pipeline running `trackers` in the given order
    pub fn with_trackers(
        config: BridgeConfig,
        transport: Arc<dyn Transport>,
        trackers: Vec<Box<dyn Tracker>>,
    ) -> Self {
        let dispatcher = Dispatcher::new(transport, config.pipeline.update_throttle_ticks);
        let slots = trackers
            .into_iter()
            .map(|tracker| Slot {
                tracker,
                detector: ChangeDetector::new(),
            })
            .collect();

        Self {
            config,
            slots,
            dispatcher,
            tick: 0,
            logged_in: false,
            player: None,
        }
    }

    /// One tick: every tracker, then the flush check.
    ///
    /// Trackers are skipped entirely while logged out or while the player
    /// identity cannot be resolved. A tick that reports a logged-in world
    /// before any login signal arrived counts as the login.
    pub fn on_tick(&mut self, world: &dyn World) {
        self.tick += 1;

        if !self.logged_in && world.game_state() == GameState::LoggedIn {
            self.on_login_state_changed(true);
        }

        let player = if self.logged_in {
            world.player_name().and_then(PlayerId::from_display_name)
        } else {
            None
        };

        match player {
            Some(player) => {
                for slot in &mut self.slots {
                    let ctx = TickContext {
                        world,
                        player: &player,
                        tick: self.tick,
                    };
                    let mut out = Outbox::new();
                    slot.tracker.on_tick(&ctx, &mut out);
                    collect(slot, &player, &mut self.dispatcher);
                    send_events(&self.dispatcher, slot.tracker.name(), out);
                }
                self.player = Some(player);
            }
            None => debug!(
                tick = self.tick,
                logged_in = self.logged_in,
                "Player not available, skipping trackers"
            ),
        }

        self.dispatcher.on_tick();
    }

    /// Discrete event outside the tick cadence
    pub fn on_signal(&mut self, world: &dyn World, signal: &LifecycleSignal) {
        let transition = match signal {
            LifecycleSignal::GameStateChanged { state } => match state {
                GameState::LoggedIn if !self.logged_in => Some(true),
                GameState::LoginScreen | GameState::ConnectionLost if self.logged_in => Some(false),
                _ => None,
            },
            _ => None,
        };

        // Fresh window before anything from the new session is buffered
        if transition == Some(true) {
            self.on_login_state_changed(true);
        }

        let player = world
            .player_name()
            .and_then(PlayerId::from_display_name)
            .or_else(|| self.player.clone());

        for slot in &mut self.slots {
            let ctx = SignalContext {
                world,
                player: player.as_ref(),
                tick: self.tick,
            };
            let mut out = Outbox::new();
            slot.tracker.on_signal(signal, &ctx, &mut out);
            send_events(&self.dispatcher, slot.tracker.name(), out);
        }

        if let Some(player) = &player {
            for slot in &mut self.slots {
                collect(slot, player, &mut self.dispatcher);
            }
        }

        if transition == Some(false) {
            // No more ticks until the next login
            self.dispatcher.flush_now();
            self.on_login_state_changed(false);
        }
    }

    /// Login/logout transition
    pub fn on_login_state_changed(&mut self, logged_in: bool) {
        info!(logged_in, tick = self.tick, "Login state changed");
        self.logged_in = logged_in;

        if logged_in {
            // Nothing from the last session is known to have reached the hub
            self.dispatcher.reset();
            for slot in &mut self.slots {
                slot.detector.clear();
            }
        }
        for slot in &mut self.slots {
            slot.tracker.on_login_state_changed(logged_in);
        }
    }

    /// Replace the whole configuration; returns the keys that changed
    pub fn update_config(&mut self, config: BridgeConfig) -> Vec<String> {
        let keys = changed_keys(&self.config, &config);
        self.config = config;
        for key in &keys {
            self.on_config_changed(key);
        }
        keys
    }

    /// Tell every tracker that one dotted key changed.
    ///
    /// Only re-derives state; anything visible happens on the next tick.
    pub fn on_config_changed(&mut self, key: &str) {
        debug!(key, "Config changed");
        if key == "pipeline.update_throttle_ticks" {
            self.dispatcher
                .set_throttle(self.config.pipeline.update_throttle_ticks);
        }
        for slot in &mut self.slots {
            slot.tracker.on_config_changed(key, &self.config);
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Ticks seen so far
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn is_logged_in(&self) -> bool {
        self.logged_in
    }

    /// Entities buffered for the next flush
    pub fn pending(&self) -> usize {
        self.dispatcher.pending()
    }

    /// Tracker names in run order
    pub fn tracker_names(&self) -> Vec<&'static str> {
        self.slots.iter().map(|slot| slot.tracker.name()).collect()
    }
}

/// Diff one tracker's snapshot and hand the changes downstream
fn collect(slot: &mut Slot, player: &PlayerId, dispatcher: &mut Dispatcher) {
    let snapshot = slot.tracker.snapshot(player);
    let records = slot.detector.detect(&snapshot);

    if !records.is_empty() {
        debug!(tracker = slot.tracker.name(), changes = records.len(), "Changes detected");
        match slot.tracker.delivery() {
            Delivery::Throttled => {
                for record in records {
                    slot.detector.commit(&record);
                    dispatcher.accept(record);
                }
            }
            Delivery::Immediate => {
                dispatcher.send_batch(&records);
                for record in &records {
                    slot.detector.commit(record);
                }
            }
        }
    }

    slot.detector.retain_observed(&snapshot);
}

fn send_events(dispatcher: &Dispatcher, tracker: &str, mut out: Outbox) {
    for event in out.take() {
        if let Err(e) = dispatcher.send_immediate(&event) {
            warn!(tracker, error = %e, "Tracker produced an invalid event");
        }
    }
}
