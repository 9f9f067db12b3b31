use super::{Outbox, SignalContext, TickContext, Tracker};
use crate::config::BridgeConfig;
use crate::entity::PlayerId;
use crate::event::{services, HubEvent};
use crate::state::Snapshot;
use crate::world::{ids::IDLE_ANIMATION, LifecycleSignal, PlayerActivity};
use tracing::debug;

/// Player is doing something: animating, in a non-idle pose or interacting
pub fn is_active(activity: &PlayerActivity) -> bool {
    activity.animation != IDLE_ANIMATION
        || (activity.pose != IDLE_ANIMATION && activity.pose != activity.idle_pose)
        || activity.interacting
}

/// Sends `trigger_idle_notify` once per idle period
pub struct IdleTracker {
    enabled: bool,
    delay: u32,
    last_active_tick: Option<u64>,
    sent: bool,
}

impl IdleTracker {
    pub fn new(config: &BridgeConfig) -> Self {
        Self {
            enabled: config.events.idle,
            delay: config.events.idle_tick_delay,
            last_active_tick: None,
            sent: false,
        }
    }

    fn reset(&mut self) {
        self.last_active_tick = None;
        self.sent = false;
    }
}

impl Tracker for IdleTracker {
    fn name(&self) -> &'static str {
        "idle"
    }

    fn on_tick(&mut self, ctx: &TickContext<'_>, out: &mut Outbox) {
        if !self.enabled {
            return;
        }
        let Some(activity) = ctx.world.activity() else {
            return;
        };

        if is_active(&activity) {
            self.last_active_tick = Some(ctx.tick);
            self.sent = false;
            return;
        }

        // Only players seen active at least once can become idle
        let Some(last) = self.last_active_tick else {
            return;
        };
        if !self.sent && ctx.tick >= last + u64::from(self.delay) {
            debug!(tick = ctx.tick, last_active = last, "Player became idle");
            self.sent = true;
            out.send(HubEvent::new(services::IDLE));
        }
    }

    fn snapshot(&self, _player: &PlayerId) -> Snapshot {
        Snapshot::new()
    }

    fn on_config_changed(&mut self, key: &str, config: &BridgeConfig) {
        match key {
            "events.idle" => {
                self.enabled = config.events.idle;
                self.reset();
            }
            "events.idle_tick_delay" => self.delay = config.events.idle_tick_delay,
            _ => {}
        }
    }

    fn on_signal(&mut self, signal: &LifecycleSignal, _ctx: &SignalContext<'_>, _out: &mut Outbox) {
        if matches!(signal, LifecycleSignal::PlayerDespawned) {
            self.reset();
        }
    }
}
