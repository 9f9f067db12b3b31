use super::{Delivery, Outbox, SignalContext, TickContext, Tracker};
use crate::config::{BridgeConfig, ProgressDelivery};
use crate::entity::{EntityKey, PlayerId};
use crate::state::{Attributes, Snapshot};
use crate::world::{GameState, LifecycleSignal, WorldPoint};
use serde_json::json;
use tracing::debug;

/// Ticks until nearby monsters stop being aggressive
pub const AGGRESSION_CEILING_TICKS: u32 = 1000;

/// Chebyshev distance from both anchors that resets the countdown
pub const RESET_DISTANCE: i32 = 11;

/// Length of one tick in seconds
const TICK_SECONDS: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Uninitialized,
    Idle,
    Active,
}

/// What a single timer step produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerStep {
    /// Nothing to report
    Quiet,
    /// Progress checkpoint with the ticks still remaining
    Progress(u32),
    /// Countdown just reached zero
    Safe,
    /// Player left both anchors; countdown restarted
    Reset { was_active: bool },
}

/// Proximity-reset countdown.
///
/// Remembers the two most recent reset positions. Moving at least
/// [`RESET_DISTANCE`] tiles away from both restarts the countdown; otherwise
/// it runs down to zero, reporting progress at most once per `delay` ticks.
#[derive(Debug, Clone)]
pub struct ProximityTimer {
    phase: Phase,
    older: WorldPoint,
    newer: WorldPoint,
    ticks_left: u32,
    rearm: u32,
    delay: u32,
}

impl ProximityTimer {
    pub fn new(delay: u32) -> Self {
        Self {
            phase: Phase::Uninitialized,
            older: WorldPoint::new(0, 0),
            newer: WorldPoint::new(0, 0),
            ticks_left: 0,
            rearm: 0,
            delay,
        }
    }

    /// Advance one tick with the current position
    pub fn step(&mut self, position: WorldPoint) -> TimerStep {
        if self.phase == Phase::Uninitialized {
            self.older = position;
            self.newer = position;
            self.ticks_left = AGGRESSION_CEILING_TICKS;
            self.rearm = self.delay;
            self.phase = Phase::Idle;
            return TimerStep::Quiet;
        }

        self.rearm = self.rearm.saturating_sub(1);

        if position.distance_to(&self.older) >= RESET_DISTANCE
            && position.distance_to(&self.newer) >= RESET_DISTANCE
        {
            let was_active = self.phase == Phase::Active;
            self.older = self.newer;
            self.newer = position;
            self.ticks_left = AGGRESSION_CEILING_TICKS;
            self.rearm = self.delay;
            self.phase = Phase::Idle;
            return TimerStep::Reset { was_active };
        }

        if self.ticks_left == 0 {
            return TimerStep::Quiet;
        }

        self.ticks_left -= 1;
        if self.ticks_left == 0 {
            self.rearm = self.delay;
            self.phase = Phase::Idle;
            return TimerStep::Safe;
        }

        if self.rearm == 0 {
            self.rearm = self.delay;
            self.phase = Phase::Active;
            return TimerStep::Progress(self.ticks_left);
        }

        TimerStep::Quiet
    }

    pub fn set_delay(&mut self, delay: u32) {
        self.delay = delay;
    }

    /// Forget the anchors; the next step starts clean
    pub fn reset(&mut self) {
        *self = Self::new(self.delay);
    }

    pub fn ticks_left(&self) -> u32 {
        self.ticks_left
    }

    pub fn is_initialized(&self) -> bool {
        self.phase != Phase::Uninitialized
    }

    pub fn anchors(&self) -> (WorldPoint, WorldPoint) {
        (self.older, self.newer)
    }
}

/// Remaining ticks as whole seconds
pub fn ticks_to_seconds(ticks: u32) -> i64 {
    (ticks as f64 * TICK_SECONDS).round() as i64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Report {
    status: &'static str,
    ticks: u32,
}

/// Mirrors the aggression countdown as `<player>_aggression`
pub struct AggressionTracker {
    enabled: bool,
    delivery: ProgressDelivery,
    timer: ProximityTimer,
    report: Option<Report>,
}

impl AggressionTracker {
    pub fn new(config: &BridgeConfig) -> Self {
        Self {
            enabled: config.aggression.enabled,
            delivery: config.pipeline.progress_delivery,
            timer: ProximityTimer::new(config.aggression.delay_ticks),
            report: None,
        }
    }

    fn reset(&mut self) {
        self.timer.reset();
        self.report = None;
    }
}

impl Tracker for AggressionTracker {
    fn name(&self) -> &'static str {
        "aggression"
    }

    fn on_tick(&mut self, ctx: &TickContext<'_>, _out: &mut Outbox) {
        if !self.enabled || ctx.world.game_state() != GameState::LoggedIn {
            return;
        }
        let Some(position) = ctx.world.position() else {
            return;
        };

        match self.timer.step(position) {
            TimerStep::Quiet => {}
            TimerStep::Progress(ticks) => {
                self.report = Some(Report {
                    status: "active",
                    ticks,
                });
            }
            TimerStep::Safe => {
                self.report = Some(Report {
                    status: "safe",
                    ticks: 0,
                });
            }
            TimerStep::Reset { was_active } => {
                debug!(tick = ctx.tick, was_active, "Aggression timer reset");
            }
        }
    }

    fn snapshot(&self, player: &PlayerId) -> Snapshot {
        let mut snapshot = Snapshot::new();
        if let Some(report) = self.report {
            let mut attributes = Attributes::new();
            attributes.insert("status".to_string(), json!(report.status));
            attributes.insert("seconds".to_string(), json!(ticks_to_seconds(report.ticks)));
            attributes.insert("ticks".to_string(), json!(report.ticks));
            snapshot.insert(EntityKey::new(player, "aggression"), attributes);
        }
        snapshot
    }

    fn on_config_changed(&mut self, key: &str, config: &BridgeConfig) {
        match key {
            "aggression.enabled" => {
                self.enabled = config.aggression.enabled;
                if !self.enabled {
                    self.reset();
                }
            }
            "aggression.delay_ticks" => self.timer.set_delay(config.aggression.delay_ticks),
            "pipeline.progress_delivery" => self.delivery = config.pipeline.progress_delivery,
            _ => {}
        }
    }

    fn on_signal(&mut self, signal: &LifecycleSignal, _ctx: &SignalContext<'_>, _out: &mut Outbox) {
        if let LifecycleSignal::GameStateChanged { state } = signal {
            if matches!(
                state,
                GameState::Loading | GameState::Hopping | GameState::LoginScreen
            ) {
                self.timer.reset();
            }
        }
    }

    fn delivery(&self) -> Delivery {
        match self.delivery {
            ProgressDelivery::Throttled => Delivery::Throttled,
            ProgressDelivery::Immediate => Delivery::Immediate,
        }
    }
}
