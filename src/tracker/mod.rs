// Attribute trackers
//
// Each tracker owns one slice of domain state. The pipeline calls them in a
// fixed order once per tick, diffs their snapshots and forwards one-shot
// events they queue in the outbox.

use crate::config::BridgeConfig;
use crate::entity::PlayerId;
use crate::event::HubEvent;
use crate::state::Snapshot;
use crate::world::{LifecycleSignal, World};

pub mod aggression;
pub mod birdhouse;
pub mod chat;
pub mod daily;
pub mod growth;
pub mod idle;
pub mod varbit;
pub mod vitals;

pub use aggression::AggressionTracker;
pub use birdhouse::BirdhouseTracker;
pub use chat::ChatTracker;
pub use daily::DailyTracker;
pub use growth::FarmingTracker;
pub use idle::IdleTracker;
pub use varbit::VarbitTracker;
pub use vitals::VitalsTracker;

/// Inputs for one tick; only built once the player identity is known
pub struct TickContext<'a> {
    pub world: &'a dyn World,
    pub player: &'a PlayerId,
    pub tick: u64,
}

/// Inputs for a lifecycle signal; the player may be unknown (logged out)
pub struct SignalContext<'a> {
    pub world: &'a dyn World,
    pub player: Option<&'a PlayerId>,
    pub tick: u64,
}

/// One-shot events queued by trackers, sent after the tracker returns
#[derive(Debug, Default)]
pub struct Outbox {
    events: Vec<HubEvent>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn send(&mut self, event: HubEvent) {
        self.events.push(event);
    }

    pub fn take(&mut self) -> Vec<HubEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// How a tracker's changes reach the hub
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Buffered until the global throttle window elapses
    Throttled,
    /// Sent as a batch of their own on the tick they are detected
    Immediate,
}

/// One independent unit of derived state.
///
/// `on_tick` advances internal state from the world; `snapshot` renders the
/// current state as entities and must not read the world, so it can be
/// called again after a signal without a fresh sample.
pub trait Tracker: Send {
    fn name(&self) -> &'static str;

    fn on_tick(&mut self, ctx: &TickContext<'_>, out: &mut Outbox);

    /// Current entity attributes; empty when nothing is tracked
    fn snapshot(&self, player: &PlayerId) -> Snapshot;

    /// Re-derive thresholds for a changed dotted config key. Never emits.
    fn on_config_changed(&mut self, _key: &str, _config: &BridgeConfig) {}

    fn on_signal(
        &mut self,
        _signal: &LifecycleSignal,
        _ctx: &SignalContext<'_>,
        _out: &mut Outbox,
    ) {
    }

    fn on_login_state_changed(&mut self, _logged_in: bool) {}

    fn delivery(&self) -> Delivery {
        Delivery::Throttled
    }
}

/// Every tracker in pipeline order
pub fn default_trackers(config: &BridgeConfig) -> Vec<Box<dyn Tracker>> {
    vec![
        Box::new(VitalsTracker::new(config)),
        Box::new(AggressionTracker::new(config)),
        Box::new(FarmingTracker::new(config)),
        Box::new(BirdhouseTracker::new(config)),
        Box::new(DailyTracker::new(config)),
        Box::new(VarbitTracker::new(config)),
        Box::new(IdleTracker::new(config)),
        Box::new(ChatTracker::new(config)),
    ]
}
