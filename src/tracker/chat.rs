use super::{Outbox, SignalContext, TickContext, Tracker};
use crate::config::{BridgeConfig, EventsConfig};
use crate::entity::PlayerId;
use crate::event::{services, HubEvent};
use crate::state::Snapshot;
use crate::world::{ChatKind, LifecycleSignal};
use tracing::{debug, info};

const COLLECTION_LOG_PREFIX: &str = "New item added to your collection log:";

const DIARY_PREFIX: &str = "Well done! You have completed ";
const DIARY_MIDDLE: &str = " task in the ";
const DIARY_SUFFIX: &str = " area. Your Achievement Diary has been updated.";
const DIARY_TIERS: [&str; 4] = ["easy", "medium", "hard", "elite"];

const COMBAT_PREFIX: &str = "Congratulations, you've completed ";
const COMBAT_MIDDLE: &str = " combat task:";
const COMBAT_TIERS: [&str; 6] = ["easy", "medium", "hard", "elite", "master", "grandmaster"];

const SAMPLE_ITEM: &str = "Test Item";
const SAMPLE_DIARY: &str =
    "Well done! You have completed an easy task in the Western Provinces area. Your Achievement Diary has been updated.";
const SAMPLE_COMBAT_TASK: &str =
    "Congratulations, you've completed an easy combat task: <col=06600c>A Slow Death</col> (1 point).";

/// Remove `<tag>` markup from chat text
///
/// ```
/// use tickbridge::tracker::chat::strip_tags;
///
/// assert_eq!(strip_tags("<col=ff0000>Dragon</col> axe"), "Dragon axe");
/// assert_eq!(strip_tags("a < b"), "a < b");
/// ```
pub fn strip_tags(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find('<') {
        match rest[open..].find('>') {
            Some(close) => {
                out.push_str(&rest[..open]);
                rest = &rest[open + close + 1..];
            }
            None => break,
        }
    }
    out.push_str(rest);
    out
}

/// A completed task announced in chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskCompletion {
    pub task_name: String,
    /// Lowercase tier name
    pub tier: String,
}

fn strip_prefix_ci<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(&text[prefix.len()..])
    } else {
        None
    }
}

fn strip_suffix_ci<'a>(text: &'a str, suffix: &str) -> Option<&'a str> {
    let split = text.len().checked_sub(suffix.len())?;
    let tail = text.get(split..)?;
    if tail.eq_ignore_ascii_case(suffix) {
        Some(&text[..split])
    } else {
        None
    }
}

/// "a"/"an" followed by one of `tiers`; returns the tier and what follows it
fn article_and_tier<'a>(text: &'a str, tiers: &[&str]) -> Option<(String, &'a str)> {
    let rest = strip_prefix_ci(text, "an ").or_else(|| strip_prefix_ci(text, "a "))?;
    tiers.iter().find_map(|tier| {
        strip_prefix_ci(rest, tier).map(|after| (tier.to_string(), after))
    })
}

/// "Well done! You have completed an easy task in the Varrock area. ..."
pub fn parse_diary(message: &str) -> Option<TaskCompletion> {
    let rest = strip_prefix_ci(message, DIARY_PREFIX)?;
    let (tier, rest) = article_and_tier(rest, &DIARY_TIERS)?;
    let rest = strip_prefix_ci(rest, DIARY_MIDDLE)?;
    let region = strip_suffix_ci(rest, DIARY_SUFFIX)?;

    if region.is_empty() {
        return None;
    }
    Some(TaskCompletion {
        task_name: region.to_string(),
        tier,
    })
}

/// "Congratulations, you've completed a hard combat task: Task name (3 points)."
pub fn parse_combat_task(message: &str) -> Option<TaskCompletion> {
    let rest = strip_prefix_ci(message, COMBAT_PREFIX)?;
    let (tier, rest) = article_and_tier(rest, &COMBAT_TIERS)?;
    let task = strip_prefix_ci(rest, COMBAT_MIDDLE)?.trim();

    if task.is_empty() {
        return None;
    }
    Some(TaskCompletion {
        task_name: task.to_string(),
        tier,
    })
}

/// "New item added to your collection log: Dragon pickaxe"
pub fn parse_collection_log(message: &str) -> Option<String> {
    message
        .strip_prefix(COLLECTION_LOG_PREFIX)
        .map(|item| item.trim().to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sample {
    CollectionLog,
    AchievementDiary,
    CombatTask,
}

/// Collection log, achievement diary and combat task announcements
pub struct ChatTracker {
    config: EventsConfig,
    samples: Vec<Sample>,
}

impl ChatTracker {
    pub fn new(config: &BridgeConfig) -> Self {
        Self {
            config: config.events.clone(),
            samples: Vec::new(),
        }
    }

    fn handle_message(&self, text: &str, out: &mut Outbox) {
        let message = strip_tags(text);

        if self.config.collection_log {
            if let Some(item) = parse_collection_log(&message) {
                debug!(item = %item, "Collection log unlock");
                out.send(HubEvent::new(services::COLLECTION_LOG).with("item_name", item));
                return;
            }
        }

        if self.config.achievement_diary {
            if let Some(done) = parse_diary(&message) {
                debug!(region = %done.task_name, tier = %done.tier, "Diary task completed");
                out.send(
                    HubEvent::new(services::ACHIEVEMENT_DIARY)
                        .with("task_name", done.task_name)
                        .with("tier", done.tier),
                );
                return;
            }
        }

        if self.config.combat_task {
            if let Some(done) = parse_combat_task(&message) {
                debug!(task = %done.task_name, tier = %done.tier, "Combat task completed");
                out.send(
                    HubEvent::new(services::COMBAT_TASK)
                        .with("task_name", done.task_name)
                        .with("tier", done.tier),
                );
            }
        }
    }
}

impl Tracker for ChatTracker {
    fn name(&self) -> &'static str {
        "chat"
    }

    fn on_tick(&mut self, _ctx: &TickContext<'_>, out: &mut Outbox) {
        for sample in std::mem::take(&mut self.samples) {
            info!(?sample, "Sending test event");
            match sample {
                Sample::CollectionLog => {
                    out.send(HubEvent::new(services::COLLECTION_LOG).with("item_name", SAMPLE_ITEM))
                }
                Sample::AchievementDiary => self.handle_message(SAMPLE_DIARY, out),
                Sample::CombatTask => self.handle_message(SAMPLE_COMBAT_TASK, out),
            }
        }
    }

    fn snapshot(&self, _player: &PlayerId) -> Snapshot {
        Snapshot::new()
    }

    fn on_config_changed(&mut self, key: &str, config: &BridgeConfig) {
        let events = &config.events;
        // A changed key that is now on was just switched on
        let sample = match key {
            "events.test_collection_log" if events.test_collection_log => Some(Sample::CollectionLog),
            "events.test_achievement_diary" if events.test_achievement_diary => {
                Some(Sample::AchievementDiary)
            }
            "events.test_combat_task" if events.test_combat_task => Some(Sample::CombatTask),
            _ => None,
        };

        if let Some(sample) = sample {
            if !self.samples.contains(&sample) {
                self.samples.push(sample);
            }
        }
        if key.starts_with("events.") {
            self.config = events.clone();
        }
    }

    fn on_signal(&mut self, signal: &LifecycleSignal, _ctx: &SignalContext<'_>, out: &mut Outbox) {
        if let LifecycleSignal::ChatMessage {
            chat: ChatKind::GameMessage,
            text,
        } = signal
        {
            self.handle_message(text, out);
        }
    }
}
