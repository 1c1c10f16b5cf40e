use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::models::Task;

/// Title shared by every reminder surface.
pub const NOTIFICATION_TITLE: &str = "Remindly - Task Reminder";
/// Fixed icon reference attached to system notifications.
pub const NOTIFICATION_ICON: &str = "icons/bell.svg";
/// How long a delivered notification stays up before it is dismissed, where
/// the platform supports programmatic dismissal.
pub const AUTO_DISMISS_SECS: u64 = 10;
/// Pulse pattern for the haptic tier, in milliseconds (vibrate/pause/...).
pub const VIBRATION_PATTERN: [u32; 5] = [200, 100, 200, 100, 200];

/// The rendered reminder payload handed to each delivery tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderNotice {
    pub title: String,
    pub body: String,
    /// Repeat notifications with the same tag replace each other instead of
    /// stacking.
    pub tag: String,
    pub require_interaction: bool,
    pub icon: &'static str,
}

impl ReminderNotice {
    pub fn for_task(task: &Task) -> Self {
        Self {
            title: NOTIFICATION_TITLE.to_string(),
            body: format!("Time for: {}", task.name),
            tag: format!("task-{}", task.id),
            require_interaction: true,
            icon: NOTIFICATION_ICON,
        }
    }

    /// Stable numeric form of the tag, for notification backends that
    /// collapse by integer id rather than by string tag.
    pub fn collapse_id(&self) -> i32 {
        let mut hasher = DefaultHasher::new();
        self.tag.hash(&mut hasher);
        hasher.finish() as i32
    }
}

/// What a tier did with the notice. `Passthrough` means the tier either does
/// not apply or is supplemental; the walk continues to the next tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Completed,
    Passthrough,
}

#[derive(Debug)]
pub enum DeliveryError {
    Unsupported,
    Failed(String),
}

impl std::fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryError::Unsupported => write!(f, "not supported on this platform"),
            DeliveryError::Failed(message) => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for DeliveryError {}

/// One strategy for surfacing a reminder to the user.
pub trait DeliveryTier: Send + Sync {
    fn name(&self) -> &'static str;
    fn deliver(&self, notice: &ReminderNotice) -> Result<Delivery, DeliveryError>;
}

/// Walks an ordered list of delivery tiers until one reports `Completed`.
/// Tier failures are logged and swallowed; running out of tiers means the
/// user receives nothing, which is acceptable for best-effort reminders.
pub struct Notifier {
    tiers: Vec<Box<dyn DeliveryTier>>,
}

impl Notifier {
    pub fn new(tiers: Vec<Box<dyn DeliveryTier>>) -> Self {
        Self { tiers }
    }

    pub fn notify(&self, task: &Task) {
        let notice = ReminderNotice::for_task(task);
        for tier in &self.tiers {
            match tier.deliver(&notice) {
                Ok(Delivery::Completed) => {
                    log::debug!("reminder for task {} delivered via {}", task.id, tier.name());
                    return;
                }
                Ok(Delivery::Passthrough) => continue,
                Err(error) => {
                    log::warn!("delivery tier {} failed: {error}", tier.name());
                    continue;
                }
            }
        }
        log::info!("no delivery tier reached the user for task {}", task.id);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    Default,
    Granted,
    Denied,
}

/// Host notification-permission API: query the tri-state, prompt the user.
pub trait PermissionGate {
    fn state(&self) -> PermissionState;
    fn request(&self) -> PermissionState;
}

/// Requests notification permission once, only while it is still undecided.
/// A previous grant or denial is respected and never re-prompted.
pub fn ensure_permission(gate: &dyn PermissionGate) -> PermissionState {
    match gate.state() {
        PermissionState::Default => {
            log::info!("requesting notification permission");
            gate.request()
        }
        state => state,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    fn make_task(id: &str, name: &str) -> Task {
        let now = Utc::now();
        Task {
            id: id.to_string(),
            name: name.to_string(),
            time: now + Duration::hours(1),
            reminder_minutes: 5,
            reminder_time: now + Duration::minutes(55),
            completed: false,
            created_at: now,
        }
    }

    struct ScriptedTier {
        name: &'static str,
        outcome: fn() -> Result<Delivery, DeliveryError>,
        calls: Arc<Mutex<Vec<&'static str>>>,
    }

    impl DeliveryTier for ScriptedTier {
        fn name(&self) -> &'static str {
            self.name
        }

        fn deliver(&self, _notice: &ReminderNotice) -> Result<Delivery, DeliveryError> {
            self.calls.lock().unwrap().push(self.name);
            (self.outcome)()
        }
    }

    fn tier(
        name: &'static str,
        outcome: fn() -> Result<Delivery, DeliveryError>,
        calls: &Arc<Mutex<Vec<&'static str>>>,
    ) -> Box<dyn DeliveryTier> {
        Box::new(ScriptedTier {
            name,
            outcome,
            calls: Arc::clone(calls),
        })
    }

    #[test]
    fn notice_payload_is_built_from_the_task() {
        let notice = ReminderNotice::for_task(&make_task("42", "Pay rent"));
        assert_eq!(notice.title, NOTIFICATION_TITLE);
        assert_eq!(notice.body, "Time for: Pay rent");
        assert_eq!(notice.tag, "task-42");
        assert!(notice.require_interaction);
        assert_eq!(notice.icon, NOTIFICATION_ICON);
    }

    #[test]
    fn collapse_id_is_stable_per_tag() {
        let a = ReminderNotice::for_task(&make_task("1", "a"));
        let b = ReminderNotice::for_task(&make_task("1", "renamed"));
        let c = ReminderNotice::for_task(&make_task("2", "a"));
        assert_eq!(a.collapse_id(), b.collapse_id());
        assert_ne!(a.collapse_id(), c.collapse_id());
    }

    #[test]
    fn walk_stops_at_the_first_completed_tier() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let notifier = Notifier::new(vec![
            tier("haptic", || Ok(Delivery::Passthrough), &calls),
            tier("system", || Ok(Delivery::Completed), &calls),
            tier("alert", || Ok(Delivery::Completed), &calls),
        ]);

        notifier.notify(&make_task("1", "walk dog"));
        assert_eq!(*calls.lock().unwrap(), vec!["haptic", "system"]);
    }

    #[test]
    fn tier_errors_fall_through_to_the_next_tier() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let notifier = Notifier::new(vec![
            tier("haptic", || Err(DeliveryError::Unsupported), &calls),
            tier(
                "system",
                || Err(DeliveryError::Failed("backend down".to_string())),
                &calls,
            ),
            tier("alert", || Ok(Delivery::Completed), &calls),
        ]);

        notifier.notify(&make_task("1", "walk dog"));
        assert_eq!(*calls.lock().unwrap(), vec!["haptic", "system", "alert"]);
    }

    #[test]
    fn exhausting_all_tiers_is_not_an_error() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let notifier = Notifier::new(vec![tier(
            "haptic",
            || Ok(Delivery::Passthrough),
            &calls,
        )]);
        notifier.notify(&make_task("1", "walk dog"));
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    struct FakeGate {
        state: PermissionState,
        granted_on_request: PermissionState,
        requests: AtomicUsize,
    }

    impl PermissionGate for FakeGate {
        fn state(&self) -> PermissionState {
            self.state
        }

        fn request(&self) -> PermissionState {
            self.requests.fetch_add(1, Ordering::SeqCst);
            self.granted_on_request
        }
    }

    #[test]
    fn permission_is_requested_only_while_undecided() {
        let gate = FakeGate {
            state: PermissionState::Default,
            granted_on_request: PermissionState::Granted,
            requests: AtomicUsize::new(0),
        };
        assert_eq!(ensure_permission(&gate), PermissionState::Granted);
        assert_eq!(gate.requests.load(Ordering::SeqCst), 1);

        let denied = FakeGate {
            state: PermissionState::Denied,
            granted_on_request: PermissionState::Granted,
            requests: AtomicUsize::new(0),
        };
        assert_eq!(ensure_permission(&denied), PermissionState::Denied);
        assert_eq!(denied.requests.load(Ordering::SeqCst), 0);

        let granted = FakeGate {
            state: PermissionState::Granted,
            granted_on_request: PermissionState::Granted,
            requests: AtomicUsize::new(0),
        };
        assert_eq!(ensure_permission(&granted), PermissionState::Granted);
        assert_eq!(granted.requests.load(Ordering::SeqCst), 0);
    }
}
