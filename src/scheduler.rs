use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;

use crate::models::Task;
use crate::notifier::Notifier;
use crate::store::TaskStore;

#[cfg(all(feature = "app", not(test)))]
type TimerHandle = tauri::async_runtime::JoinHandle<()>;
#[cfg(not(all(feature = "app", not(test))))]
type TimerHandle = tokio::task::JoinHandle<()>;

#[cfg(all(feature = "app", not(test)))]
fn spawn_timer<F>(future: F) -> TimerHandle
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    tauri::async_runtime::spawn(future)
}

#[cfg(not(all(feature = "app", not(test))))]
fn spawn_timer<F>(future: F) -> TimerHandle
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    tokio::spawn(future)
}

struct ArmedTimer {
    token: u64,
    handle: TimerHandle,
}

/// Maps each eligible task to one pending one-shot timer. Timers are
/// transient and in-process: nothing survives a restart, and reminders whose
/// instant elapsed while the app was closed are skipped, not backfilled.
#[derive(Clone)]
pub struct ReminderScheduler {
    inner: Arc<SchedulerInner>,
}

struct SchedulerInner {
    store: TaskStore,
    notifier: Arc<Notifier>,
    timers: Mutex<HashMap<String, ArmedTimer>>,
    next_token: AtomicU64,
}

impl ReminderScheduler {
    pub fn new(store: TaskStore, notifier: Arc<Notifier>) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                store,
                notifier,
                timers: Mutex::new(HashMap::new()),
                next_token: AtomicU64::new(0),
            }),
        }
    }

    /// Arms a one-shot timer at the task's reminder instant. Completed tasks
    /// and elapsed reminder instants are never scheduled. Arming again for
    /// the same id replaces the pending timer; the old one will not fire.
    pub fn arm(&self, task: &Task) {
        if task.completed {
            return;
        }
        let delay = match (task.reminder_time - Utc::now()).to_std() {
            Ok(delay) if !delay.is_zero() => delay,
            _ => return,
        };

        let token = self.inner.next_token.fetch_add(1, Ordering::Relaxed);
        let id = task.id.clone();
        let inner = Arc::clone(&self.inner);
        let timer_id = id.clone();
        let handle = spawn_timer(async move {
            tokio::time::sleep(delay).await;
            inner.fire(&timer_id, token);
        });

        log::debug!("armed reminder for task {id} in {delay:?}");
        let mut timers = self.inner.timers.lock().expect("scheduler poisoned");
        if let Some(old) = timers.insert(id, ArmedTimer { token, handle }) {
            old.handle.abort();
        }
    }

    /// Cancels the pending timer for `id`, if any.
    pub fn disarm(&self, id: &str) {
        let mut timers = self.inner.timers.lock().expect("scheduler poisoned");
        if let Some(armed) = timers.remove(id) {
            armed.handle.abort();
            log::debug!("disarmed reminder for task {id}");
        }
    }

    /// Arms every stored task that still qualifies. Used once at startup,
    /// since in-memory timers do not survive a restart.
    pub fn rearm_all(&self) {
        let tasks = self.inner.store.list();
        for task in &tasks {
            self.arm(task);
        }
        log::info!(
            "rearmed reminders: {} pending of {} tasks",
            self.pending(),
            tasks.len()
        );
    }

    /// Number of live timers.
    pub fn pending(&self) -> usize {
        self.inner.timers.lock().expect("scheduler poisoned").len()
    }
}

impl SchedulerInner {
    fn fire(&self, id: &str, token: u64) {
        {
            let mut timers = self.timers.lock().expect("scheduler poisoned");
            match timers.get(id) {
                // Only the timer the table still points at may fire; anything
                // else was superseded while sleeping.
                Some(armed) if armed.token == token => {
                    timers.remove(id);
                }
                _ => return,
            }
        }
        match self.store.get(id) {
            Some(task) if !task.completed => self.notifier.notify(&task),
            Some(_) => log::debug!("reminder for completed task {id} suppressed"),
            None => log::debug!("reminder for deleted task {id} suppressed"),
        }
    }
}
