use chrono::Utc;

use crate::events::StatePayload;
#[cfg(all(feature = "app", not(test)))]
use crate::events::EVENT_STATE_UPDATED;
use crate::models::{Task, TaskDraft};
use crate::notifier::Notifier;
use crate::scheduler::ReminderScheduler;
use crate::store::TaskStore;

#[cfg(all(feature = "app", not(test)))]
use std::sync::Arc;
#[cfg(all(feature = "app", not(test)))]
use tauri::{AppHandle, Emitter, State};

#[derive(Debug, serde::Serialize)]
pub struct CommandResult<T> {
    pub ok: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

/// Side effects the command layer performs against the running app. Kept
/// behind a trait so the impl functions are testable with a recording
/// context.
pub trait CommandCtx {
    fn emit_state_updated(&self, payload: StatePayload);
}

fn ok<T>(data: T) -> CommandResult<T> {
    CommandResult {
        ok: true,
        data: Some(data),
        error: None,
    }
}

fn err<T>(message: &str) -> CommandResult<T> {
    CommandResult {
        ok: false,
        data: None,
        error: Some(message.to_string()),
    }
}

fn sync_ui(ctx: &impl CommandCtx, store: &TaskStore) {
    ctx.emit_state_updated(StatePayload {
        tasks: store.list(),
    });
}

fn load_state_impl(store: &TaskStore) -> CommandResult<Vec<Task>> {
    ok(store.list())
}

fn create_task_impl(
    ctx: &impl CommandCtx,
    store: &TaskStore,
    scheduler: &ReminderScheduler,
    draft: TaskDraft,
) -> CommandResult<Task> {
    let task = match store.add(&draft) {
        Ok(task) => task,
        Err(error) => return err(&error.to_string()),
    };
    scheduler.arm(&task);
    sync_ui(ctx, store);
    ok(task)
}

fn update_task_impl(
    ctx: &impl CommandCtx,
    store: &TaskStore,
    scheduler: &ReminderScheduler,
    task_id: String,
    draft: TaskDraft,
) -> CommandResult<Task> {
    let task = match store.update(&task_id, &draft) {
        Ok(task) => task,
        Err(error) => return err(&error.to_string()),
    };
    // The previously armed timer is obsolete; replace it outright so a stale
    // reminder instant can never double-fire.
    scheduler.disarm(&task_id);
    scheduler.arm(&task);
    sync_ui(ctx, store);
    ok(task)
}

fn toggle_task_impl(
    ctx: &impl CommandCtx,
    store: &TaskStore,
    task_id: String,
) -> CommandResult<Task> {
    let task = match store.toggle_completed(&task_id) {
        Ok(task) => task,
        Err(error) => return err(&error.to_string()),
    };
    // Timers are left untouched; the scheduler suppresses fires for
    // completed tasks at delivery time.
    sync_ui(ctx, store);
    ok(task)
}

fn delete_task_impl(
    ctx: &impl CommandCtx,
    store: &TaskStore,
    scheduler: &ReminderScheduler,
    task_id: String,
) -> CommandResult<bool> {
    if let Err(error) = store.delete(&task_id) {
        return err(&error.to_string());
    }
    scheduler.disarm(&task_id);
    sync_ui(ctx, store);
    ok(true)
}

fn test_notification_impl(notifier: &Notifier) -> CommandResult<bool> {
    let now = Utc::now();
    let sample = Task {
        id: "test".to_string(),
        name: "Test Notification".to_string(),
        time: now,
        reminder_minutes: 0,
        reminder_time: now,
        completed: false,
        created_at: now,
    };
    notifier.notify(&sample);
    ok(true)
}

#[cfg(all(feature = "app", not(test)))]
struct TauriCommandCtx<'a> {
    app: &'a AppHandle,
}

#[cfg(all(feature = "app", not(test)))]
impl CommandCtx for TauriCommandCtx<'_> {
    fn emit_state_updated(&self, payload: StatePayload) {
        let _ = self.app.emit(EVENT_STATE_UPDATED, payload);
    }
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn load_state(state: State<TaskStore>) -> CommandResult<Vec<Task>> {
    load_state_impl(state.inner())
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn create_task(
    app: AppHandle,
    state: State<TaskStore>,
    scheduler: State<ReminderScheduler>,
    draft: TaskDraft,
) -> CommandResult<Task> {
    let ctx = TauriCommandCtx { app: &app };
    create_task_impl(&ctx, state.inner(), scheduler.inner(), draft)
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn update_task(
    app: AppHandle,
    state: State<TaskStore>,
    scheduler: State<ReminderScheduler>,
    task_id: String,
    draft: TaskDraft,
) -> CommandResult<Task> {
    let ctx = TauriCommandCtx { app: &app };
    update_task_impl(&ctx, state.inner(), scheduler.inner(), task_id, draft)
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn toggle_task(
    app: AppHandle,
    state: State<TaskStore>,
    task_id: String,
) -> CommandResult<Task> {
    let ctx = TauriCommandCtx { app: &app };
    toggle_task_impl(&ctx, state.inner(), task_id)
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn delete_task(
    app: AppHandle,
    state: State<TaskStore>,
    scheduler: State<ReminderScheduler>,
    task_id: String,
) -> CommandResult<bool> {
    let ctx = TauriCommandCtx { app: &app };
    delete_task_impl(&ctx, state.inner(), scheduler.inner(), task_id)
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn test_notification(notifier: State<Arc<Notifier>>) -> CommandResult<bool> {
    test_notification_impl(notifier.inner())
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn focus_window(app: AppHandle) -> CommandResult<bool> {
    crate::windows::focus_main_window(&app);
    ok(true)
}
