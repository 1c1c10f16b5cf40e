pub mod cache;
pub mod commands;
#[cfg(all(feature = "app", not(test)))]
mod delivery;
pub mod events;
pub mod logging;
pub mod models;
pub mod notifier;
pub mod scheduler;
pub mod storage;
pub mod store;
#[cfg(all(feature = "app", not(test)))]
mod windows;

#[cfg(all(feature = "app", not(test)))]
use std::sync::Arc;

#[cfg(all(feature = "app", not(test)))]
use tauri::Manager;

#[cfg(all(feature = "app", not(test)))]
use crate::cache::ShellCache;
#[cfg(all(feature = "app", not(test)))]
use crate::commands::*;
#[cfg(all(feature = "app", not(test)))]
use crate::delivery::{default_tiers, TauriPermissionGate};
#[cfg(all(feature = "app", not(test)))]
use crate::notifier::{ensure_permission, Notifier};
#[cfg(all(feature = "app", not(test)))]
use crate::scheduler::ReminderScheduler;
#[cfg(all(feature = "app", not(test)))]
use crate::storage::Storage;
#[cfg(all(feature = "app", not(test)))]
use crate::store::TaskStore;

#[cfg_attr(mobile, tauri::mobile_entry_point)]
#[cfg(all(feature = "app", not(test)))]
pub fn run() {
    tauri::Builder::default()
        .plugin(tauri_plugin_notification::init())
        .plugin(tauri_plugin_dialog::init())
        .setup(|app| {
            let data_dir = app.path().app_data_dir()?;
            if let Err(error) = logging::init_logging(&data_dir) {
                eprintln!("failed to initialize logging: {error}");
            }

            let storage = Storage::new(data_dir.clone());
            storage.ensure_dirs()?;
            let store = TaskStore::open(storage);
            app.manage(store.clone());

            // Ask for notification permission once, only while undecided;
            // a denial is respected and never re-prompted.
            ensure_permission(&TauriPermissionGate::new(app.handle().clone()));

            let notifier = Arc::new(Notifier::new(default_tiers(app.handle())));
            app.manage(notifier.clone());

            // Timers do not survive a restart: re-arm every task whose
            // reminder instant is still ahead of us.
            let scheduler = ReminderScheduler::new(store, notifier);
            scheduler.rearm_all();
            app.manage(scheduler);

            // Refresh the offline copy of the UI shell. Best-effort: a failed
            // install only costs offline availability.
            let shell_cache = ShellCache::new(data_dir.join("shell-cache"));
            match app.path().resource_dir() {
                Ok(resources) => {
                    if let Err(error) = shell_cache.install(&resources.join("ui")) {
                        log::warn!("shell cache install failed: {error}");
                    } else if let Err(error) = shell_cache.activate() {
                        log::warn!("shell cache activation failed: {error}");
                    }
                }
                Err(error) => log::warn!("resource dir unavailable: {error}"),
            }

            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            load_state,
            create_task,
            update_task,
            toggle_task,
            delete_task,
            test_notification,
            focus_window,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
