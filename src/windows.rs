use tauri::{AppHandle, Manager};

/// Brings the main window to the foreground; used when the user clicks a
/// reminder notification.
pub fn focus_main_window(app: &AppHandle) {
    if let Some(window) = app.get_webview_window("main") {
        let _ = window.show();
        let _ = window.set_focus();
    }
}
