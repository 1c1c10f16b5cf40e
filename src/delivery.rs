//! Tauri-backed delivery tiers: haptic pulse via a webview event, system
//! notification via the notification plugin, and a blocking message dialog
//! as the last-resort path when notification permission is absent.

use tauri::{AppHandle, Emitter};
use tauri_plugin_dialog::DialogExt;
use tauri_plugin_notification::NotificationExt;

use crate::events::{HapticPayload, EVENT_HAPTIC};
use crate::notifier::{
    Delivery, DeliveryError, DeliveryTier, PermissionGate, PermissionState, ReminderNotice,
    VIBRATION_PATTERN,
};

pub fn default_tiers(app: &AppHandle) -> Vec<Box<dyn DeliveryTier>> {
    vec![
        Box::new(HapticTier { app: app.clone() }),
        Box::new(SystemNotificationTier { app: app.clone() }),
        Box::new(AlertTier { app: app.clone() }),
    ]
}

fn permission_state(app: &AppHandle) -> PermissionState {
    match app.notification().permission_state() {
        Ok(tauri_plugin_notification::PermissionState::Granted) => PermissionState::Granted,
        Ok(tauri_plugin_notification::PermissionState::Denied) => PermissionState::Denied,
        Ok(_) => PermissionState::Default,
        Err(error) => {
            log::warn!("failed to query notification permission: {error}");
            PermissionState::Default
        }
    }
}

pub struct TauriPermissionGate {
    app: AppHandle,
}

impl TauriPermissionGate {
    pub fn new(app: AppHandle) -> Self {
        Self { app }
    }
}

impl PermissionGate for TauriPermissionGate {
    fn state(&self) -> PermissionState {
        permission_state(&self.app)
    }

    fn request(&self) -> PermissionState {
        match self.app.notification().request_permission() {
            Ok(tauri_plugin_notification::PermissionState::Granted) => PermissionState::Granted,
            Ok(tauri_plugin_notification::PermissionState::Denied) => PermissionState::Denied,
            Ok(_) => PermissionState::Default,
            Err(error) => {
                log::warn!("notification permission request failed: {error}");
                PermissionState::Default
            }
        }
    }
}

/// Forwards the vibration pattern to the webview, which runs the actual
/// haptic API where the hardware supports one. Supplemental: always lets the
/// walk continue to the next tier.
struct HapticTier {
    app: AppHandle,
}

impl DeliveryTier for HapticTier {
    fn name(&self) -> &'static str {
        "haptic"
    }

    fn deliver(&self, _notice: &ReminderNotice) -> Result<Delivery, DeliveryError> {
        self.app
            .emit(
                EVENT_HAPTIC,
                HapticPayload {
                    pattern: VIBRATION_PATTERN.to_vec(),
                },
            )
            .map_err(|error| DeliveryError::Failed(error.to_string()))?;
        Ok(Delivery::Passthrough)
    }
}

struct SystemNotificationTier {
    app: AppHandle,
}

impl DeliveryTier for SystemNotificationTier {
    fn name(&self) -> &'static str {
        "system-notification"
    }

    fn deliver(&self, notice: &ReminderNotice) -> Result<Delivery, DeliveryError> {
        if permission_state(&self.app) != PermissionState::Granted {
            return Ok(Delivery::Passthrough);
        }
        self.app
            .notification()
            .builder()
            .id(notice.collapse_id())
            .title(notice.title.as_str())
            .body(notice.body.as_str())
            .icon(notice.icon)
            .show()
            .map_err(|error| DeliveryError::Failed(error.to_string()))?;
        Ok(Delivery::Completed)
    }
}

/// Synchronous, blocking dialog: the guaranteed-visible path when the system
/// notification tier cannot run unattended. Skipped whenever permission is
/// granted, so a failed-but-permitted notification does not also alert.
struct AlertTier {
    app: AppHandle,
}

impl DeliveryTier for AlertTier {
    fn name(&self) -> &'static str {
        "alert"
    }

    fn deliver(&self, notice: &ReminderNotice) -> Result<Delivery, DeliveryError> {
        if permission_state(&self.app) == PermissionState::Granted {
            return Ok(Delivery::Passthrough);
        }
        self.app
            .dialog()
            .message(notice.body.as_str())
            .title(notice.title.as_str())
            .blocking_show();
        Ok(Delivery::Completed)
    }
}
