use crate::models::Task;

pub const EVENT_STATE_UPDATED: &str = "state_updated";
pub const EVENT_HAPTIC: &str = "haptic_pulse";

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatePayload {
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HapticPayload {
    pub pattern: Vec<u32>,
}
