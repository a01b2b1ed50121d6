use serde_json::Value;

use crate::events::{EventHandler, HandlerError};
use crate::journal::RawEvent;
use crate::journal::event::value_as_id;
use crate::state::{MissionStatus, NewMission, ProgressUpdate, Registries};

const ID: &[&str] = &["MissionID", "id"];

pub fn on_mission_accepted(event: &RawEvent, registries: &Registries) -> Result<(), HandlerError> {
    let id = event.require_id(ID)?;
    let target_count = event.optional_u64(&["KillCount", "Count", "target"])?.unwrap_or(0);
    let target_count =
        u32::try_from(target_count).map_err(|_| event.invalid_field(&["KillCount"], "target count out of range"))?;
    let reward = event.optional_u64(&["Reward", "reward"])?.unwrap_or(0);

    let origin = event
        .str_field(&["Origin", "origin"])
        .map(str::to_string)
        .or_else(|| registries.navigation.current_system());

    registries.missions.accept(NewMission {
        id,
        kind: event.str_field(&["Name", "kind"]).unwrap_or_default().to_string(),
        origin,
        destination: event
            .str_field(&["DestinationSystem", "destination"])
            .map(str::to_string),
        faction: event.str_field(&["Faction", "faction"]).map(str::to_string),
        target_count,
        reward,
        accepted_at: event.timestamp,
        expires_at: event.datetime_field(&["Expiry", "expiry"]),
    });
    Ok(())
}

/// An absolute `Progress` wins; without one, each event counts as one step.
pub fn on_mission_progress(event: &RawEvent, registries: &Registries) -> Result<(), HandlerError> {
    let id = event.require_id(ID)?;
    let update = match event.optional_u64(&["Progress", "progress"])? {
        Some(value) => ProgressUpdate::Set(u32::try_from(value).unwrap_or(u32::MAX)),
        None => ProgressUpdate::Increment(1),
    };
    registries.missions.record_progress(&id, update);
    Ok(())
}

pub fn on_mission_redirected(event: &RawEvent, registries: &Registries) -> Result<(), HandlerError> {
    let id = event.require_id(ID)?;
    let destination = event.require_str(&["NewDestinationSystem", "destination"])?;
    registries.missions.redirect(&id, destination);
    Ok(())
}

/// Login summary listing missions that ended while the game was closed.
pub fn on_missions_summary(event: &RawEvent, registries: &Registries) -> Result<(), HandlerError> {
    let failed = listed_ids(event, "Failed")?;
    let completed = listed_ids(event, "Complete")?;
    registries.missions.reconcile(&failed, &completed, event.timestamp);
    Ok(())
}

fn listed_ids(event: &RawEvent, key: &str) -> Result<Vec<String>, HandlerError> {
    let Some(entries) = event.field(&[key]) else {
        return Ok(Vec::new());
    };
    let entries = entries
        .as_array()
        .ok_or_else(|| event.invalid_field(&[key], "expected an array"))?;
    entries
        .iter()
        .map(|entry| {
            entry
                .get("MissionID")
                .and_then(value_as_id)
                .or_else(|| match entry {
                    Value::String(_) | Value::Number(_) => value_as_id(entry),
                    _ => None,
                })
                .ok_or_else(|| event.invalid_field(&[key], "entry without MissionID"))
        })
        .collect()
}

/// Shared handler for the three terminal mission events.
pub struct MissionTerminalHandler {
    kind: &'static str,
    status: MissionStatus,
}

impl MissionTerminalHandler {
    pub fn completed() -> Self {
        Self {
            kind: "MissionCompleted",
            status: MissionStatus::Completed,
        }
    }

    pub fn failed() -> Self {
        Self {
            kind: "MissionFailed",
            status: MissionStatus::Failed,
        }
    }

    pub fn abandoned() -> Self {
        Self {
            kind: "MissionAbandoned",
            status: MissionStatus::Abandoned,
        }
    }
}

impl EventHandler for MissionTerminalHandler {
    fn kind(&self) -> &str {
        self.kind
    }

    fn handle(&self, event: &RawEvent, registries: &Registries) -> Result<(), HandlerError> {
        let id = event.require_id(ID)?;
        registries.missions.finish(&id, self.status, event.timestamp);
        Ok(())
    }
}
