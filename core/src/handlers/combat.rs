use crate::events::HandlerError;
use crate::journal::RawEvent;
use crate::state::{CombatKey, Registries};

const UNKNOWN_FACTION: &str = "Unknown";

pub fn on_combat_mission_completed(
    event: &RawEvent,
    registries: &Registries,
) -> Result<(), HandlerError> {
    let key = CombatKey::new(
        event.require_str(&["origin", "Origin"])?,
        event.require_str(&["destination", "Destination"])?,
        event.require_str(&["category", "Category"])?,
    );
    let kills = event.optional_u64(&["kills", "Kills", "KillCount"])?.unwrap_or(0);
    let reward = event.optional_u64(&["reward", "Reward"])?.unwrap_or(0);
    registries
        .combat
        .record_completion(key, kills, reward, event.timestamp);
    Ok(())
}

/// `Bounty` and `FactionKillBond` both describe one destroyed ship.
pub fn on_kill(event: &RawEvent, registries: &Registries) -> Result<(), HandlerError> {
    let tag = event.str_field(&["VictimFaction"]).unwrap_or_default();
    let target_faction = event
        .str_field(&["VictimFaction_Localised", "VictimFaction"])
        .filter(|s| !s.is_empty())
        .unwrap_or(UNKNOWN_FACTION);
    let source_faction = source_faction(event).unwrap_or(UNKNOWN_FACTION);

    registries
        .kills
        .record_tagged_kill(tag, target_faction, source_faction);
    Ok(())
}

/// Who paid for the kill. Bounties list rewards per faction; bonds name one
/// awarding faction.
fn source_faction(event: &RawEvent) -> Option<&str> {
    event
        .array_field(&["Rewards"])
        .and_then(|rewards| rewards.first())
        .and_then(|reward| reward.get("Faction"))
        .and_then(|faction| faction.as_str())
        .or_else(|| event.str_field(&["AwardingFaction_Localised", "AwardingFaction"]))
        .filter(|s| !s.is_empty())
}
