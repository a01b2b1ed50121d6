//! Built-in journal event handlers.
//!
//! Each handler reads what it needs through the `RawEvent` accessors,
//! validates it, and only then touches a registry.

pub mod combat;
pub mod missions;
pub mod navigation;
pub mod prospecting;

use crate::events::{HandlerRegistry, handler_fn, with_tracing};

pub use missions::MissionTerminalHandler;

/// Registry with every built-in handler, each wrapped in tracing middleware.
pub fn default_registry() -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();

    // Missions
    registry.add(with_tracing(handler_fn("MissionAccepted", missions::on_mission_accepted)));
    registry.add(with_tracing(handler_fn("MissionProgress", missions::on_mission_progress)));
    registry.add(with_tracing(handler_fn("MissionRedirected", missions::on_mission_redirected)));
    registry.add(with_tracing(MissionTerminalHandler::completed()));
    registry.add(with_tracing(MissionTerminalHandler::failed()));
    registry.add(with_tracing(MissionTerminalHandler::abandoned()));
    registry.add(with_tracing(handler_fn("Missions", missions::on_missions_summary)));

    // Combat
    registry.add(with_tracing(handler_fn(
        "CombatMissionCompleted",
        combat::on_combat_mission_completed,
    )));
    registry.add(with_tracing(handler_fn("Bounty", combat::on_kill)));
    registry.add(with_tracing(handler_fn("FactionKillBond", combat::on_kill)));

    // Navigation
    registry.add(with_tracing(handler_fn("NavRoute", navigation::on_nav_route)));
    registry.add(with_tracing(handler_fn("NavRouteClear", navigation::on_nav_route_clear)));
    for kind in ["FSDJump", "CarrierJump", "Location"] {
        registry.add(with_tracing(handler_fn(kind, navigation::on_arrival)));
    }

    // Mining
    registry.add(with_tracing(handler_fn(
        "ProspectedAsteroid",
        prospecting::on_prospected_asteroid,
    )));

    registry
}
