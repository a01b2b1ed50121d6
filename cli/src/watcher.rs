use std::sync::Arc;

use vigil_core::context::AppConfig;
use vigil_core::spawn_poller;
use vigil_core::state::{MissionChange, ProspectingChange, Registries, RouteChange};
use vigil_types::formatting::{format_credits, format_distance};

/// Open the configured directory, log every registry change, and poll until Ctrl-C.
pub async fn run(config: &AppConfig) -> Result<(), String> {
    let session = crate::open_session(config)?;
    subscribe_all(&session.registries());

    println!("Watching directory: {}", config.journal_directory.display());
    let handle = spawn_poller(Arc::clone(&session), config.poll_interval());

    tokio::signal::ctrl_c().await.map_err(|e| e.to_string())?;
    handle.abort();
    let _ = handle.await;

    let diagnostics = session.diagnostics().len();
    if diagnostics > 0 {
        println!("{diagnostics} lines or events were skipped; see the log for details");
    }
    Ok(())
}

fn subscribe_all(registries: &Arc<Registries>) {
    let reader = Arc::clone(registries);
    registries.missions.subscribe(move |change| match change {
        MissionChange::Accepted(id) => {
            if let Some(m) = reader.missions.get(id) {
                println!(
                    "Mission accepted: {} ({}) for {}",
                    m.kind,
                    id,
                    format_credits(m.reward)
                );
            }
        }
        MissionChange::Progressed { id, progress } => {
            println!("Mission {id} progress: {progress}");
        }
        MissionChange::Redirected { id } => println!("Mission {id} redirected"),
        MissionChange::Finished { id, status } => println!("Mission {id} {status:?}"),
        MissionChange::Reconciled { transitioned } => {
            println!("{transitioned} missions updated from login summary")
        }
    });

    let reader = Arc::clone(registries);
    registries.combat.subscribe(move |change| {
        let vigil_core::state::CombatChange::Recorded(key) = change;
        if let Some(agg) = reader.combat.get(key) {
            println!(
                "Combat {} → {} [{}]: {} missions, {} kills, {}",
                key.origin,
                key.destination,
                key.category,
                agg.completed_missions,
                agg.total_kills,
                format_credits(agg.total_reward)
            );
        }
    });

    registries.kills.subscribe(|change| {
        let vigil_core::state::KillChange::Recorded {
            target_type,
            target_faction,
            source_faction,
            count,
        } = change;
        println!("Kill: {target_type} {target_faction} for {source_faction} (total {count})");
    });

    let reader = Arc::clone(registries);
    registries.navigation.subscribe(move |change| match change {
        RouteChange::Replaced { len } => {
            let route = reader.navigation.route();
            println!(
                "Route plotted: {len} jumps, {}",
                format_distance(route.total_distance())
            );
        }
        RouteChange::Cleared => println!("Route cleared"),
        RouteChange::Arrived { system } => println!("Arrived in {system}"),
    });

    registries.prospecting.subscribe(|change| match change {
        ProspectingChange::Appended { total } => println!("Asteroid prospected ({total} this session)"),
        ProspectingChange::Cleared => println!("Prospecting log cleared"),
    });
}
