use chrono::Utc;
use vigil_core::state::{MissionStatus, sort_missions};
use vigil_core::{JournalSession, TickReport};
use vigil_types::MissionSort;
use vigil_types::formatting::{
    format_credits, format_distance, format_pct_ratio, format_progress, format_remaining,
};

pub fn print_summary(session: &JournalSession, tick: &TickReport, sort: MissionSort) {
    let snapshot = session.registries().snapshot();
    let now = Utc::now();

    match session.tracker().current_file() {
        Some(file) => println!("Journal: {} ({} lines read)", file.file_name(), tick.lines_read),
        None => println!("No journal files in {}", session.directory().display()),
    }
    if let Some(system) = &snapshot.current_system {
        println!("Current system: {system}");
    }

    // --- Missions ---
    let mut missions = snapshot.missions;
    sort_missions(&mut missions, sort);
    println!("\nMissions ({}):", missions.len());
    for m in &missions {
        let remaining = match (m.status, m.expires_at) {
            (MissionStatus::Active, Some(expiry)) => format_remaining((expiry - now).num_seconds()),
            _ => "-".to_string(),
        };
        println!(
            "  {:<10} {:<28} {:>10} {:>7} {:>10} {:?} ({remaining})",
            m.id,
            m.kind,
            format_progress(m.progress, m.target_count),
            format_pct_ratio(m.progress, m.target_count),
            format_credits(m.reward),
            m.status,
        );
    }

    // --- Combat ---
    println!("\nCombat missions:");
    for (key, agg) in &snapshot.combat {
        println!(
            "  {} → {} [{}]: {} missions, {} kills, {}",
            key.origin,
            key.destination,
            key.category,
            agg.completed_missions,
            agg.total_kills,
            format_credits(agg.total_reward)
        );
    }

    // --- Kills ---
    println!("\nKills:");
    for row in &snapshot.kills {
        println!(
            "  {:<12} {:<30} {:<30} {}",
            row.target_type.label(),
            row.target_faction,
            row.source_faction,
            row.count
        );
    }

    // --- Route ---
    if snapshot.route.is_empty() {
        println!("\nNo route plotted");
    } else {
        println!(
            "\nRoute: {} jumps, {}",
            snapshot.route.len(),
            format_distance(snapshot.route.total_distance())
        );
        for system in &snapshot.route.systems {
            println!(
                "  {:<30} {:<4} {}",
                system.name,
                system.star_class,
                format_distance(system.distance_from_previous)
            );
        }
    }

    println!("\nAsteroids prospected: {}", snapshot.prospects.len());

    let skipped = tick.decode_failures + tick.handler_failures;
    if skipped > 0 {
        println!("\n{skipped} lines skipped (decode or handler failures)");
    }
}
