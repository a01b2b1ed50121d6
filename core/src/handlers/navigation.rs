use serde_json::Value;

use crate::events::HandlerError;
use crate::journal::RawEvent;
use crate::state::{Registries, RouteEntry, RouteSystem};

/// Replace the plotted route. Every entry is validated before the registry is
/// touched, so a bad hop leaves the previous route in place.
pub fn on_nav_route(event: &RawEvent, registries: &Registries) -> Result<(), HandlerError> {
    // The journal line itself usually omits the route; it lives in NavRoute.json.
    let Some(route) = event.field(&["Route"]) else {
        tracing::debug!("[NAV] NavRoute without inline route, ignoring");
        return Ok(());
    };
    let route = route
        .as_array()
        .ok_or_else(|| event.invalid_field(&["Route"], "expected an array"))?;

    let entries = route
        .iter()
        .enumerate()
        .map(|(index, hop)| {
            parse_route_entry(hop)
                .map_err(|reason| event.invalid_field(&["Route"], &format!("hop {index}: {reason}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    registries.navigation.replace_route(RouteSystem::chain(entries));
    Ok(())
}

fn parse_route_entry(hop: &Value) -> Result<RouteEntry, &'static str> {
    let name = hop
        .get("StarSystem")
        .and_then(Value::as_str)
        .ok_or("missing StarSystem")?;
    let address = hop
        .get("SystemAddress")
        .and_then(Value::as_u64)
        .ok_or("missing SystemAddress")?;
    let star_class = hop
        .get("StarClass")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let position = hop
        .get("StarPos")
        .and_then(Value::as_array)
        .ok_or("missing StarPos")?;
    let [x, y, z] = position.as_slice() else {
        return Err("StarPos must have three coordinates");
    };
    let coord = |v: &Value| v.as_f64().ok_or("StarPos coordinate is not a number");

    Ok(RouteEntry {
        name: name.to_string(),
        address,
        star_class: star_class.to_string(),
        position: [coord(x)?, coord(y)?, coord(z)?],
    })
}

pub fn on_nav_route_clear(_event: &RawEvent, registries: &Registries) -> Result<(), HandlerError> {
    registries.navigation.clear_route();
    Ok(())
}

/// `FSDJump`, `CarrierJump` and `Location` all say where the ship is now.
pub fn on_arrival(event: &RawEvent, registries: &Registries) -> Result<(), HandlerError> {
    let system = event.require_str(&["StarSystem"])?;
    registries.navigation.record_arrival(system);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn route_event(route: Value) -> RawEvent {
        RawEvent::new("NavRoute").with_field("Route", route)
    }

    #[test]
    fn test_route_is_built_with_distances() {
        let registries = Registries::default();
        let event = route_event(json!([
            { "StarSystem": "Sol", "SystemAddress": 10477373803u64, "StarClass": "G", "StarPos": [0.0, 0.0, 0.0] },
            { "StarSystem": "Barnard's Star", "SystemAddress": 2, "StarClass": "M", "StarPos": [-3.0, 4.0, 0.0] },
        ]));
        on_nav_route(&event, &registries).unwrap();

        let route = registries.navigation.route();
        assert_eq!(route.len(), 2);
        assert_eq!(route.systems[0].distance_from_previous, 0.0);
        assert_eq!(route.systems[1].distance_from_previous, 5.0);
        assert_eq!(route.systems[1].star_class, "M");
    }

    #[test]
    fn test_bad_hop_keeps_previous_route() {
        let registries = Registries::default();
        on_nav_route(
            &route_event(json!([{ "StarSystem": "A", "SystemAddress": 1, "StarPos": [0, 0, 0] }])),
            &registries,
        )
        .unwrap();

        let result = on_nav_route(
            &route_event(json!([
                { "StarSystem": "B", "SystemAddress": 2, "StarPos": [0, 0, 0] },
                { "StarSystem": "C", "SystemAddress": 3, "StarPos": [1, 2] },
            ])),
            &registries,
        );
        assert!(matches!(result, Err(HandlerError::InvalidField { .. })));
        assert_eq!(registries.navigation.route().systems[0].name, "A");
    }

    #[test]
    fn test_missing_route_is_ignored() {
        let registries = Registries::default();
        assert!(on_nav_route(&RawEvent::new("NavRoute"), &registries).is_ok());
        assert!(registries.navigation.route().is_empty());
    }

    #[test]
    fn test_clear_empties_route() {
        let registries = Registries::default();
        on_nav_route(
            &route_event(json!([{ "StarSystem": "A", "SystemAddress": 1, "StarPos": [0, 0, 0] }])),
            &registries,
        )
        .unwrap();
        on_nav_route_clear(&RawEvent::new("NavRouteClear"), &registries).unwrap();
        assert!(registries.navigation.route().is_empty());
    }

    #[test]
    fn test_arrival_sets_current_system() {
        let registries = Registries::default();
        on_arrival(
            &RawEvent::new("FSDJump").with_field("StarSystem", "Shinrarta Dezhra"),
            &registries,
        )
        .unwrap();
        assert_eq!(
            registries.navigation.current_system().as_deref(),
            Some("Shinrarta Dezhra")
        );
        assert!(on_arrival(&RawEvent::new("Location"), &registries).is_err());
    }
}
