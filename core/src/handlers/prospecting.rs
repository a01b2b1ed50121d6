use serde_json::Value;

use crate::events::HandlerError;
use crate::journal::RawEvent;
use crate::state::{MaterialShare, ProspectRecord, Registries};

pub fn on_prospected_asteroid(event: &RawEvent, registries: &Registries) -> Result<(), HandlerError> {
    let materials = match event.field(&["Materials"]) {
        None => Vec::new(),
        Some(value) => value
            .as_array()
            .ok_or_else(|| event.invalid_field(&["Materials"], "expected an array"))?
            .iter()
            .map(|m| {
                parse_material(m).ok_or_else(|| {
                    event.invalid_field(&["Materials"], "entry needs Name and Proportion")
                })
            })
            .collect::<Result<Vec<_>, _>>()?,
    };
    let remaining = event.optional_f64(&["Remaining"])?.unwrap_or(100.0);

    registries.prospecting.append(ProspectRecord {
        timestamp: event.timestamp,
        materials,
        content: event
            .str_field(&["Content_Localised", "Content"])
            .map(str::to_string),
        motherlode: event
            .str_field(&["MotherlodeMaterial_Localised", "MotherlodeMaterial"])
            .map(str::to_string),
        remaining,
    });
    Ok(())
}

fn parse_material(value: &Value) -> Option<MaterialShare> {
    let name = value
        .get("Name_Localised")
        .or_else(|| value.get("Name"))
        .and_then(Value::as_str)?;
    let proportion = value.get("Proportion").and_then(Value::as_f64)?;
    Some(MaterialShare {
        name: name.to_string(),
        proportion,
    })
}
