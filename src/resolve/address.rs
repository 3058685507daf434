//! Address breakdown and display name assembly from a truncated chain.

use std::sync::Arc;

use super::hierarchy::ChainEntry;
use super::locale::resolve_name;
use crate::index::PlaceStore;
use crate::models::rank::{address_kind, RANK_BUILDING, RANK_COUNTRY};
use crate::models::{AddressLine, IndexedObject};

/// Rank given to postcode lines, between country and state.
const RANK_POSTCODE: u8 = 5;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssembledAddress {
    pub lines: Vec<AddressLine>,
    pub display_name: String,
}

/// Build the address lines for `entries` (most specific first).
///
/// The first entry is the object being described. A building-level object
/// contributes its house number and postcode tags, the country its code.
/// Levels without any name are left out.
pub fn assemble(
    store: &PlaceStore,
    entries: &[ChainEntry],
    languages: &[String],
) -> AssembledAddress {
    let objects: Vec<&IndexedObject> = entries
        .iter()
        .filter_map(|e| store.get(e.id))
        .map(Arc::as_ref)
        .collect();

    let Some(first) = objects.first().copied() else {
        return AssembledAddress::default();
    };

    let mut lines: Vec<AddressLine> = Vec::with_capacity(objects.len() + 3);
    let building = first.rank_address == RANK_BUILDING;

    for (pos, object) in objects.iter().enumerate() {
        if object.rank_address == RANK_COUNTRY {
            if let Some(postcode) = building.then(|| first.address.get("postcode")).flatten() {
                lines.push(tag_line("postcode", postcode, RANK_POSTCODE));
            }
        }

        // Objects known only by their address tags are covered by the house number line
        if !object.names.is_empty() {
            if let Some(name) = resolve_name(object, languages) {
                lines.push(object_line(object, name, pos == 0));
            }
        }

        // After the object's own name so the number stays next to its road
        if pos == 0 && building {
            if let Some(number) = first.housenumber() {
                lines.push(tag_line("house_number", number, first.rank_address));
            }
        }

        if let Some(code) = object
            .country_code
            .as_deref()
            .filter(|_| object.rank_address == RANK_COUNTRY)
        {
            lines.push(tag_line("country_code", code, RANK_COUNTRY));
        }
    }

    // Postcode without a country in range still belongs to the address
    if building && !lines.iter().any(|l| l.kind == "postcode") {
        if let Some(postcode) = first.address.get("postcode") {
            lines.push(tag_line("postcode", postcode, RANK_POSTCODE));
        }
    }

    let display_name = display_name(&lines);
    AssembledAddress {
        lines,
        display_name,
    }
}

fn object_line(object: &IndexedObject, name: String, is_matched: bool) -> AddressLine {
    AddressLine {
        place_id: Some(object.id),
        osm_type: Some(object.osm_type),
        osm_id: Some(object.osm_id),
        category: object.category.clone(),
        place_type: object.place_type.clone(),
        kind: address_kind(&object.category, &object.place_type, object.rank_address)
            .to_string(),
        name,
        rank_address: object.rank_address,
        is_matched,
    }
}

fn tag_line(kind: &str, value: &str, rank_address: u8) -> AddressLine {
    AddressLine {
        place_id: None,
        osm_type: None,
        osm_id: None,
        category: "place".to_string(),
        place_type: kind.to_string(),
        kind: kind.to_string(),
        name: value.to_string(),
        rank_address,
        is_matched: kind == "house_number",
    }
}

/// Comma-joined names, house number attached to the following road.
fn display_name(lines: &[AddressLine]) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(lines.len());
    let mut pending_number: Option<&str> = None;

    for line in lines {
        let name = line.name.trim();
        if name.is_empty() || line.kind == "country_code" {
            continue;
        }
        if line.kind == "house_number" {
            pending_number = Some(name);
            continue;
        }

        let part = match pending_number.take() {
            Some(number) if line.kind == "road" => format!("{} {}", number, name),
            Some(number) => {
                parts.push(number.to_string());
                name.to_string()
            }
            None => name.to_string(),
        };
        if parts.last() != Some(&part) {
            parts.push(part);
        }
    }
    if let Some(number) = pending_number {
        parts.push(number.to_string());
    }

    parts.join(", ")
}
