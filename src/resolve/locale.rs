//! Language preference parsing and name selection.

use crate::models::{IndexedObject, DEFAULT_NAME_KEY};

/// Parse an `Accept-Language` style string into an ordered list of language codes.
///
/// Accepts both `"de,en;q=0.8"` and plain `"de, en"` lists. Codes with `q=0`
/// are dropped, the rest are ordered by weight (stable for equal weights).
/// A regional code such as `en-GB` is followed by its base language `en`
/// unless the base appears explicitly.
pub fn parse_accept_language(header: &str) -> Vec<String> {
    let mut weighted: Vec<(String, f32)> = header
        .split(',')
        .filter_map(|part| {
            let mut pieces = part.split(';');
            let code = pieces.next()?.trim().to_ascii_lowercase().replace('_', "-");
            if code.is_empty() || code == "*" {
                return None;
            }
            let q = pieces
                .filter_map(|p| p.trim().strip_prefix("q="))
                .find_map(|v| v.trim().parse::<f32>().ok())
                .unwrap_or(1.0);
            (q > 0.0).then_some((code, q))
        })
        .collect();

    weighted.sort_by(|a, b| b.1.total_cmp(&a.1));

    let mut languages: Vec<String> = Vec::with_capacity(weighted.len() * 2);
    for (code, _) in &weighted {
        if !languages.contains(code) {
            languages.push(code.clone());
        }
    }

    // Base languages go after every explicit code
    let bases: Vec<String> = weighted
        .iter()
        .filter_map(|(code, _)| code.split_once('-').map(|(base, _)| base.to_string()))
        .collect();
    for base in bases {
        if !languages.contains(&base) {
            languages.push(base);
        }
    }

    languages
}

/// Pick the display name of `object` for the given language preferences.
///
/// Tries each preferred language, then the untranslated name, then a name
/// composed from the address tags (`135 Pilkington Avenue`, the house name,
/// or failing those the postcode or another address part). Returns `None`
/// only when the object has neither names nor non-empty address tags.
pub fn resolve_name(object: &IndexedObject, languages: &[String]) -> Option<String> {
    languages
        .iter()
        .find_map(|lang| non_empty(object.names.get(lang.as_str())))
        .or_else(|| non_empty(object.names.get(DEFAULT_NAME_KEY)))
        .or_else(|| {
            // Any remaining translation beats an address-only name
            object.names.values().find(|n| !n.trim().is_empty()).cloned()
        })
        .or_else(|| address_name(object))
}

fn non_empty(name: Option<&String>) -> Option<String> {
    name.filter(|n| !n.trim().is_empty()).cloned()
}

fn address_tag<'a>(object: &'a IndexedObject, key: &str) -> Option<&'a str> {
    object
        .address
        .get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}

/// Address keys tried in order when neither a house number nor a street is present.
const FALLBACK_ADDRESS_KEYS: &[&str] = &[
    "housename",
    "postcode",
    "suburb",
    "city",
    "county",
    "state",
    "country",
];

fn address_name(object: &IndexedObject) -> Option<String> {
    let street = address_tag(object, "street").or_else(|| address_tag(object, "place"));

    match (address_tag(object, "housenumber"), street) {
        (Some(number), Some(street)) => Some(format!("{} {}", number, street)),
        (Some(number), None) => Some(number.to_string()),
        (None, Some(street)) => Some(
            address_tag(object, "housename")
                .unwrap_or(street)
                .to_string(),
        ),
        (None, None) => FALLBACK_ADDRESS_KEYS
            .iter()
            .find_map(|key| address_tag(object, key))
            .or_else(|| {
                object
                    .address
                    .values()
                    .map(|v| v.trim())
                    .find(|v| !v.is_empty())
            })
            .map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{self, COUNTRY, HOUSE, PUB};

    fn langs(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_header_orders_by_weight() {
        assert_eq!(
            parse_accept_language("fr;q=0.5, de-CH, en;q=0.8"),
            langs(&["de-ch", "en", "fr", "de"])
        );
    }

    #[test]
    fn test_parse_plain_list_and_zero_weight() {
        assert_eq!(parse_accept_language("de, en"), langs(&["de", "en"]));
        assert_eq!(parse_accept_language("de;q=0, en"), langs(&["en"]));
        assert!(parse_accept_language("").is_empty());
        assert!(parse_accept_language(" , *").is_empty());
    }

    #[test]
    fn test_parse_keeps_explicit_base_position() {
        assert_eq!(
            parse_accept_language("en-GB,en;q=0.9,de;q=0.5"),
            langs(&["en-gb", "en", "de"])
        );
    }

    #[test]
    fn test_preferred_language_wins() {
        let store = fixtures::birmingham_store();
        let country = store.get(COUNTRY).unwrap();

        assert_eq!(
            resolve_name(country, &langs(&["fr", "de"])).as_deref(),
            Some("Royaume-Uni")
        );
        assert_eq!(
            resolve_name(country, &parse_accept_language("de-AT,en;q=0.5")).as_deref(),
            Some("Vereinigtes Königreich")
        );
    }

    #[test]
    fn test_falls_back_to_default_name() {
        let store = fixtures::birmingham_store();
        let country = store.get(COUNTRY).unwrap();
        let plough = store.get(PUB).unwrap();

        assert_eq!(
            resolve_name(country, &langs(&["ja", "ko"])).as_deref(),
            Some("United Kingdom")
        );
        assert_eq!(resolve_name(plough, &[]).as_deref(), Some("The Plough"));
    }

    #[test]
    fn test_falls_back_to_address_tags() {
        let store = fixtures::birmingham_store();
        let house = store.get(HOUSE).unwrap();

        assert_eq!(
            resolve_name(house, &langs(&["en"])).as_deref(),
            Some("135 Pilkington Avenue")
        );
    }

    #[test]
    fn test_partial_address_still_named() {
        use crate::models::{OsmType, PlaceGeometry, PlaceId};
        use geo::Point;

        let mut post_box = IndexedObject::new(
            PlaceId(0),
            OsmType::Node,
            1,
            "amenity",
            "post_box",
            PlaceGeometry::Point(Point::new(-1.816, 52.548)),
        )
        .unwrap()
        .with_ranks(30, 30);
        post_box
            .address
            .insert("city".to_string(), "Birmingham".to_string());
        post_box
            .address
            .insert("postcode".to_string(), "B72 1LH".to_string());
        assert_eq!(resolve_name(&post_box, &[]).as_deref(), Some("B72 1LH"));

        post_box.address.remove("postcode");
        assert_eq!(resolve_name(&post_box, &[]).as_deref(), Some("Birmingham"));

        post_box.address.clear();
        post_box
            .address
            .insert("unit".to_string(), "3".to_string());
        assert_eq!(resolve_name(&post_box, &[]).as_deref(), Some("3"));
    }

    #[test]
    fn test_nothing_to_show() {
        let store = fixtures::birmingham_store();
        let footpath = store.get(fixtures::FOOTPATH).unwrap();
        assert_eq!(resolve_name(footpath, &langs(&["en"])), None);
    }
}
