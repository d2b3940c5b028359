//! Query-string parsing and building.
//!
//! Form-urlencoded conventions: `+` decodes to a space, pairs are joined
//! with `&`, and encoding escapes everything outside the unreserved set.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::harness::ParamList;

/// Characters escaped when building a query string.
const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Parse a query string into an ordered parameter mapping.
///
/// Empty segments are skipped; a segment without `=` maps to an empty
/// value. Undecodable byte sequences fall back to lossy UTF-8.
pub fn parse_query(query: &str) -> ParamList {
    query
        .split('&')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let (key, value) = match segment.split_once('=') {
                Some((key, value)) => (key, value),
                None => (segment, ""),
            };
            (decode_component(key), decode_component(value))
        })
        .collect()
}

/// Build a query string from an ordered parameter mapping.
pub fn build_query(params: &ParamList) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{}={}", encode_component(key), encode_component(value)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Merge `overlay` over `base`: keys already in `base` keep their
/// position but take the overlay value; new overlay keys are appended
/// in overlay order.
pub fn merge_params(base: &ParamList, overlay: &ParamList) -> ParamList {
    let mut merged: ParamList = base
        .iter()
        .map(|(key, value)| {
            let value = overlay
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
                .unwrap_or_else(|| value.clone());
            (key.clone(), value)
        })
        .collect();

    for (key, value) in overlay {
        if !base.iter().any(|(k, _)| k == key) {
            merged.push((key.clone(), value.clone()));
        }
    }

    merged
}

fn decode_component(component: &str) -> String {
    let plus_decoded = component.replace('+', " ");
    percent_decode_str(&plus_decoded)
        .decode_utf8_lossy()
        .into_owned()
}

fn encode_component(component: &str) -> String {
    utf8_percent_encode(component, QUERY_ENCODE_SET)
        .to_string()
        .replace("%20", "+")
}
