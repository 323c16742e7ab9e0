//! `Accept` header negotiation.

use crate::render::normalize_media_type;

/// Picks the best media type from `available` for an `Accept` header.
///
/// Ranges are ordered by their `q` parameter, highest first, keeping header
/// order among equals. `type/*` and `*/*` match the first available type
/// they cover. Ranges with `q=0` are never selected. Returns `None` if
/// nothing acceptable is available.
///
/// # Examples
///
/// ```
/// use hypermedia_decorator::web::negotiate;
///
/// let available = ["application/hal+json", "application/vnd.siren+json"];
///
/// assert_eq!(
///     negotiate("application/vnd.siren+json;q=0.9, application/hal+json", &available),
///     Some("application/hal+json")
/// );
/// assert_eq!(negotiate("text/html", &available), None);
/// ```
pub fn negotiate<'a>(accept: &str, available: &[&'a str]) -> Option<&'a str> {
    let mut ranges: Vec<(String, f32)> = accept
        .split(',')
        .filter_map(|range| {
            let media = normalize_media_type(range);
            if media.is_empty() {
                return None;
            }
            Some((media, quality(range)))
        })
        .filter(|(_, q)| *q > 0.0)
        .collect();
    ranges.sort_by(|a, b| b.1.total_cmp(&a.1));

    ranges.iter().find_map(|(range, _)| {
        available
            .iter()
            .copied()
            .find(|candidate| matches(range, &normalize_media_type(candidate)))
    })
}

fn quality(range: &str) -> f32 {
    range
        .split(';')
        .skip(1)
        .filter_map(|param| param.split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("q"))
        .and_then(|(_, value)| value.trim().parse::<f32>().ok())
        .unwrap_or(1.0)
}

fn matches(range: &str, candidate: &str) -> bool {
    if range == "*/*" {
        return true;
    }
    match range.strip_suffix("/*") {
        Some(major) => candidate
            .split_once('/')
            .is_some_and(|(candidate_major, _)| candidate_major == major),
        None => range == candidate,
    }
}
