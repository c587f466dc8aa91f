//! Keyword-sweep merge and de-duplication.

use std::collections::HashSet;

use cinemap_core::{Coordinate, Theatre};

/// Decimal places a coordinate is rounded to before two records are treated
/// as the same venue (about 1.1 m at the equator).
pub const DEDUP_DECIMALS: i32 = 5;

/// Identity of a venue in a keyword sweep: the coordinate rounded to
/// [`DEDUP_DECIMALS`] places, as integer ticks.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn dedup_key(coordinate: &Coordinate) -> (i64, i64) {
    let scale = 10f64.powi(DEDUP_DECIMALS);
    (
        (coordinate.latitude * scale).round() as i64,
        (coordinate.longitude * scale).round() as i64,
    )
}

/// Concatenates per-keyword batches in keyword order, keeping only the first
/// record seen for each rounded coordinate.
///
/// The winner keeps its own provenance, so the output reports which keyword
/// surfaced each venue first.
pub fn merge_keyword_batches<I>(batches: I) -> Vec<Theatre>
where
    I: IntoIterator<Item = Vec<Theatre>>,
{
    let mut seen = HashSet::new();
    batches
        .into_iter()
        .flatten()
        .filter(|theatre| seen.insert(dedup_key(&theatre.location)))
        .collect()
}

#[cfg(test)]
mod tests {
    use cinemap_core::Provenance;

    use super::*;

    fn theatre(id: &str, lat: f64, lng: f64, keyword: &str) -> Theatre {
        Theatre {
            id: id.to_owned(),
            name: id.to_owned(),
            location: Coordinate::new(lat, lng),
            address: String::new(),
            rating: None,
            photos: vec![],
            reviews: vec![],
            distance: 0.0,
            opening_hours: None,
            website: None,
            phone_number: None,
            provenance: Provenance::keyword(keyword),
        }
    }

    #[test]
    fn first_keyword_wins_for_same_rounded_coordinate() {
        let merged = merge_keyword_batches([
            vec![theatre("a", 22.285_101, 114.158_204, "IMAX")],
            vec![
                theatre("b", 22.285_104, 114.158_196, "cinema"),
                theatre("c", 22.3, 114.2, "cinema"),
            ],
        ]);

        let ids: Vec<&str> = merged.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["a", "c"]);
        assert_eq!(merged[0].provenance.search_term.as_deref(), Some("IMAX"));
    }

    #[test]
    fn coordinates_differing_at_fifth_decimal_are_distinct() {
        let merged = merge_keyword_batches([vec![
            theatre("a", 22.285_10, 114.158_20, "cinema"),
            theatre("b", 22.285_11, 114.158_20, "cinema"),
        ]]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn no_two_results_share_a_key() {
        let merged = merge_keyword_batches([
            vec![theatre("a", 1.0, 1.0, "x"), theatre("b", 2.0, 2.0, "x")],
            vec![theatre("c", 1.0, 1.0, "y"), theatre("d", 2.0, 2.0, "y")],
            vec![theatre("e", 3.0, 3.0, "z")],
        ]);
        let keys: HashSet<_> = merged.iter().map(|t| dedup_key(&t.location)).collect();
        assert_eq!(keys.len(), merged.len());
        assert_eq!(merged.len(), 3);
    }
}
