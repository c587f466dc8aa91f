//! Greedy marker clustering.

use cinemap_core::{Coordinate, Theatre};

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerCluster {
    /// Mean of member coordinates.
    pub centroid: Coordinate,
    /// Member ids in input order.
    pub theatre_ids: Vec<String>,
}

impl MarkerCluster {
    #[must_use]
    pub fn len(&self) -> usize {
        self.theatre_ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.theatre_ids.is_empty()
    }

    /// A single-member cluster renders as a plain marker.
    #[must_use]
    pub fn is_single(&self) -> bool {
        self.theatre_ids.len() == 1
    }
}

/// Groups theatres in input order: each joins the first existing cluster
/// whose current centroid is strictly closer than `radius_meters`, otherwise
/// it starts a new cluster. Centroids are updated after every join.
#[must_use]
pub fn cluster_theatres(theatres: &[Theatre], radius_meters: f64) -> Vec<MarkerCluster> {
    // Running coordinate sums per cluster, kept alongside for centroid updates.
    let mut sums: Vec<(f64, f64)> = Vec::new();
    let mut clusters: Vec<MarkerCluster> = Vec::new();

    for theatre in theatres {
        let target = clusters
            .iter()
            .position(|c| c.centroid.distance_to(&theatre.location) < radius_meters);

        match target {
            Some(i) => {
                let cluster = &mut clusters[i];
                cluster.theatre_ids.push(theatre.id.clone());
                sums[i].0 += theatre.location.latitude;
                sums[i].1 += theatre.location.longitude;
                #[allow(clippy::cast_precision_loss)]
                let n = cluster.theatre_ids.len() as f64;
                cluster.centroid = Coordinate::new(sums[i].0 / n, sums[i].1 / n);
            }
            None => {
                sums.push((theatre.location.latitude, theatre.location.longitude));
                clusters.push(MarkerCluster {
                    centroid: theatre.location,
                    theatre_ids: vec![theatre.id.clone()],
                });
            }
        }
    }

    clusters
}
