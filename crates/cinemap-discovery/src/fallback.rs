//! Curated regional theatre lists used when every live provider fails.
//!
//! The built-in catalog is compiled in from `config/fallback.yaml`; a
//! deployment may replace it with its own file via `CINEMAP_FALLBACK_PATH`.

use std::collections::HashSet;
use std::path::Path;

use cinemap_core::{sort_by_distance, BoundingBox, Coordinate, Provenance, ProviderKind, Theatre};
use serde::Deserialize;

use crate::CatalogError;

const BUILTIN_CATALOG: &str = include_str!("../config/fallback.yaml");

#[derive(Debug, Clone, Deserialize)]
pub struct FallbackTheatre {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
    #[serde(default)]
    pub rating: Option<f64>,
}

impl FallbackTheatre {
    fn to_theatre(&self) -> Theatre {
        Theatre {
            id: self.id.clone(),
            name: self.name.clone(),
            location: Coordinate::new(self.latitude, self.longitude),
            address: self.address.clone(),
            rating: self.rating,
            photos: Vec::new(),
            reviews: Vec::new(),
            distance: 0.0,
            opening_hours: None,
            website: None,
            phone_number: None,
            provenance: Provenance::provider(ProviderKind::StaticFallback),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FallbackRegion {
    pub name: String,
    pub bounds: BoundingBox,
    pub theatres: Vec<FallbackTheatre>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FallbackCatalog {
    pub regions: Vec<FallbackRegion>,
}

impl FallbackCatalog {
    /// The catalog shipped with the binary (Hong Kong and New York City).
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if the embedded YAML fails to parse or validate.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_yaml(BUILTIN_CATALOG)
    }

    /// Load and validate a catalog from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if the file cannot be read, parsed, or fails validation.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path).map_err(|e| CatalogError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_yaml(&content)
    }

    /// # Errors
    ///
    /// Returns [`CatalogError`] if `yaml` fails to parse or validate.
    pub fn from_yaml(yaml: &str) -> Result<Self, CatalogError> {
        let catalog: FallbackCatalog = serde_yaml::from_str(yaml).map_err(CatalogError::Parse)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Theatres of the first region whose bounds contain `origin`, annotated
    /// with distance from `origin` and sorted. Empty when no region matches.
    #[must_use]
    pub fn theatres_near(&self, origin: &Coordinate) -> Vec<Theatre> {
        let Some(region) = self.region_for(origin) else {
            return Vec::new();
        };
        let mut theatres: Vec<Theatre> =
            region.theatres.iter().map(FallbackTheatre::to_theatre).collect();
        sort_by_distance(&mut theatres, origin);
        theatres
    }

    #[must_use]
    pub fn region_for(&self, origin: &Coordinate) -> Option<&FallbackRegion> {
        self.regions.iter().find(|r| r.bounds.contains(origin))
    }

    fn validate(&self) -> Result<(), CatalogError> {
        let mut seen_ids = HashSet::new();

        for region in &self.regions {
            if region.name.trim().is_empty() {
                return Err(CatalogError::Validation(
                    "region name must be non-empty".to_string(),
                ));
            }

            let b = &region.bounds;
            if !(b.min_lat < b.max_lat && b.min_lng < b.max_lng) {
                return Err(CatalogError::Validation(format!(
                    "region '{}' has empty or inverted bounds",
                    region.name
                )));
            }

            for theatre in &region.theatres {
                let location = Coordinate::new(theatre.latitude, theatre.longitude);
                if !location.is_valid() {
                    return Err(CatalogError::Validation(format!(
                        "theatre '{}' has an invalid coordinate",
                        theatre.id
                    )));
                }
                if let Some(rating) = theatre.rating {
                    if !(0.0..=5.0).contains(&rating) {
                        return Err(CatalogError::Validation(format!(
                            "theatre '{}' has rating {rating}; must be within 0-5",
                            theatre.id
                        )));
                    }
                }
                if !seen_ids.insert(theatre.id.as_str()) {
                    return Err(CatalogError::Validation(format!(
                        "duplicate theatre id: '{}'",
                        theatre.id
                    )));
                }
            }
        }

        Ok(())
    }
}
