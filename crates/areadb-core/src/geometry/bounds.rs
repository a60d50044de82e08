// crates/areadb-core/src/geometry/bounds.rs
use super::Position;
use crate::error::{AreaError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Axis-aligned latitude/longitude envelope.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub max_latitude: f64,
    pub max_longitude: f64,
    pub min_latitude: f64,
    pub min_longitude: f64,
}

impl BoundingBox {
    /// Degenerate box around a single position.
    pub fn at(p: &Position) -> Self {
        BoundingBox {
            max_latitude: p.y,
            max_longitude: p.x,
            min_latitude: p.y,
            min_longitude: p.x,
        }
    }

    /// Streaming min/max fold over positions.
    ///
    /// Returns `Ok(None)` for an empty input and fails on the first
    /// non-finite coordinate, so a NaN can never leak into the extremes.
    pub fn from_positions<'a, I>(positions: I) -> Result<Option<Self>>
    where
        I: IntoIterator<Item = &'a Position>,
    {
        positions.into_iter().try_fold(None, |acc: Option<Self>, p| {
            if !p.x.is_finite() || !p.y.is_finite() {
                return Err(AreaError::InvalidCoordinate {
                    value: format!("{},{}", p.x, p.y),
                });
            }
            Ok(Some(match acc {
                None => Self::at(p),
                Some(b) => b.extended(p),
            }))
        })
    }

    /// Like [`BoundingBox::from_positions`] but skips non-finite positions.
    pub fn from_finite<'a, I>(positions: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Position>,
    {
        positions
            .into_iter()
            .filter(|p| p.x.is_finite() && p.y.is_finite())
            .fold(None, |acc: Option<Self>, p| {
                Some(match acc {
                    None => Self::at(p),
                    Some(b) => b.extended(p),
                })
            })
    }

    pub fn extended(self, p: &Position) -> Self {
        BoundingBox {
            max_latitude: self.max_latitude.max(p.y),
            max_longitude: self.max_longitude.max(p.x),
            min_latitude: self.min_latitude.min(p.y),
            min_longitude: self.min_longitude.min(p.x),
        }
    }

    pub fn union(self, other: Self) -> Self {
        BoundingBox {
            max_latitude: self.max_latitude.max(other.max_latitude),
            max_longitude: self.max_longitude.max(other.max_longitude),
            min_latitude: self.min_latitude.min(other.min_latitude),
            min_longitude: self.min_longitude.min(other.min_longitude),
        }
    }

    /// Midpoint of the box (not an area-weighted centroid).
    pub fn centroid(&self) -> Centroid {
        Centroid {
            latitude: (self.max_latitude + self.min_latitude) / 2.0,
            longitude: (self.max_longitude + self.min_longitude) / 2.0,
        }
    }

    pub fn contains(&self, p: &Position) -> bool {
        p.y >= self.min_latitude
            && p.y <= self.max_latitude
            && p.x >= self.min_longitude
            && p.x <= self.max_longitude
    }

    /// GeoJSON `bbox` member order: `[west, south, east, north]`.
    pub fn to_geojson(&self) -> Vec<f64> {
        vec![
            self.min_longitude,
            self.min_latitude,
            self.max_longitude,
            self.max_latitude,
        ]
    }
}

/// Midpoint of a bounding box, serialized as `[latitude, longitude]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Centroid {
    pub latitude: f64,
    pub longitude: f64,
}

impl Serialize for Centroid {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        (self.latitude, self.longitude).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Centroid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let (latitude, longitude) = <(f64, f64)>::deserialize(deserializer)?;
        Ok(Centroid {
            latitude,
            longitude,
        })
    }
}
