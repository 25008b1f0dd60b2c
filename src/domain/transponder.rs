use crate::domain::ids::TransponderName;
use crate::error::{Error, Result};

/// One entry of the immutable transponder catalog.
#[derive(Debug, Clone)]
pub struct TransponderType {
    pub name: TransponderName,
    pub line_rate_gbps: f64,
    pub cost: f64,
    pub num_slots: usize,

    /// Optical reach in km. A non-positive value means unlimited reach.
    pub optical_reach_km: f64,

    /// Cost of one regenerator. A negative value means regeneration is not
    /// supported and the reach is a hard limit.
    pub regenerator_cost: f64,
}

impl TransponderType {
    pub fn reach_is_unlimited(&self) -> bool {
        self.optical_reach_km <= 0.0
    }

    pub fn supports_regeneration(&self) -> bool {
        self.regenerator_cost >= 0.0
    }

    pub fn is_within_reach(&self, length_km: f64) -> bool {
        self.reach_is_unlimited() || length_km <= self.optical_reach_km
    }
}

/// The ordered transponder catalog. List order is the user-specified priority
/// order used by the routing engine's candidate enumeration.
#[derive(Debug, Clone)]
pub struct TransponderCatalog {
    types: Vec<TransponderType>,
}

impl TransponderCatalog {
    pub fn new(types: Vec<TransponderType>) -> Result<Self> {
        if types.is_empty() {
            return Err(Error::ModelConstruction("the transponder catalog must contain at least one type".to_string()));
        }

        for typ in &types {
            if typ.num_slots == 0 {
                return Err(Error::ModelConstruction(format!("transponder type '{}' occupies zero slots", typ.name)));
            }
        }

        Ok(TransponderCatalog { types })
    }

    pub fn types(&self) -> &[TransponderType] {
        &self.types
    }

    pub fn get(&self, index: usize) -> &TransponderType {
        &self.types[index]
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// The largest finite reach any type offers without regeneration, used as
    /// the hard path-length ceiling when no type supports regeneration.
    /// Returns `None` if some type has unlimited reach.
    pub fn max_unregenerated_reach_km(&self) -> Option<f64> {
        let mut max_reach: f64 = 0.0;

        for typ in &self.types {
            if typ.reach_is_unlimited() {
                return None;
            }

            if typ.optical_reach_km > max_reach {
                max_reach = typ.optical_reach_km;
            }
        }

        return Some(max_reach);
    }

    pub fn any_type_supports_regeneration(&self) -> bool {
        self.types.iter().any(|t| t.supports_regeneration())
    }
}
