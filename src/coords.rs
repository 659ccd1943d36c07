use nalgebra::Vector3;
use std::ops::Range;

use crate::sysaxes::{CoordFrame, CoordRep};

/// Frame-tagged set of observation positions.
///
/// This is the position-object interface consumed by the buffer builder and produced for
/// every position-valued result (mag-equator location, footpoint location). Positions are
/// per-observation triplets sharing one frame/representation tag; the numeric meaning of
/// each component follows the tag (Cartesian components in Earth radii, spherical
/// `[r, lat_deg, lon_deg]`, geodetic `[alt_km, lat_deg, lon_deg]`).
#[derive(Debug, Clone, PartialEq)]
pub struct Locations {
    data: Vec<Vector3<f64>>,
    frame: CoordFrame,
    rep: CoordRep,
}

impl Locations {
    pub fn new(data: Vec<Vector3<f64>>, frame: CoordFrame, rep: CoordRep) -> Self {
        Locations { data, frame, rep }
    }

    /// Convenience constructor from raw triplets.
    pub fn from_triplets(triplets: &[[f64; 3]], frame: CoordFrame, rep: CoordRep) -> Self {
        Locations {
            data: triplets.iter().map(|t| Vector3::from(*t)).collect(),
            frame,
            rep,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn frame(&self) -> CoordFrame {
        self.frame
    }

    pub fn rep(&self) -> CoordRep {
        self.rep
    }

    pub fn data(&self) -> &[Vector3<f64>] {
        &self.data
    }

    pub fn get(&self, idx: usize) -> &Vector3<f64> {
        &self.data[idx]
    }

    /// Contiguous sub-set for chunked dispatch; keeps the frame tag.
    pub fn slice(&self, range: Range<usize>) -> Locations {
        Locations {
            data: self.data[range].to_vec(),
            frame: self.frame,
            rep: self.rep,
        }
    }
}
