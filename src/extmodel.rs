//! # External-model selector
//!
//! Maps each supported external magnetospheric field model to (a) the integer code
//! (`kext`) the engine expects and (b) the ordered set of driver columns that model
//! consumes. The column list is an immutable static table resolved once at buffer-builder
//! entry, never re-derived per observation.

use std::fmt;
use std::str::FromStr;

use crate::constants::DRIVER_COLUMN_COUNT;
use crate::magshell_errors::MagshellError;

/// The 16 named driver rows of the `magin` buffer, in engine order.
///
/// Rows beyond these stay zero regardless of selector; the builder writes every known
/// column when a driver table is supplied, whether or not the selector consumes it.
pub const DRIVER_COLUMNS: [&str; DRIVER_COLUMN_COUNT] = [
    "Kp", "Dst", "dens", "velo", "Pdyn", "ByIMF", "BzIMF", "G1", "G2", "G3", "W1", "W2", "W3",
    "W4", "W5", "W6",
];

/// External field model evaluated by the engine on top of the internal field.
///
/// The discriminant order matches the engine's `kext` code assignment and must not be
/// reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExtModel {
    /// No external field; internal-field-only baseline.
    #[default]
    None,
    MeadFairfield,
    T87Short,
    T87Long,
    T89,
    OpQuiet,
    OpDynamic,
    T96,
    Ostapenko97,
    T01Quiet,
    T01Storm,
    T05,
    Alexeev2000,
}

impl ExtModel {
    /// Engine integer code for this selector.
    pub fn kext(self) -> i32 {
        self as i32
    }

    /// Driver columns this model consumes, in engine order.
    ///
    /// An empty slice means the model ignores the `magin` buffer entirely; for those
    /// selectors a zero-filled buffer is numerically identical to supplied drivers.
    pub fn driver_columns(self) -> &'static [&'static str] {
        match self {
            ExtModel::None | ExtModel::OpQuiet => &[],
            ExtModel::MeadFairfield | ExtModel::T87Short | ExtModel::T87Long | ExtModel::T89 => {
                &["Kp"]
            }
            ExtModel::OpDynamic | ExtModel::Alexeev2000 => &["Dst", "dens", "velo"],
            ExtModel::T96 => &["Dst", "Pdyn", "ByIMF", "BzIMF"],
            ExtModel::Ostapenko97 => &["Dst"],
            ExtModel::T01Quiet => &["Dst", "Pdyn", "ByIMF", "BzIMF", "G1", "G2"],
            ExtModel::T01Storm => &["Dst", "Pdyn", "ByIMF", "BzIMF", "G2", "G3"],
            ExtModel::T05 => &[
                "Dst", "Pdyn", "ByIMF", "BzIMF", "W1", "W2", "W3", "W4", "W5", "W6",
            ],
        }
    }

    /// Whether any driver column is required by this selector.
    pub fn consumes_drivers(self) -> bool {
        !self.driver_columns().is_empty()
    }
}

impl fmt::Display for ExtModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = match self {
            ExtModel::None => "0",
            ExtModel::MeadFairfield => "MEAD",
            ExtModel::T87Short => "T87SHORT",
            ExtModel::T87Long => "T87LONG",
            ExtModel::T89 => "T89",
            ExtModel::OpQuiet => "OPQUIET",
            ExtModel::OpDynamic => "OPDYN",
            ExtModel::T96 => "T96",
            ExtModel::Ostapenko97 => "OSTA",
            ExtModel::T01Quiet => "T01QUIET",
            ExtModel::T01Storm => "T01STORM",
            ExtModel::T05 => "T05",
            ExtModel::Alexeev2000 => "ALEX",
        };
        write!(f, "{key}")
    }
}

impl FromStr for ExtModel {
    type Err = MagshellError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "0" | "NONE" | "IGRF" => Ok(ExtModel::None),
            "MEAD" => Ok(ExtModel::MeadFairfield),
            "T87SHORT" => Ok(ExtModel::T87Short),
            "T87LONG" => Ok(ExtModel::T87Long),
            "T89" => Ok(ExtModel::T89),
            "OPQUIET" => Ok(ExtModel::OpQuiet),
            "OPDYN" => Ok(ExtModel::OpDynamic),
            "T96" => Ok(ExtModel::T96),
            "OSTA" => Ok(ExtModel::Ostapenko97),
            "T01QUIET" => Ok(ExtModel::T01Quiet),
            "T01STORM" => Ok(ExtModel::T01Storm),
            "T05" => Ok(ExtModel::T05),
            "ALEX" => Ok(ExtModel::Alexeev2000),
            _ => Err(MagshellError::InvalidExtModel(s.to_string())),
        }
    }
}
