use ahash::AHashMap;
use hifitime::Epoch;

use crate::magshell_errors::MagshellError;

/// Timestamp-keyed table of solar-wind and geomagnetic driver values.
///
/// This is the driver-table interface consumed by the buffer builder: one row per
/// timestamp, named physical columns (`Kp`, `Dst`, `dens`, `velo`, IMF components,
/// derived `G`/`W` parameters). Retrieval of the table itself is an external concern;
/// this layer only reads it.
///
/// Lookups are exact-timestamp matches. The fill policy for absent rows lives in the
/// buffer builder, not here.
#[derive(Debug, Clone, Default)]
pub struct DriverTable {
    epochs: Vec<Epoch>,
    columns: AHashMap<String, Vec<f64>>,
}

impl DriverTable {
    pub fn new(epochs: Vec<Epoch>) -> Self {
        DriverTable {
            epochs,
            columns: AHashMap::new(),
        }
    }

    /// Attach a named column; its length must match the timestamp count.
    ///
    /// Arguments
    /// ---------
    /// * `name`: column name (e.g. `"Dst"`)
    /// * `values`: one value per timestamp, in timestamp order
    ///
    /// Return
    /// ------
    /// * The table, or [`MagshellError::DriverColumnMismatch`] on a length mismatch.
    pub fn with_column(
        mut self,
        name: impl Into<String>,
        values: Vec<f64>,
    ) -> Result<Self, MagshellError> {
        let name = name.into();
        if values.len() != self.epochs.len() {
            return Err(MagshellError::DriverColumnMismatch {
                column: name,
                expected: self.epochs.len(),
                got: values.len(),
            });
        }
        self.columns.insert(name, values);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.epochs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.epochs.is_empty()
    }

    pub fn epochs(&self) -> &[Epoch] {
        &self.epochs
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Row index of an exact timestamp match, if any.
    pub fn index_of(&self, epoch: Epoch) -> Option<usize> {
        self.epochs.iter().position(|e| *e == epoch)
    }

    /// Value of `column` at the row matching `epoch` exactly.
    ///
    /// Returns `None` when either the column or the row is absent.
    pub fn value_at(&self, column: &str, epoch: Epoch) -> Option<f64> {
        let idx = self.index_of(epoch)?;
        self.columns.get(column).map(|col| col[idx])
    }
}
