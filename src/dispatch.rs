//! # Batch dispatcher
//!
//! Large observation sets are split into contiguous chunks and evaluated on a worker
//! pool; small ones go through a single engine call. Partitioning is purely a
//! performance optimization: the serial and parallel paths produce numerically identical
//! results, and output order always matches input observation order regardless of worker
//! completion order.
//!
//! The parallelism degree is an explicit configuration value threaded into the dispatch
//! entry point (defaulting to the detected core count), not hidden process-global state;
//! callers that want "set once, affects subsequent calls" keep a [`DispatchConfig`] and
//! pass it along.
//!
//! There is no cancellation, timeout or retry: a failing chunk fails the whole call and
//! the results of its siblings are discarded.

use std::ops::Range;

use rayon::prelude::*;

use crate::assemble::{assemble_lstar, concat_lstar, LstarResult};
use crate::constants::Degree;
use crate::coords::Locations;
use crate::engine::FieldModelEngine;
use crate::extmodel::ExtModel;
use crate::magshell_errors::MagshellError;
use crate::omni::DriverTable;
use crate::prep::prep_buffers;
use crate::time::TimeArray;

/// Worker-pool configuration for batched queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Number of worker threads for parallel dispatch (minimum 1).
    pub ncpus: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        let ncpus = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        DispatchConfig { ncpus }
    }
}

impl DispatchConfig {
    pub fn new(ncpus: usize) -> Self {
        DispatchConfig {
            ncpus: ncpus.max(1),
        }
    }

    /// Parallel dispatch pays off only when the batch is more than double the worker
    /// count; below that the pool overhead dominates.
    pub fn is_parallel(&self, n: usize) -> bool {
        self.ncpus > 1 && n > 2 * self.ncpus
    }

    /// Split `[0, n)` into `ncpus` near-equal contiguous ranges.
    ///
    /// The ranges are disjoint, cover `[0, n)` exactly once, and are emitted in
    /// ascending index order so reassembly is a plain concatenation.
    pub(crate) fn chunk_ranges(&self, n: usize) -> Vec<Range<usize>> {
        let k = self.ncpus.min(n).max(1);
        let base = n / k;
        let extra = n % k;
        let mut ranges = Vec::with_capacity(k);
        let mut lo = 0;
        for i in 0..k {
            let len = base + usize::from(i < extra);
            ranges.push(lo..lo + len);
            lo += len;
        }
        ranges
    }
}

/// Evaluate the shell-parameter query serially or across the worker pool.
///
/// Arguments
/// ---------
/// * `config`: parallelism degree, read at dispatch time
/// * `engine`: the external evaluation engine
/// * `ticks` / `loci` / `pitch_angles`: the observation set
/// * `ext_mag` / `options` / `omnivals`: buffer-builder parameters
/// * `landi2lstar`: select the alternative combined engine routine
///
/// Return
/// ------
/// * The assembled [`LstarResult`] in input observation order, or the first chunk
///   failure (partial results are discarded).
#[allow(clippy::too_many_arguments)]
pub(crate) fn dispatch_lstar<E: FieldModelEngine + ?Sized>(
    config: &DispatchConfig,
    engine: &E,
    ticks: &TimeArray,
    loci: &Locations,
    pitch_angles: &[Degree],
    ext_mag: ExtModel,
    options: [i32; 5],
    omnivals: Option<&DriverTable>,
    landi2lstar: bool,
) -> Result<LstarResult, MagshellError> {
    let n = ticks.len();

    let run_chunk = |range: Range<usize>| -> Result<LstarResult, MagshellError> {
        let chunk_ticks = ticks.slice(range.clone());
        let chunk_loci = loci.slice(range.clone());
        let buf = prep_buffers(
            &chunk_ticks,
            &chunk_loci,
            pitch_angles,
            ext_mag,
            options,
            omnivals,
        )?;
        let raw = if landi2lstar {
            engine.landi2lstar(&buf)?
        } else {
            engine.make_lstar(&buf)?
        };
        Ok(assemble_lstar(&raw, range.len(), pitch_angles.len()))
    };

    if !config.is_parallel(n) {
        log::debug!("dispatch: serial, n={n}");
        return run_chunk(0..n);
    }

    let ranges = config.chunk_ranges(n);
    log::debug!("dispatch: parallel, n={n} chunks={}", ranges.len());

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.ncpus)
        .build()?;

    // par_iter + collect keeps chunk order independent of completion order; any chunk
    // error surfaces as the whole call's error.
    let parts: Result<Vec<LstarResult>, MagshellError> =
        pool.install(|| ranges.into_par_iter().map(run_chunk).collect());

    Ok(concat_lstar(parts?))
}

#[cfg(test)]
mod dispatch_test {
    use super::*;

    #[test]
    fn test_chunk_ranges_cover_exactly() {
        let config = DispatchConfig::new(4);
        let ranges = config.chunk_ranges(10);
        assert_eq!(ranges, vec![0..3, 3..6, 6..8, 8..10]);

        let ranges = config.chunk_ranges(4);
        assert_eq!(ranges, vec![0..1, 1..2, 2..3, 3..4]);

        // Fewer observations than workers: one chunk per observation.
        let ranges = config.chunk_ranges(2);
        assert_eq!(ranges, vec![0..1, 1..2]);
    }

    #[test]
    fn test_parallel_threshold() {
        let config = DispatchConfig::new(4);
        assert!(!config.is_parallel(8));
        assert!(config.is_parallel(9));
        // A single worker never goes parallel.
        assert!(!DispatchConfig::new(1).is_parallel(1000));
        // Zero is clamped to one worker.
        assert_eq!(DispatchConfig::new(0).ncpus, 1);
    }
}
