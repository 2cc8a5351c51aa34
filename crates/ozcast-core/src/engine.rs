//! The per-call inference pipeline.
//!
//! ```text
//! PrecursorRecord -> fuzzify -> fire -> implicate -> aggregate -> extract
//! ```
//!
//! Each call is a pure function of the record and the calibration. Nothing
//! is cached between calls, so any number of threads may run inference
//! against one shared calibration.

use ozcast_types::{InferenceResult, Percentiles, PrecursorRecord};
use tracing::debug;

use crate::aggregation::{aggregate, extract_category_possibilities, extract_percentiles, ignorance};
use crate::config::Calibration;
use crate::error::{InferenceError, UnknownVariableError};
use crate::fuzzifier::{FuzzifiedInputs, fuzzify_variable};

/// Fractions reported as p10, p50 and p90.
pub const PERCENTILE_FRACTIONS: [f64; 3] = [0.10, 0.50, 0.90];

impl Calibration {
    /// Fuzzify every precursor of `record` against this calibration.
    ///
    /// # Errors
    ///
    /// Returns [`InferenceError::NonFiniteInput`] if any value is `NaN` or infinite.
    pub fn fuzzify_record(&self, record: &PrecursorRecord) -> Result<FuzzifiedInputs, InferenceError> {
        let mut inputs = FuzzifiedInputs::new();
        for (&id, (name, value)) in self.inputs().iter().zip(record.named_values()) {
            let variable = self
                .registry()
                .variable(id)
                .ok_or_else(|| UnknownVariableError {
                    name: name.to_owned(),
                })?;
            inputs.insert(fuzzify_variable(id, variable, value)?);
        }
        Ok(inputs)
    }

    /// Run one complete inference.
    ///
    /// Out-of-universe inputs are clipped and reported in
    /// [`InferenceResult::clipped_inputs`]. A record that activates no
    /// rule yields ignorance 1 and undefined percentiles.
    ///
    /// # Errors
    ///
    /// Returns [`InferenceError::NonFiniteInput`] if any value is `NaN` or infinite.
    pub fn infer(&self, record: &PrecursorRecord) -> Result<InferenceResult, InferenceError> {
        let inputs = self.fuzzify_record(record)?;
        let activations = self.rules().fire(&inputs);
        let contributions = self.rules().implicate(&activations);
        let surface = aggregate(self.output().universe(), self.resolution(), contributions);

        let possibilities = extract_category_possibilities(&surface, self.output().bands());
        let ignorance = ignorance(&possibilities);
        let percentiles = match extract_percentiles(&surface, &PERCENTILE_FRACTIONS)?.as_slice() {
            [p10, p50, p90] => Percentiles {
                p10: *p10,
                p50: *p50,
                p90: *p90,
            },
            _ => Percentiles::UNDEFINED,
        };

        debug!(
            version = %self.version(),
            ignorance,
            p50 = ?percentiles.p50,
            "inference complete"
        );

        Ok(InferenceResult {
            version: self.version().clone(),
            possibilities,
            ignorance,
            percentiles,
            activations,
            clipped_inputs: inputs.clip_events(),
        })
    }
}
