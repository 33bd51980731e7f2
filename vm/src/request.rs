//! Validation of externally supplied simulation requests.
//!
//! Requests arrive with loosely typed fields (signed integers, free-form
//! names). Everything is checked up front so that a bad request produces a
//! single [`VmError::Validation`] and never a partial result.

use serde::Deserialize;

use crate::error::{Result, VmError};
use crate::page_replacer::ReplacementPolicy;
use crate::page_table::Organization;
use crate::simulation::{run_sweep, Selection, SimulationConfig, SimulationResult};
use crate::PageNumber;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct SimulationRequest {
    pub reference_stream: Vec<i64>,
    pub frame_count: i64,
    pub policy: String,
    #[serde(default)]
    pub organization: Option<String>,
    #[serde(default)]
    pub tlb_size: Option<i64>,
}

/// A request that passed validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatedRequest {
    pub reference: Vec<PageNumber>,
    pub config: SimulationConfig,
    pub policies: Selection<ReplacementPolicy>,
    pub organizations: Selection<Organization>,
}

impl SimulationRequest {
    /// Checks every field, using `base` for settings the request does not carry.
    pub fn validate(&self, base: &SimulationConfig) -> Result<ValidatedRequest> {
        let reference = self
            .reference_stream
            .iter()
            .map(|&page| to_page(page))
            .collect::<Result<Vec<_>>>()?;

        let frame_count = positive("frame_count", self.frame_count)?;
        let tlb_size = match self.tlb_size {
            Some(size) => non_negative("tlb_size", size)?,
            None => 0,
        };

        let policies = self.policy.parse::<Selection<ReplacementPolicy>>()?;
        let organizations = match &self.organization {
            Some(name) => name.parse::<Selection<Organization>>()?,
            None => Selection::Only(Organization::Single),
        };

        let config = SimulationConfig {
            frame_count,
            tlb_size,
            ..base.clone()
        };
        config.validate()?;

        Ok(ValidatedRequest {
            reference,
            config,
            policies,
            organizations,
        })
    }

    /// Validates and runs the request.
    pub fn execute(&self, base: &SimulationConfig) -> Result<Vec<SimulationResult>> {
        let request = self.validate(base)?;
        run_sweep(
            &request.reference,
            &request.config,
            request.policies,
            request.organizations,
        )
    }
}

fn to_page(value: i64) -> Result<PageNumber> {
    PageNumber::try_from(value).map_err(|_| {
        VmError::validation(
            "reference_stream",
            format!("page numbers must be non-negative, got {value}"),
        )
    })
}

fn positive(field: &'static str, value: i64) -> Result<usize> {
    match usize::try_from(value) {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(VmError::validation(field, format!("must be a positive integer, got {value}"))),
    }
}

fn non_negative(field: &'static str, value: i64) -> Result<usize> {
    usize::try_from(value)
        .map_err(|_| VmError::validation(field, format!("must not be negative, got {value}")))
}

/// Parses a reference string such as `"7, 0 1,2"`.
///
/// Items may be separated by commas, whitespace or both. Empty items are
/// skipped.
pub fn parse_reference_string(input: &str) -> Result<Vec<PageNumber>> {
    input
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|item| !item.is_empty())
        .map(|item| {
            item.parse::<i64>()
                .map_err(|_| {
                    VmError::validation(
                        "reference_stream",
                        format!("{item:?} is not an integer"),
                    )
                })
                .and_then(to_page)
        })
        .collect()
}
