//! Replaying reference streams and sweeping over policies and organizations.

use std::str::FromStr;

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VmError};
use crate::mmu::{Mmu, StepEvent, StepRecord};
use crate::page_replacer::ReplacementPolicy;
use crate::page_table::{Organization, PageTableDump};
use crate::tlb::TlbPolicy;
use crate::PageNumber;

pub const DEFAULT_DIRECTORY_SPAN: usize = 10;
pub const DEFAULT_PAGE_SIZE: usize = 1024;

/// Largest accepted `frame_count`. Frames are allocated eagerly, so an
/// unchecked count from a request could abort the process on allocation.
pub const MAX_FRAME_COUNT: usize = 1 << 20;
/// Largest accepted `tlb_size`.
pub const MAX_TLB_SIZE: usize = MAX_FRAME_COUNT;

/// Parameters of a single run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    pub frame_count: usize,
    pub policy: ReplacementPolicy,
    pub organization: Organization,
    /// Zero disables the TLB.
    pub tlb_size: usize,
    pub tlb_policy: TlbPolicy,
    /// Pages per second-level table in the multi-level organization.
    pub directory_span: usize,
    /// Only used for address translation.
    pub page_size: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            frame_count: 3,
            policy: ReplacementPolicy::Fifo,
            organization: Organization::Single,
            tlb_size: 0,
            tlb_policy: TlbPolicy::default(),
            directory_span: DEFAULT_DIRECTORY_SPAN,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.frame_count == 0 {
            return Err(VmError::validation("frame_count", "must be greater than zero"));
        }
        if self.frame_count > MAX_FRAME_COUNT {
            return Err(VmError::validation(
                "frame_count",
                format!("must not exceed {MAX_FRAME_COUNT}, got {}", self.frame_count),
            ));
        }
        if self.tlb_size > MAX_TLB_SIZE {
            return Err(VmError::validation(
                "tlb_size",
                format!("must not exceed {MAX_TLB_SIZE}, got {}", self.tlb_size),
            ));
        }
        if self.directory_span == 0 {
            return Err(VmError::validation("directory_span", "must be greater than zero"));
        }
        if self.page_size == 0 {
            return Err(VmError::validation("page_size", "must be greater than zero"));
        }
        Ok(())
    }
}

/// Outcome of replaying one reference stream under one policy and organization.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SimulationResult {
    pub organization: Organization,
    pub algorithm: ReplacementPolicy,
    pub total_page_faults: usize,
    pub total_hits: usize,
    pub hit_ratio: f64,
    pub fault_ratio: f64,
    pub tlb_hits: usize,
    pub tlb_misses: usize,
    pub tlb_hit_ratio: f64,
    pub history: Vec<StepRecord>,
    pub final_memory_state: Vec<Option<PageNumber>>,
    pub page_table: PageTableDump,
}

impl SimulationResult {
    pub fn total_references(&self) -> usize {
        self.history.len()
    }

    /// The reference stream this result was produced from.
    pub fn reference_stream(&self) -> Vec<PageNumber> {
        self.history.iter().map(|record| record.page).collect()
    }
}

fn ratio(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}

/// Replays `reference` against a fresh set of frames.
pub fn simulate(reference: &[PageNumber], config: &SimulationConfig) -> Result<SimulationResult> {
    simulate_with_mmu(reference, config).map(|(result, _)| result)
}

/// Like [`simulate`], but also hands back the MMU in its final state.
pub fn simulate_with_mmu(
    reference: &[PageNumber],
    config: &SimulationConfig,
) -> Result<(SimulationResult, Mmu)> {
    config.validate()?;

    let mut mmu = Mmu::new(config);
    let mut history = Vec::with_capacity(reference.len());
    let mut hits = 0;
    let mut faults = 0;

    for (step, &page_number) in reference.iter().enumerate() {
        let record = mmu.access(step, page_number, &reference[step + 1..])?;
        match record.event {
            StepEvent::Hit => hits += 1,
            StepEvent::Fault => faults += 1,
        }
        history.push(record);
    }

    let total = reference.len();
    info!(
        "{}/{}: {} references, {} hits, {} faults, {} tlb hits",
        config.organization,
        config.policy,
        total,
        hits,
        faults,
        mmu.tlb().hits()
    );

    let result = SimulationResult {
        organization: config.organization,
        algorithm: config.policy,
        total_page_faults: faults,
        total_hits: hits,
        hit_ratio: ratio(hits, total),
        fault_ratio: ratio(faults, total),
        tlb_hits: mmu.tlb().hits(),
        tlb_misses: mmu.tlb().misses(),
        tlb_hit_ratio: ratio(mmu.tlb().hits(), total),
        history,
        final_memory_state: mmu.frames().snapshot(),
        page_table: mmu.frames().dump(),
    };

    Ok((result, mmu))
}

/// A closed set of alternatives that `ALL` expands to.
pub trait Sweep: Copy + FromStr<Err = VmError> + 'static {
    const ALL: &'static [Self];
}

impl Sweep for ReplacementPolicy {
    const ALL: &'static [Self] = &ReplacementPolicy::VARIANTS;
}

impl Sweep for Organization {
    const ALL: &'static [Self] = &Organization::VARIANTS;
}

/// Either one value or every value of a [`Sweep`] type.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Selection<T> {
    Only(T),
    All,
}

impl<T: Sweep> Selection<T> {
    pub fn expand(&self) -> Vec<T> {
        match self {
            Selection::Only(value) => vec![*value],
            Selection::All => T::ALL.to_vec(),
        }
    }
}

impl<T> From<T> for Selection<T> {
    fn from(value: T) -> Self {
        Selection::Only(value)
    }
}

impl<T: Sweep> FromStr for Selection<T> {
    type Err = VmError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("ALL") {
            Ok(Selection::All)
        } else {
            s.parse().map(Selection::Only)
        }
    }
}

/// Runs every (organization, policy) pair, organizations outermost.
///
/// `config.policy` and `config.organization` are overridden per run. Each run
/// gets its own frames and TLB.
pub fn run_sweep(
    reference: &[PageNumber],
    config: &SimulationConfig,
    policies: Selection<ReplacementPolicy>,
    organizations: Selection<Organization>,
) -> Result<Vec<SimulationResult>> {
    config.validate()?;

    let mut results = Vec::new();
    for organization in organizations.expand() {
        for policy in policies.expand() {
            let run = SimulationConfig {
                policy,
                organization,
                ..config.clone()
            };
            results.push(simulate(reference, &run)?);
        }
    }

    Ok(results)
}
