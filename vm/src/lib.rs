//! Page replacement simulator.
//!
//! Replays a reference string of page numbers against a fixed number of
//! physical frames under one of six replacement policies, optionally behind a
//! TLB, with the page table laid out as a single-level, multi-level or
//! inverted table.

pub mod error;
pub mod frame_store;
pub mod mmu;
pub mod page_replacer;
pub mod page_table;
pub mod request;
pub mod simulation;
pub mod tlb;

pub type PageNumber = usize;
pub type FrameIndex = usize;

pub use error::{Result, VmError};
pub use mmu::{Mmu, StepEvent, StepRecord};
pub use page_replacer::ReplacementPolicy;
pub use page_table::Organization;
pub use request::{parse_reference_string, SimulationRequest};
pub use simulation::{
    run_sweep, simulate, simulate_with_mmu, Selection, SimulationConfig, SimulationResult,
    MAX_FRAME_COUNT,
};
pub use tlb::TlbPolicy;
