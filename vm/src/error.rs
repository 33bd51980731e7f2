//! Error types for the paging engine.

use thiserror::Error;

use crate::{FrameIndex, PageNumber};

/// Errors produced while validating input or replaying a reference stream.
///
/// `Validation` is the only variant a caller should ever see in correct
/// operation. The others mean the engine broke one of its own invariants.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VmError {
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("page {page} is not resident")]
    NotFound { page: PageNumber },

    #[error("cannot load page {page} into frame {frame}: {reason}")]
    Capacity {
        page: PageNumber,
        frame: FrameIndex,
        reason: &'static str,
    },

    #[error("replacement policy found no resident page to evict")]
    NoVictim,
}

impl VmError {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        VmError::Validation {
            field,
            reason: reason.into(),
        }
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, VmError>;
