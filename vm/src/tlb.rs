//! Translation lookaside buffer.
//!
//! A small fully associative cache of page numbers. It only answers "was this
//! page looked up recently?" and keeps its own hit/miss counters; residency in
//! the frame store is tracked elsewhere and never short-circuited by a TLB hit.

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use log::trace;
use serde::{Deserialize, Serialize};

use crate::error::VmError;
use crate::PageNumber;

/// Eviction order for a full TLB.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TlbPolicy {
    /// Evict the oldest inserted entry; hits do not reorder.
    Fifo,
    /// Evict the least recently touched entry.
    #[default]
    Lru,
}

impl fmt::Display for TlbPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TlbPolicy::Fifo => f.write_str("FIFO"),
            TlbPolicy::Lru => f.write_str("LRU"),
        }
    }
}

impl FromStr for TlbPolicy {
    type Err = VmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "FIFO" => Ok(TlbPolicy::Fifo),
            "LRU" => Ok(TlbPolicy::Lru),
            _ => Err(VmError::validation(
                "tlb_policy",
                format!("unknown TLB policy {s:?}, expected FIFO or LRU"),
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Tlb {
    /// Front is the next eviction candidate.
    entries: VecDeque<PageNumber>,
    capacity: usize,
    policy: TlbPolicy,
    hits: usize,
    misses: usize,
}

impl Tlb {
    /// A capacity of zero disables the cache: every touch is a miss.
    pub fn new(capacity: usize, policy: TlbPolicy) -> Self {
        Tlb {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            policy,
            hits: 0,
            misses: 0,
        }
    }

    /// Records an access to `page_number`, returning whether it hit.
    pub fn touch(&mut self, page_number: PageNumber) -> bool {
        if let Some(pos) = self.entries.iter().position(|&p| p == page_number) {
            self.hits += 1;
            if self.policy == TlbPolicy::Lru {
                self.entries.remove(pos);
                self.entries.push_back(page_number);
            }
            trace!("tlb: hit page {page_number}");
            return true;
        }

        self.misses += 1;
        trace!("tlb: miss page {page_number}");

        if self.capacity == 0 {
            return false;
        }
        if self.entries.len() >= self.capacity {
            if let Some(evicted) = self.entries.pop_front() {
                trace!("tlb: evict page {evicted}");
            }
        }
        self.entries.push_back(page_number);

        false
    }

    pub fn contains(&self, page_number: PageNumber) -> bool {
        self.entries.contains(&page_number)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }

    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
