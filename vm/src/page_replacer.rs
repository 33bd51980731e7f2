//! Victim selection.
//!
//! Every policy is a pure function of the resident set (and, for
//! [`ReplacementPolicy::Optimal`], of the references still to come). The MMU
//! asks for a victim only when every frame is occupied and the requested page
//! is absent.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::VmError;
use crate::page_table::PageTableEntry;
use crate::PageNumber;

/// Something that happened to a resident page at a given step.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PageEvent {
    /// The page was referenced while already resident.
    Touched(usize),
    /// The page was just brought into a frame.
    Loaded(usize),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReplacementPolicy {
    Fifo,
    Lru,
    Optimal,
    Lfu,
    Mru,
    Mfu,
}

impl ReplacementPolicy {
    pub const VARIANTS: [ReplacementPolicy; 6] = [
        ReplacementPolicy::Fifo,
        ReplacementPolicy::Lru,
        ReplacementPolicy::Optimal,
        ReplacementPolicy::Lfu,
        ReplacementPolicy::Mru,
        ReplacementPolicy::Mfu,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ReplacementPolicy::Fifo => "FIFO",
            ReplacementPolicy::Lru => "LRU",
            ReplacementPolicy::Optimal => "OPTIMAL",
            ReplacementPolicy::Lfu => "LFU",
            ReplacementPolicy::Mru => "MRU",
            ReplacementPolicy::Mfu => "MFU",
        }
    }

    /// Whether a hit refreshes `last_used` under this policy.
    pub fn tracks_recency(&self) -> bool {
        matches!(
            self,
            ReplacementPolicy::Lru
                | ReplacementPolicy::Mru
                | ReplacementPolicy::Lfu
                | ReplacementPolicy::Mfu
        )
    }

    /// Applies `event` to the metadata of the page it concerns.
    pub fn page_event(&self, entry: &mut PageTableEntry, event: PageEvent) {
        match event {
            PageEvent::Loaded(step) => {
                entry.loaded_at = step;
                entry.last_used = step;
                entry.access_count = 1;
            }
            PageEvent::Touched(step) => {
                entry.access_count += 1;
                if self.tracks_recency() {
                    entry.last_used = step;
                }
            }
        }
    }

    /// Chooses which resident page to evict.
    ///
    /// `resident` must be in ascending frame order; OPTIMAL relies on it to
    /// break ties between pages that are never referenced again. `future`
    /// holds the references after the current one and is ignored by every
    /// other policy.
    pub fn pick_replacement_page(
        &self,
        resident: &[(PageNumber, PageTableEntry)],
        future: &[PageNumber],
    ) -> Option<PageNumber> {
        let victim = match self {
            ReplacementPolicy::Fifo => resident.iter().min_by_key(|(_, e)| e.loaded_at),
            ReplacementPolicy::Lru => resident.iter().min_by_key(|(_, e)| e.last_used),
            ReplacementPolicy::Mru => resident.iter().max_by_key(|(_, e)| e.last_used),
            ReplacementPolicy::Lfu => resident
                .iter()
                .min_by_key(|(_, e)| (e.access_count, e.last_used)),
            // Highest count wins, oldest use breaks the tie.
            ReplacementPolicy::Mfu => resident.iter().min_by(|(_, a), (_, b)| {
                b.access_count
                    .cmp(&a.access_count)
                    .then(a.last_used.cmp(&b.last_used))
            }),
            ReplacementPolicy::Optimal => return optimal(resident, future),
        };

        victim.map(|&(page, _)| page)
    }
}

fn optimal(resident: &[(PageNumber, PageTableEntry)], future: &[PageNumber]) -> Option<PageNumber> {
    let mut farthest: Option<(usize, PageNumber)> = None;

    for &(page, _) in resident {
        let Some(next_use) = future.iter().position(|&p| p == page) else {
            return Some(page);
        };
        if farthest.map_or(true, |(distance, _)| next_use > distance) {
            farthest = Some((next_use, page));
        }
    }

    farthest.map(|(_, page)| page)
}

impl fmt::Display for ReplacementPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ReplacementPolicy {
    type Err = VmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReplacementPolicy::VARIANTS
            .into_iter()
            .find(|policy| policy.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                VmError::validation(
                    "policy",
                    format!(
                        "unknown policy {s:?}, expected FIFO, LRU, OPTIMAL, LFU, MRU, MFU or ALL"
                    ),
                )
            })
    }
}
