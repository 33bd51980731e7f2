use log::debug;
use serde::Serialize;

use crate::error::{Result, VmError};
use crate::frame_store::FrameStore;
use crate::page_replacer::{PageEvent, ReplacementPolicy};
use crate::simulation::SimulationConfig;
use crate::tlb::Tlb;
use crate::{FrameIndex, PageNumber};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepEvent {
    Hit,
    Fault,
}

/// One line of the simulation trace.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StepRecord {
    /// 1-based position in the reference stream.
    pub step: usize,
    pub page: PageNumber,
    /// Frame contents after this step.
    pub memory: Vec<Option<PageNumber>>,
    pub event: StepEvent,
    pub action: String,
}

/// State owned by a single simulation run: frames, TLB and the active policy.
#[derive(Debug)]
pub struct Mmu {
    frames: FrameStore,
    tlb: Tlb,
    policy: ReplacementPolicy,
    page_size: usize,
}

impl Mmu {
    pub fn new(config: &SimulationConfig) -> Self {
        Mmu {
            frames: FrameStore::new(config.organization, config.frame_count, config.directory_span),
            tlb: Tlb::new(config.tlb_size, config.tlb_policy),
            policy: config.policy,
            page_size: config.page_size,
        }
    }

    pub fn frames(&self) -> &FrameStore {
        &self.frames
    }

    pub fn tlb(&self) -> &Tlb {
        &self.tlb
    }

    /// Processes the reference at 0-based `step`. `future` holds every
    /// reference after it.
    pub fn access(
        &mut self,
        step: usize,
        page_number: PageNumber,
        future: &[PageNumber],
    ) -> Result<StepRecord> {
        self.tlb.touch(page_number);

        let (event, action) = match self.frames.entry_mut(page_number) {
            Some(entry) => {
                debug!(
                    "mmu: step {} page {} hit (frame {})",
                    step + 1,
                    page_number,
                    entry.frame_index
                );
                self.policy.page_event(entry, PageEvent::Touched(step));
                (StepEvent::Hit, String::new())
            }
            None => {
                debug!("mmu: step {} page {} fault", step + 1, page_number);
                (StepEvent::Fault, self.handle_page_fault(step, page_number, future)?)
            }
        };

        Ok(StepRecord {
            step: step + 1,
            page: page_number,
            memory: self.frames.snapshot(),
            event,
            action,
        })
    }

    /// Brings `page_number` in, evicting a victim if every frame is taken.
    /// Returns the trace action.
    fn handle_page_fault(
        &mut self,
        step: usize,
        page_number: PageNumber,
        future: &[PageNumber],
    ) -> Result<String> {
        if let Some(frame_idx) = self.frames.free_frame() {
            self.frames.load(page_number, frame_idx, step)?;
            return Ok(format!("Loaded to frame {frame_idx}"));
        }

        let victim = self
            .policy
            .pick_replacement_page(&self.frames.resident(), future)
            .ok_or(VmError::NoVictim)?;

        let frame_idx = self.frames.evict(victim)?;
        debug!(
            "mmu: {} evicts page {} from frame {} for page {}",
            self.policy, victim, frame_idx, page_number
        );
        self.frames.load(page_number, frame_idx, step)?;

        Ok(format!("Replaced page {victim} (frame {frame_idx})"))
    }

    /// Maps a virtual address to a physical one if its page is resident.
    ///
    /// `page = address / page_size`, `offset = address % page_size`, and the
    /// result is `frame * page_size + offset`. Never faults a page in.
    pub fn translate_addr(&self, address: usize) -> Option<usize> {
        let page_number = address / self.page_size;
        let page_offset = address % self.page_size;

        let frame_idx: FrameIndex = self.frames.entry(page_number)?.frame_index;

        Some(frame_idx * self.page_size + page_offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page_table::Organization;

    fn mmu(frame_count: usize, policy: ReplacementPolicy) -> Mmu {
        Mmu::new(&SimulationConfig {
            frame_count,
            policy,
            ..SimulationConfig::default()
        })
    }

    #[test]
    fn test_fault_then_hit() {
        let mut mmu = mmu(2, ReplacementPolicy::Lru);

        let first = mmu.access(0, 5, &[5]).unwrap();
        assert_eq!(first.event, StepEvent::Fault);
        assert_eq!(first.action, "Loaded to frame 0");
        assert_eq!(first.memory, vec![Some(5), None]);
        assert_eq!(first.step, 1);

        let second = mmu.access(1, 5, &[]).unwrap();
        assert_eq!(second.event, StepEvent::Hit);
        assert_eq!(second.action, "");
        assert_eq!(mmu.frames().entry(5).map(|e| (e.access_count, e.last_used)), Some((2, 1)));
    }

    #[test]
    fn test_replacement_reuses_victim_frame() {
        let mut mmu = mmu(2, ReplacementPolicy::Fifo);
        mmu.access(0, 1, &[]).unwrap();
        mmu.access(1, 2, &[]).unwrap();

        let record = mmu.access(2, 3, &[]).unwrap();
        assert_eq!(record.action, "Replaced page 1 (frame 0)");
        assert_eq!(record.memory, vec![Some(3), Some(2)]);
        assert_eq!(mmu.frames().entry(3).map(|e| e.loaded_at), Some(2));
    }

    #[test]
    fn test_tlb_counts_are_independent() {
        let mut mmu = Mmu::new(&SimulationConfig {
            frame_count: 1,
            tlb_size: 2,
            ..SimulationConfig::default()
        });
        // 1 is evicted from the single frame but stays in the TLB.
        mmu.access(0, 1, &[]).unwrap();
        mmu.access(1, 2, &[]).unwrap();
        let record = mmu.access(2, 1, &[]).unwrap();

        assert_eq!(record.event, StepEvent::Fault);
        assert_eq!(mmu.tlb().hits(), 1);
        assert_eq!(mmu.tlb().misses(), 2);
    }

    #[test]
    fn test_translate_addr() {
        let mut mmu = Mmu::new(&SimulationConfig {
            frame_count: 4,
            page_size: 1024,
            organization: Organization::Inverted,
            ..SimulationConfig::default()
        });
        mmu.access(0, 0, &[]).unwrap();
        mmu.access(1, 2, &[]).unwrap();

        // Address 2050 is page 2 offset 2; page 2 sits in frame 1.
        assert_eq!(mmu.translate_addr(2050), Some(1024 + 2));
        assert_eq!(mmu.translate_addr(5), Some(5));
        assert_eq!(mmu.translate_addr(3 * 1024), None);
    }
}
