//! Physical frames plus the page table that indexes them.

use crate::error::{Result, VmError};
use crate::page_table::{new_page_table, Organization, PageTable, PageTableDump, PageTableEntry};
use crate::{FrameIndex, PageNumber};

/// Fixed set of frames. Occupied frames and page table entries stay in
/// one-to-one correspondence across every `load` and `evict`.
#[derive(Debug)]
pub struct FrameStore {
    frames: Vec<Option<PageNumber>>,
    page_table: Box<dyn PageTable>,
}

impl FrameStore {
    pub fn new(organization: Organization, frame_count: usize, directory_span: usize) -> Self {
        FrameStore {
            frames: vec![None; frame_count],
            page_table: new_page_table(organization, frame_count, directory_span),
        }
    }

    pub fn resident_count(&self) -> usize {
        self.page_table.len()
    }

    pub fn lookup(&self, page_number: PageNumber) -> bool {
        self.page_table.get(page_number).is_some()
    }

    pub fn entry(&self, page_number: PageNumber) -> Option<&PageTableEntry> {
        self.page_table.get(page_number)
    }

    pub fn entry_mut(&mut self, page_number: PageNumber) -> Option<&mut PageTableEntry> {
        self.page_table.get_mut(page_number)
    }

    /// Lowest-numbered empty frame, if any.
    pub fn free_frame(&self) -> Option<FrameIndex> {
        self.frames.iter().position(Option::is_none)
    }

    /// Places `page_number` in `frame_index` with fresh metadata for `step`.
    pub fn load(
        &mut self,
        page_number: PageNumber,
        frame_index: FrameIndex,
        step: usize,
    ) -> Result<()> {
        let capacity_error = |reason| VmError::Capacity {
            page: page_number,
            frame: frame_index,
            reason,
        };

        let slot = self
            .frames
            .get_mut(frame_index)
            .ok_or_else(|| capacity_error("frame index out of range"))?;

        if slot.is_some() {
            return Err(capacity_error("frame is occupied"));
        }
        if self.page_table.get(page_number).is_some() {
            return Err(capacity_error("page is already resident"));
        }

        *slot = Some(page_number);
        self.page_table
            .set(page_number, PageTableEntry::new(frame_index, step));

        Ok(())
    }

    /// Removes `page_number` and returns the frame it freed.
    pub fn evict(&mut self, page_number: PageNumber) -> Result<FrameIndex> {
        let entry = self
            .page_table
            .remove(page_number)
            .ok_or(VmError::NotFound { page: page_number })?;

        self.frames[entry.frame_index] = None;

        Ok(entry.frame_index)
    }

    /// Resident pages with their metadata, in ascending frame order.
    pub fn resident(&self) -> Vec<(PageNumber, PageTableEntry)> {
        let mut resident = self.page_table.entries();
        resident.sort_by_key(|(_, entry)| entry.frame_index);
        resident
    }

    pub fn snapshot(&self) -> Vec<Option<PageNumber>> {
        self.frames.clone()
    }

    pub fn dump(&self) -> PageTableDump {
        self.page_table.dump()
    }
}
