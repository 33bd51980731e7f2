use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::VmError;
use crate::{FrameIndex, PageNumber};

/// Bookkeeping kept for every resident page.
///
/// `loaded_at` and `last_used` are 0-based step indices into the reference
/// stream.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PageTableEntry {
    pub frame_index: FrameIndex,
    pub loaded_at: usize,
    pub last_used: usize,
    pub access_count: usize,
}

impl PageTableEntry {
    pub fn new(frame_index: FrameIndex, step: usize) -> Self {
        PageTableEntry {
            frame_index,
            loaded_at: step,
            last_used: step,
            access_count: 1,
        }
    }
}

/// How the page table is laid out in memory.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Organization {
    /// Flat page -> frame map.
    Single,
    /// Page directory indexed by `page / directory_span`, then page -> frame.
    Multi,
    /// One entry per physical frame, with a page -> frame reverse index.
    Inverted,
}

impl Organization {
    pub const VARIANTS: [Organization; 3] =
        [Organization::Single, Organization::Multi, Organization::Inverted];

    pub fn name(&self) -> &'static str {
        match self {
            Organization::Single => "SINGLE",
            Organization::Multi => "MULTI",
            Organization::Inverted => "INVERTED",
        }
    }
}

impl fmt::Display for Organization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Organization {
    type Err = VmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Organization::VARIANTS
            .into_iter()
            .find(|org| org.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                VmError::validation(
                    "organization",
                    format!("unknown organization {s:?}, expected SINGLE, MULTI, INVERTED or ALL"),
                )
            })
    }
}

/// Final page table contents, shaped after the organization that held them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageTableDump {
    /// page -> frame
    Single(BTreeMap<PageNumber, FrameIndex>),
    /// directory -> (page -> frame)
    Multi(BTreeMap<usize, BTreeMap<PageNumber, FrameIndex>>),
    /// frame -> page
    Inverted(BTreeMap<FrameIndex, PageNumber>),
}

/// Page -> entry bookkeeping behind a frame store.
///
/// Implementations only differ in how they index entries. They never decide
/// which page lives where; that is up to the caller.
pub trait PageTable: fmt::Debug {
    fn organization(&self) -> Organization;

    fn get(&self, page_number: PageNumber) -> Option<&PageTableEntry>;

    fn get_mut(&mut self, page_number: PageNumber) -> Option<&mut PageTableEntry>;

    fn set(&mut self, page_number: PageNumber, entry: PageTableEntry);

    fn remove(&mut self, page_number: PageNumber) -> Option<PageTableEntry>;

    /// Every resident page with its entry, in no particular order.
    fn entries(&self) -> Vec<(PageNumber, PageTableEntry)>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn dump(&self) -> PageTableDump;
}

/// Builds an empty table of the requested organization.
pub fn new_page_table(
    organization: Organization,
    frame_count: usize,
    directory_span: usize,
) -> Box<dyn PageTable> {
    match organization {
        Organization::Single => Box::new(SingleLevelPageTable::new()),
        Organization::Multi => Box::new(MultiLevelPageTable::new(directory_span)),
        Organization::Inverted => Box::new(InvertedPageTable::new(frame_count)),
    }
}

#[derive(Debug, Default)]
pub struct SingleLevelPageTable {
    table: HashMap<PageNumber, PageTableEntry>,
}

impl SingleLevelPageTable {
    pub fn new() -> Self {
        SingleLevelPageTable {
            table: HashMap::new(),
        }
    }
}

impl PageTable for SingleLevelPageTable {
    fn organization(&self) -> Organization {
        Organization::Single
    }

    fn get(&self, page_number: PageNumber) -> Option<&PageTableEntry> {
        self.table.get(&page_number)
    }

    fn get_mut(&mut self, page_number: PageNumber) -> Option<&mut PageTableEntry> {
        self.table.get_mut(&page_number)
    }

    fn set(&mut self, page_number: PageNumber, entry: PageTableEntry) {
        self.table.insert(page_number, entry);
    }

    fn remove(&mut self, page_number: PageNumber) -> Option<PageTableEntry> {
        self.table.remove(&page_number)
    }

    fn entries(&self) -> Vec<(PageNumber, PageTableEntry)> {
        self.table.iter().map(|(&page, &entry)| (page, entry)).collect()
    }

    fn len(&self) -> usize {
        self.table.len()
    }

    fn dump(&self) -> PageTableDump {
        PageTableDump::Single(
            self.table
                .iter()
                .map(|(&page, entry)| (page, entry.frame_index))
                .collect(),
        )
    }
}

#[derive(Debug)]
pub struct MultiLevelPageTable {
    directory_span: usize,
    directory: HashMap<usize, HashMap<PageNumber, PageTableEntry>>,
    len: usize,
}

impl MultiLevelPageTable {
    pub fn new(directory_span: usize) -> Self {
        MultiLevelPageTable {
            // A zero span would divide by zero; config validation rejects it
            // before we get here.
            directory_span: directory_span.max(1),
            directory: HashMap::new(),
            len: 0,
        }
    }

    fn directory_index(&self, page_number: PageNumber) -> usize {
        page_number / self.directory_span
    }
}

impl PageTable for MultiLevelPageTable {
    fn organization(&self) -> Organization {
        Organization::Multi
    }

    fn get(&self, page_number: PageNumber) -> Option<&PageTableEntry> {
        self.directory
            .get(&self.directory_index(page_number))
            .and_then(|second| second.get(&page_number))
    }

    fn get_mut(&mut self, page_number: PageNumber) -> Option<&mut PageTableEntry> {
        let dir = self.directory_index(page_number);
        self.directory
            .get_mut(&dir)
            .and_then(|second| second.get_mut(&page_number))
    }

    fn set(&mut self, page_number: PageNumber, entry: PageTableEntry) {
        let dir = self.directory_index(page_number);
        let previous = self
            .directory
            .entry(dir)
            .or_default()
            .insert(page_number, entry);

        if previous.is_none() {
            self.len += 1;
        }
    }

    fn remove(&mut self, page_number: PageNumber) -> Option<PageTableEntry> {
        let dir = self.directory_index(page_number);
        let second = self.directory.get_mut(&dir)?;
        let removed = second.remove(&page_number)?;

        if second.is_empty() {
            self.directory.remove(&dir);
        }
        self.len -= 1;

        Some(removed)
    }

    fn entries(&self) -> Vec<(PageNumber, PageTableEntry)> {
        self.directory
            .values()
            .flat_map(|second| second.iter().map(|(&page, &entry)| (page, entry)))
            .collect()
    }

    fn len(&self) -> usize {
        self.len
    }

    fn dump(&self) -> PageTableDump {
        PageTableDump::Multi(
            self.directory
                .iter()
                .map(|(&dir, second)| {
                    let pages = second
                        .iter()
                        .map(|(&page, entry)| (page, entry.frame_index))
                        .collect();
                    (dir, pages)
                })
                .collect(),
        )
    }
}

#[derive(Debug)]
pub struct InvertedPageTable {
    /// Indexed by frame.
    frames: Vec<Option<(PageNumber, PageTableEntry)>>,
    reverse: HashMap<PageNumber, FrameIndex>,
}

impl InvertedPageTable {
    pub fn new(frame_count: usize) -> Self {
        InvertedPageTable {
            frames: vec![None; frame_count],
            reverse: HashMap::with_capacity(frame_count),
        }
    }
}

impl PageTable for InvertedPageTable {
    fn organization(&self) -> Organization {
        Organization::Inverted
    }

    fn get(&self, page_number: PageNumber) -> Option<&PageTableEntry> {
        let frame = *self.reverse.get(&page_number)?;
        self.frames[frame].as_ref().map(|(_, entry)| entry)
    }

    fn get_mut(&mut self, page_number: PageNumber) -> Option<&mut PageTableEntry> {
        let frame = *self.reverse.get(&page_number)?;
        self.frames[frame].as_mut().map(|(_, entry)| entry)
    }

    fn set(&mut self, page_number: PageNumber, entry: PageTableEntry) {
        if let Some(old_frame) = self.reverse.insert(page_number, entry.frame_index) {
            self.frames[old_frame] = None;
        }
        if entry.frame_index >= self.frames.len() {
            self.frames.resize(entry.frame_index + 1, None);
        }
        if let Some((displaced, _)) = self.frames[entry.frame_index].replace((page_number, entry)) {
            if displaced != page_number {
                self.reverse.remove(&displaced);
            }
        }
    }

    fn remove(&mut self, page_number: PageNumber) -> Option<PageTableEntry> {
        let frame = self.reverse.remove(&page_number)?;
        self.frames[frame].take().map(|(_, entry)| entry)
    }

    fn entries(&self) -> Vec<(PageNumber, PageTableEntry)> {
        self.frames.iter().flatten().copied().collect()
    }

    fn len(&self) -> usize {
        self.reverse.len()
    }

    fn dump(&self) -> PageTableDump {
        PageTableDump::Inverted(
            self.frames
                .iter()
                .enumerate()
                .filter_map(|(frame, slot)| slot.map(|(page, _)| (frame, page)))
                .collect(),
        )
    }
}
