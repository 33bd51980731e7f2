//! Plain-text rendering of simulation results.

use std::fmt;

use vm::page_table::PageTableDump;
use vm::{PageNumber, SimulationResult};

fn format_memory(memory: &[Option<PageNumber>]) -> String {
    let frames: Vec<String> = memory
        .iter()
        .map(|frame| match frame {
            Some(page) => page.to_string(),
            None => "-".to_string(),
        })
        .collect();
    format!("[{}]", frames.join(", "))
}

/// Per-reference trace table.
pub struct StepByStep<'a>(pub &'a SimulationResult);

impl fmt::Display for StepByStep<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<5} | {:<5} | {:<20} | {:<7} | {:<30}",
            "Step", "Page", "Memory", "Event", "Action"
        )?;
        writeln!(f, "{}", "-".repeat(78))?;
        for record in &self.0.history {
            let event = format!("{:?}", record.event).to_uppercase();
            writeln!(
                f,
                "{:<5} | {:<5} | {:<20} | {:<7} | {:<30}",
                record.step,
                record.page,
                format_memory(&record.memory),
                event,
                record.action
            )?;
        }
        Ok(())
    }
}

/// Final counters and ratios of one run.
pub struct Summary<'a>(pub &'a SimulationResult);

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = self.0;
        writeln!(
            f,
            "Algorithm: {}  Organization: {}",
            result.algorithm, result.organization
        )?;
        writeln!(f, "{}", "-".repeat(40))?;
        writeln!(f, "{:<20}: {}", "Total References", result.total_references())?;
        writeln!(f, "{:<20}: {}", "Page Hits", result.total_hits)?;
        writeln!(f, "{:<20}: {}", "Page Faults", result.total_page_faults)?;
        writeln!(f, "{:<20}: {:.2}%", "Hit Ratio", result.hit_ratio * 100.0)?;
        writeln!(f, "{:<20}: {:.2}%", "Fault Ratio", result.fault_ratio * 100.0)?;
        writeln!(
            f,
            "{:<20}: {} / {}",
            "TLB Hits / Misses", result.tlb_hits, result.tlb_misses
        )?;
        writeln!(f, "{:<20}: {:.2}%", "TLB Hit Ratio", result.tlb_hit_ratio * 100.0)?;
        writeln!(
            f,
            "{:<20}: {}",
            "Final Memory State",
            format_memory(&result.final_memory_state)
        )
    }
}

/// Final page table contents, laid out per organization.
pub struct PageTable<'a>(pub &'a PageTableDump);

impl fmt::Display for PageTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            PageTableDump::Single(pages) => {
                writeln!(f, "Page -> Frame")?;
                for (page, frame) in pages {
                    writeln!(f, "{page} -> {frame}")?;
                }
            }
            PageTableDump::Multi(directory) => {
                writeln!(f, "Directory -> (Page -> Frame)")?;
                for (dir, pages) in directory {
                    let entries: Vec<String> =
                        pages.iter().map(|(p, fr)| format!("{p} -> {fr}")).collect();
                    writeln!(f, "{dir} -> {{{}}}", entries.join(", "))?;
                }
            }
            PageTableDump::Inverted(frames) => {
                writeln!(f, "Frame -> Page")?;
                for (frame, page) in frames {
                    writeln!(f, "{frame} -> {page}")?;
                }
            }
        }
        Ok(())
    }
}
