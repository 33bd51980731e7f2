mod reference;
mod report;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser as ClapParser;
use log::info;
use vm::{
    simulate_with_mmu, Organization, ReplacementPolicy, Selection, SimulationConfig,
    SimulationRequest, SimulationResult, TlbPolicy,
};

/// Page replacement simulator
#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Reference string, comma or space separated
    #[arg(short, long, conflicts_with_all = ["random", "request"])]
    refs: Option<String>,

    /// Generate this many uniformly random references instead
    #[arg(long, conflicts_with = "request")]
    random: Option<usize>,

    /// Upper bound (exclusive) for generated page numbers
    #[arg(long, default_value = "10")]
    max_page: usize,

    /// Seed for --random
    #[arg(long)]
    seed: Option<u64>,

    /// Read a JSON simulation request from this file
    #[arg(long)]
    request: Option<PathBuf>,

    /// Read the base configuration from this JSON file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of physical frames
    #[arg(short, long)]
    frames: Option<usize>,

    /// FIFO, LRU, OPTIMAL, LFU, MRU, MFU or ALL
    #[arg(short, long)]
    policy: Option<String>,

    /// SINGLE, MULTI, INVERTED or ALL
    #[arg(short, long)]
    organization: Option<String>,

    /// TLB entries (0 disables the TLB)
    #[arg(short, long)]
    tlb_size: Option<usize>,

    /// TLB eviction order: FIFO or LRU
    #[arg(long)]
    tlb_policy: Option<String>,

    /// Pages per second-level table in the multi-level organization
    #[arg(long)]
    directory_span: Option<usize>,

    /// Page size in bytes, used by --translate
    #[arg(long)]
    page_size: Option<usize>,

    /// Virtual addresses to translate against the final frame contents
    #[arg(long, value_delimiter = ',')]
    translate: Vec<usize>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

impl Args {
    fn base_config(&self) -> Result<SimulationConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config {}", path.display()))?;
                serde_json::from_str::<SimulationConfig>(&text)
                    .with_context(|| format!("Invalid config {}", path.display()))?
            }
            None => SimulationConfig::default(),
        };

        if let Some(frames) = self.frames {
            config.frame_count = frames;
        }
        if let Some(tlb_size) = self.tlb_size {
            config.tlb_size = tlb_size;
        }
        if let Some(tlb_policy) = &self.tlb_policy {
            config.tlb_policy = tlb_policy.parse::<TlbPolicy>()?;
        }
        if let Some(span) = self.directory_span {
            config.directory_span = span;
        }
        if let Some(page_size) = self.page_size {
            config.page_size = page_size;
        }

        config.validate()?;
        Ok(config)
    }

    fn policies(&self, config: &SimulationConfig) -> Result<Selection<ReplacementPolicy>> {
        Ok(match &self.policy {
            Some(name) => name.parse::<Selection<ReplacementPolicy>>()?,
            None => Selection::Only(config.policy),
        })
    }

    fn organizations(&self, config: &SimulationConfig) -> Result<Selection<Organization>> {
        Ok(match &self.organization {
            Some(name) => name.parse::<Selection<Organization>>()?,
            None => Selection::Only(config.organization),
        })
    }

    fn reference(&self) -> Result<Vec<vm::PageNumber>> {
        if let Some(refs) = &self.refs {
            return Ok(vm::parse_reference_string(refs)?);
        }
        if let Some(count) = self.random {
            let pages = reference::generate_memory_requests(count, self.max_page, self.seed)?;
            info!("generated {} references: {:?}", pages.len(), pages);
            return Ok(pages);
        }
        bail!("No reference string given; use --refs, --random or --request")
    }
}

fn run(args: &Args) -> Result<Vec<SimulationResult>> {
    let base = args.base_config()?;

    if let Some(path) = &args.request {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read request {}", path.display()))?;
        let request: SimulationRequest = serde_json::from_str(&text)
            .with_context(|| format!("Invalid request {}", path.display()))?;
        return Ok(request.execute(&base)?);
    }

    let reference = args.reference()?;
    let policies = args.policies(&base)?;
    let organizations = args.organizations(&base)?;

    let mut results = Vec::new();
    for organization in organizations.expand() {
        for policy in policies.expand() {
            let config = SimulationConfig {
                policy,
                organization,
                ..base.clone()
            };
            let (result, mmu) = simulate_with_mmu(&reference, &config)?;

            for &address in &args.translate {
                match mmu.translate_addr(address) {
                    Some(physical) => info!(
                        "{}/{}: virtual {:#06X} -> physical {:#06X}",
                        organization, policy, address, physical
                    ),
                    None => info!("{organization}/{policy}: virtual {address:#06X} -> page fault"),
                }
            }
            results.push(result);
        }
    }

    Ok(results)
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let results = run(&args)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    for result in &results {
        println!("\n{}", "=".repeat(50));
        println!("{} / {}", result.organization, result.algorithm);
        println!("{}", "=".repeat(50));
        print!("{}", report::StepByStep(result));
        println!();
        print!("{}", report::Summary(result));
        println!();
        print!("{}", report::PageTable(&result.page_table));
    }

    Ok(())
}
