use anyhow::{ensure, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use vm::PageNumber;

/// Draws `count` page numbers uniformly from `0..max_page`.
pub fn generate_memory_requests(
    count: usize,
    max_page: usize,
    seed: Option<u64>,
) -> Result<Vec<PageNumber>> {
    ensure!(max_page > 0, "--max-page must be greater than zero");

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    Ok((0..count).map(|_| rng.gen_range(0..max_page)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_pages_in_range() {
        let pages = generate_memory_requests(200, 7, Some(1)).unwrap();
        assert_eq!(pages.len(), 200);
        assert!(pages.iter().all(|&p| p < 7));
    }

    #[test]
    fn test_seed_is_reproducible() {
        let a = generate_memory_requests(50, 10, Some(42)).unwrap();
        let b = generate_memory_requests(50, 10, Some(42)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_zero_max_page_rejected() {
        assert!(generate_memory_requests(5, 0, None).is_err());
    }
}
