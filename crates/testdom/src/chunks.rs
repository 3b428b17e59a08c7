//! Deterministic and seeded chunk plans for streaming-equivalence tests.
//!
//! A plan is a set of byte offsets at which the input splits; fuzz plans are
//! seeded so CI failures reproduce.

#[derive(Clone, Debug)]
pub struct ChunkPlan {
    /// Sorted interior split offsets.
    boundaries: Vec<usize>,
    pub label: String,
}

impl ChunkPlan {
    pub fn fixed(size: usize, len: usize) -> Self {
        let boundaries = (1..)
            .map(|i| i * size)
            .take_while(|&b| b < len)
            .collect();
        Self {
            boundaries,
            label: format!("fixed size={size}"),
        }
    }

    pub fn at(boundaries: Vec<usize>, label: String) -> Self {
        Self { boundaries, label }
    }

    /// Split `input` into the chunks this plan describes.
    pub fn apply<'a>(&self, input: &'a [u8]) -> Vec<&'a [u8]> {
        let mut out = Vec::with_capacity(self.boundaries.len() + 1);
        let mut start = 0;
        for &b in &self.boundaries {
            if b <= start || b >= input.len() {
                continue;
            }
            out.push(&input[start..b]);
            start = b;
        }
        out.push(&input[start..]);
        out
    }
}

/// Byte offsets around markup structure: `<`, `>`, quotes, `&` and `;` are
/// where resumable-tokenizer bugs hide.
fn structural_boundaries(input: &[u8]) -> Vec<usize> {
    let mut out = Vec::new();
    for (i, &b) in input.iter().enumerate() {
        if matches!(b, b'<' | b'>' | b'"' | b'\'' | b'&' | b';') {
            if i > 0 {
                out.push(i);
            }
            if i + 1 < input.len() {
                out.push(i + 1);
            }
        }
    }
    out.sort_unstable();
    out.dedup();
    out
}

/// Build a set of plans covering fixed sizes, structural splits and seeded
/// random boundary picks.
pub fn build_plans(input: &[u8], fuzz_runs: usize, fuzz_seed: u64) -> Vec<ChunkPlan> {
    let mut plans = Vec::new();
    for size in [1usize, 2, 3, 4, 7, 16, 64] {
        if size < input.len() {
            plans.push(ChunkPlan::fixed(size, input.len()));
        }
    }

    let structural = structural_boundaries(input);
    if !structural.is_empty() {
        plans.push(ChunkPlan::at(
            structural.clone(),
            format!("structural count={}", structural.len()),
        ));
    }

    let mut candidates: Vec<usize> = (1..input.len()).collect();
    for run in 0..fuzz_runs {
        let seed = fuzz_seed.wrapping_add(run as u64);
        let mut rng = Lcg::new(seed);
        rng.shuffle(&mut candidates);
        let count = 1 + rng.gen_range(candidates.len().clamp(1, 24));
        let mut picks: Vec<usize> = candidates.iter().copied().take(count).collect();
        picks.sort_unstable();
        picks.dedup();
        plans.push(ChunkPlan::at(picks, format!("fuzz seed=0x{seed:016x}")));
    }
    plans
}

struct Lcg {
    state: u64,
}

impl Lcg {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1);
        self.state
    }

    fn gen_range(&mut self, upper: usize) -> usize {
        if upper == 0 {
            return 0;
        }
        (self.next_u64() >> 32) as usize % upper
    }

    fn shuffle<T>(&mut self, items: &mut [T]) {
        if items.len() < 2 {
            return;
        }
        for i in (1..items.len()).rev() {
            let j = self.gen_range(i + 1);
            items.swap(i, j);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunks_concatenate_back_to_the_input() {
        let input = b"<p class=\"x\">a &amp; b</p>";
        for plan in build_plans(input, 8, 0x5eed) {
            let chunks = plan.apply(input);
            let total: Vec<u8> = chunks.concat();
            assert_eq!(total, input, "plan {} lost bytes", plan.label);
            assert!(
                chunks.iter().all(|c| !c.is_empty()),
                "plan {} produced an empty chunk",
                plan.label
            );
        }
    }

    #[test]
    fn fuzz_plans_are_reproducible() {
        let input = b"<div>content</div>";
        let a = build_plans(input, 4, 42);
        let b = build_plans(input, 4, 42);
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.boundaries, y.boundaries);
        }
    }
}
