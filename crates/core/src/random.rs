use rand::Rng;

/// Source of uniformly distributed indices for quote selection.
pub trait IndexSource: Send + Sync {
    /// Returns an index in `0..len`. Callers never pass `len == 0`.
    fn index(&self, len: usize) -> usize;
}

/// Draws from the calling thread's generator, so concurrent handlers never
/// share mutable state.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadRngIndex;

impl IndexSource for ThreadRngIndex {
    fn index(&self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }
}

/// Always picks the same position (wrapped into range). Useful wherever a
/// deterministic pick is needed, tests included.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FixedIndex(pub usize);

impl IndexSource for FixedIndex {
    fn index(&self, len: usize) -> usize {
        self.0 % len
    }
}

#[cfg(test)]
mod tests {
    use super::{FixedIndex, IndexSource, ThreadRngIndex};

    #[test]
    fn thread_rng_index_stays_in_range() {
        let source = ThreadRngIndex;
        for len in [1_usize, 2, 7, 100] {
            for _ in 0..200 {
                assert!(source.index(len) < len);
            }
        }
    }

    #[test]
    fn thread_rng_index_reaches_every_slot() {
        let source = ThreadRngIndex;
        let mut seen = [false; 4];
        for _ in 0..1_000 {
            seen[source.index(4)] = true;
        }
        assert!(seen.iter().all(|hit| *hit), "expected every index to be drawn: {seen:?}");
    }

    #[test]
    fn fixed_index_wraps_into_range() {
        assert_eq!(FixedIndex(0).index(3), 0);
        assert_eq!(FixedIndex(4).index(3), 1);
        assert_eq!(FixedIndex(9).index(1), 0);
    }
}
