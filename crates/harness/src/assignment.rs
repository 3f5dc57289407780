//! Distribution of submission attempts over workers.

/// Attempt counts per worker, fixed before the run starts.
///
/// Attempts are dealt round-robin by index modulo worker count, so the
/// counts differ by at most one and always sum to the requested total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkAssignment {
    counts: Vec<usize>,
}

impl WorkAssignment {
    /// Distributes `total_submissions` over `thread_count` workers.
    ///
    /// Callers validate the parameters first; a zero worker count here is
    /// a programming error.
    pub fn new(total_submissions: usize, thread_count: usize) -> Self {
        debug_assert!(thread_count > 0);
        let mut counts = vec![0usize; thread_count];
        for i in 0..total_submissions {
            counts[i % thread_count] += 1;
        }
        Self { counts }
    }

    /// Attempts assigned to one worker.
    pub fn count_for(&self, worker: usize) -> usize {
        self.counts[worker]
    }

    pub fn worker_count(&self) -> usize {
        self.counts.len()
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_sum_to_total() {
        let assignment = WorkAssignment::new(321, 8);
        assert_eq!(assignment.total(), 321);
        assert_eq!(assignment.worker_count(), 8);
    }

    #[test]
    fn counts_are_balanced() {
        let assignment = WorkAssignment::new(321, 8);
        let max = (0..8).map(|w| assignment.count_for(w)).max().unwrap();
        let min = (0..8).map(|w| assignment.count_for(w)).min().unwrap();
        assert!(max - min <= 1);
    }

    #[test]
    fn remainder_lands_on_low_indices() {
        // 10 over 4 workers: the first two get the extra attempt.
        let assignment = WorkAssignment::new(10, 4);
        assert_eq!(assignment.count_for(0), 3);
        assert_eq!(assignment.count_for(1), 3);
        assert_eq!(assignment.count_for(2), 2);
        assert_eq!(assignment.count_for(3), 2);
    }

    #[test]
    fn single_worker_takes_everything() {
        let assignment = WorkAssignment::new(321, 1);
        assert_eq!(assignment.count_for(0), 321);
    }

    #[test]
    fn even_split_leaves_no_remainder() {
        let assignment = WorkAssignment::new(320, 8);
        for w in 0..8 {
            assert_eq!(assignment.count_for(w), 40);
        }
    }
}
