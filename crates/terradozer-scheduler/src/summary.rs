/// Tallies from one call to [`crate::run::run_until_fixed_point`], expressed
/// as data rather than formatted strings so `terradozer-cli` (an external
/// collaborator) owns presentation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DestructionSummary {
    pub deleted: usize,
    pub gone_remote: usize,
    pub permanent_failures: usize,
    pub unresolved_retryable: usize,
    /// Populated only in dry-run mode.
    pub would_delete: usize,
}

impl DestructionSummary {
    /// Total resources accounted for across every bucket. Should equal the
    /// scheduler's original input length (spec §8 invariant 3).
    pub fn total(&self) -> usize {
        self.deleted + self.gone_remote + self.permanent_failures + self.unresolved_retryable + self.would_delete
    }
}
