use terradozer_scheduler::DestructionSummary;

pub fn render(summary: &DestructionSummary, dry_run: bool) -> String {
    if dry_run {
        return format!("would delete: {}", summary.would_delete);
    }

    let mut lines = vec![format!("deleted: {}", summary.deleted + summary.gone_remote)];
    if summary.permanent_failures > 0 {
        lines.push(format!("failed: {}", summary.permanent_failures));
    }
    if summary.unresolved_retryable > 0 {
        lines.push(format!("failed (retries exceeded): {}", summary.unresolved_retryable));
    }
    lines.join(", ")
}
