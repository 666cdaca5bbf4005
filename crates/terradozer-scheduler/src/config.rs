use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    pub parallel: usize,
    pub per_resource_timeout: Duration,
    pub dry_run: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            parallel: 10,
            per_resource_timeout: Duration::from_secs(30),
            dry_run: false,
        }
    }
}
