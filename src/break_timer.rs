use crate::break_queue::BreakEvent;
use crate::models::BreakConfig;

/// One recurring break: its configuration plus the live countdown to the next fire.
#[derive(Debug, Clone)]
pub struct BreakTimer {
    config: BreakConfig,
    remaining: i64,
}

impl BreakTimer {
    pub fn new(config: BreakConfig) -> Self {
        let remaining = config.interval_seconds();
        Self { config, remaining }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &BreakConfig {
        &self.config
    }

    pub fn remaining(&self) -> i64 {
        self.remaining
    }

    pub fn interval_seconds(&self) -> i64 {
        self.config.interval_seconds()
    }

    pub fn duration_seconds(&self) -> i64 {
        self.config.duration_seconds()
    }

    /// Counts down one second. Returns true once the countdown has run out.
    pub fn tick(&mut self) -> bool {
        self.remaining = self.remaining.saturating_sub(1);
        self.remaining <= 0
    }

    pub fn reset(&mut self) {
        self.remaining = self.interval_seconds();
    }

    pub fn snapshot(&self) -> BreakEvent {
        BreakEvent::from_config(&self.config)
    }

    pub fn reconfigure(&mut self, config: BreakConfig) {
        self.config = config;
        self.remaining = self.remaining.min(self.interval_seconds());
    }
}
