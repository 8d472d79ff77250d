//! Per-system timing, compiled in with the `profile` feature.
//!
//! `SimulationWorld::run` opens one section per registered system, so the
//! section names are the system names.
//!
//! ```bash
//! cargo test --release --features profile
//! ```

use log::info;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Accumulated timings for named sections.
#[derive(Default)]
pub struct Profiler {
    sections: HashMap<String, SectionStats>,
    open: Option<(String, Instant)>,
    ticks: u64,
}

#[derive(Default, Clone, Debug)]
pub struct SectionStats {
    pub total: Duration,
    pub calls: u64,
    pub worst: Duration,
}

impl SectionStats {
    pub fn mean(&self) -> Duration {
        if self.calls == 0 {
            Duration::ZERO
        } else {
            self.total / self.calls as u32
        }
    }

    fn record(&mut self, elapsed: Duration) {
        self.total += elapsed;
        self.calls += 1;
        self.worst = self.worst.max(elapsed);
    }
}

impl Profiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start timing `name`. An unclosed previous section is discarded.
    pub fn begin_section(&mut self, name: &str) {
        self.open = Some((name.to_owned(), Instant::now()));
    }

    pub fn end_section(&mut self) {
        if let Some((name, start)) = self.open.take() {
            self.sections.entry(name).or_default().record(start.elapsed());
        }
    }

    pub fn tick(&mut self) {
        self.ticks += 1;
    }

    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    pub fn section(&self, name: &str) -> Option<&SectionStats> {
        self.sections.get(name)
    }

    /// Log one line per section, slowest first.
    pub fn log_summary(&self) {
        let mut rows: Vec<_> = self.sections.iter().collect();
        rows.sort_by(|a, b| b.1.total.cmp(&a.1.total));
        info!("profile over {} ticks", self.ticks);
        for (name, stats) in rows {
            info!(
                "  {name:<16} total {:>10.2?}  mean {:>10.2?}  worst {:>10.2?}  calls {}",
                stats.total,
                stats.mean(),
                stats.worst,
                stats.calls
            );
        }
    }

    pub fn reset(&mut self) {
        self.sections.clear();
        self.open = None;
        self.ticks = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_sections_accumulate() {
        let mut profiler = Profiler::new();
        for _ in 0..3 {
            profiler.begin_section("fire");
            sleep(Duration::from_millis(2));
            profiler.end_section();
            profiler.tick();
        }
        let stats = profiler.section("fire").unwrap();
        assert_eq!(stats.calls, 3);
        assert!(stats.total >= Duration::from_millis(6));
        assert!(stats.worst >= stats.mean());
        assert_eq!(profiler.tick_count(), 3);
    }

    #[test]
    fn test_end_without_begin_is_ignored() {
        let mut profiler = Profiler::new();
        profiler.end_section();
        assert!(profiler.section("anything").is_none());
    }
}
