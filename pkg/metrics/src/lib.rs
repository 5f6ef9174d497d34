use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonically increasing counter.
pub struct Counter {
    name: &'static str,
    help: &'static str,
    value: AtomicU64,
}

impl Counter {
    const fn new(name: &'static str, help: &'static str) -> Self {
        Self {
            name,
            help,
            value: AtomicU64::new(0),
        }
    }

    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }

    fn render_into(&self, output: &mut String) {
        let _ = writeln!(output, "# HELP {} {}", self.name, self.help);
        let _ = writeln!(output, "# TYPE {} counter", self.name);
        let _ = writeln!(output, "{} {}", self.name, self.get());
    }
}

/// Admission counters, rendered in Prometheus text exposition format.
pub struct AdmissionMetrics {
    pub requests: Counter,
    pub patched: Counter,
    pub no_target: Counter,
    pub errors: Counter,
    pub placed_in_cluster: Counter,
    pub placed_from_catalog: Counter,
}

impl AdmissionMetrics {
    pub fn new() -> Self {
        Self {
            requests: Counter::new(
                "ultron_admission_requests_total",
                "Admission reviews received",
            ),
            patched: Counter::new(
                "ultron_admission_patched_total",
                "Admission reviews answered with a nodeSelector patch",
            ),
            no_target: Counter::new(
                "ultron_admission_no_target_total",
                "Pods admitted unchanged because no placement target fits",
            ),
            errors: Counter::new(
                "ultron_admission_errors_total",
                "Admission reviews that failed with an error response",
            ),
            placed_in_cluster: Counter::new(
                "ultron_placement_cluster_total",
                "Pods placed on an existing cluster node",
            ),
            placed_from_catalog: Counter::new(
                "ultron_placement_catalog_total",
                "Pods placed on a catalog compute configuration",
            ),
        }
    }

    fn counters(&self) -> [&Counter; 6] {
        [
            &self.requests,
            &self.patched,
            &self.no_target,
            &self.errors,
            &self.placed_in_cluster,
            &self.placed_from_catalog,
        ]
    }

    /// Render all counters in Prometheus text exposition format.
    pub fn render(&self) -> String {
        let mut output = String::new();
        for counter in self.counters() {
            counter.render_into(&mut output);
        }
        output
    }
}

impl Default for AdmissionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_all_counters_at_zero() {
        let metrics = AdmissionMetrics::new();
        let text = metrics.render();
        assert!(text.contains("# TYPE ultron_admission_requests_total counter"));
        assert!(text.contains("ultron_placement_catalog_total 0"));
        assert_eq!(text.lines().count(), 18);
    }

    #[test]
    fn increments_are_visible_in_render() {
        let metrics = AdmissionMetrics::new();
        metrics.requests.inc();
        metrics.requests.inc();
        metrics.patched.inc();
        assert_eq!(metrics.requests.get(), 2);
        let text = metrics.render();
        assert!(text.contains("ultron_admission_requests_total 2\n"));
        assert!(text.contains("ultron_admission_patched_total 1\n"));
        assert!(text.contains("ultron_admission_errors_total 0\n"));
    }
}
