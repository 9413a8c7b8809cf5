//! Decision counters for gate observability

use std::sync::atomic::{AtomicU64, Ordering};

use crate::observe::{DecisionEvent, DecisionEventKind, DecisionObserver};

/// Point-in-time copy of [`GateMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GateMetricsSnapshot {
    pub pass_through: u64,
    pub filters_applied: u64,
    pub filters_skipped: u64,
    pub granted: u64,
    pub rejected: u64,
    pub errors: u64,
}

impl GateMetricsSnapshot {
    /// Gate invocations that reached a terminal outcome
    pub fn total_decisions(&self) -> u64 {
        self.pass_through + self.granted + self.rejected + self.errors
    }

    /// Share of evaluated calls that were rejected
    pub fn rejection_rate(&self) -> f64 {
        let evaluated = self.granted + self.rejected;
        if evaluated == 0 {
            0.0
        } else {
            self.rejected as f64 / evaluated as f64
        }
    }
}

/// Lock-free counters fed by decision events
#[derive(Debug, Default)]
pub struct GateMetrics {
    pass_through: AtomicU64,
    filters_applied: AtomicU64,
    filters_skipped: AtomicU64,
    granted: AtomicU64,
    rejected: AtomicU64,
    errors: AtomicU64,
}

impl GateMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> GateMetricsSnapshot {
        GateMetricsSnapshot {
            pass_through: self.pass_through.load(Ordering::Relaxed),
            filters_applied: self.filters_applied.load(Ordering::Relaxed),
            filters_skipped: self.filters_skipped.load(Ordering::Relaxed),
            granted: self.granted.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters
    pub fn reset(&self) {
        for counter in [
            &self.pass_through,
            &self.filters_applied,
            &self.filters_skipped,
            &self.granted,
            &self.rejected,
            &self.errors,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }

    /// Export counters in Prometheus text format
    pub fn export_prometheus(&self) -> String {
        let m = self.snapshot();

        format!(
            r#"# HELP postauthz_pass_through_total Calls without a post-invocation attribute
# TYPE postauthz_pass_through_total counter
postauthz_pass_through_total {}

# HELP postauthz_filters_applied_total PostFilter expressions applied
# TYPE postauthz_filters_applied_total counter
postauthz_filters_applied_total {}

# HELP postauthz_filters_skipped_total PostFilter skipped on null return
# TYPE postauthz_filters_skipped_total counter
postauthz_filters_skipped_total {}

# HELP postauthz_granted_total Calls released after expression evaluation
# TYPE postauthz_granted_total counter
postauthz_granted_total {}

# HELP postauthz_rejected_total Calls rejected by PostAuthorize
# TYPE postauthz_rejected_total counter
postauthz_rejected_total {}

# HELP postauthz_errors_total Expression handler failures
# TYPE postauthz_errors_total counter
postauthz_errors_total {}
"#,
            m.pass_through, m.filters_applied, m.filters_skipped, m.granted, m.rejected, m.errors,
        )
    }
}

impl DecisionObserver for GateMetrics {
    fn on_event(&self, event: &DecisionEvent) {
        let counter = match event.kind {
            DecisionEventKind::PassThrough => &self.pass_through,
            DecisionEventKind::FilterApplied { .. } => &self.filters_applied,
            DecisionEventKind::FilterSkippedNullReturn { .. } => &self.filters_skipped,
            DecisionEventKind::AccessGranted => &self.granted,
            DecisionEventKind::AccessRejected { .. } => &self.rejected,
            DecisionEventKind::EvaluationFailed { .. } => &self.errors,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::Expression;

    fn event(kind: DecisionEventKind) -> DecisionEvent {
        DecisionEvent::new("alice", "method A.b", kind)
    }

    #[test]
    fn test_counts_each_kind() {
        let metrics = GateMetrics::new();
        metrics.on_event(&event(DecisionEventKind::PassThrough));
        metrics.on_event(&event(DecisionEventKind::FilterApplied {
            expression: Expression::new("true"),
        }));
        metrics.on_event(&event(DecisionEventKind::AccessGranted));
        metrics.on_event(&event(DecisionEventKind::AccessRejected {
            expression: Expression::new("false"),
        }));

        let m = metrics.snapshot();
        assert_eq!(m.pass_through, 1);
        assert_eq!(m.filters_applied, 1);
        assert_eq!(m.granted, 1);
        assert_eq!(m.rejected, 1);
        assert_eq!(m.total_decisions(), 3);
        assert!((m.rejection_rate() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_reset() {
        let metrics = GateMetrics::new();
        metrics.on_event(&event(DecisionEventKind::AccessGranted));
        metrics.reset();
        assert_eq!(metrics.snapshot(), GateMetricsSnapshot::default());
    }

    #[test]
    fn test_prometheus_export() {
        let metrics = GateMetrics::new();
        metrics.on_event(&event(DecisionEventKind::AccessRejected {
            expression: Expression::new("false"),
        }));

        let text = metrics.export_prometheus();
        assert!(text.contains("postauthz_rejected_total 1"));
        assert!(text.contains("postauthz_granted_total 0"));
    }
}
