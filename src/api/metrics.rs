// In-process request metrics (C7), exposed as Prometheus text exposition
// format. Deliberately minimal: total/success/failure counters, tracked
// before any percentile/histogram work is warranted.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub struct Metrics {
    total_requests: AtomicU64,
    successful_requests: AtomicU64,
    failed_requests: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, is_success: bool) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        if is_success {
            self.successful_requests.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed_requests.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn render_prometheus(&self) -> String {
        format!(
            "# HELP zflow_requests_total Total HTTP requests handled.\n\
             # TYPE zflow_requests_total counter\n\
             zflow_requests_total {}\n\
             # HELP zflow_requests_successful_total HTTP requests with a 2xx/3xx response.\n\
             # TYPE zflow_requests_successful_total counter\n\
             zflow_requests_successful_total {}\n\
             # HELP zflow_requests_failed_total HTTP requests with a 4xx/5xx response.\n\
             # TYPE zflow_requests_failed_total counter\n\
             zflow_requests_failed_total {}\n",
            self.total_requests.load(Ordering::Relaxed),
            self.successful_requests.load(Ordering::Relaxed),
            self.failed_requests.load(Ordering::Relaxed),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_successes_and_failures_separately() {
        let metrics = Metrics::new();
        metrics.record(true);
        metrics.record(true);
        metrics.record(false);
        let rendered = metrics.render_prometheus();
        assert!(rendered.contains("zflow_requests_total 3"));
        assert!(rendered.contains("zflow_requests_successful_total 2"));
        assert!(rendered.contains("zflow_requests_failed_total 1"));
    }
}
