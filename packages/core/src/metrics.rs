//! Prometheus metrics registry for the kiosk alert service.
//!
//! [`AppMetrics`] owns all registered metrics and the [`Registry`] they
//! belong to. Construct it once at startup, wrap in `Arc`, and hand it to
//! the pipeline.
//!
//! Exposed at `GET /metrics` in Prometheus text exposition format
//! (`text/plain; version=0.0.4`).

use prometheus::{Counter, CounterVec, Opts, Registry};

/// All application-level Prometheus metrics.
pub struct AppMetrics {
    /// Triggers received, labelled by path ("level" / "refund").
    pub triggers_total: CounterVec,
    /// Triggers dropped before evaluation, labelled by reason.
    pub rejected_triggers_total: CounterVec,
    /// Threshold crossings detected, labelled by resource and severity.
    pub alerts_emitted_total: CounterVec,
    /// Notifications accepted by the dispatcher.
    pub notifications_delivered_total: Counter,
    /// Notifications the dispatcher failed to deliver.
    pub notifications_failed_total: Counter,
    /// The registry that owns all of the above metrics.
    pub registry: Registry,
}

impl AppMetrics {
    /// Create and register all metrics. Returns an error if any metric
    /// name is invalid or duplicated.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let triggers_total = CounterVec::new(
            Opts::new("kiosk_alerts_triggers_total", "Triggers received by path"),
            &["path"],
        )?;

        let rejected_triggers_total = CounterVec::new(
            Opts::new(
                "kiosk_alerts_rejected_triggers_total",
                "Triggers dropped before evaluation by reason",
            ),
            &["reason"],
        )?;

        let alerts_emitted_total = CounterVec::new(
            Opts::new(
                "kiosk_alerts_alerts_emitted_total",
                "Threshold crossings detected by resource and severity",
            ),
            &["resource", "severity"],
        )?;

        let notifications_delivered_total = Counter::with_opts(Opts::new(
            "kiosk_alerts_notifications_delivered_total",
            "Notifications delivered",
        ))?;

        let notifications_failed_total = Counter::with_opts(Opts::new(
            "kiosk_alerts_notifications_failed_total",
            "Notifications that failed to deliver",
        ))?;

        registry.register(Box::new(triggers_total.clone()))?;
        registry.register(Box::new(rejected_triggers_total.clone()))?;
        registry.register(Box::new(alerts_emitted_total.clone()))?;
        registry.register(Box::new(notifications_delivered_total.clone()))?;
        registry.register(Box::new(notifications_failed_total.clone()))?;

        Ok(Self {
            triggers_total,
            rejected_triggers_total,
            alerts_emitted_total,
            notifications_delivered_total,
            notifications_failed_total,
            registry,
        })
    }

    /// Render all metrics as Prometheus text format (for the `/metrics` endpoint).
    pub fn render(&self) -> Result<String, prometheus::Error> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buf = Vec::new();
        encoder.encode(&metric_families, &mut buf)?;
        Ok(String::from_utf8(buf).unwrap_or_default())
    }
}
