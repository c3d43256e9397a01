//! Trigger pipeline.
//!
//! Glue between the trigger surface and the monitor core. For each trigger:
//! 1. Normalize the raw JSON document(s)
//! 2. Run the edge evaluator (level path) or the refund mapper (refund path)
//! 3. Hand every resulting message to the dispatcher, one attempt each
//! 4. Record the outcome in the delivery log and metrics
//!
//! Missing or malformed input is logged and returned as a [`MonitorError`];
//! failed deliveries are logged, recorded and counted, but never retried and
//! never abort the remaining messages of the same trigger.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

use crate::alerts::{DeliveryError, Dispatcher};
use crate::metrics::AppMetrics;
use crate::monitor::{
    compose_alert, evaluate, map_refund, normalize_refund, normalize_snapshot, MonitorError,
    NotificationMessage, RefundKey, RuleSet, Severity,
};
use crate::repository::{DeliveryRecord, NotificationRepository};

/// Summary of one processed trigger.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineOutcome {
    pub machine_id: String,
    /// Messages produced by the core
    pub produced: usize,
    pub delivered: usize,
    pub failed: usize,
    /// `true` when the machine is outside the monitored set
    pub skipped: bool,
    #[serde(skip)]
    pub failures: Vec<DeliveryError>,
}

impl PipelineOutcome {
    fn new(machine_id: &str) -> Self {
        Self {
            machine_id: machine_id.to_string(),
            produced: 0,
            delivered: 0,
            failed: 0,
            skipped: false,
            failures: Vec::new(),
        }
    }

    fn record(&mut self, result: Result<(), DeliveryError>) {
        self.produced += 1;
        match result {
            Ok(()) => self.delivered += 1,
            Err(err) => {
                self.failed += 1;
                self.failures.push(err);
            }
        }
    }
}

pub struct Pipeline {
    dispatcher: Arc<dyn Dispatcher + Send + Sync>,
    recipient: String,
    rules: RuleSet,
    repository: Option<Arc<NotificationRepository>>,
    metrics: Option<Arc<AppMetrics>>,
    monitored_machines: Option<HashSet<String>>,
}

impl Pipeline {
    pub fn new(
        dispatcher: Arc<dyn Dispatcher + Send + Sync>,
        recipient: impl Into<String>,
    ) -> Self {
        Self {
            dispatcher,
            recipient: recipient.into(),
            rules: RuleSet::default(),
            repository: None,
            metrics: None,
            monitored_machines: None,
        }
    }

    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_repository(mut self, repository: Arc<NotificationRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<AppMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Restrict the level path to these machine ids.
    pub fn with_monitored_machines<I, S>(mut self, machines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.monitored_machines = Some(machines.into_iter().map(Into::into).collect());
        self
    }

    pub fn is_monitored(&self, machine_id: &str) -> bool {
        self.monitored_machines
            .as_ref()
            .map_or(true, |machines| machines.contains(machine_id))
    }

    /// Handle a machine document change.
    ///
    /// Pairs for one machine must arrive in chronological order and without
    /// gaps for each crossing to be reported exactly once; see
    /// [`evaluate`](crate::monitor::evaluate).
    pub async fn process_level_change(
        &self,
        machine_id: &str,
        before: Option<&Value>,
        after: Option<&Value>,
    ) -> Result<PipelineOutcome, MonitorError> {
        self.count_trigger("level");
        let mut outcome = PipelineOutcome::new(machine_id);

        if !self.is_monitored(machine_id) {
            tracing::debug!("Machine {} is not monitored, skipping level change", machine_id);
            outcome.skipped = true;
            return Ok(outcome);
        }

        let (before, after) = match (
            normalize_snapshot(before, "before"),
            normalize_snapshot(after, "after"),
        ) {
            (Ok(before), Ok(after)) => (before, after),
            (Err(err), _) | (_, Err(err)) => return Err(self.reject(machine_id, err)),
        };

        let alerts = evaluate(machine_id, &before, &after, &self.rules);
        for alert in &alerts {
            tracing::info!(
                "{} crossing on {} for {}: {} -> {}",
                alert.severity,
                alert.resource,
                machine_id,
                alert.before_value,
                alert.after_value,
            );
            if let Some(metrics) = &self.metrics {
                let resource = alert.resource.to_string();
                metrics
                    .alerts_emitted_total
                    .with_label_values(&[resource.as_str(), alert.severity.as_str()])
                    .inc();
            }

            let message = compose_alert(alert, &self.recipient);
            let result = self
                .deliver(machine_id, "level", Some(alert.severity), &message)
                .await;
            outcome.record(result);
        }

        tracing::debug!("Level check for {} complete ({} alerts)", machine_id, alerts.len());
        Ok(outcome)
    }

    /// Handle a newly created refund log entry.
    pub async fn process_refund(
        &self,
        key: &RefundKey,
        record: Option<&Value>,
    ) -> Result<PipelineOutcome, MonitorError> {
        self.count_trigger("refund");
        let mut outcome = PipelineOutcome::new(&key.machine_id);

        let entry = match normalize_refund(key, record, Utc::now()) {
            Ok(entry) => entry,
            Err(err) => return Err(self.reject(&key.machine_id, err)),
        };

        tracing::info!("Refund {} on {} ({})", entry.log_id, entry.machine_id, entry.error_code);

        let message = map_refund(&entry, &self.recipient);
        let result = self.deliver(&entry.machine_id, "refund", None, &message).await;
        outcome.record(result);

        Ok(outcome)
    }

    /// Single delivery attempt, logged to the delivery history either way.
    async fn deliver(
        &self,
        machine_id: &str,
        kind: &str,
        severity: Option<Severity>,
        message: &NotificationMessage,
    ) -> Result<(), DeliveryError> {
        let result = self.dispatcher.send(message).await;

        match &result {
            Ok(()) => {
                tracing::info!(
                    "Notification sent: {} ({})",
                    message.subject,
                    self.dispatcher.channel_name()
                );
                if let Some(metrics) = &self.metrics {
                    metrics.notifications_delivered_total.inc();
                }
            }
            Err(err) => {
                tracing::error!("{}", err);
                if let Some(metrics) = &self.metrics {
                    metrics.notifications_failed_total.inc();
                }
            }
        }

        if let Some(repository) = &self.repository {
            let record = DeliveryRecord {
                id: None,
                machine_id: machine_id.to_string(),
                kind: kind.to_string(),
                severity: severity.map(|s| s.as_str().to_string()),
                subject: message.subject.clone(),
                recipient: message.recipient.clone(),
                channel: self.dispatcher.channel_name().to_string(),
                delivered: result.is_ok(),
                error: result.as_ref().err().map(|err| err.reason.clone()),
                attempted_at: Utc::now().to_rfc3339(),
            };
            if let Err(err) = repository.log_delivery(&record).await {
                tracing::error!("Failed to record delivery for {}: {}", machine_id, err);
            }
        }

        result
    }

    /// Record a trigger whose body could not be read at all. Counted and
    /// logged like any other rejected trigger.
    pub fn reject_unreadable(
        &self,
        path: &str,
        machine_id: &str,
        err: MonitorError,
    ) -> MonitorError {
        self.count_trigger(path);
        self.reject(machine_id, err)
    }

    fn count_trigger(&self, path: &str) {
        if let Some(metrics) = &self.metrics {
            metrics.triggers_total.with_label_values(&[path]).inc();
        }
    }

    fn reject(&self, machine_id: &str, err: MonitorError) -> MonitorError {
        tracing::warn!("Dropping trigger for {}: {}", machine_id, err);
        if let Some(metrics) = &self.metrics {
            metrics
                .rejected_triggers_total
                .with_label_values(&[err.reason()])
                .inc();
        }
        err
    }
}
