//! Structured logging for predictor events
//!
//! Every event carries an `event` field and the instance name so JSON log
//! lines can be filtered without parsing messages.

use crate::bundle::BundleInfo;
use crate::models::{Grade, Outcome};
use tracing::{info, warn};

/// Structured logger for predictor events
#[derive(Debug, Clone)]
pub struct StructuredLogger {
    instance: String,
}

impl Default for StructuredLogger {
    fn default() -> Self {
        Self::new("local")
    }
}

impl StructuredLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    pub fn instance(&self) -> &str {
        &self.instance
    }

    /// Log service startup
    pub fn log_startup(&self, version: &str, score_model: &BundleInfo, outcome_model: &BundleInfo) {
        info!(
            event = "predictor_started",
            instance = %self.instance,
            service_version = %version,
            score_model_version = %score_model.version,
            outcome_model_version = %outcome_model.version,
            "Student predictor started"
        );
    }

    /// Log service shutdown
    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "predictor_shutdown",
            instance = %self.instance,
            reason = %reason,
            "Student predictor shutting down"
        );
    }

    /// Log a finished score prediction
    pub fn log_score(&self, score: i32, grade: Grade, model_version: &str) {
        info!(
            event = "score_predicted",
            instance = %self.instance,
            score = score,
            grade = %grade,
            model_version = %model_version,
            "Generated exam score prediction"
        );
    }

    /// Log a finished pass/fail prediction
    pub fn log_outcome(&self, label: Outcome, pass_probability: f64, model_version: &str) {
        info!(
            event = "outcome_predicted",
            instance = %self.instance,
            label = %label,
            pass_probability = pass_probability,
            model_version = %model_version,
            "Generated pass/fail prediction"
        );
    }

    /// Log a request that did not produce a prediction
    pub fn log_rejected(&self, operation: &str, validation: bool, reason: &str) {
        if validation {
            info!(
                event = "prediction_rejected",
                instance = %self.instance,
                operation = %operation,
                reason = %reason,
                "Rejected invalid prediction input"
            );
        } else {
            warn!(
                event = "prediction_failed",
                instance = %self.instance,
                operation = %operation,
                reason = %reason,
                "Model failed to produce a prediction"
            );
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::fmt;
    use std::sync::{Arc, Mutex};
    use tracing::field::{Field, Visit};
    use tracing::{Event, Subscriber};
    use tracing_subscriber::layer::{Context, Layer};
    use tracing_subscriber::prelude::*;

    /// Records the `event` field of every log record
    struct EventNames(Arc<Mutex<Vec<String>>>);

    struct EventField(Option<String>);

    impl Visit for EventField {
        fn record_str(&mut self, field: &Field, value: &str) {
            if field.name() == "event" {
                self.0 = Some(value.to_string());
            }
        }

        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            if field.name() == "event" {
                self.0 = Some(format!("{:?}", value));
            }
        }
    }

    impl<S: Subscriber> Layer<S> for EventNames {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            let mut field = EventField(None);
            event.record(&mut field);
            if let Some(name) = field.0 {
                self.0.lock().unwrap().push(name);
            }
        }
    }

    /// Run `f` under a subscriber and return the `event` names it logged
    pub(crate) fn capture_events(f: impl FnOnce()) -> Vec<String> {
        let names = Arc::new(Mutex::new(Vec::new()));
        let subscriber = tracing_subscriber::registry().with(EventNames(names.clone()));
        tracing::subscriber::with_default(subscriber, f);
        let captured = names.lock().unwrap().clone();
        captured
    }

    #[test]
    fn test_every_record_carries_an_event_name() {
        let logger = StructuredLogger::new("test-host");
        let events = capture_events(|| {
            logger.log_score(72, Grade::C, "abc123");
            logger.log_outcome(Outcome::Pass, 0.87, "def456");
            logger.log_rejected("predict_score", true, "study_hours out of range");
            logger.log_rejected("predict_outcome", false, "bad probabilities");
            logger.log_shutdown("SIGINT received");
        });
        assert_eq!(
            events,
            vec![
                "score_predicted",
                "outcome_predicted",
                "prediction_rejected",
                "prediction_failed",
                "predictor_shutdown",
            ]
        );
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("test-host");
        assert_eq!(logger.instance(), "test-host");
        assert_eq!(StructuredLogger::default().instance(), "local");
    }

    #[test]
    fn test_logging_without_subscriber_is_silent() {
        let logger = StructuredLogger::default();
        logger.log_score(72, Grade::C, "abc123");
        logger.log_outcome(Outcome::Pass, 0.87, "def456");
        logger.log_rejected("predict_score", true, "study_hours out of range");
        logger.log_rejected("predict_outcome", false, "bad probabilities");
    }
}
