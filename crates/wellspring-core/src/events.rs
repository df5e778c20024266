use serde::{Deserialize, Serialize};

use crate::context::Context;

/// An activity outcome reported by the host.
///
/// Hosts that already move events around as data can hand these to
/// [`AdaptiveEstimator::record`](crate::AdaptiveEstimator::record) instead of
/// calling the individual `record_*` methods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum OutcomeEvent {
    Started {
        activity_id: String,
        planned_duration: f64,
        #[serde(default)]
        context: Option<Context>,
    },
    Completed {
        activity_id: String,
        actual_duration: f64,
        #[serde(default)]
        satisfaction: Option<f64>,
        #[serde(default)]
        context: Option<Context>,
    },
    Abandoned {
        activity_id: String,
        actual_duration: f64,
        #[serde(default)]
        reason: Option<String>,
        #[serde(default)]
        context: Option<Context>,
    },
    DurationChanged {
        activity_id: String,
        old_duration: f64,
        new_duration: f64,
        #[serde(default)]
        context: Option<Context>,
    },
    Feedback {
        activity_id: String,
        duration: f64,
        rating: f64,
        #[serde(default)]
        context: Option<Context>,
    },
}

impl OutcomeEvent {
    pub fn activity_id(&self) -> &str {
        match self {
            OutcomeEvent::Started { activity_id, .. }
            | OutcomeEvent::Completed { activity_id, .. }
            | OutcomeEvent::Abandoned { activity_id, .. }
            | OutcomeEvent::DurationChanged { activity_id, .. }
            | OutcomeEvent::Feedback { activity_id, .. } => activity_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::TimeOfDay;

    #[test]
    fn tagged_json_shape() {
        let event = OutcomeEvent::Completed {
            activity_id: "journal".into(),
            actual_duration: 12.0,
            satisfaction: Some(8.0),
            context: Some(Context::neutral(TimeOfDay::Evening)),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "completed");
        assert_eq!(json["activityId"], "journal");
        assert_eq!(json["actualDuration"], 12.0);
        assert_eq!(json["context"]["timeOfDay"], "evening");
    }

    #[test]
    fn context_is_optional() {
        let event: OutcomeEvent = serde_json::from_str(
            r#"{"type":"feedback","activityId":"workout","duration":20,"rating":7}"#,
        )
        .unwrap();
        assert_eq!(event.activity_id(), "workout");
        assert!(matches!(event, OutcomeEvent::Feedback { context: None, .. }));
    }
}
