//! Outcome reporting.

use clap::Subcommand;
use wellspring_core::OutcomeEvent;

use super::{open_estimator, ContextArgs};

#[derive(Subcommand)]
pub enum RecordAction {
    /// A session was started
    Start {
        activity: String,
        /// Planned duration in minutes
        minutes: f64,
        #[command(flatten)]
        context: ContextArgs,
    },
    /// A session ran to completion
    Complete {
        activity: String,
        /// Actual duration in minutes
        minutes: f64,
        /// Satisfaction rating (0-10)
        #[arg(long)]
        satisfaction: Option<f64>,
        #[command(flatten)]
        context: ContextArgs,
    },
    /// A session was abandoned early
    Abandon {
        activity: String,
        /// Minutes completed before quitting
        minutes: f64,
        #[arg(long)]
        reason: Option<String>,
        #[command(flatten)]
        context: ContextArgs,
    },
    /// The duration was changed manually
    Change {
        activity: String,
        /// Previous duration in minutes
        old: f64,
        /// New duration in minutes
        new: f64,
        #[command(flatten)]
        context: ContextArgs,
    },
    /// Rate a session
    Feedback {
        activity: String,
        /// Session duration in minutes
        minutes: f64,
        /// Rating (0-10)
        rating: f64,
        #[command(flatten)]
        context: ContextArgs,
    },
    /// Read one JSON outcome event (or an array of them) from a file or stdin
    Event {
        /// Path to the JSON file; "-" reads stdin
        #[arg(default_value = "-")]
        file: String,
    },
}

fn read_events(file: &str) -> Result<Vec<OutcomeEvent>, Box<dyn std::error::Error>> {
    let raw = if file == "-" {
        std::io::read_to_string(std::io::stdin())?
    } else {
        std::fs::read_to_string(file)?
    };
    let value: serde_json::Value = serde_json::from_str(&raw)?;
    let events = if value.is_array() {
        serde_json::from_value(value)?
    } else {
        vec![serde_json::from_value(value)?]
    };
    Ok(events)
}

pub fn run(action: RecordAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut estimator = open_estimator()?;

    match action {
        RecordAction::Start {
            activity,
            minutes,
            context,
        } => {
            let ctx = context.resolve(&estimator);
            estimator.record_start(&activity, minutes, ctx)?;
        }
        RecordAction::Complete {
            activity,
            minutes,
            satisfaction,
            context,
        } => {
            let ctx = context.resolve(&estimator);
            estimator.record_complete(&activity, minutes, satisfaction, ctx)?;
        }
        RecordAction::Abandon {
            activity,
            minutes,
            reason,
            context,
        } => {
            let ctx = context.resolve(&estimator);
            estimator.record_abandon(&activity, minutes, reason.as_deref(), ctx)?;
        }
        RecordAction::Change {
            activity,
            old,
            new,
            context,
        } => {
            let ctx = context.resolve(&estimator);
            estimator.record_duration_change(&activity, old, new, ctx)?;
        }
        RecordAction::Feedback {
            activity,
            minutes,
            rating,
            context,
        } => {
            let ctx = context.resolve(&estimator);
            estimator.record_feedback(&activity, minutes, rating, ctx)?;
        }
        RecordAction::Event { file } => {
            let events = read_events(&file)?;
            let total = events.len();
            for (applied, event) in events.into_iter().enumerate() {
                if let Err(e) = estimator.record(event) {
                    println!("recorded {applied} of {total} event(s)");
                    return Err(e.into());
                }
            }
            println!("recorded {total} event(s)");
            return Ok(());
        }
    }

    println!("ok");
    Ok(())
}
