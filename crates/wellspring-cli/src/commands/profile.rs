//! Activity profile inspection.

use clap::Subcommand;

use super::open_estimator;

#[derive(Subcommand)]
pub enum ProfileAction {
    /// List all activity profiles
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one profile with its history summary
    Show {
        /// Activity id
        activity: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: ProfileAction) -> Result<(), Box<dyn std::error::Error>> {
    let estimator = open_estimator()?;

    match action {
        ProfileAction::List { json } => {
            if json {
                let profiles: Vec<_> = estimator
                    .activities()
                    .filter_map(|id| estimator.profile(id))
                    .map(|p| {
                        serde_json::json!({
                            "activityId": p.activity_id,
                            "baseDuration": p.base_duration,
                            "minDuration": p.min_duration,
                            "maxDuration": p.max_duration,
                            "learningRate": p.learning_rate,
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&profiles)?);
                return Ok(());
            }

            println!("{:<14} {:>8} {:>6} {:>6} {:>6}", "ACTIVITY", "BASE", "MIN", "MAX", "RATE");
            for id in estimator.activities() {
                if let Some(p) = estimator.profile(id) {
                    println!(
                        "{:<14} {:>8.2} {:>6.1} {:>6.1} {:>6.2}",
                        id, p.base_duration, p.min_duration, p.max_duration, p.learning_rate
                    );
                }
            }
        }
        ProfileAction::Show { activity, json } => {
            let profile = estimator
                .profile(&activity)
                .ok_or_else(|| format!("unknown activity: {activity}"))?;

            if json {
                println!("{}", serde_json::to_string_pretty(profile)?);
                return Ok(());
            }

            println!("Profile: {}", profile.activity_id);
            println!("  Baseline:    {:.2} min", profile.base_duration);
            println!("  Bounds:      {:.1} - {:.1} min", profile.min_duration, profile.max_duration);
            println!("  Learning:    {:.2}", profile.learning_rate);
            println!("  Completions: {}", profile.history.completed_count());
            println!("  Abandoned:   {}", profile.history.abandonments.len());
            println!("  Ratings:     {}", profile.history.satisfaction_events.len());
            match profile.success_rate() {
                Some(rate) => println!("  Success:     {:.0}%", rate * 100.0),
                None => println!("  Success:     no data"),
            }
            println!("  Preferences: {}", estimator.preference_log().len(&activity));
        }
    }
    Ok(())
}
