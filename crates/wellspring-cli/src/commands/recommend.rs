//! Recommended duration for an activity.

use clap::Args;

use super::{open_estimator, ContextArgs};

#[derive(Args)]
pub struct RecommendArgs {
    /// Activity id (e.g. "meditation", "journal")
    pub activity: String,
    #[command(flatten)]
    pub context: ContextArgs,
    /// Show the per-strategy breakdown
    #[arg(long)]
    pub explain: bool,
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: RecommendArgs) -> Result<(), Box<dyn std::error::Error>> {
    let estimator = open_estimator()?;
    let ctx = args.context.resolve(&estimator);

    if !args.explain {
        let minutes = estimator.get_optimal_duration(&args.activity, ctx);
        if args.json {
            let out = serde_json::json!({
                "activityId": args.activity,
                "context": ctx,
                "duration": minutes,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        } else {
            println!("{minutes}");
        }
        return Ok(());
    }

    let rec = estimator
        .explain(&args.activity, ctx)
        .ok_or_else(|| format!("unknown activity: {}", args.activity))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rec)?);
        return Ok(());
    }

    println!("Recommendation for {}", rec.activity_id);
    println!(
        "  Context: {} / {} / {} energy / {} schedule",
        ctx.time_of_day, ctx.user_mood, ctx.energy_level, ctx.schedule
    );
    for estimate in &rec.estimates {
        println!(
            "  {:<24} {:>6.2} min  (weight {:.2})",
            format!("{:?}", estimate.strategy),
            estimate.minutes,
            estimate.weight
        );
    }
    println!("  Blended:          {:.2} min", rec.blended);
    println!("  Learned factor:   {:.3}", rec.learned_multiplier);
    println!("  Duration:         {} min", rec.duration);
    Ok(())
}
