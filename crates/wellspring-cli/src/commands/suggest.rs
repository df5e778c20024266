use clap::Args;

use super::{open_estimator, ContextArgs};

#[derive(Args)]
pub struct SuggestArgs {
    /// Activity id
    pub activity: String,
    #[command(flatten)]
    pub context: ContextArgs,
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: SuggestArgs) -> Result<(), Box<dyn std::error::Error>> {
    let estimator = open_estimator()?;
    let ctx = args.context.resolve(&estimator);
    let suggestions = estimator.get_suggested_durations(&args.activity, ctx);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&suggestions)?);
        return Ok(());
    }

    if suggestions.is_empty() {
        println!("No confident suggestions for {} yet.", args.activity);
        return Ok(());
    }
    for s in &suggestions {
        println!("{:<12} {:>3} min  (confidence {:.0}%)", s.label, s.duration, s.confidence * 100.0);
    }
    Ok(())
}
