use super::open_estimator;

pub fn run(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut estimator = open_estimator()?;
    let report = estimator.run_periodic_maintenance();

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if !report.learning_applied {
        println!("Learning is disabled; only cleanup ran.");
    }
    for change in &report.baseline_changes {
        println!(
            "  {:<12} {:.2} -> {:.2} min",
            change.activity_id, change.from, change.to
        );
    }
    println!("History records trimmed: {}", report.history_trimmed);
    println!("Preference entries pruned: {}", report.preferences_pruned);
    Ok(())
}
