use anyhow::Result;
use colored::*;
use shipwright_core::pipeline_manager::PipelineManager;
use shipwright_core::ShipwrightError;
use tokio_util::sync::CancellationToken;

pub async fn execute(manager: &PipelineManager) -> Result<()> {
    let settings = &manager.settings;
    println!("{}", "Arguments:".bold());
    println!();
    println!("target: {}", settings.target.cyan());
    println!("stable: {}", settings.stable || settings.version.is_some());
    println!("noPush: {}", settings.no_push);
    println!();

    let cancellation = CancellationToken::new();
    let on_interrupt = cancellation.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("{}", "Cancellation requested, stopping after the current task...".yellow());
            on_interrupt.cancel();
        }
    });

    match manager.run_task(&settings.target, &cancellation).await {
        Ok(report) => {
            println!();
            println!(
                "{} {}",
                "✓".green().bold(),
                format!(
                    "All {} task(s) completed successfully in {:.1}s",
                    report.completed.len(),
                    report.duration.as_secs_f64()
                )
                .green()
                .bold()
            );
            Ok(())
        }
        Err(error) => {
            report_failure(&error);
            Err(anyhow::anyhow!("Failed to run '{}': {}", settings.target, error))
        }
    }
}

fn report_failure(error: &ShipwrightError) {
    eprintln!();
    match error {
        ShipwrightError::TaskExecution {
            task,
            description,
            source,
            ..
        } => {
            eprintln!(
                "{} {} {}",
                "✗".red().bold(),
                format!("Task [{}] {} failed:", task, description).red().bold(),
                source
            );
        }
        ShipwrightError::Cancelled { .. } => {
            eprintln!("{} {}", "✗".red().bold(), "Run cancelled".red().bold());
        }
        other if other.is_configuration_error() => {
            eprintln!(
                "{} {}",
                "✗".red().bold(),
                "Pipeline configuration is invalid".red().bold()
            );
        }
        _ => {}
    }

    let completed = error.completed_tasks();
    if !completed.is_empty() {
        eprintln!("  {} {}", "completed:".dimmed(), completed.join(", "));
    }
}
