use anyhow::Result;
use colored::*;
use shipwright_core::console::get_task_color;
use shipwright_core::pipeline_manager::PipelineManager;

pub fn execute(manager: &PipelineManager, target: &str, json: bool) -> Result<()> {
    let execution_plan = manager
        .get_execution_plan(target)
        .map_err(|e| anyhow::anyhow!("Failed to get execution plan: {}", e))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&execution_plan)?);
        return Ok(());
    }

    println!("{} {}", "Execution plan for".bold(), target.cyan());
    println!("\n{}:", "Execution order".bold());
    for (i, name) in execution_plan.tasks.iter().enumerate() {
        let description = manager
            .pipeline()
            .task(name)
            .map(|task| task.description().to_string())
            .unwrap_or_default();
        println!(
            "  {}. {} {}",
            i + 1,
            name.color(get_task_color(name)).bold(),
            description.dimmed()
        );
    }

    Ok(())
}
