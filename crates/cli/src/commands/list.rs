use anyhow::Result;
use colored::*;
use shipwright_core::pipeline_manager::PipelineManager;

pub fn execute(manager: &PipelineManager) -> Result<()> {
    let result = manager.list_tasks();

    let heading = match &result.pipeline_name {
        Some(name) => format!("Tasks ({})", name),
        None => "Tasks".to_string(),
    };
    println!("{}", heading.bold().underline());

    if result.tasks.is_empty() {
        println!("  {}", "No tasks found".dimmed());
        return Ok(());
    }

    for task in &result.tasks {
        println!(
            "{} {}",
            task.name.color(task.color()).bold(),
            task.description.dimmed()
        );
        if !task.dependencies.is_empty() {
            println!("  {} {}", "depends on:".dimmed(), task.dependencies.join(", "));
        }
    }

    Ok(())
}
