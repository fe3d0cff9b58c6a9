use anyhow::Result;
use shipwright_core::configs::tasks::pipeline_schema;

pub fn execute() -> Result<()> {
    println!("{}", pipeline_schema()?);
    Ok(())
}
