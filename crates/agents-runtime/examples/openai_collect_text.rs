use std::sync::Arc;

use agents_runtime::prelude::*;
use agents_runtime::vendors::openai::OpenAiProvider;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), AgentsError> {
    let run_config = RunConfig::builder()
        .register_provider(Arc::new(OpenAiProvider::from_env()?))
        .build()?;

    let agent = Agent::new("Collector")
        .instructions("You are a concise assistant. Reply with a short sentence.")
        .model("gpt-4o-mini");
    let result = Runner::run_streamed_parts(
        &agent,
        vec![InputPart::Json(serde_json::json!({"task": "say hello"}))],
        &run_config,
    )?;

    let output = result.finish().await?;
    println!("{}", output.text());
    Ok(())
}
