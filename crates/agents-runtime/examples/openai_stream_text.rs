use std::sync::Arc;

use agents_runtime::prelude::*;
use agents_runtime::vendors::openai::OpenAiProvider;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), AgentsError> {
    agents_runtime::observability::init_observability();

    let run_config = RunConfig::builder()
        .register_provider(Arc::new(OpenAiProvider::from_env()?))
        .model("gpt-4o-mini")
        .build()?;

    let agent = Agent::new("Greeter").instructions("Reply to test agent streaming.");
    let mut result = Runner::run_streamed(&agent, "Stream a greeting.", &run_config)?;
    render_stream(result.stream_events(), &mut std::io::stdout()).await?;

    let output = result.finish().await?;
    if let Some(usage) = output.usage {
        eprintln!("tokens: {} in, {} out", usage.input_tokens, usage.output_tokens);
    }
    Ok(())
}
