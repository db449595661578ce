//! Streams an Azure OpenAI answer to an astronomy question, token by token.

mod config;

use std::io::{BufRead, Write};
use std::sync::Arc;

use agents_runtime::prelude::*;
use agents_runtime::vendors::azure_openai::AzureOpenAiProvider;

const BANNER: &[&str] = &[
    "Azure OpenAI Streaming Text Example",
    "=================================",
    "This example requires Azure OpenAI credentials.",
    "Make sure you have set these environment variables:",
    "- AZURE_OPENAI_API_KEY: Your Azure OpenAI API key",
    "- AZURE_OPENAI_ENDPOINT: Your Azure OpenAI endpoint URL",
    "- AZURE_OPENAI_API_VERSION: (Optional) API version",
    "- AZURE_OPENAI_DEPLOYMENT: (Optional) Deployment name",
];

fn print_banner(out: &mut impl Write) -> std::io::Result<()> {
    for line in BANNER {
        writeln!(out, "{line}")?;
    }
    writeln!(out)
}

/// Writes `question` and reads one line of input, without the line ending.
///
/// Returns `None` when the line is blank or input is already closed.
fn ask(
    question: &str,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> std::io::Result<Option<String>> {
    write!(out, "{question}")?;
    out.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    let line = line.trim_end_matches(['\r', '\n']);
    Ok((!line.trim().is_empty()).then(|| line.to_string()))
}

fn streaming_agent() -> Agent {
    Agent::new("Streaming Agent")
        .instructions("You are a helpful agent that provides information about astronomy.")
        .model_settings(ModelSettings::default().provider("azure_openai").temperature(0.7))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), AgentsError> {
    print_banner(&mut std::io::stdout())?;

    config::init();
    agents_runtime::observability::init_observability();

    let run_config = RunConfig::builder()
        .register_provider(Arc::new(AzureOpenAiProvider::from_env()?))
        .build()?;
    let agent = streaming_agent();

    let Some(question) = ask(
        "Ask a question about astronomy: ",
        &mut std::io::stdin().lock(),
        &mut std::io::stdout(),
    )?
    else {
        println!("\nNo question entered, nothing to ask.");
        return Ok(());
    };

    println!("\nGenerating response...\n");

    let mut result = Runner::run_streamed(&agent, question, &run_config)?;
    let abort = result.abort_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, cancelling run");
            abort.abort();
        }
    });

    render_stream(result.stream_events(), std::io::stdout()).await?;
    result.finish().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn banner_lists_variables_then_blank_line() {
        let mut out = Vec::new();
        print_banner(&mut out).expect("banner");
        let text = String::from_utf8(out).expect("utf8");
        assert!(
            text.starts_with("Azure OpenAI Streaming Text Example\n=================================\n")
        );
        assert!(text.contains("- AZURE_OPENAI_DEPLOYMENT: (Optional) Deployment name\n"));
        assert!(text.ends_with("Deployment name\n\n"));
    }

    #[test]
    fn ask_prompts_and_strips_line_ending() {
        let mut input = std::io::Cursor::new(b"Why is Mars red?\r\n".to_vec());
        let mut out = Vec::new();
        let answer = ask("Ask a question about astronomy: ", &mut input, &mut out).expect("ask");
        assert_eq!(answer.as_deref(), Some("Why is Mars red?"));
        assert_eq!(out, b"Ask a question about astronomy: ");
    }

    #[test]
    fn ask_on_closed_or_blank_input_returns_no_question() {
        let mut closed = std::io::Cursor::new(Vec::new());
        assert_eq!(ask("? ", &mut closed, &mut Vec::new()).expect("ask"), None);
        let mut blank = std::io::Cursor::new(b"   \n".to_vec());
        assert_eq!(ask("? ", &mut blank, &mut Vec::new()).expect("ask"), None);
    }

    #[test]
    fn agent_targets_azure_with_fixed_temperature() {
        let agent = streaming_agent();
        assert_eq!(agent.name, "Streaming Agent");
        assert_eq!(
            agent.model_settings.provider,
            Some(ProviderId::new("azure_openai"))
        );
        assert_eq!(agent.model_settings.temperature, Some(0.7));
    }
}
