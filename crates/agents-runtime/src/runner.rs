use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt as _;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

use crate::agent::{Agent, DEFAULT_MODEL};
use crate::config::RunConfig;
use crate::content::{InputPart, OutputPart, RunOutput};
use crate::errors::{AgentsError, RunFailure};
use crate::events::{OutputItem, ResponseEvent, RunItem, StreamEvent};
use crate::model::ProviderId;
use crate::provider::{ModelProvider, ModelRequest};

type EventTx = mpsc::Sender<Result<StreamEvent, RunFailure>>;

/// Handle used to request cancellation of a running stream.
#[derive(Clone)]
pub struct AbortHandle {
    tx: watch::Sender<bool>,
}

impl AbortHandle {
    /// Requests cancellation.
    ///
    /// The provider stream is dropped and the run stream ends with
    /// `RunFailure::Cancelled`.
    pub fn abort(&self) {
        let _ = self.tx.send(true);
    }
}

/// Entry point for starting agent runs.
pub struct Runner;

impl Runner {
    /// Starts a streamed run of `agent` on a single text input.
    ///
    /// Returns as soon as the run is dispatched; events are consumed through
    /// the returned handle. Must be called from within a Tokio runtime.
    pub fn run_streamed(
        agent: &Agent,
        input: impl Into<String>,
        run_config: &RunConfig,
    ) -> Result<RunResultStreaming, AgentsError> {
        Self::run_streamed_parts(agent, vec![InputPart::Text(input.into())], run_config)
    }

    /// Starts a streamed run with a list of input parts, sent to the model as
    /// one user message.
    pub fn run_streamed_parts(
        agent: &Agent,
        input: Vec<InputPart>,
        run_config: &RunConfig,
    ) -> Result<RunResultStreaming, AgentsError> {
        let (provider, request) = prepare_run(agent, input, run_config)?;
        let capacity = request.options.stream_buffer_capacity;
        let (tx, rx) = mpsc::channel(capacity);
        let (final_tx, final_rx) = oneshot::channel();
        let (abort_tx, abort_rx) = watch::channel(false);

        let run_id = request.run_id;
        let provider_id = provider.id();
        let model = request.model.clone();
        tokio::spawn(run_task(
            provider,
            request,
            agent.name.clone(),
            tx,
            final_tx,
            abort_rx,
        ));

        Ok(RunResultStreaming {
            run_id,
            agent_name: agent.name.clone(),
            provider: provider_id,
            model,
            rx,
            final_rx,
            abort_handle: AbortHandle { tx: abort_tx },
        })
    }
}

fn prepare_run(
    agent: &Agent,
    input: Vec<InputPart>,
    run_config: &RunConfig,
) -> Result<(Arc<dyn ModelProvider>, ModelRequest), AgentsError> {
    if agent.name.trim().is_empty() {
        return Err(AgentsError::Validation("agent name must not be empty".into()));
    }
    if input.is_empty() {
        return Err(AgentsError::Validation(
            "at least one input part is required".into(),
        ));
    }
    for part in &input {
        if let InputPart::Text(text) = part
            && text.trim().is_empty()
        {
            return Err(AgentsError::Validation(
                "text input must not be empty".into(),
            ));
        }
    }
    let options = run_config.options().clone();
    if options.stream_buffer_capacity == 0 {
        return Err(AgentsError::Validation(
            "stream_buffer_capacity must be greater than 0".into(),
        ));
    }

    let settings = agent.model_settings.resolve(run_config.model_settings());
    let provider = run_config.resolve_provider(settings.provider.as_ref())?;
    let model = run_config
        .model()
        .or(agent.model.as_deref())
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(DEFAULT_MODEL)
        .to_string();

    let request = ModelRequest {
        run_id: uuid::Uuid::new_v4(),
        model,
        instructions: agent
            .instructions
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToOwned::to_owned),
        input,
        settings,
        options,
    };
    Ok((provider, request))
}

/// Streaming handle returned by `Runner::run_streamed`.
///
/// Use `stream_events()` (or `next_event()`) to consume events as they arrive
/// and `finish()` to obtain the final output.
pub struct RunResultStreaming {
    run_id: uuid::Uuid,
    agent_name: String,
    provider: ProviderId,
    model: String,
    rx: mpsc::Receiver<Result<StreamEvent, RunFailure>>,
    final_rx: oneshot::Receiver<Result<RunOutput, AgentsError>>,
    abort_handle: AbortHandle,
}

impl RunResultStreaming {
    pub fn run_id(&self) -> uuid::Uuid {
        self.run_id
    }

    pub fn agent_name(&self) -> &str {
        &self.agent_name
    }

    pub fn provider(&self) -> &ProviderId {
        &self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Returns a handle that can cancel the run.
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort_handle.clone()
    }

    /// Waits for and returns the next event.
    ///
    /// A terminal failure is yielded once as `Err`; `None` follows once the
    /// run task has finished.
    pub async fn next_event(&mut self) -> Option<Result<StreamEvent, AgentsError>> {
        self.rx
            .recv()
            .await
            .map(|event| event.map_err(AgentsError::RunFailed))
    }

    /// Events of this run as a stream, in emission order.
    pub fn stream_events(
        &mut self,
    ) -> impl futures::Stream<Item = Result<StreamEvent, AgentsError>> + '_ {
        futures::stream::unfold(self, |run| async move {
            let event = run.next_event().await?;
            Some((event, run))
        })
    }

    /// Drains any unconsumed events and returns the final run result.
    ///
    /// Safe to call after the events were consumed with `stream_events()`.
    pub async fn finish(mut self) -> Result<RunOutput, AgentsError> {
        while self.rx.recv().await.is_some() {}
        match self.final_rx.await {
            Ok(result) => result,
            Err(_) => Err(AgentsError::protocol_msg(format!(
                "run task ended without final result (provider={}, model={})",
                self.provider, self.model
            ))),
        }
    }
}

async fn run_task(
    provider: Arc<dyn ModelProvider>,
    request: ModelRequest,
    agent_name: String,
    tx: EventTx,
    final_tx: oneshot::Sender<Result<RunOutput, AgentsError>>,
    abort_rx: watch::Receiver<bool>,
) {
    let run_id = request.run_id;
    let provider_id = provider.id();
    let model = request.model.clone();
    let timeout = request.options.timeout;
    info!(run_id = %run_id, provider = %provider_id, model = %model, agent = %agent_name, "run started");

    let outcome = tokio::select! {
        result = drive(provider.as_ref(), request, &agent_name, &tx) => result,
        () = cancelled(abort_rx) => Err(RunFailure::Cancelled),
        elapsed = deadline(timeout) => Err(RunFailure::Timeout { timeout: elapsed }),
    };

    match outcome {
        Ok(output) => {
            info!(run_id = %run_id, provider = %provider_id, finish_reason = ?output.finish_reason, "run completed");
            let _ = final_tx.send(Ok(output));
        }
        Err(failure) => {
            warn!(run_id = %run_id, provider = %provider_id, error = %failure, "run failed");
            let _ = tx.send(Err(failure.clone())).await;
            let _ = final_tx.send(Err(AgentsError::RunFailed(failure)));
        }
    }
}

async fn drive(
    provider: &dyn ModelProvider,
    request: ModelRequest,
    agent_name: &str,
    tx: &EventTx,
) -> Result<RunOutput, RunFailure> {
    let run_id = request.run_id;
    let provider_id = provider.id();
    emit(
        tx,
        StreamEvent::AgentUpdated {
            run_id,
            agent_name: agent_name.to_string(),
        },
    )
    .await?;

    let mut stream = provider.stream_response(request).await?;
    let mut seq = 0_u64;
    // Streamed text per output item, in output order.
    let mut text: BTreeMap<u32, String> = BTreeMap::new();
    while let Some(next) = stream.next().await {
        let event = next?;
        if let ResponseEvent::TextDelta {
            output_index,
            delta,
            ..
        } = &event
        {
            if delta.is_empty() {
                continue;
            }
            text.entry(*output_index).or_default().push_str(delta);
        }
        debug!(run_id = %run_id, provider = %provider_id, seq, kind = event.kind(), "provider event");

        let item = match &event {
            ResponseEvent::OutputItemDone { item, .. } => run_item(item),
            _ => None,
        };
        let completed = match &event {
            ResponseEvent::Completed { output } => Some(output.clone()),
            _ => None,
        };

        emit(tx, StreamEvent::RawResponse { run_id, seq, data: event }).await?;
        seq = seq.saturating_add(1);
        if let Some(item) = item {
            emit(tx, StreamEvent::RunItem { run_id, item }).await?;
        }
        if let Some(output) = completed {
            return Ok(finalize_output(text, output));
        }
    }

    Err(RunFailure::Protocol {
        message: format!("provider stream ended without completion ({provider_id})"),
    })
}

async fn emit(tx: &EventTx, event: StreamEvent) -> Result<(), RunFailure> {
    tx.send(Ok(event))
        .await
        .map_err(|_| RunFailure::Protocol {
            message: "run stream receiver dropped".into(),
        })
}

async fn cancelled(mut abort_rx: watch::Receiver<bool>) {
    loop {
        if *abort_rx.borrow_and_update() {
            return;
        }
        if abort_rx.changed().await.is_err() {
            // Every abort handle is gone; cancellation can no longer happen.
            std::future::pending::<()>().await;
        }
    }
}

async fn deadline(timeout: Option<Duration>) -> Duration {
    match timeout {
        Some(timeout) => {
            tokio::time::sleep(timeout).await;
            timeout
        }
        None => std::future::pending().await,
    }
}

fn run_item(item: &OutputItem) -> Option<RunItem> {
    match item {
        OutputItem::Message { text, .. } => Some(RunItem::MessageOutput { text: text.clone() }),
        OutputItem::FunctionCall {
            call_id,
            name,
            arguments,
        } => Some(RunItem::ToolCall {
            call_id: call_id.clone(),
            name: name.clone(),
            arguments: arguments.clone(),
        }),
        OutputItem::Reasoning | OutputItem::Other { .. } => None,
    }
}

/// Streamed text wins over the provider's own text aggregate, one text part
/// per output item; non-text parts, finish reason, and usage come from the
/// provider.
fn finalize_output(
    streamed_text: BTreeMap<u32, String>,
    provider_output: Option<RunOutput>,
) -> RunOutput {
    let output = provider_output.unwrap_or_default();
    if streamed_text.is_empty() {
        return output;
    }
    let mut parts: Vec<OutputPart> = streamed_text.into_values().map(OutputPart::Text).collect();
    parts.extend(
        output
            .parts
            .into_iter()
            .filter(|part| !matches!(part, OutputPart::Text(_))),
    );
    RunOutput { parts, ..output }
}
