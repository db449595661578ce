use std::pin::Pin;

use crate::agent::ModelSettings;
use crate::content::InputPart;
use crate::errors::ProviderError;
use crate::events::ResponseEvent;
use crate::model::{ProviderId, RunOptions};

/// Ordered stream of provider events for one model call.
pub type ResponseStream =
    Pin<Box<dyn futures::Stream<Item = Result<ResponseEvent, ProviderError>> + Send + 'static>>;

/// Fully resolved request handed to a provider.
#[derive(Clone, Debug)]
pub struct ModelRequest {
    pub run_id: uuid::Uuid,
    /// Resolved model name (Azure providers may map it to a deployment).
    pub model: String,
    /// Agent instructions, already trimmed; `None` when blank.
    pub instructions: Option<String>,
    pub input: Vec<InputPart>,
    /// Agent settings merged with run-level overrides.
    pub settings: ModelSettings,
    pub options: RunOptions,
}

/// Resolves model calls for a provider id.
///
/// Implementations perform the network call and translate the vendor wire
/// protocol into [`ResponseEvent`]s. A successful stream must end with
/// [`ResponseEvent::Completed`]; ending without it is reported as a protocol
/// failure by the runner.
#[async_trait::async_trait]
pub trait ModelProvider: Send + Sync {
    fn id(&self) -> ProviderId;

    /// Starts a streamed model call.
    ///
    /// Errors returned here happen before any event is produced (bad
    /// credentials, HTTP status, unreachable endpoint).
    async fn stream_response(&self, req: ModelRequest) -> Result<ResponseStream, ProviderError>;
}
