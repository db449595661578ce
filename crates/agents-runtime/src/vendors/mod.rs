/// Azure OpenAI Chat Completions streaming.
pub mod azure_openai;
/// OpenAI Responses API streaming.
pub mod openai;
