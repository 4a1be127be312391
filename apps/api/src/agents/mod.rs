// Agents: the tasking agent orchestrates spec generation and delegates code work to the
// coding agent. Both talk to the model only through `llm_client::Generator`.

pub mod coding;
pub mod handlers;
pub mod prompts;
pub mod tasking;
