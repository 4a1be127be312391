// Conversation persistence: a small document store over an object backend,
// fronted by a single hand-maintained index object.

pub mod backend;
pub mod codec;
pub mod handlers;
pub mod index;
pub mod models;
pub mod store;
