//! Wire-level tests of every adapter against wiremock servers.

mod chat_and_embeddings;
mod providers;
mod structured_output;
