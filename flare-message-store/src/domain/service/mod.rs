mod enrichment;
mod message_store;

pub use enrichment::ReferenceEnricher;
pub use message_store::{MessageStore, MessageStoreDomainConfig};
