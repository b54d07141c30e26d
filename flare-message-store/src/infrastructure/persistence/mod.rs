pub mod document;
pub mod memory;
pub mod mongo;

pub use memory::InMemoryMessageRepository;
pub use mongo::MongoMessageRepository;
