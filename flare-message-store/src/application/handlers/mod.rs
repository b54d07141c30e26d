//! 应用层处理器（编排层）

mod command_handler;
mod query_handler;

pub use command_handler::MessageStoreCommandHandler;
pub use query_handler::MessageStoreQueryHandler;

#[cfg(test)]
mod handler_test;
