pub mod dispatcher;
pub mod type_handler;

pub use dispatcher::{Acknowledgement, BatchDispatcher, BatchError, HandlerFailure, WrittenCounts};
pub use type_handler::{HandlerError, TypeHandler};
