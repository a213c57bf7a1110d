pub mod entity_ctx;
pub mod entity_flow;

pub use entity_ctx::EntityCtx;
pub use entity_flow::EntityFlow;
