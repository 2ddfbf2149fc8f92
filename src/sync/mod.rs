pub mod engine;
pub mod pagination;
pub mod state;
