pub mod codec;
pub mod repo;
pub mod sqlite;
