pub mod loader;
pub mod migrations;
pub mod sqlite;
pub mod writer;
