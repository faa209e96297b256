pub mod catalog;
pub mod mysql;
pub mod source;
pub mod types;

pub use mysql::MySqlConnector;
pub use source::{Connector, RowSource};
pub use types::*;
