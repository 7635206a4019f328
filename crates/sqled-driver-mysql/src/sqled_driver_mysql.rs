//! MySQL/MariaDB driver implementation

mod connection;
mod driver;

pub use connection::{MySqlConnection, value_to_mysql_literal};
pub use driver::MySqlDriver;
