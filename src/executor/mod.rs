mod database;
mod postgres;
mod result_set;

pub use database::Database;
pub use postgres::PgDatabase;
pub use result_set::{Cell, ResultSet, ResultSetBuilder, EMPTY_RESULT_MARKER};
