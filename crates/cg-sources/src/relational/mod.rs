//! Relational inventory source adapters.

mod postgres;

pub use postgres::PostgresSource;
