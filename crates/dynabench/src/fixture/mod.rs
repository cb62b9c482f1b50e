//! Backend fixture wiring: SDK client construction, the benchmark table
//! and dataset seeding.

pub mod client;
pub mod seed;
pub mod table;

pub use client::create_client;
pub use seed::seed_records;
pub use table::{reset_table, TableSpec};
