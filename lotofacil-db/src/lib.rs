pub mod db;
pub mod ledger;
pub mod models;

pub use rusqlite;
