//! Persistence layer — libSQL-backed storage behind the `Database` trait.

pub mod libsql_backend;
pub mod migrations;
pub mod traits;

pub use libsql_backend::LibSqlBackend;
pub use traits::{Candidate, Client, Database, EvaluationRecord, Interview, MatchEvaluation};
