//! revdb - copy-on-write revisions for tables of JSON rows
//!
//! Branches carry a committed, readonly **head** revision and a mutable
//! **draft** on top of it. Tables and rows are version chains: every physical
//! version has its own `version_id`, while `created_id` stays fixed for the
//! lifetime of the logical entity. Unchanged versions are shared between
//! revisions by link; editing a shared (readonly) version copies it first, so
//! published state is never mutated in place.
//!
//! # Example
//!
//! ```no_run
//! use revdb::db::Database;
//! use revdb::draft::{CreateRowsInput, CreateTableInput, RowInput};
//! use serde_json::json;
//!
//! let db = Database::open("./revdb.json").unwrap();
//! let draft = db.draft("main").unwrap().id;
//! db.create_table(CreateTableInput {
//!     revision_id: draft.clone(),
//!     table_id: "users".into(),
//!     system: false,
//! })
//! .unwrap();
//! db.create_rows(CreateRowsInput {
//!     revision_id: draft,
//!     table_id: "users".into(),
//!     rows: vec![RowInput::new("alice", json!({"name": "Alice"}))],
//! })
//! .unwrap();
//! db.commit("main", Some("add users".into())).unwrap();
//! ```

pub mod db;
pub mod draft;
pub mod revision;
pub mod storage;
