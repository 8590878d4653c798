//! Declare entities at runtime and run their CRUD through a MySQL pool.
//!
//! An entity is a table name plus typed attributes. Caller input is
//! validated against those attributes and inlined into plain SQL text;
//! reads are always scoped by the entity's default predicate, which
//! hides soft-deleted rows.

pub mod libs;

pub use libs::*;
