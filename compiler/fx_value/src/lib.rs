//! FX Value - Runtime values for the filterx expression core.
//!
//! This crate provides the value model consumed by expression nodes:
//! - `Value`: immutable, reference-counted runtime values
//! - `Heap<T>`: the `Arc` wrapper every heap-backed variant goes through
//! - `MarshalType`: type tag produced by `Value::marshal`
//!
//! # Reference Counting
//!
//! Values are immutable once produced. Cloning a `Value` takes another
//! reference to the same allocation, dropping it releases that reference.
//! Several expression nodes and the per-record evaluation may hold the same
//! value at once.

mod value;

pub use value::{Heap, MarshalType, Value};
