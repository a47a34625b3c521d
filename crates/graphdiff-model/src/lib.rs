//! Object graph model for graphdiff.
//!
//! This crate defines what the comparison engine compares and how locations
//! inside a graph are addressed. Every other graphdiff crate depends on
//! `graphdiff-model`.
//!
//! # Key Types
//!
//! - [`Value`] -- A node of an object graph (primitive, container, bean, or opaque)
//! - [`BeanRef`] / [`BeanType`] -- Shared, possibly cyclic, typed objects
//! - [`Introspector`] / [`Member`] -- Enumeration of a bean type's comparable members
//! - [`Path`] / [`Element`] -- Graph-independent addresses of locations

pub mod error;
pub mod introspect;
pub mod path;
pub mod value;

pub use error::{ModelError, ModelResult};
pub use introspect::{DeclaredMembers, Getter, Introspector, Member, Setter};
pub use path::{Element, Path, PathBuilder};
pub use value::{Bean, BeanRef, BeanType, Identity, OpaqueValue, Value, ValueType};
