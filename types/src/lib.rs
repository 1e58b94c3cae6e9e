//! Type system and schema handles for the OLAP calculator core.
//!
//! This crate has two halves:
//!
//! - [`schema`]: cheap, reference-counted handles to the dimensional objects
//!   owned by the schema layer (cubes, dimensions, hierarchies, levels,
//!   members). Calculators hold and compare these but never create or mutate
//!   the underlying objects during evaluation.
//! - [`ty`]: the static type of an expression: its [`Category`] plus the
//!   hierarchy/dimension it ranges over, when known.
//!
//! # Example
//!
//! ```
//! use olapcalc_types::{CubeBuilder, Type, MemberType};
//!
//! let mut builder = CubeBuilder::new("Sales");
//! let store = builder.hierarchy("Store", &["Country", "City"]);
//! let cube = builder.build();
//!
//! let hierarchy = cube.hierarchy_by_name("Store").unwrap();
//! let ty = Type::Member(MemberType::for_hierarchy(&hierarchy));
//! assert!(ty.uses_hierarchy(&hierarchy, true));
//! # let _ = store;
//! ```

#![no_std]
extern crate alloc;

pub mod schema;
pub mod ty;

pub use schema::{Cube, CubeBuilder, Dimension, Hierarchy, Level, Member, MemberKind};
pub use ty::{
    Category, DimensionType, HierarchyType, LevelType, MemberType, TupleType, Type,
};
