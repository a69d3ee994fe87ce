//! # `ifdtree_types`
//!
//! Types and static tables for the [`ifdtree`] tagged-directory codec:
//! the primitive type system, value storage, directory groups, tag
//! registries, and the vendor maker-note strategy tables.
//!
//! Everything here is plain data. The registries are built at compile
//! time and are read-only for the life of the process, so unsynchronized
//! concurrent reads are fine.
//!
//! [`ifdtree`]: https://docs.rs/ifdtree

pub mod group;
pub mod makernotes;
pub mod primitives;
pub mod tags;
pub mod value;
