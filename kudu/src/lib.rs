//! JIT specialization and content-addressed caching for ABI-driven binary codecs.
//!
//! An ABI document (§4.B) describes a family of wire types - scalars, structs with single
//! inheritance, tagged variants, and aliases that can wrap any of those in `[]` (array),
//! `?` (optional), or `$` (trailing binary-extension) modifiers. This crate turns one of
//! those documents into a [`specializer::Artifact`] that can [`pack`]/[`unpack`] any named
//! type against a dynamically-typed [`Value`], and caches that artifact on disk so the work
//! of resolving the ABI's type graph happens at most once per process per machine.
//!
//! The pieces, in the order data flows through them:
//!
//! - [`abi::document`] / [`abi::validator`] - parse and validate an ABI document's JSON text
//!   into a normalized [`abi::document::AbiDocument`], regardless of which of the two wire
//!   shapes (contract ABI or streaming ABI) produced it.
//! - [`abi::view`] - merge a parsed document with the built-in scalar/alias/struct tables
//!   into an immutable [`abi::view::ABIView`], computing its content hash along the way.
//! - [`abi::resolver`] - follow alias chains and classify a type expression down to a
//!   terminal std/struct/variant/raw kind, detecting cycles.
//! - [`abi::codec`] - the byte-exact `pack`/`unpack` implementation.
//! - [`specializer`] - precomputes a dispatch table over an `ABIView` so repeated pack/unpack
//!   calls against the same ABI don't re-resolve type names from scratch.
//! - [`cache`] - persists a built [`specializer::Artifact`] under a content-addressed,
//!   fingerprinted directory, safe for concurrent readers and writers across processes.
//! - [`context`] - [`context::Context::module_for_abi`], the single entry point most callers
//!   need: parse, resolve, fingerprint, check the cache, specialize on a miss.
//!
//! # Feature flags
//!
//! - `cli`: compiles the `kuduconv` command-line conversion tool alongside the library.
//!   Enabled by default.

#![allow(clippy::should_implement_trait)]

pub mod abi;
pub mod bytestream;
pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod specializer;
pub mod value;

pub use abi::{pack, unpack, ABIView, AbiDocument};
pub use bytestream::{ByteStream, StreamError};
pub use config::BuildParams;
pub use context::Context;
pub use error::{Error, Result};
pub use specializer::Artifact;
pub use value::Value;
