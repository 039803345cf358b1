//! Per-component error enums (§7) plus the aggregate [`Error`] callers can use when they
//! don't need to match on which stage failed.
//!
//! One `snafu` enum per component boundary, mirroring the granularity of
//! `antelope/src/binaryserializable.rs`'s `SerializeError` and `antelope/src/abi/abi.rs`'s
//! `ABIError`. `impl_auto_error_conversion!` is kept verbatim from
//! `antelope-core/src/error.rs` (it needs no proc-macro support, just `snafu::IntoError`).

use snafu::Snafu;

use crate::bytestream::StreamError;

/// Need to `use snafu::IntoError` in order to be able to use this macro.
#[macro_export]
macro_rules! impl_auto_error_conversion {
    ($src:ty, $target:ty, $snafu:ident) => {
        impl From<$src> for $target {
            fn from(value: $src) -> $target {
                use snafu::IntoError;
                $snafu.into_error(value)
            }
        }
    };
}

// -----------------------------------------------------------------------------
//     4.A Validator
// -----------------------------------------------------------------------------

#[derive(Debug, Snafu)]
pub enum ValidatorError {
    #[snafu(display("invalid identifier: {name:?}"))]
    InvalidName { name: String },

    #[snafu(display("invalid type expression: {expr:?}"))]
    InvalidTypeExpr { expr: String },

    #[snafu(display("fixed-size array syntax is not supported: {expr:?}"))]
    FixedSizeArray { expr: String },
}

// -----------------------------------------------------------------------------
//     4.B Parser
// -----------------------------------------------------------------------------

#[derive(Debug, Snafu)]
pub enum ParseError {
    #[snafu(display("malformed ABI document: {source}"))]
    MalformedAbi { source: serde_json::Error },

    #[snafu(display("{source}"), context(false))]
    InvalidName { source: ValidatorError },

    #[snafu(display("struct {struct_name:?} has non-extension field {field_name:?} following an extension field (I3)"))]
    NonTrailingExtensionField { struct_name: String, field_name: String },

    #[snafu(display("variant {name:?} has no members (I4)"))]
    EmptyVariant { name: String },
}

// -----------------------------------------------------------------------------
//     4.C Resolver
// -----------------------------------------------------------------------------

#[derive(Debug, Snafu)]
pub enum ResolverError {
    #[snafu(display("unknown type {name:?}, known names: {known}"))]
    UnknownType { name: String, known: String },

    #[snafu(display("alias cycle detected while resolving {name:?}: {chain}"))]
    AliasCycle { name: String, chain: String },

    #[snafu(display("{source}"), context(false))]
    InvalidTypeExpr { source: ValidatorError },

    #[snafu(display("duplicate definition of {kind} {name:?}"))]
    DuplicateName { kind: &'static str, name: String },

    #[snafu(display("struct {struct_name:?} has non-extension field {field_name:?} following an extension field (I3)"))]
    NonTrailingExtensionField { struct_name: String, field_name: String },

    #[snafu(display("variant {name:?} has no members (I4)"))]
    EmptyVariant { name: String },
}

// -----------------------------------------------------------------------------
//     4.D Codec - pack
// -----------------------------------------------------------------------------

#[derive(Debug, Snafu)]
pub enum EncodeError {
    #[snafu(display("value {value} does not fit in {type_name} (field path: {path})"))]
    Range { type_name: String, value: String, path: String },

    #[snafu(display("expected a value of type {type_name} at {path}, got {got}"))]
    Type { type_name: String, got: &'static str, path: String },

    #[snafu(display("string at {path} is not a valid UTF-8 byte sequence"))]
    InvalidUtf8 { path: String },

    #[snafu(display("variant {variant} has more than one alternative of category {category:?}, cannot infer tag for a bare scalar at {path}"))]
    AmbiguousVariant { variant: String, category: String, path: String },

    #[snafu(display("no alternative of variant {variant} matches value at {path}"))]
    NoMatchingVariant { variant: String, path: String },

    #[snafu(display("unknown type {name:?} in dispatch"))]
    UnknownType { name: String },

    #[snafu(display("{source}"), context(false))]
    Resolve { source: ResolverError },
}

// -----------------------------------------------------------------------------
//     4.D Codec - unpack
// -----------------------------------------------------------------------------

#[derive(Debug, Snafu)]
pub enum DecodeError {
    #[snafu(display("{source}"), context(false))]
    Underflow { source: StreamError },

    #[snafu(display("{} trailing byte(s) left after decoding", count))]
    TrailingBytes { count: usize },

    #[snafu(display("invalid variant tag {tag} for variant {variant} with {num_members} alternative(s)"))]
    InvalidTag { variant: String, tag: u32, num_members: usize },

    #[snafu(display("decoded bytes at {path} are not valid UTF-8"))]
    InvalidUtf8 { path: String },

    #[snafu(display("invalid flag byte {byte:#x} at {path}, expected 0x00 or 0x01"))]
    InvalidFlag { byte: u8, path: String },

    #[snafu(display("unknown type {name:?} in dispatch"))]
    UnknownType { name: String },

    #[snafu(display("{source}"), context(false))]
    Resolve { source: ResolverError },
}

// -----------------------------------------------------------------------------
//     4.E Specializer
// -----------------------------------------------------------------------------

#[derive(Debug, Snafu)]
pub enum SpecializerError {
    #[snafu(display("{source}"), context(false))]
    Resolve { source: ResolverError },

    #[snafu(display("artifact was built with {what} disabled"))]
    Disabled { what: &'static str },

    #[snafu(display("no type named {name:?} in this artifact"))]
    UnknownType { name: String },
}

// -----------------------------------------------------------------------------
//     4.F Cache
// -----------------------------------------------------------------------------

#[derive(Debug, Snafu)]
pub enum CacheError {
    #[snafu(display("I/O error on {path}: {source}"))]
    Io { path: String, source: std::io::Error },

    #[snafu(display("failed to (de)serialize cached artifact at {path}: {source}"))]
    Serde { path: String, source: bincode::Error },

    #[snafu(display("cache is readonly, cannot build a missing artifact for {logical_name:?}"))]
    Readonly { logical_name: String },

    #[snafu(display("cache miss for {logical_name:?} and readonly context cannot build it"))]
    CacheMiss { logical_name: String },
}

// -----------------------------------------------------------------------------
//     4.G Context
// -----------------------------------------------------------------------------

#[derive(Debug, Snafu)]
pub enum ContextError {
    #[snafu(display("{source}"), context(false))]
    Parse { source: ParseError },

    #[snafu(display("{source}"), context(false))]
    Resolve { source: ResolverError },

    #[snafu(display("{source}"), context(false))]
    Specialize { source: SpecializerError },

    #[snafu(display("{source}"), context(false))]
    Cache { source: CacheError },
}

// -----------------------------------------------------------------------------
//     Aggregate error
// -----------------------------------------------------------------------------

/// Sum of every per-component error, for callers who just want one `Result<T, Error>`.
#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("{source}"), context(false))]
    Validator { source: ValidatorError },

    #[snafu(display("{source}"), context(false))]
    Parse { source: ParseError },

    #[snafu(display("{source}"), context(false))]
    Resolve { source: ResolverError },

    #[snafu(display("{source}"), context(false))]
    Encode { source: EncodeError },

    #[snafu(display("{source}"), context(false))]
    Decode { source: DecodeError },

    #[snafu(display("{source}"), context(false))]
    Specialize { source: SpecializerError },

    #[snafu(display("{source}"), context(false))]
    Cache { source: CacheError },

    #[snafu(display("{source}"), context(false))]
    Context { source: ContextError },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
