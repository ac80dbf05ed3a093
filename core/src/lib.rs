//! Root of the `profilesmith-core` library.
//!
//! The pipeline has three stages: tiered resolution of upstream
//! specification documents, normalization into a canonical section and
//! parameter model, and serialization of user-modified values into a
//! configuration-profile document. `engine::Pipeline` composes the three;
//! the stage modules are public for callers that want a single piece.

// Prevent accidental direct writes to stdout/stderr in library code. All
// user-visible output belongs to the CLI layer.
#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod cache;
pub mod config;
pub mod engine;
pub mod errors;
pub mod fallback;
pub mod model;
pub mod normalize;
pub mod profile;
pub mod resolver;
pub mod source;
pub mod store;

pub use config::PipelineConfig;
pub use engine::Pipeline;
pub use errors::{CacheError, ConfigError, ExportError, FetchError, ResolveError};
pub use model::{
    Parameter, ParameterType, ParameterValue, Platform, Section, SpecDocument, derive_identifier,
};
pub use profile::ProfileMeta;
pub use resolver::Resolver;
pub use source::{HttpSource, SpecificationSource};
pub use store::{ModifiedValueStore, ValueMeta};

/// Library version, surfaced by the CLI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
