//! # typegen
//!
//! Formats SQL embedded in Go sources and generates typed result structs
//! from a live Postgres schema.
//!
//! For every raw string literal passed to a recognized data-access method
//! (`db.Select(&rows, `...`)`, `tx.GetContext(ctx, &row, `...`)`, ...):
//!
//! 1. the query is pretty-printed by an external SQL formatter and written
//!    back into the literal, indented to match the surrounding code;
//! 2. for result-returning methods, the query's columns are described
//!    through a temporary view, a struct type with a deterministic name is
//!    synthesized, and the enclosing function's record result (plus its
//!    matching `var` declarations) is renamed to it;
//! 3. the types of every package are written into one
//!    `typegen_<package>.go` file next to its sources.
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use typegen::prelude::*;
//!
//! let config = Config::load(Path::new("."), None)?;
//! let engine = Engine::connect(config).await?;
//! let report = engine.run().await?;
//! report.diagnostics.into_result()?;
//! ```

pub mod config;
pub mod engine;
pub mod enums;
pub mod error;
pub mod extractor;
pub mod formatter;
pub mod gotools;
pub mod indent;
pub mod introspect;
pub mod methods;
pub mod naming;
pub mod normalize;
pub mod package;
pub mod pipeline;
pub mod planner;
pub mod process;
pub mod source;
pub mod typegen;

pub mod prelude {
    pub use crate::config::Config;
    pub use crate::engine::{Collaborators, Engine, Report};
    pub use crate::enums::{EnumConfig, EnumSource};
    pub use crate::error::*;
    pub use crate::formatter::{PgFormat, QueryFormatter};
    pub use crate::gotools::{GoToolchain, GoTools};
    pub use crate::introspect::{Column, PgIntrospector, SchemaIntrospector};
    pub use crate::methods::{Capabilities, Capability, QueryMethod};
    pub use crate::typegen::GeneratedType;
}

pub use engine::{Engine, Report};
