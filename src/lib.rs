//! Parse `.env` files and load them into the environment.
//!
//! [`read`] and [`read_file`] turn `.env` text into an [`EnvMap`] without side
//! effects. [`parse_line`] classifies a single line.
//!
//! [`load`], [`overload`] and [`dotenv`] merge files into the process
//! environment and are `unsafe`, because callers must guarantee no concurrent
//! process-environment access. [`EnvLoader`] with an in-memory [`TargetEnv`]
//! gives the same merge semantics without touching the process.

mod env;
mod error;
mod interpolate;
mod loader;
mod model;
mod parser;

pub use env::TargetEnv;
pub use error::{Error, ParseError, ParseErrorKind};
pub use interpolate::interpolate;
pub use loader::{
    EnvLoader, dotenv, load, overload, read, read_file, read_file_with_policy, read_with_policy,
};
pub use model::{Entry, EnvMap, LoadReport, MalformedPolicy, ParseOutcome};
pub use parser::{parse_line, parse_pair};
