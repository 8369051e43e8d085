//! Contaminant sources.

mod injection;

pub use injection::{Injection, InjectionLocation};

pub(crate) use injection::is_contributing;
