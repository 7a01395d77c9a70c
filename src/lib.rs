pub mod language;
pub mod runtime;
