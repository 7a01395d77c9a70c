pub mod error;
pub mod interpreter;
pub mod scope;
pub mod value;

pub use interpreter::{Flow, Interpreter};
pub use scope::{FunctionBuilder, ScopeId, ScopeTree};
pub use value::Value;
