use std::fmt;

use crate::language::types::Type;

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Int(i32),
    Float(f32),
    String(String),
    Bool(bool),
    Void,
}

impl Value {
    pub fn ty(&self) -> Type {
        match self {
            Value::Int(_) => Type::Int,
            Value::Float(_) => Type::Float,
            Value::String(_) => Type::String,
            Value::Bool(_) => Type::Bool,
            Value::Void => Type::Void,
        }
    }

    pub fn default_of(ty: Type) -> Value {
        match ty {
            Type::Int => Value::Int(0),
            Type::Float => Value::Float(0.0),
            Type::String => Value::String(String::new()),
            Type::Bool => Value::Bool(false),
            Type::Void => Value::Void,
        }
    }

    pub fn as_int(&self) -> i32 {
        match self {
            Value::Int(v) => *v,
            _ => 0,
        }
    }

    pub fn as_float(&self) -> f32 {
        match self {
            Value::Float(v) => *v,
            _ => 0.0,
        }
    }

    pub fn as_bool(&self) -> bool {
        match self {
            Value::Bool(v) => *v,
            _ => false,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Value::String(v) => v,
            _ => "",
        }
    }

    /// Canonical text form used for symbol storage. Bools encode as `1`/`0`.
    pub fn encode(&self) -> String {
        match self {
            Value::Int(v) => v.to_string(),
            Value::Float(v) => v.to_string(),
            Value::String(v) => v.clone(),
            Value::Bool(true) => "1".to_string(),
            Value::Bool(false) => "0".to_string(),
            Value::Void => String::new(),
        }
    }

    /// Rebuilds a value of `ty` from its canonical text form. Text that does
    /// not parse as `ty` degrades to the zero default for that type.
    pub fn decode(ty: Type, text: &str) -> Value {
        match ty {
            Type::Int => Value::Int(text.parse().unwrap_or_default()),
            Type::Float => Value::Float(text.parse().unwrap_or_default()),
            Type::String => Value::String(text.to_string()),
            Type::Bool => Value::Bool(text == "1"),
            Type::Void => Value::Void,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::String(v) => f.write_str(v),
            Value::Bool(true) => f.write_str("BASED"),
            Value::Bool(false) => f.write_str("CRINGE"),
            Value::Void => f.write_str("void"),
        }
    }
}
