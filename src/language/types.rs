use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    Int,
    Float,
    String,
    Bool,
    Void,
}

impl Type {
    pub fn keyword(self) -> &'static str {
        match self {
            Type::Int => "BOI",
            Type::Float => "WIGGLY",
            Type::String => "YAP",
            Type::Bool => "TRUTHMODE",
            Type::Void => "BLACK",
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeExpr {
    Primitive(Type),
    Class(String),
}

impl TypeExpr {
    pub fn class(name: impl Into<String>) -> Self {
        TypeExpr::Class(name.into())
    }

    pub fn as_class(&self) -> Option<&str> {
        match self {
            TypeExpr::Class(name) => Some(name),
            TypeExpr::Primitive(_) => None,
        }
    }
}

impl From<Type> for TypeExpr {
    fn from(ty: Type) -> Self {
        TypeExpr::Primitive(ty)
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Primitive(ty) => ty.fmt(f),
            TypeExpr::Class(name) => f.write_str(name),
        }
    }
}
