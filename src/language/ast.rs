use std::fmt;

use crate::language::types::{Type, TypeExpr};

#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Int(i32),
    Float(f32),
    String(String),
    Bool(bool),
}

impl Literal {
    pub fn ty(&self) -> Type {
        match self {
            Literal::Int(_) => Type::Int,
            Literal::Float(_) => Type::Float,
            Literal::String(_) => Type::String,
            Literal::Bool(_) => Type::Bool,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    And,
    Or,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
        };
        f.write_str(symbol)
    }
}

#[derive(Clone, Debug)]
pub enum Expr {
    Literal(Literal),
    Identifier {
        name: String,
        ty: Type,
    },
    Field {
        object: String,
        field: String,
        ty: Type,
    },
    Binary {
        op: BinaryOp,
        ty: Type,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Call {
        callee: String,
        args: Vec<Expr>,
        ret: Type,
    },
    Assign {
        target: String,
        value: Box<Expr>,
    },
    FieldAssign {
        object: String,
        field: String,
        value: Box<Expr>,
    },
}

impl Expr {
    pub fn binary(op: BinaryOp, ty: Type, left: Expr, right: Expr) -> Self {
        Expr::Binary {
            op,
            ty,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn assign(target: impl Into<String>, value: Expr) -> Self {
        Expr::Assign {
            target: target.into(),
            value: Box::new(value),
        }
    }

    pub fn field_assign(object: impl Into<String>, field: impl Into<String>, value: Expr) -> Self {
        Expr::FieldAssign {
            object: object.into(),
            field: field.into(),
            value: Box::new(value),
        }
    }

    /// Static type the node produces, as recorded by the semantic pass.
    pub fn result_type(&self) -> Type {
        match self {
            Expr::Literal(literal) => literal.ty(),
            Expr::Identifier { ty, .. } => *ty,
            Expr::Field { ty, .. } => *ty,
            Expr::Binary { ty, .. } => *ty,
            Expr::Call { ret, .. } => *ret,
            Expr::Assign { value, .. } => value.result_type(),
            Expr::FieldAssign { value, .. } => value.result_type(),
        }
    }
}

#[derive(Clone, Debug)]
pub enum Statement {
    Declare {
        name: String,
        ty: TypeExpr,
        init: Option<Expr>,
    },
    Expr(Expr),
    Print(Expr),
    Return(Option<Expr>),
}
