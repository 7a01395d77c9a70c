use std::io::{self, Write};

use crate::language::ast::{BinaryOp, Expr, Literal, Statement};
use crate::language::types::Type;
use crate::runtime::error::RuntimeError;
use crate::runtime::scope::{ScopeId, ScopeTree, Symbol, SymbolKind};
use crate::runtime::value::Value;

/// Outcome of a statement: fall through to the next one, or unwind the
/// enclosing call with a value.
#[derive(Clone, Debug, PartialEq)]
pub enum Flow {
    Next,
    Return(Value),
}

pub struct Interpreter<W: Write = io::Stdout> {
    scopes: ScopeTree,
    out: W,
    diagnostics: Vec<RuntimeError>,
}

impl Interpreter<io::Stdout> {
    pub fn new(scopes: ScopeTree) -> Self {
        Self::with_output(scopes, io::stdout())
    }
}

impl<W: Write> Interpreter<W> {
    pub fn with_output(scopes: ScopeTree, out: W) -> Self {
        Self {
            scopes,
            out,
            diagnostics: Vec::new(),
        }
    }

    pub fn scopes(&self) -> &ScopeTree {
        &self.scopes
    }

    pub fn scopes_mut(&mut self) -> &mut ScopeTree {
        &mut self.scopes
    }

    /// Diagnostics collected so far, in evaluation order.
    pub fn diagnostics(&self) -> &[RuntimeError] {
        &self.diagnostics
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Evaluates a program in the root scope. A top-level return stops the
    /// run and yields its value; otherwise the result is void.
    pub fn run(&mut self, program: &[Statement]) -> Value {
        let root = self.scopes.root();
        match self.eval_block(program, root) {
            Flow::Return(value) => value,
            Flow::Next => Value::Void,
        }
    }

    pub fn eval_statement(&mut self, statement: &Statement, scope: ScopeId) -> Flow {
        match statement {
            Statement::Declare { name, ty, init } => {
                if let Err(err) = self
                    .scopes
                    .declare(scope, name, ty.clone(), SymbolKind::Variable)
                {
                    log::debug!("{err}; treating the declaration as an assignment");
                }
                if let Some(init) = init {
                    let value = self.eval_expression(init, scope);
                    self.write_variable(name, &value, scope);
                }
                Flow::Next
            }
            Statement::Expr(expr) => {
                self.eval_expression(expr, scope);
                Flow::Next
            }
            Statement::Print(expr) => {
                let value = self.eval_expression(expr, scope);
                if let Err(err) = writeln!(self.out, "[PRINT OUTPUT]: {value}") {
                    log::error!("print write failed: {err}");
                }
                Flow::Next
            }
            Statement::Return(expr) => {
                let value = match expr {
                    Some(expr) => self.eval_expression(expr, scope),
                    None => Value::Void,
                };
                Flow::Return(value)
            }
        }
    }

    fn eval_block(&mut self, statements: &[Statement], scope: ScopeId) -> Flow {
        for statement in statements {
            if let Flow::Return(value) = self.eval_statement(statement, scope) {
                return Flow::Return(value);
            }
        }
        Flow::Next
    }

    pub fn eval_expression(&mut self, expr: &Expr, scope: ScopeId) -> Value {
        match expr {
            Expr::Literal(literal) => match literal {
                Literal::Int(v) => Value::Int(*v),
                Literal::Float(v) => Value::Float(*v),
                Literal::String(v) => Value::String(v.clone()),
                Literal::Bool(v) => Value::Bool(*v),
            },
            Expr::Identifier { name, ty } => match self.scopes.lookup(scope, name) {
                Some(symbol) => symbol.load(*ty),
                None => {
                    log::debug!("unresolved identifier `{name}`");
                    Value::Void
                }
            },
            Expr::Field { object, field, ty } => self.eval_field(object, field, *ty, scope),
            Expr::Binary {
                op,
                ty,
                left,
                right,
            } => self.eval_binary(*op, *ty, left, right, scope),
            Expr::Call { callee, args, ret } => {
                let values = self.eval_arguments(args, scope);
                self.call_function(callee, values, *ret, scope)
            }
            Expr::Assign { target, value } => {
                let value = self.eval_expression(value, scope);
                self.write_variable(target, &value, scope);
                value
            }
            Expr::FieldAssign {
                object,
                field,
                value,
            } => {
                let value = self.eval_expression(value, scope);
                self.write_field(object, field, &value, scope);
                value
            }
        }
    }

    // Arguments are evaluated in the caller's scope before the callee scope
    // exists, so an argument can never see the parameter it feeds.
    fn eval_arguments(&mut self, args: &[Expr], scope: ScopeId) -> Vec<Value> {
        args.iter()
            .map(|arg| self.eval_expression(arg, scope))
            .collect()
    }

    fn call_function(&mut self, name: &str, args: Vec<Value>, ret: Type, scope: ScopeId) -> Value {
        let function = self
            .scopes
            .lookup(scope, name)
            .and_then(|symbol| symbol.function.clone());
        let function = match function {
            Some(function) => function,
            None => {
                log::debug!("call to unresolved or bodiless function `{name}`");
                return Value::default_of(ret);
            }
        };

        log::debug!("call `{name}` with {} argument(s)", args.len());
        let callee_scope = self.scopes.push_scope(scope, &format!("{name}_call"));
        for (param, value) in function.params.iter().zip(args) {
            if let Err(err) =
                self.scopes
                    .declare(callee_scope, &param.name, param.ty.into(), SymbolKind::Parameter)
            {
                log::debug!("{err}");
            }
            if let Some(symbol) = self.scopes.lookup_local_mut(callee_scope, &param.name) {
                symbol.store(&value);
            }
        }

        match self.eval_block(&function.body, callee_scope) {
            Flow::Return(value) => value,
            Flow::Next => Value::default_of(ret),
        }
    }

    fn eval_field(&mut self, object: &str, field: &str, ty: Type, scope: ScopeId) -> Value {
        match self.resolve_field(object, field, scope) {
            Some(symbol) => symbol.load(ty),
            None => {
                log::debug!("unresolved field `{object}.{field}`");
                Value::default_of(ty)
            }
        }
    }

    fn resolve_field(&self, object: &str, field: &str, scope: ScopeId) -> Option<&Symbol> {
        let class = self.scopes.lookup(scope, object)?.ty.as_class()?;
        let class_scope = self.scopes.class_scope(class)?;
        self.scopes.lookup_local(class_scope, field)
    }

    fn write_variable(&mut self, name: &str, value: &Value, scope: ScopeId) {
        match self.scopes.lookup_mut(scope, name) {
            Some(symbol) => symbol.store(value),
            None => log::debug!("assignment to undeclared `{name}` ignored"),
        }
    }

    fn write_field(&mut self, object: &str, field: &str, value: &Value, scope: ScopeId) {
        let class = self
            .scopes
            .lookup(scope, object)
            .and_then(|symbol| symbol.ty.as_class())
            .map(str::to_owned);
        let target = class.and_then(|class| self.scopes.class_scope(&class));
        let symbol =
            target.and_then(|class_scope| self.scopes.lookup_local_mut(class_scope, field));
        match symbol {
            Some(symbol) => symbol.store(value),
            None => log::debug!("unresolved field `{object}.{field}`; assignment ignored"),
        }
    }

    fn eval_binary(
        &mut self,
        op: BinaryOp,
        ty: Type,
        left: &Expr,
        right: &Expr,
        scope: ScopeId,
    ) -> Value {
        // Comparisons dispatch on the static type of the left operand.
        let operand_ty = left.result_type();
        let lhs = self.eval_expression(left, scope);
        let rhs = self.eval_expression(right, scope);
        match op {
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
                self.eval_arithmetic(op, ty, lhs, rhs)
            }
            BinaryOp::And => Value::Bool(lhs.as_bool() && rhs.as_bool()),
            BinaryOp::Or => Value::Bool(lhs.as_bool() || rhs.as_bool()),
            BinaryOp::Eq
            | BinaryOp::Ne
            | BinaryOp::Lt
            | BinaryOp::Gt
            | BinaryOp::Le
            | BinaryOp::Ge => self.eval_comparison(op, operand_ty, lhs, rhs),
        }
    }

    fn eval_arithmetic(&mut self, op: BinaryOp, ty: Type, lhs: Value, rhs: Value) -> Value {
        match (ty, op) {
            (Type::Int, BinaryOp::Add) => Value::Int(lhs.as_int().wrapping_add(rhs.as_int())),
            (Type::Int, BinaryOp::Sub) => Value::Int(lhs.as_int().wrapping_sub(rhs.as_int())),
            (Type::Int, BinaryOp::Mul) => Value::Int(lhs.as_int().wrapping_mul(rhs.as_int())),
            (Type::Int, BinaryOp::Div) => {
                let divisor = rhs.as_int();
                if divisor == 0 {
                    self.report(RuntimeError::DivisionByZero { ty });
                    Value::Int(0)
                } else {
                    Value::Int(lhs.as_int().wrapping_div(divisor))
                }
            }
            (Type::Float, BinaryOp::Add) => Value::Float(lhs.as_float() + rhs.as_float()),
            (Type::Float, BinaryOp::Sub) => Value::Float(lhs.as_float() - rhs.as_float()),
            (Type::Float, BinaryOp::Mul) => Value::Float(lhs.as_float() * rhs.as_float()),
            (Type::Float, BinaryOp::Div) => {
                let divisor = rhs.as_float();
                if divisor == 0.0 {
                    self.report(RuntimeError::DivisionByZero { ty });
                    Value::Float(0.0)
                } else {
                    Value::Float(lhs.as_float() / divisor)
                }
            }
            (Type::String, BinaryOp::Add) => {
                Value::String(format!("{}{}", lhs.as_str(), rhs.as_str()))
            }
            _ => {
                self.report(RuntimeError::UnsupportedOperand { op, ty });
                Value::Void
            }
        }
    }

    fn eval_comparison(&mut self, op: BinaryOp, operand_ty: Type, lhs: Value, rhs: Value) -> Value {
        match op {
            BinaryOp::Eq | BinaryOp::Ne => {
                let equal = match operand_ty {
                    Type::Int => lhs.as_int() == rhs.as_int(),
                    Type::Float => lhs.as_float() == rhs.as_float(),
                    Type::Bool => lhs.as_bool() == rhs.as_bool(),
                    Type::String => lhs.as_str() == rhs.as_str(),
                    Type::Void => {
                        self.report(RuntimeError::UnsupportedOperand { op, ty: operand_ty });
                        false
                    }
                };
                Value::Bool(if op == BinaryOp::Eq { equal } else { !equal })
            }
            BinaryOp::Lt => self.eval_ordering(op, operand_ty, lhs, rhs, |a, b| a < b),
            BinaryOp::Gt => self.eval_ordering(op, operand_ty, lhs, rhs, |a, b| a > b),
            BinaryOp::Le => self.eval_ordering(op, operand_ty, lhs, rhs, |a, b| a <= b),
            BinaryOp::Ge => self.eval_ordering(op, operand_ty, lhs, rhs, |a, b| a >= b),
            _ => unreachable!(),
        }
    }

    fn eval_ordering<F>(
        &mut self,
        op: BinaryOp,
        operand_ty: Type,
        lhs: Value,
        rhs: Value,
        cmp: F,
    ) -> Value
    where
        F: Fn(f64, f64) -> bool,
    {
        match operand_ty {
            Type::Int => Value::Bool(cmp(lhs.as_int() as f64, rhs.as_int() as f64)),
            Type::Float => Value::Bool(cmp(lhs.as_float() as f64, rhs.as_float() as f64)),
            _ => {
                self.report(RuntimeError::UnsupportedOperand { op, ty: operand_ty });
                Value::Bool(false)
            }
        }
    }

    fn report(&mut self, error: RuntimeError) {
        log::error!("{error}");
        self.diagnostics.push(error);
    }
}
