use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::language::ast::Statement;
use crate::language::types::{Type, TypeExpr};
use crate::runtime::error::{ScopeError, ScopeResult};
use crate::runtime::value::Value;

/// Index of a scope inside its [`ScopeTree`]. Stays valid for the lifetime of
/// the tree; scopes are never removed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Parameter,
    Function,
    Member,
    Class,
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            SymbolKind::Variable => "variable",
            SymbolKind::Parameter => "parameter",
            SymbolKind::Function => "function",
            SymbolKind::Member => "member",
            SymbolKind::Class => "class",
        };
        f.write_str(kind)
    }
}

#[derive(Clone, Debug)]
pub struct Param {
    pub name: String,
    pub ty: Type,
}

#[derive(Debug)]
pub struct Function {
    pub params: Vec<Param>,
    pub body: Vec<Statement>,
}

#[derive(Clone, Debug)]
pub struct Symbol {
    pub name: String,
    pub ty: TypeExpr,
    pub value: String,
    pub kind: SymbolKind,
    pub function: Option<Rc<Function>>,
}

impl Symbol {
    /// Reads the stored text back as a value of `ty`.
    pub fn load(&self, ty: Type) -> Value {
        Value::decode(ty, &self.value)
    }

    pub fn store(&mut self, value: &Value) {
        self.value = value.encode();
    }
}

#[derive(Debug)]
pub struct Scope {
    name: String,
    parent: Option<ScopeId>,
    children: Vec<ScopeId>,
    symbols: BTreeMap<String, Symbol>,
}

impl Scope {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<ScopeId> {
        self.parent
    }

    pub fn children(&self) -> &[ScopeId] {
        &self.children
    }

    pub fn symbol(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.values()
    }
}

/// Arena of every scope a program has entered, rooted at `Global`. Scopes are
/// retained after evaluation leaves them so the tree can be dumped whole.
#[derive(Debug)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
}

impl ScopeTree {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope {
                name: "Global".to_string(),
                parent: None,
                children: Vec::new(),
                symbols: BTreeMap::new(),
            }],
        }
    }

    pub fn root(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0]
    }

    pub fn parent(&self, id: ScopeId) -> Option<ScopeId> {
        self.scopes[id.0].parent
    }

    pub fn push_scope(&mut self, parent: ScopeId, name: &str) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope {
            name: name.to_string(),
            parent: Some(parent),
            children: Vec::new(),
            symbols: BTreeMap::new(),
        });
        self.scopes[parent.0].children.push(id);
        id
    }

    /// Declares a fresh symbol in `scope`. Fails if the name is already bound
    /// there; bindings in enclosing scopes are shadowed, not touched.
    pub fn declare(
        &mut self,
        scope: ScopeId,
        name: &str,
        ty: TypeExpr,
        kind: SymbolKind,
    ) -> ScopeResult<()> {
        self.insert(
            scope,
            Symbol {
                name: name.to_string(),
                ty,
                value: String::new(),
                kind,
                function: None,
            },
        )
    }

    /// Registers a class: a symbol in the root scope plus a member scope
    /// under the root, both carrying the class name.
    pub fn declare_class(&mut self, name: &str) -> ScopeResult<ScopeId> {
        self.declare(self.root(), name, TypeExpr::class(name), SymbolKind::Class)?;
        Ok(self.push_scope(self.root(), name))
    }

    fn insert(&mut self, scope: ScopeId, symbol: Symbol) -> ScopeResult<()> {
        let slot = &mut self.scopes[scope.0];
        if slot.symbols.contains_key(&symbol.name) {
            return Err(ScopeError::Redeclaration {
                name: symbol.name,
                scope: slot.name.clone(),
            });
        }
        slot.symbols.insert(symbol.name.clone(), symbol);
        Ok(())
    }

    /// Resolves `name` from `from` outwards through the parent chain.
    pub fn lookup(&self, from: ScopeId, name: &str) -> Option<&Symbol> {
        let mut current = Some(from);
        while let Some(id) = current {
            if let Some(symbol) = self.scopes[id.0].symbols.get(name) {
                return Some(symbol);
            }
            current = self.scopes[id.0].parent;
        }
        None
    }

    pub fn lookup_mut(&mut self, from: ScopeId, name: &str) -> Option<&mut Symbol> {
        let mut current = Some(from);
        while let Some(id) = current {
            if self.scopes[id.0].symbols.contains_key(name) {
                return self.scopes[id.0].symbols.get_mut(name);
            }
            current = self.scopes[id.0].parent;
        }
        None
    }

    pub fn lookup_local(&self, scope: ScopeId, name: &str) -> Option<&Symbol> {
        self.scopes[scope.0].symbols.get(name)
    }

    pub fn lookup_local_mut(&mut self, scope: ScopeId, name: &str) -> Option<&mut Symbol> {
        self.scopes[scope.0].symbols.get_mut(name)
    }

    pub fn contains(&self, from: ScopeId, name: &str) -> bool {
        self.lookup(from, name).is_some()
    }

    /// Finds the member scope of a class by name. Only direct children of the
    /// root qualify; nested scopes never shadow a class.
    pub fn class_scope(&self, name: &str) -> Option<ScopeId> {
        self.scopes[0]
            .children
            .iter()
            .copied()
            .find(|id| self.scopes[id.0].name == name)
    }

    fn fmt_scope(&self, f: &mut fmt::Formatter<'_>, id: ScopeId, depth: usize) -> fmt::Result {
        let indent = "    ".repeat(depth);
        let scope = &self.scopes[id.0];
        writeln!(f, "{indent}=== SCOPE: {} ===", scope.name)?;
        if let Some(parent) = scope.parent {
            writeln!(f, "{indent}Parent: {}", self.scopes[parent.0].name)?;
        }
        writeln!(f, "{indent}Symbols:")?;
        for symbol in scope.symbols.values() {
            write!(
                f,
                "{indent} [Name: {}, Type: {}, Cat: {}, Val: {}",
                symbol.name, symbol.ty, symbol.kind, symbol.value
            )?;
            if let Some(function) = &symbol.function {
                if !function.params.is_empty() {
                    let params: Vec<String> = function
                        .params
                        .iter()
                        .map(|param| format!("{} {}", param.ty, param.name))
                        .collect();
                    write!(f, ", Params: ({})", params.join(", "))?;
                }
            }
            writeln!(f, "]")?;
        }
        writeln!(f)?;
        for child in &scope.children {
            self.fmt_scope(f, *child, depth + 1)?;
        }
        Ok(())
    }
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ScopeTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_scope(f, self.root(), 0)
    }
}

/// Assembles a function symbol and commits it in one step, so a half-built
/// function is never observable in the tree.
pub struct FunctionBuilder {
    name: String,
    ret: Type,
    params: Vec<Param>,
    body: Vec<Statement>,
}

impl FunctionBuilder {
    pub fn new(name: impl Into<String>, ret: Type) -> Self {
        Self {
            name: name.into(),
            ret,
            params: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn param(mut self, name: impl Into<String>, ty: Type) -> Self {
        self.params.push(Param {
            name: name.into(),
            ty,
        });
        self
    }

    pub fn body(mut self, body: Vec<Statement>) -> Self {
        self.body = body;
        self
    }

    pub fn declare_in(self, scopes: &mut ScopeTree, scope: ScopeId) -> ScopeResult<()> {
        scopes.insert(
            scope,
            Symbol {
                name: self.name,
                ty: TypeExpr::Primitive(self.ret),
                value: String::new(),
                kind: SymbolKind::Function,
                function: Some(Rc::new(Function {
                    params: self.params,
                    body: self.body,
                })),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_scope_is_named_global() {
        let tree = ScopeTree::new();
        assert_eq!(tree.scope(tree.root()).name(), "Global");
        assert_eq!(tree.parent(tree.root()), None);
    }

    #[test]
    fn declare_then_lookup_finds_the_symbol() {
        let mut tree = ScopeTree::new();
        let root = tree.root();
        tree.declare(root, "x", Type::Int.into(), SymbolKind::Variable)
            .unwrap();
        let symbol = tree.lookup(root, "x").unwrap();
        assert_eq!(symbol.ty, TypeExpr::Primitive(Type::Int));
        assert_eq!(symbol.kind, SymbolKind::Variable);
        assert!(tree.contains(root, "x"));
        assert!(!tree.contains(root, "y"));
    }

    #[test]
    fn redeclaration_in_same_scope_fails() {
        let mut tree = ScopeTree::new();
        let root = tree.root();
        tree.declare(root, "x", Type::Int.into(), SymbolKind::Variable)
            .unwrap();
        let err = tree
            .declare(root, "x", Type::Float.into(), SymbolKind::Variable)
            .unwrap_err();
        assert_eq!(
            err,
            ScopeError::Redeclaration {
                name: "x".to_string(),
                scope: "Global".to_string(),
            }
        );
        // the original binding is untouched
        assert_eq!(
            tree.lookup(root, "x").unwrap().ty,
            TypeExpr::Primitive(Type::Int)
        );
    }

    #[test]
    fn child_scope_shadows_without_touching_outer_binding() {
        let mut tree = ScopeTree::new();
        let root = tree.root();
        let inner = tree.push_scope(root, "inner");
        tree.declare(root, "x", Type::Int.into(), SymbolKind::Variable)
            .unwrap();
        tree.declare(inner, "x", Type::String.into(), SymbolKind::Variable)
            .unwrap();

        assert_eq!(
            tree.lookup(inner, "x").unwrap().ty,
            TypeExpr::Primitive(Type::String)
        );
        assert_eq!(
            tree.lookup(root, "x").unwrap().ty,
            TypeExpr::Primitive(Type::Int)
        );
    }

    #[test]
    fn lookup_walks_the_parent_chain_to_the_root() {
        let mut tree = ScopeTree::new();
        let root = tree.root();
        tree.declare(root, "g", Type::Bool.into(), SymbolKind::Variable)
            .unwrap();
        let mid = tree.push_scope(root, "mid");
        let leaf = tree.push_scope(mid, "leaf");
        assert!(tree.lookup(leaf, "g").is_some());
        assert!(tree.lookup(leaf, "missing").is_none());
    }

    #[test]
    fn lookup_local_does_not_chain() {
        let mut tree = ScopeTree::new();
        let root = tree.root();
        tree.declare(root, "x", Type::Int.into(), SymbolKind::Variable)
            .unwrap();
        let inner = tree.push_scope(root, "inner");
        assert!(tree.lookup_local(inner, "x").is_none());
        assert!(tree.lookup_local(root, "x").is_some());
    }

    #[test]
    fn store_then_load_round_trips_through_text() {
        let mut tree = ScopeTree::new();
        let root = tree.root();
        tree.declare(root, "x", Type::Int.into(), SymbolKind::Variable)
            .unwrap();
        tree.lookup_mut(root, "x").unwrap().store(&Value::Int(42));
        assert_eq!(tree.lookup(root, "x").unwrap().value, "42");
        assert_eq!(tree.lookup(root, "x").unwrap().load(Type::Int), Value::Int(42));
    }

    #[test]
    fn fresh_symbol_loads_as_zero_default() {
        let mut tree = ScopeTree::new();
        let root = tree.root();
        tree.declare(root, "b", Type::Bool.into(), SymbolKind::Variable)
            .unwrap();
        assert_eq!(tree.lookup(root, "b").unwrap().load(Type::Bool), Value::Bool(false));
    }

    #[test]
    fn declare_class_registers_symbol_and_member_scope() {
        let mut tree = ScopeTree::new();
        let class = tree.declare_class("Dog").unwrap();
        assert_eq!(tree.scope(class).name(), "Dog");
        assert_eq!(tree.parent(class), Some(tree.root()));
        let symbol = tree.lookup(tree.root(), "Dog").unwrap();
        assert_eq!(symbol.kind, SymbolKind::Class);
        assert_eq!(symbol.ty, TypeExpr::class("Dog"));
        assert_eq!(tree.class_scope("Dog"), Some(class));
    }

    #[test]
    fn class_scope_only_searches_direct_children_of_root() {
        let mut tree = ScopeTree::new();
        let root = tree.root();
        let mid = tree.push_scope(root, "mid");
        tree.push_scope(mid, "Buried");
        assert_eq!(tree.class_scope("Buried"), None);
        assert_eq!(tree.class_scope("mid"), Some(mid));
    }

    #[test]
    fn function_builder_commits_a_callable_symbol() {
        let mut tree = ScopeTree::new();
        let root = tree.root();
        FunctionBuilder::new("add", Type::Int)
            .param("a", Type::Int)
            .param("b", Type::Int)
            .body(Vec::new())
            .declare_in(&mut tree, root)
            .unwrap();

        let symbol = tree.lookup(root, "add").unwrap();
        assert_eq!(symbol.kind, SymbolKind::Function);
        assert_eq!(symbol.ty, TypeExpr::Primitive(Type::Int));
        let function = symbol.function.as_ref().unwrap();
        assert_eq!(function.params.len(), 2);
        assert_eq!(function.params[0].name, "a");
    }

    #[test]
    fn function_builder_reports_redeclaration() {
        let mut tree = ScopeTree::new();
        let root = tree.root();
        FunctionBuilder::new("f", Type::Void)
            .declare_in(&mut tree, root)
            .unwrap();
        let err = FunctionBuilder::new("f", Type::Int)
            .declare_in(&mut tree, root)
            .unwrap_err();
        assert!(matches!(err, ScopeError::Redeclaration { .. }));
    }

    #[test]
    fn dump_lists_scopes_parents_and_symbols() {
        let mut tree = ScopeTree::new();
        let root = tree.root();
        tree.declare(root, "x", Type::Int.into(), SymbolKind::Variable)
            .unwrap();
        tree.lookup_mut(root, "x").unwrap().store(&Value::Int(5));
        let call = tree.push_scope(root, "f_call");
        tree.declare(call, "a", Type::Float.into(), SymbolKind::Parameter)
            .unwrap();
        FunctionBuilder::new("add", Type::Int)
            .param("a", Type::Int)
            .param("b", Type::Int)
            .declare_in(&mut tree, root)
            .unwrap();

        let dump = tree.to_string();
        assert!(dump.contains("=== SCOPE: Global ==="));
        assert!(dump.contains(" [Name: x, Type: BOI, Cat: variable, Val: 5]"));
        assert!(dump.contains(" [Name: add, Type: BOI, Cat: function, Val: , Params: (BOI a, BOI b)]"));
        assert!(dump.contains("    === SCOPE: f_call ==="));
        assert!(dump.contains("    Parent: Global"));
        assert!(dump.contains("     [Name: a, Type: WIGGLY, Cat: parameter, Val: ]"));
    }
}
