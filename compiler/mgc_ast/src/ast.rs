// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The abstract syntax tree for mg. The parser produces this tree as-is;
//! the loader rewrites `File` namespace entries to absolute paths, and the
//! semantic analyzer consumes it to produce the typed HIR.

use indenter::{indented, Indented};
use mgc_data_structures::span::Span;
use std::{
    fmt::{self, Display, Formatter, Write},
    rc::Rc,
};

fn set_indentation<'a, 'b>(
    indent: Indented<'a, Formatter<'b>>,
    level: usize,
) -> Indented<'a, Formatter<'b>> {
    match level {
        0 => indent.with_str(""),
        1 => indent.with_str("    "),
        2 => indent.with_str("        "),
        _ => unimplemented!("indentation level not supported"),
    }
}

/// An identifier with its source location.
#[derive(Clone, Debug, PartialEq)]
pub struct Ident {
    /// The span.
    pub span: Span,
    /// The name.
    pub name: Rc<str>,
}

impl Display for Ident {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "Ident {} \"{}\"", self.span, self.name)
    }
}

/// A possibly qualified name: a chain of namespace segments followed by the
/// final name, e.g. `std::print::s`.
#[derive(Clone, Debug, PartialEq)]
pub struct Path {
    /// The span of the whole path.
    pub span: Span,
    /// The namespace segments, possibly empty.
    pub chain: Vec<Ident>,
    /// The final name.
    pub name: Ident,
}

impl Path {
    /// The chain segments as plain names.
    #[must_use]
    pub fn chain_names(&self) -> Vec<Rc<str>> {
        self.chain.iter().map(|s| Rc::clone(&s.name)).collect()
    }
}

impl Display for Path {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "Path {} \"", self.span)?;
        for segment in &self.chain {
            write!(f, "{}::", segment.name)?;
        }
        write!(f, "{}\"", self.name.name)
    }
}

/// A type annotation.
#[derive(Clone, Debug, PartialEq)]
pub struct Ty {
    /// The span.
    pub span: Span,
    /// The type kind.
    pub kind: TyKind,
}

/// A type annotation kind.
#[derive(Clone, Debug, PartialEq)]
pub enum TyKind {
    /// `int`
    Int,
    /// `bool`
    Bool,
    /// `float`
    Float,
    /// `string`
    String,
    /// `void`
    Void,
    /// `sprite`
    Sprite,
    /// `sound`
    Sound,
    /// A game object type named by a chain.
    Object(Path),
    /// A fixed-length array.
    Array(Box<Ty>, u64),
}

impl Display for Ty {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match &self.kind {
            TyKind::Int => write!(f, "int"),
            TyKind::Bool => write!(f, "bool"),
            TyKind::Float => write!(f, "float"),
            TyKind::String => write!(f, "string"),
            TyKind::Void => write!(f, "void"),
            TyKind::Sprite => write!(f, "sprite"),
            TyKind::Sound => write!(f, "sound"),
            TyKind::Object(path) => {
                for segment in &path.chain {
                    write!(f, "{}::", segment.name)?;
                }
                write!(f, "{}", path.name.name)
            }
            TyKind::Array(elem, len) => write!(f, "{elem}[{len}]"),
        }
    }
}

/// A binary operator.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BinOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Mod,
    /// `==`
    Eq,
    /// `!=`
    Neq,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `&&`
    And,
    /// `||`
    Or,
}

impl Display for BinOp {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let s = match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Eq => "==",
            BinOp::Neq => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
        };
        f.write_str(s)
    }
}

/// A unary operator.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum UnOp {
    /// Arithmetic negation.
    Neg,
    /// Logical negation.
    Not,
}

impl Display for UnOp {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            UnOp::Neg => f.write_str("-"),
            UnOp::Not => f.write_str("!"),
        }
    }
}

/// Increment or decrement.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Crement {
    /// `++`
    Incr,
    /// `--`
    Decr,
}

impl Display for Crement {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Crement::Incr => f.write_str("++"),
            Crement::Decr => f.write_str("--"),
        }
    }
}

/// Whether a `++`/`--` is prefix or postfix.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Fixity {
    /// Before the operand.
    Pre,
    /// After the operand.
    Post,
}

/// An expression.
#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    /// The span.
    pub span: Span,
    /// The expression kind.
    pub kind: Box<ExprKind>,
}

/// An expression kind.
#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    /// An integer literal.
    Int(i64),
    /// A boolean literal.
    Bool(bool),
    /// A float literal.
    Float(f64),
    /// A string literal.
    Str(Rc<str>),
    /// The `none` object literal.
    None,
    /// An array literal.
    Array(Vec<Expr>),
    /// A possibly qualified identifier.
    Path(Path),
    /// A member access `e.x`.
    Member(Box<Expr>, Ident),
    /// A method call `e.m(args)`.
    MethodCall(Box<Expr>, Ident, Vec<Expr>),
    /// A free function call `chain::f(args)`.
    Call(Path, Vec<Expr>),
    /// A subscript `a[i]`.
    Subscript(Box<Expr>, Box<Expr>),
    /// A `create T(args)` expression.
    Create(Path, Vec<Expr>),
    /// A `destroy e` expression.
    Destroy(Box<Expr>),
    /// A `delete e` expression.
    Delete(Box<Expr>),
    /// A unary operation.
    UnOp(UnOp, Box<Expr>),
    /// A binary operation.
    BinOp(BinOp, Box<Expr>, Box<Expr>),
    /// An assignment.
    Assign(Box<Expr>, Box<Expr>),
    /// A compound assignment, e.g. `+=`.
    AssignOp(BinOp, Box<Expr>, Box<Expr>),
    /// A pre/post increment or decrement.
    Crement(Crement, Fixity, Box<Expr>),
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let mut indent = set_indentation(indented(f), 0);
        match &*self.kind {
            ExprKind::Int(value) => write!(indent, "Int {} {value}", self.span)?,
            ExprKind::Bool(value) => write!(indent, "Bool {} {value}", self.span)?,
            ExprKind::Float(value) => write!(indent, "Float {} {value}", self.span)?,
            ExprKind::Str(value) => write!(indent, "Str {} {value:?}", self.span)?,
            ExprKind::None => write!(indent, "None {}", self.span)?,
            ExprKind::Array(items) => {
                write!(indent, "Array {}:", self.span)?;
                indent = set_indentation(indent, 1);
                for item in items {
                    write!(indent, "\n{item}")?;
                }
            }
            ExprKind::Path(path) => write!(indent, "{path}")?,
            ExprKind::Member(expr, name) => {
                write!(indent, "Member {} \"{}\":", self.span, name.name)?;
                indent = set_indentation(indent, 1);
                write!(indent, "\n{expr}")?;
            }
            ExprKind::MethodCall(expr, name, args) => {
                write!(indent, "MethodCall {} \"{}\":", self.span, name.name)?;
                indent = set_indentation(indent, 1);
                write!(indent, "\n{expr}")?;
                for arg in args {
                    write!(indent, "\n{arg}")?;
                }
            }
            ExprKind::Call(path, args) => {
                write!(indent, "Call {} ({path}):", self.span)?;
                indent = set_indentation(indent, 1);
                for arg in args {
                    write!(indent, "\n{arg}")?;
                }
            }
            ExprKind::Subscript(expr, index) => {
                write!(indent, "Subscript {}:", self.span)?;
                indent = set_indentation(indent, 1);
                write!(indent, "\n{expr}")?;
                write!(indent, "\n{index}")?;
            }
            ExprKind::Create(path, args) => {
                write!(indent, "Create {} ({path}):", self.span)?;
                indent = set_indentation(indent, 1);
                for arg in args {
                    write!(indent, "\n{arg}")?;
                }
            }
            ExprKind::Destroy(expr) => {
                write!(indent, "Destroy {}:", self.span)?;
                indent = set_indentation(indent, 1);
                write!(indent, "\n{expr}")?;
            }
            ExprKind::Delete(expr) => {
                write!(indent, "Delete {}:", self.span)?;
                indent = set_indentation(indent, 1);
                write!(indent, "\n{expr}")?;
            }
            ExprKind::UnOp(op, expr) => {
                write!(indent, "UnOp {} ({op}):", self.span)?;
                indent = set_indentation(indent, 1);
                write!(indent, "\n{expr}")?;
            }
            ExprKind::BinOp(op, lhs, rhs) => {
                write!(indent, "BinOp {} ({op}):", self.span)?;
                indent = set_indentation(indent, 1);
                write!(indent, "\n{lhs}")?;
                write!(indent, "\n{rhs}")?;
            }
            ExprKind::Assign(lhs, rhs) => {
                write!(indent, "Assign {}:", self.span)?;
                indent = set_indentation(indent, 1);
                write!(indent, "\n{lhs}")?;
                write!(indent, "\n{rhs}")?;
            }
            ExprKind::AssignOp(op, lhs, rhs) => {
                write!(indent, "AssignOp {} ({op}):", self.span)?;
                indent = set_indentation(indent, 1);
                write!(indent, "\n{lhs}")?;
                write!(indent, "\n{rhs}")?;
            }
            ExprKind::Crement(op, Fixity::Pre, expr) => {
                write!(indent, "Crement {} (pre {op}):", self.span)?;
                indent = set_indentation(indent, 1);
                write!(indent, "\n{expr}")?;
            }
            ExprKind::Crement(op, Fixity::Post, expr) => {
                write!(indent, "Crement {} (post {op}):", self.span)?;
                indent = set_indentation(indent, 1);
                write!(indent, "\n{expr}")?;
            }
        }
        Ok(())
    }
}

/// A sequenced block of statements.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Block {
    /// The span.
    pub span: Span,
    /// The statements.
    pub stmts: Vec<Stmt>,
}

impl Display for Block {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        if self.stmts.is_empty() {
            write!(f, "Block {}: <empty>", self.span)
        } else {
            let mut indent = set_indentation(indented(f), 0);
            write!(indent, "Block {}:", self.span)?;
            indent = set_indentation(indent, 1);
            for s in &self.stmts {
                write!(indent, "\n{s}")?;
            }
            Ok(())
        }
    }
}

/// A statement.
#[derive(Clone, Debug, PartialEq)]
pub struct Stmt {
    /// The span.
    pub span: Span,
    /// The statement kind.
    pub kind: Box<StmtKind>,
}

/// A statement kind.
#[derive(Clone, Debug, PartialEq)]
pub enum StmtKind {
    /// A nested block.
    Block(Block),
    /// A local declaration, with an optional initializer.
    Decl(Ty, Ident, Option<Expr>),
    /// An expression statement.
    Expr(Expr),
    /// A return, with an optional value.
    Return(Option<Expr>),
    /// A loop break.
    Break,
    /// A conditional; the else branch is a block or a chained `if`.
    If(Expr, Block, Option<Box<Stmt>>),
    /// A while loop.
    While(Expr, Block),
    /// A C-style for loop.
    For(Option<Box<Stmt>>, Option<Expr>, Option<Expr>, Block),
    /// Iteration over all live objects of a type.
    Foreach(Path, Ident, Block),
}

impl Display for Stmt {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let mut indent = set_indentation(indented(f), 0);
        match &*self.kind {
            StmtKind::Block(block) => write!(indent, "{block}")?,
            StmtKind::Decl(ty, name, init) => {
                write!(indent, "Decl {} {ty} \"{}\"", self.span, name.name)?;
                if let Some(init) = init {
                    write!(indent, ":")?;
                    indent = set_indentation(indent, 1);
                    write!(indent, "\n{init}")?;
                }
            }
            StmtKind::Expr(expr) => write!(indent, "{expr}")?,
            StmtKind::Return(None) => write!(indent, "Return {}", self.span)?,
            StmtKind::Return(Some(expr)) => {
                write!(indent, "Return {}:", self.span)?;
                indent = set_indentation(indent, 1);
                write!(indent, "\n{expr}")?;
            }
            StmtKind::Break => write!(indent, "Break {}", self.span)?,
            StmtKind::If(cond, then, otherwise) => {
                write!(indent, "If {}:", self.span)?;
                indent = set_indentation(indent, 1);
                write!(indent, "\n{cond}")?;
                write!(indent, "\n{then}")?;
                if let Some(otherwise) = otherwise {
                    write!(indent, "\n{otherwise}")?;
                }
            }
            StmtKind::While(cond, body) => {
                write!(indent, "While {}:", self.span)?;
                indent = set_indentation(indent, 1);
                write!(indent, "\n{cond}")?;
                write!(indent, "\n{body}")?;
            }
            StmtKind::For(init, cond, step, body) => {
                write!(indent, "For {}:", self.span)?;
                indent = set_indentation(indent, 1);
                if let Some(init) = init {
                    write!(indent, "\n{init}")?;
                }
                if let Some(cond) = cond {
                    write!(indent, "\n{cond}")?;
                }
                if let Some(step) = step {
                    write!(indent, "\n{step}")?;
                }
                write!(indent, "\n{body}")?;
            }
            StmtKind::Foreach(path, name, body) => {
                write!(indent, "Foreach {} ({path}) \"{}\":", self.span, name.name)?;
                indent = set_indentation(indent, 1);
                write!(indent, "\n{body}")?;
            }
        }
        Ok(())
    }
}

/// A game object event name.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Event {
    /// Runs once when the object is created.
    Create,
    /// Runs on every `global_step`.
    Step,
    /// Runs on every `global_draw`.
    Draw,
    /// Runs when the object is destroyed.
    Destroy,
}

impl Event {
    /// The surface keyword for the event.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Event::Create => "create",
            Event::Step => "step",
            Event::Draw => "draw",
            Event::Destroy => "destroy",
        }
    }
}

impl Display for Event {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A function declaration. A missing body marks an extern declaration that
/// the runtime provides.
#[derive(Clone, Debug, PartialEq)]
pub struct Function {
    /// The span.
    pub span: Span,
    /// The return type.
    pub ret: Ty,
    /// The name.
    pub name: Ident,
    /// The formal parameters, in order.
    pub formals: Vec<(Ty, Ident)>,
    /// The body, or `None` for an extern declaration.
    pub body: Option<Block>,
    /// The owning object's name, for methods and events.
    pub gameobj: Option<Rc<str>>,
}

impl Display for Function {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let mut indent = set_indentation(indented(f), 0);
        write!(
            indent,
            "Function {} \"{}\" -> {}",
            self.span, self.name.name, self.ret
        )?;
        indent = set_indentation(indent, 1);
        for (ty, name) in &self.formals {
            write!(indent, "\nformal {ty} \"{}\"", name.name)?;
        }
        match &self.body {
            None => write!(indent, "\n<extern>")?,
            Some(body) => write!(indent, "\n{body}")?,
        }
        Ok(())
    }
}

/// A game object declaration.
#[derive(Clone, Debug, PartialEq)]
pub struct GameObject {
    /// The span.
    pub span: Span,
    /// The name.
    pub name: Ident,
    /// The parent type, or `None` for the synthetic root.
    pub parent: Option<Path>,
    /// The member variables, in order.
    pub members: Vec<(Ty, Ident)>,
    /// The methods, in order.
    pub methods: Vec<Function>,
    /// The events, in order.
    pub events: Vec<(Event, Function)>,
}

impl Display for GameObject {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let mut indent = set_indentation(indented(f), 0);
        write!(indent, "Object {} \"{}\"", self.span, self.name.name)?;
        if let Some(parent) = &self.parent {
            write!(indent, " : ({parent})")?;
        }
        write!(indent, ":")?;
        indent = set_indentation(indent, 1);
        for (ty, name) in &self.members {
            write!(indent, "\nmember {ty} \"{}\"", name.name)?;
        }
        for method in &self.methods {
            write!(indent, "\n{method}")?;
        }
        for (event, function) in &self.events {
            write!(indent, "\nevent {event}: {function}")?;
        }
        Ok(())
    }
}

/// A global variable declaration with an optional constant initializer.
#[derive(Clone, Debug, PartialEq)]
pub struct Global {
    /// The span.
    pub span: Span,
    /// The declared type.
    pub ty: Ty,
    /// The name.
    pub name: Ident,
    /// The constant initializer, if any.
    pub init: Option<Expr>,
}

impl Display for Global {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let mut indent = set_indentation(indented(f), 0);
        write!(indent, "Global {} {} \"{}\"", self.span, self.ty, self.name.name)?;
        if let Some(init) = &self.init {
            write!(indent, ":")?;
            indent = set_indentation(indent, 1);
            write!(indent, "\n{init}")?;
        }
        Ok(())
    }
}

/// The three forms an inner namespace declaration can take.
#[derive(Clone, Debug, PartialEq)]
pub enum NamespaceRef {
    /// An inline-defined namespace.
    Concrete(Namespace),
    /// A symbolic redirect to another chain.
    Alias(Vec<Ident>),
    /// The root namespace of another source file. The parser records the
    /// path as written; the loader rewrites it to an absolute path.
    File(Rc<str>),
}

/// An inner namespace declaration.
#[derive(Clone, Debug, PartialEq)]
pub struct NamespaceDecl {
    /// The span.
    pub span: Span,
    /// Whether the namespace is private to its parent.
    pub is_private: bool,
    /// The name.
    pub name: Ident,
    /// The declaration form.
    pub kind: NamespaceRef,
}

/// A `using` import.
#[derive(Clone, Debug, PartialEq)]
pub struct Using {
    /// The span.
    pub span: Span,
    /// Whether the import is private.
    pub is_private: bool,
    /// The imported chain.
    pub chain: Vec<Ident>,
}

impl Display for Using {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "Using {} ", self.span)?;
        if self.is_private {
            write!(f, "private ")?;
        }
        let names: Vec<_> = self.chain.iter().map(|s| s.name.as_ref()).collect();
        write!(f, "\"{}\"", names.join("::"))
    }
}

/// A namespace body: ordered declarations of each kind.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Namespace {
    /// The span.
    pub span: Span,
    /// The global variables, in order.
    pub globals: Vec<Global>,
    /// The free functions, in order.
    pub functions: Vec<Function>,
    /// The game objects, in order.
    pub objects: Vec<GameObject>,
    /// The inner namespaces, in order.
    pub namespaces: Vec<NamespaceDecl>,
    /// The `using` imports, in order.
    pub usings: Vec<Using>,
}

impl Display for Namespace {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let mut indent = set_indentation(indented(f), 0);
        write!(indent, "Namespace {}:", self.span)?;
        indent = set_indentation(indent, 1);
        for using in &self.usings {
            write!(indent, "\n{using}")?;
        }
        for global in &self.globals {
            write!(indent, "\n{global}")?;
        }
        for function in &self.functions {
            write!(indent, "\n{function}")?;
        }
        for object in &self.objects {
            write!(indent, "\n{object}")?;
        }
        for decl in &self.namespaces {
            let private = if decl.is_private { "private " } else { "" };
            match &decl.kind {
                NamespaceRef::Concrete(ns) => {
                    write!(indent, "\n{private}namespace \"{}\": {ns}", decl.name.name)?;
                }
                NamespaceRef::Alias(chain) => {
                    let names: Vec<_> = chain.iter().map(|s| s.name.as_ref()).collect();
                    write!(
                        indent,
                        "\n{private}namespace \"{}\" = {}",
                        decl.name.name,
                        names.join("::")
                    )?;
                }
                NamespaceRef::File(path) => {
                    write!(
                        indent,
                        "\n{private}namespace \"{}\" = open {path:?}",
                        decl.name.name
                    )?;
                }
            }
        }
        Ok(())
    }
}

/// A program: the root namespace of the main source plus every file
/// namespace it transitively opened, keyed by absolute path in load order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Program {
    /// The root namespace.
    pub root: Namespace,
    /// The loaded file namespaces, keyed by absolute path, in load order.
    pub files: Vec<(Rc<str>, Namespace)>,
}

impl Display for Program {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let mut indent = set_indentation(indented(f), 0);
        write!(indent, "Program:")?;
        indent = set_indentation(indent, 1);
        write!(indent, "\n{}", self.root)?;
        for (path, ns) in &self.files {
            write!(indent, "\nfile {path:?}: {ns}")?;
        }
        Ok(())
    }
}
