// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The typed intermediate tree produced by the semantic analyzer. Every
//! expression carries its resolved type, every implicit conversion is an
//! explicit [`ExprKind::Conv`] node, and every name use has been resolved
//! to a mangled symbol or an object id. Locals are renamed so that
//! shadowing never reuses a slot name within one function.

use crate::ty::{ObjectId, Ty};
use rustc_hash::FxHashMap;
use std::{
    fmt::{self, Display, Formatter},
    rc::Rc,
};

/// A game object event.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Event {
    /// Runs once on creation; the only event that may take formals.
    Create,
    /// Runs on every `global_step`.
    Step,
    /// Runs on every `global_draw`.
    Draw,
    /// Runs on destruction, before the object is unlinked.
    Destroy,
}

impl Event {
    /// The surface name of the event.
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

/// A binary operator on checked operands. The operand types on the
/// expression nodes decide the integer or float instruction.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Neq,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

/// A unary operator.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum UnOp {
    Neg,
    Not,
}

/// Increment or decrement.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Crement {
    Incr,
    Decr,
}

/// Whether a `++`/`--` yields the old or the new value.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Fixity {
    Pre,
    Post,
}

/// A typed expression.
#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    /// The resolved type.
    pub ty: Ty,
    /// The expression kind.
    pub kind: Box<ExprKind>,
}

/// The callee of a resolved call.
#[derive(Clone, Debug, PartialEq)]
pub enum Callee {
    /// An extern runtime primitive, called by its unmangled name.
    Extern(Rc<str>),
    /// A compiled function, called by its mangled symbol.
    Fn(Rc<str>),
}

/// A typed expression kind.
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
    /// The `none` literal.
    None,
    /// An array literal of homogeneously typed elements.
    Array(Vec<Expr>),
    /// A local variable or formal, by its renamed slot name.
    Local(Rc<str>),
    /// The implicit receiver of a method or event.
    This,
    /// A namespace global, by its mangled symbol.
    Global(Rc<str>),
    /// A member access, resolved to the ancestor that declares the member
    /// and the member's index within that ancestor's own members.
    Member {
        recv: Expr,
        level: ObjectId,
        index: u32,
    },
    /// A subscript into an array lvalue or value.
    Subscript(Expr, Expr),
    /// A call to a free function or extern primitive.
    Call { callee: Callee, args: Vec<Expr> },
    /// A method call, statically dispatched to the most derived definition
    /// visible from the receiver's static type.
    MethodCall {
        recv: Expr,
        symbol: Rc<str>,
        args: Vec<Expr>,
    },
    /// A `create T(args)` expression.
    Create { object: ObjectId, args: Vec<Expr> },
    /// A `destroy e` (or `delete e`) expression: vtable destroy call, then
    /// the id is zeroed.
    Destroy(Expr),
    /// A unary operation.
    UnOp(UnOp, Expr),
    /// A binary operation.
    BinOp(BinOp, Expr, Expr),
    /// An explicit conversion inserted by the analyzer.
    Conv { from: Ty, expr: Expr },
    /// An assignment; the target is an lvalue expression.
    Assign(Expr, Expr),
    /// A compound assignment; the target address is computed once.
    AssignOp(BinOp, Expr, Expr),
    /// A pre/post increment or decrement of a numeric lvalue.
    Crement(Crement, Fixity, Expr),
}

/// A typed statement.
#[derive(Clone, Debug, PartialEq)]
pub enum Stmt {
    /// An expression statement.
    Expr(Expr),
    /// A local declaration with an optional initializer.
    Local {
        name: Rc<str>,
        ty: Ty,
        init: Option<Expr>,
    },
    /// A return.
    Return(Option<Expr>),
    /// A loop break.
    Break,
    /// A conditional.
    If {
        cond: Expr,
        then: Block,
        otherwise: Option<Block>,
    },
    /// A while loop.
    While { cond: Expr, body: Block },
    /// A C-style for loop; the emitter rewrites it to
    /// `{ init; while (cond) { body; step; } }`.
    For {
        init: Option<Box<Stmt>>,
        cond: Option<Expr>,
        step: Option<Expr>,
        body: Block,
    },
    /// Iteration over every live object of a type.
    Foreach {
        object: ObjectId,
        var: Rc<str>,
        body: Block,
    },
    /// A nested block.
    Block(Block),
}

/// A sequenced block of typed statements.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Block(pub Vec<Stmt>);

/// A checked function body with its signature.
#[derive(Clone, Debug, PartialEq)]
pub struct FunctionDef {
    /// The mangled symbol.
    pub symbol: Rc<str>,
    /// The receiver type, for methods and events.
    pub this: Option<ObjectId>,
    /// The formal parameters with their renamed slot names, in order.
    pub formals: Vec<(Rc<str>, Ty)>,
    /// The return type.
    pub ret: Ty,
    /// The body.
    pub body: Block,
}

/// An extern declaration that passes through to the runtime unmangled.
#[derive(Clone, Debug, PartialEq)]
pub struct ExternDef {
    /// The unmangled name.
    pub name: Rc<str>,
    /// The formal types, in order.
    pub formals: Vec<Ty>,
    /// The return type.
    pub ret: Ty,
}

/// A constant, the only initializer form a global admits.
#[derive(Clone, Debug, PartialEq)]
pub enum Const {
    Int(i64),
    Bool(bool),
    Float(f64),
    Array(Vec<Const>),
}

/// A checked namespace global.
#[derive(Clone, Debug, PartialEq)]
pub struct GlobalDef {
    /// The mangled symbol.
    pub symbol: Rc<str>,
    /// The declared type.
    pub ty: Ty,
    /// The constant initializer, if any.
    pub init: Option<Const>,
}

/// A method signature, for static dispatch resolution.
#[derive(Clone, Debug, PartialEq)]
pub struct MethodSig {
    /// The method name.
    pub name: Rc<str>,
    /// The mangled symbol of the definition.
    pub symbol: Rc<str>,
    /// The formal types, in order.
    pub formals: Vec<Ty>,
    /// The return type.
    pub ret: Ty,
}

/// A checked game object type.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectDef {
    /// The id, equal to this def's index in the table.
    pub id: ObjectId,
    /// The declared name.
    pub name: Rc<str>,
    /// The canonical chain of the declaring namespace.
    pub chain: Vec<Rc<str>>,
    /// The parent, or `None` for the synthetic root.
    pub parent: Option<ObjectId>,
    /// The object's own members, in declaration order.
    pub members: Vec<(Rc<str>, Ty)>,
    /// The object's own method signatures, in declaration order.
    pub methods: Vec<MethodSig>,
    /// The events the object defines itself.
    pub events: Vec<Event>,
    /// The formal types of the object's own create event, if it has one.
    pub create_formals: Vec<Ty>,
    /// The checked bodies of the object's methods and events.
    pub functions: Vec<FunctionDef>,
}

impl ObjectDef {
    /// The canonical dotted name used in mangled symbols.
    #[must_use]
    pub fn canon_name(&self) -> String {
        let mut name = String::new();
        for segment in &self.chain {
            name.push_str(segment);
            name.push_str("::");
        }
        name.push_str(&self.name);
        name
    }
}

/// Every object type in the program. Index 0 is the synthetic root.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObjectTable {
    defs: Vec<ObjectDef>,
    chains: FxHashMap<ObjectId, Vec<ObjectId>>,
}

impl ObjectTable {
    /// Creates a table seeded with the synthetic root object.
    #[must_use]
    pub fn new() -> Self {
        let root = ObjectDef {
            id: ObjectId::ROOT,
            name: "object".into(),
            chain: Vec::new(),
            parent: None,
            members: Vec::new(),
            methods: Vec::new(),
            events: Vec::new(),
            create_formals: Vec::new(),
            functions: Vec::new(),
        };
        Self {
            defs: vec![root],
            chains: FxHashMap::default(),
        }
    }

    /// Reserves the next id.
    pub fn push(&mut self, mut def: ObjectDef) -> ObjectId {
        let id = ObjectId(u32::try_from(self.defs.len()).expect("object count should fit u32"));
        def.id = id;
        self.defs.push(def);
        id
    }

    #[must_use]
    pub fn get(&self, id: ObjectId) -> &ObjectDef {
        &self.defs[usize::from(id)]
    }

    pub fn get_mut(&mut self, id: ObjectId) -> &mut ObjectDef {
        &mut self.defs[usize::from(id)]
    }

    pub fn defs(&self) -> impl Iterator<Item = &ObjectDef> {
        self.defs.iter()
    }

    /// The number of objects, including the synthetic root.
    #[must_use]
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Records the inheritance chain for an object, eldest ancestor first,
    /// the object itself last. The root is not included.
    pub fn set_chain(&mut self, id: ObjectId, chain: Vec<ObjectId>) {
        self.chains.insert(id, chain);
    }

    /// The inheritance chain, eldest ancestor first, the object last. The
    /// synthetic root is not included.
    #[must_use]
    pub fn chain(&self, id: ObjectId) -> &[ObjectId] {
        self.chains.get(&id).map_or(&[], Vec::as_slice)
    }

    /// Whether `ancestor` is `id` or one of its ancestors.
    #[must_use]
    pub fn is_ancestor(&self, ancestor: ObjectId, id: ObjectId) -> bool {
        ancestor == ObjectId::ROOT || self.chain(id).contains(&ancestor)
    }

    /// Resolves a member across the inheritance chain, youngest definition
    /// winning. Returns the declaring level and the index within that
    /// level's own members.
    #[must_use]
    pub fn lookup_member(&self, id: ObjectId, name: &str) -> Option<(ObjectId, u32, Ty)> {
        for &level in self.chain(id).iter().rev() {
            let def = self.get(level);
            if let Some(index) = def.members.iter().position(|(n, _)| n.as_ref() == name) {
                let ty = def.members[index].1.clone();
                let index = u32::try_from(index).expect("member index should fit into u32");
                return Some((level, index, ty));
            }
        }
        None
    }

    /// Resolves a method across the inheritance chain, youngest definition
    /// winning.
    #[must_use]
    pub fn lookup_method(&self, id: ObjectId, name: &str) -> Option<&MethodSig> {
        for &level in self.chain(id).iter().rev() {
            let def = self.get(level);
            if let Some(sig) = def.methods.iter().find(|m| m.name.as_ref() == name) {
                return Some(sig);
            }
        }
        None
    }

    /// The nearest level, youngest first, that defines `event` itself, or
    /// the synthetic root if none does.
    #[must_use]
    pub fn dispatch_level(&self, id: ObjectId, event: Event) -> ObjectId {
        for &level in self.chain(id).iter().rev() {
            if self.get(level).events.contains(&event) {
                return level;
            }
        }
        ObjectId::ROOT
    }

    /// The formal types the `create T(args)` expression is checked
    /// against: the nearest defined create event's formals, or none.
    #[must_use]
    pub fn create_formals(&self, id: ObjectId) -> &[Ty] {
        let level = self.dispatch_level(id, Event::Create);
        if level == ObjectId::ROOT {
            &[]
        } else {
            &self.get(level).create_formals
        }
    }

    /// A display name for diagnostics.
    #[must_use]
    pub fn display_name(&self, id: ObjectId) -> String {
        self.get(id).canon_name()
    }

    /// Renders a type for diagnostics, e.g. `int` or an object's canonical
    /// name.
    #[must_use]
    pub fn ty_name(&self, ty: &Ty) -> String {
        match ty {
            Ty::Int => "int".to_string(),
            Ty::Bool => "bool".to_string(),
            Ty::Float => "float".to_string(),
            Ty::String => "string".to_string(),
            Ty::Void => "void".to_string(),
            Ty::Sprite => "sprite".to_string(),
            Ty::Sound => "sound".to_string(),
            Ty::Object(id) => self.display_name(*id),
            Ty::NoneObject => "none".to_string(),
            Ty::Array(elem, len) => format!("{}[{len}]", self.ty_name(elem)),
        }
    }
}

/// The analyzer's output: everything codegen needs, with all names
/// resolved and all namespaces flattened in deterministic traversal order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Program {
    /// Namespace globals, in traversal order.
    pub globals: Vec<GlobalDef>,
    /// Extern declarations, unmangled, deduplicated by name.
    pub externs: Vec<ExternDef>,
    /// Free functions, in traversal order.
    pub functions: Vec<FunctionDef>,
    /// Every object type.
    pub objects: ObjectTable,
    /// The id of the `main` object in the root namespace.
    pub main: ObjectId,
}
