// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The semantic analyzer. Three phases over a loaded program: collect
//! every namespace and object and reject duplicate or reserved
//! declarations; resolve inheritance, member types, and method signatures;
//! then check every body, producing the typed HIR with explicit
//! conversions and fully resolved names.

#[cfg(test)]
mod tests;

use crate::{
    compile::STD_PATH,
    resolve::{self, resolve},
};
use miette::Diagnostic;
use mgc_ast::ast;
use mgc_data_structures::span::Span;
use mgc_hir::{
    hir,
    ty::{ObjectId, Ty},
};
use rustc_hash::{FxHashMap, FxHashSet};
use std::rc::Rc;
use thiserror::Error;

#[derive(Clone, Debug, Diagnostic, Error, PartialEq)]
pub enum Error {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Resolve(#[from] resolve::Error),

    #[error("duplicate {0} `{1}`")]
    #[diagnostic(code("Mgc.Typeck.Duplicate"))]
    Duplicate(&'static str, String, #[label] Span),

    #[error("void type in declaration of `{0}`")]
    #[diagnostic(code("Mgc.Typeck.VoidBinding"))]
    VoidBinding(String, #[label] Span),

    #[error("cannot shadow `{0}`")]
    #[diagnostic(code("Mgc.Typeck.Reserved"))]
    Reserved(String, #[label] Span),

    #[error("illegal extern object function `{0}`")]
    #[diagnostic(code("Mgc.Typeck.ExternMethod"))]
    ExternMethod(String, #[label] Span),

    #[error("event {0} takes no formals")]
    #[diagnostic(code("Mgc.Typeck.EventFormals"))]
    EventFormals(&'static str, #[label] Span),

    #[error("illegal break outside of a loop")]
    #[diagnostic(code("Mgc.Typeck.BreakOutsideLoop"))]
    BreakOutsideLoop(#[label] Span),

    #[error("illegal assignment {expected} = {actual}")]
    #[diagnostic(code("Mgc.Typeck.IllegalAssignment"))]
    IllegalAssignment {
        expected: String,
        actual: String,
        #[label]
        span: Span,
    },

    #[error("illegal operator operands {lhs} {op} {rhs}")]
    #[diagnostic(code("Mgc.Typeck.IllegalOperands"))]
    IllegalOperands {
        op: &'static str,
        lhs: String,
        rhs: String,
        #[label]
        span: Span,
    },

    #[error("illegal operand {operand} for unary {op}")]
    #[diagnostic(code("Mgc.Typeck.IllegalUnaryOperand"))]
    IllegalUnaryOperand {
        op: &'static str,
        operand: String,
        #[label]
        span: Span,
    },

    #[error("non-bool predicate of type {0}")]
    #[diagnostic(code("Mgc.Typeck.NonBoolPredicate"))]
    NonBoolPredicate(String, #[label] Span),

    #[error("foreach requires an object type")]
    #[diagnostic(code("Mgc.Typeck.NonObjectForeach"))]
    NonObjectForeach(#[label] Span),

    #[error("destroy requires an object, found {0}")]
    #[diagnostic(code("Mgc.Typeck.NonObjectDestroy"))]
    NonObjectDestroy(String, #[label] Span),

    #[error("member access requires an object, found {0}")]
    #[diagnostic(code("Mgc.Typeck.NonObjectMember"))]
    NonObjectMember(String, #[label] Span),

    #[error("subscript requires an array, found {0}")]
    #[diagnostic(code("Mgc.Typeck.NonArraySubscript"))]
    NonArraySubscript(String, #[label] Span),

    #[error("subscript index must be int, found {0}")]
    #[diagnostic(code("Mgc.Typeck.NonIntSubscript"))]
    NonIntSubscript(String, #[label] Span),

    #[error("unrecognized object `{0}`")]
    #[diagnostic(code("Mgc.Typeck.UnknownObject"))]
    UnknownObject(String, #[label] Span),

    #[error("unrecognized function `{0}`")]
    #[diagnostic(code("Mgc.Typeck.UnknownFunction"))]
    UnknownFunction(String, #[label] Span),

    #[error("unrecognized member `{0}` of `{1}`")]
    #[diagnostic(code("Mgc.Typeck.UnknownMember"))]
    UnknownMember(String, String, #[label] Span),

    #[error("unrecognized identifier `{0}`")]
    #[diagnostic(code("Mgc.Typeck.UnknownIdent"))]
    UnknownIdent(String, #[label] Span),

    #[error("wrong number of arguments to `{name}`: expected {expected}, found {actual}")]
    #[diagnostic(code("Mgc.Typeck.ArgCount"))]
    ArgCount {
        name: String,
        expected: usize,
        actual: usize,
        #[label]
        span: Span,
    },

    #[error("target of assignment is not an lvalue")]
    #[diagnostic(code("Mgc.Typeck.NotLvalue"))]
    NotLvalue(#[label] Span),

    #[error("illegal global initializer")]
    #[diagnostic(code("Mgc.Typeck.IllegalGlobalInit"))]
    IllegalGlobalInit(#[label] Span),

    #[error("empty array literal")]
    #[diagnostic(code("Mgc.Typeck.EmptyArray"))]
    EmptyArray(#[label] Span),

    #[error("array literal elements must all have the same type")]
    #[diagnostic(code("Mgc.Typeck.HeterogeneousArray"))]
    HeterogeneousArray(#[label] Span),

    #[error("inheritance cycle through object `{0}`")]
    #[diagnostic(code("Mgc.Typeck.InheritanceCycle"))]
    InheritanceCycle(String, #[label] Span),

    #[error("missing entry point: no `main` object in the root namespace")]
    #[diagnostic(code("Mgc.Typeck.MissingMain"))]
    MissingMain,
}

/// Checks a loaded program, producing the typed HIR.
pub fn check(program: &ast::Program) -> Result<hir::Program, Error> {
    let mut checker = Checker::new(program);
    checker.collect()?;
    checker.resolve_objects()?;
    checker.build_scopes()?;
    checker.check_bodies()?;
    checker.finish()
}

const RESERVED: [&str; 2] = ["this", "super"];

fn reserved(name: &ast::Ident) -> Result<(), Error> {
    if RESERVED.contains(&name.name.as_ref()) {
        Err(Error::Reserved(name.name.to_string(), name.span))
    } else {
        Ok(())
    }
}

fn identity(ns: &ast::Namespace) -> usize {
    ns as *const ast::Namespace as usize
}

fn canon(chain: &[Rc<str>], name: &str) -> String {
    let mut out = String::new();
    for segment in chain {
        out.push_str(segment);
        out.push_str("::");
    }
    out.push_str(name);
    out
}

fn mangle_fn(chain: &[Rc<str>], name: &str) -> Rc<str> {
    format!("mg::{}", canon(chain, name)).into()
}

fn mangle_global(chain: &[Rc<str>], name: &str) -> Rc<str> {
    format!("mgv::{}", canon(chain, name)).into()
}

fn mangle_member(canon_obj: &str, name: &str) -> Rc<str> {
    format!("mg::{canon_obj}.{name}").into()
}

fn hir_event(event: ast::Event) -> hir::Event {
    match event {
        ast::Event::Create => hir::Event::Create,
        ast::Event::Step => hir::Event::Step,
        ast::Event::Draw => hir::Event::Draw,
        ast::Event::Destroy => hir::Event::Destroy,
    }
}

fn hir_binop(op: ast::BinOp) -> hir::BinOp {
    match op {
        ast::BinOp::Add => hir::BinOp::Add,
        ast::BinOp::Sub => hir::BinOp::Sub,
        ast::BinOp::Mul => hir::BinOp::Mul,
        ast::BinOp::Div => hir::BinOp::Div,
        ast::BinOp::Mod => hir::BinOp::Mod,
        ast::BinOp::Eq => hir::BinOp::Eq,
        ast::BinOp::Neq => hir::BinOp::Neq,
        ast::BinOp::Lt => hir::BinOp::Lt,
        ast::BinOp::Le => hir::BinOp::Le,
        ast::BinOp::Gt => hir::BinOp::Gt,
        ast::BinOp::Ge => hir::BinOp::Ge,
        ast::BinOp::And => hir::BinOp::And,
        ast::BinOp::Or => hir::BinOp::Or,
    }
}

fn op_str(op: ast::BinOp) -> &'static str {
    match op {
        ast::BinOp::Add => "+",
        ast::BinOp::Sub => "-",
        ast::BinOp::Mul => "*",
        ast::BinOp::Div => "/",
        ast::BinOp::Mod => "%",
        ast::BinOp::Eq => "==",
        ast::BinOp::Neq => "!=",
        ast::BinOp::Lt => "<",
        ast::BinOp::Le => "<=",
        ast::BinOp::Gt => ">",
        ast::BinOp::Ge => ">=",
        ast::BinOp::And => "&&",
        ast::BinOp::Or => "||",
    }
}

/// A callable visible in some scope.
#[derive(Clone)]
struct FnBinding {
    name: Rc<str>,
    callee: hir::Callee,
    formals: Vec<Ty>,
    ret: Ty,
}

/// A namespace's flat scope: the value side and the function side.
#[derive(Clone, Default)]
struct NsScope {
    values: FxHashMap<Rc<str>, (Rc<str>, Ty)>,
    functions: FxHashMap<Rc<str>, FnBinding>,
}

struct Checker<'a> {
    program: &'a ast::Program,
    objects: hir::ObjectTable,
    object_ids: FxHashMap<usize, ObjectId>,
    object_decls: FxHashMap<ObjectId, (&'a ast::GameObject, &'a ast::Namespace)>,
    object_count: u32,
    ns_chains: FxHashMap<usize, Vec<Rc<str>>>,
    scopes: FxHashMap<usize, NsScope>,
    prelude: NsScope,
    globals: Vec<hir::GlobalDef>,
    functions: Vec<hir::FunctionDef>,
    externs: Vec<hir::ExternDef>,
    extern_names: FxHashSet<Rc<str>>,
}

impl<'a> Checker<'a> {
    fn new(program: &'a ast::Program) -> Self {
        Self {
            program,
            objects: hir::ObjectTable::new(),
            object_ids: FxHashMap::default(),
            object_decls: FxHashMap::default(),
            object_count: 0,
            ns_chains: FxHashMap::default(),
            scopes: FxHashMap::default(),
            prelude: NsScope::default(),
            globals: Vec::new(),
            functions: Vec::new(),
            externs: Vec::new(),
            extern_names: FxHashSet::default(),
        }
    }

    /// Iterates every canonical namespace with its chain, root first, then
    /// each loaded file, preorder within each.
    fn namespaces(&self) -> Vec<(&'a ast::Namespace, Vec<Rc<str>>)> {
        fn walk<'a>(
            out: &mut Vec<(&'a ast::Namespace, Vec<Rc<str>>)>,
            ns: &'a ast::Namespace,
            chain: Vec<Rc<str>>,
        ) {
            out.push((ns, chain.clone()));
            for decl in &ns.namespaces {
                if let ast::NamespaceRef::Concrete(inner) = &decl.kind {
                    let mut inner_chain = chain.clone();
                    inner_chain.push(Rc::clone(&decl.name.name));
                    walk(out, inner, inner_chain);
                }
            }
        }

        let mut out = Vec::new();
        walk(&mut out, &self.program.root, Vec::new());
        for (path, ns) in &self.program.files {
            walk(&mut out, ns, vec![Rc::clone(path)]);
        }
        out
    }

    // ----- phase 1: collection -----

    fn collect(&mut self) -> Result<(), Error> {
        for (ns, chain) in self.namespaces() {
            self.collect_ns(ns, chain)?;
        }
        Ok(())
    }

    fn collect_ns(&mut self, ns: &'a ast::Namespace, chain: Vec<Rc<str>>) -> Result<(), Error> {
        self.ns_chains.insert(identity(ns), chain.clone());

        let mut names = FxHashSet::default();
        for global in &ns.globals {
            reserved(&global.name)?;
            if !names.insert(Rc::clone(&global.name.name)) {
                return Err(Error::Duplicate(
                    "global",
                    global.name.name.to_string(),
                    global.name.span,
                ));
            }
        }

        let mut names = FxHashSet::default();
        for function in &ns.functions {
            reserved(&function.name)?;
            if !names.insert(Rc::clone(&function.name.name)) {
                return Err(Error::Duplicate(
                    "function",
                    function.name.name.to_string(),
                    function.name.span,
                ));
            }
        }

        let mut names = FxHashSet::default();
        for object in &ns.objects {
            reserved(&object.name)?;
            if !names.insert(Rc::clone(&object.name.name)) {
                return Err(Error::Duplicate(
                    "object",
                    object.name.name.to_string(),
                    object.name.span,
                ));
            }
            self.collect_object(object, ns, &chain)?;
        }
        Ok(())
    }

    fn collect_object(
        &mut self,
        object: &'a ast::GameObject,
        ns: &'a ast::Namespace,
        chain: &[Rc<str>],
    ) -> Result<(), Error> {
        let mut members = FxHashSet::default();
        for (_, name) in &object.members {
            reserved(name)?;
            if !members.insert(Rc::clone(&name.name)) {
                return Err(Error::Duplicate(
                    "member",
                    name.name.to_string(),
                    name.span,
                ));
            }
        }

        let mut methods = FxHashSet::default();
        for method in &object.methods {
            reserved(&method.name)?;
            if !methods.insert(Rc::clone(&method.name.name)) {
                return Err(Error::Duplicate(
                    "method",
                    method.name.name.to_string(),
                    method.name.span,
                ));
            }
            if method.body.is_none() {
                return Err(Error::ExternMethod(
                    method.name.name.to_string(),
                    method.name.span,
                ));
            }
        }

        let mut events = FxHashSet::default();
        for (event, function) in &object.events {
            if !events.insert(*event) {
                return Err(Error::Duplicate(
                    "event",
                    event.name().into(),
                    function.span,
                ));
            }
            if *event != ast::Event::Create && !function.formals.is_empty() {
                return Err(Error::EventFormals(event.name(), function.span));
            }
        }

        let id = self.objects.push(hir::ObjectDef {
            id: ObjectId::ROOT,
            name: Rc::clone(&object.name.name),
            chain: chain.to_vec(),
            parent: None,
            members: Vec::new(),
            methods: Vec::new(),
            events: Vec::new(),
            create_formals: Vec::new(),
            functions: Vec::new(),
        });
        self.object_count = id.0;
        self.object_ids
            .insert(object as *const ast::GameObject as usize, id);
        self.object_decls.insert(id, (object, ns));
        Ok(())
    }

    // ----- phase 2: object resolution -----

    fn resolve_objects(&mut self) -> Result<(), Error> {
        // Parents first, then chains, then signatures; signatures may
        // mention any object type.
        for index in 1..=self.object_count {
            let id = ObjectId(index);
            let (object, ns) = self.object_decls[&id];
            let parent = match &object.parent {
                None => ObjectId::ROOT,
                Some(path) => self.resolve_object_path(ns, path)?,
            };
            self.objects.get_mut(id).parent = Some(parent);
        }

        for index in 1..=self.object_count {
            let id = ObjectId(index);
            let mut chain = Vec::new();
            let mut walk = id;
            loop {
                if chain.contains(&walk) {
                    let (object, _) = self.object_decls[&id];
                    return Err(Error::InheritanceCycle(
                        object.name.name.to_string(),
                        object.name.span,
                    ));
                }
                chain.push(walk);
                match self.objects.get(walk).parent {
                    None | Some(ObjectId::ROOT) => break,
                    Some(parent) => walk = parent,
                }
            }
            chain.reverse();
            self.objects.set_chain(id, chain);
        }

        for index in 1..=self.object_count {
            let id = ObjectId(index);
            let (object, ns) = self.object_decls[&id];
            let canon_obj = self.objects.get(id).canon_name();

            let mut members = Vec::new();
            for (ty, name) in &object.members {
                let ty = self.resolve_ty(ns, ty)?;
                if ty == Ty::Void {
                    return Err(Error::VoidBinding(name.name.to_string(), name.span));
                }
                members.push((Rc::clone(&name.name), ty));
            }

            let mut methods = Vec::new();
            for method in &object.methods {
                let (formals, ret) = self.resolve_signature(ns, method)?;
                methods.push(hir::MethodSig {
                    name: Rc::clone(&method.name.name),
                    symbol: mangle_member(&canon_obj, &method.name.name),
                    formals,
                    ret,
                });
            }

            let mut events = Vec::new();
            let mut create_formals = Vec::new();
            for (event, function) in &object.events {
                events.push(hir_event(*event));
                if *event == ast::Event::Create {
                    (create_formals, _) = self.resolve_signature(ns, function)?;
                }
            }

            let def = self.objects.get_mut(id);
            def.members = members;
            def.methods = methods;
            def.events = events;
            def.create_formals = create_formals;
        }
        Ok(())
    }

    fn resolve_object_path(
        &self,
        ns: &ast::Namespace,
        path: &ast::Path,
    ) -> Result<ObjectId, Error> {
        let target = resolve(self.program, ns, &path.chain, true)?;
        let object = target
            .objects
            .iter()
            .find(|o| o.name.name == path.name.name)
            .ok_or_else(|| Error::UnknownObject(path.name.name.to_string(), path.name.span))?;
        Ok(self.object_ids[&(object as *const ast::GameObject as usize)])
    }

    fn resolve_ty(&self, ns: &ast::Namespace, ty: &ast::Ty) -> Result<Ty, Error> {
        match &ty.kind {
            ast::TyKind::Int => Ok(Ty::Int),
            ast::TyKind::Bool => Ok(Ty::Bool),
            ast::TyKind::Float => Ok(Ty::Float),
            ast::TyKind::String => Ok(Ty::String),
            ast::TyKind::Void => Ok(Ty::Void),
            ast::TyKind::Sprite => Ok(Ty::Sprite),
            ast::TyKind::Sound => Ok(Ty::Sound),
            ast::TyKind::Object(path) => Ok(Ty::Object(self.resolve_object_path(ns, path)?)),
            ast::TyKind::Array(elem, len) => {
                Ok(Ty::Array(Box::new(self.resolve_ty(ns, elem)?), *len))
            }
        }
    }

    fn resolve_signature(
        &self,
        ns: &ast::Namespace,
        function: &ast::Function,
    ) -> Result<(Vec<Ty>, Ty), Error> {
        let mut formals = Vec::new();
        for (ty, name) in &function.formals {
            let ty = self.resolve_ty(ns, ty)?;
            if ty == Ty::Void {
                return Err(Error::VoidBinding(name.name.to_string(), name.span));
            }
            formals.push(ty);
        }
        Ok((formals, self.resolve_ty(ns, &function.ret)?))
    }

    // ----- phase 3: namespace scopes -----

    fn build_scopes(&mut self) -> Result<(), Error> {
        if let Some((_, std_root)) = self
            .program
            .files
            .iter()
            .find(|(path, _)| path.as_ref() == STD_PATH)
        {
            let mut prelude = NsScope::default();
            self.fold_decls(std_root, &mut prelude)?;
            self.prelude = prelude;
        }

        for (ns, _) in self.namespaces() {
            let mut scope = self.prelude.clone();
            let mut visited = FxHashSet::default();
            visited.insert(identity(ns));
            self.fold_usings(ns, &mut scope, &mut visited)?;
            self.fold_decls(ns, &mut scope)?;
            self.scopes.insert(identity(ns), scope);
        }

        // Globals are collected once per namespace, in traversal order.
        for (ns, chain) in self.namespaces() {
            for global in &ns.globals {
                let ty = self.resolve_ty(ns, &global.ty)?;
                if ty == Ty::Void {
                    return Err(Error::VoidBinding(
                        global.name.name.to_string(),
                        global.name.span,
                    ));
                }
                let init = global
                    .init
                    .as_ref()
                    .map(|init| self.const_init(&ty, init))
                    .transpose()?;
                self.globals.push(hir::GlobalDef {
                    symbol: mangle_global(&chain, &global.name.name),
                    ty,
                    init,
                });
            }
        }
        Ok(())
    }

    /// Folds the transitive closure of a namespace's `using` imports into
    /// the scope. Imports of imports are folded first, so nearer imports
    /// shadow deeper ones; privacy marks on imports are carried in the
    /// AST but do not stop the walk.
    fn fold_usings(
        &self,
        ns: &ast::Namespace,
        scope: &mut NsScope,
        visited: &mut FxHashSet<usize>,
    ) -> Result<(), Error> {
        for using in &ns.usings {
            let target = resolve(self.program, ns, &using.chain, true)?;
            if !visited.insert(identity(target)) {
                continue;
            }
            self.fold_usings(target, scope, visited)?;
            self.fold_decls(target, scope)?;
        }
        Ok(())
    }

    /// Folds a namespace's own globals and functions into a scope.
    fn fold_decls(&self, ns: &ast::Namespace, scope: &mut NsScope) -> Result<(), Error> {
        let chain = &self.ns_chains[&identity(ns)];
        for global in &ns.globals {
            let ty = self.resolve_ty(ns, &global.ty)?;
            scope.values.insert(
                Rc::clone(&global.name.name),
                (mangle_global(chain, &global.name.name), ty),
            );
        }
        for function in &ns.functions {
            let binding = self.fn_binding(ns, chain, function)?;
            scope.functions.insert(Rc::clone(&function.name.name), binding);
        }
        Ok(())
    }

    fn fn_binding(
        &self,
        ns: &ast::Namespace,
        chain: &[Rc<str>],
        function: &ast::Function,
    ) -> Result<FnBinding, Error> {
        let (formals, ret) = self.resolve_signature(ns, function)?;
        let callee = if function.body.is_none() {
            hir::Callee::Extern(Rc::clone(&function.name.name))
        } else {
            hir::Callee::Fn(mangle_fn(chain, &function.name.name))
        };
        Ok(FnBinding {
            name: Rc::clone(&function.name.name),
            callee,
            formals,
            ret,
        })
    }

    // ----- phase 4: bodies -----

    fn check_bodies(&mut self) -> Result<(), Error> {
        let mut functions = Vec::new();
        for (ns, chain) in self.namespaces() {
            for function in &ns.functions {
                let Some(body) = &function.body else {
                    self.record_extern(ns, function)?;
                    continue;
                };
                let checked = self.check_function(
                    ns,
                    function,
                    body,
                    mangle_fn(&chain, &function.name.name),
                    None,
                    None,
                )?;
                functions.push(checked);
            }
        }
        self.functions = functions;

        for index in 1..=self.object_count {
            let id = ObjectId(index);
            let (object, ns) = self.object_decls[&id];
            let canon_obj = self.objects.get(id).canon_name();
            let parent = self.objects.get(id).parent.expect("parent should be set");

            let mut checked = Vec::new();
            for method in &object.methods {
                let body = method.body.as_ref().expect("extern methods are rejected");
                checked.push(self.check_function(
                    ns,
                    method,
                    body,
                    mangle_member(&canon_obj, &method.name.name),
                    Some(id),
                    None,
                )?);
            }
            for (event, function) in &object.events {
                let body = function.body.as_ref().expect("events always have bodies");
                let super_event = if parent == ObjectId::ROOT {
                    None
                } else {
                    Some((parent, hir_event(*event)))
                };
                checked.push(self.check_function(
                    ns,
                    function,
                    body,
                    mangle_member(&canon_obj, event.name()),
                    Some(id),
                    super_event,
                )?);
            }
            self.objects.get_mut(id).functions = checked;
        }
        Ok(())
    }

    fn record_extern(&mut self, ns: &ast::Namespace, function: &ast::Function) -> Result<(), Error> {
        let (formals, ret) = self.resolve_signature(ns, function)?;
        if self.extern_names.insert(Rc::clone(&function.name.name)) {
            self.externs.push(hir::ExternDef {
                name: Rc::clone(&function.name.name),
                formals,
                ret,
            });
        }
        Ok(())
    }

    fn check_function(
        &self,
        ns: &'a ast::Namespace,
        function: &ast::Function,
        body: &ast::Block,
        symbol: Rc<str>,
        this: Option<ObjectId>,
        super_event: Option<(ObjectId, hir::Event)>,
    ) -> Result<hir::FunctionDef, Error> {
        let ret = self.resolve_ty(ns, &function.ret)?;
        let mut cx = FnCtx {
            checker: self,
            ns,
            scope: &self.scopes[&identity(ns)],
            this,
            super_event,
            ret: ret.clone(),
            locals: vec![FxHashMap::default()],
            used: FxHashMap::default(),
        };

        let mut formals = Vec::new();
        for (ty, name) in &function.formals {
            let ty = self.resolve_ty(ns, ty)?;
            if ty == Ty::Void {
                return Err(Error::VoidBinding(name.name.to_string(), name.span));
            }
            let slot = cx.bind_local(name, ty.clone())?;
            formals.push((slot, ty));
        }

        let body = cx.check_block(body, false)?;
        Ok(hir::FunctionDef {
            symbol,
            this,
            formals,
            ret,
            body,
        })
    }

    fn const_init(&self, expected: &Ty, expr: &ast::Expr) -> Result<hir::Const, Error> {
        match (&*expr.kind, expected) {
            (ast::ExprKind::Int(value), Ty::Int) => Ok(hir::Const::Int(*value)),
            #[allow(clippy::cast_precision_loss)]
            (ast::ExprKind::Int(value), Ty::Float) => Ok(hir::Const::Float(*value as f64)),
            (ast::ExprKind::Bool(value), Ty::Bool) => Ok(hir::Const::Bool(*value)),
            (ast::ExprKind::Float(value), Ty::Float) => Ok(hir::Const::Float(*value)),
            (ast::ExprKind::UnOp(ast::UnOp::Neg, inner), _) => {
                match self.const_init(expected, inner)? {
                    hir::Const::Int(value) => Ok(hir::Const::Int(-value)),
                    hir::Const::Float(value) => Ok(hir::Const::Float(-value)),
                    _ => Err(Error::IllegalGlobalInit(expr.span)),
                }
            }
            (ast::ExprKind::Array(items), Ty::Array(elem, len)) => {
                if items.is_empty() {
                    return Err(Error::EmptyArray(expr.span));
                }
                if items.len() as u64 != *len {
                    return Err(Error::IllegalAssignment {
                        expected: self.objects.ty_name(expected),
                        actual: format!("{}[{}]", self.objects.ty_name(elem), items.len()),
                        span: expr.span,
                    });
                }
                let items = items
                    .iter()
                    .map(|item| self.const_init(elem, item))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(hir::Const::Array(items))
            }
            (
                ast::ExprKind::Int(_) | ast::ExprKind::Bool(_) | ast::ExprKind::Float(_),
                _,
            ) => Err(Error::IllegalAssignment {
                expected: self.objects.ty_name(expected),
                actual: match &*expr.kind {
                    ast::ExprKind::Int(_) => "int".to_string(),
                    ast::ExprKind::Bool(_) => "bool".to_string(),
                    _ => "float".to_string(),
                },
                span: expr.span,
            }),
            _ => Err(Error::IllegalGlobalInit(expr.span)),
        }
    }

    fn finish(self) -> Result<hir::Program, Error> {
        let main_decl = self
            .program
            .root
            .objects
            .iter()
            .find(|o| o.name.name.as_ref() == "main")
            .ok_or(Error::MissingMain)?;
        let main = self.object_ids[&(main_decl as *const ast::GameObject as usize)];

        // `global_create` runs `create main` with no arguments.
        let expected = self.objects.create_formals(main).len();
        if expected != 0 {
            return Err(Error::ArgCount {
                name: "main".to_string(),
                expected,
                actual: 0,
                span: main_decl.name.span,
            });
        }

        log::debug!(
            "checked {} objects, {} functions, {} globals",
            self.objects.len() - 1,
            self.functions.len(),
            self.globals.len()
        );
        Ok(hir::Program {
            globals: self.globals,
            externs: self.externs,
            functions: self.functions,
            objects: self.objects,
            main,
        })
    }
}

/// Per-function checking context: the namespace scope underneath, then
/// formals and block locals on the stack.
struct FnCtx<'c, 'a> {
    checker: &'c Checker<'a>,
    ns: &'a ast::Namespace,
    scope: &'c NsScope,
    this: Option<ObjectId>,
    super_event: Option<(ObjectId, hir::Event)>,
    ret: Ty,
    locals: Vec<FxHashMap<Rc<str>, (Rc<str>, Ty)>>,
    used: FxHashMap<Rc<str>, u32>,
}

impl FnCtx<'_, '_> {
    fn objects(&self) -> &hir::ObjectTable {
        &self.checker.objects
    }

    fn ty_name(&self, ty: &Ty) -> String {
        self.objects().ty_name(ty)
    }

    /// Adds a local to the innermost scope, renaming shadowed names so
    /// every slot within the function is unique.
    fn bind_local(&mut self, name: &ast::Ident, ty: Ty) -> Result<Rc<str>, Error> {
        reserved(name)?;
        if ty == Ty::Void {
            return Err(Error::VoidBinding(name.name.to_string(), name.span));
        }

        let block = self.locals.last_mut().expect("scope stack is never empty");
        if block.contains_key(&name.name) {
            return Err(Error::Duplicate(
                "local",
                name.name.to_string(),
                name.span,
            ));
        }

        let count = self.used.entry(Rc::clone(&name.name)).or_insert(0);
        let slot: Rc<str> = if *count == 0 {
            Rc::clone(&name.name)
        } else {
            format!("{}.{}", name.name, count).into()
        };
        *count += 1;

        let block = self.locals.last_mut().expect("scope stack is never empty");
        block.insert(Rc::clone(&name.name), (Rc::clone(&slot), ty));
        Ok(slot)
    }

    fn check_block(&mut self, block: &ast::Block, in_loop: bool) -> Result<hir::Block, Error> {
        self.locals.push(FxHashMap::default());
        let stmts = block
            .stmts
            .iter()
            .map(|stmt| self.check_stmt(stmt, in_loop))
            .collect::<Result<Vec<_>, _>>();
        self.locals.pop();
        Ok(hir::Block(stmts?))
    }

    fn check_stmt(&mut self, stmt: &ast::Stmt, in_loop: bool) -> Result<hir::Stmt, Error> {
        match &*stmt.kind {
            ast::StmtKind::Block(block) => Ok(hir::Stmt::Block(self.check_block(block, in_loop)?)),
            ast::StmtKind::Decl(ty, name, init) => {
                let ty = self.checker.resolve_ty(self.ns, ty)?;
                let init = init
                    .as_ref()
                    .map(|init| {
                        let init_span = init.span;
                        let checked = self.check_expr(init)?;
                        self.check_assign(&ty, checked, init_span)
                    })
                    .transpose()?;
                let slot = self.bind_local(name, ty.clone())?;
                Ok(hir::Stmt::Local {
                    name: slot,
                    ty,
                    init,
                })
            }
            ast::StmtKind::Expr(expr) => Ok(hir::Stmt::Expr(self.check_expr(expr)?)),
            ast::StmtKind::Return(None) => {
                if self.ret == Ty::Void {
                    Ok(hir::Stmt::Return(None))
                } else {
                    Err(Error::IllegalAssignment {
                        expected: self.ty_name(&self.ret.clone()),
                        actual: "void".to_string(),
                        span: stmt.span,
                    })
                }
            }
            ast::StmtKind::Return(Some(expr)) => {
                if self.ret == Ty::Void {
                    let checked = self.check_expr(expr)?;
                    return Err(Error::IllegalAssignment {
                        expected: "void".to_string(),
                        actual: self.ty_name(&checked.ty),
                        span: expr.span,
                    });
                }
                let span = expr.span;
                let checked = self.check_expr(expr)?;
                let ret = self.ret.clone();
                let converted = self.check_assign(&ret, checked, span)?;
                Ok(hir::Stmt::Return(Some(converted)))
            }
            ast::StmtKind::Break => {
                if in_loop {
                    Ok(hir::Stmt::Break)
                } else {
                    Err(Error::BreakOutsideLoop(stmt.span))
                }
            }
            ast::StmtKind::If(cond, then, otherwise) => {
                let cond = self.check_predicate(cond)?;
                let then = self.check_block(then, in_loop)?;
                let otherwise = otherwise
                    .as_ref()
                    .map(|stmt| {
                        let checked = self.check_stmt(stmt, in_loop)?;
                        Ok::<hir::Block, Error>(match checked {
                            hir::Stmt::Block(block) => block,
                            other => hir::Block(vec![other]),
                        })
                    })
                    .transpose()?;
                Ok(hir::Stmt::If {
                    cond,
                    then,
                    otherwise,
                })
            }
            ast::StmtKind::While(cond, body) => {
                let cond = self.check_predicate(cond)?;
                let body = self.check_block(body, true)?;
                Ok(hir::Stmt::While { cond, body })
            }
            ast::StmtKind::For(init, cond, step, body) => {
                // The initializer's declarations scope over the whole loop.
                self.locals.push(FxHashMap::default());
                let result = (|| {
                    let init = init
                        .as_ref()
                        .map(|init| self.check_stmt(init, in_loop))
                        .transpose()?;
                    let cond = cond.as_ref().map(|c| self.check_predicate(c)).transpose()?;
                    let step = step.as_ref().map(|s| self.check_expr(s)).transpose()?;
                    let body = self.check_block(body, true)?;
                    Ok(hir::Stmt::For {
                        init: init.map(Box::new),
                        cond,
                        step,
                        body,
                    })
                })();
                self.locals.pop();
                result
            }
            ast::StmtKind::Foreach(path, name, body) => {
                let ty = self.checker.resolve_ty(
                    self.ns,
                    &ast::Ty {
                        span: path.span,
                        kind: ast::TyKind::Object(path.clone()),
                    },
                )?;
                let Ty::Object(object) = ty else {
                    return Err(Error::NonObjectForeach(path.span));
                };

                self.locals.push(FxHashMap::default());
                let result = (|| {
                    let var = self.bind_local(name, Ty::Object(object))?;
                    let body = self.check_block(body, true)?;
                    Ok(hir::Stmt::Foreach { object, var, body })
                })();
                self.locals.pop();
                result
            }
        }
    }

    fn check_predicate(&mut self, expr: &ast::Expr) -> Result<hir::Expr, Error> {
        let span = expr.span;
        let checked = self.check_expr(expr)?;
        if checked.ty == Ty::Bool {
            Ok(checked)
        } else {
            Err(Error::NonBoolPredicate(self.ty_name(&checked.ty), span))
        }
    }

    /// The assignment and conversion rule: equal types pass; int/float
    /// mix wraps the rvalue in a conversion; an object widens to an
    /// ancestor; `none` widens to any object type.
    fn check_assign(&self, expected: &Ty, actual: hir::Expr, span: Span) -> Result<hir::Expr, Error> {
        if *expected == actual.ty {
            return Ok(actual);
        }

        let convertible = matches!(
            (expected, &actual.ty),
            (Ty::Float, Ty::Int) | (Ty::Int, Ty::Float)
        ) || match (expected, &actual.ty) {
            (Ty::Object(p), Ty::Object(c)) => self.objects().is_ancestor(*p, *c),
            (Ty::Object(_), Ty::NoneObject) => true,
            _ => false,
        };

        if convertible {
            let from = actual.ty.clone();
            Ok(hir::Expr {
                ty: expected.clone(),
                kind: Box::new(hir::ExprKind::Conv { from, expr: actual }),
            })
        } else {
            Err(Error::IllegalAssignment {
                expected: self.ty_name(expected),
                actual: self.ty_name(&actual.ty),
                span,
            })
        }
    }

    /// Whether an AST expression may be the target of an assignment,
    /// compound assignment, or `++`/`--`.
    fn is_lvalue(expr: &ast::Expr) -> bool {
        match &*expr.kind {
            ast::ExprKind::Path(path) => !RESERVED.contains(&path.name.name.as_ref()),
            ast::ExprKind::Member(..) => true,
            ast::ExprKind::Subscript(target, _) => Self::is_lvalue(target),
            _ => false,
        }
    }

    fn check_args(
        &mut self,
        name: &str,
        formals: &[Ty],
        args: &[ast::Expr],
        span: Span,
    ) -> Result<Vec<hir::Expr>, Error> {
        if formals.len() != args.len() {
            return Err(Error::ArgCount {
                name: name.to_string(),
                expected: formals.len(),
                actual: args.len(),
                span,
            });
        }

        formals
            .iter()
            .zip(args)
            .map(|(formal, arg)| {
                let arg_span = arg.span;
                let checked = self.check_expr(arg)?;
                self.check_assign(formal, checked, arg_span)
            })
            .collect()
    }

    fn check_expr(&mut self, expr: &ast::Expr) -> Result<hir::Expr, Error> {
        let span = expr.span;
        match &*expr.kind {
            ast::ExprKind::Int(value) => Ok(typed(Ty::Int, hir::ExprKind::Int(*value))),
            ast::ExprKind::Bool(value) => Ok(typed(Ty::Bool, hir::ExprKind::Bool(*value))),
            ast::ExprKind::Float(value) => Ok(typed(Ty::Float, hir::ExprKind::Float(*value))),
            ast::ExprKind::Str(value) => {
                Ok(typed(Ty::String, hir::ExprKind::Str(Rc::clone(value))))
            }
            ast::ExprKind::None => Ok(typed(Ty::NoneObject, hir::ExprKind::None)),
            ast::ExprKind::Array(items) => self.check_array(items, span),
            ast::ExprKind::Path(path) => self.check_path(path),
            ast::ExprKind::Member(recv, name) => self.check_member(recv, name),
            ast::ExprKind::MethodCall(recv, name, args) => {
                self.check_method_call(recv, name, args, span)
            }
            ast::ExprKind::Call(path, args) => self.check_call(path, args, span),
            ast::ExprKind::Subscript(target, index) => self.check_subscript(target, index),
            ast::ExprKind::Create(path, args) => {
                let object = self.checker.resolve_object_path(self.ns, path)?;
                let formals = self.objects().create_formals(object).to_vec();
                let args = self.check_args(&path.name.name, &formals, args, span)?;
                Ok(typed(
                    Ty::Object(object),
                    hir::ExprKind::Create { object, args },
                ))
            }
            ast::ExprKind::Destroy(inner) | ast::ExprKind::Delete(inner) => {
                let inner_span = inner.span;
                let checked = self.check_expr(inner)?;
                if checked.ty.is_object() {
                    Ok(typed(Ty::Void, hir::ExprKind::Destroy(checked)))
                } else {
                    Err(Error::NonObjectDestroy(
                        self.ty_name(&checked.ty),
                        inner_span,
                    ))
                }
            }
            ast::ExprKind::UnOp(op, inner) => self.check_unop(*op, inner, span),
            ast::ExprKind::BinOp(op, lhs, rhs) => self.check_binop(*op, lhs, rhs, span),
            ast::ExprKind::Assign(lhs, rhs) => {
                if !Self::is_lvalue(lhs) {
                    return Err(Error::NotLvalue(lhs.span));
                }
                let target = self.check_expr(lhs)?;
                let rhs_span = rhs.span;
                let value = self.check_expr(rhs)?;
                let value = self.check_assign(&target.ty, value, rhs_span)?;
                let ty = target.ty.clone();
                Ok(typed(ty, hir::ExprKind::Assign(target, value)))
            }
            ast::ExprKind::AssignOp(op, lhs, rhs) => self.check_assign_op(*op, lhs, rhs, span),
            ast::ExprKind::Crement(op, fixity, inner) => {
                if !Self::is_lvalue(inner) {
                    return Err(Error::NotLvalue(inner.span));
                }
                let inner_span = inner.span;
                let target = self.check_expr(inner)?;
                if !target.ty.is_numeric() {
                    return Err(Error::IllegalUnaryOperand {
                        op: match op {
                            ast::Crement::Incr => "++",
                            ast::Crement::Decr => "--",
                        },
                        operand: self.ty_name(&target.ty),
                        span: inner_span,
                    });
                }
                let crement = match op {
                    ast::Crement::Incr => hir::Crement::Incr,
                    ast::Crement::Decr => hir::Crement::Decr,
                };
                let fixity = match fixity {
                    ast::Fixity::Pre => hir::Fixity::Pre,
                    ast::Fixity::Post => hir::Fixity::Post,
                };
                let ty = target.ty.clone();
                Ok(typed(ty, hir::ExprKind::Crement(crement, fixity, target)))
            }
        }
    }

    fn check_array(&mut self, items: &[ast::Expr], span: Span) -> Result<hir::Expr, Error> {
        if items.is_empty() {
            return Err(Error::EmptyArray(span));
        }

        let checked = items
            .iter()
            .map(|item| self.check_expr(item))
            .collect::<Result<Vec<_>, _>>()?;
        let elem = checked[0].ty.clone();
        if checked.iter().any(|item| item.ty != elem) {
            return Err(Error::HeterogeneousArray(span));
        }

        let len = checked.len() as u64;
        Ok(typed(
            Ty::Array(Box::new(elem), len),
            hir::ExprKind::Array(checked),
        ))
    }

    fn check_path(&mut self, path: &ast::Path) -> Result<hir::Expr, Error> {
        if path.chain.is_empty() {
            let name = &path.name;
            for block in self.locals.iter().rev() {
                if let Some((slot, ty)) = block.get(&name.name) {
                    return Ok(typed(ty.clone(), hir::ExprKind::Local(Rc::clone(slot))));
                }
            }

            if name.name.as_ref() == "this" {
                if let Some(this) = self.this {
                    return Ok(typed(Ty::Object(this), hir::ExprKind::This));
                }
            }

            if let Some(this) = self.this {
                if let Some((level, index, ty)) = self.objects().lookup_member(this, &name.name) {
                    return Ok(typed(
                        ty,
                        hir::ExprKind::Member {
                            recv: typed(Ty::Object(this), hir::ExprKind::This),
                            level,
                            index,
                        },
                    ));
                }
            }

            if let Some((symbol, ty)) = self.scope.values.get(&name.name) {
                return Ok(typed(ty.clone(), hir::ExprKind::Global(Rc::clone(symbol))));
            }

            return Err(Error::UnknownIdent(name.name.to_string(), name.span));
        }

        let target = resolve(self.checker.program, self.ns, &path.chain, true)?;
        let global = target
            .globals
            .iter()
            .find(|g| g.name.name == path.name.name)
            .ok_or_else(|| Error::UnknownIdent(path.name.name.to_string(), path.name.span))?;
        let chain = &self.checker.ns_chains[&identity(target)];
        let ty = self.checker.resolve_ty(target, &global.ty)?;
        Ok(typed(
            ty,
            hir::ExprKind::Global(mangle_global(chain, &global.name.name)),
        ))
    }

    fn check_member(&mut self, recv: &ast::Expr, name: &ast::Ident) -> Result<hir::Expr, Error> {
        let recv_span = recv.span;
        let recv = self.check_expr(recv)?;
        let object = match &recv.ty {
            Ty::Object(id) => *id,
            other => return Err(Error::NonObjectMember(self.ty_name(other), recv_span)),
        };

        let (level, index, ty) = self
            .objects()
            .lookup_member(object, &name.name)
            .ok_or_else(|| {
                Error::UnknownMember(
                    name.name.to_string(),
                    self.objects().display_name(object),
                    name.span,
                )
            })?;
        Ok(typed(ty, hir::ExprKind::Member { recv, level, index }))
    }

    fn check_method_call(
        &mut self,
        recv: &ast::Expr,
        name: &ast::Ident,
        args: &[ast::Expr],
        span: Span,
    ) -> Result<hir::Expr, Error> {
        let recv_span = recv.span;
        let recv = self.check_expr(recv)?;
        let object = match &recv.ty {
            Ty::Object(id) => *id,
            other => return Err(Error::NonObjectMember(self.ty_name(other), recv_span)),
        };

        let sig = self
            .objects()
            .lookup_method(object, &name.name)
            .ok_or_else(|| Error::UnknownFunction(name.name.to_string(), name.span))?
            .clone();
        let args = self.check_args(&name.name, &sig.formals, args, span)?;
        Ok(typed(
            sig.ret,
            hir::ExprKind::MethodCall {
                recv,
                symbol: sig.symbol,
                args,
            },
        ))
    }

    fn check_call(
        &mut self,
        path: &ast::Path,
        args: &[ast::Expr],
        span: Span,
    ) -> Result<hir::Expr, Error> {
        if path.chain.is_empty() {
            let name = &path.name;

            // `super` is in scope only inside events of objects with a
            // non-root parent, and names the parent's same-named event.
            if name.name.as_ref() == "super" {
                let Some((parent, event)) = self.super_event else {
                    return Err(Error::UnknownFunction(name.name.to_string(), name.span));
                };
                return self.check_super_call(parent, event, args, span);
            }

            if let Some(this) = self.this {
                if let Some(sig) = self.objects().lookup_method(this, &name.name) {
                    let sig = sig.clone();
                    let args = self.check_args(&name.name, &sig.formals, args, span)?;
                    return Ok(typed(
                        sig.ret,
                        hir::ExprKind::MethodCall {
                            recv: typed(Ty::Object(this), hir::ExprKind::This),
                            symbol: sig.symbol,
                            args,
                        },
                    ));
                }
            }

            let binding = self
                .scope
                .functions
                .get(&name.name)
                .ok_or_else(|| Error::UnknownFunction(name.name.to_string(), name.span))?
                .clone();
            let args = self.check_args(&binding.name, &binding.formals, args, span)?;
            return Ok(typed(
                binding.ret,
                hir::ExprKind::Call {
                    callee: binding.callee,
                    args,
                },
            ));
        }

        let target = resolve(self.checker.program, self.ns, &path.chain, true)?;
        let function = target
            .functions
            .iter()
            .find(|f| f.name.name == path.name.name)
            .ok_or_else(|| Error::UnknownFunction(path.name.name.to_string(), path.name.span))?;
        let chain = &self.checker.ns_chains[&identity(target)];
        let binding = self.checker.fn_binding(target, chain, function)?;
        let args = self.check_args(&binding.name, &binding.formals, args, span)?;
        Ok(typed(
            binding.ret,
            hir::ExprKind::Call {
                callee: binding.callee,
                args,
            },
        ))
    }

    fn check_super_call(
        &mut self,
        parent: ObjectId,
        event: hir::Event,
        args: &[ast::Expr],
        span: Span,
    ) -> Result<hir::Expr, Error> {
        let this = self.this.expect("super implies a receiver");
        let (symbol, formals) = match event {
            // Every type has a destroy event function; the others
            // dispatch to the nearest ancestor that defines the event,
            // falling back to the root's no-ops.
            hir::Event::Destroy => {
                let canon = self.objects().get(parent).canon_name();
                (mangle_member(&canon, "destroy"), Vec::new())
            }
            _ => {
                let level = self.objects().dispatch_level(parent, event);
                let canon = self.objects().get(level).canon_name();
                let formals = if event == hir::Event::Create {
                    self.objects().create_formals(parent).to_vec()
                } else {
                    Vec::new()
                };
                (mangle_member(&canon, event.name()), formals)
            }
        };

        let args = self.check_args("super", &formals, args, span)?;
        Ok(typed(
            Ty::Void,
            hir::ExprKind::MethodCall {
                recv: typed(Ty::Object(this), hir::ExprKind::This),
                symbol,
                args,
            },
        ))
    }

    fn check_subscript(
        &mut self,
        target: &ast::Expr,
        index: &ast::Expr,
    ) -> Result<hir::Expr, Error> {
        let target_span = target.span;
        let target = self.check_expr(target)?;
        let Ty::Array(elem, _) = target.ty.clone() else {
            return Err(Error::NonArraySubscript(
                self.ty_name(&target.ty),
                target_span,
            ));
        };

        let index_span = index.span;
        let index = self.check_expr(index)?;
        if index.ty != Ty::Int {
            return Err(Error::NonIntSubscript(self.ty_name(&index.ty), index_span));
        }
        Ok(typed(*elem, hir::ExprKind::Subscript(target, index)))
    }

    fn check_unop(
        &mut self,
        op: ast::UnOp,
        inner: &ast::Expr,
        span: Span,
    ) -> Result<hir::Expr, Error> {
        let checked = self.check_expr(inner)?;
        match op {
            ast::UnOp::Neg if checked.ty.is_numeric() => {
                let ty = checked.ty.clone();
                Ok(typed(ty, hir::ExprKind::UnOp(hir::UnOp::Neg, checked)))
            }
            ast::UnOp::Not if checked.ty == Ty::Bool => {
                Ok(typed(Ty::Bool, hir::ExprKind::UnOp(hir::UnOp::Not, checked)))
            }
            _ => Err(Error::IllegalUnaryOperand {
                op: match op {
                    ast::UnOp::Neg => "-",
                    ast::UnOp::Not => "!",
                },
                operand: self.ty_name(&checked.ty),
                span,
            }),
        }
    }

    /// Widens a mixed int/float pair so both sides have the same numeric
    /// type. Returns `None` when the pair is not numeric.
    fn unify_numeric(&self, lhs: hir::Expr, rhs: hir::Expr) -> Option<(Ty, hir::Expr, hir::Expr)> {
        match (&lhs.ty, &rhs.ty) {
            (Ty::Int, Ty::Int) => Some((Ty::Int, lhs, rhs)),
            (Ty::Float, Ty::Float) => Some((Ty::Float, lhs, rhs)),
            (Ty::Int, Ty::Float) => Some((Ty::Float, conv(Ty::Float, lhs), rhs)),
            (Ty::Float, Ty::Int) => Some((Ty::Float, lhs, conv(Ty::Float, rhs))),
            _ => None,
        }
    }

    fn check_binop(
        &mut self,
        op: ast::BinOp,
        lhs: &ast::Expr,
        rhs: &ast::Expr,
        span: Span,
    ) -> Result<hir::Expr, Error> {
        let lhs = self.check_expr(lhs)?;
        let rhs = self.check_expr(rhs)?;
        let operands = |cx: &Self, lhs: &hir::Expr, rhs: &hir::Expr| Error::IllegalOperands {
            op: op_str(op),
            lhs: cx.ty_name(&lhs.ty),
            rhs: cx.ty_name(&rhs.ty),
            span,
        };

        match op {
            ast::BinOp::Add
            | ast::BinOp::Sub
            | ast::BinOp::Mul
            | ast::BinOp::Div
            | ast::BinOp::Mod => {
                let err = operands(self, &lhs, &rhs);
                let (ty, lhs, rhs) = self.unify_numeric(lhs, rhs).ok_or(err)?;
                Ok(typed(
                    ty,
                    hir::ExprKind::BinOp(hir_binop(op), lhs, rhs),
                ))
            }
            ast::BinOp::Lt | ast::BinOp::Le | ast::BinOp::Gt | ast::BinOp::Ge => {
                let err = operands(self, &lhs, &rhs);
                let (_, lhs, rhs) = self.unify_numeric(lhs, rhs).ok_or(err)?;
                Ok(typed(
                    Ty::Bool,
                    hir::ExprKind::BinOp(hir_binop(op), lhs, rhs),
                ))
            }
            ast::BinOp::Eq | ast::BinOp::Neq => {
                if lhs.ty.is_object() && rhs.ty.is_object() {
                    let (lhs, rhs) = self.widen_objects(lhs, rhs, op, span)?;
                    return Ok(typed(
                        Ty::Bool,
                        hir::ExprKind::BinOp(hir_binop(op), lhs, rhs),
                    ));
                }
                let err = operands(self, &lhs, &rhs);
                let (_, lhs, rhs) = self.unify_numeric(lhs, rhs).ok_or(err)?;
                Ok(typed(
                    Ty::Bool,
                    hir::ExprKind::BinOp(hir_binop(op), lhs, rhs),
                ))
            }
            ast::BinOp::And | ast::BinOp::Or => {
                if lhs.ty == Ty::Bool && rhs.ty == Ty::Bool {
                    Ok(typed(
                        Ty::Bool,
                        hir::ExprKind::BinOp(hir_binop(op), lhs, rhs),
                    ))
                } else {
                    Err(operands(self, &lhs, &rhs))
                }
            }
        }
    }

    /// Widens two object operands to their common ancestor; at least one
    /// side must be the other's ancestor, or `none`.
    fn widen_objects(
        &self,
        lhs: hir::Expr,
        rhs: hir::Expr,
        op: ast::BinOp,
        span: Span,
    ) -> Result<(hir::Expr, hir::Expr), Error> {
        match (&lhs.ty, &rhs.ty) {
            (Ty::NoneObject, Ty::NoneObject) => Ok((lhs, rhs)),
            (Ty::NoneObject, Ty::Object(id)) => {
                let to = Ty::Object(*id);
                Ok((conv(to, lhs), rhs))
            }
            (Ty::Object(id), Ty::NoneObject) => {
                let to = Ty::Object(*id);
                Ok((lhs, conv(to, rhs)))
            }
            (Ty::Object(a), Ty::Object(b)) => {
                if a == b {
                    Ok((lhs, rhs))
                } else if self.objects().is_ancestor(*a, *b) {
                    let to = Ty::Object(*a);
                    Ok((lhs, conv(to, rhs)))
                } else if self.objects().is_ancestor(*b, *a) {
                    let to = Ty::Object(*b);
                    Ok((conv(to, lhs), rhs))
                } else {
                    Err(Error::IllegalOperands {
                        op: op_str(op),
                        lhs: self.ty_name(&lhs.ty),
                        rhs: self.ty_name(&rhs.ty),
                        span,
                    })
                }
            }
            _ => unreachable!("both operands are objects"),
        }
    }

    fn check_assign_op(
        &mut self,
        op: ast::BinOp,
        lhs: &ast::Expr,
        rhs: &ast::Expr,
        span: Span,
    ) -> Result<hir::Expr, Error> {
        if !Self::is_lvalue(lhs) {
            return Err(Error::NotLvalue(lhs.span));
        }

        let target = self.check_expr(lhs)?;
        let rhs = self.check_expr(rhs)?;
        if !target.ty.is_numeric() {
            return Err(Error::IllegalOperands {
                op: op_str(op),
                lhs: self.ty_name(&target.ty),
                rhs: self.ty_name(&rhs.ty),
                span,
            });
        }

        // Only the right side converts: a float rvalue never narrows into
        // an int target.
        let rhs = match (&target.ty, &rhs.ty) {
            (Ty::Int, Ty::Int) | (Ty::Float, Ty::Float) => rhs,
            (Ty::Float, Ty::Int) => conv(Ty::Float, rhs),
            _ => {
                return Err(Error::IllegalOperands {
                    op: op_str(op),
                    lhs: self.ty_name(&target.ty),
                    rhs: self.ty_name(&rhs.ty),
                    span,
                })
            }
        };

        let ty = target.ty.clone();
        Ok(typed(
            ty,
            hir::ExprKind::AssignOp(hir_binop(op), target, rhs),
        ))
    }
}

fn typed(ty: Ty, kind: hir::ExprKind) -> hir::Expr {
    hir::Expr {
        ty,
        kind: Box::new(kind),
    }
}

fn conv(to: Ty, expr: hir::Expr) -> hir::Expr {
    let from = expr.ty.clone();
    hir::Expr {
        ty: to,
        kind: Box::new(hir::ExprKind::Conv { from, expr }),
    }
}
