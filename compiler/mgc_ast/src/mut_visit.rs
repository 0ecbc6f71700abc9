// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ast::{
    Block, Expr, ExprKind, Function, GameObject, Global, Ident, Namespace, NamespaceRef, Path,
    Stmt, StmtKind, Ty, TyKind, Using,
};
use mgc_data_structures::span::Span;

/// A mutable AST visitor. The loader uses it to shift every span in a
/// freshly parsed file by the file's offset in the source map.
pub trait MutVisitor: Sized {
    fn visit_namespace(&mut self, namespace: &mut Namespace) {
        walk_namespace(self, namespace);
    }

    fn visit_function(&mut self, function: &mut Function) {
        walk_function(self, function);
    }

    fn visit_block(&mut self, block: &mut Block) {
        walk_block(self, block);
    }

    fn visit_stmt(&mut self, stmt: &mut Stmt) {
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &mut Expr) {
        walk_expr(self, expr);
    }

    fn visit_ty(&mut self, ty: &mut Ty) {
        walk_ty(self, ty);
    }

    fn visit_path(&mut self, path: &mut Path) {
        walk_path(self, path);
    }

    fn visit_ident(&mut self, ident: &mut Ident) {
        self.visit_span(&mut ident.span);
    }

    fn visit_span(&mut self, _: &mut Span) {}
}

pub fn walk_namespace(vis: &mut impl MutVisitor, namespace: &mut Namespace) {
    vis.visit_span(&mut namespace.span);
    for using in &mut namespace.usings {
        vis.visit_span(&mut using.span);
        walk_using(vis, using);
    }
    for global in &mut namespace.globals {
        walk_global(vis, global);
    }
    for function in &mut namespace.functions {
        vis.visit_function(function);
    }
    for object in &mut namespace.objects {
        walk_object(vis, object);
    }
    for decl in &mut namespace.namespaces {
        vis.visit_span(&mut decl.span);
        vis.visit_ident(&mut decl.name);
        match &mut decl.kind {
            NamespaceRef::Concrete(ns) => vis.visit_namespace(ns),
            NamespaceRef::Alias(chain) => {
                for segment in chain {
                    vis.visit_ident(segment);
                }
            }
            NamespaceRef::File(_) => {}
        }
    }
}

fn walk_using(vis: &mut impl MutVisitor, using: &mut Using) {
    for segment in &mut using.chain {
        vis.visit_ident(segment);
    }
}

fn walk_global(vis: &mut impl MutVisitor, global: &mut Global) {
    vis.visit_span(&mut global.span);
    vis.visit_ty(&mut global.ty);
    vis.visit_ident(&mut global.name);
    if let Some(init) = &mut global.init {
        vis.visit_expr(init);
    }
}

fn walk_object(vis: &mut impl MutVisitor, object: &mut GameObject) {
    vis.visit_span(&mut object.span);
    vis.visit_ident(&mut object.name);
    if let Some(parent) = &mut object.parent {
        vis.visit_path(parent);
    }
    for (ty, name) in &mut object.members {
        vis.visit_ty(ty);
        vis.visit_ident(name);
    }
    for method in &mut object.methods {
        vis.visit_function(method);
    }
    for (_, function) in &mut object.events {
        vis.visit_function(function);
    }
}

pub fn walk_function(vis: &mut impl MutVisitor, function: &mut Function) {
    vis.visit_span(&mut function.span);
    vis.visit_ty(&mut function.ret);
    vis.visit_ident(&mut function.name);
    for (ty, name) in &mut function.formals {
        vis.visit_ty(ty);
        vis.visit_ident(name);
    }
    if let Some(body) = &mut function.body {
        vis.visit_block(body);
    }
}

pub fn walk_block(vis: &mut impl MutVisitor, block: &mut Block) {
    vis.visit_span(&mut block.span);
    for stmt in &mut block.stmts {
        vis.visit_stmt(stmt);
    }
}

pub fn walk_stmt(vis: &mut impl MutVisitor, stmt: &mut Stmt) {
    vis.visit_span(&mut stmt.span);
    match &mut *stmt.kind {
        StmtKind::Block(block) => vis.visit_block(block),
        StmtKind::Decl(ty, name, init) => {
            vis.visit_ty(ty);
            vis.visit_ident(name);
            if let Some(init) = init {
                vis.visit_expr(init);
            }
        }
        StmtKind::Expr(expr) => vis.visit_expr(expr),
        StmtKind::Return(Some(expr)) => vis.visit_expr(expr),
        StmtKind::Return(None) | StmtKind::Break => {}
        StmtKind::If(cond, then, otherwise) => {
            vis.visit_expr(cond);
            vis.visit_block(then);
            if let Some(otherwise) = otherwise {
                vis.visit_stmt(otherwise);
            }
        }
        StmtKind::While(cond, body) => {
            vis.visit_expr(cond);
            vis.visit_block(body);
        }
        StmtKind::For(init, cond, step, body) => {
            if let Some(init) = init {
                vis.visit_stmt(init);
            }
            if let Some(cond) = cond {
                vis.visit_expr(cond);
            }
            if let Some(step) = step {
                vis.visit_expr(step);
            }
            vis.visit_block(body);
        }
        StmtKind::Foreach(path, name, body) => {
            vis.visit_path(path);
            vis.visit_ident(name);
            vis.visit_block(body);
        }
    }
}

pub fn walk_expr(vis: &mut impl MutVisitor, expr: &mut Expr) {
    vis.visit_span(&mut expr.span);
    match &mut *expr.kind {
        ExprKind::Int(_)
        | ExprKind::Bool(_)
        | ExprKind::Float(_)
        | ExprKind::Str(_)
        | ExprKind::None => {}
        ExprKind::Array(items) => {
            for item in items {
                vis.visit_expr(item);
            }
        }
        ExprKind::Path(path) => vis.visit_path(path),
        ExprKind::Member(recv, name) => {
            vis.visit_expr(recv);
            vis.visit_ident(name);
        }
        ExprKind::MethodCall(recv, name, args) => {
            vis.visit_expr(recv);
            vis.visit_ident(name);
            for arg in args {
                vis.visit_expr(arg);
            }
        }
        ExprKind::Call(path, args) | ExprKind::Create(path, args) => {
            vis.visit_path(path);
            for arg in args {
                vis.visit_expr(arg);
            }
        }
        ExprKind::Subscript(target, index) => {
            vis.visit_expr(target);
            vis.visit_expr(index);
        }
        ExprKind::Destroy(inner)
        | ExprKind::Delete(inner)
        | ExprKind::UnOp(_, inner)
        | ExprKind::Crement(_, _, inner) => vis.visit_expr(inner),
        ExprKind::BinOp(_, lhs, rhs)
        | ExprKind::Assign(lhs, rhs)
        | ExprKind::AssignOp(_, lhs, rhs) => {
            vis.visit_expr(lhs);
            vis.visit_expr(rhs);
        }
    }
}

pub fn walk_ty(vis: &mut impl MutVisitor, ty: &mut Ty) {
    vis.visit_span(&mut ty.span);
    match &mut ty.kind {
        TyKind::Object(path) => vis.visit_path(path),
        TyKind::Array(elem, _) => vis.visit_ty(elem),
        _ => {}
    }
}

pub fn walk_path(vis: &mut impl MutVisitor, path: &mut Path) {
    vis.visit_span(&mut path.span);
    for segment in &mut path.chain {
        vis.visit_ident(segment);
    }
    vis.visit_ident(&mut path.name);
}
