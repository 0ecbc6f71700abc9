// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::{
    builder::FunctionBuilder,
    layout::{
        self, ir_ty, member_path, node_ty, ref_ty, struct_ty, vtable_slot, vtable_ty, zero_value,
        ROOT_ID, ROOT_VTABLE,
    },
    objects, Error,
};
use mgc_hir::{
    hir::{self, Event},
    ty::{ObjectId, Ty},
};
use mgc_ir::ir::{self, BinOpcode, Const, FCond, GepIndex, ICond, Instr, Operand, Terminator, Value};
use rustc_hash::FxHashMap;
use std::rc::Rc;

/// Interned string literals, emitted as private constants.
#[derive(Default)]
pub(crate) struct StringTable {
    names: FxHashMap<Rc<str>, Rc<str>>,
    defs: Vec<(Rc<str>, Rc<str>)>,
}

impl StringTable {
    fn intern(&mut self, text: &Rc<str>) -> Rc<str> {
        if let Some(name) = self.names.get(text) {
            return Rc::clone(name);
        }
        let name: Rc<str> = format!("str.{}", self.defs.len()).into();
        self.names.insert(Rc::clone(text), Rc::clone(&name));
        self.defs.push((Rc::clone(&name), Rc::clone(text)));
        name
    }
}

pub(crate) struct ModuleEmitter<'a> {
    pub(crate) program: &'a hir::Program,
    pub(crate) module: ir::Module,
    pub(crate) strings: StringTable,
}

impl<'a> ModuleEmitter<'a> {
    pub(crate) fn new(program: &'a hir::Program) -> Self {
        Self {
            program,
            module: ir::Module::default(),
            strings: StringTable::default(),
        }
    }

    pub(crate) fn emit(&mut self) -> Result<(), Error> {
        objects::emit_types(self);
        objects::emit_globals(self);
        objects::emit_externs(self);
        objects::emit_root_events(self);
        objects::emit_objects(self)?;

        for def in &self.program.functions {
            let function = self.emit_fn_def(def, None)?;
            self.module.functions.push(function);
        }

        objects::emit_global_events(self);
        Ok(())
    }

    pub(crate) fn finish(mut self) -> ir::Module {
        for (name, text) in &self.strings.defs {
            let len = text.len() as u64 + 1;
            self.module.globals.push(ir::GlobalVar {
                name: Rc::clone(name),
                ty: ir::Ty::Array(Box::new(ir::Ty::I8), len),
                init: Const::Str(Rc::clone(text)),
                constant: true,
            });
        }
        self.module
    }

    /// Emits a checked function body. For destroy events, `destroy_of`
    /// routes every return through the post-work block that unlinks the
    /// type-list node and chains to the parent's destroy.
    pub(crate) fn emit_fn_def(
        &mut self,
        def: &hir::FunctionDef,
        destroy_of: Option<ObjectId>,
    ) -> Result<ir::Function, Error> {
        let mut params = Vec::new();
        if def.this.is_some() {
            params.push((Rc::from("this"), ref_ty()));
        }
        for (slot, ty) in &def.formals {
            params.push((Rc::clone(slot), ir_ty(ty)));
        }

        let mut fx = FnEmitter {
            program: self.program,
            strings: &mut self.strings,
            b: FunctionBuilder::new(Rc::clone(&def.symbol), params.clone(), ir_ty(&def.ret)),
            locals: FxHashMap::default(),
            break_target: None,
            ret_jump: None,
        };

        for (name, ty) in &params {
            fx.bind_param(name, ty.clone());
        }

        if let Some(object) = destroy_of {
            let post = fx.b.block("destroy.post");
            fx.ret_jump = Some(Rc::clone(&post));
            fx.emit_block(&def.body)?;
            fx.b.terminate(Terminator::Br(Rc::clone(&post)));
            fx.b.switch_to(&post);
            objects::emit_destroy_post(self.program, &mut fx.b, object);
        } else {
            fx.emit_block(&def.body)?;
        }

        Ok(fx.b.finish())
    }
}

pub(crate) struct FnEmitter<'a, 'm> {
    pub(crate) program: &'a hir::Program,
    strings: &'m mut StringTable,
    pub(crate) b: FunctionBuilder,
    locals: FxHashMap<Rc<str>, (ir::Ty, Value)>,
    break_target: Option<Rc<str>>,
    ret_jump: Option<Rc<str>>,
}

impl FnEmitter<'_, '_> {
    fn bind_param(&mut self, name: &Rc<str>, ty: ir::Ty) {
        let addr = self
            .b
            .alloca(format!("{name}.addr").into(), ty.clone());
        self.b
            .store(ty.clone(), Value::Local(Rc::clone(name)), addr.clone());
        self.locals.insert(Rc::clone(name), (ty, addr));
    }

    fn bind_local(&mut self, name: &Rc<str>, ty: ir::Ty) -> Value {
        let addr = self
            .b
            .alloca(format!("{name}.addr").into(), ty.clone());
        self.locals.insert(Rc::clone(name), (ty, addr.clone()));
        addr
    }

    pub(crate) fn emit_block(&mut self, block: &hir::Block) -> Result<(), Error> {
        for stmt in &block.0 {
            self.emit_stmt(stmt)?;
        }
        Ok(())
    }

    fn emit_stmt(&mut self, stmt: &hir::Stmt) -> Result<(), Error> {
        match stmt {
            hir::Stmt::Expr(expr) => {
                self.emit_expr(expr)?;
                Ok(())
            }
            hir::Stmt::Local { name, ty, init } => {
                let ty = ir_ty(ty);
                let value = match init {
                    Some(init) => self.emit_value(init)?,
                    None => Value::Const(zero_value(&ty)),
                };
                let addr = self.bind_local(name, ty.clone());
                self.b.store(ty, value, addr);
                Ok(())
            }
            hir::Stmt::Return(value) => {
                match value {
                    None => match &self.ret_jump {
                        Some(target) => {
                            let target = Rc::clone(target);
                            self.b.terminate(Terminator::Br(target));
                        }
                        None => self.b.terminate(Terminator::Ret(None)),
                    },
                    Some(expr) => {
                        let value = self.emit_value(expr)?;
                        self.b.terminate(Terminator::Ret(Some(Operand {
                            ty: ir_ty(&expr.ty),
                            value,
                        })));
                    }
                }
                // Orphan statements after a return land in a fresh,
                // unreachable block.
                let dead = self.b.block("dead");
                self.b.switch_to(&dead);
                Ok(())
            }
            hir::Stmt::Break => {
                let target = Rc::clone(
                    self.break_target
                        .as_ref()
                        .expect("break outside a loop is rejected by the analyzer"),
                );
                self.b.terminate(Terminator::Br(target));
                let dead = self.b.block("dead");
                self.b.switch_to(&dead);
                Ok(())
            }
            hir::Stmt::Block(block) => self.emit_block(block),
            hir::Stmt::If {
                cond,
                then,
                otherwise,
            } => {
                let cond = self.emit_value(cond)?;
                let then_label = self.b.block("if.then");
                let else_label = otherwise.as_ref().map(|_| self.b.block("if.else"));
                let end = self.b.block("if.end");

                let false_target = else_label.clone().unwrap_or_else(|| Rc::clone(&end));
                self.b
                    .terminate(Terminator::CondBr(cond, Rc::clone(&then_label), false_target));

                self.b.switch_to(&then_label);
                self.emit_block(then)?;
                self.b.terminate(Terminator::Br(Rc::clone(&end)));

                if let (Some(label), Some(block)) = (&else_label, otherwise) {
                    self.b.switch_to(label);
                    self.emit_block(block)?;
                    self.b.terminate(Terminator::Br(Rc::clone(&end)));
                }

                self.b.switch_to(&end);
                Ok(())
            }
            hir::Stmt::While { cond, body } => self.emit_loop(Some(cond), body, None),
            hir::Stmt::For {
                init,
                cond,
                step,
                body,
            } => {
                if let Some(init) = init {
                    self.emit_stmt(init)?;
                }
                self.emit_loop(cond.as_ref(), body, step.as_ref())
            }
            hir::Stmt::Foreach { object, var, body } => self.emit_foreach(*object, var, body),
        }
    }

    /// The shared loop shape: a predicate block, a body block, and a
    /// merge. `for` is the same rewrite with its step expression emitted
    /// at the end of the body.
    fn emit_loop(
        &mut self,
        cond: Option<&hir::Expr>,
        body: &hir::Block,
        step: Option<&hir::Expr>,
    ) -> Result<(), Error> {
        let cond_label = self.b.block("loop.cond");
        let body_label = self.b.block("loop.body");
        let end = self.b.block("loop.end");

        self.b.terminate(Terminator::Br(Rc::clone(&cond_label)));
        self.b.switch_to(&cond_label);
        let cond = match cond {
            Some(cond) => self.emit_value(cond)?,
            None => Value::Const(Const::Bool(true)),
        };
        self.b.terminate(Terminator::CondBr(
            cond,
            Rc::clone(&body_label),
            Rc::clone(&end),
        ));

        self.b.switch_to(&body_label);
        let saved = self.break_target.replace(Rc::clone(&end));
        self.emit_block(body)?;
        if let Some(step) = step {
            self.emit_expr(step)?;
        }
        self.break_target = saved;
        self.b.terminate(Terminator::Br(cond_label));

        self.b.switch_to(&end);
        Ok(())
    }

    /// Iterates a type list with a two-cursor walk: the next pointer is
    /// read before the body runs, so destruction of the current object
    /// cannot lose the position, and dead objects (id 0) are skipped.
    fn emit_foreach(
        &mut self,
        object: ObjectId,
        var: &Rc<str>,
        body: &hir::Block,
    ) -> Result<(), Error> {
        let table = &self.program.objects;
        let head = Value::Const(Const::Global(layout::list_head(table, object)));
        let tail = Value::Const(Const::Global(layout::list_tail(table, object)));
        let root = struct_ty(table, ObjectId::ROOT);

        let cursor_name = self.b.temp();
        let cursor = self.b.alloca(cursor_name, ir::Ty::Ptr);
        let first_addr = self.b.gep(node_ty(), head, &[0, 1]);
        let first = self.b.load(ir::Ty::Ptr, first_addr);
        self.b.store(ir::Ty::Ptr, first, cursor.clone());
        let var_addr = self.bind_local(var, ref_ty());

        let cond_label = self.b.block("foreach.cond");
        let check_label = self.b.block("foreach.check");
        let body_label = self.b.block("foreach.body");
        let end = self.b.block("foreach.end");

        self.b.terminate(Terminator::Br(Rc::clone(&cond_label)));
        self.b.switch_to(&cond_label);
        let cur = self.b.load(ir::Ty::Ptr, cursor.clone());
        let done = self.b.icmp(ICond::Eq, ir::Ty::Ptr, cur.clone(), tail);
        self.b.terminate(Terminator::CondBr(
            done,
            Rc::clone(&end),
            Rc::clone(&check_label),
        ));

        self.b.switch_to(&check_label);
        let cur = self.b.load(ir::Ty::Ptr, cursor.clone());
        let owner_addr = self.b.gep(node_ty(), cur.clone(), &[0, 2]);
        let owner = self.b.load(ir::Ty::Ptr, owner_addr);
        let next_addr = self.b.gep(node_ty(), cur, &[0, 1]);
        let next = self.b.load(ir::Ty::Ptr, next_addr);
        self.b.store(ir::Ty::Ptr, next, cursor);
        let id_addr = self
            .b
            .gep(root, owner.clone(), &[0, ROOT_ID]);
        let id = self.b.load(ir::Ty::I64, id_addr);
        let dead = self
            .b
            .icmp(ICond::Eq, ir::Ty::I64, id.clone(), Value::Const(Const::Int(0)));
        self.b.terminate(Terminator::CondBr(
            dead,
            Rc::clone(&cond_label),
            Rc::clone(&body_label),
        ));

        self.b.switch_to(&body_label);
        let reference = self.b.make_ref(ref_ty(), id, owner);
        self.b.store(ref_ty(), reference, var_addr);
        let saved = self.break_target.replace(Rc::clone(&end));
        self.emit_block(body)?;
        self.break_target = saved;
        self.b.terminate(Terminator::Br(cond_label));

        self.b.switch_to(&end);
        Ok(())
    }

    fn b_temp(&mut self) -> Rc<str> {
        self.b.temp()
    }

    /// Emits an expression that the checker typed non-void.
    fn emit_value(&mut self, expr: &hir::Expr) -> Result<Value, Error> {
        Ok(self
            .emit_expr(expr)?
            .expect("non-void expression should produce a value"))
    }

    fn operand(&mut self, expr: &hir::Expr) -> Result<Operand, Error> {
        Ok(Operand {
            ty: ir_ty(&expr.ty),
            value: self.emit_value(expr)?,
        })
    }

    fn emit_expr(&mut self, expr: &hir::Expr) -> Result<Option<Value>, Error> {
        match &*expr.kind {
            hir::ExprKind::Int(value) => Ok(Some(Value::Const(Const::Int(*value)))),
            hir::ExprKind::Bool(value) => Ok(Some(Value::Const(Const::Bool(*value)))),
            hir::ExprKind::Float(value) => Ok(Some(Value::Const(Const::F64(*value)))),
            hir::ExprKind::Str(text) => {
                let name = self.strings.intern(text);
                Ok(Some(Value::Const(Const::Global(name))))
            }
            hir::ExprKind::None => Ok(Some(Value::Const(Const::Zero))),
            hir::ExprKind::Array(items) => {
                let ty = ir_ty(&expr.ty);
                let name = self.b.temp();
                let addr = self.b.alloca(name, ty.clone());
                for (index, item) in items.iter().enumerate() {
                    let value = self.emit_value(item)?;
                    let slot = self.b.gep(
                        ty.clone(),
                        addr.clone(),
                        &[0, u32::try_from(index).expect("array index should fit u32")],
                    );
                    self.b.store(ir_ty(&item.ty), value, slot);
                }
                Ok(Some(self.b.load(ty, addr)))
            }
            hir::ExprKind::Local(slot) => {
                let (ty, addr) = self.locals[slot].clone();
                Ok(Some(self.b.load(ty, addr)))
            }
            hir::ExprKind::This => {
                let (ty, addr) = self.locals[&Rc::from("this")].clone();
                Ok(Some(self.b.load(ty, addr)))
            }
            hir::ExprKind::Global(symbol) => {
                let ty = ir_ty(&expr.ty);
                Ok(Some(
                    self.b.load(ty, Value::Const(Const::Global(Rc::clone(symbol)))),
                ))
            }
            hir::ExprKind::Member { .. } | hir::ExprKind::Subscript(..) => {
                let (ty, addr) = self.emit_place(expr)?;
                Ok(Some(self.b.load(ty, addr)))
            }
            hir::ExprKind::Call { callee, args } => {
                let args = args
                    .iter()
                    .map(|arg| self.operand(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                let name = match callee {
                    hir::Callee::Extern(name) | hir::Callee::Fn(name) => Rc::clone(name),
                };
                Ok(self.b.call(ir_ty(&expr.ty), name, args))
            }
            hir::ExprKind::MethodCall { recv, symbol, args } => {
                let mut operands = vec![self.operand(recv)?];
                for arg in args {
                    operands.push(self.operand(arg)?);
                }
                Ok(self.b.call(ir_ty(&expr.ty), Rc::clone(symbol), operands))
            }
            hir::ExprKind::Create { object, args } => {
                let ctor = layout::ctor_name(&self.program.objects, *object);
                let args = args
                    .iter()
                    .map(|arg| self.operand(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(self.b.call(ref_ty(), ctor, args))
            }
            hir::ExprKind::Destroy(inner) => {
                self.emit_destroy(inner)?;
                Ok(None)
            }
            hir::ExprKind::UnOp(op, inner) => {
                let ty = ir_ty(&inner.ty);
                let value = self.emit_value(inner)?;
                let result = match op {
                    hir::UnOp::Neg => {
                        let (opcode, zero) = if ty == ir::Ty::F64 {
                            (BinOpcode::Fsub, Const::F64(0.0))
                        } else {
                            (BinOpcode::Sub, Const::Int(0))
                        };
                        self.bin(opcode, ty, Value::Const(zero), value)
                    }
                    hir::UnOp::Not => self.b.icmp(
                        ICond::Eq,
                        ir::Ty::I1,
                        value,
                        Value::Const(Const::Bool(false)),
                    ),
                };
                Ok(Some(result))
            }
            hir::ExprKind::BinOp(op, lhs, rhs) => Ok(Some(self.emit_binop(*op, lhs, rhs)?)),
            hir::ExprKind::Conv { from, expr: inner } => {
                let value = self.emit_value(inner)?;
                match (from, &expr.ty) {
                    (Ty::Int, Ty::Float) => {
                        let dst = self.b_temp();
                        self.b.push(Instr::Sitofp {
                            dst: Rc::clone(&dst),
                            value,
                        });
                        Ok(Some(Value::Local(dst)))
                    }
                    (Ty::Float, Ty::Int) => {
                        let dst = self.b_temp();
                        self.b.push(Instr::Fptosi {
                            dst: Rc::clone(&dst),
                            value,
                        });
                        Ok(Some(Value::Local(dst)))
                    }
                    // Object widening re-types the same reference.
                    _ => Ok(Some(value)),
                }
            }
            hir::ExprKind::Assign(target, value) => {
                let (ty, addr) = self.emit_place(target)?;
                let value = self.emit_value(value)?;
                self.b.store(ty, value.clone(), addr);
                Ok(Some(value))
            }
            hir::ExprKind::AssignOp(op, target, value) => {
                let (ty, addr) = self.emit_place(target)?;
                let old = self.b.load(ty.clone(), addr.clone());
                let rhs = self.emit_value(value)?;
                let opcode = arith_opcode(*op, &ty)?;
                let new = self.bin(opcode, ty.clone(), old, rhs);
                self.b.store(ty, new.clone(), addr);
                Ok(Some(new))
            }
            hir::ExprKind::Crement(op, fixity, target) => {
                let (ty, addr) = self.emit_place(target)?;
                let old = self.b.load(ty.clone(), addr.clone());
                let (opcode, one) = match (&ty, op) {
                    (ir::Ty::F64, hir::Crement::Incr) => (BinOpcode::Fadd, Const::F64(1.0)),
                    (ir::Ty::F64, hir::Crement::Decr) => (BinOpcode::Fsub, Const::F64(1.0)),
                    (_, hir::Crement::Incr) => (BinOpcode::Add, Const::Int(1)),
                    (_, hir::Crement::Decr) => (BinOpcode::Sub, Const::Int(1)),
                };
                let new = self.bin(opcode, ty.clone(), old.clone(), Value::Const(one));
                self.b.store(ty, new.clone(), addr);
                Ok(Some(match fixity {
                    hir::Fixity::Pre => new,
                    hir::Fixity::Post => old,
                }))
            }
        }
    }

    fn bin(&mut self, op: BinOpcode, ty: ir::Ty, lhs: Value, rhs: Value) -> Value {
        let dst = self.b_temp();
        self.b.push(Instr::Bin {
            dst: Rc::clone(&dst),
            op,
            ty,
            lhs,
            rhs,
        });
        Value::Local(dst)
    }

    fn emit_binop(&mut self, op: hir::BinOp, lhs: &hir::Expr, rhs: &hir::Expr) -> Result<Value, Error> {
        // Object equality compares ids.
        if lhs.ty.is_object() {
            let l = self.emit_value(lhs)?;
            let r = self.emit_value(rhs)?;
            let lid = self.b.extract(ref_ty(), l, 0);
            let rid = self.b.extract(ref_ty(), r, 0);
            let cond = match op {
                hir::BinOp::Eq => ICond::Eq,
                hir::BinOp::Neq => ICond::Ne,
                _ => unreachable!("objects only support equality"),
            };
            return Ok(self.b.icmp(cond, ir::Ty::I64, lid, rid));
        }

        let ty = ir_ty(&lhs.ty);
        let l = self.emit_value(lhs)?;
        let r = self.emit_value(rhs)?;
        match op {
            hir::BinOp::Add
            | hir::BinOp::Sub
            | hir::BinOp::Mul
            | hir::BinOp::Div
            | hir::BinOp::Mod => {
                let opcode = arith_opcode(op, &ty)?;
                Ok(self.bin(opcode, ty, l, r))
            }
            hir::BinOp::And => Ok(self.bin(BinOpcode::And, ir::Ty::I1, l, r)),
            hir::BinOp::Or => Ok(self.bin(BinOpcode::Or, ir::Ty::I1, l, r)),
            hir::BinOp::Eq
            | hir::BinOp::Neq
            | hir::BinOp::Lt
            | hir::BinOp::Le
            | hir::BinOp::Gt
            | hir::BinOp::Ge => {
                if ty == ir::Ty::F64 {
                    let cond = match op {
                        hir::BinOp::Eq => FCond::Oeq,
                        hir::BinOp::Neq => FCond::One,
                        hir::BinOp::Lt => FCond::Olt,
                        hir::BinOp::Le => FCond::Ole,
                        hir::BinOp::Gt => FCond::Ogt,
                        hir::BinOp::Ge => FCond::Oge,
                        _ => unreachable!(),
                    };
                    let dst = self.b_temp();
                    self.b.push(Instr::Fcmp {
                        dst: Rc::clone(&dst),
                        cond,
                        lhs: l,
                        rhs: r,
                    });
                    Ok(Value::Local(dst))
                } else {
                    let cond = match op {
                        hir::BinOp::Eq => ICond::Eq,
                        hir::BinOp::Neq => ICond::Ne,
                        hir::BinOp::Lt => ICond::Slt,
                        hir::BinOp::Le => ICond::Sle,
                        hir::BinOp::Gt => ICond::Sgt,
                        hir::BinOp::Ge => ICond::Sge,
                        _ => unreachable!(),
                    };
                    Ok(self.b.icmp(cond, ty, l, r))
                }
            }
        }
    }

    /// Destroy: dispatch the destroy event through the vtable, then zero
    /// the id so the reaper frees the memory on the next global pass.
    fn emit_destroy(&mut self, inner: &hir::Expr) -> Result<(), Error> {
        let table = &self.program.objects;
        let root = struct_ty(table, ObjectId::ROOT);

        let reference = self.emit_value(inner)?;
        let ptr = self.b.extract(ref_ty(), reference.clone(), 1);
        let vt_addr = self.b.gep(root.clone(), ptr.clone(), &[0, ROOT_VTABLE]);
        let vt = self.b.load(ir::Ty::Ptr, vt_addr);
        let slot_addr = self
            .b
            .gep(vtable_ty(), vt, &[0, vtable_slot(Event::Destroy)]);
        let callee = self.b.load(ir::Ty::Ptr, slot_addr);
        self.b.push(Instr::CallPtr {
            dst: None,
            ret: ir::Ty::Void,
            callee,
            args: vec![Operand {
                ty: ref_ty(),
                value: reference,
            }],
        });

        let id_addr = self.b.gep(root, ptr, &[0, ROOT_ID]);
        self.b
            .store(ir::Ty::I64, Value::Const(Const::Int(0)), id_addr);
        Ok(())
    }

    /// Emits the address of an lvalue. A subscript of a non-place array
    /// value is materialized into a stack slot first.
    fn emit_place(&mut self, expr: &hir::Expr) -> Result<(ir::Ty, Value), Error> {
        match &*expr.kind {
            hir::ExprKind::Local(slot) => {
                let (ty, addr) = self.locals[slot].clone();
                Ok((ty, addr))
            }
            hir::ExprKind::Global(symbol) => Ok((
                ir_ty(&expr.ty),
                Value::Const(Const::Global(Rc::clone(symbol))),
            )),
            hir::ExprKind::Member { recv, level, index } => {
                let Ty::Object(from) = recv.ty.clone() else {
                    unreachable!("member receivers are object-typed");
                };
                let reference = self.emit_value(recv)?;
                let ptr = self.b.extract(ref_ty(), reference, 1);
                let table = &self.program.objects;
                let path = member_path(table, from, *level, *index);
                let base = struct_ty(table, from);
                let addr = self.b.gep(base, ptr, &path);
                Ok((ir_ty(&expr.ty), addr))
            }
            hir::ExprKind::Subscript(target, index) => {
                let (array_ty, base_addr) = if is_place(target) {
                    self.emit_place(target)?
                } else {
                    let ty = ir_ty(&target.ty);
                    let value = self.emit_value(target)?;
                    let name = self.b.temp();
                    let tmp = self.b.alloca(name, ty.clone());
                    self.b.store(ty.clone(), value, tmp.clone());
                    (ty, tmp)
                };
                let index = self.emit_value(index)?;
                let dst = self.b_temp();
                self.b.push(Instr::Gep {
                    dst: Rc::clone(&dst),
                    base: array_ty,
                    ptr: base_addr,
                    indices: vec![GepIndex::Const(0), GepIndex::Value(index)],
                });
                Ok((ir_ty(&expr.ty), Value::Local(dst)))
            }
            _ => unreachable!("lvalue shapes are checked by the analyzer"),
        }
    }
}

fn is_place(expr: &hir::Expr) -> bool {
    match &*expr.kind {
        hir::ExprKind::Local(_) | hir::ExprKind::Global(_) | hir::ExprKind::Member { .. } => true,
        hir::ExprKind::Subscript(target, _) => is_place(target),
        _ => false,
    }
}

fn arith_opcode(op: hir::BinOp, ty: &ir::Ty) -> Result<BinOpcode, Error> {
    if *ty == ir::Ty::F64 {
        match op {
            hir::BinOp::Add => Ok(BinOpcode::Fadd),
            hir::BinOp::Sub => Ok(BinOpcode::Fsub),
            hir::BinOp::Mul => Ok(BinOpcode::Fmul),
            hir::BinOp::Div => Ok(BinOpcode::Fdiv),
            // The parser and the type rules accept float modulo; emission
            // is where it stops.
            hir::BinOp::Mod => Err(Error::FloatModulo),
            _ => unreachable!("not an arithmetic operator"),
        }
    } else {
        match op {
            hir::BinOp::Add => Ok(BinOpcode::Add),
            hir::BinOp::Sub => Ok(BinOpcode::Sub),
            hir::BinOp::Mul => Ok(BinOpcode::Mul),
            hir::BinOp::Div => Ok(BinOpcode::Sdiv),
            hir::BinOp::Mod => Ok(BinOpcode::Srem),
            _ => unreachable!("not an arithmetic operator"),
        }
    }
}
