// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! A small builder over [`ir::Function`]: fresh temporaries, labeled
//! blocks, and the fall-through rule — any block still open when the
//! function is finished gets a trailing terminator, returning void or a
//! zero of the return type.

use crate::layout::zero_value;
use mgc_ir::ir::{self, GepIndex, Instr, Operand, Terminator, Value};
use std::rc::Rc;

pub(crate) struct FunctionBuilder {
    name: Rc<str>,
    params: Vec<(Rc<str>, ir::Ty)>,
    ret: ir::Ty,
    blocks: Vec<ir::Block>,
    current: usize,
    next_temp: u32,
    next_label: u32,
}

impl FunctionBuilder {
    pub(crate) fn new(name: Rc<str>, params: Vec<(Rc<str>, ir::Ty)>, ret: ir::Ty) -> Self {
        Self {
            name,
            params,
            ret,
            blocks: vec![ir::Block {
                label: "entry".into(),
                instrs: Vec::new(),
                term: None,
            }],
            current: 0,
            next_temp: 0,
            next_label: 0,
        }
    }

    /// A fresh temporary. The leading dot keeps generated names out of
    /// the space of user identifiers.
    pub(crate) fn temp(&mut self) -> Rc<str> {
        let name = format!(".t{}", self.next_temp);
        self.next_temp += 1;
        name.into()
    }

    /// Creates a new block without switching to it.
    pub(crate) fn block(&mut self, prefix: &str) -> Rc<str> {
        let label: Rc<str> = format!("{prefix}{}", self.next_label).into();
        self.next_label += 1;
        self.blocks.push(ir::Block {
            label: Rc::clone(&label),
            instrs: Vec::new(),
            term: None,
        });
        label
    }

    pub(crate) fn switch_to(&mut self, label: &Rc<str>) {
        self.current = self
            .blocks
            .iter()
            .position(|b| b.label == *label)
            .expect("label should name a created block");
    }

    pub(crate) fn push(&mut self, instr: Instr) {
        self.blocks[self.current].instrs.push(instr);
    }

    pub(crate) fn is_terminated(&self) -> bool {
        self.blocks[self.current].term.is_some()
    }

    /// Closes the current block if it is still open.
    pub(crate) fn terminate(&mut self, term: Terminator) {
        let block = &mut self.blocks[self.current];
        if block.term.is_none() {
            block.term = Some(term);
        }
    }

    // ----- instruction shorthands -----

    pub(crate) fn load(&mut self, ty: ir::Ty, ptr: Value) -> Value {
        let dst = self.temp();
        self.push(Instr::Load {
            dst: Rc::clone(&dst),
            ty,
            ptr,
        });
        Value::Local(dst)
    }

    pub(crate) fn store(&mut self, ty: ir::Ty, value: Value, ptr: Value) {
        self.push(Instr::Store { ty, value, ptr });
    }

    pub(crate) fn alloca(&mut self, name: Rc<str>, ty: ir::Ty) -> Value {
        self.push(Instr::Alloca {
            dst: Rc::clone(&name),
            ty,
        });
        Value::Local(name)
    }

    /// A `getelementptr` with constant field indices.
    pub(crate) fn gep(&mut self, base: ir::Ty, ptr: Value, path: &[u32]) -> Value {
        let dst = self.temp();
        self.push(Instr::Gep {
            dst: Rc::clone(&dst),
            base,
            ptr,
            indices: path.iter().map(|&i| GepIndex::Const(i)).collect(),
        });
        Value::Local(dst)
    }

    pub(crate) fn call(
        &mut self,
        ret: ir::Ty,
        callee: Rc<str>,
        args: Vec<Operand>,
    ) -> Option<Value> {
        let dst = if ret == ir::Ty::Void {
            None
        } else {
            Some(self.temp())
        };
        let value = dst.as_ref().map(|d| Value::Local(Rc::clone(d)));
        self.push(Instr::Call {
            dst,
            ret,
            callee,
            args,
        });
        value
    }

    pub(crate) fn icmp(&mut self, cond: ir::ICond, ty: ir::Ty, lhs: Value, rhs: Value) -> Value {
        let dst = self.temp();
        self.push(Instr::Icmp {
            dst: Rc::clone(&dst),
            cond,
            ty,
            lhs,
            rhs,
        });
        Value::Local(dst)
    }

    /// Builds an object reference aggregate from an id and a root pointer.
    pub(crate) fn make_ref(&mut self, ref_ty: ir::Ty, id: Value, ptr: Value) -> Value {
        let with_id = self.temp();
        self.push(Instr::InsertValue {
            dst: Rc::clone(&with_id),
            ty: ref_ty.clone(),
            agg: Value::Const(ir::Const::Undef),
            elem: Operand {
                ty: ir::Ty::I64,
                value: id,
            },
            index: 0,
        });
        let done = self.temp();
        self.push(Instr::InsertValue {
            dst: Rc::clone(&done),
            ty: ref_ty,
            agg: Value::Local(with_id),
            elem: Operand {
                ty: ir::Ty::Ptr,
                value: ptr,
            },
            index: 1,
        });
        Value::Local(done)
    }

    pub(crate) fn extract(&mut self, ty: ir::Ty, value: Value, index: u32) -> Value {
        let dst = self.temp();
        self.push(Instr::ExtractValue {
            dst: Rc::clone(&dst),
            ty,
            value,
            index,
        });
        Value::Local(dst)
    }

    pub(crate) fn finish(mut self) -> ir::Function {
        // Any block left open falls through: return void, or a zero of
        // the return type.
        for block in &mut self.blocks {
            if block.term.is_none() {
                block.term = Some(match &self.ret {
                    ir::Ty::Void => Terminator::Ret(None),
                    ty => Terminator::Ret(Some(Operand {
                        ty: ty.clone(),
                        value: Value::Const(zero_value(ty)),
                    })),
                });
            }
        }

        ir::Function {
            name: self.name,
            params: self.params,
            ret: self.ret,
            blocks: self.blocks,
        }
    }
}
