// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The runtime layout of object types and the names of everything the
//! lowerer emits. An object struct embeds its parent as its first field,
//! so a pointer to any object is also a pointer to every ancestor prefix,
//! the synthetic root included.

use mgc_hir::{
    hir::{Event, ObjectTable},
    ty::{ObjectId, Ty},
};
use mgc_ir::ir;
use std::rc::Rc;

/// The named struct for object references: `{ id: i64, root_ptr: ptr }`.
pub(crate) const REF: &str = "ref";
/// The named struct for list nodes: `{ prev: ptr, next: ptr, owner: ptr }`.
pub(crate) const NODE: &str = "node";
/// The named struct for vtables: `{ step: ptr, destroy: ptr, draw: ptr }`.
pub(crate) const VTABLE: &str = "vtable";

/// The field of the root prefix holding the vtable pointer.
pub(crate) const ROOT_VTABLE: u32 = 0;
/// The field of the root prefix holding the general list node.
pub(crate) const ROOT_NODE: u32 = 1;
/// The field of the root prefix holding the object id.
pub(crate) const ROOT_ID: u32 = 2;

/// The vtable slot of an event, for virtual dispatch.
pub(crate) fn vtable_slot(event: Event) -> u32 {
    match event {
        Event::Step => 0,
        Event::Destroy => 1,
        Event::Draw => 2,
        Event::Create => unreachable!("create is dispatched statically"),
    }
}

pub(crate) fn ref_ty() -> ir::Ty {
    ir::Ty::Named(REF.into())
}

pub(crate) fn node_ty() -> ir::Ty {
    ir::Ty::Named(NODE.into())
}

pub(crate) fn vtable_ty() -> ir::Ty {
    ir::Ty::Named(VTABLE.into())
}

pub(crate) fn struct_name(table: &ObjectTable, id: ObjectId) -> Rc<str> {
    format!("obj::{}", table.get(id).canon_name()).into()
}

pub(crate) fn struct_ty(table: &ObjectTable, id: ObjectId) -> ir::Ty {
    ir::Ty::Named(struct_name(table, id))
}

pub(crate) fn vtable_name(table: &ObjectTable, id: ObjectId) -> Rc<str> {
    format!("vt::{}", table.get(id).canon_name()).into()
}

pub(crate) fn list_head(table: &ObjectTable, id: ObjectId) -> Rc<str> {
    format!("tl::{}.head", table.get(id).canon_name()).into()
}

pub(crate) fn list_tail(table: &ObjectTable, id: ObjectId) -> Rc<str> {
    format!("tl::{}.tail", table.get(id).canon_name()).into()
}

pub(crate) fn ctor_name(table: &ObjectTable, id: ObjectId) -> Rc<str> {
    format!("new::{}", table.get(id).canon_name()).into()
}

pub(crate) fn event_symbol(table: &ObjectTable, id: ObjectId, event: Event) -> Rc<str> {
    format!("mg::{}.{}", table.get(id).canon_name(), event.name()).into()
}

/// The general list sentinels and the id counter.
pub(crate) const GENERAL_HEAD: &str = "gl.head";
pub(crate) const GENERAL_TAIL: &str = "gl.tail";
pub(crate) const ID_COUNTER: &str = "gl.counter";

/// Maps a language type to its IR value type.
pub(crate) fn ir_ty(ty: &Ty) -> ir::Ty {
    match ty {
        Ty::Int => ir::Ty::I32,
        Ty::Bool => ir::Ty::I1,
        Ty::Float => ir::Ty::F64,
        Ty::String | Ty::Sprite | Ty::Sound => ir::Ty::Ptr,
        Ty::Void => ir::Ty::Void,
        Ty::Object(_) | Ty::NoneObject => ref_ty(),
        Ty::Array(elem, len) => ir::Ty::Array(Box::new(ir_ty(elem)), *len),
    }
}

/// The zero value a binding of the given IR type defaults to.
pub(crate) fn zero_value(ty: &ir::Ty) -> ir::Const {
    match ty {
        ir::Ty::I1 => ir::Const::Bool(false),
        ir::Ty::I32 | ir::Ty::I64 => ir::Const::Int(0),
        ir::Ty::F64 => ir::Const::F64(0.0),
        ir::Ty::Ptr => ir::Const::Null,
        _ => ir::Const::Zero,
    }
}

fn depth(table: &ObjectTable, id: ObjectId) -> usize {
    if id == ObjectId::ROOT {
        0
    } else {
        table.chain(id).len()
    }
}

/// The path from a pointer to an object of static type `from` to the
/// member at `index` of the ancestor `level`.
pub(crate) fn member_path(
    table: &ObjectTable,
    from: ObjectId,
    level: ObjectId,
    index: u32,
) -> Vec<u32> {
    let mut path = vec![0];
    path.extend(std::iter::repeat(0).take(depth(table, from) - depth(table, level)));
    path.push(2 + index);
    path
}

/// The path from a pointer to a concrete object of type `from` to the
/// embedded list node of the ancestor `level`. The root's node is the
/// general list node.
pub(crate) fn node_path(table: &ObjectTable, from: ObjectId, level: ObjectId) -> Vec<u32> {
    let mut path = vec![0];
    path.extend(std::iter::repeat(0).take(depth(table, from) - depth(table, level)));
    path.push(ROOT_NODE);
    path
}

/// The struct definition for an object type.
pub(crate) fn struct_def(table: &ObjectTable, id: ObjectId) -> ir::TypeDef {
    let def = table.get(id);
    let fields = if id == ObjectId::ROOT {
        vec![ir::Ty::Ptr, node_ty(), ir::Ty::I64]
    } else {
        let parent = def.parent.expect("non-root objects have parents");
        let mut fields = vec![struct_ty(table, parent), node_ty()];
        fields.extend(def.members.iter().map(|(_, ty)| ir_ty(ty)));
        fields
    };
    ir::TypeDef {
        name: struct_name(table, id),
        fields,
    }
}
