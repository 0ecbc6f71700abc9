// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The runtime object machinery: struct definitions, the per-type vtables
//! and list sentinels, constructors implementing the create protocol, the
//! destroy post-work chain, and the `global_*` entry points that walk the
//! general list and reap dead objects.

use crate::{
    builder::FunctionBuilder,
    emit::ModuleEmitter,
    layout::{
        self, ir_ty, node_path, node_ty, ref_ty, struct_def, struct_ty, vtable_slot, vtable_ty,
        GENERAL_HEAD, GENERAL_TAIL, ID_COUNTER, NODE, REF, ROOT_ID, ROOT_VTABLE, VTABLE,
    },
    Error,
};
use mgc_hir::{
    hir::{self, Event},
    ty::{ObjectId, Ty},
};
use mgc_ir::ir::{self, BinOpcode, Const, ICond, Instr, Operand, Terminator, Value};
use std::rc::Rc;

pub(crate) fn emit_types(m: &mut ModuleEmitter) {
    m.module.types.push(ir::TypeDef {
        name: REF.into(),
        fields: vec![ir::Ty::I64, ir::Ty::Ptr],
    });
    m.module.types.push(ir::TypeDef {
        name: NODE.into(),
        fields: vec![ir::Ty::Ptr, ir::Ty::Ptr, ir::Ty::Ptr],
    });
    m.module.types.push(ir::TypeDef {
        name: VTABLE.into(),
        fields: vec![ir::Ty::Ptr, ir::Ty::Ptr, ir::Ty::Ptr],
    });
    for def in m.program.objects.defs() {
        m.module.types.push(struct_def(&m.program.objects, def.id));
    }
}

fn sentinel_pair(head: Rc<str>, tail: Rc<str>) -> [ir::GlobalVar; 2] {
    let node = |name: Rc<str>, other: Rc<str>| ir::GlobalVar {
        name,
        ty: node_ty(),
        init: Const::Struct(vec![
            (ir::Ty::Ptr, Const::Global(Rc::clone(&other))),
            (ir::Ty::Ptr, Const::Global(other)),
            (ir::Ty::Ptr, Const::Null),
        ]),
        constant: false,
    };
    [
        node(Rc::clone(&head), Rc::clone(&tail)),
        node(tail, head),
    ]
}

pub(crate) fn emit_globals(m: &mut ModuleEmitter) {
    let table = &m.program.objects;

    m.module
        .globals
        .extend(sentinel_pair(GENERAL_HEAD.into(), GENERAL_TAIL.into()));
    m.module.globals.push(ir::GlobalVar {
        name: ID_COUNTER.into(),
        ty: ir::Ty::I64,
        init: Const::Int(0),
        constant: false,
    });

    for def in table.defs() {
        if def.id == ObjectId::ROOT {
            continue;
        }
        let id = def.id;
        m.module
            .globals
            .extend(sentinel_pair(layout::list_head(table, id), layout::list_tail(table, id)));

        let step = layout::event_symbol(table, table.dispatch_level(id, Event::Step), Event::Step);
        let destroy = layout::event_symbol(table, id, Event::Destroy);
        let draw = layout::event_symbol(table, table.dispatch_level(id, Event::Draw), Event::Draw);
        m.module.globals.push(ir::GlobalVar {
            name: layout::vtable_name(table, id),
            ty: vtable_ty(),
            init: Const::Struct(vec![
                (ir::Ty::Ptr, Const::Global(step)),
                (ir::Ty::Ptr, Const::Global(destroy)),
                (ir::Ty::Ptr, Const::Global(draw)),
            ]),
            constant: true,
        });
    }

    for global in &m.program.globals {
        let ty = ir_ty(&global.ty);
        let init = match &global.init {
            Some(init) => global_init(&global.ty, init),
            None => crate::layout::zero_value(&ty),
        };
        m.module.globals.push(ir::GlobalVar {
            name: Rc::clone(&global.symbol),
            ty,
            init,
            constant: false,
        });
    }
}

fn global_init(ty: &Ty, init: &hir::Const) -> Const {
    match (init, ty) {
        (hir::Const::Int(value), _) => Const::Int(*value),
        (hir::Const::Bool(value), _) => Const::Bool(*value),
        (hir::Const::Float(value), _) => Const::F64(*value),
        (hir::Const::Array(items), Ty::Array(elem, _)) => Const::Array(
            ir_ty(elem),
            items.iter().map(|item| global_init(elem, item)).collect(),
        ),
        (hir::Const::Array(_), _) => unreachable!("array constants have array types"),
    }
}

pub(crate) fn emit_externs(m: &mut ModuleEmitter) {
    m.module.externs.push(ir::ExternFn {
        name: "malloc".into(),
        params: vec![ir::Ty::I64],
        ret: ir::Ty::Ptr,
    });
    m.module.externs.push(ir::ExternFn {
        name: "free".into(),
        params: vec![ir::Ty::Ptr],
        ret: ir::Ty::Void,
    });
    for decl in &m.program.externs {
        if m.module.externs.iter().any(|e| e.name == decl.name) {
            continue;
        }
        m.module.externs.push(ir::ExternFn {
            name: Rc::clone(&decl.name),
            params: decl.formals.iter().map(ir_ty).collect(),
            ret: ir_ty(&decl.ret),
        });
    }
}

/// The synthetic root's events: no-ops every dispatch chain bottoms out
/// in.
pub(crate) fn emit_root_events(m: &mut ModuleEmitter) {
    let table = &m.program.objects;
    for event in [Event::Create, Event::Step, Event::Draw, Event::Destroy] {
        let b = FunctionBuilder::new(
            layout::event_symbol(table, ObjectId::ROOT, event),
            vec![("this".into(), ref_ty())],
            ir::Ty::Void,
        );
        m.module.functions.push(b.finish());
    }
}

pub(crate) fn emit_objects(m: &mut ModuleEmitter) -> Result<(), Error> {
    let program = m.program;
    for def in program.objects.defs() {
        if def.id == ObjectId::ROOT {
            continue;
        }

        let destroy_symbol = layout::event_symbol(&program.objects, def.id, Event::Destroy);
        let mut has_destroy = false;
        for function in &def.functions {
            let is_destroy = function.symbol == destroy_symbol;
            has_destroy |= is_destroy;
            let emitted = m.emit_fn_def(function, is_destroy.then_some(def.id))?;
            m.module.functions.push(emitted);
        }

        if !has_destroy {
            // Even without user code, every type unlinks its own node and
            // chains to its parent.
            let mut b = FunctionBuilder::new(
                destroy_symbol,
                vec![("this".into(), ref_ty())],
                ir::Ty::Void,
            );
            emit_destroy_post(program, &mut b, def.id);
            m.module.functions.push(b.finish());
        }

        emit_ctor(m, def.id);
    }
    Ok(())
}

/// The destroy post-work: unlink the receiver from its type list, then
/// invoke the parent's destroy event directly.
pub(crate) fn emit_destroy_post(program: &hir::Program, b: &mut FunctionBuilder, object: ObjectId) {
    let table = &program.objects;
    let this = Value::Local("this".into());
    let ptr = b.extract(ref_ty(), this.clone(), 1);

    let node = b.gep(
        struct_ty(table, object),
        ptr,
        &node_path(table, object, object),
    );
    let prev_addr = b.gep(node_ty(), node.clone(), &[0, 0]);
    let prev = b.load(ir::Ty::Ptr, prev_addr);
    let next_addr = b.gep(node_ty(), node, &[0, 1]);
    let next = b.load(ir::Ty::Ptr, next_addr);
    let prev_next = b.gep(node_ty(), prev.clone(), &[0, 1]);
    b.store(ir::Ty::Ptr, next.clone(), prev_next);
    let next_prev = b.gep(node_ty(), next, &[0, 0]);
    b.store(ir::Ty::Ptr, prev, next_prev);

    let parent = table.get(object).parent.expect("non-root objects have parents");
    b.call(
        ir::Ty::Void,
        layout::event_symbol(table, parent, Event::Destroy),
        vec![Operand {
            ty: ref_ty(),
            value: this,
        }],
    );
}

/// Links `node` in immediately after `head` and records its owner. Front
/// insertion keeps objects created during an iteration behind the cursor.
fn splice_front(b: &mut FunctionBuilder, node: Value, head_name: Rc<str>, owner: Value) {
    let head = Value::Const(Const::Global(head_name));
    let head_next_addr = b.gep(node_ty(), head.clone(), &[0, 1]);
    let head_next = b.load(ir::Ty::Ptr, head_next_addr.clone());

    let node_next = b.gep(node_ty(), node.clone(), &[0, 1]);
    b.store(ir::Ty::Ptr, head_next.clone(), node_next);
    let node_prev = b.gep(node_ty(), node.clone(), &[0, 0]);
    b.store(ir::Ty::Ptr, head, node_prev);
    let head_next_prev = b.gep(node_ty(), head_next, &[0, 0]);
    b.store(ir::Ty::Ptr, node.clone(), head_next_prev);
    b.store(ir::Ty::Ptr, node.clone(), head_next_addr);

    let node_owner = b.gep(node_ty(), node, &[0, 2]);
    b.store(ir::Ty::Ptr, owner, node_owner);
}

/// The create protocol: allocate, splice every ancestor level into its
/// type list and the root into the general list, assign a fresh id
/// (pre-incremented, so the first is 1), write the vtable pointer and id,
/// build the reference, and invoke the create events.
fn emit_ctor(m: &mut ModuleEmitter, object: ObjectId) {
    let table = &m.program.objects;
    let formals = table.create_formals(object);
    let params: Vec<(Rc<str>, ir::Ty)> = formals
        .iter()
        .enumerate()
        .map(|(index, ty)| (format!("a{index}").into(), ir_ty(ty)))
        .collect();

    let mut b = FunctionBuilder::new(layout::ctor_name(table, object), params.clone(), ref_ty());
    let size = Value::Const(Const::SizeOf(struct_ty(table, object)));
    let ptr = b
        .call(
            ir::Ty::Ptr,
            "malloc".into(),
            vec![Operand {
                ty: ir::Ty::I64,
                value: size,
            }],
        )
        .expect("malloc returns a pointer");

    // Child-to-root: each level's node joins that level's type list, and
    // the root prefix joins the general list.
    for &level in table.chain(object).iter().rev() {
        let node = b.gep(
            struct_ty(table, object),
            ptr.clone(),
            &node_path(table, object, level),
        );
        splice_front(&mut b, node, layout::list_head(table, level), ptr.clone());
    }
    let general_node = b.gep(
        struct_ty(table, object),
        ptr.clone(),
        &node_path(table, object, ObjectId::ROOT),
    );
    splice_front(&mut b, general_node, GENERAL_HEAD.into(), ptr.clone());

    let counter = Value::Const(Const::Global(ID_COUNTER.into()));
    let old = b.load(ir::Ty::I64, counter.clone());
    let id = {
        let dst = b.temp();
        b.push(Instr::Bin {
            dst: Rc::clone(&dst),
            op: BinOpcode::Add,
            ty: ir::Ty::I64,
            lhs: old,
            rhs: Value::Const(Const::Int(1)),
        });
        Value::Local(dst)
    };
    b.store(ir::Ty::I64, id.clone(), counter);

    let root = struct_ty(table, ObjectId::ROOT);
    let vt_addr = b.gep(root.clone(), ptr.clone(), &[0, ROOT_VTABLE]);
    b.store(
        ir::Ty::Ptr,
        Value::Const(Const::Global(layout::vtable_name(table, object))),
        vt_addr,
    );
    let id_addr = b.gep(root, ptr.clone(), &[0, ROOT_ID]);
    b.store(ir::Ty::I64, id.clone(), id_addr);

    let reference = b.make_ref(ref_ty(), id, ptr);
    let this_arg = Operand {
        ty: ref_ty(),
        value: reference.clone(),
    };

    // Eldest first: the root's no-op create, every zero-formal create an
    // ancestor defines, then the dispatch target with the user's
    // arguments.
    let dispatch = table.dispatch_level(object, Event::Create);
    b.call(
        ir::Ty::Void,
        layout::event_symbol(table, ObjectId::ROOT, Event::Create),
        vec![this_arg.clone()],
    );
    for &level in table.chain(object) {
        if level == dispatch {
            continue;
        }
        let def = table.get(level);
        if def.events.contains(&Event::Create) && def.create_formals.is_empty() {
            b.call(
                ir::Ty::Void,
                layout::event_symbol(table, level, Event::Create),
                vec![this_arg.clone()],
            );
        }
    }
    if dispatch != ObjectId::ROOT {
        let mut args = vec![this_arg];
        for (name, ty) in &params {
            args.push(Operand {
                ty: ty.clone(),
                value: Value::Local(Rc::clone(name)),
            });
        }
        b.call(
            ir::Ty::Void,
            layout::event_symbol(table, dispatch, Event::Create),
            args,
        );
    }

    b.terminate(Terminator::Ret(Some(Operand {
        ty: ref_ty(),
        value: reference,
    })));
    m.module.functions.push(b.finish());
}

pub(crate) fn emit_global_events(m: &mut ModuleEmitter) {
    let ctor = layout::ctor_name(&m.program.objects, m.program.main);
    let mut b = FunctionBuilder::new("global_create".into(), Vec::new(), ir::Ty::Void);
    b.call(ref_ty(), ctor, Vec::new());
    m.module.functions.push(b.finish());

    emit_reaper(m, "global_step", vtable_slot(Event::Step));
    emit_reaper(m, "global_draw", vtable_slot(Event::Draw));
}

/// Walks the general list: frees nodes whose id is zero, unlinking them,
/// and dispatches the event through the vtable for live ones. The next
/// pointer is read before either branch so the walk survives both.
fn emit_reaper(m: &mut ModuleEmitter, name: &str, slot: u32) {
    let table = &m.program.objects;
    let root = struct_ty(table, ObjectId::ROOT);
    let mut b = FunctionBuilder::new(name.into(), Vec::new(), ir::Ty::Void);

    let cursor_name = b.temp();
    let cursor = b.alloca(cursor_name, ir::Ty::Ptr);
    let head = Value::Const(Const::Global(GENERAL_HEAD.into()));
    let tail = Value::Const(Const::Global(GENERAL_TAIL.into()));
    let first_addr = b.gep(node_ty(), head, &[0, 1]);
    let first = b.load(ir::Ty::Ptr, first_addr);
    b.store(ir::Ty::Ptr, first, cursor.clone());

    let cond_label = b.block("walk.cond");
    let check_label = b.block("walk.check");
    let reap_label = b.block("walk.reap");
    let live_label = b.block("walk.live");
    let end = b.block("walk.end");

    b.terminate(Terminator::Br(Rc::clone(&cond_label)));
    b.switch_to(&cond_label);
    let cur = b.load(ir::Ty::Ptr, cursor.clone());
    let done = b.icmp(ICond::Eq, ir::Ty::Ptr, cur.clone(), tail);
    b.terminate(Terminator::CondBr(
        done,
        Rc::clone(&end),
        Rc::clone(&check_label),
    ));

    b.switch_to(&check_label);
    let owner_addr = b.gep(node_ty(), cur.clone(), &[0, 2]);
    let owner = b.load(ir::Ty::Ptr, owner_addr);
    let next_addr = b.gep(node_ty(), cur.clone(), &[0, 1]);
    let next = b.load(ir::Ty::Ptr, next_addr);
    b.store(ir::Ty::Ptr, next.clone(), cursor);
    let id_addr = b.gep(root.clone(), owner.clone(), &[0, ROOT_ID]);
    let id = b.load(ir::Ty::I64, id_addr);
    let dead = b.icmp(ICond::Eq, ir::Ty::I64, id.clone(), Value::Const(Const::Int(0)));
    b.terminate(Terminator::CondBr(
        dead,
        Rc::clone(&reap_label),
        Rc::clone(&live_label),
    ));

    b.switch_to(&reap_label);
    let prev_addr = b.gep(node_ty(), cur, &[0, 0]);
    let prev = b.load(ir::Ty::Ptr, prev_addr);
    let prev_next = b.gep(node_ty(), prev.clone(), &[0, 1]);
    b.store(ir::Ty::Ptr, next.clone(), prev_next);
    let next_prev = b.gep(node_ty(), next, &[0, 0]);
    b.store(ir::Ty::Ptr, prev, next_prev);
    b.call(
        ir::Ty::Void,
        "free".into(),
        vec![Operand {
            ty: ir::Ty::Ptr,
            value: owner.clone(),
        }],
    );
    b.terminate(Terminator::Br(Rc::clone(&cond_label)));

    b.switch_to(&live_label);
    let vt_addr = b.gep(root, owner.clone(), &[0, ROOT_VTABLE]);
    let vt = b.load(ir::Ty::Ptr, vt_addr);
    let slot_addr = b.gep(vtable_ty(), vt, &[0, slot]);
    let callee = b.load(ir::Ty::Ptr, slot_addr);
    let reference = b.make_ref(ref_ty(), id, owner);
    b.push(Instr::CallPtr {
        dst: None,
        ret: ir::Ty::Void,
        callee,
        args: vec![Operand {
            ty: ref_ty(),
            value: reference,
        }],
    });
    b.terminate(Terminator::Br(cond_label));

    b.switch_to(&end);
    m.module.functions.push(b.finish());
}
