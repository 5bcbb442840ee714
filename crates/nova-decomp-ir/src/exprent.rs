//! The expression tree: a closed set of node kinds behind one [`Exprent`] type.

use std::fmt;
use std::ops::{BitAnd, BitOr};
use std::sync::atomic::{AtomicU64, Ordering};

use nova_decomp_types::VarType;

use crate::annotation::AnnotationExprent;
use crate::array::ArrayExprent;
use crate::assert::AssertExprent;
use crate::assignment::AssignmentExprent;
use crate::bounds::{check_type_bounds, CheckTypesResult};
use crate::constant::ConstExprent;
use crate::context::DecompileContext;
use crate::exit::ExitExprent;
use crate::field::FieldExprent;
use crate::function::FunctionExprent;
use crate::infer::Inferencer;
use crate::invocation::InvocationExprent;
use crate::monitor::MonitorExprent;
use crate::new::{LambdaBody, LambdaContent, NewExprent, NewKind};
use crate::offsets::BytecodeOffsets;
use crate::options::DecompilerOptions;
use crate::switch::{ArmBody, SwitchExprent, YieldExprent};
use crate::var::{VarExprent, VarVersion};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Diagnostic node identity; also the key of the inference side table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(u64);

impl ExprId {
    fn next() -> Self {
        ExprId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ExprId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How freely an expression may be duplicated by temp-elimination passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ExprentUse(u8);

impl ExprentUse {
    pub const NONE: ExprentUse = ExprentUse(0);
    pub const MULTIPLE_USES: ExprentUse = ExprentUse(1);
    pub const SIDE_EFFECTS_FREE: ExprentUse = ExprentUse(2);
    pub const ALL: ExprentUse = ExprentUse(3);

    pub fn contains(self, other: ExprentUse) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn bits(self) -> u8 {
        self.0
    }
}

impl BitAnd for ExprentUse {
    type Output = ExprentUse;

    fn bitand(self, rhs: Self) -> Self {
        ExprentUse(self.0 & rhs.0)
    }
}

impl BitOr for ExprentUse {
    type Output = ExprentUse;

    fn bitor(self, rhs: Self) -> Self {
        ExprentUse(self.0 | rhs.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Const(ConstExprent),
    Var(VarExprent),
    Field(FieldExprent),
    Array(ArrayExprent),
    Assignment(AssignmentExprent),
    Function(FunctionExprent),
    Invocation(InvocationExprent),
    New(NewExprent),
    Monitor(MonitorExprent),
    Exit(ExitExprent),
    Switch(SwitchExprent),
    Yield(YieldExprent),
    Annotation(AnnotationExprent),
    Assert(AssertExprent),
}

impl ExprKind {
    pub fn name(&self) -> &'static str {
        match self {
            ExprKind::Const(_) => "constant",
            ExprKind::Var(_) => "variable",
            ExprKind::Field(_) => "field",
            ExprKind::Array(_) => "array",
            ExprKind::Assignment(_) => "assignment",
            ExprKind::Function(_) => "function",
            ExprKind::Invocation(_) => "invocation",
            ExprKind::New(_) => "new",
            ExprKind::Monitor(_) => "monitor",
            ExprKind::Exit(_) => "exit",
            ExprKind::Switch(_) => "switch",
            ExprKind::Yield(_) => "yield",
            ExprKind::Annotation(_) => "annotation",
            ExprKind::Assert(_) => "assert",
        }
    }
}

macro_rules! impl_from_kind {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for ExprKind {
                fn from(value: $ty) -> Self {
                    ExprKind::$variant(value)
                }
            }
        )*
    };
}

impl_from_kind!(
    Const(ConstExprent),
    Var(VarExprent),
    Field(FieldExprent),
    Array(ArrayExprent),
    Assignment(AssignmentExprent),
    Function(FunctionExprent),
    Invocation(InvocationExprent),
    New(NewExprent),
    Monitor(MonitorExprent),
    Exit(ExitExprent),
    Switch(SwitchExprent),
    Yield(YieldExprent),
    Annotation(AnnotationExprent),
    Assert(AssertExprent),
);

/// One node of an expression tree. Children are owned exclusively by their parent.
#[derive(Debug)]
pub struct Exprent {
    id: ExprId,
    pub bytecode: BytecodeOffsets,
    pub kind: ExprKind,
}

impl Clone for Exprent {
    /// Every cloned node, children included, gets a fresh id so decorations never alias.
    fn clone(&self) -> Self {
        Self {
            id: ExprId::next(),
            bytecode: self.bytecode.clone(),
            kind: self.kind.clone(),
        }
    }
}

impl PartialEq for Exprent {
    /// Structural equality; ids and bytecode offsets are ignored.
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl Exprent {
    pub fn new(kind: impl Into<ExprKind>) -> Self {
        Self::with_bytecode(kind, BytecodeOffsets::new())
    }

    pub fn with_bytecode(kind: impl Into<ExprKind>, bytecode: BytecodeOffsets) -> Self {
        Self {
            id: ExprId::next(),
            bytecode,
            kind: kind.into(),
        }
    }

    pub fn id(&self) -> ExprId {
        self.id
    }

    /// Deep copy with fresh ids throughout; the same as [`Clone::clone`].
    pub fn copy(&self) -> Exprent {
        self.clone()
    }

    /// Direct children in source order.
    pub fn children(&self) -> Vec<&Exprent> {
        let mut out: Vec<&Exprent> = Vec::new();
        match &self.kind {
            ExprKind::Const(_) | ExprKind::Var(_) => {}
            ExprKind::Field(f) => out.extend(f.instance.as_deref()),
            ExprKind::Array(a) => {
                out.push(&a.array);
                out.push(&a.index);
            }
            ExprKind::Assignment(a) => {
                out.push(&a.left);
                out.push(&a.right);
            }
            ExprKind::Function(f) => out.extend(f.operands.iter()),
            ExprKind::Invocation(inv) => {
                out.extend(inv.instance.as_deref());
                out.extend(inv.args.iter());
            }
            ExprKind::New(n) => match &n.kind {
                NewKind::Object { constructor, .. } => {
                    if let Some(ctor) = constructor {
                        out.extend(ctor.args.iter());
                    }
                }
                NewKind::Array { dims, elements, .. } => {
                    out.extend(dims.iter());
                    out.extend(elements.iter());
                }
                NewKind::Lambda(lambda) => match &lambda.content {
                    LambdaContent::MethodRef { receiver, .. } => out.extend(receiver.as_deref()),
                    LambdaContent::Body { body, .. } => match body {
                        LambdaBody::Expression(e) => out.push(e),
                        LambdaBody::Block(stmts) => out.extend(stmts.iter()),
                    },
                },
            },
            ExprKind::Monitor(m) => out.push(&m.value),
            ExprKind::Exit(e) => out.extend(e.value.as_deref()),
            ExprKind::Switch(s) => {
                out.push(&s.value);
                for arm in &s.arms {
                    out.extend(arm.labels.iter());
                    match &arm.body {
                        ArmBody::Expression(e) => out.push(e),
                        ArmBody::Block(stmts) => out.extend(stmts.iter()),
                    }
                }
            }
            ExprKind::Yield(y) => out.push(&y.value),
            ExprKind::Annotation(a) => out.extend(a.elements.iter().map(|(_, v)| v)),
            ExprKind::Assert(a) => {
                out.push(&a.condition);
                out.extend(a.message.as_deref());
            }
        }
        out
    }

    /// Direct children in source order, mutably.
    pub fn children_mut(&mut self) -> Vec<&mut Exprent> {
        let mut out: Vec<&mut Exprent> = Vec::new();
        match &mut self.kind {
            ExprKind::Const(_) | ExprKind::Var(_) => {}
            ExprKind::Field(f) => out.extend(f.instance.as_deref_mut()),
            ExprKind::Array(a) => {
                out.push(&mut a.array);
                out.push(&mut a.index);
            }
            ExprKind::Assignment(a) => {
                out.push(&mut a.left);
                out.push(&mut a.right);
            }
            ExprKind::Function(f) => out.extend(f.operands.iter_mut()),
            ExprKind::Invocation(inv) => {
                out.extend(inv.instance.as_deref_mut());
                out.extend(inv.args.iter_mut());
            }
            ExprKind::New(n) => match &mut n.kind {
                NewKind::Object { constructor, .. } => {
                    if let Some(ctor) = constructor {
                        out.extend(ctor.args.iter_mut());
                    }
                }
                NewKind::Array { dims, elements, .. } => {
                    out.extend(dims.iter_mut());
                    out.extend(elements.iter_mut());
                }
                NewKind::Lambda(lambda) => match &mut lambda.content {
                    LambdaContent::MethodRef { receiver, .. } => out.extend(receiver.as_deref_mut()),
                    LambdaContent::Body { body, .. } => match body {
                        LambdaBody::Expression(e) => out.push(e),
                        LambdaBody::Block(stmts) => out.extend(stmts.iter_mut()),
                    },
                },
            },
            ExprKind::Monitor(m) => out.push(&mut m.value),
            ExprKind::Exit(e) => out.extend(e.value.as_deref_mut()),
            ExprKind::Switch(s) => {
                out.push(&mut s.value);
                for arm in &mut s.arms {
                    out.extend(arm.labels.iter_mut());
                    match &mut arm.body {
                        ArmBody::Expression(e) => out.push(e),
                        ArmBody::Block(stmts) => out.extend(stmts.iter_mut()),
                    }
                }
            }
            ExprKind::Yield(y) => out.push(&mut y.value),
            ExprKind::Annotation(a) => out.extend(a.elements.iter_mut().map(|(_, v)| v)),
            ExprKind::Assert(a) => {
                out.push(&mut a.condition);
                out.extend(a.message.as_deref_mut());
            }
        }
        out
    }

    /// Replaces the direct child with id `old` by `new`, returning the removed child. When no
    /// direct child has that id the tree is unchanged and `new` is handed back.
    pub fn replace_exprent(&mut self, old: ExprId, new: Exprent) -> Result<Exprent, Exprent> {
        match self.children_mut().into_iter().find(|child| child.id == old) {
            Some(slot) => Ok(std::mem::replace(slot, new)),
            None => Err(new),
        }
    }

    /// Children, followed (when `recursive`) by the descendants of each child.
    pub fn all_exprents(&self, recursive: bool) -> Vec<&Exprent> {
        let mut out = self.children();
        if recursive {
            for i in (0..out.len()).rev() {
                let child: &Exprent = out[i];
                out.extend(child.all_exprents(true));
            }
        }
        out
    }

    /// Offsets of this node and everything below it.
    pub fn bytecode_range(&self) -> BytecodeOffsets {
        self.children()
            .into_iter()
            .fold(self.bytecode.clone(), |acc, child| acc.union(&child.bytecode_range()))
    }

    pub fn contains_var(&self, var: VarVersion) -> bool {
        if let ExprKind::Var(v) = &self.kind {
            if v.var == var {
                return true;
            }
        }
        self.children().into_iter().any(|child| child.contains_var(var))
    }

    pub fn exprent_use(&self) -> ExprentUse {
        match &self.kind {
            ExprKind::Const(_) | ExprKind::Var(_) => ExprentUse::ALL,
            ExprKind::Field(f) => match &f.instance {
                None => ExprentUse::MULTIPLE_USES,
                Some(instance) => instance.exprent_use() & ExprentUse::MULTIPLE_USES,
            },
            ExprKind::Array(a) => {
                a.array.exprent_use() & a.index.exprent_use() & ExprentUse::MULTIPLE_USES
            }
            ExprKind::Function(f) if f.func.is_increment() => ExprentUse::NONE,
            ExprKind::Function(f) => f
                .operands
                .iter()
                .fold(ExprentUse::ALL, |acc, op| acc & op.exprent_use()),
            _ => ExprentUse::NONE,
        }
    }

    /// Java operator precedence: `0` binds tightest.
    pub fn precedence(&self, options: &DecompilerOptions) -> u8 {
        match &self.kind {
            ExprKind::Const(c) => c.precedence(options),
            ExprKind::Assignment(_) => 13,
            ExprKind::Function(f) => f.func.precedence(),
            ExprKind::New(n) => match n.kind {
                NewKind::Lambda(_) => 13,
                _ => 1,
            },
            _ => 0,
        }
    }

    /// Declared static type, computed from the node and its children.
    pub fn expr_type(&self, ctx: &DecompileContext<'_>) -> VarType {
        match &self.kind {
            ExprKind::Const(c) => c.ty.clone(),
            ExprKind::Var(v) => v.ty.clone(),
            ExprKind::Field(f) => f.ty.clone(),
            ExprKind::Array(a) => a.expr_type(ctx),
            ExprKind::Assignment(a) => a.left.expr_type(ctx),
            ExprKind::Function(f) => f.expr_type(ctx),
            ExprKind::Invocation(inv) => inv.parsed.ret.clone(),
            ExprKind::New(n) => n.new_type.clone(),
            ExprKind::Monitor(_) | ExprKind::Exit(_) | ExprKind::Assert(_) => VarType::void(),
            ExprKind::Switch(s) => s.expr_type(ctx),
            ExprKind::Yield(y) => y.value.expr_type(ctx),
            ExprKind::Annotation(a) => VarType::object(a.class_name.clone()),
        }
    }

    /// Type refined by generic inference against an optional upper bound.
    pub fn inferred_type(&self, ctx: &DecompileContext<'_>, upper_bound: Option<&VarType>) -> VarType {
        Inferencer::new(ctx).inferred_type(self, upper_bound)
    }

    /// Min/max type constraints this node places on its children.
    pub fn check_type_bounds(&self, ctx: &DecompileContext<'_>) -> CheckTypesResult {
        check_type_bounds(self, ctx)
    }

    pub fn as_const(&self) -> Option<&ConstExprent> {
        match &self.kind {
            ExprKind::Const(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_var(&self) -> Option<&VarExprent> {
        match &self.kind {
            ExprKind::Var(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_field(&self) -> Option<&FieldExprent> {
        match &self.kind {
            ExprKind::Field(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionExprent> {
        match &self.kind {
            ExprKind::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_invocation(&self) -> Option<&InvocationExprent> {
        match &self.kind {
            ExprKind::Invocation(inv) => Some(inv),
            _ => None,
        }
    }

    pub fn as_new(&self) -> Option<&NewExprent> {
        match &self.kind {
            ExprKind::New(n) => Some(n),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::FunctionType;

    fn sum() -> Exprent {
        Exprent::new(FunctionExprent::new(
            FunctionType::Add,
            vec![
                Exprent::new(ConstExprent::int(1, false)),
                Exprent::new(VarExprent::new(VarVersion::new(1, 0), VarType::int())),
            ],
        ))
    }

    #[test]
    fn replace_returns_the_old_child() {
        let mut tree = sum();
        let target = tree.children()[1].id();
        let replacement = Exprent::new(ConstExprent::int(7, false));
        let old = tree.replace_exprent(target, replacement.clone()).unwrap();
        assert!(old.contains_var(VarVersion::new(1, 0)));
        assert_eq!(tree.children()[1], &replacement);
    }

    #[test]
    fn replacing_a_missing_child_is_a_no_op() {
        let mut tree = sum();
        let before = tree.clone();
        let first = tree.children()[0].id();
        let unrelated = Exprent::new(ConstExprent::int(3, false));
        let stranger = unrelated.id();
        let returned = tree.replace_exprent(stranger, unrelated).unwrap_err();
        assert_eq!(returned.id(), stranger);
        assert_eq!(tree, before);
        assert_eq!(tree.children()[0].id(), first);
    }

    #[test]
    fn clones_get_fresh_ids_throughout() {
        let tree = sum();
        let clone = tree.clone();
        assert_eq!(clone, tree);
        let ids: Vec<ExprId> = tree.all_exprents(true).iter().map(|e| e.id()).collect();
        assert!(clone.id() != tree.id());
        assert!(clone.all_exprents(true).iter().all(|e| !ids.contains(&e.id())));
    }

    #[test]
    fn uses_combine_over_operands() {
        let tree = sum();
        assert_eq!(tree.exprent_use(), ExprentUse::ALL);
        let inc = Exprent::new(FunctionExprent::new(
            FunctionType::PostIncrement,
            vec![Exprent::new(VarExprent::new(VarVersion::new(1, 0), VarType::int()))],
        ));
        assert_eq!(inc.exprent_use(), ExprentUse::NONE);
    }

    #[test]
    fn recursive_listing_includes_grandchildren() {
        let outer = Exprent::new(FunctionExprent::new(FunctionType::Neg, vec![sum()]));
        assert_eq!(outer.all_exprents(false).len(), 1);
        assert_eq!(outer.all_exprents(true).len(), 3);
    }
}
