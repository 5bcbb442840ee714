//! Generic type inference, run as its own pass.
//!
//! [`Inferencer`] answers "what is the type of this node, given this upper bound" without
//! touching the tree. [`decorate`] walks a whole tree top-down, choosing each child's bound the
//! way emission does, and records the answers in a [`Decorations`] side table keyed by node id.
//! Emission only reads that table; when an entry is missing it asks the inferencer directly.

mod call;
mod lambda;

use std::collections::{HashMap, HashSet};

use nova_decomp_types::{
    class_binding, generic_supertype, is_assignable, GenericMap, NamedGenerics, TypeKind, VarType,
};

use crate::context::{ClassKind, DecompileContext};
use crate::exit::{ExitExprent, ExitKind};
use crate::exprent::{ExprId, ExprKind, Exprent};
use crate::field::FieldExprent;
use crate::function::{FunctionExprent, FunctionType};
use crate::invocation::InvocationExprent;
use crate::new::{LambdaBody, LambdaContent, NewExprent, NewKind};
use crate::switch::ArmBody;
use crate::var::{VarExprent, VarVersion};

pub use call::{ArgPlan, CallInference, CallPlan};
pub use lambda::LambdaTypes;

/// How a cast node renders after inference.
#[derive(Debug, Clone, PartialEq)]
pub struct CastDecoration {
    /// The target, possibly given the generic arguments the context expects.
    pub target: VarType,
    /// The operand already has the target type; the cast is dropped.
    pub elide: bool,
}

/// Stateless apart from the variable type overrides lambda parameters receive.
pub struct Inferencer<'a> {
    ctx: DecompileContext<'a>,
    named: NamedGenerics,
    named_keys: HashSet<VarType>,
    var_overrides: HashMap<VarVersion, VarType>,
}

impl<'a> Inferencer<'a> {
    pub fn new(ctx: &DecompileContext<'a>) -> Self {
        let named = ctx.named_generics();
        let named_keys = named.keys().cloned().collect();
        Self {
            ctx: *ctx,
            named,
            named_keys,
            var_overrides: HashMap::new(),
        }
    }

    pub fn with_var_overrides(mut self, overrides: HashMap<VarVersion, VarType>) -> Self {
        self.var_overrides = overrides;
        self
    }

    pub fn ctx(&self) -> &DecompileContext<'a> {
        &self.ctx
    }

    pub fn named_generics(&self) -> &NamedGenerics {
        &self.named
    }

    pub(crate) fn named_keys(&self) -> &HashSet<VarType> {
        &self.named_keys
    }

    pub(crate) fn is_named(&self, ty: &VarType) -> bool {
        ty.kind() == TypeKind::GenVar && self.named.contains_key(ty)
    }

    /// Returns the previous override, if any.
    pub(crate) fn set_var_type(&mut self, var: VarVersion, ty: VarType) -> Option<VarType> {
        self.var_overrides.insert(var, ty)
    }

    pub(crate) fn restore_var_type(&mut self, var: VarVersion, previous: Option<VarType>) {
        match previous {
            Some(ty) => self.var_overrides.insert(var, ty),
            None => self.var_overrides.remove(&var),
        };
    }

    pub fn inferred_type(&mut self, e: &Exprent, upper_bound: Option<&VarType>) -> VarType {
        self.infer(e, upper_bound, false)
    }

    /// `as_instance` is set when `e` is the receiver of a call; receivers keep their own
    /// type arguments rather than adopting the bound's.
    pub(crate) fn infer(&mut self, e: &Exprent, upper_bound: Option<&VarType>, as_instance: bool) -> VarType {
        match &e.kind {
            ExprKind::Const(c) => c.ty.clone(),
            ExprKind::Var(v) => self.var_type(v),
            ExprKind::Field(f) => self.field_type(f),
            ExprKind::Array(a) => {
                let bound = upper_bound.map(|ub| ub.resize_array_dim(ub.array_dim() + 1));
                let array = self.infer(&a.array, bound.as_ref(), false);
                if array.array_dim() > 0 && array.kind() != TypeKind::Null {
                    array.decrease_array_dim()
                } else {
                    e.expr_type(&self.ctx)
                }
            }
            ExprKind::Assignment(a) => self.infer(&a.left, None, false),
            ExprKind::Function(f) => self.function_type(f, e, upper_bound),
            ExprKind::Invocation(inv) => self.infer_call(inv, upper_bound, as_instance).ret,
            ExprKind::New(n) => self.new_type(n, upper_bound, as_instance),
            ExprKind::Switch(s) => {
                let ctx = self.ctx;
                s.result_type(|result| self.infer(result, upper_bound, false), &ctx)
            }
            ExprKind::Yield(y) => self.infer(&y.value, upper_bound, false),
            _ => e.expr_type(&self.ctx),
        }
    }

    pub(crate) fn var_type(&self, v: &VarExprent) -> VarType {
        match self.var_overrides.get(&v.var) {
            Some(ty) => ty.clone(),
            None => v.declared_type(self.ctx.vars).clone(),
        }
    }

    fn field_type(&mut self, f: &FieldExprent) -> VarType {
        let db = self.ctx.symbols;
        let Some(field) = db.lookup_field_recursive(&f.owner, &f.name) else {
            return f.ty.clone();
        };
        let Some(generic) = field.signature.clone() else {
            return f.ty.clone();
        };
        if let Some(instance) = &f.instance {
            let instance_type = self.infer(instance, None, false);
            if instance_type.kind() == TypeKind::Object && !instance_type.args().is_empty() {
                let owner = db.lookup_class(&field.owner);
                let seen = generic_supertype(&instance_type, &field.owner, db);
                if let (Some(owner), Some(seen)) = (owner, seen) {
                    let ty = generic.remap(&class_binding(owner, &seen));
                    if !ty.has_unknown_generic(&self.named_keys) {
                        return ty;
                    }
                }
            }
        }
        if generic.has_unknown_generic(&self.named_keys) {
            f.ty.clone()
        } else {
            generic
        }
    }

    fn function_type(&mut self, f: &FunctionExprent, e: &Exprent, upper_bound: Option<&VarType>) -> VarType {
        match f.func {
            FunctionType::Cast => self.cast_decoration(f, upper_bound).target,
            FunctionType::Ternary if f.operands.len() == 3 => {
                let declared = e.expr_type(&self.ctx);
                if declared.kind() != TypeKind::Object {
                    return declared;
                }
                let left = self.infer(&f.operands[1], upper_bound, false);
                let right = self.infer(&f.operands[2], upper_bound, false);
                if left == right {
                    return left;
                }
                VarType::common_supertype(&left, &right, self.ctx.symbols).unwrap_or(declared)
            }
            _ => e.expr_type(&self.ctx),
        }
    }

    /// Narrows a raw generic cast target to the parameterization the context expects and
    /// decides whether the cast is redundant.
    pub(crate) fn cast_decoration(&mut self, f: &FunctionExprent, upper_bound: Option<&VarType>) -> CastDecoration {
        let db = self.ctx.symbols;
        let target = f.target_type().cloned().unwrap_or_else(VarType::unknown);
        let Some(operand) = f.operands.first() else {
            return CastDecoration { target, elide: false };
        };
        let operand_type = self.infer(operand, Some(&target), false);

        let mut narrowed = target.clone();
        if let Some(ub) = upper_bound {
            let raw_target = target.kind() == TypeKind::Object && target.args().is_empty();
            let generic_bound = ub.kind() == TypeKind::Object && !ub.args().is_empty();
            if raw_target && generic_bound && ub.array_dim() == target.array_dim() {
                if let Some(class) = db
                    .lookup_class(target.name_or_empty())
                    .filter(|class| class.signature.is_some())
                {
                    if class.name == ub.name_or_empty() {
                        narrowed = ub.resize_array_dim(target.array_dim());
                    } else if let Some(seen) = generic_supertype(&class.generic_type(), ub.name_or_empty(), db) {
                        let mut map = GenericMap::new();
                        seen.map_gen_vars_to(&ub.resize_array_dim(0), &mut map);
                        let candidate = class.generic_type().remap(&map);
                        if !candidate.has_unknown_generic(&self.named_keys) {
                            narrowed = candidate.resize_array_dim(target.array_dim());
                        }
                    }
                }
            }
        }

        let redundant = operand_type.is_generic()
            && upper_bound.is_some_and(|ub| {
                !ub.is_object_class() && is_assignable(&operand_type, ub, &self.named, db)
            })
            && is_assignable(&operand_type, &narrowed, &self.named, db);
        if narrowed != target {
            tracing::trace!(target: "nova.decomp.ir", from = %target, to = %narrowed, "narrowed generic cast");
        }
        CastDecoration {
            target: narrowed,
            elide: !f.needs_cast || redundant,
        }
    }

    fn new_type(&mut self, n: &NewExprent, upper_bound: Option<&VarType>, as_instance: bool) -> VarType {
        let db = self.ctx.symbols;
        match &n.kind {
            NewKind::Object { constructor, .. } => {
                let class = db
                    .lookup_class(n.new_type.name_or_empty())
                    .filter(|class| class.signature.is_some());
                if n.is_anonymous(&self.ctx) {
                    return self
                        .ctx
                        .classes
                        .get(n.new_type.name_or_empty())
                        .and_then(|node| node.base_type.clone())
                        .filter(VarType::is_generic)
                        .unwrap_or_else(|| n.new_type.clone());
                }
                let Some(class) = class else {
                    return n.new_type.clone();
                };
                if let Some(ctor) = constructor {
                    let ret = self.infer_call(ctor, upper_bound, as_instance).ret;
                    return if ret.kind() == TypeKind::Void {
                        n.new_type.clone()
                    } else {
                        ret
                    };
                }
                let generic = class.generic_type();
                let mut map = GenericMap::new();
                self.gather_generics(upper_bound, &generic, &mut map);
                let ty = generic.remap(&map);
                if map.is_empty() || ty.has_unknown_generic(&self.named_keys) {
                    n.new_type.clone()
                } else {
                    ty
                }
            }
            NewKind::Array { elements, .. } => {
                if n.new_type.array_dim() == 1 && n.new_type.element_type().is_object_class() && !elements.is_empty() {
                    let types: Vec<VarType> = elements.iter().map(|el| self.infer(el, None, false)).collect();
                    if types[0].kind() == TypeKind::GenVar && types.iter().all(|t| *t == types[0]) {
                        return types[0].resize_array_dim(types[0].array_dim() + 1);
                    }
                }
                n.new_type.clone()
            }
            NewKind::Lambda(lambda) => self.lambda_types(n, lambda, upper_bound).interface_type,
        }
    }

    /// Binds the type variables of `ret` from the upper bound: `List<String>` against
    /// `ArrayList<E>` yields `E -> String`.
    pub(crate) fn gather_generics(&self, upper_bound: Option<&VarType>, ret: &VarType, map: &mut GenericMap) {
        let Some(ub) = upper_bound else {
            return;
        };
        if ub.is_object_class() || (ub.kind() == TypeKind::GenVar && !self.is_named(&ub.gen_var_key())) {
            return;
        }
        let db = self.ctx.symbols;
        let mut r = ret.clone();
        if r.kind() == TypeKind::Object
            && ub.kind() == TypeKind::Object
            && r.name_or_empty() != ub.name_or_empty()
            && db.is_subtype(r.name_or_empty(), ub.name_or_empty())
        {
            if let Some(seen) = generic_supertype(&r, ub.name_or_empty(), db) {
                r = seen;
            }
        }
        if r.kind() == TypeKind::GenVar {
            if ub.array_dim() >= r.array_dim() {
                map.entry(r.gen_var_key())
                    .or_insert_with(|| ub.resize_array_dim(ub.array_dim() - r.array_dim()).without_wildcard());
            }
        } else if ub.is_generic() && r.is_generic() {
            r.map_gen_vars_to(ub, map);
        }
    }

    /// Declared return type of `exit`: the generic return of the current method when known,
    /// otherwise the descriptor type the exit carries.
    pub(crate) fn return_type(&self, exit: &ExitExprent, in_lambda: bool) -> VarType {
        if exit.kind == ExitKind::Throw || in_lambda {
            return exit.method_return.clone();
        }
        match self.ctx.current_method {
            Some(method) if method.parsed.ret.same_erasure(&exit.method_return) => {
                let generic = method.generic_return();
                if generic.has_unknown_generic(&self.named_keys) {
                    exit.method_return.clone()
                } else {
                    generic.clone()
                }
            }
            _ => exit.method_return.clone(),
        }
    }

    /// Synthetic leading constructor arguments that never render: enum name and ordinal, and
    /// the outer instance of a member class.
    pub(crate) fn synthetic_prefix(&self, inv: &InvocationExprent, outer_instance: bool) -> usize {
        let mut prefix = 0;
        if inv.name == "<init>"
            && self
                .ctx
                .symbols
                .lookup_class(&inv.owner)
                .is_some_and(|class| class.is_enum())
        {
            prefix += 2;
        }
        if outer_instance {
            prefix += 1;
        }
        prefix.min(inv.args.len())
    }
}

/// Results of the inference pass, keyed by node id.
#[derive(Debug, Clone, Default)]
pub struct Decorations {
    types: HashMap<ExprId, (Option<VarType>, VarType)>,
    calls: HashMap<ExprId, CallPlan>,
    lambdas: HashMap<ExprId, LambdaTypes>,
    casts: HashMap<ExprId, CastDecoration>,
    var_types: HashMap<VarVersion, VarType>,
    exit_types: HashMap<ExprId, VarType>,
    keep_boxing: HashSet<ExprId>,
    keep_unboxing: HashSet<ExprId>,
}

impl Decorations {
    /// Inferred type of a node and the upper bound it was inferred against.
    pub fn inferred_type(&self, id: ExprId) -> Option<&VarType> {
        self.types.get(&id).map(|(_, ty)| ty)
    }

    pub(crate) fn inferred_with(&self, id: ExprId, bound: Option<&VarType>) -> Option<&VarType> {
        match self.types.get(&id) {
            Some((recorded, ty)) if recorded.as_ref() == bound => Some(ty),
            _ => None,
        }
    }

    pub(crate) fn bound_of(&self, id: ExprId) -> Option<VarType> {
        self.types.get(&id).and_then(|(bound, _)| bound.clone())
    }

    /// Call plan of an invocation, or of the constructor of a `new` node.
    pub fn call_plan(&self, id: ExprId) -> Option<&CallPlan> {
        self.calls.get(&id)
    }

    pub fn lambda(&self, id: ExprId) -> Option<&LambdaTypes> {
        self.lambdas.get(&id)
    }

    pub fn cast(&self, id: ExprId) -> Option<&CastDecoration> {
        self.casts.get(&id)
    }

    pub fn var_type(&self, var: VarVersion) -> Option<&VarType> {
        self.var_types.get(&var)
    }

    pub(crate) fn var_types(&self) -> &HashMap<VarVersion, VarType> {
        &self.var_types
    }

    pub fn exit_type(&self, id: ExprId) -> Option<&VarType> {
        self.exit_types.get(&id)
    }

    /// The boxing call must render as written.
    pub fn keeps_boxing(&self, id: ExprId) -> bool {
        self.keep_boxing.contains(&id)
    }

    /// The unboxing call must render as written.
    pub fn keeps_unboxing(&self, id: ExprId) -> bool {
        self.keep_unboxing.contains(&id)
    }

    pub(crate) fn record_call(&mut self, id: ExprId, instance: Option<&Exprent>, args: &[Exprent], plan: CallPlan) {
        if let Some(instance) = instance {
            if instance.as_invocation().is_some() {
                self.keep_boxing.insert(instance.id());
            }
        }
        for (arg, arg_plan) in args.iter().zip(&plan.args) {
            if arg_plan.force_boxing {
                self.keep_boxing.insert(arg.id());
            }
            if arg_plan.force_unboxing {
                self.keep_unboxing.insert(arg.id());
            }
        }
        self.calls.insert(id, plan);
    }

    pub(crate) fn record_cast(&mut self, id: ExprId, cast: CastDecoration) {
        self.casts.insert(id, cast);
    }

    pub(crate) fn record_lambda(&mut self, id: ExprId, lambda: LambdaTypes) {
        for (var, ty) in &lambda.params {
            self.var_types.insert(*var, ty.clone());
        }
        self.lambdas.insert(id, lambda);
    }

    /// Folds in the decorations of another tree; entries of `other` win on conflict.
    pub(crate) fn merge(&mut self, other: Decorations) {
        self.types.extend(other.types);
        self.calls.extend(other.calls);
        self.lambdas.extend(other.lambdas);
        self.casts.extend(other.casts);
        self.var_types.extend(other.var_types);
        self.exit_types.extend(other.exit_types);
        self.keep_boxing.extend(other.keep_boxing);
        self.keep_unboxing.extend(other.keep_unboxing);
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Runs inference over the whole tree rooted at `root`.
pub fn decorate(root: &Exprent, ctx: &DecompileContext<'_>) -> Decorations {
    let mut decorator = Decorator {
        inf: Inferencer::new(ctx),
        out: Decorations::default(),
        lambda_returns: Vec::new(),
    };
    decorator.visit(root, None, false);
    tracing::debug!(
        target: "nova.decomp.ir",
        root = %root.id(),
        nodes = decorator.out.types.len(),
        calls = decorator.out.calls.len(),
        lambdas = decorator.out.lambdas.len(),
        "decorated expression tree"
    );
    decorator.out
}

struct Decorator<'a> {
    inf: Inferencer<'a>,
    out: Decorations,
    /// Return types of the lambda bodies being visited, innermost last.
    lambda_returns: Vec<Option<VarType>>,
}

impl Decorator<'_> {
    fn visit(&mut self, e: &Exprent, bound: Option<VarType>, as_instance: bool) {
        let ty = self.inf.infer(e, bound.as_ref(), as_instance);
        self.out.types.insert(e.id(), (bound.clone(), ty));

        match &e.kind {
            ExprKind::Const(_) | ExprKind::Var(_) => {}
            ExprKind::Field(f) => {
                if let Some(instance) = &f.instance {
                    self.visit(instance, None, false);
                }
            }
            ExprKind::Array(a) => {
                self.visit(&a.array, None, false);
                self.visit(&a.index, Some(VarType::int()), false);
            }
            ExprKind::Assignment(a) => {
                let left = self.inf.infer(&a.left, None, false);
                self.visit(&a.left, None, false);
                let right_bound = if a.op.is_none() { Some(left) } else { None };
                self.visit(&a.right, right_bound, false);
            }
            ExprKind::Function(f) => match f.func {
                FunctionType::Cast => {
                    let cast = self.inf.cast_decoration(f, bound.as_ref());
                    let target = cast.target.clone();
                    self.out.record_cast(e.id(), cast);
                    let mut operands = f.operands.iter();
                    if let Some(value) = operands.next() {
                        self.visit(value, Some(target), false);
                    }
                    for rest in operands {
                        self.visit(rest, None, false);
                    }
                }
                FunctionType::Ternary => {
                    for (idx, op) in f.operands.iter().enumerate() {
                        let op_bound = if idx == 0 { None } else { bound.clone() };
                        self.visit(op, op_bound, false);
                    }
                }
                _ => {
                    for op in &f.operands {
                        self.visit(op, None, false);
                    }
                }
            },
            ExprKind::Invocation(inv) => {
                let prefix = self.inf.synthetic_prefix(inv, false);
                let plan = self.inf.call_plan(inv, bound.as_ref(), as_instance, prefix);
                let instance_bound = plan.instance_bound.clone();
                let arg_bounds: Vec<VarType> = plan.args.iter().map(|a| a.ty.clone()).collect();
                self.out.record_call(e.id(), inv.instance.as_deref(), &inv.args, plan);
                if let Some(instance) = &inv.instance {
                    self.visit(instance, Some(instance_bound), true);
                }
                self.visit_args(&inv.args, &arg_bounds);
            }
            ExprKind::New(n) => self.visit_new(e, n, bound.as_ref(), as_instance),
            ExprKind::Monitor(m) => self.visit(&m.value, None, false),
            ExprKind::Exit(exit) => {
                if let Some(value) = &exit.value {
                    let ret = match self.lambda_returns.last() {
                        Some(Some(lambda_ret)) if exit.kind == ExitKind::Return => {
                            self.out.exit_types.insert(e.id(), lambda_ret.clone());
                            lambda_ret.clone()
                        }
                        Some(_) => self.inf.return_type(exit, true),
                        None => self.inf.return_type(exit, false),
                    };
                    let value_bound = match exit.kind {
                        ExitKind::Return => Some(ret),
                        ExitKind::Throw => None,
                    };
                    self.visit(value, value_bound, false);
                }
            }
            ExprKind::Switch(s) => {
                self.visit(&s.value, None, false);
                for arm in &s.arms {
                    for label in &arm.labels {
                        self.visit(label, None, false);
                    }
                    match &arm.body {
                        ArmBody::Expression(body) => self.visit(body, bound.clone(), false),
                        ArmBody::Block(stmts) => self.visit_block(stmts, bound.as_ref()),
                    }
                }
            }
            ExprKind::Yield(y) => self.visit(&y.value, bound, false),
            ExprKind::Annotation(a) => {
                for (_, value) in &a.elements {
                    self.visit(value, None, false);
                }
            }
            ExprKind::Assert(a) => {
                self.visit(&a.condition, None, false);
                if let Some(message) = &a.message {
                    self.visit(message, None, false);
                }
            }
        }
    }

    /// Statements of a block; only `yield`s inherit the enclosing bound.
    fn visit_block(&mut self, stmts: &[Exprent], bound: Option<&VarType>) {
        for stmt in stmts {
            let stmt_bound = match stmt.kind {
                ExprKind::Yield(_) => bound.cloned(),
                _ => None,
            };
            self.visit(stmt, stmt_bound, false);
        }
    }

    fn visit_args(&mut self, args: &[Exprent], bounds: &[VarType]) {
        for (idx, arg) in args.iter().enumerate() {
            self.visit(arg, bounds.get(idx).cloned(), false);
        }
    }

    fn visit_new(&mut self, e: &Exprent, n: &NewExprent, bound: Option<&VarType>, as_instance: bool) {
        match &n.kind {
            NewKind::Object { constructor, .. } => {
                if let Some(ctor) = constructor {
                    let outer = n.has_outer_instance(self.inf.ctx());
                    let prefix = self.inf.synthetic_prefix(ctor, outer);
                    let plan = self.inf.call_plan(ctor, bound, as_instance, prefix);
                    let arg_bounds: Vec<VarType> = plan.args.iter().map(|a| a.ty.clone()).collect();
                    self.out.record_call(e.id(), None, &ctor.args, plan);
                    self.visit_args(&ctor.args, &arg_bounds);
                }
            }
            NewKind::Array { dims, elements, .. } => {
                for dim in dims {
                    self.visit(dim, Some(VarType::int()), false);
                }
                let element = n.new_type.decrease_array_dim();
                for el in elements {
                    self.visit(el, Some(element.clone()), false);
                }
            }
            NewKind::Lambda(lambda) => {
                let types = self.inf.lambda_types(n, lambda, bound);
                for (var, ty) in &types.params {
                    self.inf.set_var_type(*var, ty.clone());
                }
                let ret = types.return_type.clone();
                self.out.record_lambda(e.id(), types);
                match &lambda.content {
                    LambdaContent::MethodRef { receiver, .. } => {
                        if let Some(receiver) = receiver {
                            self.visit(receiver, None, false);
                        }
                    }
                    LambdaContent::Body { body, .. } => {
                        self.lambda_returns.push(ret.clone());
                        match body {
                            LambdaBody::Expression(expr) => self.visit(expr, ret, false),
                            LambdaBody::Block(stmts) => self.visit_block(stmts, None),
                        }
                        self.lambda_returns.pop();
                    }
                }
            }
        }
    }
}

/// Whether `e` is a `this` reference, returning the class it denotes.
pub(crate) fn this_class<'e>(e: &Exprent, ctx: &DecompileContext<'e>) -> Option<&'e str> {
    match &e.kind {
        ExprKind::Var(v) => ctx.vars.this_class(v.var),
        _ => None,
    }
}

/// Whether a class of the unit is anonymous.
pub(crate) fn is_anonymous_class(name: &str, ctx: &DecompileContext<'_>) -> bool {
    ctx.classes.kind_of(name) == Some(ClassKind::Anonymous)
}
