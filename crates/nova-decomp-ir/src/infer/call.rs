//! Method and constructor calls: return type inference, explicit type arguments and the
//! per-argument plan emission follows (expected types, overload ambiguity, boxing).

use std::collections::{HashMap, HashSet, VecDeque};

use nova_decomp_types::{
    all_generics, class_binding, generic_supertype, is_assignable, package_of, ClassInfo,
    GenericMap, MethodInfo, NamedGenerics, SymbolDb, TypeFamily, TypeKind, VarType,
};

use super::Inferencer;
use crate::context::ClassKind;
use crate::exprent::{ExprKind, Exprent};
use crate::function::FunctionType;
use crate::invocation::{CallKind, InvocationExprent};
use crate::java_type::boxed;

/// Nesting limit for bound checks of mutually recursive type variables.
const MAX_BOUND_DEPTH: usize = 16;

/// Result of inferring a single call.
#[derive(Debug, Clone, PartialEq)]
pub struct CallInference {
    pub ret: VarType,
    /// Type variable bindings of the callee (method and owner variables).
    pub generics_map: GenericMap,
    /// Explicit type arguments to render (`this.<T>foo()`); a lone dummy renders `<>`.
    pub generic_args: Vec<VarType>,
}

impl CallInference {
    fn plain(ret: VarType) -> Self {
        Self {
            ret,
            generics_map: GenericMap::new(),
            generic_args: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArgPlan {
    /// Expected type of the argument, used both as its inference bound and its cast target.
    pub ty: VarType,
    /// Another overload could match; the argument must be cast to pick this one.
    pub ambiguous: bool,
    /// Synthetic argument that never renders.
    pub skip: bool,
    pub force_boxing: bool,
    pub force_unboxing: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallPlan {
    pub ret: VarType,
    pub generic_args: Vec<VarType>,
    pub generics_map: GenericMap,
    /// Expected type of the receiver: the owner, parameterized when its bindings are known.
    pub instance_bound: VarType,
    pub args: Vec<ArgPlan>,
    /// The trailing array argument renders as individual varargs.
    pub expand_varargs: bool,
}

/// Binds callee type variables while checking each binding against the declared bounds.
struct GenericSolver<'s> {
    db: &'s dyn SymbolDb,
    named: &'s NamedGenerics,
    bounds: HashMap<VarType, Vec<VarType>>,
    map: GenericMap,
}

impl GenericSolver<'_> {
    fn is_named(&self, ty: &VarType) -> bool {
        ty.kind() == TypeKind::GenVar && self.named.contains_key(&ty.gen_var_key())
    }

    fn process(&mut self, from: &VarType, to: &VarType, depth: usize) {
        if depth > MAX_BOUND_DEPTH || to.is_null() || (to.kind() == TypeKind::GenVar && !self.is_named(to)) {
            return;
        }
        let Some(current) = self.map.get(from).cloned() else {
            self.put(from, to, depth);
            return;
        };
        if current == *to || self.is_named(&current) {
            return;
        }
        if current.kind() != TypeKind::GenVar && to.kind() == TypeKind::GenVar {
            let bound = self.named.get(&to.gen_var_key()).and_then(|b| b.first());
            if let Some(bound) = bound {
                if !bound.is_object_class() && self.db.is_subtype(bound.name_or_empty(), current.name_or_empty()) {
                    return;
                }
            }
        }
        if to.is_generic() && current.is_generic() && is_assignable(to, &current, self.named, self.db) {
            self.put(from, to, depth);
        }
    }

    fn put(&mut self, from: &VarType, to: &VarType, depth: usize) {
        if self.in_bounds(from, to, depth) {
            self.map.insert(from.clone(), to.clone());
        }
    }

    fn in_bounds(&mut self, from: &VarType, to: &VarType, depth: usize) -> bool {
        if depth > MAX_BOUND_DEPTH {
            return false;
        }
        let Some(from_bounds) = self.bounds.get(from).cloned() else {
            return false;
        };
        if to.kind() == TypeKind::GenVar && !self.is_named(to) {
            return true;
        }
        let candidates = if to.kind() == TypeKind::GenVar {
            self.named.get(&to.gen_var_key()).cloned().unwrap_or_default()
        } else {
            vec![to.clone()]
        };
        from_bounds.iter().all(|bound| {
            candidates
                .iter()
                .any(|candidate| self.satisfies(from, to, candidate, bound, depth))
        })
    }

    fn satisfies(&mut self, from: &VarType, to: &VarType, candidate: &VarType, bound: &VarType, depth: usize) -> bool {
        if bound.kind() == TypeKind::GenVar {
            return match self.resolve(bound) {
                Some(resolved) => self.db.is_subtype(candidate.name_or_empty(), resolved.name_or_empty()),
                None => self.in_bounds(&bound.gen_var_key(), candidate, depth + 1),
            };
        }
        if candidate.kind().is_primitive() && candidate.array_dim() == 0 {
            return bound.is_object_class() || bound == candidate;
        }
        if candidate.array_dim() > 0 || candidate.kind() != TypeKind::Object {
            return bound.is_object_class();
        }
        if !self.db.is_subtype(candidate.name_or_empty(), bound.name_or_empty()) {
            return false;
        }
        if bound.args().is_empty() {
            return true;
        }
        let Some(seen) = generic_supertype(candidate, bound.name_or_empty(), self.db) else {
            return false;
        };
        if seen.args().is_empty() {
            return true;
        }
        if seen.args().len() != bound.args().len() {
            return false;
        }
        let mut deferred = Vec::new();
        for (b, s) in bound.args().iter().zip(seen.args()) {
            let (Some(b), Some(s)) = (b, s) else {
                continue;
            };
            let b = b.without_wildcard();
            let s = s.without_wildcard();
            if b == s || (b == *from && s == *to) {
                continue;
            }
            if b.kind() == TypeKind::GenVar && self.bounds.contains_key(&b) && self.in_bounds(&b, &s, depth + 1) {
                deferred.push((b, s));
                continue;
            }
            return false;
        }
        for (b, s) in deferred {
            self.process(&b, &s, depth + 1);
        }
        true
    }

    /// Follows a type variable through the bindings and the in-scope bounds to a concrete type.
    fn resolve(&self, var: &VarType) -> Option<VarType> {
        let mut current = var.gen_var_key();
        let mut seen = HashSet::new();
        while seen.insert(current.clone()) {
            let next = self
                .map
                .get(&current)
                .cloned()
                .or_else(|| self.named.get(&current).and_then(|b| b.first().cloned()))?;
            if next.kind() != TypeKind::GenVar {
                return Some(next);
            }
            current = next.gen_var_key();
        }
        None
    }
}

/// A cast around a call argument or receiver says nothing about its natural type.
pub(super) fn strip_cast(e: &Exprent) -> &Exprent {
    match &e.kind {
        ExprKind::Function(f) if f.func == FunctionType::Cast => f.operands.first().unwrap_or(e),
        _ => e,
    }
}

pub(super) fn type_params(class: &ClassInfo) -> Vec<VarType> {
    class
        .signature
        .iter()
        .flat_map(|sig| sig.type_params.iter().map(|p| p.var()))
        .collect()
}

fn same_shape(a: &[VarType], b: &[VarType]) -> bool {
    a.len() == b.len()
        && a
            .iter()
            .zip(b)
            .all(|(x, y)| x.family() == y.family() && x.array_dim() == y.array_dim())
}

fn is_inline_lambda(e: &Exprent) -> bool {
    e.as_new()
        .and_then(|n| n.lambda_expr())
        .is_some_and(|lambda| !lambda.is_method_reference())
}

impl<'a> Inferencer<'a> {
    pub(crate) fn infer_call(
        &mut self,
        inv: &InvocationExprent,
        upper_bound: Option<&VarType>,
        as_instance: bool,
    ) -> CallInference {
        let ctx = *self.ctx();
        let db = ctx.symbols;
        let fallback = CallInference::plain(inv.parsed.ret.clone());
        let Some(method) = db.lookup_method_recursive(&inv.owner, &inv.name, &inv.descriptor) else {
            return fallback;
        };
        let Some(owner_class) = db.lookup_class(&inv.owner) else {
            return fallback;
        };
        let is_new = inv.call_kind() == CallKind::Init;
        let is_gen_new = is_new && owner_class.signature.is_some();
        if method.signature.is_none() && !is_gen_new {
            return fallback;
        }

        let named = self.named_generics().clone();
        let mut solver = GenericSolver {
            db,
            named: &named,
            bounds: self.declared_bounds(method, owner_class),
            map: GenericMap::new(),
        };
        let class_params = type_params(owner_class);
        let fparams: Vec<VarType> = if is_gen_new {
            class_params.clone()
        } else {
            method
                .signature
                .iter()
                .flat_map(|sig| sig.type_params.iter().map(|p| p.var()))
                .collect()
        };
        let ret = if is_gen_new {
            owner_class.generic_type()
        } else {
            method.generic_return().clone()
        };

        // Bindings inherited from the owner's view of the declaring class.
        let mut hierarchy = GenericMap::new();
        if method.owner != inv.owner {
            if let Some(inherited) = all_generics(&inv.owner, db).remove(&method.owner) {
                for (from, to) in &inherited {
                    if to.kind() == TypeKind::GenVar {
                        if let Some(bounds) = solver.bounds.get(&to.gen_var_key()).cloned() {
                            solver.bounds.entry(from.clone()).or_insert(bounds);
                        }
                    } else if !solver.bounds.contains_key(from) {
                        solver.map.insert(from.clone(), to.clone());
                    }
                }
                hierarchy = inherited;
            }
        }

        // Bindings from the type the context expects.
        let mut upper = GenericMap::new();
        let usable_bound = upper_bound.filter(|ub| {
            !ub.is_object_class() && (ub.kind() != TypeKind::GenVar || self.is_named(&ub.gen_var_key()))
        });
        if let Some(ub) = usable_bound {
            let mut ub = if ub.kind().is_primitive() { boxed(ub) } else { ub.clone() };
            let mut r = ret.remap(&hierarchy);
            if ub.kind() == TypeKind::Object && r.kind() == TypeKind::Object && ub.name_or_empty() != r.name_or_empty() {
                if db.is_subtype(ub.name_or_empty(), r.name_or_empty()) {
                    if let Some(seen) = generic_supertype(&ub, r.name_or_empty(), db) {
                        ub = seen;
                    }
                } else if let Some(seen) = generic_supertype(&r, ub.name_or_empty(), db) {
                    r = seen;
                }
            }
            if r.kind() == TypeKind::GenVar {
                if ub.array_dim() >= r.array_dim() {
                    upper.insert(
                        r.gen_var_key(),
                        ub.resize_array_dim(ub.array_dim() - r.array_dim()).without_wildcard(),
                    );
                }
            } else {
                let mut found = GenericMap::new();
                r.map_gen_vars_to(&ub, &mut found);
                for (from, to) in found {
                    let known = to.kind() != TypeKind::GenVar || self.is_named(&to);
                    if !solver.map.contains_key(&from) && known && solver.in_bounds(&from, &to, 0) {
                        upper.insert(from, to);
                    }
                }
            }
        }
        for param in fparams.iter().chain(&class_params) {
            upper.entry(param.clone()).or_insert_with(VarType::dummy_var);
        }

        // Bindings carried by the receiver.
        if !is_new {
            if let Some(instance) = inv.instance.as_deref() {
                let instance_bound = if owner_class.signature.is_some() {
                    Some(owner_class.generic_type().remap(&upper))
                } else {
                    upper_bound.cloned()
                };
                let mut instance_type = self.infer(strip_cast(instance), instance_bound.as_ref(), true);
                if self.is_named(&instance_type) {
                    if let Some(first) = named.get(&instance_type.gen_var_key()).and_then(|b| b.first()) {
                        instance_type = first.clone();
                    }
                }
                if instance_type.kind() == TypeKind::Object && !instance_type.args().is_empty() {
                    let class = db
                        .lookup_class(instance_type.name_or_empty())
                        .filter(|class| class.signature.is_some());
                    if let Some(class) = class {
                        let mut found = GenericMap::new();
                        class.generic_type().map_gen_vars_to(&instance_type, &mut found);
                        for (from, to) in found {
                            if !fparams.contains(&from) {
                                solver.process(&from, &to, 0);
                            }
                        }
                    }
                }
            }
        }

        // `this(...)` and `super(...)` keep the variables of the class being written.
        if upper_bound.is_none() && is_gen_new {
            if inv.owner == ctx.current_class {
                for var in owner_class.generic_type().all_generic_vars() {
                    solver.map.insert(var.clone(), var);
                }
            } else if let Some(seen) = all_generics(ctx.current_class, db).remove(&inv.owner) {
                solver.map.extend(seen);
            }
        }

        if !as_instance {
            for (from, to) in &upper {
                if fparams.contains(from) && !to.is_dummy_var() && !solver.map.contains_key(from) {
                    solver.map.insert(from.clone(), to.clone());
                }
            }
        }

        // Bindings from the arguments.
        let mut param_generics: HashSet<VarType> = HashSet::new();
        if let Some(sig) = &method.signature {
            let offset = inv.args.len().saturating_sub(sig.params.len());
            for (j, param) in sig.params.iter().enumerate() {
                let Some(arg) = inv.args.get(offset + j) else {
                    break;
                };
                if !param.is_generic() {
                    continue;
                }
                let mut combined = solver.map.clone();
                for (from, to) in &upper {
                    combined.entry(from.clone()).or_insert_with(|| to.clone());
                }
                let param_bound = param.remap(&hierarchy).remap(&combined);
                let mut arg_type = self.infer(strip_cast(arg), Some(&param_bound), false);

                let param_class = (param.kind() == TypeKind::Object)
                    .then(|| db.lookup_class(param.name_or_empty()))
                    .flatten();
                let arg_class = (arg_type.kind() == TypeKind::Object)
                    .then(|| db.lookup_class(arg_type.name_or_empty()))
                    .flatten();
                if param_class.is_some() && arg_class.is_some() {
                    if param.name_or_empty() != arg_type.name_or_empty() {
                        if let Some(seen) = generic_supertype(&arg_type, param.name_or_empty(), db) {
                            arg_type = seen;
                        }
                    }
                    if !arg_type.args().is_empty() {
                        let mut found = GenericMap::new();
                        param.map_gen_vars_to(&arg_type, &mut found);
                        for (from, to) in found {
                            param_generics.insert(from.clone());
                            solver.process(&from, &to, 0);
                        }
                    }
                } else if param.kind() == TypeKind::GenVar
                    && *param != arg_type
                    && arg_type.kind() != TypeKind::Unknown
                    && arg_type.array_dim() >= param.array_dim()
                {
                    let to = boxed(&arg_type.resize_array_dim(arg_type.array_dim() - param.array_dim()));
                    let key = param.gen_var_key();
                    param_generics.insert(key.clone());
                    solver.process(&key, &to, 0);
                }
            }
        }

        for (from, to) in &upper {
            if fparams.contains(from) && !to.is_dummy_var() {
                solver.process(from, to, 0);
            }
        }

        let generics = solver.map;
        let mut out = CallInference::plain(inv.parsed.ret.clone());
        if !generics.is_empty() {
            let unmapped = ret.remap(&hierarchy);
            let skip_args = !unmapped.all_generic_vars().iter().any(|v| fparams.contains(v));
            let new_ret = unmapped.remap(&generics);

            if !skip_args && (!is_new || is_gen_new) {
                let missing = param_generics.is_empty() || fparams.iter().any(|p| !param_generics.contains(p));
                let fits_bound = upper_bound.map_or(true, |ub| {
                    !new_ret.is_generic() || db.is_subtype(new_ret.name_or_empty(), ub.name_or_empty())
                });
                let suppress = (!missing || !as_instance) && fits_bound;
                if !suppress || ctx.options.explicit_generic_arguments {
                    out.generic_args = self.explicit_arguments(&fparams, &generics);
                } else if is_gen_new {
                    out.generic_args = vec![VarType::dummy_var()];
                }
            }

            let unknown = new_ret.is_generic() && new_ret.has_unknown_generic(self.named_keys());
            if new_ret != ret && !unknown {
                tracing::trace!(target: "nova.decomp.ir", call = %inv.name, ret = %new_ret, "inferred call type");
                out.ret = new_ret;
                out.generics_map = generics;
                return out;
            }
            out.generics_map = generics;
        }
        if ret.is_generic() && ret.all_generic_vars().is_empty() {
            out.ret = ret;
        }
        out
    }

    /// Bounds of every type variable a call may bind: the method's own, then the owner's, then
    /// those of the classes lexically enclosing the owner.
    fn declared_bounds(&self, method: &MethodInfo, owner: &ClassInfo) -> HashMap<VarType, Vec<VarType>> {
        let db = self.ctx().symbols;
        let classes = self.ctx().classes;
        let mut bounds = HashMap::new();
        if let Some(sig) = &method.signature {
            for param in &sig.type_params {
                bounds.entry(param.var()).or_insert_with(|| param.bounds.clone());
            }
        }
        let mut visited = HashSet::new();
        let mut class = Some(owner);
        while let Some(current) = class {
            if !visited.insert(current.name.clone()) {
                break;
            }
            if let Some(sig) = &current.signature {
                for param in &sig.type_params {
                    bounds.entry(param.var()).or_insert_with(|| param.bounds.clone());
                }
            }
            class = classes
                .get(&current.name)
                .filter(|node| !node.is_static() && node.kind != ClassKind::Root)
                .and_then(|node| node.enclosing.as_deref())
                .and_then(|enclosing| db.lookup_class(enclosing));
        }
        bounds
    }

    /// Explicit type arguments in declaration order, or nothing when any is unresolved.
    fn explicit_arguments(&self, fparams: &[VarType], generics: &GenericMap) -> Vec<VarType> {
        let mut out = Vec::with_capacity(fparams.len());
        for param in fparams {
            match generics.get(param) {
                Some(arg) if arg.kind() == TypeKind::GenVar && arg.gen_var_key() != *param && !self.is_named(arg) => {
                    return Vec::new();
                }
                Some(arg) => out.push(arg.clone()),
                None => return Vec::new(),
            }
        }
        out
    }

    pub(crate) fn call_plan(
        &mut self,
        inv: &InvocationExprent,
        upper_bound: Option<&VarType>,
        as_instance: bool,
        synthetic_prefix: usize,
    ) -> CallPlan {
        let ctx = *self.ctx();
        let db = ctx.symbols;
        let mut inference = self.infer_call(inv, upper_bound, as_instance);
        let owner_class = db.lookup_class(&inv.owner);
        let method = db.lookup_method_recursive(&inv.owner, &inv.name, &inv.descriptor);
        if owner_class.is_some() && method.is_none() && inv.call_kind() != CallKind::ClassInit {
            tracing::warn!(
                target: "nova.decomp.ir",
                owner = %inv.owner,
                name = %inv.name,
                descriptor = %inv.descriptor,
                "invoked method is missing from the symbol database"
            );
        }

        if inference.generics_map.is_empty() && !inv.is_static() && inv.call_kind() == CallKind::General {
            if let (Some(instance), Some(owner)) = (inv.instance.as_deref(), owner_class) {
                let instance_type = self.infer(strip_cast(instance), None, true);
                if let Some(seen) = generic_supertype(&instance_type, &inv.owner, db) {
                    if !seen.args().is_empty() {
                        inference.generics_map = class_binding(owner, &seen);
                    }
                }
            }
        }

        let instance_bound = match owner_class {
            Some(owner) if owner.signature.is_some() && !inference.generics_map.is_empty() => {
                owner.generic_type().remap(&inference.generics_map)
            }
            _ => VarType::object(inv.owner.clone()),
        };

        let n = inv.args.len();
        let matches = self.matched_methods(inv);
        let ambiguous = self.ambiguous_params(inv, &matches);
        let descriptor_params = &inv.parsed.params;
        let mut types: Vec<VarType> = (0..n)
            .map(|i| {
                descriptor_params
                    .get(i)
                    .cloned()
                    .unwrap_or_else(|| inv.args[i].expr_type(&ctx))
            })
            .collect();
        let mut force_boxing = vec![false; n];
        let mut force_unboxing = vec![false; n];

        for i in synthetic_prefix..n {
            let Some(call) = inv.args[i].as_invocation() else {
                continue;
            };
            if call.is_boxing_call(&ctx) {
                let mut value_type = call.args[0].expr_type(&ctx);
                if value_type.family() == TypeFamily::Integer {
                    value_type = match call.owner.as_str() {
                        "java/lang/Short" => VarType::short(),
                        "java/lang/Byte" => VarType::byte(),
                        "java/lang/Integer" => VarType::int(),
                        _ => VarType::char(),
                    };
                }
                types[i] = value_type;
                let count = owner_class.map_or(0, |owner| {
                    owner
                        .methods_named(&inv.name)
                        .filter(|m| m.parsed.params.len() == n && self.can_access(m))
                        .filter(|m| same_shape(&m.parsed.params, descriptor_params) || same_shape(&m.parsed.params, &types))
                        .count()
                });
                if count != matches.len() {
                    types[i] = descriptor_params.get(i).cloned().unwrap_or_else(VarType::object_type);
                    force_boxing[i] = true;
                }
            } else if call.is_unboxing_call() {
                if let (Some(owner), Some(receiver)) = (owner_class, call.instance.as_deref()) {
                    let receiver_type = receiver.expr_type(&ctx);
                    force_unboxing[i] = owner.methods_named(&inv.name).any(|m| {
                        m.descriptor != inv.descriptor
                            && m.parsed.params.len() == n
                            && self.can_access(m)
                            && m.parsed.params[i].kind() == TypeKind::Object
                            && m.parsed.params[i].array_dim() == 0
                            && db.is_subtype(receiver_type.name_or_empty(), m.parsed.params[i].name_or_empty())
                    });
                }
            }
        }

        if let Some(sig) = method.and_then(|m| m.signature.as_ref()) {
            let offset = n.saturating_sub(sig.params.len());
            for (j, param) in sig.params.iter().enumerate() {
                let x = offset + j;
                if x < synthetic_prefix || x >= n || force_boxing[x] {
                    continue;
                }
                let ty = param.remap(&inference.generics_map);
                if !(ty.is_generic() && ty.has_unknown_generic(self.named_keys())) {
                    types[x] = ty;
                }
            }
        }

        let last = n.checked_sub(1);
        let expand_varargs = method.is_some_and(|m| m.access.is_varargs())
            && n == descriptor_params.len()
            && last.is_some_and(|l| {
                !ambiguous[l]
                    && inv.args[l]
                        .as_new()
                        .and_then(|array| array.vararg_elements())
                        .is_some()
            });

        let args = types
            .into_iter()
            .enumerate()
            .map(|(i, ty)| {
                let anonymous_marker = Some(i) == last
                    && inv.args[i].as_const().is_some_and(|c| c.is_null())
                    && descriptor_params
                        .get(i)
                        .is_some_and(|p| ctx.classes.kind_of(p.name_or_empty()) == Some(ClassKind::Anonymous));
                ArgPlan {
                    ty,
                    ambiguous: ambiguous[i],
                    skip: i < synthetic_prefix || anonymous_marker,
                    force_boxing: force_boxing[i],
                    force_unboxing: force_unboxing[i],
                }
            })
            .collect();

        CallPlan {
            ret: inference.ret,
            generic_args: inference.generic_args,
            generics_map: inference.generics_map,
            instance_bound,
            args,
            expand_varargs,
        }
    }

    /// Accessible methods of the owner's hierarchy with the same name and argument shape. The
    /// owner's own matches shadow those of its supertypes.
    fn matched_methods(&self, inv: &InvocationExprent) -> Vec<&'a MethodInfo> {
        let db = self.ctx().symbols;
        let mut out: Vec<&'a MethodInfo> = Vec::new();
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([inv.owner.clone()]);
        while let Some(name) = queue.pop_front() {
            if !seen.insert(name.clone()) {
                continue;
            }
            let Some(class) = db.lookup_class(&name) else {
                continue;
            };
            for method in class.methods.iter().filter(|m| m.name == inv.name) {
                if same_shape(&method.parsed.params, &inv.parsed.params)
                    && self.can_access(method)
                    && !out.iter().any(|m| m.descriptor == method.descriptor)
                {
                    out.push(method);
                }
            }
            if name == inv.owner && !out.is_empty() {
                return out;
            }
            queue.extend(class.super_class.iter().cloned());
            queue.extend(class.interfaces.iter().cloned());
        }
        out
    }

    /// Marks the arguments that need a cast so overload resolution picks the called method.
    fn ambiguous_params(&self, inv: &InvocationExprent, matches: &[&MethodInfo]) -> Vec<bool> {
        let ctx = self.ctx();
        let db = ctx.symbols;
        let n = inv.args.len();
        let mut ambiguous = vec![false; n];
        if matches.len() <= 1 {
            return ambiguous;
        }
        if !matches.iter().any(|m| m.descriptor == inv.descriptor) {
            tracing::warn!(
                target: "nova.decomp.ir",
                call = %inv.name,
                descriptor = %inv.descriptor,
                candidates = matches.len(),
                "invoked descriptor is not among the overload candidates"
            );
            return ambiguous;
        }
        let Some(own) = db
            .lookup_class(&inv.owner)
            .and_then(|class| class.method(&inv.name, &inv.descriptor))
        else {
            return ambiguous;
        };
        let params = &own.parsed.params;
        if params.len() != n {
            return ambiguous;
        }

        let arg_types: Vec<VarType> = inv.args.iter().map(|arg| arg.expr_type(ctx)).collect();
        let missed: Vec<bool> = (0..n)
            .map(|i| {
                let (param, arg, arg_type) = (&params[i], &inv.args[i], &arg_types[i]);
                let widened_var = matches!(arg.kind, ExprKind::Var(_))
                    && param.family() == TypeFamily::Integer
                    && arg_type.family() == TypeFamily::Integer
                    && param != arg_type;
                let object_param = param.is_object_class() && arg_type.family() == TypeFamily::Object;
                // `null` fits every reference overload; it only selects ours when ours is the most specific.
                let unspecific_null = arg_type.is_null()
                    && matches.iter().any(|m| {
                        m.descriptor != inv.descriptor
                            && m.parsed.params.get(i).is_some_and(|p| {
                                p.family() == TypeFamily::Object && !p.is_superset_in(param, db)
                            })
                    });
                is_inline_lambda(arg)
                    || (param != arg_type && !param.is_superset(arg_type))
                    || widened_var
                    || object_param
                    || unspecific_null
            })
            .collect();
        if !missed.iter().any(|m| *m) {
            return ambiguous;
        }

        let candidates: Vec<&MethodInfo> = matches
            .iter()
            .copied()
            .filter(|m| {
                (0..n).all(|i| {
                    let p = &m.parsed.params[i];
                    if !missed[i] {
                        p.same_erasure(&params[i])
                    } else if is_inline_lambda(&inv.args[i]) {
                        true
                    } else if p.family() == TypeFamily::Object {
                        arg_types[i].is_null() || p.is_superset_in(&arg_types[i], db)
                    } else {
                        p.is_superset(&arg_types[i])
                    }
                })
            })
            .collect();
        if candidates.len() <= 1 {
            return ambiguous;
        }
        for (i, slot) in ambiguous.iter_mut().enumerate() {
            *slot = missed[i]
                && candidates.iter().any(|m| {
                    !m.parsed.params[i].same_erasure(&params[i])
                        || (m.descriptor != inv.descriptor
                            && m.generic_params().get(i).is_some_and(|g| g.kind() == TypeKind::GenVar))
                });
        }
        tracing::trace!(target: "nova.decomp.ir", call = %inv.name, candidates = candidates.len(), "ambiguous overload");
        ambiguous
    }

    fn can_access(&self, method: &MethodInfo) -> bool {
        let ctx = self.ctx();
        let current = ctx.current_class;
        let access = method.access;
        if access.is_public() {
            true
        } else if access.is_private() {
            ctx.is_current_or_enclosing(&method.owner)
        } else if access.is_protected() {
            package_of(&method.owner) == package_of(current) || ctx.symbols.is_subtype(current, &method.owner)
        } else {
            package_of(&method.owner) == package_of(current)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constant::ConstExprent;
    use crate::context::DecompileContext;
    use crate::invocation::InvocationExprent;
    use crate::var::{VarExprent, VarInfo, VarTable, VarVersion};
    use nova_decomp_types::{AccessFlags, ClassStore};
    use pretty_assertions::assert_eq;

    const PUBLIC: AccessFlags = AccessFlags(AccessFlags::PUBLIC);
    const PUBLIC_STATIC: AccessFlags = AccessFlags(AccessFlags::PUBLIC | AccessFlags::STATIC);

    fn store() -> ClassStore {
        ClassStore::new()
            .with_class(ClassInfo::new("java/lang/String", PUBLIC))
            .with_class(ClassInfo::new("java/lang/Integer", PUBLIC))
            .with_class(
                ClassInfo::new("java/util/List", AccessFlags(AccessFlags::PUBLIC | AccessFlags::INTERFACE))
                    .with_signature("<E:Ljava/lang/Object;>Ljava/lang/Object;")
                    .with_method(
                        MethodInfo::new("java/util/List", "get", "(I)Ljava/lang/Object;", PUBLIC)
                            .with_signature("(I)TE;"),
                    ),
            )
            .with_class(
                ClassInfo::new("a/Util", PUBLIC)
                    .with_method(
                        MethodInfo::new("a/Util", "id", "(Ljava/lang/Object;)Ljava/lang/Object;", PUBLIC_STATIC)
                            .with_signature("<T:Ljava/lang/Object;>(TT;)TT;"),
                    )
                    .with_method(
                        MethodInfo::new("a/Util", "empty", "()Ljava/util/List;", PUBLIC_STATIC)
                            .with_signature("<T:Ljava/lang/Object;>()Ljava/util/List<TT;>;"),
                    )
                    .with_method(MethodInfo::new("a/Util", "show", "(Ljava/lang/Object;)V", PUBLIC_STATIC))
                    .with_method(MethodInfo::new("a/Util", "show", "(Ljava/lang/String;)V", PUBLIC_STATIC))
                    .with_method(MethodInfo::new("a/Util", "take", "(Ljava/lang/Integer;)V", PUBLIC_STATIC))
                    .with_method(MethodInfo::new("a/Util", "take", "(I)V", PUBLIC_STATIC)),
            )
    }

    #[test]
    fn method_type_variables_bind_from_arguments() {
        let store = store();
        let ctx = DecompileContext::new(&store, "a/Main");
        let call = InvocationExprent::static_call(
            "a/Util",
            "id",
            "(Ljava/lang/Object;)Ljava/lang/Object;",
            vec![Exprent::new(ConstExprent::string("x"))],
        );
        let inferred = Inferencer::new(&ctx).infer_call(&call, None, false);
        assert_eq!(inferred.ret, VarType::string());
        assert!(inferred.generic_args.is_empty());
    }

    #[test]
    fn expected_type_binds_return_only_variables() {
        let store = store();
        let ctx = DecompileContext::new(&store, "a/Main");
        let call = InvocationExprent::static_call("a/Util", "empty", "()Ljava/util/List;", Vec::new());
        let expected = VarType::generic("java/util/List", vec![Some(VarType::string())]);
        let inferred = Inferencer::new(&ctx).infer_call(&call, Some(&expected), false);
        assert_eq!(inferred.ret, expected);
        assert!(inferred.generic_args.is_empty());
    }

    #[test]
    fn receivers_bind_owner_variables() {
        let store = store();
        let list = VarType::generic("java/util/List", vec![Some(VarType::string())]);
        let vars = VarTable::new().with_var(VarVersion::new(1, 0), VarInfo::named("list").with_type(list));
        let ctx = DecompileContext::new(&store, "a/Main").with_vars(&vars);
        let call = InvocationExprent::interface_call(
            Exprent::new(VarExprent::new(VarVersion::new(1, 0), VarType::object("java/util/List"))),
            "java/util/List",
            "get",
            "(I)Ljava/lang/Object;",
            vec![Exprent::new(ConstExprent::int(0, false))],
        );
        let inferred = Inferencer::new(&ctx).infer_call(&call, None, false);
        assert_eq!(inferred.ret, VarType::string());
    }

    #[test]
    fn null_arguments_to_overloads_are_ambiguous() {
        let store = store();
        let ctx = DecompileContext::new(&store, "a/Main");
        let call = InvocationExprent::static_call(
            "a/Util",
            "show",
            "(Ljava/lang/Object;)V",
            vec![Exprent::new(ConstExprent::null())],
        );
        let plan = Inferencer::new(&ctx).call_plan(&call, None, false, 0);
        assert!(plan.args[0].ambiguous);
        assert_eq!(plan.args[0].ty, VarType::object_type());
    }

    #[test]
    fn boxing_stays_explicit_when_an_overload_takes_the_primitive() {
        let store = store();
        let ctx = DecompileContext::new(&store, "a/Main");
        let boxing = InvocationExprent::static_call(
            "java/lang/Integer",
            "valueOf",
            "(I)Ljava/lang/Integer;",
            vec![Exprent::new(VarExprent::new(VarVersion::new(1, 0), VarType::int()))],
        );
        let call = InvocationExprent::static_call("a/Util", "take", "(Ljava/lang/Integer;)V", vec![Exprent::new(boxing)]);
        let plan = Inferencer::new(&ctx).call_plan(&call, None, false, 0);
        assert!(plan.args[0].force_boxing);
        assert_eq!(plan.args[0].ty, VarType::object("java/lang/Integer"));
    }

    #[test]
    fn synthetic_prefix_arguments_are_skipped() {
        let store = store();
        let ctx = DecompileContext::new(&store, "a/Main");
        let call = InvocationExprent::static_call(
            "a/Util",
            "id",
            "(Ljava/lang/Object;)Ljava/lang/Object;",
            vec![Exprent::new(ConstExprent::string("x"))],
        );
        let plan = Inferencer::new(&ctx).call_plan(&call, None, false, 1);
        assert!(plan.args[0].skip);
        assert!(!plan.expand_varargs);
    }
}
