//! Functional interface parameterization of lambdas and method references.

use std::collections::HashSet;

use nova_decomp_types::{
    all_generics, class_binding, generic_supertype, parse_method_descriptor, GenericMap, TypeKind,
    VarType,
};

use super::call::type_params;
use super::Inferencer;
use crate::exit::ExitKind;
use crate::exprent::ExprKind;
use crate::java_type::boxed;
use crate::new::{LambdaBody, LambdaContent, LambdaExpr, NewExprent};
use crate::var::VarVersion;

#[derive(Debug, Clone, PartialEq)]
pub struct LambdaTypes {
    /// The functional interface, parameterized when every binding is known.
    pub interface_type: VarType,
    /// Types of the lambda's own parameters.
    pub params: Vec<(VarVersion, VarType)>,
    /// Expected type of the lambda's result.
    pub return_type: Option<VarType>,
}

impl Inferencer<'_> {
    pub(crate) fn lambda_types(&mut self, n: &NewExprent, lambda: &LambdaExpr, upper_bound: Option<&VarType>) -> LambdaTypes {
        let db = self.ctx().symbols;
        let plain = LambdaTypes {
            interface_type: n.new_type.clone(),
            params: Vec::new(),
            return_type: None,
        };
        let Some(iface) = db.lookup_class(n.new_type.name_or_empty()) else {
            return plain;
        };
        let Some(sam) = db.lookup_method_recursive(&iface.name, &lambda.method_name, &lambda.method_descriptor) else {
            return plain;
        };

        let hierarchy = if sam.owner == iface.name {
            GenericMap::new()
        } else {
            all_generics(&iface.name, db).remove(&sam.owner).unwrap_or_default()
        };
        let sam_params: Vec<VarType> = sam.generic_params().iter().map(|p| p.remap(&hierarchy)).collect();
        let sam_ret = sam.generic_return().remap(&hierarchy);

        let iface_type = iface.generic_type();
        let mut map = GenericMap::new();
        self.gather_generics(upper_bound, &iface_type, &mut map);

        let (owner, name, descriptor) = lambda.target();
        let target = db.lookup_method_recursive(owner, name, descriptor);
        let target_descriptor = parse_method_descriptor(descriptor).ok();
        let impl_params: Vec<VarType> = match (target, &target_descriptor) {
            (Some(method), _) => method.generic_params().to_vec(),
            (None, Some(parsed)) => parsed.params.clone(),
            (None, None) => Vec::new(),
        };

        let mut instance_map = GenericMap::new();
        let mut unbound_receiver = false;
        if let LambdaContent::MethodRef { receiver, .. } = &lambda.content {
            match receiver {
                Some(receiver) => {
                    let receiver_type = self.infer(receiver, None, false);
                    let seen = generic_supertype(&receiver_type, owner, db);
                    if let (Some(seen), Some(class)) = (seen, db.lookup_class(owner)) {
                        instance_map = class_binding(class, &seen);
                    }
                }
                None if name != "<init>" && target.is_some_and(|m| !m.access.is_static()) => {
                    unbound_receiver = true;
                    if let Some(first) = sam_params.first().filter(|p| p.kind() == TypeKind::GenVar) {
                        map.entry(first.gen_var_key())
                            .or_insert_with(|| VarType::object(owner));
                    }
                }
                None => {}
            }
        }

        // Interface parameters not fixed by the context take the implementation's types,
        // aligned from the end past captured values.
        let shift = usize::from(unbound_receiver);
        let count = sam_params.len().saturating_sub(shift);
        let impl_offset = impl_params.len().saturating_sub(count);
        for (j, sam_param) in sam_params.iter().skip(shift).enumerate() {
            let Some(impl_param) = impl_params.get(impl_offset + j) else {
                break;
            };
            if sam_param.kind() != TypeKind::GenVar || map.contains_key(&sam_param.gen_var_key()) {
                continue;
            }
            let ty = impl_param.remap(&instance_map);
            if (ty.kind() == TypeKind::GenVar && !self.is_named(&ty)) || ty.array_dim() < sam_param.array_dim() {
                continue;
            }
            map.insert(
                sam_param.gen_var_key(),
                boxed(&ty.resize_array_dim(ty.array_dim() - sam_param.array_dim())),
            );
        }

        if sam_ret.kind() == TypeKind::GenVar && !map.contains_key(&sam_ret.gen_var_key()) {
            let mut result = if name == "<init>" {
                db.lookup_class(owner)
                    .map(|class| class.generic_type())
                    .filter(|ty| !ty.has_unknown_generic(self.named_keys()))
                    .unwrap_or_else(|| VarType::object(owner))
            } else {
                match (target, &target_descriptor) {
                    (Some(method), _) => method.generic_return().remap(&instance_map),
                    (None, Some(parsed)) => parsed.ret.clone(),
                    (None, None) => VarType::unknown(),
                }
            };
            if let LambdaContent::Body { params, body, .. } = &lambda.content {
                let generic_class = result.kind() == TypeKind::Object
                    && db
                        .lookup_class(result.name_or_empty())
                        .is_some_and(|class| class.signature.is_some());
                if generic_class {
                    let bound_params: Vec<(VarVersion, VarType)> = params
                        .iter()
                        .zip(&sam_params)
                        .map(|(var, p)| (*var, p.remap(&map)))
                        .filter(|(_, ty)| !ty.has_unknown_generic(self.named_keys()))
                        .collect();
                    if let Some(body_type) = self.body_result(body, &bound_params) {
                        if body_type.is_generic() && !body_type.has_unknown_generic(self.named_keys()) {
                            result = body_type;
                        }
                    }
                }
            }
            let result = boxed(&result);
            let usable = !matches!(result.kind(), TypeKind::Void | TypeKind::Unknown)
                && !(result.kind() == TypeKind::GenVar && !self.is_named(&result))
                && result.array_dim() >= sam_ret.array_dim();
            if usable {
                map.insert(
                    sam_ret.gen_var_key(),
                    result.resize_array_dim(result.array_dim() - sam_ret.array_dim()),
                );
            }
        }

        let mut full = map;
        for param in type_params(iface) {
            full.entry(param).or_insert_with(VarType::dummy_var);
        }
        let known = |ty: &VarType, keys: &HashSet<VarType>| !(ty.is_generic() && ty.has_unknown_generic(keys));

        let remapped = iface_type.remap(&full);
        let interface_type = if known(&remapped, self.named_keys()) {
            remapped
        } else {
            n.new_type.clone()
        };
        let params = match &lambda.content {
            LambdaContent::Body { params, .. } => params
                .iter()
                .zip(&sam_params)
                .map(|(var, p)| (*var, p.remap(&full)))
                .filter(|(_, ty)| known(ty, self.named_keys()))
                .collect(),
            LambdaContent::MethodRef { .. } => Vec::new(),
        };
        let return_type = Some(sam_ret.remap(&full)).filter(|ty| known(ty, self.named_keys()));

        if return_type.is_none() {
            tracing::debug!(target: "nova.decomp.ir", interface = %interface_type, "lambda return type left unresolved");
        }
        tracing::trace!(target: "nova.decomp.ir", interface = %interface_type, params = params.len(), "lambda types");
        LambdaTypes {
            interface_type,
            params,
            return_type,
        }
    }

    /// Type the body of an inline lambda produces, with its parameters typed as given.
    fn body_result(&mut self, body: &LambdaBody, params: &[(VarVersion, VarType)]) -> Option<VarType> {
        let previous: Vec<(VarVersion, Option<VarType>)> = params
            .iter()
            .map(|(var, ty)| (*var, self.set_var_type(*var, ty.clone())))
            .collect();
        let result = match body {
            LambdaBody::Expression(expr) => Some(self.infer(expr, None, false)),
            LambdaBody::Block(stmts) => {
                let mut found = None;
                for stmt in stmts {
                    if let ExprKind::Exit(exit) = &stmt.kind {
                        if let (ExitKind::Return, Some(value)) = (exit.kind, exit.value.as_deref()) {
                            let ty = self.infer(value, None, false);
                            if ty.is_generic() {
                                found = Some(ty);
                                break;
                            }
                        }
                    }
                }
                found
            }
        };
        for (var, prev) in previous.into_iter().rev() {
            self.restore_var_type(var, prev);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constant::ConstExprent;
    use crate::context::DecompileContext;
    use crate::exprent::Exprent;
    use nova_decomp_types::{AccessFlags, ClassInfo, ClassStore, MethodInfo};
    use pretty_assertions::assert_eq;

    fn store() -> ClassStore {
        ClassStore::new().with_class(
            ClassInfo::new(
                "java/util/function/Function",
                AccessFlags(AccessFlags::PUBLIC | AccessFlags::INTERFACE),
            )
            .with_signature("<T:Ljava/lang/Object;R:Ljava/lang/Object;>Ljava/lang/Object;")
            .with_method(
                MethodInfo::new(
                    "java/util/function/Function",
                    "apply",
                    "(Ljava/lang/Object;)Ljava/lang/Object;",
                    AccessFlags(AccessFlags::PUBLIC | AccessFlags::ABSTRACT),
                )
                .with_signature("(TT;)TR;"),
            ),
        )
    }

    fn length_lambda() -> NewExprent {
        NewExprent::lambda(
            VarType::object("java/util/function/Function"),
            LambdaExpr::body(
                "apply",
                "(Ljava/lang/Object;)Ljava/lang/Object;",
                "a/Main",
                "lambda$main$0",
                "(Ljava/lang/String;)Ljava/lang/Integer;",
                vec![VarVersion::new(1, 0)],
                LambdaBody::Expression(Box::new(Exprent::new(ConstExprent::int(3, false)))),
            ),
        )
    }

    fn function_of(from: VarType, to: VarType) -> VarType {
        VarType::generic("java/util/function/Function", vec![Some(from), Some(to)])
    }

    #[test]
    fn expected_type_fixes_the_parameters() {
        let store = store();
        let ctx = DecompileContext::new(&store, "a/Main");
        let n = length_lambda();
        let expected = function_of(VarType::string(), VarType::object("java/lang/Integer"));
        let lambda = n.lambda_expr().unwrap();
        let types = Inferencer::new(&ctx).lambda_types(&n, lambda, Some(&expected));
        assert_eq!(types.interface_type, expected);
        assert_eq!(types.params, vec![(VarVersion::new(1, 0), VarType::string())]);
        assert_eq!(types.return_type, Some(VarType::object("java/lang/Integer")));
    }

    #[test]
    fn implementation_types_fill_in_without_a_context() {
        let store = store();
        let ctx = DecompileContext::new(&store, "a/Main");
        let n = length_lambda();
        let lambda = n.lambda_expr().unwrap();
        let types = Inferencer::new(&ctx).lambda_types(&n, lambda, None);
        assert_eq!(
            types.interface_type,
            function_of(VarType::string(), VarType::object("java/lang/Integer"))
        );
    }

    #[test]
    fn unknown_interfaces_keep_the_raw_type() {
        let store = ClassStore::new();
        let ctx = DecompileContext::new(&store, "a/Main");
        let n = length_lambda();
        let lambda = n.lambda_expr().unwrap();
        let types = Inferencer::new(&ctx).lambda_types(&n, lambda, None);
        assert_eq!(types.interface_type, VarType::object("java/util/function/Function"));
        assert!(types.params.is_empty());
        assert_eq!(types.return_type, None);
    }
}
