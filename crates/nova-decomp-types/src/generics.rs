//! Generic substitution and hierarchy queries over [`VarType`].
//!
//! Substitution maps are keyed by bare type variables: no array dimension, no wildcard.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::symbols::SymbolDb;
use crate::var_type::{TypeKind, VarType, Wildcard};

pub type GenericMap = HashMap<VarType, VarType>;

/// Per-variable bounds of the type variables in scope (`T -> [Comparable<T>]`).
pub type NamedGenerics = HashMap<VarType, Vec<VarType>>;

impl VarType {
    pub fn without_wildcard(&self) -> VarType {
        self.with_wildcard(Wildcard::None)
    }

    /// The substitution key of a type variable reference such as `? extends T[]`.
    pub fn gen_var_key(&self) -> VarType {
        self.resize_array_dim(0).without_wildcard()
    }

    /// Substitutes type variables through `map`, keeping array dimensions and the wildcard of
    /// the substituted position.
    pub fn remap(&self, map: &GenericMap) -> VarType {
        if map.is_empty() {
            return self.clone();
        }
        match self.kind() {
            TypeKind::GenVar => match map.get(&self.gen_var_key()) {
                Some(target) => {
                    let mut out = target.resize_array_dim(target.array_dim() + self.array_dim());
                    if self.wildcard() != Wildcard::None {
                        out = out.with_wildcard(self.wildcard());
                    }
                    out
                }
                None => self.clone(),
            },
            TypeKind::Object if !self.args().is_empty() => self.with_args(
                self.args()
                    .iter()
                    .map(|arg| arg.as_ref().map(|a| a.remap(map)))
                    .collect(),
            ),
            _ => self.clone(),
        }
    }

    /// Records, for every type variable in `self`, the type found at the same position in
    /// `other`. Existing entries win.
    pub fn map_gen_vars_to(&self, other: &VarType, map: &mut GenericMap) {
        match self.kind() {
            TypeKind::GenVar => {
                if other.array_dim() < self.array_dim() || other.kind() == TypeKind::Unknown {
                    return;
                }
                let value = other
                    .resize_array_dim(other.array_dim() - self.array_dim())
                    .without_wildcard();
                map.entry(self.gen_var_key()).or_insert(value);
            }
            TypeKind::Object => {
                if other.kind() != TypeKind::Object || self.args().len() != other.args().len() {
                    return;
                }
                for (mine, theirs) in self.args().iter().zip(other.args()) {
                    if let (Some(mine), Some(theirs)) = (mine, theirs) {
                        mine.map_gen_vars_to(theirs, map);
                    }
                }
            }
            _ => {}
        }
    }

    /// Whether some type variable in this type is absent from `known` (or is the dummy
    /// placeholder).
    pub fn has_unknown_generic(&self, known: &HashSet<VarType>) -> bool {
        match self.kind() {
            TypeKind::GenVar => self.is_dummy_var() || !known.contains(&self.gen_var_key()),
            TypeKind::Object => self
                .args()
                .iter()
                .flatten()
                .any(|arg| arg.has_unknown_generic(known)),
            _ => false,
        }
    }

    /// Every type variable referenced by this type, in first-occurrence order.
    pub fn all_generic_vars(&self) -> Vec<VarType> {
        let mut out = Vec::new();
        self.collect_generic_vars(&mut out);
        out
    }

    fn collect_generic_vars(&self, out: &mut Vec<VarType>) {
        match self.kind() {
            TypeKind::GenVar => {
                let key = self.gen_var_key();
                if !out.contains(&key) {
                    out.push(key);
                }
            }
            TypeKind::Object => {
                for arg in self.args().iter().flatten() {
                    arg.collect_generic_vars(out);
                }
            }
            _ => {}
        }
    }
}

/// The parameterization of `base` as seen from `derived`, e.g. `Collection<String>` for
/// (`ArrayList<String>`, `java/util/Collection`). Returns `None` when `base` is not a supertype
/// known to the symbol database.
pub fn generic_supertype(derived: &VarType, base: &str, db: &dyn SymbolDb) -> Option<VarType> {
    if derived.kind() != TypeKind::Object || derived.array_dim() != 0 {
        return None;
    }
    if derived.name_or_empty() == base {
        return Some(derived.without_wildcard());
    }
    let mut seen = HashSet::new();
    let mut queue = VecDeque::from([derived.without_wildcard()]);
    while let Some(current) = queue.pop_front() {
        if !seen.insert(current.name_or_empty().to_string()) {
            continue;
        }
        let Some(class) = db.lookup_class(current.name_or_empty()) else {
            continue;
        };
        let map = class_binding(class, &current);
        let raw = current.args().is_empty()
            && class
                .signature
                .as_ref()
                .is_some_and(|sig| !sig.type_params.is_empty());
        for parent in class.generic_supertypes() {
            let parent = if raw {
                // Raw use of a generic class erases its supertypes too.
                parent.erasure()
            } else {
                parent.remap(&map)
            };
            if parent.name_or_empty() == base {
                return Some(parent);
            }
            queue.push_back(parent);
        }
    }
    None
}

/// For every generic ancestor of `class`, the binding of that ancestor's type variables in
/// terms of `class`'s own variables: `ArrayList -> {List: {E -> E}, Collection: {E -> E}, ...}`.
pub fn all_generics(class: &str, db: &dyn SymbolDb) -> HashMap<String, GenericMap> {
    let mut out = HashMap::new();
    let Some(info) = db.lookup_class(class) else {
        return out;
    };
    let mut queue = VecDeque::from([info.generic_type()]);
    let mut seen = HashSet::new();
    while let Some(current) = queue.pop_front() {
        if !seen.insert(current.name_or_empty().to_string()) {
            continue;
        }
        let Some(class) = db.lookup_class(current.name_or_empty()) else {
            continue;
        };
        let map = class_binding(class, &current);
        for parent in class.generic_supertypes() {
            let parent = parent.remap(&map);
            if let Some(parent_info) = db.lookup_class(parent.name_or_empty()) {
                let binding = class_binding(parent_info, &parent);
                if !binding.is_empty() {
                    out.entry(parent.name_or_empty().to_string())
                        .or_insert(binding);
                }
            }
            queue.push_back(parent);
        }
    }
    out
}

/// Maps the class's declared type parameters to the arguments of `instance`.
pub fn class_binding(class: &crate::symbols::ClassInfo, instance: &VarType) -> GenericMap {
    let mut map = GenericMap::new();
    let Some(sig) = &class.signature else {
        return map;
    };
    if sig.type_params.len() != instance.args().len() {
        return map;
    }
    for (param, arg) in sig.type_params.iter().zip(instance.args()) {
        let value = match arg {
            Some(arg) => arg.clone(),
            None => param.bounds.first().cloned().unwrap_or_else(VarType::object_type),
        };
        map.insert(param.var(), value);
    }
    map
}

/// Generic-aware assignability of a value of type `from` into a slot of type `to`.
/// `named` supplies the bounds of type variables in scope.
pub fn is_assignable(from: &VarType, to: &VarType, named: &NamedGenerics, db: &dyn SymbolDb) -> bool {
    if from == to || from.is_null() || to.is_dummy_var() || from.is_dummy_var() {
        return true;
    }
    if to.kind() == TypeKind::GenVar {
        return from.kind() == TypeKind::GenVar && from.gen_var_key() == to.gen_var_key()
            && from.array_dim() == to.array_dim();
    }
    if from.kind() == TypeKind::GenVar {
        let key = from.gen_var_key();
        let bounds = named
            .get(&key)
            .cloned()
            .unwrap_or_else(|| vec![VarType::object_type()]);
        return bounds.iter().any(|bound| {
            let bound = bound.resize_array_dim(bound.array_dim() + from.array_dim());
            is_assignable(&bound, to, named, db)
        });
    }
    if to.kind() != TypeKind::Object || from.kind() != TypeKind::Object {
        return to.is_superset(from);
    }
    if to.is_object_class() {
        return true;
    }
    if from.array_dim() != to.array_dim() {
        return false;
    }
    if from.array_dim() > 0 {
        return is_assignable(&from.element_type(), &to.element_type(), named, db);
    }
    let Some(sup) = generic_supertype(&from.without_wildcard(), to.name_or_empty(), db) else {
        return false;
    };
    if to.args().is_empty() || sup.args().is_empty() {
        return true;
    }
    if to.args().len() != sup.args().len() {
        return false;
    }
    to.args().iter().zip(sup.args()).all(|(to_arg, from_arg)| match (to_arg, from_arg) {
        (None, _) => true,
        (Some(_), None) => false,
        (Some(t), Some(f)) => match t.wildcard() {
            Wildcard::Extends => is_assignable(&f.without_wildcard(), &t.without_wildcard(), named, db),
            Wildcard::Super => is_assignable(&t.without_wildcard(), &f.without_wildcard(), named, db),
            Wildcard::None => {
                f.without_wildcard() == *t || t.is_dummy_var() || f.is_dummy_var()
            }
        },
    })
}
