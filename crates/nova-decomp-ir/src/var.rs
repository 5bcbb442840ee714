//! Logical variables and the registry that names and types them.

use std::collections::HashMap;
use std::fmt;

use nova_decomp_types::VarType;

/// A logical variable: local slot plus the SSA-like version assigned during control-flow
/// recovery. Compared by value; the same variable may appear at many places in a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarVersion {
    pub index: u32,
    pub version: u32,
}

impl VarVersion {
    pub const fn new(index: u32, version: u32) -> Self {
        Self { index, version }
    }
}

impl fmt::Display for VarVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.version == 0 {
            write!(f, "var{}", self.index)
        } else {
            write!(f, "var{}_{}", self.index, self.version)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VarInfo {
    pub name: Option<String>,
    /// Declared (possibly generic) type, usually from the local variable type table.
    pub ty: Option<VarType>,
    pub is_final: bool,
    pub effectively_final: bool,
    /// Set for the `this` variable of an instance method: the class it refers to.
    pub this_class: Option<String>,
}

impl VarInfo {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_type(mut self, ty: VarType) -> Self {
        self.ty = Some(ty);
        self
    }

    pub fn with_final(mut self, is_final: bool) -> Self {
        self.is_final = is_final;
        self
    }

    pub fn with_effectively_final(mut self, effectively_final: bool) -> Self {
        self.effectively_final = effectively_final;
        self
    }

    /// Metadata for the `this` variable of `class`.
    pub fn this_of(class: impl Into<String>) -> Self {
        let class = class.into();
        Self {
            name: Some("this".to_string()),
            ty: Some(VarType::object(class.clone())),
            this_class: Some(class),
            ..Self::default()
        }
    }
}

/// Per-method variable metadata keyed by [`VarVersion`].
#[derive(Debug, Clone, Default)]
pub struct VarTable {
    vars: HashMap<VarVersion, VarInfo>,
}

impl VarTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, var: VarVersion, info: VarInfo) -> Option<VarInfo> {
        self.vars.insert(var, info)
    }

    pub fn with_var(mut self, var: VarVersion, info: VarInfo) -> Self {
        self.insert(var, info);
        self
    }

    pub fn get(&self, var: VarVersion) -> Option<&VarInfo> {
        self.vars.get(&var)
    }

    /// Source name; unnamed variables fall back to `var<index>[_<version>]`.
    pub fn name(&self, var: VarVersion) -> String {
        self.get(var)
            .and_then(|info| info.name.clone())
            .unwrap_or_else(|| var.to_string())
    }

    pub fn declared_type(&self, var: VarVersion) -> Option<&VarType> {
        self.get(var).and_then(|info| info.ty.as_ref())
    }

    /// The class a `this` variable refers to.
    pub fn this_class(&self, var: VarVersion) -> Option<&str> {
        self.get(var).and_then(|info| info.this_class.as_deref())
    }

    /// Whether some non-`this` variable of the method is called `name`.
    pub fn has_local_named(&self, name: &str) -> bool {
        self.vars
            .values()
            .any(|info| info.this_class.is_none() && info.name.as_deref() == Some(name))
    }
}

/// A reference to (or the declaration of) a logical variable.
#[derive(Debug, Clone)]
pub struct VarExprent {
    pub var: VarVersion,
    pub ty: VarType,
    /// Renders as a declaration (`Type name`).
    pub definition: bool,
    /// Declaration carries the `final` modifier.
    pub is_final: bool,
    /// Generic type recovered from the local variable type table.
    pub lvt_type: Option<VarType>,
}

impl VarExprent {
    pub fn new(var: VarVersion, ty: VarType) -> Self {
        Self {
            var,
            ty,
            definition: false,
            is_final: false,
            lvt_type: None,
        }
    }

    pub fn definition(mut self) -> Self {
        self.definition = true;
        self
    }

    pub fn with_final(mut self) -> Self {
        self.is_final = true;
        self
    }

    pub fn with_lvt_type(mut self, ty: VarType) -> Self {
        self.lvt_type = Some(ty);
        self
    }

    /// The most precise known type without inference overrides.
    pub(crate) fn declared_type<'t>(&'t self, vars: &'t VarTable) -> &'t VarType {
        self.lvt_type
            .as_ref()
            .or_else(|| vars.declared_type(self.var))
            .unwrap_or(&self.ty)
    }
}

impl PartialEq for VarExprent {
    fn eq(&self, other: &Self) -> bool {
        self.var == other.var && self.ty == other.ty && self.definition == other.definition
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unnamed_variables_fall_back_to_slot_names() {
        let table = VarTable::new().with_var(VarVersion::new(2, 0), VarInfo::named("count"));
        assert_eq!(table.name(VarVersion::new(2, 0)), "count");
        assert_eq!(table.name(VarVersion::new(3, 0)), "var3");
        assert_eq!(table.name(VarVersion::new(3, 4)), "var3_4");
    }

    #[test]
    fn this_is_not_a_local_name() {
        let table = VarTable::new()
            .with_var(VarVersion::new(0, 0), VarInfo::this_of("a/B"))
            .with_var(VarVersion::new(1, 0), VarInfo::named("size"));
        assert!(table.has_local_named("size"));
        assert!(!table.has_local_named("this"));
        assert_eq!(table.this_class(VarVersion::new(0, 0)), Some("a/B"));
    }
}
