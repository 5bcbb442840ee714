//! Read-only class metadata consumed by inference and emission.

use std::collections::{HashSet, VecDeque};

use crate::descriptor::{parse_field_descriptor, parse_method_descriptor, MethodDescriptor};
use crate::signature::{
    parse_class_signature, parse_field_signature, parse_method_signature, ClassSignature,
    MethodSignature,
};
use crate::var_type::{VarType, JAVA_LANG_OBJECT};

/// JVM access and property flags (JVMS §4.1, §4.5, §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AccessFlags(pub u16);

impl AccessFlags {
    pub const PUBLIC: u16 = 0x0001;
    pub const PRIVATE: u16 = 0x0002;
    pub const PROTECTED: u16 = 0x0004;
    pub const STATIC: u16 = 0x0008;
    pub const FINAL: u16 = 0x0010;
    pub const BRIDGE: u16 = 0x0040;
    pub const VARARGS: u16 = 0x0080;
    pub const INTERFACE: u16 = 0x0200;
    pub const ABSTRACT: u16 = 0x0400;
    pub const SYNTHETIC: u16 = 0x1000;
    pub const ENUM: u16 = 0x4000;

    pub fn has(self, flag: u16) -> bool {
        self.0 & flag != 0
    }

    pub fn with(self, flag: u16) -> Self {
        Self(self.0 | flag)
    }

    pub fn is_public(self) -> bool {
        self.has(Self::PUBLIC)
    }
    pub fn is_private(self) -> bool {
        self.has(Self::PRIVATE)
    }
    pub fn is_protected(self) -> bool {
        self.has(Self::PROTECTED)
    }
    pub fn is_static(self) -> bool {
        self.has(Self::STATIC)
    }
    pub fn is_final(self) -> bool {
        self.has(Self::FINAL)
    }
    pub fn is_interface(self) -> bool {
        self.has(Self::INTERFACE)
    }
    pub fn is_enum(self) -> bool {
        self.has(Self::ENUM)
    }
    pub fn is_varargs(self) -> bool {
        self.has(Self::VARARGS)
    }
    pub fn is_synthetic(self) -> bool {
        self.has(Self::SYNTHETIC)
    }
}

#[derive(Debug, Clone)]
pub struct FieldInfo {
    pub owner: String,
    pub name: String,
    pub descriptor: String,
    /// Erased type from the descriptor.
    pub ty: VarType,
    pub access: AccessFlags,
    pub signature: Option<VarType>,
}

impl FieldInfo {
    pub fn new(owner: &str, name: &str, descriptor: &str, access: AccessFlags) -> Self {
        let ty = parse_field_descriptor(descriptor).unwrap_or_else(|err| {
            tracing::warn!(target: "nova.decomp.types", owner, name, %err, "bad field descriptor");
            VarType::unknown()
        });
        Self {
            owner: owner.to_string(),
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            ty,
            access,
            signature: None,
        }
    }

    /// Attaches a generic signature; a malformed one is logged and ignored.
    pub fn with_signature(mut self, signature: &str) -> Self {
        match parse_field_signature(signature) {
            Ok(sig) => self.signature = Some(sig),
            Err(err) => tracing::warn!(
                target: "nova.decomp.types",
                owner = %self.owner,
                name = %self.name,
                %err,
                "ignoring malformed field signature"
            ),
        }
        self
    }

    /// Generic type when known, otherwise the descriptor type.
    pub fn generic_type(&self) -> &VarType {
        self.signature.as_ref().unwrap_or(&self.ty)
    }
}

#[derive(Debug, Clone)]
pub struct MethodInfo {
    pub owner: String,
    pub name: String,
    pub descriptor: String,
    pub parsed: MethodDescriptor,
    pub access: AccessFlags,
    pub signature: Option<MethodSignature>,
}

impl MethodInfo {
    pub fn new(owner: &str, name: &str, descriptor: &str, access: AccessFlags) -> Self {
        let parsed = parse_method_descriptor(descriptor).unwrap_or_else(|err| {
            tracing::warn!(target: "nova.decomp.types", owner, name, %err, "bad method descriptor");
            MethodDescriptor {
                params: Vec::new(),
                ret: VarType::unknown(),
            }
        });
        Self {
            owner: owner.to_string(),
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            parsed,
            access,
            signature: None,
        }
    }

    /// Attaches a generic signature. Signatures that are malformed or whose parameter count
    /// disagrees with the descriptor (synthetic outer-instance parameters) are dropped.
    pub fn with_signature(mut self, signature: &str) -> Self {
        match parse_method_signature(signature) {
            Ok(sig) if sig.params.len() == self.parsed.params.len() => self.signature = Some(sig),
            Ok(_) => tracing::debug!(
                target: "nova.decomp.types",
                owner = %self.owner,
                name = %self.name,
                "method signature arity differs from descriptor"
            ),
            Err(err) => tracing::warn!(
                target: "nova.decomp.types",
                owner = %self.owner,
                name = %self.name,
                %err,
                "ignoring malformed method signature"
            ),
        }
        self
    }

    pub fn is_constructor(&self) -> bool {
        self.name == "<init>"
    }

    pub fn generic_params(&self) -> &[VarType] {
        match &self.signature {
            Some(sig) => &sig.params,
            None => &self.parsed.params,
        }
    }

    pub fn generic_return(&self) -> &VarType {
        match &self.signature {
            Some(sig) => &sig.ret,
            None => &self.parsed.ret,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClassInfo {
    pub name: String,
    pub access: AccessFlags,
    pub super_class: Option<String>,
    pub interfaces: Vec<String>,
    pub signature: Option<ClassSignature>,
    pub fields: Vec<FieldInfo>,
    pub methods: Vec<MethodInfo>,
}

impl ClassInfo {
    pub fn new(name: &str, access: AccessFlags) -> Self {
        Self {
            name: name.to_string(),
            access,
            super_class: (name != JAVA_LANG_OBJECT).then(|| JAVA_LANG_OBJECT.to_string()),
            interfaces: Vec::new(),
            signature: None,
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn with_super(mut self, super_class: &str) -> Self {
        self.super_class = Some(super_class.to_string());
        self
    }

    pub fn with_interface(mut self, interface: &str) -> Self {
        self.interfaces.push(interface.to_string());
        self
    }

    pub fn with_signature(mut self, signature: &str) -> Self {
        match parse_class_signature(signature) {
            Ok(sig) => self.signature = Some(sig),
            Err(err) => tracing::warn!(
                target: "nova.decomp.types",
                class = %self.name,
                %err,
                "ignoring malformed class signature"
            ),
        }
        self
    }

    pub fn with_field(mut self, field: FieldInfo) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_method(mut self, method: MethodInfo) -> Self {
        self.methods.push(method);
        self
    }

    pub fn is_interface(&self) -> bool {
        self.access.is_interface()
    }

    pub fn is_enum(&self) -> bool {
        self.access.is_enum()
    }

    pub fn field(&self, name: &str, descriptor: Option<&str>) -> Option<&FieldInfo> {
        self.fields
            .iter()
            .find(|f| f.name == name && descriptor.map_or(true, |d| f.descriptor == d))
    }

    pub fn method(&self, name: &str, descriptor: &str) -> Option<&MethodInfo> {
        self.methods
            .iter()
            .find(|m| m.name == name && m.descriptor == descriptor)
    }

    pub fn methods_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a MethodInfo> + 'a {
        self.methods.iter().filter(move |m| m.name == name)
    }

    /// Names of the enum constants in declaration order.
    pub fn enum_constants(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.access.is_enum() && f.access.is_static())
            .map(|f| f.name.as_str())
            .collect()
    }

    /// Direct supertypes with their generic arguments as declared by this class.
    pub fn generic_supertypes(&self) -> Vec<VarType> {
        if let Some(sig) = &self.signature {
            let mut out = vec![sig.super_class.clone()];
            out.extend(sig.interfaces.iter().cloned());
            return out;
        }
        self.super_class
            .iter()
            .chain(self.interfaces.iter())
            .map(VarType::object)
            .collect()
    }

    /// The class parameterized by its own type variables, or its erasure when not generic.
    pub fn generic_type(&self) -> VarType {
        match &self.signature {
            Some(sig) => sig.generic_type(&self.name),
            None => VarType::object(self.name.clone()),
        }
    }
}

/// Queries into loaded class metadata. Implementations must be safe to share between threads
/// decompiling different methods.
pub trait SymbolDb: Sync {
    fn lookup_class(&self, name: &str) -> Option<&ClassInfo>;

    /// Reflexive subtype check. `java/lang/Object` is a supertype of every class, known or not.
    fn is_subtype(&self, sub: &str, sup: &str) -> bool {
        if sub == sup || sup == JAVA_LANG_OBJECT {
            return true;
        }
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([sub.to_string()]);
        while let Some(name) = queue.pop_front() {
            if !seen.insert(name.clone()) {
                continue;
            }
            let Some(class) = self.lookup_class(&name) else {
                continue;
            };
            for parent in class.super_class.iter().chain(class.interfaces.iter()) {
                if parent == sup {
                    return true;
                }
                queue.push_back(parent.clone());
            }
        }
        false
    }

    fn lookup_method(&self, class: &str, name: &str, descriptor: &str) -> Option<&MethodInfo> {
        self.lookup_class(class)?.method(name, descriptor)
    }

    fn lookup_field(&self, class: &str, name: &str, descriptor: Option<&str>) -> Option<&FieldInfo> {
        self.lookup_class(class)?.field(name, descriptor)
    }

    /// Breadth-first over the superclass then interfaces, starting at `class` itself.
    fn lookup_method_recursive(
        &self,
        class: &str,
        name: &str,
        descriptor: &str,
    ) -> Option<&MethodInfo> {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([class.to_string()]);
        while let Some(current) = queue.pop_front() {
            if !seen.insert(current.clone()) {
                continue;
            }
            let Some(info) = self.lookup_class(&current) else {
                continue;
            };
            if let Some(method) = info.method(name, descriptor) {
                return Some(method);
            }
            queue.extend(info.super_class.iter().cloned());
            queue.extend(info.interfaces.iter().cloned());
        }
        None
    }

    fn lookup_field_recursive(&self, class: &str, name: &str) -> Option<&FieldInfo> {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([class.to_string()]);
        while let Some(current) = queue.pop_front() {
            if !seen.insert(current.clone()) {
                continue;
            }
            let Some(info) = self.lookup_class(&current) else {
                continue;
            };
            if let Some(field) = info.field(name, None) {
                return Some(field);
            }
            queue.extend(info.super_class.iter().cloned());
            queue.extend(info.interfaces.iter().cloned());
        }
        None
    }
}

/// Package part of an internal class name (`java/util` for `java/util/List`, `""` for the
/// default package).
pub fn package_of(name: &str) -> &str {
    name.rfind('/').map_or("", |idx| &name[..idx])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_signatures_keep_descriptor_types() {
        let method = MethodInfo::new("a/B", "m", "(I)Ljava/lang/Object;", AccessFlags::default())
            .with_signature("(I)TT");
        assert!(method.signature.is_none());
        assert_eq!(method.generic_return(), &VarType::object_type());
    }

    #[test]
    fn enum_constants_come_from_enum_fields() {
        let flags = AccessFlags(AccessFlags::PUBLIC | AccessFlags::STATIC | AccessFlags::ENUM);
        let class = ClassInfo::new("a/Color", AccessFlags(AccessFlags::ENUM))
            .with_super("java/lang/Enum")
            .with_field(FieldInfo::new("a/Color", "RED", "La/Color;", flags))
            .with_field(FieldInfo::new("a/Color", "GREEN", "La/Color;", flags))
            .with_field(FieldInfo::new("a/Color", "$VALUES", "[La/Color;", AccessFlags(AccessFlags::STATIC)));
        assert_eq!(class.enum_constants(), vec!["RED", "GREEN"]);
    }

    #[test]
    fn package_of_default_package_is_empty() {
        assert_eq!(package_of("java/util/List"), "java/util");
        assert_eq!(package_of("Main"), "");
    }
}
