//! The semantic type model shared by the expression tree and the inference pass.
//!
//! [`VarType`] describes a JVM type as the decompiler sees it: a primitive kind, an object or
//! generic-variable name, an array dimension, and (for types coming from generic signatures)
//! type arguments with an optional wildcard. Values are immutable; every "modifying" operation
//! returns a new value.

use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::symbols::SymbolDb;

pub const JAVA_LANG_OBJECT: &str = "java/lang/Object";
pub const JAVA_LANG_STRING: &str = "java/lang/String";
pub const JAVA_LANG_CLASS: &str = "java/lang/Class";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeKind {
    Byte,
    Char,
    Double,
    Float,
    Int,
    Long,
    Short,
    Boolean,
    Object,
    Void,
    Null,
    /// An integer value that fits both `byte` and `char` (0..=127).
    ByteChar,
    /// An integer value that fits both `short` and `char` (0..=32767).
    ShortChar,
    Unknown,
    GenVar,
}

impl TypeKind {
    pub fn is_primitive(self) -> bool {
        !matches!(
            self,
            TypeKind::Object | TypeKind::Null | TypeKind::GenVar | TypeKind::Unknown | TypeKind::Void
        )
    }

    /// Java keyword for primitive kinds; the decompiler-internal kinds map to the narrowest
    /// keyword that can hold them.
    pub fn keyword(self) -> Option<&'static str> {
        Some(match self {
            TypeKind::Byte => "byte",
            TypeKind::Char => "char",
            TypeKind::Double => "double",
            TypeKind::Float => "float",
            TypeKind::Int => "int",
            TypeKind::Long => "long",
            TypeKind::Short => "short",
            TypeKind::Boolean => "boolean",
            TypeKind::ByteChar => "byte",
            TypeKind::ShortChar => "short",
            TypeKind::Void => "void",
            _ => return None,
        })
    }

    fn descriptor_char(self) -> Option<char> {
        Some(match self {
            TypeKind::Byte | TypeKind::ByteChar => 'B',
            TypeKind::Char => 'C',
            TypeKind::Double => 'D',
            TypeKind::Float => 'F',
            TypeKind::Int => 'I',
            TypeKind::Long => 'J',
            TypeKind::Short | TypeKind::ShortChar => 'S',
            TypeKind::Boolean => 'Z',
            TypeKind::Void => 'V',
            _ => return None,
        })
    }
}

/// Groups of kinds between which values widen without an explicit conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeFamily {
    Unknown,
    Boolean,
    Integer,
    Float,
    Long,
    Double,
    Object,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Wildcard {
    #[default]
    None,
    Extends,
    Super,
}

#[derive(Debug, Clone)]
pub struct VarType {
    kind: TypeKind,
    array_dim: u32,
    name: Option<String>,
    /// Type arguments; `None` is the unbounded wildcard `?`.
    args: Vec<Option<VarType>>,
    wildcard: Wildcard,
    /// A boolean that is really an int other than `0`/`1`. Ignored by equality.
    false_boolean: bool,
}

impl PartialEq for VarType {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.array_dim == other.array_dim
            && self.name == other.name
            && self.args == other.args
            && self.wildcard == other.wildcard
    }
}

impl Eq for VarType {}

impl Hash for VarType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.array_dim.hash(state);
        self.name.hash(state);
        self.args.hash(state);
        self.wildcard.hash(state);
    }
}

impl VarType {
    pub fn primitive(kind: TypeKind) -> Self {
        debug_assert!(!matches!(kind, TypeKind::Object | TypeKind::GenVar));
        Self {
            kind,
            array_dim: 0,
            name: None,
            args: Vec::new(),
            wildcard: Wildcard::None,
            false_boolean: false,
        }
    }

    pub fn object(name: impl Into<String>) -> Self {
        Self {
            kind: TypeKind::Object,
            array_dim: 0,
            name: Some(name.into()),
            args: Vec::new(),
            wildcard: Wildcard::None,
            false_boolean: false,
        }
    }

    pub fn generic(name: impl Into<String>, args: Vec<Option<VarType>>) -> Self {
        Self {
            args,
            ..Self::object(name)
        }
    }

    pub fn gen_var(name: impl Into<String>) -> Self {
        Self {
            kind: TypeKind::GenVar,
            ..Self::object(name)
        }
    }

    /// Placeholder for a generic variable whose binding could not be inferred. Renders as the
    /// diamond `<>` when it is the only type argument.
    pub fn dummy_var() -> Self {
        Self::gen_var("")
    }

    pub fn int() -> Self {
        Self::primitive(TypeKind::Int)
    }
    pub fn long() -> Self {
        Self::primitive(TypeKind::Long)
    }
    pub fn float() -> Self {
        Self::primitive(TypeKind::Float)
    }
    pub fn double() -> Self {
        Self::primitive(TypeKind::Double)
    }
    pub fn boolean() -> Self {
        Self::primitive(TypeKind::Boolean)
    }
    pub fn char() -> Self {
        Self::primitive(TypeKind::Char)
    }
    pub fn byte() -> Self {
        Self::primitive(TypeKind::Byte)
    }
    pub fn short() -> Self {
        Self::primitive(TypeKind::Short)
    }
    pub fn byte_char() -> Self {
        Self::primitive(TypeKind::ByteChar)
    }
    pub fn short_char() -> Self {
        Self::primitive(TypeKind::ShortChar)
    }
    pub fn void() -> Self {
        Self::primitive(TypeKind::Void)
    }
    pub fn null() -> Self {
        Self::primitive(TypeKind::Null)
    }
    pub fn unknown() -> Self {
        Self::primitive(TypeKind::Unknown)
    }
    pub fn object_type() -> Self {
        Self::object(JAVA_LANG_OBJECT)
    }
    pub fn string() -> Self {
        Self::object(JAVA_LANG_STRING)
    }
    pub fn class_type() -> Self {
        Self::object(JAVA_LANG_CLASS)
    }

    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    pub fn array_dim(&self) -> u32 {
        self.array_dim
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Class or variable name, or `""` for primitives.
    pub fn name_or_empty(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    pub fn args(&self) -> &[Option<VarType>] {
        &self.args
    }

    pub fn wildcard(&self) -> Wildcard {
        self.wildcard
    }

    pub fn is_false_boolean(&self) -> bool {
        self.false_boolean
    }

    pub fn family(&self) -> TypeFamily {
        if self.array_dim > 0 {
            return TypeFamily::Object;
        }
        match self.kind {
            TypeKind::Byte
            | TypeKind::Char
            | TypeKind::Short
            | TypeKind::Int
            | TypeKind::ByteChar
            | TypeKind::ShortChar => TypeFamily::Integer,
            TypeKind::Boolean => TypeFamily::Boolean,
            TypeKind::Float => TypeFamily::Float,
            TypeKind::Long => TypeFamily::Long,
            TypeKind::Double => TypeFamily::Double,
            TypeKind::Object | TypeKind::Null | TypeKind::GenVar => TypeFamily::Object,
            TypeKind::Void | TypeKind::Unknown => TypeFamily::Unknown,
        }
    }

    pub fn is_generic(&self) -> bool {
        self.kind == TypeKind::GenVar || !self.args.is_empty() || self.wildcard != Wildcard::None
    }

    pub fn is_dummy_var(&self) -> bool {
        self.kind == TypeKind::GenVar && self.name.as_deref() == Some("")
    }

    /// `java/lang/Object` with no array dimension.
    pub fn is_object_class(&self) -> bool {
        self.kind == TypeKind::Object
            && self.array_dim == 0
            && self.name.as_deref() == Some(JAVA_LANG_OBJECT)
    }

    pub fn is_class_named(&self, name: &str) -> bool {
        self.kind == TypeKind::Object && self.array_dim == 0 && self.name.as_deref() == Some(name)
    }

    pub fn is_null(&self) -> bool {
        self.kind == TypeKind::Null
    }

    pub fn with_false_boolean(&self, flag: bool) -> Self {
        Self {
            false_boolean: flag,
            ..self.clone()
        }
    }

    pub fn with_wildcard(&self, wildcard: Wildcard) -> Self {
        Self {
            wildcard,
            ..self.clone()
        }
    }

    pub fn with_args(&self, args: Vec<Option<VarType>>) -> Self {
        Self {
            args,
            ..self.clone()
        }
    }

    pub fn resize_array_dim(&self, dim: u32) -> Self {
        Self {
            array_dim: dim,
            ..self.clone()
        }
    }

    /// One dimension less; saturates at zero.
    pub fn decrease_array_dim(&self) -> Self {
        self.resize_array_dim(self.array_dim.saturating_sub(1))
    }

    pub fn element_type(&self) -> Self {
        self.resize_array_dim(0)
    }

    /// Same type without generic arguments and wildcard.
    pub fn erasure(&self) -> Self {
        Self {
            kind: self.kind,
            array_dim: self.array_dim,
            name: self.name.clone(),
            args: Vec::new(),
            wildcard: Wildcard::None,
            false_boolean: self.false_boolean,
        }
    }

    pub fn same_erasure(&self, other: &VarType) -> bool {
        self.kind == other.kind && self.array_dim == other.array_dim && self.name == other.name
    }

    pub fn is_superset(&self, other: &VarType) -> bool {
        self.same_erasure(other) || self.is_strict_superset(other)
    }

    pub fn is_strict_superset(&self, other: &VarType) -> bool {
        if other.kind == TypeKind::Unknown && self.kind != TypeKind::Unknown {
            return true;
        }
        if other.array_dim > 0 {
            return self.is_object_class();
        }
        if self.array_dim > 0 {
            return other.kind == TypeKind::Null;
        }

        use TypeKind::*;
        match self.kind {
            Int => matches!(other.kind, Short | Char | Byte | ShortChar | ByteChar),
            Short => matches!(other.kind, Byte | ShortChar | ByteChar),
            Char => matches!(other.kind, ShortChar | ByteChar),
            Byte | ShortChar => other.kind == ByteChar,
            Object => {
                if other.kind == Null {
                    true
                } else if self.is_object_class() {
                    other.kind == Object && !other.is_object_class()
                } else {
                    false
                }
            }
            _ => false,
        }
    }

    /// Structural superset check extended with object instance-of through the symbol database.
    pub fn is_superset_in(&self, other: &VarType, db: &dyn SymbolDb) -> bool {
        if self.is_superset(other) {
            return true;
        }
        self.kind == TypeKind::Object
            && other.kind == TypeKind::Object
            && self.array_dim == other.array_dim
            && db.is_subtype(other.name_or_empty(), self.name_or_empty())
    }

    pub fn min_type_in_family(family: TypeFamily) -> Option<VarType> {
        Some(match family {
            TypeFamily::Boolean => Self::boolean(),
            TypeFamily::Integer => Self::byte_char(),
            TypeFamily::Object => Self::null(),
            TypeFamily::Float => Self::float(),
            TypeFamily::Long => Self::long(),
            TypeFamily::Double => Self::double(),
            TypeFamily::Unknown => return None,
        })
    }

    /// Narrowest type both values widen to, or `None` when the types do not unify.
    ///
    /// Object types resolve to their closest shared superclass or interface other than `Object`
    /// when the symbol database knows both hierarchies.
    pub fn common_supertype(a: &VarType, b: &VarType, db: &dyn SymbolDb) -> Option<VarType> {
        if a.kind == TypeKind::Boolean && b.kind == TypeKind::Boolean && a.array_dim == 0 && b.array_dim == 0 {
            return Some(if a.false_boolean { b.clone() } else { a.clone() });
        }
        if a.is_superset_in(b, db) {
            return Some(a.clone());
        }
        if b.is_superset_in(a, db) {
            return Some(b.clone());
        }
        if a.family() != b.family() {
            return None;
        }
        match a.family() {
            TypeFamily::Integer => {
                if matches!(
                    (a.kind, b.kind),
                    (TypeKind::ShortChar, TypeKind::Byte) | (TypeKind::Byte, TypeKind::ShortChar)
                ) {
                    Some(Self::short())
                } else {
                    Some(Self::int())
                }
            }
            TypeFamily::Object => common_object_supertype(a, b, db),
            _ => None,
        }
    }

    /// Widest type that widens to both values; the dual of [`VarType::common_supertype`].
    pub fn common_min_type(a: &VarType, b: &VarType) -> Option<VarType> {
        if a.kind == TypeKind::Boolean && b.kind == TypeKind::Boolean && a.array_dim == 0 && b.array_dim == 0 {
            return Some(if a.false_boolean { a.clone() } else { b.clone() });
        }
        if a.is_superset(b) {
            return Some(b.clone());
        }
        if b.is_superset(a) {
            return Some(a.clone());
        }
        if a.family() != b.family() {
            return None;
        }
        match a.family() {
            TypeFamily::Integer => {
                if matches!(
                    (a.kind, b.kind),
                    (TypeKind::Char, TypeKind::Short) | (TypeKind::Short, TypeKind::Char)
                ) {
                    Some(Self::short_char())
                } else {
                    Some(Self::byte_char())
                }
            }
            TypeFamily::Object => Some(Self::null()),
            _ => None,
        }
    }

    /// Parses a single field descriptor or field signature fragment such as `I`,
    /// `Ljava/util/List<TT;>;` or `TT;`, falling back to [`VarType::unknown`] on malformed
    /// input.
    pub fn parse_lenient(text: &str) -> VarType {
        crate::signature::parse_field_signature(text)
            .or_else(|_| crate::descriptor::parse_field_descriptor(text))
            .unwrap_or_else(|err| {
                tracing::warn!(target: "nova.decomp.types", %err, "unparseable type fragment");
                VarType::unknown()
            })
    }
}

fn common_object_supertype(a: &VarType, b: &VarType, db: &dyn SymbolDb) -> Option<VarType> {
    if a.array_dim != b.array_dim {
        return None;
    }
    if a.array_dim > 0 {
        return common_object_supertype(&a.element_type(), &b.element_type(), db)
            .map(|ty| ty.resize_array_dim(a.array_dim));
    }
    if a.kind != TypeKind::Object || b.kind != TypeKind::Object {
        return None;
    }

    // Nearest ancestor first; superclasses before interfaces at equal depth.
    let mut seen = HashSet::new();
    let mut queue: VecDeque<String> = db
        .lookup_class(a.name_or_empty())
        .map(|cls| cls.super_class.iter().chain(cls.interfaces.iter()).cloned().collect())
        .unwrap_or_default();
    while let Some(name) = queue.pop_front() {
        if name == JAVA_LANG_OBJECT || !seen.insert(name.clone()) {
            continue;
        }
        if db.is_subtype(b.name_or_empty(), &name) {
            return Some(VarType::object(name));
        }
        if let Some(cls) = db.lookup_class(&name) {
            queue.extend(cls.super_class.iter().chain(cls.interfaces.iter()).cloned());
        }
    }
    tracing::debug!(
        target: "nova.decomp.types",
        a = %a,
        b = %b,
        "no common supertype below java/lang/Object"
    );
    None
}

impl fmt::Display for VarType {
    /// Signature notation: `I`, `[Ljava/lang/String;`, `Ljava/util/List<TT;>;`, `TT;`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.wildcard {
            Wildcard::None => {}
            Wildcard::Extends => f.write_str("+")?,
            Wildcard::Super => f.write_str("-")?,
        }
        for _ in 0..self.array_dim {
            f.write_str("[")?;
        }
        match self.kind {
            TypeKind::Object => {
                write!(f, "L{}", self.name_or_empty())?;
                if !self.args.is_empty() {
                    f.write_str("<")?;
                    for arg in &self.args {
                        match arg {
                            Some(arg) => write!(f, "{arg}")?,
                            None => f.write_str("*")?,
                        }
                    }
                    f.write_str(">")?;
                }
                f.write_str(";")
            }
            TypeKind::GenVar => write!(f, "T{};", self.name_or_empty()),
            TypeKind::Null => f.write_str("<null>"),
            TypeKind::Unknown => f.write_str("<unknown>"),
            kind => match kind.descriptor_char() {
                Some(c) => write!(f, "{c}"),
                None => f.write_str("?"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ClassStore;

    #[test]
    fn integer_widening_is_transitive() {
        let int = VarType::int();
        for kind in [
            TypeKind::Short,
            TypeKind::Char,
            TypeKind::Byte,
            TypeKind::ShortChar,
            TypeKind::ByteChar,
        ] {
            assert!(int.is_strict_superset(&VarType::primitive(kind)), "{kind:?}");
        }
        assert!(VarType::char().is_superset(&VarType::byte_char()));
        assert!(!VarType::char().is_superset(&VarType::byte()));
        assert!(!VarType::byte().is_superset(&VarType::char()));
    }

    #[test]
    fn arrays_only_widen_to_object() {
        let arr = VarType::string().resize_array_dim(1);
        assert!(VarType::object_type().is_superset(&arr));
        assert!(!VarType::string().is_superset(&arr));
        assert!(arr.is_superset(&VarType::null()));
    }

    #[test]
    fn common_supertype_of_integers() {
        let db = ClassStore::new();
        assert_eq!(
            VarType::common_supertype(&VarType::byte(), &VarType::short_char(), &db),
            Some(VarType::short())
        );
        assert_eq!(
            VarType::common_supertype(&VarType::char(), &VarType::short(), &db),
            Some(VarType::int())
        );
        assert_eq!(
            VarType::common_min_type(&VarType::char(), &VarType::short()),
            Some(VarType::short_char())
        );
        assert_eq!(VarType::common_supertype(&VarType::int(), &VarType::long(), &db), None);
    }

    #[test]
    fn equality_ignores_false_boolean_flag() {
        assert_eq!(VarType::boolean(), VarType::boolean().with_false_boolean(true));
    }

    #[test]
    fn display_uses_signature_notation() {
        let list = VarType::generic("java/util/List", vec![Some(VarType::gen_var("T")), None]);
        assert_eq!(list.resize_array_dim(1).to_string(), "[Ljava/util/List<TT;*>;");
        assert_eq!(
            VarType::string().with_wildcard(Wildcard::Super).to_string(),
            "-Ljava/lang/String;"
        );
    }
}
