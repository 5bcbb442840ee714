//! The explicit per-method context threaded through inference and emission.

use std::collections::{HashMap, HashSet};

use nova_decomp_text::TextBuffer;
use nova_decomp_types::{
    package_of, AccessFlags, ClassInfo, MethodInfo, NamedGenerics, SymbolDb, VarType,
    JAVA_LANG_OBJECT,
};
use once_cell::sync::Lazy;

use crate::error::EmitError;
use crate::options::DecompilerOptions;
use crate::var::VarTable;

static DEFAULT_OPTIONS: Lazy<DecompilerOptions> = Lazy::new(DecompilerOptions::default);
static EMPTY_VARS: Lazy<VarTable> = Lazy::new(VarTable::new);
static EMPTY_CLASSES: Lazy<ClassNodes> = Lazy::new(ClassNodes::new);
static NO_IMPORTS: Lazy<ImportCollector> = Lazy::new(ImportCollector::new);
static NO_NESTED: NoNestedClasses = NoNestedClasses;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassKind {
    Root,
    Member,
    Anonymous,
    Local,
    Lambda,
}

/// Nesting metadata for one class of the unit being decompiled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassNode {
    pub name: String,
    pub kind: ClassKind,
    /// Source name of member and local classes.
    pub simple_name: Option<String>,
    pub enclosing: Option<String>,
    pub access: AccessFlags,
    /// For anonymous classes: the class or interface they extend, with generic arguments.
    pub base_type: Option<VarType>,
}

impl ClassNode {
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ClassKind::Root,
            simple_name: None,
            enclosing: None,
            access: AccessFlags(AccessFlags::PUBLIC),
            base_type: None,
        }
    }

    pub fn member(name: impl Into<String>, simple_name: impl Into<String>, enclosing: impl Into<String>) -> Self {
        Self {
            kind: ClassKind::Member,
            simple_name: Some(simple_name.into()),
            enclosing: Some(enclosing.into()),
            ..Self::root(name)
        }
    }

    pub fn anonymous(name: impl Into<String>, enclosing: impl Into<String>, base_type: VarType) -> Self {
        Self {
            kind: ClassKind::Anonymous,
            enclosing: Some(enclosing.into()),
            base_type: Some(base_type),
            ..Self::root(name)
        }
    }

    pub fn local(name: impl Into<String>, simple_name: impl Into<String>, enclosing: impl Into<String>) -> Self {
        Self {
            kind: ClassKind::Local,
            ..Self::member(name, simple_name, enclosing)
        }
    }

    pub fn with_access(mut self, access: AccessFlags) -> Self {
        self.access = access;
        self
    }

    pub fn is_static(&self) -> bool {
        self.access.is_static()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClassNodes {
    nodes: HashMap<String, ClassNode>,
}

impl ClassNodes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, node: ClassNode) {
        self.nodes.insert(node.name.clone(), node);
    }

    pub fn with_node(mut self, node: ClassNode) -> Self {
        self.insert(node);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ClassNode> {
        self.nodes.get(name)
    }

    pub fn kind_of(&self, name: &str) -> Option<ClassKind> {
        self.get(name).map(|node| node.kind)
    }

    /// Enclosing classes of `name`, innermost first.
    pub fn enclosing_chain(&self, name: &str) -> Vec<&ClassNode> {
        let mut out = Vec::new();
        let mut current = self.get(name).and_then(|node| node.enclosing.as_deref());
        while let Some(enclosing) = current {
            let Some(node) = self.get(enclosing) else {
                break;
            };
            if out.iter().any(|seen: &&ClassNode| seen.name == node.name) {
                break;
            }
            out.push(node);
            current = node.enclosing.as_deref();
        }
        out
    }

    /// Source spelling of a nested class relative to its outermost class, e.g. `Outer.Inner`.
    fn nested_path(&self, name: &str) -> Option<(String, Vec<String>)> {
        let node = self.get(name)?;
        if node.kind == ClassKind::Root {
            return None;
        }
        let mut path = vec![node.simple_name.clone()?];
        let mut top = node.enclosing.clone()?;
        while let Some(outer) = self.get(&top) {
            match (&outer.kind, &outer.simple_name, &outer.enclosing) {
                (ClassKind::Member, Some(simple), Some(enclosing)) => {
                    path.push(simple.clone());
                    top = enclosing.clone();
                }
                _ => break,
            }
        }
        path.reverse();
        Some((top, path))
    }
}

/// Decides which class names render short. `java.lang`, the current package and explicitly
/// registered imports are short; everything else is fully qualified.
#[derive(Debug, Clone, Default)]
pub struct ImportCollector {
    imports: HashSet<String>,
}

impl ImportCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an internal top-level class name such as `java/util/List`.
    pub fn with_import(mut self, internal_name: impl Into<String>) -> Self {
        self.imports.insert(internal_name.into());
        self
    }

    pub fn short_name(&self, internal_name: &str, current_class: &str, classes: &ClassNodes) -> String {
        if let Some((top, path)) = classes.nested_path(internal_name) {
            if classes.get(internal_name).map(|n| n.kind) == Some(ClassKind::Local) {
                return path.join(".");
            }
            let mut out = self.top_level_name(&top, current_class);
            for part in path {
                out.push('.');
                out.push_str(&part);
            }
            return out;
        }
        let (top, nested) = match internal_name.find('$') {
            Some(idx) if idx > 0 && idx + 1 < internal_name.len() => {
                (&internal_name[..idx], Some(&internal_name[idx + 1..]))
            }
            _ => (internal_name, None),
        };
        let mut out = self.top_level_name(top, current_class);
        if let Some(nested) = nested {
            out.push('.');
            out.push_str(&nested.replace('$', "."));
        }
        out
    }

    fn top_level_name(&self, internal_name: &str, current_class: &str) -> String {
        let package = package_of(internal_name);
        let simple = internal_name.rsplit('/').next().unwrap_or(internal_name);
        if package == "java/lang"
            || package == package_of(current_class)
            || self.imports.contains(internal_name)
        {
            simple.to_string()
        } else {
            internal_name.replace('/', ".")
        }
    }
}

/// Renders the body of an anonymous class created by a `new` expression.
pub trait NestedClassWriter {
    /// Appends ` {`, the members of `class` at `indent + 1`, and the closing brace.
    fn write_anonymous_body(&self, class: &str, buf: &mut TextBuffer, indent: usize) -> Result<(), EmitError>;
}

/// Writes empty bodies; used when no class writer is attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoNestedClasses;

impl NestedClassWriter for NoNestedClasses {
    fn write_anonymous_body(&self, _class: &str, buf: &mut TextBuffer, _indent: usize) -> Result<(), EmitError> {
        buf.append(" {}");
        Ok(())
    }
}

/// Everything inference and emission may consult besides the tree itself.
#[derive(Clone, Copy)]
pub struct DecompileContext<'a> {
    pub symbols: &'a dyn SymbolDb,
    pub current_class: &'a str,
    pub current_method: Option<&'a MethodInfo>,
    pub options: &'a DecompilerOptions,
    pub vars: &'a VarTable,
    pub classes: &'a ClassNodes,
    pub imports: &'a ImportCollector,
    pub nested: &'a dyn NestedClassWriter,
}

impl<'a> DecompileContext<'a> {
    pub fn new(symbols: &'a dyn SymbolDb, current_class: &'a str) -> Self {
        Self {
            symbols,
            current_class,
            current_method: None,
            options: &DEFAULT_OPTIONS,
            vars: &EMPTY_VARS,
            classes: &EMPTY_CLASSES,
            imports: &NO_IMPORTS,
            nested: &NO_NESTED,
        }
    }

    pub fn with_method(mut self, method: &'a MethodInfo) -> Self {
        self.current_method = Some(method);
        self
    }

    pub fn with_options(mut self, options: &'a DecompilerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_vars(mut self, vars: &'a VarTable) -> Self {
        self.vars = vars;
        self
    }

    pub fn with_classes(mut self, classes: &'a ClassNodes) -> Self {
        self.classes = classes;
        self
    }

    pub fn with_imports(mut self, imports: &'a ImportCollector) -> Self {
        self.imports = imports;
        self
    }

    pub fn with_nested(mut self, nested: &'a dyn NestedClassWriter) -> Self {
        self.nested = nested;
        self
    }

    pub fn current_class_info(&self) -> Option<&'a ClassInfo> {
        self.symbols.lookup_class(self.current_class)
    }

    pub fn short_name(&self, internal_name: &str) -> String {
        self.imports
            .short_name(internal_name, self.current_class, self.classes)
    }

    /// Whether `class` is the current class or one of the classes lexically enclosing it.
    pub fn is_current_or_enclosing(&self, class: &str) -> bool {
        class == self.current_class
            || self
                .classes
                .enclosing_chain(self.current_class)
                .iter()
                .any(|node| node.name == class)
    }

    pub fn is_in_class_init(&self) -> bool {
        self.current_method.is_some_and(|m| m.name == "<clinit>")
    }

    /// Type variables in scope with their bounds: the current method's, the current class's,
    /// and those of enclosing classes reachable through non-static nesting.
    pub fn named_generics(&self) -> NamedGenerics {
        let mut named = NamedGenerics::new();
        if let Some(sig) = self.current_method.and_then(|m| m.signature.as_ref()) {
            for param in &sig.type_params {
                named.entry(param.var()).or_insert_with(|| param.bounds.clone());
            }
        }
        let method_is_static = self.current_method.is_some_and(|m| m.access.is_static());
        if method_is_static {
            return named;
        }
        let mut class = Some(self.current_class.to_string());
        while let Some(name) = class {
            if let Some(sig) = self
                .symbols
                .lookup_class(&name)
                .and_then(|info| info.signature.as_ref())
            {
                for param in &sig.type_params {
                    named.entry(param.var()).or_insert_with(|| param.bounds.clone());
                }
            }
            class = match self.classes.get(&name) {
                Some(node) if !node.is_static() && node.kind != ClassKind::Root => {
                    node.enclosing.clone()
                }
                _ => None,
            };
        }
        named
    }

    /// Upper bound of a type variable in scope, `Object` when unknown.
    pub fn bound_of(&self, var: &VarType, named: &NamedGenerics) -> VarType {
        named
            .get(&var.gen_var_key())
            .and_then(|bounds| bounds.first())
            .cloned()
            .unwrap_or_else(|| VarType::object(JAVA_LANG_OBJECT))
    }
}

impl std::fmt::Debug for DecompileContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecompileContext")
            .field("current_class", &self.current_class)
            .field("current_method", &self.current_method.map(|m| &m.name))
            .field("options", self.options)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nova_decomp_types::ClassStore;
    use pretty_assertions::assert_eq;

    #[test]
    fn short_names_follow_packages_and_imports() {
        let imports = ImportCollector::new().with_import("java/util/List");
        let classes = ClassNodes::new();
        let short = |name| imports.short_name(name, "com/acme/Main", &classes);
        assert_eq!(short("java/lang/String"), "String");
        assert_eq!(short("com/acme/Helper"), "Helper");
        assert_eq!(short("java/util/List"), "List");
        assert_eq!(short("java/util/Map"), "java.util.Map");
        assert_eq!(short("java/util/Map$Entry"), "java.util.Map.Entry");
    }

    #[test]
    fn nested_classes_use_their_source_names() {
        let classes = ClassNodes::new()
            .with_node(ClassNode::root("com/acme/Outer"))
            .with_node(ClassNode::member("com/acme/Outer$1Inner", "Inner", "com/acme/Outer"));
        let imports = ImportCollector::new();
        assert_eq!(
            imports.short_name("com/acme/Outer$1Inner", "com/acme/Outer", &classes),
            "Outer.Inner"
        );
    }

    #[test]
    fn static_methods_see_no_class_type_variables() {
        let store = ClassStore::new().with_class(
            ClassInfo::new("a/Box", AccessFlags(AccessFlags::PUBLIC))
                .with_signature("<T:Ljava/lang/Number;>Ljava/lang/Object;"),
        );
        let method = MethodInfo::new("a/Box", "of", "()V", AccessFlags(AccessFlags::STATIC));
        let instance = MethodInfo::new("a/Box", "get", "()V", AccessFlags(AccessFlags::PUBLIC));

        let ctx = DecompileContext::new(&store, "a/Box");
        assert!(ctx.with_method(&method).named_generics().is_empty());
        let named = ctx.with_method(&instance).named_generics();
        assert_eq!(named[&VarType::gen_var("T")], vec![VarType::object("java/lang/Number")]);
    }
}
