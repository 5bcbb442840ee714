use std::collections::HashMap;

use crate::symbols::{AccessFlags, ClassInfo, SymbolDb};
use crate::var_type::JAVA_LANG_OBJECT;

/// In-memory [`SymbolDb`] keyed by internal class name.
#[derive(Debug, Clone)]
pub struct ClassStore {
    classes: HashMap<String, ClassInfo>,
}

impl Default for ClassStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassStore {
    /// A store that already knows `java/lang/Object`.
    pub fn new() -> Self {
        let mut classes = HashMap::new();
        classes.insert(
            JAVA_LANG_OBJECT.to_string(),
            ClassInfo::new(JAVA_LANG_OBJECT, AccessFlags(AccessFlags::PUBLIC)),
        );
        Self { classes }
    }

    /// Inserts or replaces a class, returning the previous definition.
    pub fn insert(&mut self, class: ClassInfo) -> Option<ClassInfo> {
        self.classes.insert(class.name.clone(), class)
    }

    pub fn with_class(mut self, class: ClassInfo) -> Self {
        self.insert(class);
        self
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn class_names(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(String::as_str)
    }
}

impl SymbolDb for ClassStore {
    fn lookup_class(&self, name: &str) -> Option<&ClassInfo> {
        self.classes.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::MethodInfo;

    fn store() -> ClassStore {
        ClassStore::new()
            .with_class(ClassInfo::new("a/Base", AccessFlags(AccessFlags::PUBLIC)).with_interface("a/Marker"))
            .with_class(ClassInfo::new("a/Marker", AccessFlags(AccessFlags::INTERFACE)))
            .with_class(
                ClassInfo::new("a/Derived", AccessFlags(AccessFlags::PUBLIC))
                    .with_super("a/Base")
                    .with_method(MethodInfo::new("a/Derived", "run", "()V", AccessFlags::default())),
            )
    }

    #[test]
    fn subtype_walks_superclasses_and_interfaces() {
        let db = store();
        assert!(db.is_subtype("a/Derived", "a/Base"));
        assert!(db.is_subtype("a/Derived", "a/Marker"));
        assert!(db.is_subtype("a/Unknown", JAVA_LANG_OBJECT));
        assert!(!db.is_subtype("a/Base", "a/Derived"));
    }

    #[test]
    fn recursive_method_lookup_starts_at_the_class() {
        let db = store();
        assert!(db.lookup_method_recursive("a/Derived", "run", "()V").is_some());
        assert!(db.lookup_method_recursive("a/Base", "run", "()V").is_none());
    }
}
