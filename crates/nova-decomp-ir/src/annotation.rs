use crate::exprent::Exprent;

/// An annotation use: `@Name`, `@Name(value)` or `@Name(a = x, b = y)`.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationExprent {
    pub class_name: String,
    pub elements: Vec<(String, Exprent)>,
}

impl AnnotationExprent {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            elements: Vec::new(),
        }
    }

    pub fn with_element(mut self, name: impl Into<String>, value: Exprent) -> Self {
        self.elements.push((name.into(), value));
        self
    }
}
