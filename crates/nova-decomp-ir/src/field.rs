use nova_decomp_types::{parse_field_descriptor, VarType};

use crate::exprent::Exprent;

#[derive(Debug, Clone, PartialEq)]
pub struct FieldExprent {
    pub name: String,
    pub owner: String,
    pub descriptor: String,
    /// Erased type from the descriptor.
    pub ty: VarType,
    /// `None` for static fields.
    pub instance: Option<Box<Exprent>>,
}

impl FieldExprent {
    fn build(owner: &str, name: &str, descriptor: &str, instance: Option<Exprent>) -> Self {
        let ty = parse_field_descriptor(descriptor).unwrap_or_else(|err| {
            tracing::warn!(target: "nova.decomp.ir", owner, name, %err, "bad field descriptor");
            VarType::unknown()
        });
        Self {
            name: name.to_string(),
            owner: owner.to_string(),
            descriptor: descriptor.to_string(),
            ty,
            instance: instance.map(Box::new),
        }
    }

    pub fn new_static(owner: &str, name: &str, descriptor: &str) -> Self {
        Self::build(owner, name, descriptor, None)
    }

    pub fn new_instance(instance: Exprent, owner: &str, name: &str, descriptor: &str) -> Self {
        Self::build(owner, name, descriptor, Some(instance))
    }

    pub fn is_static(&self) -> bool {
        self.instance.is_none()
    }
}
