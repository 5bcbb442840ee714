use crate::error::{Error, Result};
use crate::var_type::{TypeKind, VarType};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    pub params: Vec<VarType>,
    pub ret: VarType,
}

impl MethodDescriptor {
    pub fn parse(desc: &str) -> Result<Self> {
        parse_method_descriptor(desc)
    }
}

pub fn parse_field_descriptor(desc: &str) -> Result<VarType> {
    let (ty, rest) = parse_field_type(desc)?;
    if !rest.is_empty() {
        return Err(Error::InvalidDescriptor(desc.to_string()));
    }
    Ok(ty)
}

pub fn parse_method_descriptor(desc: &str) -> Result<MethodDescriptor> {
    let Some(mut rest) = desc.strip_prefix('(') else {
        return Err(Error::InvalidDescriptor(desc.to_string()));
    };

    let mut params = Vec::new();
    loop {
        if let Some(after) = rest.strip_prefix(')') {
            rest = after;
            break;
        }
        if rest.is_empty() {
            return Err(Error::InvalidDescriptor(desc.to_string()));
        }
        let (param, after) = parse_field_type(rest)?;
        params.push(param);
        rest = after;
    }

    let (ret, rest) = if let Some(after) = rest.strip_prefix('V') {
        (VarType::void(), after)
    } else {
        parse_field_type(rest)?
    };
    if !rest.is_empty() {
        return Err(Error::InvalidDescriptor(desc.to_string()));
    }

    Ok(MethodDescriptor { params, ret })
}

/// Maps an internal class name or array descriptor (`java/lang/String`, `[I`) to a type, the
/// way `ldc` class constants and `anewarray` operands name their type.
pub fn parse_class_or_array(name: &str) -> Result<VarType> {
    if name.starts_with('[') {
        parse_field_descriptor(name)
    } else if name.is_empty() {
        Err(Error::InvalidDescriptor(name.to_string()))
    } else {
        Ok(VarType::object(name))
    }
}

fn parse_field_type(input: &str) -> Result<(VarType, &str)> {
    let Some(first) = input.chars().next() else {
        return Err(Error::InvalidDescriptor(input.to_string()));
    };
    let kind = match first {
        'B' => TypeKind::Byte,
        'C' => TypeKind::Char,
        'D' => TypeKind::Double,
        'F' => TypeKind::Float,
        'I' => TypeKind::Int,
        'J' => TypeKind::Long,
        'S' => TypeKind::Short,
        'Z' => TypeKind::Boolean,
        'L' => {
            let Some(end) = input.find(';') else {
                return Err(Error::InvalidDescriptor(input.to_string()));
            };
            let name = &input[1..end];
            if name.is_empty() {
                return Err(Error::InvalidDescriptor(input.to_string()));
            }
            return Ok((VarType::object(name), &input[end + 1..]));
        }
        '[' => {
            let (component, rest) = parse_field_type(&input[1..])?;
            let dim = component.array_dim() + 1;
            return Ok((component.resize_array_dim(dim), rest));
        }
        _ => return Err(Error::InvalidDescriptor(input.to_string())),
    };
    Ok((VarType::primitive(kind), &input[1..]))
}
