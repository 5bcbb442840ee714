//! Parsers for the JVM `Signature` attribute grammar (JVMS §4.7.9.1).
//!
//! Nested class type arguments of the enclosing class (`LOuter<TT;>.Inner;`) are dropped; the
//! resulting type is named `Outer$Inner` and carries only the innermost arguments.

use crate::error::{Error, Result};
use crate::var_type::{TypeKind, VarType, Wildcard};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeParam {
    pub name: String,
    /// Class bound followed by interface bounds; never empty (defaults to `Object`).
    pub bounds: Vec<VarType>,
}

impl TypeParam {
    pub fn var(&self) -> VarType {
        VarType::gen_var(self.name.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassSignature {
    pub type_params: Vec<TypeParam>,
    pub super_class: VarType,
    pub interfaces: Vec<VarType>,
}

impl ClassSignature {
    /// The class itself parameterized by its own type variables, e.g. `Map<K, V>`.
    pub fn generic_type(&self, class_name: &str) -> VarType {
        VarType::generic(
            class_name,
            self.type_params.iter().map(|tp| Some(tp.var())).collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSignature {
    pub type_params: Vec<TypeParam>,
    pub params: Vec<VarType>,
    pub ret: VarType,
    pub exceptions: Vec<VarType>,
}

pub fn parse_class_signature(signature: &str) -> Result<ClassSignature> {
    let mut p = Parser::new(signature);
    let type_params = p.type_params()?;
    let super_class = p.class_type()?;
    let mut interfaces = Vec::new();
    while !p.at_end() {
        interfaces.push(p.class_type()?);
    }
    Ok(ClassSignature {
        type_params,
        super_class,
        interfaces,
    })
}

pub fn parse_method_signature(signature: &str) -> Result<MethodSignature> {
    let mut p = Parser::new(signature);
    let type_params = p.type_params()?;
    p.expect(b'(')?;
    let mut params = Vec::new();
    while p.peek() != Some(b')') {
        params.push(p.type_signature()?);
    }
    p.expect(b')')?;
    let ret = if p.peek() == Some(b'V') {
        p.pos += 1;
        VarType::void()
    } else {
        p.type_signature()?
    };
    let mut exceptions = Vec::new();
    while p.peek() == Some(b'^') {
        p.pos += 1;
        exceptions.push(p.reference_type()?);
    }
    p.finish()?;
    Ok(MethodSignature {
        type_params,
        params,
        ret,
        exceptions,
    })
}

pub fn parse_field_signature(signature: &str) -> Result<VarType> {
    let mut p = Parser::new(signature);
    let ty = p.type_signature()?;
    p.finish()?;
    Ok(ty)
}

struct Parser<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn error(&self) -> Error {
        Error::InvalidSignature {
            signature: self.text.to_string(),
            offset: self.pos,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.text.as_bytes().get(self.pos).copied()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.text.len()
    }

    fn expect(&mut self, b: u8) -> Result<()> {
        if self.peek() == Some(b) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error())
        }
    }

    fn finish(&self) -> Result<()> {
        if self.at_end() {
            Ok(())
        } else {
            Err(self.error())
        }
    }

    fn identifier(&mut self, terminators: &[u8]) -> Result<&'a str> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if terminators.contains(&b) {
                break;
            }
            self.pos += 1;
        }
        if self.pos == start || self.at_end() {
            return Err(self.error());
        }
        Ok(&self.text[start..self.pos])
    }

    fn type_params(&mut self) -> Result<Vec<TypeParam>> {
        let mut params = Vec::new();
        if self.peek() != Some(b'<') {
            return Ok(params);
        }
        self.pos += 1;
        while self.peek() != Some(b'>') {
            let name = self.identifier(b":")?.to_string();
            let mut bounds = Vec::new();
            // Class bound (possibly empty), then any number of interface bounds.
            while self.peek() == Some(b':') {
                self.pos += 1;
                if matches!(self.peek(), Some(b'L' | b'T' | b'[')) {
                    bounds.push(self.reference_type()?);
                }
            }
            if bounds.is_empty() {
                bounds.push(VarType::object_type());
            }
            params.push(TypeParam { name, bounds });
            if self.at_end() {
                return Err(self.error());
            }
        }
        self.pos += 1;
        Ok(params)
    }

    fn type_signature(&mut self) -> Result<VarType> {
        let kind = match self.peek() {
            Some(b'B') => TypeKind::Byte,
            Some(b'C') => TypeKind::Char,
            Some(b'D') => TypeKind::Double,
            Some(b'F') => TypeKind::Float,
            Some(b'I') => TypeKind::Int,
            Some(b'J') => TypeKind::Long,
            Some(b'S') => TypeKind::Short,
            Some(b'Z') => TypeKind::Boolean,
            _ => return self.reference_type(),
        };
        self.pos += 1;
        Ok(VarType::primitive(kind))
    }

    fn reference_type(&mut self) -> Result<VarType> {
        match self.peek() {
            Some(b'L') => self.class_type(),
            Some(b'T') => {
                self.pos += 1;
                let name = self.identifier(b";")?;
                self.pos += 1;
                Ok(VarType::gen_var(name))
            }
            Some(b'[') => {
                self.pos += 1;
                let component = self.type_signature()?;
                let dim = component.array_dim() + 1;
                Ok(component.resize_array_dim(dim))
            }
            _ => Err(self.error()),
        }
    }

    fn class_type(&mut self) -> Result<VarType> {
        self.expect(b'L')?;
        let mut name = self.identifier(b"<.;")?.to_string();
        let mut args = self.type_args()?;
        while self.peek() == Some(b'.') {
            self.pos += 1;
            let inner = self.identifier(b"<.;")?;
            name.push('$');
            name.push_str(inner);
            args = self.type_args()?;
        }
        self.expect(b';')?;
        Ok(VarType::generic(name, args))
    }

    fn type_args(&mut self) -> Result<Vec<Option<VarType>>> {
        let mut args = Vec::new();
        if self.peek() != Some(b'<') {
            return Ok(args);
        }
        self.pos += 1;
        loop {
            match self.peek() {
                Some(b'>') => break,
                Some(b'*') => {
                    self.pos += 1;
                    args.push(None);
                }
                Some(b'+') => {
                    self.pos += 1;
                    args.push(Some(self.reference_type()?.with_wildcard(Wildcard::Extends)));
                }
                Some(b'-') => {
                    self.pos += 1;
                    args.push(Some(self.reference_type()?.with_wildcard(Wildcard::Super)));
                }
                Some(_) => args.push(Some(self.reference_type()?)),
                None => return Err(self.error()),
            }
        }
        self.pos += 1;
        if args.is_empty() {
            return Err(self.error());
        }
        Ok(args)
    }
}
