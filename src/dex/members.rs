use super::types::TypeId;
use super::{Error, Name, UnqualifiedName};
use crate::util::Width;
use std::fmt;

/// Identity of a field: declaring type, name, and value type
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct FieldId<'g> {
    pub declaring_type: TypeId<'g>,
    pub name: UnqualifiedName,
    pub field_type: TypeId<'g>,
}

/// Identity of a method: declaring type, name, and prototype
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct MethodId<'g> {
    pub declaring_type: TypeId<'g>,
    pub name: UnqualifiedName,

    /// `None` is for `void` (ie. no return)
    pub return_type: Option<TypeId<'g>>,

    pub parameters: Vec<TypeId<'g>>,
}

impl<'g> MethodId<'g> {
    pub fn is_constructor(&self) -> bool {
        self.name == UnqualifiedName::INIT
    }

    pub fn is_static_initializer(&self) -> bool {
        self.name == UnqualifiedName::CLINIT
    }

    /// Prototype descriptor, eg. `(IJ)Z`
    pub fn descriptor(&self) -> String {
        let mut descriptor = String::from("(");
        for parameter in &self.parameters {
            descriptor.push_str(parameter.descriptor());
        }
        descriptor.push(')');
        match self.return_type {
            None => descriptor.push('V'),
            Some(return_type) => descriptor.push_str(return_type.descriptor()),
        }
        descriptor
    }

    /// Number of registers occupied by the arguments
    pub fn parameter_width(&self, has_this_param: bool) -> usize {
        let receiver = if has_this_param { 1 } else { 0 };
        receiver
            + self
                .parameters
                .iter()
                .map(|parameter| parameter.width())
                .sum::<usize>()
    }
}

impl<'g> fmt::Debug for FieldId<'g> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}.{:?}:{:?}",
            self.declaring_type, self.name, self.field_type
        )
    }
}

impl<'g> fmt::Debug for MethodId<'g> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}.{:?}{}",
            self.declaring_type,
            self.name,
            self.descriptor()
        )
    }
}

fn member_name(name: &str) -> Result<UnqualifiedName, Error> {
    UnqualifiedName::from_string(name.to_owned()).map_err(Error::MalformedName)
}

impl<'g> TypeId<'g> {
    fn check_member_owner(self) -> Result<(), Error> {
        if self.is_reference() {
            Ok(())
        } else {
            Err(Error::NotAClassType(self.descriptor().to_owned()))
        }
    }

    /// Field declared on this type
    pub fn field(self, field_type: TypeId<'g>, name: &str) -> Result<FieldId<'g>, Error> {
        self.check_member_owner()?;
        if field_type.is_void() {
            return Err(Error::VoidNotAllowed("field type"));
        }
        Ok(FieldId {
            declaring_type: self,
            name: member_name(name)?,
            field_type,
        })
    }

    /// Method declared on this type
    ///
    /// Use the `void` type as the return type for methods that don't return anything.
    pub fn method(
        self,
        return_type: TypeId<'g>,
        name: &str,
        parameters: &[TypeId<'g>],
    ) -> Result<MethodId<'g>, Error> {
        self.check_member_owner()?;
        if parameters.iter().any(|parameter| parameter.is_void()) {
            return Err(Error::VoidNotAllowed("parameter type"));
        }
        Ok(MethodId {
            declaring_type: self,
            name: member_name(name)?,
            return_type: if return_type.is_void() {
                None
            } else {
                Some(return_type)
            },
            parameters: parameters.to_vec(),
        })
    }

    pub fn constructor(self, parameters: &[TypeId<'g>]) -> Result<MethodId<'g>, Error> {
        self.check_member_owner()?;
        if parameters.iter().any(|parameter| parameter.is_void()) {
            return Err(Error::VoidNotAllowed("parameter type"));
        }
        Ok(MethodId {
            declaring_type: self,
            name: UnqualifiedName::INIT,
            return_type: None,
            parameters: parameters.to_vec(),
        })
    }

    pub fn static_initializer(self) -> Result<MethodId<'g>, Error> {
        self.check_member_owner()?;
        Ok(MethodId {
            declaring_type: self,
            name: UnqualifiedName::CLINIT,
            return_type: None,
            parameters: vec![],
        })
    }
}
