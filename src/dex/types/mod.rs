//! Canonical types, interned per session
//!
//! Every distinct descriptor maps to exactly one [`TypeData`] allocated in the
//! [`TypeGraphArenas`], so a [`TypeId`] is a cheap `Copy` handle. Equality and hashing are by
//! descriptor, which makes handles from the same graph interchangeable with freshly looked-up
//! ones.

use super::{
    BaseType, BinaryName, Error, FieldType, ParseDescriptor, RefType, RenderDescriptor,
    TypeDescriptor,
};
use crate::util::Width;
use elsa::map::FrozenMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use typed_arena::Arena;

mod standard_types;

pub use standard_types::*;

pub struct TypeGraphArenas {
    type_arena: Arena<TypeData>,
}

impl TypeGraphArenas {
    pub fn new() -> Self {
        TypeGraphArenas {
            type_arena: Arena::new(),
        }
    }
}

/// Interns types for one generation session
pub struct TypeGraph<'g> {
    arenas: &'g TypeGraphArenas,
    types: FrozenMap<String, &'g TypeData>,
}

impl<'g> TypeGraph<'g> {
    /// New empty graph
    pub fn new(arenas: &'g TypeGraphArenas) -> Self {
        TypeGraph {
            arenas,
            types: FrozenMap::new(),
        }
    }

    /// Look up (or create) the type for a descriptor such as `I` or `Ljava/lang/String;`
    pub fn get_descriptor(&'g self, descriptor: &str) -> Result<TypeId<'g>, Error> {
        if let Some(data) = self.types.get(descriptor) {
            return Ok(TypeId(data));
        }
        let parsed = TypeDescriptor::parse(descriptor)
            .map_err(|err| Error::MalformedDescriptor(format!("'{}': {}", descriptor, err)))?;
        Ok(self.intern(parsed))
    }

    pub fn get(&'g self, base_type: BaseType) -> TypeId<'g> {
        self.intern(TypeDescriptor::Field(FieldType::Base(base_type)))
    }

    pub fn get_class(&'g self, name: &BinaryName) -> TypeId<'g> {
        self.intern(TypeDescriptor::Field(FieldType::object(name.clone())))
    }

    pub fn void(&'g self) -> TypeId<'g> {
        self.intern(TypeDescriptor::Void)
    }

    /// Array type with the given element type
    pub fn array_of(&'g self, element: TypeId<'g>) -> Result<TypeId<'g>, Error> {
        match &element.0.parsed {
            TypeDescriptor::Void => Err(Error::VoidNotAllowed("array element")),
            TypeDescriptor::Field(field_type) => Ok(self.intern(TypeDescriptor::Field(
                FieldType::array(field_type.clone()),
            ))),
        }
    }

    /// Add the types that most generated code refers to
    pub fn insert_standard_types(&'g self) -> StandardTypes<'g> {
        StandardTypes::add_to_graph(self)
    }

    fn intern(&'g self, parsed: TypeDescriptor) -> TypeId<'g> {
        let descriptor = parsed.render();
        if let Some(data) = self.types.get(descriptor.as_str()) {
            return TypeId(data);
        }
        log::trace!("Interning type {}", descriptor);
        let data: &'g TypeData = &*self.arenas.type_arena.alloc(TypeData {
            descriptor: descriptor.clone(),
            parsed,
        });
        self.types.insert(descriptor, data);
        TypeId(data)
    }
}

pub struct TypeData {
    /// Canonical descriptor, used for equality
    pub descriptor: String,

    pub parsed: TypeDescriptor,
}

/// Handle to an interned type
#[derive(Copy, Clone)]
pub struct TypeId<'g>(&'g TypeData);

impl<'g> TypeId<'g> {
    pub fn descriptor(self) -> &'g str {
        &self.0.descriptor
    }

    pub fn data(self) -> &'g TypeData {
        self.0
    }

    pub fn is_void(self) -> bool {
        matches!(self.0.parsed, TypeDescriptor::Void)
    }

    pub fn is_primitive(self) -> bool {
        matches!(self.0.parsed, TypeDescriptor::Field(FieldType::Base(_)))
    }

    pub fn is_reference(self) -> bool {
        matches!(self.0.parsed, TypeDescriptor::Field(FieldType::Ref(_)))
    }

    pub fn is_array(self) -> bool {
        matches!(
            self.0.parsed,
            TypeDescriptor::Field(FieldType::Ref(
                RefType::ObjectArray(_) | RefType::PrimitiveArray(_)
            ))
        )
    }

    pub fn base_type(self) -> Option<BaseType> {
        match self.0.parsed {
            TypeDescriptor::Field(FieldType::Base(base_type)) => Some(base_type),
            _ => None,
        }
    }

    /// Class name, if this is a class or interface type (not an array)
    pub fn class_name(self) -> Option<&'g BinaryName> {
        match &self.0.parsed {
            TypeDescriptor::Field(FieldType::Ref(RefType::Object(name))) => Some(name),
            _ => None,
        }
    }

    /// Descriptor of the elements, if this is an array type
    pub fn element_descriptor(self) -> Option<&'g str> {
        if self.is_array() {
            self.0.descriptor.strip_prefix('[')
        } else {
            None
        }
    }

    /// Whether this is a type in a pair of registers (`long` or `double`)
    pub fn is_wide(self) -> bool {
        self.width() == 2
    }
}

impl<'g> Width for TypeId<'g> {
    fn width(&self) -> usize {
        self.0.parsed.width()
    }
}

impl<'g> PartialEq for TypeId<'g> {
    fn eq(&self, other: &Self) -> bool {
        self.0.descriptor == other.0.descriptor
    }
}

impl<'g> Eq for TypeId<'g> {}

impl<'g> Hash for TypeId<'g> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.descriptor.hash(state);
    }
}

impl<'g> fmt::Debug for TypeId<'g> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.descriptor)
    }
}
