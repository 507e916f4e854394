use crate::dex::model::{Field, Method};
use crate::dex::types::TypeId;
use crate::dex::AccessFlags;

/// Semantic representation of a class
#[derive(Debug)]
pub struct Class<'g> {
    /// The current class
    pub id: TypeId<'g>,

    pub access_flags: AccessFlags,
    pub superclass: TypeId<'g>,
    pub interfaces: Vec<TypeId<'g>>,

    /// Name of the source file, for stack traces
    pub source_file: Option<String>,

    pub static_fields: Vec<Field<'g>>,
    pub instance_fields: Vec<Field<'g>>,

    /// Static methods, private methods, and constructors
    pub direct_methods: Vec<Method<'g>>,

    pub virtual_methods: Vec<Method<'g>>,
}

impl<'g> Class<'g> {
    /// Create a new class
    pub fn new(
        id: TypeId<'g>,
        access_flags: AccessFlags,
        superclass: TypeId<'g>,
        interfaces: Vec<TypeId<'g>>,
        source_file: Option<String>,
    ) -> Class<'g> {
        Class {
            id,
            access_flags,
            superclass,
            interfaces,
            source_file,
            static_fields: vec![],
            instance_fields: vec![],
            direct_methods: vec![],
            virtual_methods: vec![],
        }
    }

    /// Add a method to the class
    pub fn add_method(&mut self, method: Method<'g>) {
        debug_assert_eq!(
            method.id.declaring_type, self.id,
            "Method doesn't belong to this class"
        );
        if method.is_direct() {
            self.direct_methods.push(method);
        } else {
            self.virtual_methods.push(method);
        }
    }

    /// Add a field to the class
    pub fn add_field(&mut self, field: Field<'g>) {
        debug_assert_eq!(
            field.id.declaring_type, self.id,
            "Field doesn't belong to this class"
        );
        if field.is_static() {
            self.static_fields.push(field);
        } else {
            self.instance_fields.push(field);
        }
    }

    /// All methods, direct ones first
    pub fn methods(&self) -> impl Iterator<Item = &Method<'g>> {
        self.direct_methods.iter().chain(self.virtual_methods.iter())
    }

    /// All fields, static ones first
    pub fn fields(&self) -> impl Iterator<Item = &Field<'g>> {
        self.static_fields.iter().chain(self.instance_fields.iter())
    }
}
