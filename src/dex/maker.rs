use super::code::{Code, Constant};
use super::model::{Class, DexEncoder, DexUnit, Field, Method};
use super::types::TypeId;
use super::{AccessFlags, Error, FieldId, MethodId};
use std::collections::HashMap;

/// Collects declarations of generated classes and their members
///
/// Declarations may come in any order: members can be declared on a type before the type itself
/// is declared. Dangling members (on types that never get declared) are only reported when
/// finalizing. Classes come out of [`DexMaker::finalize`] in the order their types were first
/// mentioned, and members in the order they were declared.
pub struct DexMaker<'g> {
    declarations: Vec<TypeDeclaration<'g>>,

    /// Position of every type in `declarations`
    declaration_index: HashMap<TypeId<'g>, usize>,
}

struct TypeDeclaration<'g> {
    id: TypeId<'g>,

    /// Set by `declare_type`
    definition: Option<TypeDefinition<'g>>,

    fields: Vec<FieldDeclaration<'g>>,
    field_index: HashMap<FieldId<'g>, usize>,
    methods: Vec<MethodDeclaration<'g>>,
    method_index: HashMap<MethodId<'g>, usize>,
}

struct TypeDefinition<'g> {
    access_flags: AccessFlags,
    superclass: TypeId<'g>,
    interfaces: Vec<TypeId<'g>>,
    source_file: Option<String>,
}

struct FieldDeclaration<'g> {
    id: FieldId<'g>,
    access_flags: AccessFlags,
    initial_value: Option<Constant<'g>>,
}

struct MethodDeclaration<'g> {
    id: MethodId<'g>,
    access_flags: AccessFlags,
    code: Code<'g>,
}

impl<'g> TypeDeclaration<'g> {
    fn new(id: TypeId<'g>) -> Self {
        TypeDeclaration {
            id,
            definition: None,
            fields: vec![],
            field_index: HashMap::new(),
            methods: vec![],
            method_index: HashMap::new(),
        }
    }
}

fn check_class_type(id: TypeId) -> Result<(), Error> {
    if id.class_name().is_some() {
        Ok(())
    } else {
        Err(Error::NotAClassType(id.descriptor().to_owned()))
    }
}

impl<'g> DexMaker<'g> {
    pub fn new() -> Self {
        DexMaker {
            declarations: vec![],
            declaration_index: HashMap::new(),
        }
    }

    fn type_declaration(&mut self, id: TypeId<'g>) -> &mut TypeDeclaration<'g> {
        let index = match self.declaration_index.get(&id) {
            Some(index) => *index,
            None => {
                let index = self.declarations.len();
                self.declarations.push(TypeDeclaration::new(id));
                self.declaration_index.insert(id, index);
                index
            }
        };
        &mut self.declarations[index]
    }

    /// Declare a class or interface to be generated
    pub fn declare_type(
        &mut self,
        id: TypeId<'g>,
        source_file: Option<&str>,
        access_flags: AccessFlags,
        superclass: TypeId<'g>,
        interfaces: &[TypeId<'g>],
    ) -> Result<(), Error> {
        check_class_type(id)?;
        check_class_type(superclass)?;
        for interface in interfaces {
            check_class_type(*interface)?;
        }
        let invalid = access_flags - AccessFlags::CLASS_FLAGS;
        if !invalid.is_empty() {
            return Err(Error::InvalidAccessFlags {
                declaration: id.descriptor().to_owned(),
                flags: invalid,
            });
        }

        let declaration = self.type_declaration(id);
        if declaration.definition.is_some() {
            return Err(Error::DuplicateType(id.descriptor().to_owned()));
        }
        declaration.definition = Some(TypeDefinition {
            access_flags,
            superclass,
            interfaces: interfaces.to_vec(),
            source_file: source_file.map(str::to_owned),
        });
        log::debug!("Declared type {:?} extending {:?}", id, superclass);
        Ok(())
    }

    /// Declare a method, returning the builder for its body
    ///
    /// Abstract and native methods must not get any code.
    pub fn declare_method(
        &mut self,
        method: MethodId<'g>,
        access_flags: AccessFlags,
    ) -> Result<&mut Code<'g>, Error> {
        let mut access_flags = access_flags;
        if access_flags.contains(AccessFlags::SYNCHRONIZED) {
            access_flags.remove(AccessFlags::SYNCHRONIZED);
            access_flags.insert(AccessFlags::DECLARED_SYNCHRONIZED);
        }
        let invalid = access_flags - AccessFlags::METHOD_FLAGS;
        if !invalid.is_empty() {
            return Err(Error::InvalidAccessFlags {
                declaration: format!("{:?}", method),
                flags: invalid,
            });
        }
        if method.is_static_initializer() && !access_flags.contains(AccessFlags::STATIC) {
            return Err(Error::NonStaticInitializer(format!("{:?}", method)));
        }
        if method.is_constructor() || method.is_static_initializer() {
            access_flags.insert(AccessFlags::CONSTRUCTOR);
        }

        let declaration = self.type_declaration(method.declaring_type);
        if declaration.method_index.contains_key(&method) {
            return Err(Error::DuplicateMethod(format!("{:?}", method)));
        }
        log::debug!("Declared method {:?} ({:?})", method, access_flags);

        let code = Code::new(method.clone(), access_flags.contains(AccessFlags::STATIC));
        let index = declaration.methods.len();
        declaration.method_index.insert(method.clone(), index);
        declaration.methods.push(MethodDeclaration {
            id: method,
            access_flags,
            code,
        });
        Ok(&mut declaration.methods[index].code)
    }

    /// Builder for the body of a method that was already declared
    pub fn code(&mut self, method: &MethodId<'g>) -> Option<&mut Code<'g>> {
        let index = *self.declaration_index.get(&method.declaring_type)?;
        let declaration = &mut self.declarations[index];
        let method_index = *declaration.method_index.get(method)?;
        Some(&mut declaration.methods[method_index].code)
    }

    /// Declare a field, with an optional initial value for static fields
    pub fn declare_field(
        &mut self,
        field: FieldId<'g>,
        access_flags: AccessFlags,
        initial_value: Option<Constant<'g>>,
    ) -> Result<(), Error> {
        if access_flags.contains(AccessFlags::SYNCHRONIZED) {
            return Err(Error::SynchronizedField(format!("{:?}", field)));
        }
        let invalid = access_flags - AccessFlags::FIELD_FLAGS;
        if !invalid.is_empty() {
            return Err(Error::InvalidAccessFlags {
                declaration: format!("{:?}", field),
                flags: invalid,
            });
        }
        if let Some(value) = &initial_value {
            if !access_flags.contains(AccessFlags::STATIC) {
                return Err(Error::InstanceFieldWithValue(format!("{:?}", field)));
            }
            if !value.is_assignable_to(field.field_type) {
                return Err(Error::TypeMismatch {
                    context: "initial value",
                    expected: field.field_type.descriptor().to_owned(),
                    found: value.to_string(),
                });
            }
        }

        let declaration = self.type_declaration(field.declaring_type);
        if declaration.field_index.contains_key(&field) {
            return Err(Error::DuplicateField(format!("{:?}", field)));
        }
        log::debug!("Declared field {:?} ({:?})", field, access_flags);
        declaration
            .field_index
            .insert(field.clone(), declaration.fields.len());
        declaration.fields.push(FieldDeclaration {
            id: field,
            access_flags,
            initial_value,
        });
        Ok(())
    }

    /// Finish all the method bodies and collect everything declared
    pub fn finalize(self) -> Result<DexUnit<'g>, Error> {
        let dangling: Vec<String> = self
            .declarations
            .iter()
            .filter(|declaration| declaration.definition.is_none())
            .flat_map(|declaration| {
                let fields = declaration.fields.iter().map(|field| format!("{:?}", field.id));
                let methods = declaration
                    .methods
                    .iter()
                    .map(|method| format!("{:?}", method.id));
                fields.chain(methods)
            })
            .collect();
        if !dangling.is_empty() {
            return Err(Error::UndeclaredTypes { members: dangling });
        }

        let mut classes = Vec::with_capacity(self.declarations.len());
        for declaration in self.declarations {
            let definition = match declaration.definition {
                Some(definition) => definition,
                None => continue,
            };
            let mut class = Class::new(
                declaration.id,
                definition.access_flags,
                definition.superclass,
                definition.interfaces,
                definition.source_file,
            );

            for field in declaration.fields {
                class.add_field(Field {
                    id: field.id,
                    access_flags: field.access_flags,
                    initial_value: field.initial_value,
                });
            }

            for mut method in declaration.methods {
                let code_impl = if method.access_flags.is_bodiless() {
                    if !method.code.is_empty() {
                        return Err(Error::BodilessMethodWithCode(format!(
                            "{:?}",
                            method.id
                        )));
                    }
                    None
                } else {
                    Some(method.code.to_basic_blocks()?)
                };
                class.add_method(Method {
                    id: method.id,
                    access_flags: method.access_flags,
                    code_impl,
                });
            }

            classes.push(class);
        }

        log::debug!("Finalized {} classes", classes.len());
        Ok(DexUnit { classes })
    }

    /// Finalize and encode in one go
    pub fn generate<E>(self, encoder: &mut E) -> Result<E::Output, E::Error>
    where
        E: DexEncoder<'g>,
        E::Error: From<Error>,
    {
        let unit = self.finalize()?;
        unit.encode_with(encoder)
    }
}

impl<'g> Default for DexMaker<'g> {
    fn default() -> Self {
        DexMaker::new()
    }
}
