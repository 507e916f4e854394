use crate::dex::code::Constant;
use crate::dex::{AccessFlags, FieldId};

/// In-memory representation of a field
#[derive(Debug)]
pub struct Field<'g> {
    /// The current field
    pub id: FieldId<'g>,

    pub access_flags: AccessFlags,

    /// Initial value (only ever set on static fields)
    pub initial_value: Option<Constant<'g>>,
}

impl<'g> Field<'g> {
    pub fn is_static(&self) -> bool {
        self.access_flags.contains(AccessFlags::STATIC)
    }
}
