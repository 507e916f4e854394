//! Semantic representations of the generated classes
//!
//! This is what [`DexMaker::finalize`](crate::dex::DexMaker::finalize) produces: everything that
//! was declared, with method bodies lowered into basic blocks over concrete registers.
//!
//!   - __Class__ is represented using [`Class`]
//!   - __Method__ is represented using [`Method`]
//!   - __Field__ is represented using [`Field`]
//!
//! Turning this into the bytes of a dex file (string/type/proto/member tables, instruction
//! encoding, checksums) is the job of a [`DexEncoder`].

mod class;
mod field;
mod method;

pub use class::*;
pub use field::*;
pub use method::*;

use crate::dex::types::TypeId;

/// All the classes generated in one session
#[derive(Debug)]
pub struct DexUnit<'g> {
    /// Classes, in the order they were first referenced
    pub classes: Vec<Class<'g>>,
}

impl<'g> DexUnit<'g> {
    /// Find the class generated for a type
    pub fn class(&self, id: TypeId<'g>) -> Option<&Class<'g>> {
        self.classes.iter().find(|class| class.id == id)
    }

    /// Hand the unit off to an encoder
    pub fn encode_with<E: DexEncoder<'g>>(&self, encoder: &mut E) -> Result<E::Output, E::Error> {
        encoder.encode(self)
    }
}

/// Serializer of finished units into some binary container
pub trait DexEncoder<'g> {
    type Output;
    type Error;

    fn encode(&mut self, unit: &DexUnit<'g>) -> Result<Self::Output, Self::Error>;
}
