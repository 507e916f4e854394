use crate::dex::code::MethodBody;
use crate::dex::{AccessFlags, MethodId};

/// Semantic representation of a method
#[derive(Debug)]
pub struct Method<'g> {
    /// The current method
    pub id: MethodId<'g>,

    pub access_flags: AccessFlags,

    /// Method code implementation (absent for abstract and native methods)
    pub code_impl: Option<MethodBody<'g>>,
}

impl<'g> Method<'g> {
    /// Direct methods are never dispatched virtually: static, private, and constructors
    pub fn is_direct(&self) -> bool {
        self.access_flags.is_direct()
    }
}
