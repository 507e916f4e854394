use super::CodeTag;
use crate::dex::types::TypeId;
use crate::util::Width;
use std::fmt;

/// Values which carry their type around
pub trait Typed<'g> {
    fn ty(&self) -> TypeId<'g>;
}

/// Virtual register of a method body under construction
///
/// Locals are handles: the register they end up in is only decided once all locals are known
/// (see [`Code::initialize_locals`](super::Code::initialize_locals)).
#[derive(Copy, Clone, Hash, Eq, PartialEq)]
pub struct Local<'g> {
    owner: CodeTag,
    index: u32,
    ty: TypeId<'g>,
}

impl<'g> Local<'g> {
    pub(crate) fn new(owner: CodeTag, index: u32, ty: TypeId<'g>) -> Local<'g> {
        Local { owner, index, ty }
    }

    pub(crate) fn owner(&self) -> CodeTag {
        self.owner
    }

    pub(crate) fn index(&self) -> usize {
        self.index as usize
    }
}

impl<'g> Typed<'g> for Local<'g> {
    fn ty(&self) -> TypeId<'g> {
        self.ty
    }
}

impl<'g> Width for Local<'g> {
    fn width(&self) -> usize {
        self.ty.width()
    }
}

impl<'g> fmt::Debug for Local<'g> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "local{}:{:?}", self.index, self.ty)
    }
}

/// Register assigned to a local, along with the type of value it holds
///
/// Wide values (`long` and `double`) also occupy `register + 1`.
#[derive(Copy, Clone, Hash, Eq, PartialEq)]
pub struct RegisterSpec<'g> {
    pub register: u16,
    pub ty: TypeId<'g>,
}

impl<'g> Typed<'g> for RegisterSpec<'g> {
    fn ty(&self) -> TypeId<'g> {
        self.ty
    }
}

impl<'g> fmt::Debug for RegisterSpec<'g> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}:{:?}", self.register, self.ty)
    }
}

impl<'g> fmt::Display for RegisterSpec<'g> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.register)
    }
}
