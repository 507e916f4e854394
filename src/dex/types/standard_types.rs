use super::{TypeGraph, TypeId};
use crate::dex::{BaseType, BinaryName};

/// Types that are always available, regardless of what is being generated
pub struct StandardTypes<'g> {
    pub void: TypeId<'g>,
    pub boolean: TypeId<'g>,
    pub byte: TypeId<'g>,
    pub char: TypeId<'g>,
    pub short: TypeId<'g>,
    pub int: TypeId<'g>,
    pub long: TypeId<'g>,
    pub float: TypeId<'g>,
    pub double: TypeId<'g>,
    pub object: TypeId<'g>,
    pub string: TypeId<'g>,
    pub throwable: TypeId<'g>,
}

impl<'g> StandardTypes<'g> {
    pub fn add_to_graph(graph: &'g TypeGraph<'g>) -> Self {
        StandardTypes {
            void: graph.void(),
            boolean: graph.get(BaseType::Boolean),
            byte: graph.get(BaseType::Byte),
            char: graph.get(BaseType::Char),
            short: graph.get(BaseType::Short),
            int: graph.get(BaseType::Int),
            long: graph.get(BaseType::Long),
            float: graph.get(BaseType::Float),
            double: graph.get(BaseType::Double),
            object: graph.get_class(&BinaryName::OBJECT),
            string: graph.get_class(&BinaryName::STRING),
            throwable: graph.get_class(&BinaryName::THROWABLE),
        }
    }
}
