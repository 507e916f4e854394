use super::{Instruction, RegisterSpec};
use crate::dex::types::TypeId;
use std::fmt;

/// Instruction after register assignment
pub type RegisterInstruction<'g> = Instruction<'g, RegisterSpec<'g>>;

/// Successor taken when an instruction in the block throws an exception of a certain type
#[derive(Clone, PartialEq, Debug)]
pub struct CatchHandler<'g> {
    pub exception: TypeId<'g>,

    /// Id of the handler block
    pub handler: usize,
}

/// A finished basic block
///
/// Only the last instruction of a block can branch or throw to another block. Successors are
/// referred to by block id (the block's position in [`MethodBody::blocks`]).
#[derive(Clone, PartialEq, Debug)]
pub struct BasicBlock<'g> {
    pub id: usize,

    /// Straight-line instructions in the block, ending with the branching one
    pub instructions: Vec<RegisterInstruction<'g>>,

    /// Fall-through or jump target (absent for blocks ending in return or throw)
    pub primary_successor: Option<usize>,

    /// Target of a conditional branch ending the block
    pub alternate_successor: Option<usize>,

    /// Handlers for the exceptions the last instruction may throw, innermost first
    pub catch_handlers: Vec<CatchHandler<'g>>,
}

impl<'g> BasicBlock<'g> {
    pub fn last_instruction(&self) -> Option<&RegisterInstruction<'g>> {
        self.instructions.last()
    }

    /// All blocks control may continue to: primary, alternate, and then catch handlers
    pub fn successors(&self) -> Vec<usize> {
        let mut successors: Vec<usize> = self
            .primary_successor
            .iter()
            .chain(self.alternate_successor.iter())
            .copied()
            .collect();
        successors.extend(self.catch_handlers.iter().map(|catch| catch.handler));
        successors
    }
}

/// A finished method body, ready to be encoded
#[derive(Clone, PartialEq, Debug)]
pub struct MethodBody<'g> {
    pub blocks: Vec<BasicBlock<'g>>,

    /// Total registers used by the method, including parameters
    pub register_count: u16,

    /// Registers occupied by the incoming arguments (the last ones in the frame)
    pub parameter_register_count: u16,
}

impl<'g> fmt::Display for MethodBody<'g> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "registers: {} (parameters: {})",
            self.register_count, self.parameter_register_count
        )?;
        for block in &self.blocks {
            writeln!(f, "block {}:", block.id)?;
            for instruction in &block.instructions {
                writeln!(f, "    {}", instruction)?;
            }
            if let Some(primary) = block.primary_successor {
                write!(f, "  next: {}", primary)?;
                if let Some(alternate) = block.alternate_successor {
                    write!(f, ", taken: {}", alternate)?;
                }
                writeln!(f)?;
            }
            for catch in &block.catch_handlers {
                writeln!(f, "  catch {:?}: {}", catch.exception, catch.handler)?;
            }
        }
        Ok(())
    }
}
