//! Method bodies and their generation
//!
//! ### Structure
//!
//! Dex method bodies run on a register machine: each method declares how many registers its
//! frame needs, and the incoming arguments occupy the last registers of that frame. Method
//! bodies are essentially just a CFG of [`BasicBlock`]s, where only the last [`Instruction`] of a
//! block may branch, return, or throw.
//!
//! ### Code generation
//!
//! Keeping track of block boundaries, exception handlers, and register numbers by hand is
//! tedious and error prone. [`Code`] provides an interface for emitting method code from top to
//! bottom using symbolic [`Label`]s and [`Local`]s, and then lowers it into a [`MethodBody`].

mod basic_block;
mod code_builder;
mod instructions;
mod label;
mod local;

pub use basic_block::*;
pub use code_builder::*;
pub use instructions::*;
pub use label::*;
pub use local::*;
