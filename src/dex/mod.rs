//! Generating Dalvik executable code at runtime
//!
//! Types are interned in a [`types::TypeGraph`], classes and their members get declared on a
//! [`DexMaker`], and method bodies are emitted through the [`code::Code`] builder returned when
//! declaring a method. Finalizing produces a [`model::DexUnit`] with every method lowered to
//! basic blocks over concrete registers, ready to be handed to a [`model::DexEncoder`].
//!
//! ```
//! use dexgen::dex::code::{Comparison, Constant};
//! use dexgen::dex::types::{TypeGraph, TypeGraphArenas};
//! use dexgen::dex::{AccessFlags, DexMaker, Error};
//!
//! # fn main() -> Result<(), Error> {
//! let arenas = TypeGraphArenas::new();
//! let types = TypeGraph::new(&arenas);
//! let java = types.insert_standard_types();
//! let generated = types.get_descriptor("LGenerated;")?;
//!
//! let mut maker = DexMaker::new();
//! maker.declare_type(
//!     generated,
//!     Some("Generated.java"),
//!     AccessFlags::PUBLIC,
//!     java.object,
//!     &[],
//! )?;
//!
//! // public static boolean call(int a, int b) { return a < b; }
//! let call = generated.method(java.boolean, "call", &[java.int, java.int])?;
//! let code = maker.declare_method(call, AccessFlags::PUBLIC | AccessFlags::STATIC)?;
//! let a = code.get_parameter(0, java.int)?;
//! let b = code.get_parameter(1, java.int)?;
//! let result = code.new_local(java.boolean)?;
//! let if_body = code.new_label();
//! let after_if = code.new_label();
//! code.compare(Comparison::LT, if_body, a, b)?;
//! code.jump(after_if)?;
//! code.mark(if_body)?;
//! code.load_constant(result, Constant::Boolean(true))?;
//! code.return_value(result)?;
//! code.mark(after_if)?;
//! code.load_constant(result, Constant::Boolean(false))?;
//! code.return_value(result)?;
//!
//! let unit = maker.finalize()?;
//! let body = unit.classes[0].direct_methods[0].code_impl.as_ref().unwrap();
//! assert_eq!(body.register_count, 3);
//! assert_eq!(body.parameter_register_count, 2);
//! # Ok(())
//! # }
//! ```

mod access_flags;
pub mod code;
mod descriptors;
mod errors;
mod maker;
mod members;
pub mod model;
mod names;
pub mod types;

pub use access_flags::*;
pub use descriptors::*;
pub use errors::*;
pub use maker::*;
pub use members::*;
pub use names::*;
