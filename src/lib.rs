//! Run-time assembler for Dalvik (register-based) method bodies
//!
//! See [`dex`] for an overview and an example.

pub mod dex;
mod util;
