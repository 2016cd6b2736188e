//! WASM 1.0 binary target: encoding primitives and the IR-to-module emitter.

pub mod emitter;
pub mod leb128;

pub use emitter::emit;
