#[macro_use]
pub mod util;

pub mod assembler;
pub mod circuit;
pub mod cli;
pub mod emulate;
pub mod loader;
pub mod machine;
