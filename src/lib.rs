pub mod cli;
pub mod consts;
pub mod container;
pub mod dtype;
pub mod extract;
pub mod header;
pub mod io;
pub mod memory;
pub mod variable;
