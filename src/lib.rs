pub mod cmdline;
pub mod io_struct;
pub mod renderer;
pub mod server;
