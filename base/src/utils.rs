
pub mod cast;
pub mod fps;
pub mod frame;
pub mod memory;
pub mod time;
