mod helpers;
pub mod layout;
mod painter;

pub use painter::*;
