mod enums;
mod models;

pub use enums::*;
pub use models::*;
