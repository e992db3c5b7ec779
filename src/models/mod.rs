mod audit;
mod user;

pub use audit::*;
pub use user::*;
