mod generate;
mod routes;

pub use generate::*;
pub use routes::*;
