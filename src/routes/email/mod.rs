mod routes;
mod send;

pub use routes::*;
pub use send::*;
