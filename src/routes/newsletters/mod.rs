mod newsletter;
mod routes;

pub use newsletter::*;
pub use routes::*;
