mod routes;
mod subscribe;
mod subscriber;

pub use routes::*;
pub use subscribe::*;
pub use subscriber::*;
