mod newsletter;
mod subscriber;

pub use newsletter::*;
pub use subscriber::*;
