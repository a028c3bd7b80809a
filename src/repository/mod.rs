mod analytics;
mod newsletter;
mod subscriber;

pub use analytics::*;
pub use newsletter::*;
pub use subscriber::*;
