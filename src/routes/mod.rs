mod analytics;
mod content;
mod email;
mod health_check;
mod newsletters;
mod subscribers;
mod webhooks;

pub use analytics::*;
pub use content::*;
pub use email::*;
pub use health_check::*;
pub use newsletters::*;
pub use subscribers::*;
pub use webhooks::*;
