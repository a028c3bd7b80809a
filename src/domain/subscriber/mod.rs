mod subscriber_email;
mod subscriber_name;
mod types;

pub use subscriber_email::SubscriberEmail;
pub use subscriber_name::SubscriberName;
pub use types::*;

#[derive(Debug)]
pub struct NewSubscriber {
    pub email: SubscriberEmail,
    pub name: SubscriberName,
}

impl NewSubscriber {
    pub fn new(email: String, name: String) -> Result<Self, String> {
        Ok(Self {
            email: SubscriberEmail::parse(email)?,
            name: SubscriberName::parse(name)?,
        })
    }
}
