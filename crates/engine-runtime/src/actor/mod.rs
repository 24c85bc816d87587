pub mod mailbox;
pub mod messages;
pub mod stream;

pub use mailbox::Mailbox;
pub use stream::StreamActor;
