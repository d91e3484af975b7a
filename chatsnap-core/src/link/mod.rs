//! Chat link: subscription to one channel on the chat service

pub mod irc;
mod mock;
mod traits;
mod twitch;

pub use mock::{MockLink, MockLinkFactory, MockLinkHandle};
pub use traits::{ChatLink, LinkEvent, LinkFactory};
pub use twitch::{TWITCH_WS_URL, TwitchLink, TwitchLinkFactory};
