//! Proxy channels

mod command_channel;

pub use command_channel::{CommandProxyChannel, CommandTool};
