//! Wire types shared by both sides of the bridge: Bedrock inventory actions
//! coming from the client and Java window requests going to the server.

pub mod codec;
pub mod error;
pub mod item_stack;
pub mod packets;
pub mod types;
