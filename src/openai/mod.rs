mod client;
mod core;
pub use self::client::*;
pub use self::core::*;
