mod coins;

pub mod op;

mod secret;

pub use coins::Coins;
pub use secret::Secret;
