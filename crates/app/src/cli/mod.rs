pub mod args;
pub mod op;
pub mod ops;

pub use ops::{Contact, Init, Inspect, Open, Seal, Version, Whoami};
