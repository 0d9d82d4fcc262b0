pub mod bays;
pub mod events;
pub mod session;
