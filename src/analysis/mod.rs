pub mod pips;

pub use pips::price_movement_pips;
