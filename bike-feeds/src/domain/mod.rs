//! Normalized domain types shared by every provider format.
//!
//! Parsers turn provider feeds into these types; everything downstream of
//! the parser registry only ever sees `City` and `Station`.

mod city;
mod station;

pub use city::City;
pub use station::{Coordinates, Station};
