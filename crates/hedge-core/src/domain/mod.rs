//! Validated lookup keys and the values the built-in providers produce.

mod address;
mod cep;
mod quote;
mod weather;

pub use address::Address;
pub use cep::Cep;
pub use quote::{CurrencyPair, DollarQuote};
pub use weather::{CityWeather, Temperature};
