use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::Serialize;

use crate::ValidationError;

/// Stable identifier of an upstream data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ProviderId(&'static str);

impl ProviderId {
    pub const VIACEP: Self = Self("viacep");
    pub const BRASILAPI: Self = Self("brasilapi");
    pub const AWESOMEAPI: Self = Self("awesomeapi");
    pub const WEATHERAPI: Self = Self("weatherapi");
    pub const WEATHER_SERVICE: Self = Self("weather-service");

    pub const KNOWN: [Self; 5] = [
        Self::VIACEP,
        Self::BRASILAPI,
        Self::AWESOMEAPI,
        Self::WEATHERAPI,
        Self::WEATHER_SERVICE,
    ];

    /// Identifier for a source outside the built-in set, such as a test double.
    pub const fn new(id: &'static str) -> Self {
        Self(id)
    }

    pub const fn as_str(self) -> &'static str {
        self.0
    }
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

impl FromStr for ProviderId {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::KNOWN
            .into_iter()
            .find(|known| known.as_str() == normalized)
            .ok_or_else(|| ValidationError::InvalidProvider {
                value: value.to_owned(),
                expected: Self::KNOWN
                    .iter()
                    .map(|known| known.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}
