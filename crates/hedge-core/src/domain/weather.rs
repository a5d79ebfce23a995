use serde::{Deserialize, Serialize};

/// Temperature in the three scales reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Temperature {
    #[serde(rename = "temp_C")]
    pub celsius: f64,
    #[serde(rename = "temp_F")]
    pub fahrenheit: f64,
    #[serde(rename = "temp_K")]
    pub kelvin: f64,
}

impl Temperature {
    /// Derives Fahrenheit (`C * 1.8 + 32`) and Kelvin (`C + 273`).
    pub fn from_celsius(celsius: f64) -> Self {
        Self {
            celsius,
            fahrenheit: celsius * 1.8 + 32.0,
            kelvin: celsius + 273.0,
        }
    }
}

/// Current temperature for the city a CEP resolved to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityWeather {
    pub city: String,
    #[serde(flatten)]
    pub temperature: Temperature,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_from_celsius() {
        let temperature = Temperature::from_celsius(25.0);
        assert_eq!(temperature.fahrenheit, 77.0);
        assert_eq!(temperature.kelvin, 298.0);
    }

    #[test]
    fn freezing_point() {
        let temperature = Temperature::from_celsius(0.0);
        assert_eq!(temperature.fahrenheit, 32.0);
        assert_eq!(temperature.kelvin, 273.0);
    }

    #[test]
    fn serializes_with_scale_suffixes() {
        let weather = CityWeather {
            city: String::from("Rio de Janeiro"),
            temperature: Temperature::from_celsius(10.0),
        };

        let json = serde_json::to_value(&weather).expect("serialize");

        assert_eq!(json["city"], "Rio de Janeiro");
        assert_eq!(json["temp_C"], 10.0);
        assert_eq!(json["temp_F"], 50.0);
        assert_eq!(json["temp_K"], 283.0);
    }
}
