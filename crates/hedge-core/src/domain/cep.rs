use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

const CEP_LEN: usize = 8;

/// Brazilian postal code: exactly eight ASCII digits, no separators.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Cep(String);

impl Cep {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let is_valid = input.len() == CEP_LEN && input.bytes().all(|byte| byte.is_ascii_digit());
        if !is_valid {
            return Err(ValidationError::InvalidCep {
                value: input.to_owned(),
            });
        }

        Ok(Self(input.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Cep {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Cep {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl TryFrom<String> for Cep {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Cep> for String {
    fn from(value: Cep) -> Self {
        value.0
    }
}
