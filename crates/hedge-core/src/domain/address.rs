use serde::Serialize;

use crate::domain::Cep;
use crate::ProviderId;

/// Normalized postal address, whichever provider produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Address {
    pub cep: Cep,
    pub street: String,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
    pub provider: ProviderId,
}
