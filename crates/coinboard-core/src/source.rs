use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Upstream data providers the dashboard reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    /// Market listing, coin detail, chart history and exchanges.
    CoinGecko,
    /// News aggregation.
    CryptoCompare,
}

impl ProviderId {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CoinGecko => "coingecko",
            Self::CryptoCompare => "cryptocompare",
        }
    }
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
