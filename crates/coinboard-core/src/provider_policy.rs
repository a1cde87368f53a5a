use std::time::Duration;

use crate::ProviderId;

/// Outbound call budget for one upstream host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPolicy {
    /// Minimum spacing between two granted calls.
    pub min_interval: Duration,
    /// Optional rolling quota on top of the spacing.
    pub quota: Option<QuotaPolicy>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaPolicy {
    pub window: Duration,
    pub limit: u32,
}

impl HostPolicy {
    pub const fn spaced(min_interval: Duration) -> Self {
        Self {
            min_interval,
            quota: None,
        }
    }

    pub const fn with_quota(mut self, window: Duration, limit: u32) -> Self {
        self.quota = Some(QuotaPolicy { window, limit });
        self
    }

    /// Public CoinGecko tier: roughly thirty calls per minute.
    pub const fn coingecko_default() -> Self {
        Self::spaced(Duration::from_millis(1_200)).with_quota(Duration::from_secs(60), 30)
    }

    pub const fn cryptocompare_default() -> Self {
        Self::spaced(Duration::from_millis(500))
    }

    pub const fn default_for(provider_id: ProviderId) -> Self {
        match provider_id {
            ProviderId::CoinGecko => Self::coingecko_default(),
            ProviderId::CryptoCompare => Self::cryptocompare_default(),
        }
    }
}

impl Default for HostPolicy {
    fn default() -> Self {
        Self::spaced(Duration::from_secs(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coingecko_policy_matches_public_tier() {
        let policy = HostPolicy::default_for(ProviderId::CoinGecko);

        assert_eq!(policy.min_interval, Duration::from_millis(1_200));
        assert_eq!(
            policy.quota,
            Some(QuotaPolicy {
                window: Duration::from_secs(60),
                limit: 30,
            })
        );
    }

    #[test]
    fn cryptocompare_policy_has_no_quota() {
        let policy = HostPolicy::default_for(ProviderId::CryptoCompare);

        assert_eq!(policy.min_interval, Duration::from_millis(500));
        assert!(policy.quota.is_none());
    }
}
