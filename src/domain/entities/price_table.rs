use super::{billing_interval::BillingInterval, subscription_tier::SubscriptionTier};

/// Static mapping between billing-provider price identifiers and tiers.
///
/// Unset slots are `None`; an empty identifier is treated as unset so a
/// blank env var can never make every unknown price resolve to a paid tier.
#[derive(Debug, Clone, Default)]
pub struct PriceTable {
    pub pro_monthly: Option<String>,
    pub pro_yearly: Option<String>,
    pub elite_monthly: Option<String>,
    pub elite_yearly: Option<String>,
}

impl PriceTable {
    pub fn new(
        pro_monthly: Option<String>,
        pro_yearly: Option<String>,
        elite_monthly: Option<String>,
        elite_yearly: Option<String>,
    ) -> Self {
        fn non_empty(id: Option<String>) -> Option<String> {
            id.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
        }

        Self {
            pro_monthly: non_empty(pro_monthly),
            pro_yearly: non_empty(pro_yearly),
            elite_monthly: non_empty(elite_monthly),
            elite_yearly: non_empty(elite_yearly),
        }
    }

    /// Map a price identifier to a tier. Unknown prices map to `Free`.
    pub fn tier_for_price(&self, price_id: &str) -> SubscriptionTier {
        let matches = |slot: &Option<String>| slot.as_deref() == Some(price_id);

        if price_id.is_empty() {
            SubscriptionTier::Free
        } else if matches(&self.pro_monthly) || matches(&self.pro_yearly) {
            SubscriptionTier::Pro
        } else if matches(&self.elite_monthly) || matches(&self.elite_yearly) {
            SubscriptionTier::Elite
        } else {
            SubscriptionTier::Free
        }
    }

    /// Price identifier to use at checkout for a paid tier.
    pub fn price_for(&self, tier: SubscriptionTier, interval: BillingInterval) -> Option<&str> {
        let slot = match (tier, interval) {
            (SubscriptionTier::Free, _) => return None,
            (SubscriptionTier::Pro, BillingInterval::Monthly) => &self.pro_monthly,
            (SubscriptionTier::Pro, BillingInterval::Yearly) => &self.pro_yearly,
            (SubscriptionTier::Elite, BillingInterval::Monthly) => &self.elite_monthly,
            (SubscriptionTier::Elite, BillingInterval::Yearly) => &self.elite_yearly,
        };
        slot.as_deref()
    }

    /// All configured price identifiers with the tier they grant.
    pub fn configured(&self) -> Vec<(&str, SubscriptionTier)> {
        [
            (&self.pro_monthly, SubscriptionTier::Pro),
            (&self.pro_yearly, SubscriptionTier::Pro),
            (&self.elite_monthly, SubscriptionTier::Elite),
            (&self.elite_yearly, SubscriptionTier::Elite),
        ]
        .into_iter()
        .filter_map(|(slot, tier)| slot.as_deref().map(|id| (id, tier)))
        .collect()
    }
}
