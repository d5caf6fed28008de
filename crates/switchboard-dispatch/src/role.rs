//! Closed role alphabets.
//!
//! Each deployment variant has its own enum of responder roles. The
//! coordinator is generic over [`Role`], so dispatch is an exhaustive match
//! on a known set instead of a lookup by arbitrary string.

use std::fmt;
use std::hash::Hash;

/// A responder role the classifier may route to.
pub trait Role: Copy + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static {
    /// Every member of the alphabet, in prompt order.
    fn all() -> &'static [Self];

    /// Short name of the domain the alphabet serves, used in prompts.
    fn domain() -> &'static str;

    /// Canonical identifier, as used in routing decisions and history tags.
    fn id(&self) -> &'static str;

    /// One-line description of what the role handles.
    fn description(&self) -> &'static str;

    /// Parse a routing target. Accepts the canonical id and the `<id>_agent`
    /// form the classifier prompt historically used.
    fn parse(target: &str) -> Option<Self> {
        let target = target.trim();
        let bare = target.strip_suffix("_agent").unwrap_or(target);
        Self::all().iter().copied().find(|role| role.id() == bare)
    }
}

// =============================================================================
// Customer support
// =============================================================================

/// Roles of the customer-support variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SupportRole {
    Billing,
    Technical,
    GeneralInfo,
}

impl Role for SupportRole {
    fn all() -> &'static [Self] {
        &[
            SupportRole::Billing,
            SupportRole::Technical,
            SupportRole::GeneralInfo,
        ]
    }

    fn domain() -> &'static str {
        "customer support"
    }

    fn id(&self) -> &'static str {
        match self {
            SupportRole::Billing => "billing",
            SupportRole::Technical => "technical",
            SupportRole::GeneralInfo => "general_info",
        }
    }

    fn description(&self) -> &'static str {
        match self {
            SupportRole::Billing => "payment issues, overcharges, refunds, billing errors",
            SupportRole::Technical => "software bugs, login errors, app performance",
            SupportRole::GeneralInfo => "general information, account questions, opening hours",
        }
    }
}

impl fmt::Display for SupportRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

// =============================================================================
// Travel planning
// =============================================================================

/// Roles of the travel-planning variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TravelRole {
    Budget,
    Itinerary,
    Knowledge,
}

impl Role for TravelRole {
    fn all() -> &'static [Self] {
        &[TravelRole::Budget, TravelRole::Itinerary, TravelRole::Knowledge]
    }

    fn domain() -> &'static str {
        "travel planning"
    }

    fn id(&self) -> &'static str {
        match self {
            TravelRole::Budget => "budget",
            TravelRole::Itinerary => "itinerary",
            TravelRole::Knowledge => "knowledge",
        }
    }

    fn description(&self) -> &'static str {
        match self {
            TravelRole::Budget => "cost estimates for flights, accommodation and daily spending",
            TravelRole::Itinerary => "day-by-day plans, routes and scheduling",
            TravelRole::Knowledge => {
                "visa requirements, local customs, language, dining and useful apps"
            }
        }
    }
}

impl fmt::Display for TravelRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_support_ids_unique() {
        let ids: Vec<&str> = SupportRole::all().iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["billing", "technical", "general_info"]);
    }

    #[test]
    fn test_parse_canonical_and_agent_suffix() {
        assert_eq!(SupportRole::parse("billing"), Some(SupportRole::Billing));
        assert_eq!(SupportRole::parse("billing_agent"), Some(SupportRole::Billing));
        assert_eq!(
            SupportRole::parse("general_info_agent"),
            Some(SupportRole::GeneralInfo)
        );
        assert_eq!(SupportRole::parse(" technical "), Some(SupportRole::Technical));
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert_eq!(SupportRole::parse("sales"), None);
        assert_eq!(SupportRole::parse(""), None);
        assert_eq!(SupportRole::parse("Billing"), None);
        assert_eq!(SupportRole::parse("FINISH"), None);
    }

    #[test]
    fn test_alphabets_do_not_cross() {
        assert_eq!(SupportRole::parse("budget"), None);
        assert_eq!(TravelRole::parse("billing"), None);
        assert_eq!(TravelRole::parse("knowledge_agent"), Some(TravelRole::Knowledge));
    }

    #[test]
    fn test_display_matches_id() {
        for role in SupportRole::all() {
            assert_eq!(role.to_string(), role.id());
        }
        for role in TravelRole::all() {
            assert_eq!(role.to_string(), role.id());
            assert!(!role.description().is_empty());
        }
    }
}
