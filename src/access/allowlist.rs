use ipnet::IpNet;
use std::fmt;
use std::net::IpAddr;

use super::network::{canonical, is_private_addr};

/// The single external address or range allowed in besides internal traffic.
///
/// Parsed once from `ALLOWED_HOME_IP` at startup and never changed afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AllowedNetwork {
    /// Nothing configured: internal traffic only
    #[default]
    Unset,
    /// Bare address, compared to the client address as an exact string
    Literal(String),
    /// CIDR range
    Range(IpNet),
    /// CIDR syntax that failed to parse; behaves like `Unset` but is reported
    Invalid { raw: String, reason: String },
}

impl AllowedNetwork {
    pub fn parse(raw: &str) -> Self {
        if raw.is_empty() {
            return AllowedNetwork::Unset;
        }

        if raw.contains('/') {
            return match raw.parse::<IpNet>() {
                Ok(net) => AllowedNetwork::Range(net),
                Err(e) => AllowedNetwork::Invalid {
                    raw: raw.to_string(),
                    reason: e.to_string(),
                },
            };
        }

        AllowedNetwork::Literal(raw.to_string())
    }
}

impl fmt::Display for AllowedNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllowedNetwork::Unset => write!(f, "<unset>"),
            AllowedNetwork::Literal(ip) => write!(f, "{}", ip),
            AllowedNetwork::Range(net) => write!(f, "{}", net),
            AllowedNetwork::Invalid { raw, .. } => write!(f, "{} (invalid)", raw),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllowReason {
    PrivateNetwork,
    AllowedLiteral,
    AllowedRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    NoAllowlist,
    NotAllowed,
    InvalidClientAddress,
    InvalidAllowlist,
}

impl DenyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenyReason::NoAllowlist => "no_allowlist",
            DenyReason::NotAllowed => "not_allowed",
            DenyReason::InvalidClientAddress => "invalid_client_address",
            DenyReason::InvalidAllowlist => "invalid_allowlist",
        }
    }
}

/// Outcome of a single admission check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow(AllowReason),
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow(_))
    }
}

/// IP allowlist decision engine.
///
/// Internal addresses are always admitted. Everything else must match the
/// configured [`AllowedNetwork`]; any doubt resolves to a denial.
#[derive(Debug, Clone, Default)]
pub struct AdmissionFilter {
    allowed: AllowedNetwork,
}

impl AdmissionFilter {
    pub fn new(allowed: AllowedNetwork) -> Self {
        Self { allowed }
    }

    /// Allow/deny for a client address string
    pub fn decide(&self, client_ip: &str) -> bool {
        self.evaluate(client_ip).is_allowed()
    }

    /// Full decision including the reason, used for logging
    pub fn evaluate(&self, client_ip: &str) -> Decision {
        let parsed = client_ip.parse::<IpAddr>().ok();

        if let Some(addr) = parsed {
            if is_private_addr(&addr) {
                return Decision::Allow(AllowReason::PrivateNetwork);
            }
        }

        match &self.allowed {
            AllowedNetwork::Unset => Decision::Deny(DenyReason::NoAllowlist),
            AllowedNetwork::Invalid { raw, reason } => {
                tracing::error!(allowed = %raw, error = %reason, "Invalid ALLOWED_HOME_IP CIDR");
                Decision::Deny(DenyReason::InvalidAllowlist)
            }
            AllowedNetwork::Range(net) => match parsed {
                Some(addr) if net.contains(&canonical(addr)) => {
                    Decision::Allow(AllowReason::AllowedRange)
                }
                Some(_) => Decision::Deny(DenyReason::NotAllowed),
                None => Decision::Deny(DenyReason::InvalidClientAddress),
            },
            AllowedNetwork::Literal(allowed) => {
                // Unparsable clients never match, even if the configured literal is garbage too
                if parsed.is_none() {
                    Decision::Deny(DenyReason::InvalidClientAddress)
                } else if client_ip == allowed {
                    Decision::Allow(AllowReason::AllowedLiteral)
                } else {
                    Decision::Deny(DenyReason::NotAllowed)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::layer::{Context, SubscriberExt};
    use tracing_subscriber::Layer;

    fn filter(raw: &str) -> AdmissionFilter {
        AdmissionFilter::new(AllowedNetwork::parse(raw))
    }

    const PRIVATE_SAMPLES: [&str; 6] = [
        "10.1.2.3",
        "172.20.0.5",
        "192.168.100.1",
        "fdaa:0:1::1",
        "fc00::10",
        "fd00:abcd::1",
    ];

    #[test]
    fn parses_configuration_variants() {
        assert_eq!(AllowedNetwork::parse(""), AllowedNetwork::Unset);
        assert_eq!(
            AllowedNetwork::parse("203.0.113.5"),
            AllowedNetwork::Literal("203.0.113.5".to_string())
        );
        assert!(matches!(AllowedNetwork::parse("203.0.113.0/24"), AllowedNetwork::Range(_)));
        assert!(matches!(
            AllowedNetwork::parse("not-a-cidr/bogus"),
            AllowedNetwork::Invalid { .. }
        ));
        assert!(matches!(
            AllowedNetwork::parse("203.0.113.0/33"),
            AllowedNetwork::Invalid { .. }
        ));
    }

    #[test]
    fn private_addresses_always_allowed() {
        for raw in ["", "203.0.113.5", "203.0.113.0/24", "not-a-cidr/bogus"] {
            let f = filter(raw);
            for ip in PRIVATE_SAMPLES {
                assert_eq!(
                    f.evaluate(ip),
                    Decision::Allow(AllowReason::PrivateNetwork),
                    "{} with ALLOWED_HOME_IP={:?}",
                    ip,
                    raw
                );
            }
        }
    }

    #[test]
    fn unset_denies_public_addresses() {
        let f = filter("");
        assert_eq!(f.evaluate("8.8.8.8"), Decision::Deny(DenyReason::NoAllowlist));
        assert!(!f.decide("203.0.113.5"));
        assert!(!f.decide("2001:db8::1"));
    }

    #[test]
    fn literal_requires_exact_string_match() {
        let f = filter("203.0.113.5");
        assert_eq!(f.evaluate("203.0.113.5"), Decision::Allow(AllowReason::AllowedLiteral));
        assert_eq!(f.evaluate("203.0.113.6"), Decision::Deny(DenyReason::NotAllowed));
        // Same address, different spelling
        assert!(!f.decide("::ffff:203.0.113.5"));
    }

    #[test]
    fn literal_ipv6_comparison_is_case_sensitive() {
        let f = filter("2001:db8::a");
        assert!(f.decide("2001:db8::a"));
        assert!(!f.decide("2001:DB8::A"));
        assert!(!f.decide("2001:0db8::a"));
    }

    #[test]
    fn range_allows_contained_addresses() {
        let f = filter("203.0.113.0/24");
        assert_eq!(f.evaluate("203.0.113.1"), Decision::Allow(AllowReason::AllowedRange));
        assert!(f.decide("203.0.113.254"));
        assert_eq!(f.evaluate("203.0.114.1"), Decision::Deny(DenyReason::NotAllowed));
    }

    #[test]
    fn ipv6_range() {
        let f = filter("2001:db8:1234::/48");
        assert!(f.decide("2001:db8:1234:5::1"));
        assert!(!f.decide("2001:db8:1235::1"));
        assert!(!f.decide("203.0.113.1"));
    }

    #[test]
    fn invalid_range_denies_public_addresses() {
        let f = filter("not-a-cidr/bogus");
        assert_eq!(f.evaluate("8.8.8.8"), Decision::Deny(DenyReason::InvalidAllowlist));
        assert!(!f.decide("203.0.113.5"));
    }

    #[test]
    fn unparsable_client_is_denied() {
        assert_eq!(filter("").evaluate("garbage"), Decision::Deny(DenyReason::NoAllowlist));
        assert_eq!(
            filter("203.0.113.0/24").evaluate("garbage"),
            Decision::Deny(DenyReason::InvalidClientAddress)
        );
        assert_eq!(
            filter("garbage").evaluate("garbage"),
            Decision::Deny(DenyReason::InvalidClientAddress)
        );
        assert!(!filter("203.0.113.5").decide(""));
    }

    #[test]
    fn decisions_are_idempotent() {
        let f = filter("203.0.113.0/24");
        for ip in ["203.0.113.7", "8.8.8.8", "10.0.0.1", "garbage"] {
            assert_eq!(f.evaluate(ip), f.evaluate(ip));
        }
    }

    struct ErrorCounter(Arc<AtomicUsize>);

    impl<S: Subscriber> Layer<S> for ErrorCounter {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            if *event.metadata().level() == Level::ERROR {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    #[test]
    fn invalid_range_logs_once_per_evaluation() {
        let count = Arc::new(AtomicUsize::new(0));
        let subscriber = tracing_subscriber::registry().with(ErrorCounter(count.clone()));
        let f = filter("not-a-cidr/bogus");

        tracing::subscriber::with_default(subscriber, || {
            assert!(!f.decide("8.8.8.8"));
            assert_eq!(count.load(Ordering::SeqCst), 1);
            assert!(!f.decide("1.1.1.1"));
            assert_eq!(count.load(Ordering::SeqCst), 2);
            // Private traffic never reaches the allowlist check
            assert!(f.decide("10.0.0.1"));
            assert_eq!(count.load(Ordering::SeqCst), 2);
        });
    }
}
