use {
    crate::errors::{DiscoveryError, Result},
    std::{net::IpAddr, time::Duration},
};

pub const DEFAULT_SAMPLES: usize = 10;
pub const DEFAULT_LABEL_LEN: usize = 10;
pub const DEFAULT_THRESHOLD: f64 = 80.0;

/// Addresses returned for one hostname lookup, in resolver order.
#[derive(Clone, Debug, Default)]
pub struct AddressSet {
    pub hostname: String,
    pub addresses: Vec<IpAddr>,
}

impl AddressSet {
    pub fn new(hostname: impl Into<String>, addresses: Vec<IpAddr>) -> Self {
        AddressSet {
            hostname: hostname.into(),
            addresses,
        }
    }

    /// Order-independent multiset comparison of the addresses. The hostname is
    /// ignored. `IpAddr` equality already requires the same family and bytes.
    pub fn is_equivalent(&self, other: &AddressSet) -> bool {
        if self.addresses.len() != other.addresses.len() {
            return false;
        }
        self.sorted_addresses() == other.sorted_addresses()
    }

    fn sorted_addresses(&self) -> Vec<IpAddr> {
        let mut addresses = self.addresses.clone();
        addresses.sort_unstable();
        addresses
    }

    /// Same addresses under another name, used for the `*.<domain>` banner.
    pub fn renamed(&self, hostname: impl Into<String>) -> Self {
        AddressSet::new(hostname, self.addresses.clone())
    }
}

/// Result of the wildcard sampling. Computed once before the sweep and only
/// read afterwards.
#[derive(Clone, Debug, Default)]
pub struct WildcardVerdict {
    pub consensus: Option<AddressSet>,
    pub similarity: f64,
    pub samples: usize,
    pub resolved: usize,
}

impl WildcardVerdict {
    pub fn is_detected(&self) -> bool {
        self.consensus.is_some()
    }

    pub fn matches(&self, set: &AddressSet) -> bool {
        self.consensus
            .as_ref()
            .is_some_and(|consensus| consensus.is_equivalent(set))
    }
}

/// Outcome of resolving one candidate against the verdict.
#[derive(Clone, Debug)]
pub enum Resolution {
    Found(AddressSet),
    Suppressed(AddressSet),
    NotFound,
}

#[derive(Clone, Debug)]
pub struct WildcardOptions {
    pub samples: usize,
    pub label_len: usize,
    pub threshold: f64,
}

impl Default for WildcardOptions {
    fn default() -> Self {
        WildcardOptions {
            samples: DEFAULT_SAMPLES,
            label_len: DEFAULT_LABEL_LEN,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ScanOptions {
    pub domain: String,
    pub concurrency: usize,
    pub delay: Option<Duration>,
    pub wildcard: WildcardOptions,
}

impl ScanOptions {
    pub fn new(domain: impl Into<String>) -> Self {
        ScanOptions {
            domain: domain.into(),
            concurrency: 1,
            delay: None,
            wildcard: WildcardOptions::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.domain.trim_matches('.').is_empty() {
            return Err(DiscoveryError::InvalidConfig(
                "the target domain is empty".to_string(),
            ));
        }
        if self.concurrency == 0 {
            return Err(DiscoveryError::InvalidConfig(
                "at least one thread is required".to_string(),
            ));
        }
        if self.delay.is_some() && self.concurrency > 1 {
            return Err(DiscoveryError::InvalidConfig(
                "a delay can only be used with a single thread".to_string(),
            ));
        }
        if self.wildcard.samples == 0 || self.wildcard.label_len == 0 {
            return Err(DiscoveryError::InvalidConfig(
                "wildcard sampling needs at least one label of at least one character"
                    .to_string(),
            ));
        }
        if !(0.0..=100.0).contains(&self.wildcard.threshold) {
            return Err(DiscoveryError::InvalidConfig(format!(
                "similarity threshold {} is outside 0-100",
                self.wildcard.threshold
            )));
        }
        Ok(())
    }
}
