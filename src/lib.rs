pub mod dnslib;
pub mod errors;
pub mod report;
pub mod structs;
pub mod utils;

pub use {
    dnslib::{resolve_filtered, run_workers, HickoryLookup, Lookup, PoolStats},
    errors::{DiscoveryError, LookupError, Result},
    report::ReportSink,
    structs::{AddressSet, Resolution, ScanOptions, WildcardOptions, WildcardVerdict},
    utils::{cluster_samples, detect_wildcards},
};
