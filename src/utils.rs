use {
    crate::{
        dnslib::Lookup,
        errors::{DiscoveryError, Result},
        structs::{AddressSet, WildcardOptions, WildcardVerdict},
    },
    futures::stream::{self, StreamExt},
    hickory_resolver::config::{LookupIpStrategy, ResolverOpts, ServerOrderingStrategy},
    rand::{distr::Alphanumeric, rng, Rng},
    std::net::IpAddr,
    tokio::{fs::File, io::AsyncReadExt},
};

/// Name server IPs from a file, one per line. Blank lines are skipped.
pub async fn return_file_lines(file: &str) -> Result<Vec<IpAddr>> {
    let mut f = File::open(file)
        .await
        .map_err(|source| DiscoveryError::Resolvers {
            path: file.to_string(),
            source,
        })?;
    let mut buffer = String::new();
    f.read_to_string(&mut buffer).await?;

    buffer
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            line.parse::<IpAddr>()
                .map_err(|_| DiscoveryError::InvalidNameServer(line.to_string()))
        })
        .collect()
}

pub fn random_label(len: usize) -> String {
    rng()
        .sample_iter(Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Resolves `options.samples` random labels under `target` and decides whether
/// the domain answers every name with the same address set.
pub async fn detect_wildcards<L: Lookup + ?Sized>(
    target: &str,
    resolver: &L,
    options: &WildcardOptions,
) -> WildcardVerdict {
    let target = target.trim_end_matches('.');
    tracing::info!("Running wildcards detection for {target}");

    let hosts = (0..options.samples)
        .map(|_| format!("{}.{target}", random_label(options.label_len)))
        .collect::<Vec<String>>();

    // `buffered` keeps sample order so the first-seen cluster wins ties.
    let resolved = stream::iter(hosts)
        .map(|host| async move {
            let result = resolver.lookup(&host).await;
            tracing::debug!(%host, ok = result.is_ok(), "wildcard sample");
            result.ok()
        })
        .buffered(options.samples.clamp(1, 10))
        .filter_map(|set| async move { set })
        .collect::<Vec<AddressSet>>()
        .await;

    let verdict = cluster_samples(options.samples, resolved, options.threshold);

    if verdict.is_detected() {
        tracing::info!(
            similarity = verdict.similarity,
            resolved = verdict.resolved,
            "Wildcards detected for {target}"
        );
    } else {
        tracing::info!(
            similarity = verdict.similarity,
            resolved = verdict.resolved,
            "No wildcards detected for {target}"
        );
    }
    verdict
}

/// Groups equivalent sets in arrival order and elects the largest group as the
/// wildcard answer when it covers more than `threshold` percent of the
/// resolved samples. Failed samples are not part of `resolved` at all.
pub fn cluster_samples(
    samples: usize,
    resolved: Vec<AddressSet>,
    threshold: f64,
) -> WildcardVerdict {
    let n = resolved.len();
    let mut clusters: Vec<(AddressSet, usize)> = Vec::new();

    for set in resolved {
        match clusters
            .iter_mut()
            .find(|(representative, _)| representative.is_equivalent(&set))
        {
            Some((_, count)) => *count += 1,
            None => clusters.push((set, 1)),
        }
    }

    let mut largest: Option<(AddressSet, usize)> = None;
    for (representative, count) in clusters {
        if largest.as_ref().map_or(true, |(_, max)| count > *max) {
            largest = Some((representative, count));
        }
    }

    let Some((representative, max)) = largest else {
        return WildcardVerdict {
            consensus: None,
            similarity: 0.0,
            samples,
            resolved: 0,
        };
    };

    let similarity = 100.0 * max as f64 / n as f64;
    WildcardVerdict {
        consensus: (similarity > threshold).then_some(representative),
        similarity,
        samples,
        resolved: n,
    }
}

pub fn return_resolver_opts(timeout: u64, retries: usize) -> ResolverOpts {
    let mut options = ResolverOpts::default();
    options.timeout = std::time::Duration::from_secs(timeout);
    options.attempts = retries;
    options.ip_strategy = LookupIpStrategy::Ipv4AndIpv6;
    options.server_ordering_strategy = ServerOrderingStrategy::RoundRobin;
    options
}
