use {
    crate::{
        errors::{DiscoveryError, LookupError, Result},
        report::ReportSink,
        structs::{AddressSet, Resolution, ScanOptions, WildcardVerdict},
    },
    async_trait::async_trait,
    futures::future,
    hickory_resolver::{
        config::{NameServerConfigGroup, ResolverConfig, ResolverOpts},
        name_server::TokioConnectionProvider,
        TokioResolver,
    },
    std::{io, net::IpAddr, ops::AddAssign},
    tokio::{
        io::{AsyncBufReadExt, AsyncRead, BufReader},
        sync::Mutex,
    },
};

/// Address lookup by name. Implementations return every A and AAAA record of
/// the name, or `LookupError::NotFound` when there is none.
#[async_trait]
pub trait Lookup: Send + Sync {
    async fn lookup(&self, hostname: &str) -> std::result::Result<AddressSet, LookupError>;
}

pub struct HickoryLookup {
    resolver: TokioResolver,
}

impl HickoryLookup {
    pub fn new(resolver: TokioResolver) -> Self {
        HickoryLookup { resolver }
    }
}

#[async_trait]
impl Lookup for HickoryLookup {
    async fn lookup(&self, hostname: &str) -> std::result::Result<AddressSet, LookupError> {
        let lookup_host = hostname.trim_end_matches('.').to_owned() + ".";

        match self.resolver.lookup_ip(lookup_host).await {
            Ok(ips) => {
                let addresses: Vec<IpAddr> = ips.iter().collect();
                if addresses.is_empty() {
                    Err(LookupError::NotFound)
                } else {
                    Ok(AddressSet::new(hostname, addresses))
                }
            }
            Err(e) if e.is_no_records_found() => Err(LookupError::NotFound),
            Err(e) => Err(LookupError::Resolver(e.to_string())),
        }
    }
}

/// System resolver configuration when `nameserver_ips` is empty, otherwise
/// plain UDP/TCP name servers on port 53.
pub fn return_tokio_resolver(
    nameserver_ips: &[IpAddr],
    options: ResolverOpts,
) -> Result<TokioResolver> {
    let builder = if nameserver_ips.is_empty() {
        TokioResolver::builder(TokioConnectionProvider::default())
            .map_err(|e| DiscoveryError::Resolver(e.to_string()))?
    } else {
        let name_servers = NameServerConfigGroup::from_ips_clear(nameserver_ips, 53, false);
        TokioResolver::builder_with_config(
            ResolverConfig::from_parts(None, vec![], name_servers),
            TokioConnectionProvider::default(),
        )
    };

    Ok(builder.with_options(options).build())
}

pub async fn resolve_filtered<L: Lookup + ?Sized>(
    resolver: &L,
    hostname: &str,
    verdict: &WildcardVerdict,
) -> Resolution {
    match resolver.lookup(hostname).await {
        Ok(set) if verdict.matches(&set) => Resolution::Suppressed(set),
        Ok(set) => Resolution::Found(set),
        Err(e) => {
            tracing::trace!(hostname, error = %e, "lookup failed");
            Resolution::NotFound
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub processed: usize,
    pub found: usize,
    pub suppressed: usize,
}

impl AddAssign for PoolStats {
    fn add_assign(&mut self, other: Self) {
        self.processed += other.processed;
        self.found += other.found;
        self.suppressed += other.suppressed;
    }
}

/// Runs `options.concurrency` workers over one shared wordlist reader and
/// returns once the reader is exhausted and every worker has finished.
pub async fn run_workers<L, R>(
    resolver: &L,
    wordlist: R,
    sink: &ReportSink,
    verdict: &WildcardVerdict,
    options: &ScanOptions,
) -> Result<PoolStats>
where
    L: Lookup + ?Sized,
    R: AsyncRead + Unpin,
{
    options.validate()?;

    let wordlist = Mutex::new(BufReader::new(wordlist));
    let domain = options.domain.trim_end_matches('.');

    let workers = (0..options.concurrency)
        .map(|id| run_worker(id, resolver, &wordlist, sink, verdict, domain, options));

    let stats = future::try_join_all(workers).await?.into_iter().fold(
        PoolStats::default(),
        |mut total, stats| {
            total += stats;
            total
        },
    );

    tracing::info!(
        processed = stats.processed,
        found = stats.found,
        suppressed = stats.suppressed,
        "sweep finished"
    );
    Ok(stats)
}

async fn run_worker<L, R>(
    id: usize,
    resolver: &L,
    wordlist: &Mutex<BufReader<R>>,
    sink: &ReportSink,
    verdict: &WildcardVerdict,
    domain: &str,
    options: &ScanOptions,
) -> Result<PoolStats>
where
    L: Lookup + ?Sized,
    R: AsyncRead + Unpin,
{
    let mut stats = PoolStats::default();

    loop {
        let Some(line) = next_line(wordlist).await? else {
            break;
        };

        let word = chomp(&line);
        if word.is_empty() {
            continue;
        }

        let hostname = format!("{word}.{domain}");
        stats.processed += 1;

        match resolve_filtered(resolver, &hostname, verdict).await {
            Resolution::Found(set) => {
                sink.emit(&set)?;
                stats.found += 1;
            }
            Resolution::Suppressed(_) => stats.suppressed += 1,
            Resolution::NotFound => {}
        }

        if let Some(delay) = options.delay {
            tokio::time::sleep(delay).await;
        }
    }

    tracing::debug!(worker = id, processed = stats.processed, "worker done");
    Ok(stats)
}

/// Reads one raw line under the lock. Bytes that are not UTF-8 are replaced
/// instead of failing the read, so one bad entry never ends the sweep.
async fn next_line<R: AsyncRead + Unpin>(
    wordlist: &Mutex<BufReader<R>>,
) -> io::Result<Option<String>> {
    let mut buf = Vec::new();
    if wordlist.lock().await.read_until(b'\n', &mut buf).await? == 0 {
        return Ok(None);
    }
    Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
}

/// Cuts the line at its first line terminator and strips surrounding blanks.
fn chomp(line: &str) -> &str {
    line.split(['\r', '\n']).next().unwrap_or_default().trim()
}

#[cfg(test)]
mod tests {
    use {super::*, std::collections::HashMap};

    struct StaticLookup(HashMap<String, Vec<IpAddr>>);

    #[async_trait]
    impl Lookup for StaticLookup {
        async fn lookup(&self, hostname: &str) -> std::result::Result<AddressSet, LookupError> {
            match self.0.get(hostname) {
                Some(addresses) => Ok(AddressSet::new(hostname, addresses.clone())),
                None => Err(LookupError::NotFound),
            }
        }
    }

    fn lookup_with(entries: &[(&str, &str)]) -> StaticLookup {
        StaticLookup(
            entries
                .iter()
                .map(|(host, ip)| (host.to_string(), vec![ip.parse().unwrap()]))
                .collect(),
        )
    }

    fn wildcard(ip: &str) -> WildcardVerdict {
        WildcardVerdict {
            consensus: Some(AddressSet::new("*.example.test", vec![ip.parse().unwrap()])),
            similarity: 100.0,
            samples: 10,
            resolved: 10,
        }
    }

    #[test]
    fn chomp_cuts_at_first_terminator() {
        assert_eq!(chomp("www"), "www");
        assert_eq!(chomp("www\r"), "www");
        assert_eq!(chomp("  mail \r\nignored"), "mail");
        assert_eq!(chomp("\r"), "");
    }

    #[tokio::test]
    async fn filter_passes_results_without_wildcard() {
        let resolver = lookup_with(&[("www.example.test", "10.0.0.1")]);
        let verdict = WildcardVerdict::default();

        let resolution = resolve_filtered(&resolver, "www.example.test", &verdict).await;
        assert!(matches!(resolution, Resolution::Found(set) if set.hostname == "www.example.test"));
    }

    #[tokio::test]
    async fn filter_suppresses_wildcard_matches() {
        let resolver = lookup_with(&[
            ("www.example.test", "192.0.2.1"),
            ("junk.example.test", "10.0.0.1"),
        ]);
        let verdict = wildcard("10.0.0.1");

        assert!(matches!(
            resolve_filtered(&resolver, "junk.example.test", &verdict).await,
            Resolution::Suppressed(_)
        ));
        assert!(matches!(
            resolve_filtered(&resolver, "www.example.test", &verdict).await,
            Resolution::Found(_)
        ));
        assert!(matches!(
            resolve_filtered(&resolver, "missing.example.test", &verdict).await,
            Resolution::NotFound
        ));
    }

    #[tokio::test]
    async fn pool_skips_blank_lines() {
        let resolver = lookup_with(&[("www.example.test", "192.0.2.1")]);
        let sink = ReportSink::new(std::io::sink());
        let options = ScanOptions::new("example.test");

        let stats = run_workers(
            &resolver,
            "www\n\n  \r\nnope\n".as_bytes(),
            &sink,
            &WildcardVerdict::default(),
            &options,
        )
        .await
        .unwrap();

        assert_eq!(
            stats,
            PoolStats {
                processed: 2,
                found: 1,
                suppressed: 0
            }
        );
    }

    #[tokio::test]
    async fn pool_rejects_delay_with_many_workers() {
        let resolver = lookup_with(&[]);
        let sink = ReportSink::new(std::io::sink());
        let mut options = ScanOptions::new("example.test");
        options.concurrency = 4;
        options.delay = Some(std::time::Duration::from_millis(1));

        let result = run_workers(
            &resolver,
            "www\n".as_bytes(),
            &sink,
            &WildcardVerdict::default(),
            &options,
        )
        .await;
        assert!(matches!(result, Err(DiscoveryError::InvalidConfig(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn pool_waits_between_lookups() {
        let resolver = lookup_with(&[("www.example.test", "192.0.2.1")]);
        let sink = ReportSink::new(std::io::sink());
        let mut options = ScanOptions::new("example.test");
        options.delay = Some(std::time::Duration::from_millis(250));

        let start = tokio::time::Instant::now();
        let stats = run_workers(
            &resolver,
            "www\nmail\napi\n".as_bytes(),
            &sink,
            &WildcardVerdict::default(),
            &options,
        )
        .await
        .unwrap();

        assert_eq!(stats.processed, 3);
        assert!(start.elapsed() >= std::time::Duration::from_millis(750));
    }
}
