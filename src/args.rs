use {
    clap::Parser,
    dns_discovery::structs::{
        ScanOptions, WildcardOptions, DEFAULT_LABEL_LEN, DEFAULT_SAMPLES, DEFAULT_THRESHOLD,
    },
    std::time::Duration,
};

pub const DEFAULT_WORDLIST: &str = "wordlist.wl";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[arg(help = "Target domain.")]
    pub domain: String,

    #[arg(
        short,
        long,
        default_value = DEFAULT_WORDLIST,
        help = "Wordlist file, one subdomain label per line."
    )]
    pub wordlist: String,

    #[arg(short, long, help = "Number of threads. Default: 1")]
    pub threads: Option<usize>,

    #[arg(short, long, help = "Regular report file.")]
    pub report: Option<String>,

    #[arg(short, long, help = "CSV report file.")]
    pub csv: Option<String>,

    #[arg(
        short,
        long,
        help = "Delay in milliseconds between lookups. Only allowed with a single thread."
    )]
    pub delay: Option<u64>,

    #[arg(
        short,
        long,
        default_value_t = DEFAULT_SAMPLES,
        help = "Number of random subdomains used for wildcard detection. Default: 10"
    )]
    pub samples: usize,

    #[arg(
        long,
        default_value_t = DEFAULT_THRESHOLD,
        help = "Percentage of matching samples above which the domain is a wildcard. Default: 80"
    )]
    pub threshold: f64,

    #[arg(long, help = "File with DNS ips.")]
    pub resolvers: Option<String>,

    #[arg(long, default_value_t = 3, help = "Timeout in seconds. Default: 3")]
    pub timeout: u64,

    #[arg(
        long,
        default_value_t = 0,
        help = "Number of retries after lookup failure before giving up. Defaults to 0"
    )]
    pub retries: usize,

    #[arg(short, long, help = "Quiet mode, no header lines.")]
    pub quiet_flag: bool,
}

impl Args {
    /// Run summary printed before the sweep. `THREADS` only appears when the
    /// thread count was given explicitly.
    pub fn header_lines(&self) -> Vec<String> {
        let mut lines = vec![format!("DOMAIN: {}", self.domain.trim_matches('.'))];
        if let Some(threads) = self.threads {
            lines.push(format!("THREADS: {threads}"));
        }
        if let Some(report) = &self.report {
            lines.push(format!("REGULAR REPORT: {report}"));
        }
        if let Some(csv) = &self.csv {
            lines.push(format!("CSV REPORT: {csv}"));
        }
        lines.push(format!("WORDLIST: {}", self.wordlist));
        lines
    }

    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            domain: self.domain.trim_matches('.').to_string(),
            concurrency: self.threads.unwrap_or(1),
            delay: self.delay.map(Duration::from_millis),
            wildcard: WildcardOptions {
                samples: self.samples,
                label_len: DEFAULT_LABEL_LEN,
                threshold: self.threshold,
            },
        }
    }
}
