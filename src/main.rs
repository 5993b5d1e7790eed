mod args;

use {
    args::Args,
    clap::Parser,
    dns_discovery::{
        detect_wildcards,
        dnslib::{return_tokio_resolver, HickoryLookup},
        errors::DiscoveryError,
        run_workers,
        utils::{return_file_lines, return_resolver_opts},
        ReportSink,
    },
    tokio::fs::File,
    tracing_subscriber::EnvFilter,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let options = args.scan_options();
    options.validate()?;

    if !args.quiet_flag {
        for line in args.header_lines() {
            println!("{line}");
        }
        println!();
    }

    // Everything that can fail at setup is opened before the first lookup.
    let wordlist = File::open(&args.wordlist)
        .await
        .map_err(|source| DiscoveryError::Wordlist {
            path: args.wordlist.clone(),
            source,
        })?;
    let sink = ReportSink::create(args.report.as_deref(), args.csv.as_deref())?;

    let nameserver_ips = match &args.resolvers {
        Some(file) => return_file_lines(file).await?,
        None => Vec::new(),
    };
    let resolver = HickoryLookup::new(return_tokio_resolver(
        &nameserver_ips,
        return_resolver_opts(args.timeout, args.retries),
    )?);

    let verdict = detect_wildcards(&options.domain, &resolver, &options.wildcard).await;
    if let Some(consensus) = &verdict.consensus {
        sink.emit(&consensus.renamed(format!("*.{}", options.domain)))?;
    }

    run_workers(&resolver, wordlist, &sink, &verdict, &options).await?;
    sink.flush()?;

    Ok(())
}
