use {
    crate::{
        errors::{DiscoveryError, Result},
        structs::AddressSet,
    },
    std::{
        fs::File,
        io::{self, BufWriter, Write},
        net::IpAddr,
        sync::{Mutex, PoisonError},
    },
};

type Output = Box<dyn Write + Send>;

struct Outputs {
    console: Output,
    regular: Option<Output>,
    csv: Option<Output>,
}

/// Shared destination for result records. A record is formatted up front and
/// written while holding the lock, so records from different workers never
/// interleave.
pub struct ReportSink {
    outputs: Mutex<Outputs>,
}

impl ReportSink {
    pub fn new(console: impl Write + Send + 'static) -> Self {
        ReportSink {
            outputs: Mutex::new(Outputs {
                console: Box::new(console),
                regular: None,
                csv: None,
            }),
        }
    }

    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    pub fn with_regular_report(self, report: impl Write + Send + 'static) -> Self {
        let mut outputs = self.into_outputs();
        outputs.regular = Some(Box::new(report));
        ReportSink {
            outputs: Mutex::new(outputs),
        }
    }

    pub fn with_csv_report(self, report: impl Write + Send + 'static) -> Self {
        let mut outputs = self.into_outputs();
        outputs.csv = Some(Box::new(report));
        ReportSink {
            outputs: Mutex::new(outputs),
        }
    }

    /// Stdout plus the optional report files. Existing files are truncated.
    pub fn create(regular_path: Option<&str>, csv_path: Option<&str>) -> Result<Self> {
        let mut sink = Self::stdout();
        if let Some(path) = regular_path {
            sink = sink.with_regular_report(return_report_file(path)?);
        }
        if let Some(path) = csv_path {
            sink = sink.with_csv_report(return_report_file(path)?);
        }
        Ok(sink)
    }

    pub fn emit(&self, set: &AddressSet) -> io::Result<()> {
        let record = format_record(set);
        let csv_row = format_csv_row(set);

        let mut outputs = self.outputs.lock().unwrap_or_else(PoisonError::into_inner);
        outputs.console.write_all(record.as_bytes())?;
        if let Some(regular) = outputs.regular.as_mut() {
            regular.write_all(record.as_bytes())?;
        }
        if let Some(csv) = outputs.csv.as_mut() {
            csv.write_all(csv_row.as_bytes())?;
        }
        Ok(())
    }

    pub fn flush(&self) -> io::Result<()> {
        let mut outputs = self.outputs.lock().unwrap_or_else(PoisonError::into_inner);
        outputs.console.flush()?;
        if let Some(regular) = outputs.regular.as_mut() {
            regular.flush()?;
        }
        if let Some(csv) = outputs.csv.as_mut() {
            csv.flush()?;
        }
        Ok(())
    }

    fn into_outputs(self) -> Outputs {
        self.outputs
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn return_report_file(path: &str) -> Result<BufWriter<File>> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|source| DiscoveryError::Report {
            path: path.to_string(),
            source,
        })
}

/// Hostname line, one `IPv<n> address: <ip>` line per address, blank line.
pub fn format_record(set: &AddressSet) -> String {
    let mut record = String::with_capacity(64 + set.addresses.len() * 32);
    record.push_str(&set.hostname);
    record.push('\n');
    for ip in &set.addresses {
        let family = match ip {
            IpAddr::V4(_) => 4,
            IpAddr::V6(_) => 6,
        };
        record.push_str(&format!("IPv{family} address: {ip}\n"));
    }
    record.push('\n');
    record
}

pub fn format_csv_row(set: &AddressSet) -> String {
    let mut row = set.hostname.clone();
    for ip in &set.addresses {
        row.push(',');
        row.push_str(&ip.to_string());
    }
    row.push('\n');
    row
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        std::sync::{Arc, Mutex},
    };

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn sample() -> AddressSet {
        AddressSet::new(
            "www.example.test",
            vec!["192.0.2.10".parse().unwrap(), "2001:db8::10".parse().unwrap()],
        )
    }

    #[test]
    fn regular_record_format() {
        assert_eq!(
            format_record(&sample()),
            "www.example.test\nIPv4 address: 192.0.2.10\nIPv6 address: 2001:db8::10\n\n"
        );
    }

    #[test]
    fn csv_row_format() {
        assert_eq!(
            format_csv_row(&sample()),
            "www.example.test,192.0.2.10,2001:db8::10\n"
        );
    }

    #[test]
    fn emit_writes_every_output() {
        let console = SharedBuffer::default();
        let regular = SharedBuffer::default();
        let csv = SharedBuffer::default();
        let sink = ReportSink::new(console.clone())
            .with_regular_report(regular.clone())
            .with_csv_report(csv.clone());

        sink.emit(&sample()).unwrap();
        sink.flush().unwrap();

        assert_eq!(console.contents(), format_record(&sample()));
        assert_eq!(regular.contents(), format_record(&sample()));
        assert_eq!(csv.contents(), format_csv_row(&sample()));
    }

    #[test]
    fn create_fails_on_unwritable_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("report.txt");
        let result = ReportSink::create(path.to_str(), None);
        assert!(matches!(result, Err(DiscoveryError::Report { .. })));
    }
}
