//! Terminal and JSON rendering of lookup results.

use anyhow::Result;
use console::style;
use maildns_cache::{FetchError, TlsaEntry};
use maildns_resolver::{
    parse_host_signature, CanonResult, CanonStatus, MxResolution, MxStatus, TlsaLookup,
    TlsaStatus,
};
use serde::Serialize;

/// TLSA cache entry as shown to the user.
#[derive(Debug, Serialize)]
pub struct TlsaReport {
    pub host: String,
    pub port: u16,
    pub records: Vec<String>,
    pub flags: Vec<String>,
    pub error: Option<FetchError>,
    pub sni: Option<String>,
}

impl TlsaReport {
    pub fn new(host: &str, port: u16, entry: &TlsaEntry) -> Self {
        Self {
            host: host.to_string(),
            port,
            records: entry.records().iter().map(ToString::to_string).collect(),
            flags: entry
                .flags()
                .iter_names()
                .map(|(name, _)| name.to_ascii_lowercase())
                .collect(),
            error: entry.error(),
            sni: entry.sni().map(str::to_string),
        }
    }
}

#[derive(Serialize)]
struct TlsaOutput<'a> {
    #[serde(flatten)]
    lookup: &'a TlsaLookup,
    entry: Option<TlsaReport>,
}

#[derive(Serialize)]
struct SignatureOutput<'a> {
    hosts: &'a str,
    signature: &'a str,
    groups: Vec<(String, u16)>,
}

#[derive(Serialize)]
struct FallbackOutput<'a> {
    fallback_mx: Option<&'a str>,
    hosts: &'a [String],
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn status_line(ok: bool, text: &str) -> String {
    let indicator = if ok { style("●").green() } else { style("●").red() };
    format!("{} {}", indicator, style(text).bold())
}

pub fn print_mx(domain: &str, resolution: &MxResolution, json: bool) -> Result<()> {
    if json {
        return print_json(resolution);
    }

    println!(
        "{}",
        status_line(resolution.status == MxStatus::Success, &format!("MX {domain}"))
    );
    println!("  {}          {}", style("Status:").dim(), resolution.status);
    println!("  {}             {}", style("TTL:").dim(), resolution.ttl);
    println!("  {}   {}", style("Authenticated:").dim(), resolution.authenticated);

    if resolution.hosts.is_empty() {
        return Ok(());
    }

    println!();
    println!(
        "  {:>10}  {:>6}  {}",
        style("PREFERENCE").cyan(),
        style("WEIGHT").cyan(),
        style("HOST").cyan()
    );
    for mx in &resolution.hosts {
        println!("  {:>10}  {:>6}  {}", mx.preference, mx.weight, mx.host);
    }
    Ok(())
}

pub fn print_canon(host: &str, result: &CanonResult, json: bool) -> Result<()> {
    if json {
        return print_json(result);
    }

    println!(
        "{}",
        status_line(result.status == CanonStatus::Success, &format!("Canonical name of {host}"))
    );
    println!("  {}           {}", style("Name:").dim(), result.host);
    println!("  {}         {}", style("Status:").dim(), result.status);
    println!("  {}            {}", style("TTL:").dim(), result.ttl);
    println!("  {}  {}", style("Authenticated:").dim(), result.authenticated);
    Ok(())
}

pub fn print_tlsa(
    host: &str,
    port: u16,
    lookup: &TlsaLookup,
    entry: Option<&TlsaEntry>,
    json: bool,
) -> Result<()> {
    let report = entry.map(|entry| TlsaReport::new(host, port, entry));
    if json {
        return print_json(&TlsaOutput { lookup, entry: report });
    }

    let ok = matches!(lookup.status, TlsaStatus::Cached | TlsaStatus::Fetched);
    println!("{}", status_line(ok, &format!("TLSA _{port}._tcp.{host}")));
    println!("  {}   {}", style("Status:").dim(), lookup.status);
    println!("  {}  {}", style("Records:").dim(), lookup.count);
    if let Some(report) = report {
        print_report_body(&report);
    }
    Ok(())
}

pub fn print_tlsa_entry(host: &str, port: u16, entry: &TlsaEntry, json: bool) -> Result<()> {
    let report = TlsaReport::new(host, port, entry);
    if json {
        return print_json(&report);
    }

    println!();
    println!("{}", style(format!("TLSA _{port}._tcp.{host}")).cyan().bold());
    print_report_body(&report);
    Ok(())
}

fn print_report_body(report: &TlsaReport) {
    if !report.flags.is_empty() {
        println!("  {}    {}", style("Flags:").dim(), report.flags.join(" "));
    }
    if let Some(error) = report.error {
        println!("  {}    {:?}", style("Error:").dim(), error);
    }
    if let Some(sni) = &report.sni {
        println!("  {}      {}", style("SNI:").dim(), sni);
    }
    for record in &report.records {
        println!("    {record}");
    }
}

pub fn print_signature(hosts: &str, signature: &str, json: bool) -> Result<()> {
    if json {
        return print_json(&SignatureOutput {
            hosts,
            signature,
            groups: parse_host_signature(signature),
        });
    }

    println!("{}", signature);
    Ok(())
}

pub fn print_fallback(fallback_mx: Option<&str>, hosts: &[String], json: bool) -> Result<()> {
    if json {
        return print_json(&FallbackOutput { fallback_mx, hosts });
    }

    let Some(fallback) = fallback_mx else {
        println!("{}", style("No fallback relay configured").yellow());
        return Ok(());
    };

    println!("{}", status_line(!hosts.is_empty(), &format!("Fallback relay {fallback}")));
    for host in hosts {
        println!("  {host}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use maildns_cache::{ArrivalOrder, TlsaFlags, TlsaRecord};

    #[test]
    fn test_tlsa_report() {
        let mut entry = TlsaEntry::new();
        entry.set_flags(TlsaFlags::NEW, false);
        let mut rdata = vec![3, 1, 1];
        rdata.extend_from_slice(&[0xab; 32]);
        entry.insert(TlsaRecord::new(rdata), &ArrivalOrder);
        entry.set_sni(Some("mx.example.org".into()));

        let report = TlsaReport::new("mx.example.org", 25, &entry);
        assert_eq!(report.records.len(), 1);
        assert!(report.flags.contains(&"supported".to_string()));
        assert!(!report.flags.contains(&"new".to_string()));
        assert_eq!(report.sni.as_deref(), Some("mx.example.org"));
        assert_eq!(report.error, None);
    }

    #[test]
    fn test_tlsa_report_serializes() {
        let entry = TlsaEntry::new();
        let report = TlsaReport::new("mx.example.org", 25, &entry);
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["port"], 25);
        assert_eq!(value["flags"][0], "new");
    }
}
