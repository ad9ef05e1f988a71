//! maildns
//!
//! Mail routing DNS lookups from the command line: MX lists, canonical
//! names, TLSA records, host signatures, and the fallback relay.

mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use console::style;
use maildns_config::{resolv_conf, Config, ResolvConf};
use maildns_metrics::metrics;
use maildns_metrics::tracing_setup::init_tracing;
use maildns_resolver::{MailResolver, MxOptions, StubResolver, TlsaOptions};
use std::path::PathBuf;
use tracing::{debug, warn};

/// Mail routing DNS lookups
#[derive(Parser, Debug)]
#[command(name = "maildns")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, value_name = "FILE", env = "MAILDNS_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, global = true, value_name = "LEVEL")]
    log_level: Option<String>,

    /// resolv.conf to take nameservers and search domains from
    #[arg(long, global = true, value_name = "FILE")]
    resolv_conf: Option<PathBuf>,

    /// Output as JSON for scripting
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve the mail exchangers of a domain
    Mx {
        /// Domain or bracketed address literal
        host: String,

        /// Destination port; fetches TLSA records for every MX host
        #[arg(short, long)]
        port: Option<u16>,

        /// Keep this host in the list instead of cutting at its preference
        #[arg(long)]
        no_local_exclusion: bool,

        /// Never use the fallback relay
        #[arg(long)]
        no_fallback: bool,

        /// Ask for DNSSEC status on the MX query
        #[arg(long)]
        dnssec: bool,
    },

    /// Find the canonical name of a host
    Canon {
        /// Host name
        host: String,

        /// Do not accept an MX record as proof of existence
        #[arg(long)]
        no_mx: bool,
    },

    /// Fetch the TLSA records of an MX host
    Tlsa {
        /// MX host name
        host: String,

        /// Destination port
        #[arg(short, long, default_value_t = 25)]
        port: u16,

        /// The MX answer was DNSSEC-authenticated
        #[arg(long)]
        authenticated: bool,

        /// Name to send as SNI
        #[arg(long)]
        sni: Option<String>,
    },

    /// Compute the host signature of a host list
    Signature {
        /// Hosts separated by ':' or ','
        hosts: String,
    },

    /// Show the expansion of the fallback relay
    Fallback,

    /// Validate the configuration file
    Validate {
        /// Print the effective configuration
        #[arg(short, long)]
        verbose: bool,
    },
}

/// Finds the configuration file in standard locations.
fn find_config_file(explicit_path: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return Some(path);
    }

    let search_paths = [
        PathBuf::from("./maildns.yaml"),
        PathBuf::from("./maildns.yml"),
        PathBuf::from("/etc/maildns/config.yaml"),
        dirs::config_dir()
            .map(|p| p.join("maildns/config.yaml"))
            .unwrap_or_default(),
    ];

    search_paths.into_iter().find(|path| path.is_file())
}

/// Loads the configuration and merges `resolv.conf` into it.
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match find_config_file(cli.config.clone()) {
        Some(path) => Config::from_file(&path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => Config::default(),
    };

    let resolv_path = cli
        .resolv_conf
        .clone()
        .unwrap_or_else(|| PathBuf::from(resolv_conf::DEFAULT_PATH));
    match ResolvConf::from_file(&resolv_path) {
        Ok(conf) => config.resolver.merge_resolv_conf(&conf),
        Err(err) if cli.resolv_conf.is_some() => {
            return Err(err)
                .with_context(|| format!("failed to read {}", resolv_path.display()));
        }
        Err(err) => debug!(path = %resolv_path.display(), error = %err, "no resolv.conf"),
    }

    if let Some(level) = &cli.log_level {
        config.logging.level.clone_from(level);
    }

    config.validate().context("invalid configuration")?;
    Ok(config)
}

/// Builds the resolver and registers this machine's host name as local.
fn build_resolver(config: &Config) -> MailResolver<StubResolver> {
    let mut resolver = MailResolver::from_config(config);
    match hostname::get() {
        Ok(name) => {
            let name = name.to_string_lossy();
            debug!(hostname = %name, "adding system host name to local names");
            resolver.settings_mut().add_local_name(&name);
        }
        Err(err) => warn!(error = %err, "cannot determine the system host name"),
    }
    resolver
}

fn validate_config(path: Option<PathBuf>, verbose: bool) -> Result<()> {
    let config_path = find_config_file(path).context("no configuration file found")?;
    println!("Validating configuration: {}", config_path.display());

    let config = Config::from_file(&config_path)
        .with_context(|| format!("failed to load configuration from {}", config_path.display()))?;
    config.validate().context("configuration validation failed")?;

    if verbose {
        println!("\n{}", style("Effective configuration:").green().bold());
        print!("{}", config.to_yaml()?);
    }

    println!("{}", style("Configuration is valid").green().bold());
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    if let Commands::Validate { verbose } = cli.command {
        return validate_config(cli.config, verbose);
    }

    let config = load_config(&cli)?;
    init_tracing(&config.logging);
    let mut resolver = build_resolver(&config);

    match &cli.command {
        Commands::Mx {
            host,
            port,
            no_local_exclusion,
            no_fallback,
            dnssec,
        } => {
            let opts = MxOptions {
                local_exclusion: !no_local_exclusion,
                fallback: !no_fallback,
                port: *port,
                dnssec: *dnssec,
            };
            let resolution = resolver.resolve_mx(host, opts);
            output::print_mx(host, &resolution, cli.json)?;

            if let Some(port) = port {
                for mx in &resolution.hosts {
                    if let Some(entry) = resolver.tlsa_entry(&mx.host, *port) {
                        output::print_tlsa_entry(&mx.host, *port, entry, cli.json)?;
                    }
                }
            }
        }
        Commands::Canon { host, no_mx } => {
            let result = resolver.canonicalize(host, !no_mx);
            output::print_canon(host, &result, cli.json)?;
        }
        Commands::Tlsa {
            host,
            port,
            authenticated,
            sni,
        } => {
            let opts = TlsaOptions {
                fetch: true,
                authenticated: *authenticated,
                no_expire: false,
            };
            let lookup = resolver.get_tlsa(host, sni.as_deref(), opts, 0, *port);
            output::print_tlsa(host, *port, &lookup, resolver.tlsa_entry(host, *port), cli.json)?;
        }
        Commands::Signature { hosts } => {
            let signature = resolver.host_signature(hosts);
            output::print_signature(hosts, &signature, cli.json)?;
        }
        Commands::Fallback => {
            let hosts = resolver.get_fallback_mx();
            output::print_fallback(resolver.settings().fallback_mx.as_deref(), &hosts, cli.json)?;
        }
        Commands::Validate { .. } => {}
    }

    debug!(counters = ?metrics().snapshot(), "lookup counters");
    Ok(())
}

fn main() -> Result<()> {
    run(Cli::parse())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::io::Write;
    use std::net::SocketAddr;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_mx() {
        let cli = Cli::try_parse_from([
            "maildns",
            "mx",
            "example.org",
            "--port",
            "25",
            "--no-fallback",
        ])
        .unwrap();

        match cli.command {
            Commands::Mx {
                host,
                port,
                no_local_exclusion,
                no_fallback,
                dnssec,
            } => {
                assert_eq!(host, "example.org");
                assert_eq!(port, Some(25));
                assert!(!no_local_exclusion);
                assert!(no_fallback);
                assert!(!dnssec);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_tlsa_defaults() {
        let cli = Cli::try_parse_from(["maildns", "--json", "tlsa", "mx.example.org"]).unwrap();
        assert!(cli.json);
        assert!(matches!(cli.command, Commands::Tlsa { port: 25, authenticated: false, .. }));
    }

    #[test]
    fn test_host_is_required() {
        assert!(Cli::try_parse_from(["maildns", "canon"]).is_err());
    }

    #[test]
    fn test_load_config_merges_resolv_conf() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("maildns.yaml");
        std::fs::write(&config_path, "mx:\n  fallback_mx: relay.example.net\n").unwrap();

        let resolv_path = dir.path().join("resolv.conf");
        let mut resolv = std::fs::File::create(&resolv_path).unwrap();
        writeln!(resolv, "nameserver 192.0.2.53").unwrap();
        writeln!(resolv, "search example.org").unwrap();

        let cli = Cli::try_parse_from([
            "maildns",
            "--config",
            config_path.to_str().unwrap(),
            "--resolv-conf",
            resolv_path.to_str().unwrap(),
            "--log-level",
            "debug",
            "fallback",
        ])
        .unwrap();

        let config = load_config(&cli).unwrap();
        assert_eq!(config.mx.fallback_mx.as_deref(), Some("relay.example.net"));
        let expected: SocketAddr = "192.0.2.53:53".parse().unwrap();
        assert_eq!(config.resolver.nameservers, vec![expected]);
        assert_eq!(config.resolver.search, vec!["example.org".to_string()]);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_missing_explicit_resolv_conf_fails() {
        let cli = Cli::try_parse_from([
            "maildns",
            "--resolv-conf",
            "/nonexistent/resolv.conf",
            "fallback",
        ])
        .unwrap();
        assert!(load_config(&cli).is_err());
    }
}
