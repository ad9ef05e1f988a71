//! `resolv.conf` import.

use super::Result;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use tracing::debug;

/// Default location of the system resolver configuration.
pub const DEFAULT_PATH: &str = "/etc/resolv.conf";

/// The subset of `resolv.conf` the resolver understands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvConf {
    pub nameservers: Vec<SocketAddr>,
    pub domain: Option<String>,
    pub search: Vec<String>,
    pub ndots: Option<u8>,
    /// Per-try timeout in seconds.
    pub timeout: Option<u32>,
    pub attempts: Option<u32>,
    pub inet6: bool,
}

impl ResolvConf {
    /// Parses `resolv.conf` text. Unknown keywords and malformed values
    /// are skipped, as the system resolver does.
    pub fn parse(text: &str) -> Self {
        let mut conf = Self::default();

        for line in text.lines() {
            let line = line
                .split(|c| c == '#' || c == ';')
                .next()
                .unwrap_or_default()
                .trim();
            let mut words = line.split_whitespace();
            let Some(keyword) = words.next() else {
                continue;
            };

            match keyword {
                "nameserver" => match words.next().map(str::parse::<IpAddr>) {
                    Some(Ok(ip)) => conf.nameservers.push(SocketAddr::new(ip, 53)),
                    other => debug!(value = ?other, "ignoring nameserver line"),
                },
                // the last of domain/search wins
                "domain" => {
                    if let Some(domain) = words.next() {
                        conf.domain = Some(domain.trim_end_matches('.').to_string());
                        conf.search.clear();
                    }
                }
                // the first search entry doubles as the local domain
                "search" => {
                    conf.search = words.map(|w| w.trim_end_matches('.').to_string()).collect();
                    conf.domain = conf.search.first().cloned();
                }
                "options" => {
                    for option in words {
                        conf.apply_option(option);
                    }
                }
                _ => debug!(keyword, "ignoring resolv.conf keyword"),
            }
        }

        conf
    }

    /// Reads and parses a `resolv.conf` file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::parse(&text))
    }

    fn apply_option(&mut self, option: &str) {
        let (name, value) = option.split_once(':').unwrap_or((option, ""));
        match name {
            "ndots" => self.ndots = value.parse().ok(),
            "timeout" => self.timeout = value.parse().ok(),
            "attempts" => self.attempts = value.parse().ok(),
            "inet6" => self.inet6 = true,
            _ => debug!(option, "ignoring resolv.conf option"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full() {
        let conf = ResolvConf::parse(
            "# generated\n\
             nameserver 192.0.2.53\n\
             nameserver 2001:db8::53 ; secondary\n\
             nameserver not-an-address\n\
             search example.com. mail.example.com\n\
             options ndots:3 timeout:2 attempts:4 rotate inet6\n",
        );

        assert_eq!(conf.nameservers.len(), 2);
        assert_eq!(conf.nameservers[1], "[2001:db8::53]:53".parse().unwrap());
        assert_eq!(conf.search, vec!["example.com", "mail.example.com"]);
        assert_eq!(conf.domain.as_deref(), Some("example.com"));
        assert_eq!(conf.ndots, Some(3));
        assert_eq!(conf.timeout, Some(2));
        assert_eq!(conf.attempts, Some(4));
        assert!(conf.inet6);
    }

    #[test]
    fn test_domain_overrides_search() {
        let conf = ResolvConf::parse("search a.example b.example\ndomain c.example\n");
        assert_eq!(conf.domain.as_deref(), Some("c.example"));
        assert!(conf.search.is_empty());
    }

    #[test]
    fn test_search_overrides_domain() {
        let conf = ResolvConf::parse("domain c.example\nsearch a.example b.example\n");
        assert_eq!(conf.domain.as_deref(), Some("a.example"));
        assert_eq!(conf.search, vec!["a.example", "b.example"]);

        let conf = ResolvConf::parse("search\n");
        assert_eq!(conf.domain, None);
    }

    #[test]
    fn test_bad_option_values() {
        let conf = ResolvConf::parse("options ndots:many timeout:\n");
        assert_eq!(conf.ndots, None);
        assert_eq!(conf.timeout, None);
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resolv.conf");
        std::fs::write(&path, "nameserver 127.0.0.53\n").unwrap();

        let conf = ResolvConf::from_file(&path).unwrap();
        assert_eq!(conf.nameservers, vec!["127.0.0.53:53".parse().unwrap()]);
        assert!(ResolvConf::from_file(dir.path().join("missing")).is_err());
    }
}
