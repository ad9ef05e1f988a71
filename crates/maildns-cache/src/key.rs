//! Cache key derivation.

/// Builds the storage key for `host` and `port`: `_{port}.{host}`.
///
/// The host is lower-cased and loses one trailing dot, so `MX.example.`
/// and `mx.example` share an entry.
pub fn tlsa_key(port: u16, host: &str) -> String {
    let host = host.strip_suffix('.').unwrap_or(host);
    let mut key = String::with_capacity(host.len() + 7);
    key.push('_');
    key.push_str(&port.to_string());
    key.push('.');
    key.extend(host.chars().map(|c| c.to_ascii_lowercase()));
    key
}

/// Splits a key back into port and host.
pub fn split_key(key: &str) -> Option<(u16, &str)> {
    let (port, host) = key.strip_prefix('_')?.split_once('.')?;
    Some((port.parse().ok()?, host))
}
