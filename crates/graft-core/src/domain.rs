//! Domain normalization and the public-provider filter.
//!
//! Organizations are matched on their *root* domain: `https://www.Acme.co.uk/about`,
//! `mail.acme.co.uk` and `acme.co.uk` all canonicalize to `acme.co.uk`.
//! Consumer email providers (gmail.com and friends) are never treated as
//! organizational identity — a shared mailbox provider proves nothing.

/// Compound second-level country-code TLDs. When the last two labels of a
/// hostname match one of these, the registrable domain is three labels, not
/// two (`acme.co.uk`, not `co.uk`).
const COMPOUND_TLDS: &[&str] = &[
  "co.uk", "org.uk", "ac.uk", "gov.uk", "com.au", "net.au", "org.au",
  "co.jp", "co.nz", "co.in", "co.kr", "co.za", "com.br", "com.mx",
  "com.sg", "com.cn", "com.hk", "com.tw", "com.ar",
];

/// Major consumer email providers, excluded from identity matching.
const PUBLIC_DOMAINS: &[&str] = &[
  "gmail.com", "googlemail.com", "yahoo.com", "ymail.com", "rocketmail.com",
  "hotmail.com", "outlook.com", "live.com", "msn.com", "aol.com",
  "icloud.com", "me.com", "mac.com", "protonmail.com", "proton.me", "pm.me",
  "gmx.com", "gmx.net", "mail.com", "inbox.com", "yandex.com", "yandex.ru",
  "zoho.com", "fastmail.com", "hey.com", "tutanota.com", "qq.com",
  "163.com", "126.com", "naver.com", "web.de", "t-online.de", "seznam.cz",
  "wanadoo.fr", "orange.fr", "comcast.net", "verizon.net", "att.net",
  "sbcglobal.net", "rediffmail.com",
];

/// Canonicalize a raw domain or URL string to a comparable root domain.
///
/// Pure and total: blank or unparseable input yields `""`, the only
/// "no result" signal.
pub fn normalize_domain(raw: &str) -> String {
  let trimmed = raw.trim().to_ascii_lowercase();
  if trimmed.is_empty() {
    return String::new();
  }

  // With a scheme, the host is whatever sits between `://` and the next
  // path/query separator. Without one, strip any trailing path/query.
  let host = match trimmed.split_once("://") {
    Some((_, rest)) => rest,
    None => &trimmed,
  };
  let host = host
    .split(['/', '?'])
    .next()
    .unwrap_or_default();
  let host = host.strip_prefix("www.").unwrap_or(host);
  let host = host.split(':').next().unwrap_or_default();

  if host.is_empty() || !host.contains('.') {
    return String::new();
  }

  let labels: Vec<&str> = host.split('.').collect();
  if labels.iter().any(|l| l.is_empty()) {
    return String::new();
  }
  if labels.len() <= 2 {
    return host.to_owned();
  }

  let last_two = labels[labels.len() - 2..].join(".");
  let keep = if COMPOUND_TLDS.contains(&last_two.as_str()) { 3 } else { 2 };
  labels[labels.len() - keep..].join(".")
}

/// Case-insensitive membership test against the consumer-provider set.
pub fn is_public_domain(domain: &str) -> bool {
  let lower = domain.trim().to_ascii_lowercase();
  PUBLIC_DOMAINS.contains(&lower.as_str())
}

/// Extract and normalize the domain of an email address. Returns `""` for
/// anything without an `@`.
pub fn email_domain(address: &str) -> String {
  match address.rsplit_once('@') {
    Some((_, dom)) if !dom.is_empty() => normalize_domain(dom),
    _ => String::new(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn strips_scheme_www_and_path() {
    assert_eq!(normalize_domain("https://www.Acme.CO.UK/about"), "acme.co.uk");
    assert_eq!(normalize_domain("acme.co.uk"), "acme.co.uk");
    assert_eq!(normalize_domain("http://example.com?utm=x"), "example.com");
    assert_eq!(normalize_domain("example.com/pricing"), "example.com");
  }

  #[test]
  fn collapses_subdomains_to_root() {
    assert_eq!(normalize_domain("mail.example.com"), "example.com");
    assert_eq!(normalize_domain("a.b.c.example.com"), "example.com");
    assert_eq!(normalize_domain("mail.acme.co.jp"), "acme.co.jp");
  }

  #[test]
  fn keeps_short_hosts_as_is() {
    assert_eq!(normalize_domain("example.com"), "example.com");
    assert_eq!(normalize_domain("co.uk"), "co.uk");
  }

  #[test]
  fn strips_ports() {
    assert_eq!(normalize_domain("example.com:8080"), "example.com");
    assert_eq!(normalize_domain("https://example.com:443/x"), "example.com");
  }

  #[test]
  fn blank_and_unparseable_yield_empty() {
    assert_eq!(normalize_domain(""), "");
    assert_eq!(normalize_domain("   "), "");
    assert_eq!(normalize_domain("not a domain"), "");
    assert_eq!(normalize_domain("https://"), "");
    assert_eq!(normalize_domain("trailing.dot."), "");
  }

  #[test]
  fn public_filter_is_case_insensitive() {
    assert!(is_public_domain("gmail.com"));
    assert!(is_public_domain("GMail.Com"));
    assert!(!is_public_domain("acme.com"));
    assert!(!is_public_domain(""));
  }

  #[test]
  fn email_domain_normalizes() {
    assert_eq!(email_domain("jo@mail.acme.co.uk"), "acme.co.uk");
    assert_eq!(email_domain("jo@acme.com"), "acme.com");
    assert_eq!(email_domain("not-an-email"), "");
    assert_eq!(email_domain("trailing@"), "");
  }
}
