//! Domain-based duplicate grouping for organizations.
//!
//! The storage backend gathers every (organization, raw domain string) pair
//! — from the organization's own domain field and from its `domain`-type
//! identifiers — and [`group_by_domain`] turns them into deterministic
//! duplicate groups.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::{
  domain::{is_public_domain, normalize_domain},
  entity::OrganizationSummary,
};

/// Organizations sharing one normalized root domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateGroup {
  pub domain:        String,
  pub organizations: Vec<OrganizationSummary>,
}

impl DuplicateGroup {
  pub fn len(&self) -> usize { self.organizations.len() }

  pub fn is_empty(&self) -> bool { self.organizations.is_empty() }
}

/// Group candidate (organization, raw domain) pairs by normalized domain.
///
/// Empty and public-provider domains are skipped; one organization counts at
/// most once per group even if it matched through both its own field and an
/// identifier. Only groups of two or more survive. Ordering is
/// deterministic: descending group size, then ascending domain.
pub fn group_by_domain(
  candidates: impl IntoIterator<Item = (OrganizationSummary, String)>,
) -> Vec<DuplicateGroup> {
  let mut by_domain: BTreeMap<String, Vec<OrganizationSummary>> =
    BTreeMap::new();
  let mut seen: HashSet<(String, uuid::Uuid)> = HashSet::new();

  for (org, raw) in candidates {
    let domain = normalize_domain(&raw);
    if domain.is_empty() || is_public_domain(&domain) {
      continue;
    }
    if !seen.insert((domain.clone(), org.org_id)) {
      continue;
    }
    by_domain.entry(domain).or_default().push(org);
  }

  let mut groups: Vec<DuplicateGroup> = by_domain
    .into_iter()
    .filter(|(_, orgs)| orgs.len() >= 2)
    .map(|(domain, organizations)| DuplicateGroup { domain, organizations })
    .collect();

  // BTreeMap iteration already yields domains in ascending order, so a
  // stable sort on size alone preserves the lexicographic tie-break.
  groups.sort_by(|a, b| b.len().cmp(&a.len()));
  groups
}

#[cfg(test)]
mod tests {
  use uuid::Uuid;

  use super::*;

  fn org(name: &str) -> OrganizationSummary {
    OrganizationSummary {
      org_id: Uuid::new_v4(),
      name:   Some(name.to_owned()),
      domain: None,
    }
  }

  #[test]
  fn groups_by_normalized_domain() {
    let a = org("Acme");
    let b = org("Acme Ltd");
    let groups = group_by_domain(vec![
      (a.clone(), "https://www.acme.com".to_owned()),
      (b.clone(), "acme.com/about".to_owned()),
    ]);

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].domain, "acme.com");
    assert_eq!(groups[0].len(), 2);
  }

  #[test]
  fn singletons_and_public_domains_are_dropped() {
    let groups = group_by_domain(vec![
      (org("Solo"), "solo.example".to_owned()),
      (org("G1"), "gmail.com".to_owned()),
      (org("G2"), "gmail.com".to_owned()),
      (org("Blank"), "".to_owned()),
    ]);
    assert!(groups.is_empty());
  }

  #[test]
  fn one_org_counts_once_per_domain() {
    let a = org("Acme");
    let b = org("Acme Ltd");
    // `a` matches via its field and an identifier; still one group member.
    let groups = group_by_domain(vec![
      (a.clone(), "acme.com".to_owned()),
      (a.clone(), "www.acme.com".to_owned()),
      (b.clone(), "acme.com".to_owned()),
    ]);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 2);
  }

  #[test]
  fn ordering_is_size_desc_then_domain_asc() {
    let groups = group_by_domain(vec![
      (org("Z1"), "zeta.com".to_owned()),
      (org("Z2"), "zeta.com".to_owned()),
      (org("A1"), "alpha.com".to_owned()),
      (org("A2"), "alpha.com".to_owned()),
      (org("B1"), "beta.com".to_owned()),
      (org("B2"), "beta.com".to_owned()),
      (org("B3"), "beta.com".to_owned()),
    ]);

    let domains: Vec<&str> =
      groups.iter().map(|g| g.domain.as_str()).collect();
    assert_eq!(domains, vec!["beta.com", "alpha.com", "zeta.com"]);
  }
}
