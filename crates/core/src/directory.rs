//! Organization lookup by name.

use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;

use crate::Error;
use crate::models::Organization;

/// Resolves a free-form organization name to its canonical record.
#[async_trait]
pub trait OrganizationDirectory: Send + Sync {
    /// Best match for `name`, or `None` when nothing matches.
    async fn find_by_name(&self, name: &str) -> Result<Option<Organization>, Error>;
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DirectoryFile {
    Wrapped { agencies: Vec<Organization> },
    Bare(Vec<Organization>),
}

/// Directory held in memory, loaded from a JSON file of organizations.
///
/// Nested `children` are searchable on their own; a match returns the child
/// record without its parent.
#[derive(Debug, Clone, Default)]
pub struct JsonDirectory {
    organizations: Vec<Organization>,
}

impl JsonDirectory {
    pub fn from_organizations(organizations: Vec<Organization>) -> Self {
        let mut flat = Vec::new();
        for org in organizations {
            flatten_into(org, &mut flat);
        }
        Self { organizations: flat }
    }

    /// Load `{"agencies": [...]}` (or a bare array) from `path`.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file: DirectoryFile = serde_json::from_slice(&bytes)
            .map_err(|e| Error::Parse(format!("directory file {}: {e}", path.display())))?;

        let organizations = match file {
            DirectoryFile::Wrapped { agencies } => agencies,
            DirectoryFile::Bare(list) => list,
        };
        let directory = Self::from_organizations(organizations);
        tracing::info!(organizations = directory.len(), path = %path.display(), "loaded organization directory");
        Ok(directory)
    }

    pub fn len(&self) -> usize {
        self.organizations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.organizations.is_empty()
    }

    /// Rank matches: exact name, exact short name, exact display name, then
    /// any substring match. Ties go to the shortest name.
    pub fn lookup(&self, name: &str) -> Option<&Organization> {
        let needle = name.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }

        self.organizations
            .iter()
            .filter_map(|org| match_rank(org, &needle).map(|rank| (rank, org.name.chars().count(), org)))
            .min_by_key(|(rank, len, _)| (*rank, *len))
            .map(|(_, _, org)| org)
    }
}

fn flatten_into(mut org: Organization, out: &mut Vec<Organization>) {
    let children = std::mem::take(&mut org.children);
    out.push(org);
    for child in children {
        flatten_into(child, out);
    }
}

fn match_rank(org: &Organization, needle: &str) -> Option<u8> {
    let name = org.name.to_lowercase();
    let short = org.short_name.as_deref().map(str::to_lowercase);
    let display = org.display_name.as_deref().map(str::to_lowercase);

    if name == needle {
        return Some(1);
    }
    if short.as_deref() == Some(needle) {
        return Some(2);
    }
    if display.as_deref() == Some(needle) {
        return Some(3);
    }

    let partial = name.contains(needle)
        || short.as_deref().is_some_and(|s| s.contains(needle))
        || display.as_deref().is_some_and(|s| s.contains(needle));
    partial.then_some(4)
}

#[async_trait]
impl OrganizationDirectory for JsonDirectory {
    async fn find_by_name(&self, name: &str) -> Result<Option<Organization>, Error> {
        Ok(self.lookup(name).cloned())
    }
}
