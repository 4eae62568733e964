use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A CMS entity type that owns rows the search index and caches refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Content,
    Term,
    Role,
    Setting,
    Plugin,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown entity type: {0}")]
pub struct UnknownEntityKind(pub String);

impl EntityKind {
    pub const ALL: [Self; 5] = [
        Self::Content,
        Self::Term,
        Self::Role,
        Self::Setting,
        Self::Plugin,
    ];

    /// Discriminator stored in `search_index.searchable_type`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Content => "content",
            Self::Term => "term",
            Self::Role => "role",
            Self::Setting => "setting",
            Self::Plugin => "plugin",
        }
    }

    #[must_use]
    pub const fn table_name(self) -> &'static str {
        match self {
            Self::Content => "contents",
            Self::Term => "terms",
            Self::Role => "roles",
            Self::Setting => "settings",
            Self::Plugin => "plugins",
        }
    }

    /// Parses a comma separated list, rejecting the first unknown name.
    pub fn parse_list<S: AsRef<str>>(names: &[S]) -> Result<Vec<Self>, UnknownEntityKind> {
        let mut kinds = Vec::with_capacity(names.len());
        for name in names {
            for part in name.as_ref().split(',') {
                if part.trim().is_empty() {
                    continue;
                }
                let kind = part.parse::<Self>()?;
                if !kinds.contains(&kind) {
                    kinds.push(kind);
                }
            }
        }
        Ok(kinds)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = UnknownEntityKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "content" | "contents" | "page" | "pages" | "post" | "posts" => Ok(Self::Content),
            "term" | "terms" | "taxonomy" | "taxonomies" => Ok(Self::Term),
            "role" | "roles" => Ok(Self::Role),
            "setting" | "settings" => Ok(Self::Setting),
            "plugin" | "plugins" => Ok(Self::Plugin),
            _ => Err(UnknownEntityKind(s.trim().to_string())),
        }
    }
}

/// Uniform view over one owner row, used for indexing and cache warming.
#[derive(Debug, Clone, Serialize)]
pub struct EntityRecord {
    pub kind: EntityKind,
    pub id: i64,
    pub title: String,
    pub body: String,
    /// Free-form category label stored as the index entry `type`.
    pub category: String,
    /// Full row as JSON, the value cache warmers store.
    pub attributes: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!("Contents".parse::<EntityKind>(), Ok(EntityKind::Content));
        assert_eq!(" taxonomy ".parse::<EntityKind>(), Ok(EntityKind::Term));
        assert_eq!("plugins".parse::<EntityKind>(), Ok(EntityKind::Plugin));
        assert!("media".parse::<EntityKind>().is_err());
    }

    #[test]
    fn test_parse_list_dedupes_and_splits() {
        let kinds = EntityKind::parse_list(&["content,term", "content"]).unwrap();
        assert_eq!(kinds, vec![EntityKind::Content, EntityKind::Term]);

        let err = EntityKind::parse_list(&["content", "bogus"]).unwrap_err();
        assert_eq!(err, UnknownEntityKind("bogus".to_string()));
    }
}
