use std::collections::BTreeMap;

/// Component -> tags written with every entry of that component.
///
/// Used as the default for `cache.tags` and to resolve `--components`.
pub const COMPONENT_TAGS: &[(&str, &[&str])] = &[
    ("users", &["users", "permissions"]),
    ("roles", &["roles", "permissions"]),
    ("permissions", &["permissions"]),
    ("content", &["content"]),
    ("taxonomy", &["taxonomy", "content"]),
    ("media", &["media"]),
    ("settings", &["settings"]),
    ("plugins", &["plugins", "settings"]),
    ("themes", &["themes", "settings"]),
    ("search", &["search"]),
];

#[must_use]
pub fn default_component_tags() -> BTreeMap<String, Vec<String>> {
    COMPONENT_TAGS
        .iter()
        .map(|(component, tags)| {
            (
                (*component).to_string(),
                tags.iter().map(|t| (*t).to_string()).collect(),
            )
        })
        .collect()
}

/// Every tag appearing in `mapping`, sorted and de-duplicated.
#[must_use]
pub fn known_tags(mapping: &BTreeMap<String, Vec<String>>) -> Vec<String> {
    let mut tags: Vec<String> = mapping.values().flatten().cloned().collect();
    tags.sort();
    tags.dedup();
    tags
}

/// Components whose tag list intersects `tags`.
#[must_use]
pub fn components_tagged<'a>(
    mapping: &'a BTreeMap<String, Vec<String>>,
    tags: &[String],
) -> Vec<&'a str> {
    mapping
        .iter()
        .filter(|(_, component_tags)| component_tags.iter().any(|t| tags.contains(t)))
        .map(|(component, _)| component.as_str())
        .collect()
}
