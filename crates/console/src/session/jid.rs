use std::collections::BTreeMap;

/// Server part of one-to-one chat addresses.
pub const USER_SERVER: &str = "s.whatsapp.net";
/// Server part of group addresses.
pub const GROUP_SERVER: &str = "g.us";

/// Expands a bare number or group id into a full JID. Values that already
/// carry a server part are returned unchanged.
pub fn normalize(value: &str) -> String {
    if value.contains('@') {
        value.to_string()
    } else if value.contains('-') {
        format!("{value}@{GROUP_SERVER}")
    } else {
        format!("{value}@{USER_SERVER}")
    }
}

/// Operator-friendly names for contacts. Loaded from configuration and
/// read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct AliasBook {
    aliases: BTreeMap<String, String>,
}

impl AliasBook {
    pub fn new(aliases: BTreeMap<String, String>) -> Self {
        Self { aliases }
    }

    /// Alias lookup is case-insensitive; unknown names are treated as numbers.
    pub fn alias_to_jid(&self, alias: &str) -> String {
        self.aliases
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(alias))
            .map(|(_, jid)| normalize(jid))
            .unwrap_or_else(|| normalize(alias))
    }

    pub fn jid_to_alias<'a>(&'a self, jid: &'a str) -> &'a str {
        self.aliases
            .iter()
            .find(|(_, value)| value.as_str() == jid)
            .map(|(name, _)| name.as_str())
            .unwrap_or(jid)
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}
