use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Canonical role codes.
///
/// Every wire representation of a role (numeric string or legacy textual
/// alias) resolves to exactly one of these through [`RoleMapping`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Role {
    Client,
    Technician,
    Administrator,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Client, Role::Technician, Role::Administrator];

    pub fn code(self) -> u8 {
        match self {
            Role::Client => 1,
            Role::Technician => 2,
            Role::Administrator => 3,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Role::Client),
            2 => Some(Role::Technician),
            3 => Some(Role::Administrator),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Technician => "technician",
            Role::Administrator => "administrator",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Role> for u8 {
    fn from(value: Role) -> Self {
        value.code()
    }
}

impl TryFrom<u8> for Role {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Role::from_code(value).ok_or_else(|| format!("unknown role code {value}"))
    }
}

/// Legacy textual aliases, per canonical role. The issuing side switched from
/// enum names (Spanish and English) to numeric codes, so both forms circulate.
const ALIASES: &[(&str, Role)] = &[
    ("cliente", Role::Client),
    ("client", Role::Client),
    ("customer", Role::Client),
    ("usuario", Role::Client),
    ("user", Role::Client),
    ("tecnico", Role::Technician),
    ("técnico", Role::Technician),
    ("technician", Role::Technician),
    ("tech", Role::Technician),
    ("agente", Role::Technician),
    ("agent", Role::Technician),
    ("administrador", Role::Administrator),
    ("administrator", Role::Administrator),
    ("admin", Role::Administrator),
];

/// Read-only lookup from every legal role representation to its canonical code.
///
/// Built once at startup and shared (`Arc`) by all request flows.
#[derive(Debug, Clone)]
pub struct RoleMapping {
    entries: HashMap<String, Role>,
}

impl RoleMapping {
    /// The standard table: all legacy aliases plus the numeric codes.
    pub fn standard() -> Self {
        let mut entries: HashMap<String, Role> = ALIASES
            .iter()
            .map(|(alias, role)| ((*alias).to_string(), *role))
            .collect();

        for role in Role::ALL {
            entries.insert(role.code().to_string(), role);
        }

        Self { entries }
    }

    /// Resolve a wire representation: case-insensitive alias match first, then
    /// a canonical numeric code. Anything else is unresolved.
    pub fn resolve(&self, raw: &str) -> Option<Role> {
        let key = raw.trim().to_lowercase();
        if let Some(role) = self.entries.get(&key) {
            return Some(*role);
        }

        key.parse::<u8>().ok().and_then(Role::from_code)
    }

    /// All representations known to the table (for diagnostics and tests).
    pub fn representations(&self) -> impl Iterator<Item = (&str, Role)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl Default for RoleMapping {
    fn default() -> Self {
        Self::standard()
    }
}
