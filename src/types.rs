//! Type tags for whitelistable entities and exemptable exceptions.

use std::fmt;

/// Kind of external entity a whitelist group can hold.
///
/// Stored as an integer code in the `members` table; the code values are
/// part of the persisted format and must not be reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    User,
    Channel,
    Server,
    Role,
    Member,
}

impl EntityKind {
    /// Integer code used in the database.
    pub fn code(self) -> i64 {
        match self {
            Self::User => 0,
            Self::Channel => 1,
            Self::Server => 2,
            Self::Role => 3,
            Self::Member => 4,
        }
    }

    /// Decode a database integer code.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::User),
            1 => Some(Self::Channel),
            2 => Some(Self::Server),
            3 => Some(Self::Role),
            4 => Some(Self::Member),
            _ => None,
        }
    }

    /// Parse a user-facing spelling. Alias and plural forms collapse to
    /// the canonical tag.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "u" | "usr" | "usrs" | "user" | "users" => Some(Self::User),
            "c" | "chnl" | "chnls" | "channel" | "channels" => Some(Self::Channel),
            "s" | "srvr" | "srvrs" | "server" | "servers" | "g" | "guild" | "guilds" => {
                Some(Self::Server)
            }
            "r" | "role" | "roles" => Some(Self::Role),
            "mem" | "member" | "members" => Some(Self::Member),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Channel => "channel",
            Self::Server => "server",
            Self::Role => "role",
            Self::Member => "member",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Kind of exception record: a command or a whole module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExceptionKind {
    Command,
    Module,
}

impl ExceptionKind {
    /// Integer code used in the database.
    pub fn code(self) -> i64 {
        match self {
            Self::Command => 0,
            Self::Module => 1,
        }
    }

    /// Decode a database integer code.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Command),
            1 => Some(Self::Module),
            _ => None,
        }
    }

    /// Parse a user-facing spelling, collapsing aliases.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "cmd" | "cmds" | "command" | "commands" => Some(Self::Command),
            "mod" | "mods" | "mdl" | "mdls" | "module" | "modules" => Some(Self::Module),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Command => "command",
            Self::Module => "module",
        }
    }
}

impl fmt::Display for ExceptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
