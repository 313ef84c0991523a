use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccentId {
    #[default]
    Blue,
    Teal,
    Violet,
    Rose,
    Amber,
    Emerald,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccentSwatch {
    pub id: AccentId,
    pub label: &'static str,
    pub color: &'static str,
}

pub const ACCENT_PALETTE: [AccentSwatch; 6] = [
    AccentSwatch {
        id: AccentId::Blue,
        label: "Blue",
        color: "#3B82F6",
    },
    AccentSwatch {
        id: AccentId::Teal,
        label: "Teal",
        color: "#14B8A6",
    },
    AccentSwatch {
        id: AccentId::Violet,
        label: "Violet",
        color: "#8B5CF6",
    },
    AccentSwatch {
        id: AccentId::Rose,
        label: "Rose",
        color: "#F43F5E",
    },
    AccentSwatch {
        id: AccentId::Amber,
        label: "Amber",
        color: "#F59E0B",
    },
    AccentSwatch {
        id: AccentId::Emerald,
        label: "Emerald",
        color: "#10B981",
    },
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown accent id: {0:?}")]
pub struct UnknownAccentError(pub String);

impl AccentId {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Blue => "blue",
            Self::Teal => "teal",
            Self::Violet => "violet",
            Self::Rose => "rose",
            Self::Amber => "amber",
            Self::Emerald => "emerald",
        }
    }

    pub const fn swatch(self) -> AccentSwatch {
        ACCENT_PALETTE[self as usize]
    }

    pub const fn color(self) -> &'static str {
        self.swatch().color
    }

    pub const fn label(self) -> &'static str {
        self.swatch().label
    }
}

impl fmt::Display for AccentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccentId {
    type Err = UnknownAccentError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        ACCENT_PALETTE
            .iter()
            .map(|swatch| swatch.id)
            .find(|id| id.as_str() == normalized)
            .ok_or_else(|| UnknownAccentError(value.to_string()))
    }
}
