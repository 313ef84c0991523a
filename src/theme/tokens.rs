use serde::{Deserialize, Serialize};

use super::Appearance;

/// Semantic color roles consumed by every screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorTokens {
    pub primary: String,
    pub background: String,
    pub card: String,
    pub text: String,
    pub text_secondary: String,
    pub text_muted: String,
    pub border: String,
    pub success: String,
    pub warning: String,
    pub error: String,
    pub info: String,
}

struct TokenTable {
    primary: &'static str,
    background: &'static str,
    card: &'static str,
    text: &'static str,
    text_secondary: &'static str,
    text_muted: &'static str,
    border: &'static str,
    success: &'static str,
    warning: &'static str,
    error: &'static str,
    info: &'static str,
}

const LIGHT_TOKENS: TokenTable = TokenTable {
    primary: "#2563EB",
    background: "#F8FAFC",
    card: "#FFFFFF",
    text: "#0F172A",
    text_secondary: "#475569",
    text_muted: "#94A3B8",
    border: "#E2E8F0",
    success: "#16A34A",
    warning: "#D97706",
    error: "#DC2626",
    info: "#0284C7",
};

const DARK_TOKENS: TokenTable = TokenTable {
    primary: "#60A5FA",
    background: "#0B1120",
    card: "#111827",
    text: "#F1F5F9",
    text_secondary: "#CBD5E1",
    text_muted: "#64748B",
    border: "#1F2937",
    success: "#4ADE80",
    warning: "#FBBF24",
    error: "#F87171",
    info: "#38BDF8",
};

impl TokenTable {
    fn to_tokens(&self) -> ColorTokens {
        ColorTokens {
            primary: self.primary.to_string(),
            background: self.background.to_string(),
            card: self.card.to_string(),
            text: self.text.to_string(),
            text_secondary: self.text_secondary.to_string(),
            text_muted: self.text_muted.to_string(),
            border: self.border.to_string(),
            success: self.success.to_string(),
            warning: self.warning.to_string(),
            error: self.error.to_string(),
            info: self.info.to_string(),
        }
    }
}

pub fn default_color_tokens(appearance: Appearance) -> ColorTokens {
    match appearance {
        Appearance::Light => LIGHT_TOKENS.to_tokens(),
        Appearance::Dark => DARK_TOKENS.to_tokens(),
    }
}

/// Per-appearance color overrides, all fields optional for partial override
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorOverrides {
    pub primary: Option<String>,
    pub background: Option<String>,
    pub card: Option<String>,
    pub text: Option<String>,
    pub text_secondary: Option<String>,
    pub text_muted: Option<String>,
    pub border: Option<String>,
    pub success: Option<String>,
    pub warning: Option<String>,
    pub error: Option<String>,
    pub info: Option<String>,
}

/// Shared overrides plus per-appearance overrides, applied in that order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeColors {
    #[serde(default)]
    pub common: ColorOverrides,
    #[serde(default)]
    pub dark: ColorOverrides,
    #[serde(default)]
    pub light: ColorOverrides,
}

/// Resolve color tokens for an appearance, applying user overrides on top of defaults.
pub fn resolve_color_tokens(appearance: Appearance, overrides: Option<&ThemeColors>) -> ColorTokens {
    let mut tokens = default_color_tokens(appearance);

    if let Some(colors) = overrides {
        apply_overrides(&mut tokens, &colors.common);
        let appearance_overrides = match appearance {
            Appearance::Dark => &colors.dark,
            Appearance::Light => &colors.light,
        };
        apply_overrides(&mut tokens, appearance_overrides);
    }

    tokens
}

fn apply_overrides(tokens: &mut ColorTokens, overrides: &ColorOverrides) {
    let slots = [
        ("primary", &mut tokens.primary, &overrides.primary),
        ("background", &mut tokens.background, &overrides.background),
        ("card", &mut tokens.card, &overrides.card),
        ("text", &mut tokens.text, &overrides.text),
        (
            "text_secondary",
            &mut tokens.text_secondary,
            &overrides.text_secondary,
        ),
        ("text_muted", &mut tokens.text_muted, &overrides.text_muted),
        ("border", &mut tokens.border, &overrides.border),
        ("success", &mut tokens.success, &overrides.success),
        ("warning", &mut tokens.warning, &overrides.warning),
        ("error", &mut tokens.error, &overrides.error),
        ("info", &mut tokens.info, &overrides.info),
    ];
    for (role, slot, value) in slots {
        let Some(value) = value else {
            continue;
        };
        if is_hex_color(value) {
            *slot = value.clone();
        } else {
            tracing::warn!(role, value = value.as_str(), "ignoring color override; expected #RRGGBB or #RRGGBBAA");
        }
    }
}

pub fn is_hex_color(value: &str) -> bool {
    value
        .strip_prefix('#')
        .is_some_and(|hex| matches!(hex.len(), 6 | 8) && hex.chars().all(|ch| ch.is_ascii_hexdigit()))
}
