//! Theme colors, optionally overridden from the `[theme]` config table

use ratatui::style::Color;

use crate::config::ThemeColors;

/// Theme colors for the UI
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub accent: Color,      // Focused borders, highlights, key hints
    pub danger: Color,      // Validation errors
    pub success: Color,     // Enabled submit, valid fields
    pub warning: Color,     // Status messages
    pub text: Color,        // Primary text
    pub text_dim: Color,    // Labels, hints
    pub bg_selected: Color, // Focused row background
    pub inactive: Color,    // Unfocused borders, empty slider track
    pub header: Color,      // Box titles and headline figures
}

impl Default for Theme {
    fn default() -> Self {
        // Catppuccin-inspired
        Self {
            accent: Color::Rgb(250, 179, 135),
            danger: Color::Rgb(243, 139, 168),
            success: Color::Rgb(166, 218, 149),
            warning: Color::Rgb(250, 179, 135),
            text: Color::Rgb(205, 214, 244),
            text_dim: Color::Rgb(147, 153, 178),
            bg_selected: Color::Rgb(69, 71, 90),
            inactive: Color::Rgb(88, 91, 112),
            header: Color::Rgb(137, 180, 250),
        }
    }
}

impl Theme {
    /// Defaults with every parseable override from the config applied
    pub fn from_config(colors: &ThemeColors) -> Self {
        let base = Self::default();
        let pick = |value: &Option<String>, fallback: Color| {
            match value.as_deref() {
                Some(hex) => Self::parse_hex_color(hex).unwrap_or_else(|| {
                    tracing::warn!("Ignoring invalid theme color '{}'", hex);
                    fallback
                }),
                None => fallback,
            }
        };

        Self {
            accent: pick(&colors.accent, base.accent),
            danger: pick(&colors.danger, base.danger),
            success: pick(&colors.success, base.success),
            warning: pick(&colors.warning, base.warning),
            text: pick(&colors.text, base.text),
            text_dim: pick(&colors.text_dim, base.text_dim),
            bg_selected: pick(&colors.bg_selected, base.bg_selected),
            inactive: pick(&colors.inactive, base.inactive),
            header: pick(&colors.header, base.header),
        }
    }

    /// Parse a hex color string (#RRGGBB or #RGB)
    fn parse_hex_color(s: &str) -> Option<Color> {
        let s = s.trim().trim_start_matches('#');
        if !s.is_ascii() {
            return None;
        }

        if s.len() == 6 {
            let r = u8::from_str_radix(&s[0..2], 16).ok()?;
            let g = u8::from_str_radix(&s[2..4], 16).ok()?;
            let b = u8::from_str_radix(&s[4..6], 16).ok()?;
            Some(Color::Rgb(r, g, b))
        } else if s.len() == 3 {
            let r = u8::from_str_radix(&s[0..1], 16).ok()? * 17;
            let g = u8::from_str_radix(&s[1..2], 16).ok()? * 17;
            let b = u8::from_str_radix(&s[2..3], 16).ok()? * 17;
            Some(Color::Rgb(r, g, b))
        } else {
            None
        }
    }
}
