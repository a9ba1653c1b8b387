//! Embed construction and styling
//!
//! Builds the wire embeds from the configured palette. Colors live in config
//! as `#rrggbb` strings; a value that fails to parse falls back to gray with
//! a warning rather than taking the process down.

use statuswatch_core::client::Embed;
use statuswatch_core::config::EmbedsSection;
use statuswatch_core::report::{BlockColor, ReportBlock};
use tracing::warn;

/// Fallback when a configured color does not parse
const GRAY: u32 = 0x80_80_80;

/// Fixed report-block colors, independent of the configured palette
const BLOCK_RED: u32 = 0xff_00_00;
const BLOCK_YELLOW: u32 = 0xff_ff_00;
const BLOCK_GREEN: u32 = 0x00_ff_00;

/// Parse a `#rrggbb` hex color string
pub fn parse_hex_color(value: &str) -> Option<u32> {
    let digits = value.strip_prefix('#')?;
    if digits.len() != 6 {
        return None;
    }
    u32::from_str_radix(digits, 16).ok()
}

fn color_or_gray(value: &str, which: &str) -> u32 {
    match parse_hex_color(value) {
        Some(color) => color,
        None => {
            warn!(value, which, "unparsable embed color, falling back to gray");
            GRAY
        }
    }
}

/// Resolved embed palette and footer
#[derive(Clone, Debug)]
pub struct EmbedStyle {
    pub default_color: u32,
    pub success_color: u32,
    pub error_color: u32,
    pub footer: String,
}

impl EmbedStyle {
    /// Resolve the configured palette, substituting `{Version}` in the footer
    pub fn from_config(embeds: &EmbedsSection, version: &str) -> Self {
        Self {
            default_color: color_or_gray(&embeds.default_color, "defaultColor"),
            success_color: color_or_gray(&embeds.success_color, "successColor"),
            error_color: color_or_gray(&embeds.error_color, "errorColor"),
            footer: embeds.footer_text.replace("{Version}", version),
        }
    }

    fn base(&self, color: u32, title: Option<String>, description: String) -> Embed {
        Embed {
            title,
            description,
            color,
            footer: Some(self.footer.clone()),
        }
    }

    pub fn default_embed(&self, title: impl Into<String>, description: impl Into<String>) -> Embed {
        self.base(self.default_color, Some(title.into()), description.into())
    }

    pub fn success(&self, title: impl Into<String>, description: impl Into<String>) -> Embed {
        self.base(self.success_color, Some(title.into()), description.into())
    }

    pub fn error(&self, title: impl Into<String>, description: impl Into<String>) -> Embed {
        self.base(self.error_color, Some(title.into()), description.into())
    }

    pub fn simple_error(&self, description: impl Into<String>) -> Embed {
        self.base(self.error_color, None, description.into())
    }

    /// Embed for one status report block
    pub fn report(&self, block: &ReportBlock) -> Embed {
        let color = match block.color {
            BlockColor::Major => BLOCK_RED,
            BlockColor::Partial => BLOCK_YELLOW,
            BlockColor::Maintenance => self.default_color,
            BlockColor::AllClear => BLOCK_GREEN,
        };
        self.base(color, Some(block.title.clone()), block.body.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use statuswatch_core::config::EmbedsSection;

    fn style() -> EmbedStyle {
        EmbedStyle::from_config(&EmbedsSection::default(), "1.0.0")
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#2073cb"), Some(0x2073cb));
        assert_eq!(parse_hex_color("#FFFFFF"), Some(0xffffff));
        assert_eq!(parse_hex_color("2073cb"), None);
        assert_eq!(parse_hex_color("#20c"), None);
        assert_eq!(parse_hex_color("#zzzzzz"), None);
    }

    #[test]
    fn test_bad_color_falls_back_to_gray() {
        let mut section = EmbedsSection::default();
        section.error_color = "red".to_string();
        let style = EmbedStyle::from_config(&section, "1.0.0");
        assert_eq!(style.error_color, GRAY);
        // the rest of the palette is unaffected
        assert_eq!(style.default_color, 0x2073cb);
    }

    #[test]
    fn test_footer_version_substitution() {
        let mut section = EmbedsSection::default();
        section.footer_text = "Statuswatch {Version}".to_string();
        let style = EmbedStyle::from_config(&section, "0.1.0");
        assert_eq!(style.footer, "Statuswatch 0.1.0");
    }

    #[test]
    fn test_report_embed_colors() {
        use statuswatch_core::report::{BlockColor, ReportBlock};
        let style = style();
        let block = |color| ReportBlock {
            title: "Service Status - API".to_string(),
            body: "body".to_string(),
            color,
        };

        assert_eq!(style.report(&block(BlockColor::Major)).color, BLOCK_RED);
        assert_eq!(style.report(&block(BlockColor::Partial)).color, BLOCK_YELLOW);
        assert_eq!(
            style.report(&block(BlockColor::Maintenance)).color,
            style.default_color
        );
        assert_eq!(style.report(&block(BlockColor::AllClear)).color, BLOCK_GREEN);
    }
}
