use anyhow::{bail, Result};

/// Lexical class assigned to a token. Closed set; used solely to pick a
/// display color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Default,
    Keyword,
    String,
    Comment,
    Number,
    Function,
    Tag,
    Attribute,
    CssProperty,
    CssValue,
}

impl Category {
    pub const ALL: [Category; 10] = [
        Category::Default,
        Category::Keyword,
        Category::String,
        Category::Comment,
        Category::Number,
        Category::Function,
        Category::Tag,
        Category::Attribute,
        Category::CssProperty,
        Category::CssValue,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn rgba(self, a: u8) -> [u8; 4] {
        [self.r, self.g, self.b, a]
    }

    /// Parses `#rgb` or `#rrggbb`.
    pub fn from_hex(text: &str) -> Result<Self> {
        let digits = match text.strip_prefix('#') {
            Some(digits) => digits,
            None => bail!("color '{text}' must start with '#'"),
        };
        let expand = |nibble: u8| nibble << 4 | nibble;
        match digits.len() {
            3 => {
                let value = u16::from_str_radix(digits, 16)
                    .map_err(|_| anyhow::anyhow!("invalid hex color '{text}'"))?;
                Ok(Self::rgb(
                    expand(((value >> 8) & 0xf) as u8),
                    expand(((value >> 4) & 0xf) as u8),
                    expand((value & 0xf) as u8),
                ))
            }
            6 => {
                let value = u32::from_str_radix(digits, 16)
                    .map_err(|_| anyhow::anyhow!("invalid hex color '{text}'"))?;
                Ok(Self::rgb(
                    ((value >> 16) & 0xff) as u8,
                    ((value >> 8) & 0xff) as u8,
                    (value & 0xff) as u8,
                ))
            }
            other => bail!("color '{text}' must have 3 or 6 hex digits, got {other}"),
        }
    }
}

/// Immutable color palette. Constructed once, read-only afterwards; renderer
/// instances hold a reference to one of the two built-ins.
#[derive(Debug, Clone)]
pub struct Theme {
    pub name: &'static str,
    pub background: Color,
    pub line_number_bg: Color,
    pub line_number_fg: Color,
    pub default_text: Color,
    /// Darker border for the dark theme, lighter for the light theme.
    pub border: Color,
    keyword: Color,
    string: Color,
    comment: Color,
    function: Color,
    number: Color,
    tag: Color,
    attribute: Color,
    css_property: Color,
    css_value: Color,
}

impl Theme {
    /// Resolves a theme by name. Unknown names fall back to the dark theme.
    pub fn named(name: &str) -> &'static Theme {
        match name {
            "light" => &LIGHT,
            _ => &DARK,
        }
    }

    pub fn is_known(name: &str) -> bool {
        matches!(name, "dark" | "light")
    }

    /// Total lookup: every category maps to a color, `Default` resolves to
    /// the default text color.
    pub fn color(&self, category: Category) -> Color {
        match category {
            Category::Default => self.default_text,
            Category::Keyword => self.keyword,
            Category::String => self.string,
            Category::Comment => self.comment,
            Category::Number => self.number,
            Category::Function => self.function,
            Category::Tag => self.tag,
            Category::Attribute => self.attribute,
            Category::CssProperty => self.css_property,
            Category::CssValue => self.css_value,
        }
    }
}

// VS Code-ish palette.
pub static DARK: Theme = Theme {
    name: "dark",
    background: Color::rgb(0x1e, 0x1e, 0x1e),
    line_number_bg: Color::rgb(0x2d, 0x2d, 0x2d),
    line_number_fg: Color::rgb(0x85, 0x85, 0x85),
    default_text: Color::rgb(0xd4, 0xd4, 0xd4),
    border: Color::rgb(0x33, 0x33, 0x33),
    keyword: Color::rgb(0x56, 0x9c, 0xd6),
    string: Color::rgb(0xce, 0x91, 0x78),
    comment: Color::rgb(0x6a, 0x99, 0x55),
    function: Color::rgb(0xdc, 0xdc, 0xaa),
    number: Color::rgb(0xb5, 0xce, 0xa8),
    tag: Color::rgb(0x56, 0x9c, 0xd6),
    attribute: Color::rgb(0x92, 0xc5, 0xf8),
    css_property: Color::rgb(0x9c, 0xdc, 0xfe),
    css_value: Color::rgb(0xce, 0x91, 0x78),
};

// Visual Studio-ish palette.
pub static LIGHT: Theme = Theme {
    name: "light",
    background: Color::rgb(0xff, 0xff, 0xff),
    line_number_bg: Color::rgb(0xf5, 0xf5, 0xf5),
    line_number_fg: Color::rgb(0x99, 0x99, 0x99),
    default_text: Color::rgb(0x33, 0x33, 0x33),
    border: Color::rgb(0xcc, 0xcc, 0xcc),
    keyword: Color::rgb(0x00, 0x00, 0xff),
    string: Color::rgb(0xa3, 0x15, 0x15),
    comment: Color::rgb(0x00, 0x80, 0x00),
    function: Color::rgb(0x79, 0x5e, 0x26),
    number: Color::rgb(0x09, 0x86, 0x58),
    tag: Color::rgb(0x80, 0x00, 0x00),
    attribute: Color::rgb(0x00, 0x00, 0xff),
    css_property: Color::rgb(0x80, 0x00, 0x80),
    css_value: Color::rgb(0xa3, 0x15, 0x15),
};

#[cfg(test)]
mod tests {
    use super::{Category, Color, Theme};

    #[test]
    fn every_category_resolves_in_both_themes() {
        for theme in [Theme::named("dark"), Theme::named("light")] {
            for category in Category::ALL {
                let _ = theme.color(category);
            }
        }
    }

    #[test]
    fn unknown_theme_name_falls_back_to_dark() {
        assert_eq!(Theme::named("solarized").name, "dark");
        assert_eq!(Theme::named("").name, "dark");
        assert_eq!(Theme::named("light").name, "light");
    }

    #[test]
    fn hex_parsing_accepts_short_and_long_forms() {
        assert_eq!(
            Color::from_hex("#2d2d2d").unwrap(),
            Color::rgb(0x2d, 0x2d, 0x2d)
        );
        assert_eq!(Color::from_hex("#fff").unwrap(), Color::rgb(0xff, 0xff, 0xff));
        assert_eq!(
            Color::from_hex("#a1B2c3").unwrap(),
            Color::rgb(0xa1, 0xb2, 0xc3)
        );
    }

    #[test]
    fn hex_parsing_rejects_malformed_input() {
        assert!(Color::from_hex("2d2d2d").is_err());
        assert!(Color::from_hex("#12345").is_err());
        assert!(Color::from_hex("#gggggg").is_err());
    }
}
