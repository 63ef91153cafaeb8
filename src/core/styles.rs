//! Output style roles for the CLI
//!
//! Each logical role (table header, failure count, ...) maps to an optional
//! `colored::Color`. Colour is only applied when the caller says so, so the
//! same rendering code serves terminals, pipes and `--no-color`.

use clap::builder::styling::AnsiColor;
use colored::{Color, Colorize};

macro_rules! style {
    ( $( $variant:ident => $color:expr ),+ $(,)? ) => {
        #[derive(Copy, Clone, Debug, PartialEq, Eq)]
        pub enum StyleRole { $( $variant ),+ }

        impl StyleRole {
            pub fn color(self) -> Option<Color> {
                match self { $( StyleRole::$variant => $color ),+ }
            }
        }
    }
}

style! {
    Header  => Some(Color::Yellow),
    Key     => Some(Color::BrightGreen),
    Value   => None,
    Success => Some(Color::Green),
    Failure => Some(Color::BrightRed),
    Dim     => Some(Color::BrightBlack),
}

impl StyleRole {
    pub fn paint(self, text: &str, enabled: bool) -> String {
        match self.color() {
            Some(color) if enabled => text.color(color).to_string(),
            _ => text.to_string(),
        }
    }

    /// prettytable style spec (e.g. `"bFy"`) for a table cell in this role
    pub fn table_spec(self, enabled: bool, bold: bool) -> String {
        let mut spec = String::new();
        if bold {
            spec.push('b');
        }
        if let Some(code) = self.color().filter(|_| enabled).and_then(prettytable_color) {
            spec.push('F');
            spec.push(code);
        }
        spec
    }
}

fn prettytable_color(color: Color) -> Option<char> {
    Some(match color {
        Color::Black => 'k',
        Color::Red => 'r',
        Color::Green => 'g',
        Color::Yellow => 'y',
        Color::Blue => 'b',
        Color::Magenta => 'm',
        Color::Cyan => 'c',
        Color::White => 'w',
        Color::BrightBlack => 'K',
        Color::BrightRed => 'R',
        Color::BrightGreen => 'G',
        Color::BrightYellow => 'Y',
        Color::BrightBlue => 'B',
        Color::BrightMagenta => 'M',
        Color::BrightCyan => 'C',
        Color::BrightWhite => 'W',
        _ => return None,
    })
}

fn clap_color(color: Color) -> Option<AnsiColor> {
    Some(match color {
        Color::Yellow => AnsiColor::Yellow,
        Color::Green => AnsiColor::Green,
        Color::BrightGreen => AnsiColor::BrightGreen,
        Color::BrightRed => AnsiColor::BrightRed,
        Color::BrightBlack => AnsiColor::BrightBlack,
        _ => return None,
    })
}

/// clap help styles built from the same roles
pub fn clap_styles() -> clap::builder::Styles {
    use clap::builder::styling::{Color as ClapColor, Style};

    let style = |role: StyleRole, bold: bool| {
        let mut style = Style::new().fg_color(role.color().and_then(clap_color).map(ClapColor::Ansi));
        if bold {
            style = style.bold();
        }
        style
    };

    clap::builder::Styles::styled()
        .header(style(StyleRole::Header, true))
        .usage(style(StyleRole::Header, true))
        .literal(style(StyleRole::Key, false))
        .placeholder(style(StyleRole::Success, false))
        .error(style(StyleRole::Failure, true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paint_respects_enabled_flag() {
        colored::control::set_override(true);
        let painted = StyleRole::Header.paint("Partition", true);
        assert!(painted.starts_with("\x1b[33m"), "got {:?}", painted);
        assert_eq!(StyleRole::Header.paint("Partition", false), "Partition");
        assert_eq!(StyleRole::Value.paint("42", true), "42");
    }

    #[test]
    fn test_table_spec() {
        assert_eq!(StyleRole::Header.table_spec(true, true), "bFy");
        assert_eq!(StyleRole::Header.table_spec(false, true), "b");
        assert_eq!(StyleRole::Failure.table_spec(true, false), "FR");
        assert_eq!(StyleRole::Value.table_spec(true, false), "");
    }
}
