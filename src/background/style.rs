//! Stylesheet text written into the owned style block.

use std::fmt::Write;

use super::settings::TransitionType;

pub const ALPHA_PROPERTY: &str = "--dplus-background-color-alpha";
pub const THEME_SELECTOR: &str = ".theme-dark";
pub const MOUNT_SELECTOR: &str = "div#app-mount";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackgroundStyle<'a> {
    pub alpha: f64,
    pub fading_seconds: f64,
    pub transition: TransitionType,
    /// Empty when nothing has been shown yet.
    pub image_url: &'a str,
}

impl BackgroundStyle<'_> {
    pub fn render(&self) -> String {
        let mut css = String::new();
        let _ = writeln!(css, "{THEME_SELECTOR} {{");
        let _ = writeln!(css, "  {ALPHA_PROPERTY}: {} !important;", self.alpha);
        css.push('}');

        if self.image_url.is_empty() {
            css.push('\n');
            return css;
        }

        let _ = write!(css, "\n\n{MOUNT_SELECTOR} {{\n");
        if let Some(timing) = self.transition.timing_function() {
            let _ = writeln!(
                css,
                "  transition: background-image {}s {timing};",
                self.fading_seconds
            );
        }
        let _ = writeln!(
            css,
            "  background-image: url(\"{}\") !important;",
            escape_css_string(self.image_url)
        );
        css.push_str("  transform: translateZ(0);\n}\n");
        css
    }
}

fn escape_css_string(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' | '\r' => {}
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style(url: &str, transition: TransitionType) -> BackgroundStyle<'_> {
        BackgroundStyle {
            alpha: 0.625,
            fading_seconds: 3.0,
            transition,
            image_url: url,
        }
    }

    #[test]
    fn renders_alpha_image_and_transition() {
        let css = style("http://a/1.png", TransitionType::EaseInOut).render();
        assert_eq!(
            css,
            ".theme-dark {\n  --dplus-background-color-alpha: 0.625 !important;\n}\n\n\
             div#app-mount {\n  transition: background-image 3s ease-in-out;\n  \
             background-image: url(\"http://a/1.png\") !important;\n  \
             transform: translateZ(0);\n}\n"
        );
    }

    #[test]
    fn instant_switch_has_no_transition_rule() {
        let css = style("http://a/1.png", TransitionType::Instant).render();
        assert!(!css.contains("transition"));
        assert!(css.contains("background-image: url(\"http://a/1.png\")"));
    }

    #[test]
    fn no_image_renders_only_the_alpha_rule() {
        let css = style("", TransitionType::Linear).render();
        assert!(css.contains(ALPHA_PROPERTY));
        assert!(!css.contains(MOUNT_SELECTOR));
    }

    #[test]
    fn quotes_are_escaped() {
        let css = style("http://a/\"x\".png", TransitionType::Instant).render();
        assert!(css.contains("url(\"http://a/\\\"x\\\".png\")"));
    }
}
