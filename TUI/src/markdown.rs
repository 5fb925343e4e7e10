//! Light markdown rendering for assistant replies.
//!
//! The stylist model answers with headings, bullet lists and emphasis; this
//! turns that into styled, width-wrapped ratatui lines. Anything it does not
//! recognize is shown as plain text.

use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};
use unicode_width::UnicodeWidthStr;

/// Colors for markdown elements
const HEADING_COLOR: Color = Color::Rgb(97, 175, 239);
const BOLD_COLOR: Color = Color::Rgb(224, 208, 183);
const ITALIC_COLOR: Color = Color::Rgb(152, 195, 121);
const LINK_COLOR: Color = Color::Rgb(86, 182, 194);
const LIST_BULLET_COLOR: Color = Color::Rgb(198, 120, 221);
const QUOTE_COLOR: Color = Color::Rgb(128, 128, 128);
const RULE_COLOR: Color = Color::Rgb(80, 80, 80);

/// Inline run of text with one emphasis.
#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    Text(String),
    Bold(String),
    Italic(String),
    Link { text: String, url: String },
}

/// One source line, classified.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading { level: u8, text: String },
    Bullet { indent: usize, content: Vec<Inline> },
    Quote(String),
    Rule,
    Paragraph(Vec<Inline>),
    Blank,
}

pub fn parse_blocks(text: &str) -> Vec<Block> {
    text.lines().map(parse_line).collect()
}

fn parse_line(line: &str) -> Block {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Block::Blank;
    }
    if matches!(trimmed, "---" | "***" | "___") {
        return Block::Rule;
    }
    if trimmed.starts_with('#') {
        let level = trimmed.chars().take_while(|c| *c == '#').count();
        if level <= 6 {
            return Block::Heading {
                level: level as u8,
                text: trimmed.trim_start_matches('#').trim().to_string(),
            };
        }
    }
    if let Some(quote) = trimmed.strip_prefix('>') {
        return Block::Quote(quote.trim().to_string());
    }

    let indent = line.len() - line.trim_start().len();
    for marker in ["- ", "* ", "+ ", "• "] {
        if let Some(rest) = trimmed.strip_prefix(marker) {
            return Block::Bullet {
                indent,
                content: parse_inline(rest),
            };
        }
    }
    if let Some((number, rest)) = trimmed.split_once(". ") {
        if !number.is_empty() && number.chars().all(|c| c.is_ascii_digit()) {
            return Block::Bullet {
                indent,
                content: parse_inline(rest),
            };
        }
    }

    Block::Paragraph(parse_inline(trimmed))
}

/// Splits `**bold**`, `*italic*` / `_italic_` and `[text](url)` out of a line.
/// Unclosed markers stay literal.
pub fn parse_inline(line: &str) -> Vec<Inline> {
    let mut out = Vec::new();
    let mut plain = String::new();
    let mut rest = line;

    while let Some(c) = rest.chars().next() {
        let parsed = match c {
            '*' if rest.starts_with("**") => {
                delimited(&rest[2..], "**").map(|(inner, tail)| (Inline::Bold(inner.to_string()), tail))
            }
            '*' => delimited(&rest[1..], "*").map(|(inner, tail)| (Inline::Italic(inner.to_string()), tail)),
            '_' if plain.chars().last().map_or(true, |p| !p.is_alphanumeric()) => {
                delimited(&rest[1..], "_").map(|(inner, tail)| (Inline::Italic(inner.to_string()), tail))
            }
            '[' => link(rest),
            _ => None,
        };

        match parsed {
            Some((inline, tail)) => {
                if !plain.is_empty() {
                    out.push(Inline::Text(std::mem::take(&mut plain)));
                }
                out.push(inline);
                rest = tail;
            }
            None => {
                plain.push(c);
                rest = &rest[c.len_utf8()..];
            }
        }
    }
    if !plain.is_empty() {
        out.push(Inline::Text(plain));
    }
    out
}

fn delimited<'a>(s: &'a str, close: &str) -> Option<(&'a str, &'a str)> {
    let end = s.find(close)?;
    if end == 0 {
        return None;
    }
    Some((&s[..end], &s[end + close.len()..]))
}

fn link(s: &str) -> Option<(Inline, &str)> {
    let close = s.find("](")?;
    let text = &s[1..close];
    let after = &s[close + 2..];
    let end = after.find(')')?;
    Some((
        Inline::Link {
            text: text.to_string(),
            url: after[..end].to_string(),
        },
        &after[end + 1..],
    ))
}

fn inline_style(inline: &Inline) -> (String, Style) {
    match inline {
        Inline::Text(t) => (t.clone(), Style::default()),
        Inline::Bold(t) => (t.clone(), Style::default().fg(BOLD_COLOR).add_modifier(Modifier::BOLD)),
        Inline::Italic(t) => (t.clone(), Style::default().fg(ITALIC_COLOR).add_modifier(Modifier::ITALIC)),
        Inline::Link { text, .. } => (
            text.clone(),
            Style::default().fg(LINK_COLOR).add_modifier(Modifier::UNDERLINED),
        ),
    }
}

/// Greedy word wrap over styled runs. `prefix` starts the first line and
/// its width is used as the hanging indent for the rest.
fn wrap(prefix: Vec<Span<'static>>, runs: &[(String, Style)], width: usize) -> Vec<Line<'static>> {
    let indent: usize = prefix.iter().map(|s| s.content.width()).sum();
    let width = width.max(indent + 8);
    let mut lines = Vec::new();
    let mut current: Vec<Span<'static>> = prefix;
    let mut used = indent;

    for (text, style) in runs {
        for word in text.split_inclusive(' ') {
            let visible = word.trim_end().width();
            if used + visible > width && used > indent {
                lines.push(Line::from(std::mem::take(&mut current)));
                current.push(Span::raw(" ".repeat(indent)));
                used = indent;
            }
            current.push(Span::styled(word.to_string(), *style));
            used += word.width();
        }
    }
    lines.push(Line::from(current));
    lines
}

/// Render assistant text into styled lines no wider than `width` (words
/// longer than a line are left to the terminal).
pub fn render_markdown(text: &str, width: usize) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();

    for block in parse_blocks(text) {
        match block {
            Block::Heading { level, text } => {
                let style = match level {
                    1 => Style::default()
                        .fg(HEADING_COLOR)
                        .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
                    2 => Style::default().fg(HEADING_COLOR).add_modifier(Modifier::BOLD),
                    _ => Style::default()
                        .fg(HEADING_COLOR)
                        .add_modifier(Modifier::BOLD | Modifier::DIM),
                };
                lines.push(Line::from(Span::styled(text, style)));
            }
            Block::Bullet { indent, content } => {
                let runs: Vec<_> = content.iter().map(inline_style).collect();
                let prefix = vec![
                    Span::raw(" ".repeat(indent)),
                    Span::styled("• ", Style::default().fg(LIST_BULLET_COLOR)),
                ];
                lines.extend(wrap(prefix, &runs, width));
            }
            Block::Quote(text) => {
                let style = Style::default().fg(QUOTE_COLOR).add_modifier(Modifier::ITALIC);
                let prefix = vec![Span::styled("│ ", Style::default().fg(QUOTE_COLOR))];
                lines.extend(wrap(prefix, &[(text, style)], width));
            }
            Block::Rule => {
                lines.push(Line::from(Span::styled("─".repeat(width), Style::default().fg(RULE_COLOR))));
            }
            Block::Paragraph(content) => {
                let runs: Vec<_> = content.iter().map(inline_style).collect();
                lines.extend(wrap(Vec::new(), &runs, width));
            }
            Block::Blank => {
                // Collapse runs of blank lines
                if lines.last().is_some_and(|l| !l.spans.is_empty()) {
                    lines.push(Line::default());
                }
            }
        }
    }

    lines
}

/// Unstyled wrap used when markdown rendering is turned off.
pub fn render_plain(text: &str, width: usize) -> Vec<Line<'static>> {
    text.lines()
        .flat_map(|line| wrap(Vec::new(), &[(line.to_string(), Style::default())], width))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.to_string()).collect()
    }

    #[test]
    fn test_classifies_lines() {
        let blocks = parse_blocks("## Looks\n- Linen shirt\n2. Loafers\n> tip\n---\n\nPlain");
        assert_eq!(blocks[0], Block::Heading { level: 2, text: "Looks".to_string() });
        assert!(matches!(&blocks[1], Block::Bullet { indent: 0, .. }));
        assert!(matches!(&blocks[2], Block::Bullet { .. }));
        assert_eq!(blocks[3], Block::Quote("tip".to_string()));
        assert_eq!(blocks[4], Block::Rule);
        assert_eq!(blocks[5], Block::Blank);
        assert_eq!(blocks[6], Block::Paragraph(vec![Inline::Text("Plain".to_string())]));
    }

    #[test]
    fn test_inline_emphasis_and_links() {
        let inline = parse_inline("Try **wide-leg** trousers in *sage* via [this](https://x.y)");
        assert!(inline.contains(&Inline::Bold("wide-leg".to_string())));
        assert!(inline.contains(&Inline::Italic("sage".to_string())));
        assert!(inline.contains(&Inline::Link {
            text: "this".to_string(),
            url: "https://x.y".to_string()
        }));
    }

    #[test]
    fn test_unclosed_markers_stay_literal() {
        assert_eq!(parse_inline("5 * 3"), vec![Inline::Text("5 * 3".to_string())]);
        assert_eq!(parse_inline("**open"), vec![Inline::Text("**open".to_string())]);
    }

    #[test]
    fn test_underscore_inside_word_is_text() {
        assert_eq!(
            parse_inline("snake_case_name"),
            vec![Inline::Text("snake_case_name".to_string())]
        );
        assert!(parse_inline("an _accent_ piece").contains(&Inline::Italic("accent".to_string())));
    }

    #[test]
    fn test_heading_renders_without_hashes() {
        let lines = render_markdown("# Capsule wardrobe", 80);
        assert_eq!(line_text(&lines[0]), "Capsule wardrobe");
    }

    #[test]
    fn test_bullets_wrap_with_hanging_indent() {
        let lines = render_markdown("- pair the camel coat with dark denim and white sneakers", 24);
        assert!(lines.len() > 1);
        assert!(line_text(&lines[0]).starts_with("• "));
        assert!(line_text(&lines[1]).starts_with("  "));
        for line in &lines {
            assert!(line_text(line).trim_end().width() <= 24);
        }
    }

    #[test]
    fn test_blank_lines_collapse() {
        let lines = render_markdown("one\n\n\n\ntwo", 80);
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_plain_keeps_markers() {
        let lines = render_plain("**bold**", 80);
        assert_eq!(line_text(&lines[0]), "**bold**");
    }
}
