use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Gauge, Paragraph, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::app::App;
use crate::config::COMMANDS;
use crate::flows::{ConversationPhase, Side, SlotRole, SubmitPhase, VisualizationPhase};
use crate::markdown;
use crate::media::ImageData;
use crate::models::{AnalysisResult, Role};
use crate::ui_state::{ScanMode, Screen};
use crate::weather::WeatherPhase;

// Copper Sapphire Morning color palette
const BG_DARK: Color = Color::Rgb(12, 12, 16);           // Deep background
const BG_PANEL: Color = Color::Rgb(18, 18, 24);          // Slightly lighter for panels

const SAPPHIRE: Color = Color::Rgb(101, 150, 243);
const CYAN_LIGHT: Color = Color::Rgb(178, 220, 226);

const COPPER: Color = Color::Rgb(138, 72, 38);
const TAN: Color = Color::Rgb(216, 180, 169);
const PALE_YELLOW: Color = Color::Rgb(234, 208, 148);

const BURGUNDY: Color = Color::Rgb(204, 92, 68);         // Errors
const OLIVE: Color = Color::Rgb(131, 179, 102);          // Success
const LAVENDER: Color = Color::Rgb(211, 164, 234);

const TEXT_PRIMARY: Color = Color::Rgb(240, 240, 245);
const TEXT_SECONDARY: Color = Color::Rgb(180, 180, 190);
const TEXT_MUTED: Color = Color::Rgb(105, 116, 133);

const BORDER_DIM: Color = Color::Rgb(45, 50, 60);
const BORDER_ACCENT: Color = Color::Rgb(70, 85, 110);

const SPINNER: [&str; 4] = ["◐", "◓", "◑", "◒"];

fn spinner(app: &App) -> &'static str {
    SPINNER[(app.tick_count / 8) as usize % SPINNER.len()]
}

/// Cut `text` to at most `max` columns, marking the cut with an ellipsis.
fn truncate(text: &str, max: usize) -> String {
    if text.width() <= max {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w + 1 > max {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

fn panel(title: &str, accent: bool) -> Block<'static> {
    Block::default()
        .title(Span::styled(
            format!(" {} ", title),
            Style::default()
                .fg(if accent { SAPPHIRE } else { TEXT_SECONDARY })
                .add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(if accent { BORDER_ACCENT } else { BORDER_DIM }))
        .style(Style::default().bg(BG_PANEL))
}

fn label(text: &str) -> Span<'static> {
    Span::styled(format!("{:<10}", text), Style::default().fg(TEXT_MUTED))
}

fn value(text: impl Into<String>) -> Span<'static> {
    Span::styled(text.into(), Style::default().fg(TEXT_PRIMARY))
}

fn error_line(message: &str) -> Line<'static> {
    Line::from(Span::styled(format!("✗ {}", message), Style::default().fg(BURGUNDY)))
}

fn hint_line(text: &str) -> Line<'static> {
    Line::from(Span::styled(
        text.to_string(),
        Style::default().fg(TEXT_MUTED).add_modifier(Modifier::ITALIC),
    ))
}

fn image_line(name: &str, image: Option<&ImageData>) -> Line<'static> {
    match image {
        Some(image) if image.previewable() => Line::from(vec![label(name), value(image.summary())]),
        Some(image) => Line::from(vec![
            label(name),
            value(image.summary()),
            Span::styled("  unverified", Style::default().fg(BURGUNDY)),
        ]),
        None => Line::from(vec![
            label(name),
            Span::styled("empty", Style::default().fg(TEXT_MUTED).add_modifier(Modifier::ITALIC)),
        ]),
    }
}

pub fn draw(frame: &mut Frame, app: &mut App) {
    // Fill entire background
    let bg = Block::default().style(Style::default().bg(BG_DARK));
    frame.render_widget(bg, frame.area());

    let area = frame.area();
    let padded = Rect {
        x: area.x + 1,
        y: area.y + 1,
        width: area.width.saturating_sub(2),
        height: area.height.saturating_sub(2),
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Screen tabs
            Constraint::Length(1), // Gap
            Constraint::Min(8),    // Body
            Constraint::Length(3), // Input
            Constraint::Length(1), // Status
        ])
        .split(padded);

    draw_tabs(frame, app, rows[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(app.config.ui.sidebar_width), // Sidebar
            Constraint::Length(1),                           // Gap
            Constraint::Min(40),                             // Screen
        ])
        .split(rows[2]);

    draw_sidebar(frame, app, body[0]);
    match app.ui.screen {
        Screen::Home => draw_home(frame, app, body[2]),
        Screen::StyleScan => draw_style_scan(frame, app, body[2]),
        Screen::Stylist => draw_stylist(frame, app, body[2]),
        Screen::TryOn => draw_try_on(frame, app, body[2]),
        Screen::Chat => draw_chat(frame, app, body[2]),
        Screen::Weather => draw_weather(frame, app, body[2]),
    }

    draw_input(frame, app, rows[3]);
    draw_status(frame, app, rows[4]);

    if app.showing_command_popup() {
        draw_command_popup(frame, app, body[2]);
    }
    if app.ui.show_help {
        draw_help(frame, body[2]);
    }
}

fn draw_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::styled(
        " drape ",
        Style::default().fg(BG_DARK).bg(COPPER).add_modifier(Modifier::BOLD),
    )];
    for screen in Screen::ALL {
        let style = if screen == app.ui.screen {
            Style::default().fg(CYAN_LIGHT).add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(TEXT_MUTED)
        };
        spans.push(Span::raw("  "));
        spans.push(Span::styled(screen.title(), style));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_sidebar(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6), // Session
            Constraint::Length(1), // Gap
            Constraint::Min(8),    // Slots
            Constraint::Length(4), // Keyboard hints
        ])
        .split(area);

    draw_session_info(frame, app, chunks[0]);
    draw_slots(frame, app, chunks[2]);
    draw_keyboard_hints(frame, chunks[3]);
}

fn draw_session_info(frame: &mut Frame, app: &App, area: Rect) {
    let block = panel("Session", false);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let width = inner.width as usize;
    let mode = if app.config.offline { "offline" } else { "online" };
    let lines = vec![
        Line::from(vec![
            Span::styled("id ", Style::default().fg(TEXT_MUTED)),
            value(truncate(&app.session_id, width.saturating_sub(3))),
        ]),
        Line::from(vec![
            Span::styled("api ", Style::default().fg(TEXT_MUTED)),
            value(truncate(&app.config.api_base, width.saturating_sub(4))),
        ]),
        Line::from(vec![
            Span::styled("mode ", Style::default().fg(TEXT_MUTED)),
            Span::styled(
                mode,
                Style::default().fg(if app.config.offline { BURGUNDY } else { OLIVE }),
            ),
        ]),
        Line::from(vec![
            Span::styled("turns ", Style::default().fg(TEXT_MUTED)),
            value(app.conversation.transcript().len().to_string()),
        ]),
    ];
    frame.render_widget(Paragraph::new(lines), inner);
}

fn draw_slots(frame: &mut Frame, app: &App, area: Rect) {
    let block = panel("Images", false);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let width = inner.width as usize;
    let lines: Vec<Line> = SlotRole::ALL
        .iter()
        .map(|role| {
            let image = match role {
                SlotRole::Garment1 | SlotRole::Garment2 => app.single.image(*role),
                SlotRole::Human => app.try_on.human(),
                SlotRole::TryOnGarment => app.try_on.garment(),
                SlotRole::Stylist => app.stylist.image(),
                SlotRole::Chat => app.chat_attachment.as_ref(),
            };
            let (mark, color) = if image.is_some() { ("●", OLIVE) } else { ("○", TEXT_MUTED) };
            Line::from(vec![
                Span::styled(format!("{} ", mark), Style::default().fg(color)),
                Span::styled(
                    truncate(role.as_str(), width.saturating_sub(2)),
                    Style::default().fg(TEXT_SECONDARY),
                ),
            ])
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), inner);
}

fn draw_keyboard_hints(frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER_DIM));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let hints = Paragraph::new(vec![
        Line::from(vec![
            Span::styled("ESC", Style::default().fg(SAPPHIRE).add_modifier(Modifier::BOLD)),
            Span::styled(" quit  ", Style::default().fg(TEXT_MUTED)),
            Span::styled("/", Style::default().fg(COPPER).add_modifier(Modifier::BOLD)),
            Span::styled(" cmds", Style::default().fg(TEXT_MUTED)),
        ]),
        Line::from(vec![
            Span::styled("Tab", Style::default().fg(LAVENDER).add_modifier(Modifier::BOLD)),
            Span::styled(" screen  ", Style::default().fg(TEXT_MUTED)),
            Span::styled("F2", Style::default().fg(LAVENDER).add_modifier(Modifier::BOLD)),
            Span::styled(" md", Style::default().fg(TEXT_MUTED)),
        ]),
    ])
    .alignment(Alignment::Center);
    frame.render_widget(hints, inner);
}

fn draw_home(frame: &mut Frame, app: &App, area: Rect) {
    let block = panel("Welcome", true);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines = vec![
        Line::from(Span::styled(
            "drape · your terminal fashion assistant",
            Style::default().fg(PALE_YELLOW).add_modifier(Modifier::BOLD),
        )),
        Line::default(),
    ];
    let weather = format!("Weather: what to wear in {} today", app.location_name());
    let entries = [
        ("/scan", "Style Scan: analyze a garment, or compare two and get a hybrid look"),
        ("/stylist", "AI Stylist: describe a vibe, pick an option, visualize each category"),
        ("/tryon", "Try-On: see a garment on a photo of yourself"),
        ("/chat", "Chat: ask the fashion assistant anything"),
        ("/weather", weather.as_str()),
    ];
    for (cmd, desc) in entries {
        lines.push(Line::from(vec![
            Span::styled(format!("{:<10}", cmd), Style::default().fg(COPPER).add_modifier(Modifier::BOLD)),
            Span::styled(desc.to_string(), Style::default().fg(TEXT_SECONDARY)),
        ]));
    }
    lines.push(Line::default());
    lines.push(hint_line("Load photos with /load <slot> <path>. Type anything to start chatting."));

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}

fn analysis_lines(analysis: &AnalysisResult) -> Vec<Line<'static>> {
    let list = |items: &[String]| items.join(", ");
    let mut lines = vec![
        Line::from(vec![label("category"), value(analysis.category.clone())]),
        Line::from(vec![label("type"), value(analysis.garment_type.clone())]),
        Line::from(vec![label("style"), value(list(&analysis.style_aesthetic))]),
        Line::from(vec![label("vibe"), value(list(&analysis.vibe_mood))]),
        Line::from(vec![label("colors"), value(list(&analysis.colors))]),
    ];
    if !analysis.patterns.is_empty() {
        lines.push(Line::from(vec![label("patterns"), value(list(&analysis.patterns))]));
    }
    for tip in analysis.styling_suggestions.iter().chain(&analysis.body_shape_tips) {
        lines.push(Line::from(vec![
            Span::styled("• ", Style::default().fg(LAVENDER)),
            Span::styled(tip.clone(), Style::default().fg(TEXT_SECONDARY)),
        ]));
    }
    lines
}

fn score_gauge(frame: &mut Frame, area: Rect, title: &str, score: u8) {
    let color = match score {
        0..=39 => BURGUNDY,
        40..=69 => PALE_YELLOW,
        _ => OLIVE,
    };
    let gauge = Gauge::default()
        .block(Block::default().title(Span::styled(title.to_string(), Style::default().fg(TEXT_MUTED))))
        .gauge_style(Style::default().fg(color).bg(BG_DARK))
        .percent(u16::from(score.min(100)))
        .label(format!("{}/100", score));
    frame.render_widget(gauge, area);
}

fn draw_style_scan(frame: &mut Frame, app: &App, area: Rect) {
    let title = match app.ui.scan_mode {
        ScanMode::Single => "Style Scan · single",
        ScanMode::Compare => "Style Scan · compare",
    };
    let block = panel(title, true);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    match app.ui.scan_mode {
        ScanMode::Single => {
            let columns = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
                .split(inner);
            for (role, column) in [SlotRole::Garment1, SlotRole::Garment2].into_iter().zip(columns.iter()) {
                draw_single_slot(frame, app, role, *column);
            }
        }
        ScanMode::Compare => draw_compare(frame, app, inner),
    }
}

fn draw_single_slot(frame: &mut Frame, app: &App, role: SlotRole, area: Rect) {
    let block = panel(role.as_str(), false);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(1)])
        .split(inner);

    let mut lines = vec![image_line("image", app.single.image(role))];
    if app.single.is_pending(role) {
        lines.push(Line::from(Span::styled(
            format!("{} analyzing…", spinner(app)),
            Style::default().fg(SAPPHIRE),
        )));
    } else if let Some(error) = app.single.last_error(role) {
        lines.push(error_line(&error.to_string()));
    }
    frame.render_widget(Paragraph::new(lines), parts[0]);

    match app.single.analysis(role) {
        Some(analysis) => {
            let rows = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(2), Constraint::Min(1)])
                .split(parts[1]);
            score_gauge(frame, rows[0], "preference", analysis.preference_score);
            frame.render_widget(
                Paragraph::new(analysis_lines(analysis)).wrap(Wrap { trim: false }),
                rows[1],
            );
        }
        None => {
            let hint = if app.single.image(role).is_some() {
                format!("/analyze {}", if role == SlotRole::Garment1 { 1 } else { 2 })
            } else {
                format!("/load {} <path>", role)
            };
            frame.render_widget(Paragraph::new(hint_line(&hint)), parts[1]);
        }
    }
}

fn draw_compare(frame: &mut Frame, app: &App, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[0]);

    for (side, column) in [Side::A, Side::B].into_iter().zip(columns.iter()) {
        let title = if side == Side::A { "garment-1" } else { "garment-2" };
        let block = panel(title, false);
        let inner = block.inner(*column);
        frame.render_widget(block, *column);

        let mut lines = vec![image_line("image", app.compare.image(side))];
        if let Some(analysis) = app.compare.analysis(side) {
            lines.push(Line::from(vec![
                label("score"),
                value(format!("{}/100", analysis.preference_score)),
            ]));
            lines.extend(analysis_lines(analysis));
        }
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
    }

    let block = panel("Hybrid", true);
    let inner = block.inner(rows[1]);
    frame.render_widget(block, rows[1]);

    let mut lines = Vec::new();
    if app.compare.is_pending() {
        lines.push(Line::from(Span::styled(
            format!("{} comparing…", spinner(app)),
            Style::default().fg(SAPPHIRE),
        )));
    } else if let Some(error) = app.compare.last_error() {
        lines.push(error_line(&error.to_string()));
    }
    match app.compare.hybrid() {
        Some(hybrid) => {
            lines.push(Line::from(vec![
                label("style"),
                Span::styled(
                    hybrid.combined_style.clone(),
                    Style::default().fg(PALE_YELLOW).add_modifier(Modifier::BOLD),
                ),
                Span::styled(format!("  ({}/100)", hybrid.style_score), Style::default().fg(TEXT_MUTED)),
            ]));
            lines.push(Line::from(vec![label("from 1"), value(hybrid.best_features_a.join(", "))]));
            lines.push(Line::from(vec![label("from 2"), value(hybrid.best_features_b.join(", "))]));
            for suggestion in &hybrid.hybrid_suggestions {
                lines.push(Line::from(vec![
                    Span::styled("• ", Style::default().fg(LAVENDER)),
                    Span::styled(suggestion.clone(), Style::default().fg(TEXT_SECONDARY)),
                ]));
            }
            lines.push(Line::from(vec![
                label("search"),
                Span::styled(hybrid.search_terms.join(" · "), Style::default().fg(CYAN_LIGHT)),
            ]));
        }
        None if !app.compare.is_pending() => {
            let hint = if app.compare.can_compare() {
                "/analyze to compare both garments"
            } else {
                "Load garment-1 and garment-2, then /analyze"
            };
            lines.push(hint_line(hint));
        }
        None => {}
    }
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}

fn phase_span(phase: VisualizationPhase, app: &App) -> Span<'static> {
    match phase {
        VisualizationPhase::NotRequested => Span::styled("·", Style::default().fg(TEXT_MUTED)),
        VisualizationPhase::Pending => Span::styled(spinner(app), Style::default().fg(SAPPHIRE)),
        VisualizationPhase::Ready => Span::styled("✓", Style::default().fg(OLIVE)),
        VisualizationPhase::Failed => Span::styled("✗", Style::default().fg(BURGUNDY)),
    }
}

fn draw_stylist(frame: &mut Frame, app: &mut App, area: Rect) {
    let block = panel("AI Stylist", true);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let flow = &app.stylist;
    let mut lines = vec![
        image_line("photo", flow.image()),
        Line::from(vec![
            label("prompt"),
            if flow.prompt().is_empty() {
                Span::styled("type what you want to change", Style::default().fg(TEXT_MUTED))
            } else {
                value(flow.prompt().to_string())
            },
        ]),
        Line::default(),
    ];

    match flow.phase() {
        SubmitPhase::Idle => lines.push(hint_line("Load a photo with /load stylist <path>, then type a prompt")),
        SubmitPhase::Submitting => lines.push(Line::from(Span::styled(
            format!("{} putting together options…", spinner(app)),
            Style::default().fg(SAPPHIRE),
        ))),
        SubmitPhase::SubmitFailed => {
            if let Some(error) = flow.last_error() {
                lines.push(error_line(&error.to_string()));
            }
            lines.push(hint_line("/retry to send the same prompt again"));
        }
        SubmitPhase::OptionsReady => match flow.selected_option() {
            None => {
                for (i, option) in flow.options().iter().enumerate() {
                    lines.push(Line::from(vec![
                        Span::styled(format!("{}. ", i + 1), Style::default().fg(COPPER)),
                        Span::styled(
                            option.summary_title.clone(),
                            Style::default().fg(TEXT_PRIMARY).add_modifier(Modifier::BOLD),
                        ),
                    ]));
                    lines.push(Line::from(Span::styled(
                        format!("   {}", option.summary_description),
                        Style::default().fg(TEXT_SECONDARY),
                    )));
                }
                lines.push(Line::default());
                lines.push(hint_line("/option <n> to see the details"));
            }
            Some(option) => {
                lines.push(Line::from(Span::styled(
                    option.summary_title.clone(),
                    Style::default().fg(PALE_YELLOW).add_modifier(Modifier::BOLD),
                )));
                lines.push(Line::from(Span::styled(
                    option.summary_description.clone(),
                    Style::default().fg(TEXT_SECONDARY),
                )));
                lines.push(Line::default());
                for (i, category) in option.categories.iter().enumerate() {
                    let active = flow.active_category() == Some(category.name.as_str());
                    lines.push(Line::from(vec![
                        phase_span(flow.visualization(&category.name), app),
                        Span::styled(format!(" {}. ", i + 1), Style::default().fg(COPPER)),
                        Span::styled(
                            category.name.clone(),
                            Style::default().fg(if active { CYAN_LIGHT } else { TAN }).add_modifier(Modifier::BOLD),
                        ),
                        Span::styled(
                            format!("  {}", category.keywords.join(", ")),
                            Style::default().fg(TEXT_MUTED),
                        ),
                    ]));
                    lines.push(Line::from(Span::styled(
                        format!("     {}", category.description),
                        Style::default().fg(TEXT_SECONDARY),
                    )));

                    let Some(state) = flow.visualization_state(&category.name) else {
                        continue;
                    };
                    if let Some(suggestions) = &state.suggestions {
                        for suggestion in suggestions {
                            lines.push(Line::from(vec![
                                Span::styled("     ↳ ", Style::default().fg(LAVENDER)),
                                Span::styled(suggestion.reasoning.clone(), Style::default().fg(TEXT_PRIMARY)),
                            ]));
                            lines.push(Line::from(Span::styled(
                                format!("       {}", suggestion.image_ref),
                                Style::default().fg(CYAN_LIGHT).add_modifier(Modifier::UNDERLINED),
                            )));
                        }
                    }
                    if let Some(error) = &state.error {
                        lines.push(error_line(&format!("    {}", error)));
                    }
                }
                lines.push(Line::default());
                lines.push(hint_line("/viz <n> to visualize a category · /back for all options"));
            }
        },
    }

    app.ui.max_scroll = lines.len().saturating_sub(inner.height as usize);
    let scroll = app.ui.scroll_offset.min(app.ui.max_scroll).min(u16::MAX as usize) as u16;
    frame.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: false }).scroll((scroll, 0)),
        inner,
    );
}

fn draw_try_on(frame: &mut Frame, app: &App, area: Rect) {
    let block = panel("Virtual Try-On", true);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let flow = &app.try_on;
    let mut lines = vec![
        image_line("person", flow.human()),
        image_line("garment", flow.garment()),
        Line::from(vec![label("prompt"), value(flow.prompt().to_string())]),
        Line::default(),
    ];

    if flow.suggestions_pending() {
        lines.push(Line::from(Span::styled(
            format!("{} thinking of prompt ideas…", spinner(app)),
            Style::default().fg(TEXT_MUTED),
        )));
    } else if !flow.suggestions().is_empty() {
        lines.push(Line::from(Span::styled("Ideas", Style::default().fg(TAN).add_modifier(Modifier::BOLD))));
        for (i, idea) in flow.suggestions().iter().enumerate() {
            lines.push(Line::from(vec![
                Span::styled(format!(" {}. ", i + 1), Style::default().fg(COPPER)),
                Span::styled(idea.clone(), Style::default().fg(TEXT_SECONDARY)),
            ]));
        }
        lines.push(hint_line("/idea <n> to use one"));
    }
    lines.push(Line::default());

    if flow.is_generating() {
        lines.push(Line::from(Span::styled(
            format!("{} generating try-on…", spinner(app)),
            Style::default().fg(SAPPHIRE),
        )));
    } else if let Some(error) = flow.last_error() {
        lines.push(error_line(&error.to_string()));
    } else if let Some(result) = flow.result() {
        lines.push(Line::from(vec![
            Span::styled("✓ ", Style::default().fg(OLIVE)),
            value(result.summary()),
        ]));
        if let Some(path) = &app.ui.last_saved {
            lines.push(Line::from(vec![label("saved"), value(path.display().to_string())]));
        }
    } else if flow.can_generate() {
        lines.push(hint_line("/generate when ready"));
    } else {
        lines.push(hint_line("Load human and garment photos and set a prompt"));
    }

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}

fn draw_chat(frame: &mut Frame, app: &mut App, area: Rect) {
    let block = panel("Fashion Assistant", true);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let width = inner.width.saturating_sub(2) as usize;
    let mut lines: Vec<Line> = Vec::new();
    for turn in app.conversation.transcript() {
        let (name, color) = match turn.role {
            Role::User => ("You", COPPER),
            Role::Assistant => ("Assistant", SAPPHIRE),
        };
        let mut header = vec![
            Span::styled(name, Style::default().fg(color).add_modifier(Modifier::BOLD)),
            Span::styled(
                format!("  {}", turn.timestamp.format("%H:%M")),
                Style::default().fg(TEXT_MUTED),
            ),
        ];
        if let Some(model) = &turn.model {
            header.push(Span::styled(format!("  {}", model), Style::default().fg(TEXT_MUTED)));
        }
        lines.push(Line::from(header));
        if let Some(image) = &turn.image {
            lines.push(Line::from(Span::styled(
                format!("[photo] {}", image.summary()),
                Style::default().fg(LAVENDER),
            )));
        }
        let body = match (turn.role, app.ui.show_raw_markdown) {
            (Role::Assistant, false) => markdown::render_markdown(&turn.text, width),
            _ => markdown::render_plain(&turn.text, width),
        };
        lines.extend(body);
        lines.push(Line::default());
    }

    if app.conversation.phase() == ConversationPhase::AwaitingReply {
        lines.push(Line::from(Span::styled(
            format!("{} thinking…", spinner(app)),
            Style::default().fg(SAPPHIRE),
        )));
    }
    if let Some(image) = &app.chat_attachment {
        lines.push(hint_line(&format!("Attached: {}", image.summary())));
    }

    let height = inner.height as usize;
    let total = lines.len();
    app.ui.max_scroll = total.saturating_sub(height);
    let offset = app.ui.scroll_offset.min(app.ui.max_scroll);
    let top = total.saturating_sub(height).saturating_sub(offset);

    frame.render_widget(
        Paragraph::new(lines).scroll((top.min(u16::MAX as usize) as u16, 0)),
        inner,
    );
}

fn draw_weather(frame: &mut Frame, app: &App, area: Rect) {
    let block = panel(&format!("Weather · {}", app.location_name()), true);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines = Vec::new();
    match app.weather.phase() {
        WeatherPhase::Loading => lines.push(Line::from(Span::styled(
            format!("{} fetching the weather…", spinner(app)),
            Style::default().fg(SAPPHIRE),
        ))),
        WeatherPhase::Failed(message) => {
            lines.push(error_line(message));
            lines.push(hint_line("/retry to try again"));
        }
        WeatherPhase::Ready(report) => {
            lines.push(Line::from(vec![
                Span::styled(
                    format!("{}°C ", report.temperature),
                    Style::default().fg(PALE_YELLOW).add_modifier(Modifier::BOLD),
                ),
                value(report.condition().label()),
            ]));
            lines.push(Line::from(vec![
                label("feels"),
                value(format!("{}°C", report.feels_like)),
            ]));
            lines.push(Line::from(vec![label("humidity"), value(format!("{}%", report.humidity))]));
            lines.push(Line::from(vec![label("wind"), value(format!("{} km/h", report.wind_speed))]));
            lines.push(Line::default());
            lines.push(Line::from(Span::styled(
                "What to wear",
                Style::default().fg(TAN).add_modifier(Modifier::BOLD),
            )));
            for suggestion in app.weather.suggestions() {
                lines.push(Line::from(vec![
                    Span::styled(format!("{:<16}", suggestion.category), Style::default().fg(COPPER)),
                    value(suggestion.items.join(", ")),
                ]));
                lines.push(Line::from(Span::styled(
                    format!("                {}", suggestion.description),
                    Style::default().fg(TEXT_MUTED),
                )));
            }
        }
    }
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}

fn draw_input(frame: &mut Frame, app: &App, area: Rect) {
    // Pulsing border
    let glow = (app.tick_count as f64 / 90.0).sin() * 0.3 + 0.7;
    let border_color = Color::Rgb((101.0 * glow) as u8, (150.0 * glow) as u8, (243.0 * glow) as u8);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(border_color));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let cursor = if app.tick_count % 30 < 15 { "|" } else { " " };
    let visible = inner.width.saturating_sub(4) as usize;
    let input = &app.ui.input;
    // Keep the tail visible when the line is longer than the box
    let shown = if input.width() > visible {
        let skip = input.chars().count().saturating_sub(visible);
        input.chars().skip(skip).collect::<String>()
    } else {
        input.clone()
    };
    let input = Paragraph::new(format!(" > {}{}", shown, cursor)).style(Style::default().fg(TEXT_PRIMARY));
    frame.render_widget(input, inner);
}

fn draw_status(frame: &mut Frame, app: &App, area: Rect) {
    let line = match &app.ui.status_message {
        Some(message) => Line::from(Span::styled(
            truncate(message, area.width as usize),
            Style::default().fg(TAN),
        )),
        None => Line::from(Span::styled(
            format!("{} · /help for commands", app.ui.screen.title()),
            Style::default().fg(TEXT_MUTED),
        )),
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn draw_command_popup(frame: &mut Frame, app: &App, area: Rect) {
    // Get filtered commands from app
    let filtered = app.get_filtered_commands();

    if filtered.is_empty() {
        return;
    }

    // +1 for the "your input" option, +2 for borders
    let popup_height = ((filtered.len() + 3) as u16).min(area.height);
    let popup_width = 52.min(area.width.saturating_sub(4));
    let popup_area = Rect {
        x: area.x + 2,
        y: area.y + area.height.saturating_sub(popup_height),
        width: popup_width,
        height: popup_height,
    };

    // Clear area behind popup
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .title(Span::styled(" Commands ", Style::default().fg(COPPER).add_modifier(Modifier::BOLD)))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(COPPER))
        .style(Style::default().bg(BG_PANEL));

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let mut lines: Vec<Line> = Vec::new();

    // First option: current typed input (selected when command_selection is None)
    let input_selected = app.ui.command_selection.is_none();
    let input_style = if input_selected {
        Style::default().fg(CYAN_LIGHT).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(TEXT_SECONDARY)
    };
    let indicator = if input_selected { ">" } else { " " };
    lines.push(Line::from(vec![
        Span::styled(format!("{} {} ", indicator, &app.ui.input), input_style),
        Span::styled("(your input)", Style::default().fg(TEXT_MUTED).add_modifier(Modifier::ITALIC)),
    ]));

    for (i, (cmd, desc)) in filtered.iter().enumerate() {
        let is_selected = app.ui.command_selection == Some(i);
        let style = if is_selected {
            Style::default().fg(CYAN_LIGHT).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(TEXT_SECONDARY)
        };
        let indicator = if is_selected { ">" } else { " " };

        lines.push(Line::from(vec![
            Span::styled(format!("{} {} ", indicator, cmd), style),
            Span::styled(format!("- {}", desc), Style::default().fg(TEXT_MUTED)),
        ]));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

fn draw_help(frame: &mut Frame, area: Rect) {
    let height = ((COMMANDS.len() + 2) as u16).min(area.height);
    let width = 60.min(area.width);
    let popup = Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    };
    frame.render_widget(Clear, popup);

    let block = panel("Commands", true);
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let lines: Vec<Line> = COMMANDS
        .iter()
        .map(|(cmd, desc)| {
            Line::from(vec![
                Span::styled(format!("{:<10}", cmd), Style::default().fg(COPPER).add_modifier(Modifier::BOLD)),
                Span::styled(desc.to_string(), Style::default().fg(TEXT_SECONDARY)),
            ])
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), inner);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_respects_width() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a long session id", 8), "a long …");
        assert!(truncate("ｗｉｄｅ ｃｈａｒｓ", 7).width() <= 7);
    }
}
