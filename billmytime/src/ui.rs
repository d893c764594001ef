use crate::app::{App, Screen};
use crate::display::Slot;
use crate::menu::MenuContext;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{
        Block, BorderType, Borders, Clear, HighlightSpacing, List, ListItem, ListState, Paragraph,
    },
    Frame,
};

/// Watch screens are narrow; the face is drawn in a fixed-width column.
const FACE_WIDTH: u16 = 36;

pub fn draw(f: &mut Frame, app: &App) {
    let face = face_rect(f.area());
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(face);

    draw_slot(f, chunks[0], app, Slot::Project, Modifier::BOLD);
    draw_slot(f, chunks[1], app, Slot::Task, Modifier::empty());
    draw_timer(f, chunks[2], app);
    draw_status_bar(f, chunks[3], app);

    if let Screen::Menu { context, cursor } = &app.screen {
        draw_menu(f, face, app, context, *cursor);
    }
}

fn draw_slot(f: &mut Frame, area: Rect, app: &App, slot: Slot, modifier: Modifier) {
    let theme = &app.config.theme;
    let lines: Vec<Line> = app.display.get(slot).lines().map(Line::from).collect();
    f.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .style(
                Style::default()
                    .fg(theme.foreground)
                    .bg(theme.background)
                    .add_modifier(modifier),
            ),
        area,
    );
}

fn draw_timer(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.config.theme;
    let icons = &app.config.icons;
    let icon = if app.timer.is_running() {
        &icons.running
    } else {
        &icons.stopped
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.accent))
        .style(Style::default().bg(theme.foreground));
    let inner_area = block.inner(area);
    f.render_widget(block, area);
    let v_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(inner_area);
    f.render_widget(
        Paragraph::new(Line::from(vec![
            Span::raw(format!("{} ", icon)),
            Span::styled(
                app.display.get(Slot::Timer).to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]))
        .style(Style::default().fg(theme.background))
        .alignment(Alignment::Center),
        v_chunks[1],
    );
}

fn draw_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.config.theme;
    let help = match app.screen {
        Screen::Base => "spc:run │ k:reset │ j:send │ K/S/J:menus",
        Screen::Menu { .. } => "j/k:move │ spc:select │ esc:back",
    };
    f.render_widget(
        Paragraph::new(help)
            .alignment(Alignment::Center)
            .style(Style::default().fg(theme.muted).bg(theme.background)),
        area,
    );
}

fn draw_menu(f: &mut Frame, area: Rect, app: &App, context: &MenuContext, cursor: usize) {
    let theme = &app.config.theme;
    let icons = &app.config.icons;
    f.render_widget(Clear, area);
    let items: Vec<ListItem> = context
        .items()
        .iter()
        .map(|item| ListItem::new(Line::from(format!(" {}", item.title))))
        .collect();
    let list = List::new(items)
        .style(Style::default().fg(theme.foreground))
        .highlight_style(
            Style::default()
                .fg(theme.background)
                .bg(theme.selection)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(icons.select.as_str())
        .highlight_spacing(HighlightSpacing::Always)
        .block(
            Block::default()
                .title(Span::styled(
                    format!(" {} ", context.section_title()),
                    Style::default().fg(theme.accent).add_modifier(Modifier::BOLD),
                ))
                .borders(Borders::ALL)
                .border_type(BorderType::Double)
                .border_style(Style::default().fg(theme.accent))
                .style(Style::default().bg(theme.background)),
        );
    // The state scrolls the list so the cursor row is always drawn.
    let mut state = ListState::default().with_selected(Some(cursor));
    f.render_stateful_widget(list, area, &mut state);
}

fn face_rect(r: Rect) -> Rect {
    let width = FACE_WIDTH.min(r.width);
    let margin = (r.width - width) / 2;
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(margin),
            Constraint::Length(width),
            Constraint::Min(0),
        ])
        .split(r)[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{Effect, Event};
    use crate::config::Config;
    use crate::input::{Button, Click};
    use billmytime_proto::{OutboundRequest, Pair, Payload};
    use ratatui::{backend::TestBackend, Terminal};

    fn screen_text(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(40, 14)).unwrap();
        terminal.draw(|f| draw(f, app)).unwrap();
        let buffer = terminal.backend().buffer();
        buffer.content.iter().map(|cell| cell.symbol()).collect()
    }

    #[test]
    fn base_screen_shows_slots() {
        let app = App::new(Config::default());
        let text = screen_text(&app);
        assert!(text.contains("No Project Selected"));
        assert!(text.contains("No Task Selected"));
        assert!(text.contains("00h 00m"));
    }

    #[test]
    fn menu_overlay_shows_title_and_items() {
        let mut app = App::new(Config::default());
        app.handle(
            Event::Inbound(Payload::from_pairs(vec![
                Pair(0, "p".into()),
                Pair(1, "Website".into()),
                Pair(2, "Mobile".into()),
            ])),
            0,
        );
        let text = screen_text(&app);
        assert!(text.contains("Projects"));
        assert!(text.contains("Website"));
        assert!(text.contains("Mobile"));
        assert!(!text.contains("No Task Selected"));
    }

    #[test]
    fn long_menu_scrolls_to_cursor() {
        let mut app = App::new(Config::default());
        let mut pairs = vec![Pair(0, "c".into())];
        pairs.extend((1..=30).map(|i| Pair(i, format!("Client{:02}", i).into())));
        app.handle(Event::Inbound(Payload::from_pairs(pairs)), 0);
        for _ in 0..25 {
            app.handle(Event::Button(Button::Down, Click::Single), 0);
        }

        let text = screen_text(&app);
        assert!(text.contains("Client26"), "cursor row must be on screen");
        assert!(!text.contains("Client01"));
        assert_eq!(
            app.handle(Event::Button(Button::Select, Click::Single), 0),
            vec![Effect::Send(OutboundRequest::SelectClient { index: 25 })]
        );
    }
}
