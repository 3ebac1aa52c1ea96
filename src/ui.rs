use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use pagetype::{scoring::CharClass, util::format_clock};

use crate::{App, AppState, Notice};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 1;

fn visible(c: char) -> char {
    match c {
        ' ' => '·',
        '\n' => '⏎',
        c => c,
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let session = &self.session;
        let unit = session.config().rate_unit;

        // styles
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let green_bold_style = Style::default().patch(bold_style).fg(Color::Green);
        let red_bold_style = Style::default().patch(bold_style).fg(Color::Red);
        let dim_bold_style = Style::default()
            .patch(bold_style)
            .add_modifier(Modifier::DIM);
        let underlined_dim_bold_style = Style::default()
            .patch(dim_bold_style)
            .add_modifier(Modifier::UNDERLINED);
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(1), // header
                Constraint::Length(1), // stats
                Constraint::Min(3),    // prompt / url box / results
                Constraint::Length(1), // notice
                Constraint::Length(1), // key hints
            ])
            .split(area);

        let source = self.source_title.as_deref().unwrap_or("local text");
        let header = Paragraph::new(Span::styled(
            format!(
                "page {}/{}   {}   {}",
                session.current_page() + 1,
                session.page_count(),
                session.difficulty().label(),
                source
            ),
            dim_bold_style,
        ))
        .alignment(Alignment::Center);
        header.render(chunks[0], buf);

        let stats = session.stats();
        let stats_line = Paragraph::new(Span::styled(
            format!(
                "{}   {} {}   {}% acc   {} errors",
                format_clock(stats.elapsed_secs),
                stats.rate,
                unit,
                stats.accuracy,
                stats.errors
            ),
            bold_style,
        ))
        .alignment(Alignment::Center);
        stats_line.render(chunks[1], buf);

        match self.state {
            AppState::Typing => {
                let glyphs = session.classify();
                let cursor = glyphs
                    .iter()
                    .position(|g| g.class == CharClass::Pending);

                let spans = glyphs
                    .iter()
                    .enumerate()
                    .map(|(idx, glyph)| {
                        let style = match glyph.class {
                            CharClass::Correct => green_bold_style,
                            CharClass::Incorrect => red_bold_style,
                            CharClass::Pending if Some(idx) == cursor => underlined_dim_bold_style,
                            CharClass::Pending => dim_bold_style,
                        };
                        let shown = match glyph.class {
                            CharClass::Incorrect => visible(glyph.ch),
                            _ if glyph.ch == '\n' => visible(glyph.ch),
                            _ => glyph.ch,
                        };
                        Span::styled(shown.to_string(), style)
                    })
                    .collect::<Vec<Span>>();

                let max_chars_per_line = chunks[2].width.max(1) as usize;
                let fits_on_one_line = session.attempt().target().width() <= max_chars_per_line;
                let prompt_width: usize = spans.iter().map(|s| s.width()).sum();
                let prompt_rows = prompt_width.div_ceil(max_chars_per_line) as u16;

                let prompt = Paragraph::new(Line::from(spans))
                    .alignment(if fits_on_one_line {
                        Alignment::Center
                    } else {
                        Alignment::Left
                    })
                    .wrap(Wrap { trim: false });

                prompt.render(centered_rows(chunks[2], prompt_rows), buf);
            }
            AppState::UrlEntry => {
                let input = if self.loading {
                    self.url_input.clone()
                } else {
                    format!("{}_", self.url_input)
                };
                let url_box = Paragraph::new(Span::styled(input, bold_style))
                    .block(Block::default().borders(Borders::ALL).title(format!(
                        "article url ({})",
                        self.config.provider.supported_host
                    )))
                    .wrap(Wrap { trim: false });

                url_box.render(centered_rows(chunks[2], 3), buf);
            }
            AppState::Results => {
                let rate = session.final_rate().unwrap_or_default();
                let results = Paragraph::new(vec![
                    Line::from(Span::styled(
                        format!("{rate} {unit}"),
                        Style::default().patch(bold_style).fg(Color::Magenta),
                    )),
                    Line::from(Span::styled(
                        format!(
                            "{} pages   {}% acc on the last page",
                            session.page_count(),
                            stats.accuracy
                        ),
                        italic_style,
                    )),
                ])
                .alignment(Alignment::Center);

                results.render(centered_rows(chunks[2], 2), buf);
            }
        }

        if let Some(notice) = &self.notice {
            let (text, style) = match notice {
                Notice::Info(text) => (text.as_str(), Style::default().fg(Color::Cyan)),
                Notice::Error(text) => (text.as_str(), Style::default().fg(Color::Red)),
            };
            Paragraph::new(Span::styled(text, style.add_modifier(Modifier::ITALIC)))
                .alignment(Alignment::Center)
                .render(chunks[3], buf);
        }

        let hints = match self.state {
            AppState::Typing => "(←) restart  (↑/↓) difficulty  (tab) url  (esc) quit",
            AppState::UrlEntry => "(enter) fetch  (esc) back",
            AppState::Results if self.source_url.is_some() => {
                "(r)estart  (u)rl  (o)pen article  (esc) quit"
            }
            AppState::Results => "(r)estart  (u)rl  (esc) quit",
        };
        Paragraph::new(Span::styled(hints, italic_style.add_modifier(Modifier::DIM)))
            .alignment(Alignment::Center)
            .render(chunks[4], buf);
    }
}

/// Vertically center `height` rows inside `area`
fn centered_rows(area: Rect, height: u16) -> Rect {
    let height = height.clamp(1, area.height.max(1));
    let top = (area.height.saturating_sub(height)) / 2;
    Rect {
        y: area.y + top,
        height: height.min(area.height),
        ..area
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visible_whitespace() {
        assert_eq!(visible(' '), '·');
        assert_eq!(visible('\n'), '⏎');
        assert_eq!(visible('a'), 'a');
    }

    #[test]
    fn test_centered_rows() {
        let area = Rect::new(0, 10, 40, 11);
        let rect = centered_rows(area, 3);
        assert_eq!(rect, Rect::new(0, 14, 40, 3));

        let rect = centered_rows(area, 30);
        assert_eq!(rect, area);
    }
}
