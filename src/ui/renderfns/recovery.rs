use crate::error::RenderFailure;
use crate::ui::centered_rect;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

/// Panel shown in place of a view that failed to render.
pub fn draw_recovery_panel(frame: &mut Frame, area: Rect, failure: &RenderFailure) {
  let panel = centered_rect(60, 9, area);
  frame.render_widget(Clear, area);

  let block = Block::default()
    .title(" ⚠ Something went wrong ")
    .title_alignment(Alignment::Center)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Red));

  let message = if failure.message.is_empty() {
    "An unexpected error occurred."
  } else {
    failure.message.as_str()
  };

  let key = Style::default().fg(Color::Cyan);
  let label = Style::default().fg(Color::DarkGray);
  let lines = vec![
    Line::default(),
    Line::styled(message, Style::default().fg(Color::Red)),
    Line::default(),
    Line::from(vec![
      Span::styled("<h>", key),
      Span::styled(" Back to Home   ", label),
      Span::styled("<R>", key),
      Span::styled(" Reload Page", label),
    ]),
  ];

  let paragraph = Paragraph::new(lines)
    .block(block)
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true });
  frame.render_widget(paragraph, panel);
}
