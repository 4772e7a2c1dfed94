use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Draw the footer: view breadcrumb on the left, route path on the right.
pub fn draw_footer(frame: &mut Frame, area: Rect, breadcrumb: &[String], path: &str) {
  let mut spans = vec![Span::raw(" ")];

  for (i, part) in breadcrumb.iter().enumerate() {
    if i > 0 {
      spans.push(Span::styled(" > ", Style::default().fg(Color::DarkGray)));
    }

    let style = if i + 1 == breadcrumb.len() {
      Style::default().fg(Color::Cyan).bold()
    } else {
      Style::default().fg(Color::White)
    };

    spans.push(Span::styled(part.clone(), style));
  }

  let style = Style::default().bg(Color::Black);
  frame.render_widget(Paragraph::new(Line::from(spans)).style(style), area);

  let route = Line::styled(format!("{} ", path), Style::default().fg(Color::DarkGray));
  frame.render_widget(
    Paragraph::new(route).alignment(Alignment::Right).style(style),
    area,
  );
}
