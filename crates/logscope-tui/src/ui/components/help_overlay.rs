use ratatui::{
    Frame,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use crate::commands::CommandRegistry;
use crate::ui::Layout;

const KEYS: &[(&str, &[(&str, &str)])] = &[
    (
        "Navigation",
        &[
            ("j/k ↓/↑", "Select next/previous log"),
            ("^e/^y", "Scroll one line"),
            ("PgDn/PgUp", "Page down/up"),
            ("g/G", "Go to top/bottom"),
            ("Space", "Toggle follow mode"),
            ("p", "Pause/resume following"),
            ("n/N", "Next/previous search match"),
        ],
    ),
    (
        "Details",
        &[
            ("Enter/d", "Toggle detail sidebar"),
            ("F", "Toggle fullscreen details"),
            ("Tab", "Switch focus"),
        ],
    ),
    (
        "Other",
        &[
            ("/", "Enter a command"),
            ("?", "Toggle this help"),
            ("q/Esc", "Quit"),
        ],
    ),
];

/// Help overlay listing keybindings and commands
pub struct HelpOverlay;

impl HelpOverlay {
    pub fn render(frame: &mut Frame, registry: &CommandRegistry) {
        let popup_area = Layout::centered(frame.area(), 72, 40);

        // Clear the background
        frame.render_widget(Clear, popup_area);

        let help_widget = Paragraph::new(Self::lines(registry))
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan))
                    .title(Span::styled(
                        " Help (? or Esc to close) ",
                        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                    )),
            );

        frame.render_widget(help_widget, popup_area);
    }

    fn lines(registry: &CommandRegistry) -> Vec<Line<'static>> {
        let mut lines = vec![
            Line::from(Span::styled(
                "Keybindings",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
        ];

        for (section, keys) in KEYS {
            lines.push(Self::section(section));
            lines.extend(keys.iter().map(|(key, desc)| Self::key_line(key, desc)));
            lines.push(Line::from(""));
        }

        lines.push(Self::section("Commands"));
        for command in registry.commands() {
            let mut name = format!("/{}", command.name);
            if !command.aliases.is_empty() {
                name.push_str(&format!(" ({})", command.aliases.join(", ")));
            }
            lines.push(Line::from(vec![
                Span::styled(format!("  {name:<28}"), Style::default().fg(Color::Green)),
                Span::styled(command.description, Style::default().fg(Color::White)),
            ]));
        }

        lines
    }

    fn section(title: &str) -> Line<'static> {
        Line::from(Span::styled(
            title.to_string(),
            Style::default().fg(Color::Yellow),
        ))
    }

    fn key_line(key: &str, desc: &str) -> Line<'static> {
        Line::from(vec![
            Span::styled(format!("  {key:>10}"), Style::default().fg(Color::Green)),
            Span::styled(format!("  {desc}"), Style::default().fg(Color::White)),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lists_every_command() {
        let registry = CommandRegistry::new();
        let text: Vec<String> = HelpOverlay::lines(&registry)
            .iter()
            .map(|line| line.to_string())
            .collect();

        for command in registry.commands() {
            let needle = format!("/{}", command.name);
            assert!(text.iter().any(|line| line.contains(&needle)), "{needle}");
        }
        assert!(text.iter().any(|line| line.contains("(unfilter, cf)")));
    }
}
