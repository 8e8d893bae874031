pub mod records;
pub mod screen;

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::{Clear, Widget},
};

use crate::app::App;
use crate::celebration::Celebration;
use crate::runtime::Clock;
use crate::store::SessionStore;

impl<S: SessionStore, C: Clock> Widget for &App<S, C> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);
        screen::current_screen::<S, C>(self.state).render(self, area, buf);

        if self.celebration.is_active {
            render_celebration_particles(&self.celebration, area, buf);
        }
    }
}

/// Render celebration particles on top of the current screen
fn render_celebration_particles(celebration: &Celebration, area: Rect, buf: &mut Buffer) {
    let colors = [
        Color::Yellow,
        Color::Magenta,
        Color::Cyan,
        Color::Green,
        Color::Red,
        Color::Blue,
        Color::LightYellow,
    ];

    for particle in &celebration.particles {
        if particle.x < 0.0 || particle.y < 0.0 {
            continue;
        }
        let (x, y) = (particle.x as u16, particle.y as u16);
        if x >= area.width || y >= area.height {
            continue;
        }

        let color = colors[particle.color_index % colors.len()];
        let fade = 1.0 - (particle.age / particle.max_age);
        let style = match (particle.target.is_some(), fade) {
            (true, _) => Style::default().fg(color).add_modifier(Modifier::BOLD),
            (false, f) if f > 0.7 => Style::default().fg(color).add_modifier(Modifier::BOLD),
            (false, f) if f > 0.3 => Style::default().fg(color),
            _ => Style::default().fg(color).add_modifier(Modifier::DIM),
        };

        if let Some(cell) = buf.cell_mut((area.x + x, area.y + y)) {
            cell.set_symbol(&particle.symbol.to_string());
            cell.set_style(style);
        }
    }
}
