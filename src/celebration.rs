use rand::seq::SliceRandom;
use rand::Rng;
use std::time::SystemTime;

use crate::session::Completion;

const SPARKS: [char; 5] = ['*', '+', '·', 'o', '✦'];
const GRAVITY: f64 = 15.0;
const STEP_SECS: f64 = 0.1;

#[derive(Debug, Clone)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub vel_x: f64,
    pub vel_y: f64,
    pub symbol: char,
    pub color_index: usize,
    pub age: f64,
    pub max_age: f64,
    /// Letters fly to a fixed slot and stay; sparks fall
    pub target: Option<(f64, f64)>,
}

impl Particle {
    fn spark<R: Rng + ?Sized>(x: f64, y: f64, rng: &mut R) -> Self {
        Self {
            x,
            y,
            vel_x: rng.gen_range(-3.0..3.0),
            vel_y: rng.gen_range(-4.0..-1.0),
            symbol: *SPARKS.choose(rng).unwrap_or(&'*'),
            color_index: rng.gen_range(0..7),
            age: 0.0,
            max_age: rng.gen_range(2.0..4.0),
            target: None,
        }
    }

    fn letter(x: f64, y: f64, target_x: f64, target_y: f64, symbol: char, color_index: usize) -> Self {
        Self {
            x,
            y,
            vel_x: target_x - x,
            vel_y: target_y - y,
            symbol,
            color_index,
            age: 0.0,
            max_age: 4.0,
            target: Some((target_x, target_y)),
        }
    }

    fn update(&mut self, dt: f64) -> bool {
        match self.target {
            Some((tx, ty)) => {
                let dist = ((tx - self.x).powi(2) + (ty - self.y).powi(2)).sqrt();
                if dist > 1.0 {
                    self.x += self.vel_x * dt;
                    self.y += self.vel_y * dt;
                    self.vel_x *= 0.95;
                    self.vel_y *= 0.95;
                } else {
                    self.x = tx;
                    self.y = ty;
                }
            }
            None => {
                self.x += self.vel_x * dt;
                self.y += self.vel_y * dt;
                self.vel_y += GRAVITY * dt;
            }
        }
        self.age += dt;
        self.age < self.max_age
    }
}

/// Burst shown over the completion screen when a record falls
#[derive(Debug)]
pub struct Celebration {
    pub particles: Vec<Particle>,
    pub started_at: SystemTime,
    pub duration_secs: f64,
    pub is_active: bool,
    width: f64,
    height: f64,
}

impl Celebration {
    pub fn new() -> Self {
        Self {
            particles: Vec::new(),
            started_at: SystemTime::now(),
            duration_secs: 3.0,
            is_active: false,
            width: 80.0,
            height: 24.0,
        }
    }

    /// Headline for a finished mode, if it set a record
    pub fn headline(completion: &Completion) -> Option<&'static str> {
        match completion {
            Completion::FixedCount(s) if s.new_high_score && s.new_best_time => Some("DOUBLE RECORD!"),
            Completion::FixedCount(s) if s.new_best_time => Some("BEST TIME!"),
            Completion::FixedCount(s) if s.new_high_score => Some("HIGH SCORE!"),
            Completion::FixedDuration(s) if s.new_high_score => Some("HIGH SCORE!"),
            _ => None,
        }
    }

    pub fn start(&mut self, text: &str, width: u16, height: u16) {
        let mut rng = rand::thread_rng();

        self.particles.clear();
        self.started_at = SystemTime::now();
        self.is_active = true;
        self.width = width as f64;
        self.height = height as f64;

        let center_x = self.width / 2.0;
        let center_y = self.height / 2.0;
        let spacing = 2.0;
        let left = center_x - (text.chars().count() as f64 - 1.0) * spacing / 2.0;

        for (i, ch) in text.chars().enumerate().filter(|(_, c)| *c != ' ') {
            self.particles.push(Particle::letter(
                center_x + rng.gen_range(-10.0..10.0),
                center_y + rng.gen_range(-5.0..5.0),
                left + i as f64 * spacing,
                center_y - 2.0,
                ch,
                rng.gen_range(0..7),
            ));
        }

        for _ in 0..25 {
            let x = center_x + rng.gen_range(-15.0..15.0);
            let y = center_y + rng.gen_range(-8.0..8.0);
            self.particles.push(Particle::spark(x, y, &mut rng));
        }
    }

    pub fn update(&mut self) {
        if !self.is_active {
            return;
        }

        let elapsed = self.started_at.elapsed().unwrap_or_default().as_secs_f64();
        if elapsed >= self.duration_secs {
            self.is_active = false;
            self.particles.clear();
            return;
        }

        let (width, height) = (self.width, self.height);
        self.particles.retain_mut(|p| {
            let alive = p.update(STEP_SECS);
            let margin = 5.0;
            let off_screen = p.target.is_none()
                && (p.y > height + margin || p.x < -margin || p.x > width + margin);
            alive && !off_screen
        });
    }
}

impl Default for Celebration {
    fn default() -> Self {
        Self::new()
    }
}
