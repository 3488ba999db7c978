use crate::font;
use crate::render::Surface;
use std::time::{Duration, Instant};

const MESSAGE_SCALE: i32 = 2;
const FPS_SCALE: i32 = 2;
const MARGIN: i32 = 12;

/// Transient on-screen text. Lives for a fixed number of logic ticks; over the
/// trailing `fade_ticks` the alpha steps down to zero.
pub(crate) struct Message {
    text: String,
    color: [u8; 3],
    ticks_left: u32,
    fade_ticks: u32,
    alpha: u8,
}

impl Message {
    pub(crate) fn new(text: String, color: [u8; 3], total_ticks: u32, fade_ticks: u32) -> Self {
        Self {
            text,
            color,
            ticks_left: total_ticks.max(1),
            fade_ticks: fade_ticks.clamp(1, total_ticks.max(1)),
            alpha: 255,
        }
    }

    pub(crate) fn tick(&mut self) {
        if self.ticks_left == 0 {
            return;
        }
        self.ticks_left -= 1;
        if self.ticks_left < self.fade_ticks {
            // fixed-size steps down to zero as the countdown runs out
            self.alpha = ((255 * self.ticks_left) / self.fade_ticks) as u8;
        }
    }

    pub(crate) fn visible(&self) -> bool {
        self.ticks_left > 0 && !self.text.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn alpha(&self) -> u8 {
        self.alpha
    }

    pub(crate) fn draw(&self, surface: &mut impl Surface) {
        if !self.visible() {
            return;
        }
        font::draw_text(surface, MARGIN, MARGIN, &self.text, MESSAGE_SCALE, self.color, self.alpha);
    }
}

/// Frames presented per wall-clock second; reports the last completed second.
pub(crate) struct FpsCounter {
    window_start: Instant,
    frames: u32,
    last_fps: u32,
}

impl FpsCounter {
    pub(crate) fn new(now: Instant) -> Self {
        Self {
            window_start: now,
            frames: 0,
            last_fps: 0,
        }
    }

    pub(crate) fn frame(&mut self, now: Instant) {
        self.frames += 1;
        while now.duration_since(self.window_start) >= Duration::from_secs(1) {
            self.last_fps = self.frames;
            self.frames = 0;
            self.window_start += Duration::from_secs(1);
        }
    }

    pub(crate) fn fps(&self) -> u32 {
        self.last_fps
    }

    pub(crate) fn draw(&self, surface: &mut impl Surface) {
        let text = format!("FPS {}", self.last_fps);
        let (w, _) = surface.size();
        let x = w as i32 - font::text_width(&text, FPS_SCALE) - MARGIN;
        font::draw_text(surface, x, MARGIN, &text, FPS_SCALE, [255, 220, 0], 255);
    }
}
