use crate::config::{self, Config};
use crate::field::{StarField, MAX_STARS};
use crate::gfx::Gfx;
use crate::input::{map_key, Action};
use crate::overlay::{FpsCounter, Message};
use crate::render::{self, Surface as _};
use pollster::block_on;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use winit::application::ApplicationHandler;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow};
use winit::window::{Fullscreen, Window, WindowAttributes, WindowId};

const DEFAULT_W: u32 = 800;
const DEFAULT_H: u32 = 600;

const MAX_TICKS_PER_FRAME: u32 = 8;
// tick length stands in for delay_ms = 0 (one tick per vsynced frame)
const FRAME_FALLBACK_MS: u64 = 16;

const MESSAGE_MS: u64 = 2500;
const MESSAGE_FADE_MS: u64 = 1500;

const DOUBLE_CLICK: Duration = Duration::from_millis(400);
const DOUBLE_CLICK_SLOP: f64 = 8.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Geometry {
    pub(crate) x: i32,
    pub(crate) y: i32,
    pub(crate) w: u32,
    pub(crate) h: u32,
}

/// Windowed/fullscreen flag plus the geometry to restore on the way back.
pub(crate) struct ViewMode {
    fullscreen: bool,
    saved: Option<Geometry>,
}

impl ViewMode {
    pub(crate) fn new(start_fullscreen: bool) -> Self {
        Self {
            fullscreen: start_fullscreen,
            saved: None,
        }
    }

    pub(crate) fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    pub(crate) fn enter(&mut self, current: Geometry) {
        self.saved = Some(current);
        self.fullscreen = true;
    }

    /// Back to windowed; yields the geometry saved on entry, if any.
    pub(crate) fn leave(&mut self) -> Option<Geometry> {
        self.fullscreen = false;
        self.saved.take()
    }
}

pub(crate) struct App {
    debug: bool,
    config: Config,
    config_path: PathBuf,
    rng: StdRng,
    field: StarField,

    window: Option<Arc<Window>>,
    gfx: Option<Gfx>,
    canvas: render::PixelCanvas,

    mode: ViewMode,
    alt_held: bool,
    cursor_pos: PhysicalPosition<f64>,
    last_click: Option<(Instant, PhysicalPosition<f64>)>,

    message: Option<Message>,
    fps: FpsCounter,

    last_frame: Instant,
    tick_accum: Duration,

    // --debug stats
    last_stat: Instant,
    stat_frames: u64,
    stat_ticks: u64,

    fatal: Option<anyhow::Error>,
}

impl App {
    pub(crate) fn new(debug: bool) -> Self {
        let config_path = PathBuf::from(config::CONFIG_FILE);
        let cfg = config::load_or_create(&config_path);

        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0)
            ^ 0x9E37_79B9_7F4A_7C15;

        let now = Instant::now();
        Self {
            debug,
            mode: ViewMode::new(cfg.fullscreen),
            config: cfg,
            config_path,
            rng: StdRng::seed_from_u64(seed),
            field: StarField::new(),
            window: None,
            gfx: None,
            canvas: render::PixelCanvas::new(DEFAULT_W, DEFAULT_H),
            alt_held: false,
            cursor_pos: PhysicalPosition::new(0.0, 0.0),
            last_click: None,
            message: None,
            fps: FpsCounter::new(now),
            last_frame: now,
            tick_accum: Duration::ZERO,
            last_stat: now,
            stat_frames: 0,
            stat_ticks: 0,
            fatal: None,
        }
    }

    pub(crate) fn take_fatal(&mut self) -> Option<anyhow::Error> {
        self.fatal.take()
    }

    fn reinit_field(&mut self) {
        let (w, h) = match self.gfx.as_ref() {
            Some(gfx) => gfx.drawable_size(),
            None => return,
        };
        self.field.init(
            &mut self.rng,
            self.config.num_stars.max(0) as usize,
            w,
            h,
            self.config.colored_stars,
        );
    }

    fn flash(&mut self, text: String) {
        let tick_ms = if self.config.delay_ms > 0 {
            self.config.delay_ms as u64
        } else {
            FRAME_FALLBACK_MS
        };
        let total = (MESSAGE_MS / tick_ms).max(1) as u32;
        let fade = ((MESSAGE_FADE_MS / tick_ms).max(1) as u32).min(total);
        self.message = Some(Message::new(text, [255, 255, 255], total, fade));
    }

    fn toggle_fullscreen(&mut self) {
        let Some(window) = self.window.as_ref() else { return };

        if !self.mode.is_fullscreen() {
            let pos = window
                .outer_position()
                .unwrap_or_else(|_| PhysicalPosition::new(0, 0));
            let size = window.inner_size();
            self.mode.enter(Geometry {
                x: pos.x,
                y: pos.y,
                w: size.width,
                h: size.height,
            });
            window.set_fullscreen(Some(Fullscreen::Borderless(None)));
            window.set_cursor_visible(false);
            set_display_inhibit(true);
        } else {
            window.set_fullscreen(None);
            match self.mode.leave() {
                Some(g) => {
                    let _ = window.request_inner_size(PhysicalSize::new(g.w, g.h));
                    window.set_outer_position(PhysicalPosition::new(g.x, g.y));
                }
                // started fullscreen: nothing saved, fall back to the default
                None => {
                    let _ = window.request_inner_size(PhysicalSize::new(DEFAULT_W, DEFAULT_H));
                }
            }
            window.set_cursor_visible(true);
            set_display_inhibit(false);
        }
    }

    fn apply_action(&mut self, el: &ActiveEventLoop, action: Action) {
        match action {
            Action::Quit => el.exit(),
            Action::ToggleFullscreen => self.toggle_fullscreen(),
            Action::AddStars(delta) => {
                self.config.num_stars =
                    (self.config.num_stars + delta).clamp(0, MAX_STARS as i32);
                self.reinit_field();
                self.flash(format!("STARS {}", self.config.num_stars));
            }
            Action::AdjustSpeed(delta) => {
                self.config.drift_speed = (self.config.drift_speed + delta).clamp(-10, 10);
                self.flash(format!("SPEED {}", self.config.drift_speed));
            }
            Action::AdjustFade(delta) => {
                self.config.brightness_step =
                    (self.config.brightness_step + delta).clamp(1, 255);
                self.flash(format!("FADE {}", self.config.brightness_step));
            }
            Action::AdjustDelay(delta) => {
                self.config.delay_ms = (self.config.delay_ms + delta).clamp(0, 1000);
                self.flash(format!("DELAY {} MS", self.config.delay_ms));
            }
            Action::ToggleColor => {
                self.config.colored_stars = !self.config.colored_stars;
                // existing stars keep their color until they respawn
                let label = if self.config.colored_stars { "COLOR RGB" } else { "COLOR GRAY" };
                self.flash(label.to_string());
            }
            Action::CycleSize => {
                self.config.star_size = (self.config.star_size + 1) % 17;
                self.flash(format!("SIZE {}", self.config.star_size));
            }
            Action::ToggleFps => {
                self.config.show_fps = !self.config.show_fps;
                let label = if self.config.show_fps { "FPS ON" } else { "FPS OFF" };
                self.flash(label.to_string());
            }
            Action::Reseed => {
                self.reinit_field();
                self.flash("RESEED".to_string());
            }
        }
    }

    fn on_left_press(&mut self) {
        let now = Instant::now();
        let pos = self.cursor_pos;
        let is_double = self.last_click.is_some_and(|(t, p)| {
            now.duration_since(t) <= DOUBLE_CLICK
                && (p.x - pos.x).abs() <= DOUBLE_CLICK_SLOP
                && (p.y - pos.y).abs() <= DOUBLE_CLICK_SLOP
        });
        if is_double {
            self.last_click = None;
            self.toggle_fullscreen();
        } else {
            self.last_click = Some((now, pos));
        }
    }

    fn run_tick(&mut self) {
        self.field.step(&mut self.rng, &self.config);
        if let Some(msg) = self.message.as_mut() {
            msg.tick();
            if !msg.visible() {
                self.message = None;
            }
        }
        self.stat_ticks += 1;
    }

    fn render_frame(&mut self) {
        let Some(gfx) = self.gfx.as_mut() else { return };

        let (w, h) = gfx.drawable_size();
        if (w, h) != self.canvas.size() {
            self.canvas.resize(w, h);
        }

        render::draw_stars(&mut self.canvas, &self.field, &self.config);
        if let Some(msg) = &self.message {
            msg.draw(&mut self.canvas);
        }
        if self.config.show_fps {
            self.fps.draw(&mut self.canvas);
        }

        gfx.present(&self.canvas);
        self.fps.frame(Instant::now());
        self.stat_frames += 1;
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, el: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let mut attrs = WindowAttributes::default()
            .with_title("Night Sky")
            .with_inner_size(PhysicalSize::new(DEFAULT_W, DEFAULT_H))
            .with_resizable(true);
        if self.config.fullscreen {
            attrs = attrs.with_fullscreen(Some(Fullscreen::Borderless(None)));
        }

        let window = match el.create_window(attrs) {
            Ok(w) => Arc::new(w),
            Err(err) => {
                self.fatal = Some(anyhow::Error::new(err).context("create window"));
                el.exit();
                return;
            }
        };

        if self.config.fullscreen {
            window.set_cursor_visible(false);
            set_display_inhibit(true);
        }

        let size = window.inner_size();
        let gfx = match block_on(Gfx::new(window.clone(), size.width, size.height)) {
            Ok(g) => g,
            Err(err) => {
                self.fatal = Some(err.context("graphics init"));
                el.exit();
                return;
            }
        };

        self.window = Some(window);
        self.gfx = Some(gfx);
        self.canvas.resize(size.width, size.height);
        self.reinit_field();

        let now = Instant::now();
        self.last_frame = now;
        self.last_stat = now;
        self.fps = FpsCounter::new(now);
    }

    fn window_event(&mut self, el: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => el.exit(),

            WindowEvent::ModifiersChanged(mods) => {
                self.alt_held = mods.state().alt_key();
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed {
                    return;
                }
                if let Some(action) = map_key(&event.logical_key, self.alt_held) {
                    // holding a key may repeat parameter changes, but must not
                    // bounce the window in and out of fullscreen
                    if event.repeat && action == Action::ToggleFullscreen {
                        return;
                    }
                    self.apply_action(el, action);
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                self.cursor_pos = position;
            }

            WindowEvent::MouseInput { state, button, .. } => {
                if button == MouseButton::Left && state == ElementState::Pressed {
                    self.on_left_press();
                }
            }

            WindowEvent::Resized(size) => {
                if let Some(gfx) = self.gfx.as_mut() {
                    gfx.resize(size.width, size.height);
                }
                self.canvas.resize(size.width.max(1), size.height.max(1));
                self.reinit_field();
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, el: &ActiveEventLoop) {
        el.set_control_flow(ControlFlow::Poll);
        if self.gfx.is_none() {
            return;
        }

        let now = Instant::now();
        let dt = now
            .saturating_duration_since(self.last_frame)
            .min(Duration::from_millis(250));
        self.last_frame = now;

        if self.config.delay_ms == 0 {
            self.run_tick();
            self.tick_accum = Duration::ZERO;
        } else {
            self.tick_accum += dt;
            let step = Duration::from_millis(self.config.delay_ms as u64);
            let mut ran = 0;
            while self.tick_accum >= step && ran < MAX_TICKS_PER_FRAME {
                self.run_tick();
                self.tick_accum -= step;
                ran += 1;
            }
            if ran == MAX_TICKS_PER_FRAME {
                // too far behind: drop the backlog instead of spiraling
                self.tick_accum = Duration::ZERO;
            }
        }

        self.render_frame();

        if self.debug && self.last_stat.elapsed() >= Duration::from_secs(1) {
            eprintln!(
                "[nightsky] fps {} | ticks/s {} | stars {} | fade {} | drift {} | size {} | delay {} ms",
                self.stat_frames,
                self.stat_ticks,
                self.config.num_stars,
                self.config.brightness_step,
                self.config.drift_speed,
                self.config.star_size,
                self.config.delay_ms,
            );
            self.stat_frames = 0;
            self.stat_ticks = 0;
            self.last_stat = Instant::now();
        }
    }

    fn exiting(&mut self, _el: &ActiveEventLoop) {
        set_display_inhibit(false);
        self.config.fullscreen = self.mode.is_fullscreen();
        if let Err(err) = self.config.save(&self.config_path) {
            eprintln!("nightsky: could not save config: {err:#}");
        }
    }
}

/// Keep the display awake while fullscreen, the way a screensaver host would.
#[cfg(windows)]
fn set_display_inhibit(on: bool) {
    use windows_sys::Win32::System::Power::{
        SetThreadExecutionState, ES_CONTINUOUS, ES_DISPLAY_REQUIRED,
    };
    unsafe {
        if on {
            SetThreadExecutionState(ES_CONTINUOUS | ES_DISPLAY_REQUIRED);
        } else {
            SetThreadExecutionState(ES_CONTINUOUS);
        }
    }
}

#[cfg(not(windows))]
fn set_display_inhibit(_on: bool) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggling_twice_restores_saved_geometry() {
        let mut mode = ViewMode::new(false);
        let original = Geometry { x: 40, y: 60, w: 800, h: 600 };

        mode.enter(original);
        assert!(mode.is_fullscreen());

        let restored = mode.leave();
        assert!(!mode.is_fullscreen());
        assert_eq!(restored, Some(original));
    }

    #[test]
    fn leaving_without_entry_has_no_geometry() {
        let mut mode = ViewMode::new(true);
        assert!(mode.is_fullscreen());
        assert_eq!(mode.leave(), None);
        assert!(!mode.is_fullscreen());
    }

    #[test]
    fn saved_geometry_is_consumed_once() {
        let mut mode = ViewMode::new(false);
        mode.enter(Geometry { x: 1, y: 2, w: 3, h: 4 });
        let _ = mode.leave();
        mode.enter(Geometry { x: 9, y: 9, w: 9, h: 9 });
        assert_eq!(mode.leave(), Some(Geometry { x: 9, y: 9, w: 9, h: 9 }));
    }
}
