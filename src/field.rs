use crate::config::Config;
use rand::{rngs::StdRng, Rng};

pub(crate) const MAX_STARS: usize = 500;

// Respawned drifting stars start somewhere visibly bright.
const FRESH_MIN: i32 = 180;
const FRESH_MAX: i32 = 255;

// drift per tick = drift_speed * speed_factor / DRIFT_SCALE
const DRIFT_SCALE: f32 = 4.0;
const FACTOR_MIN: f32 = 0.5;
const FACTOR_MAX: f32 = 1.5;

#[derive(Clone, Copy, Debug)]
pub(crate) struct Star {
    pub(crate) x: f32,
    pub(crate) y: f32,
    pub(crate) brightness: i32, // 0..=255
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    pub(crate) speed_factor: f32,
}

impl Star {
    /// One fade increment: brightness drops by `step`, clamped at 0.
    pub(crate) fn fade(&mut self, step: i32) {
        self.brightness = (self.brightness - step).max(0);
    }
}

/// Fixed-capacity pool of stars. Slots are respawned in place, never freed;
/// the active length tracks the configured count.
pub(crate) struct StarField {
    stars: Vec<Star>,
    width: u32,
    height: u32,
}

impl StarField {
    pub(crate) fn new() -> Self {
        Self {
            stars: Vec::with_capacity(MAX_STARS),
            width: 0,
            height: 0,
        }
    }

    pub(crate) fn bounds(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub(crate) fn len(&self) -> usize {
        self.stars.len()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Star> {
        self.stars.iter()
    }

    /// Discard all stars and scatter `count` fresh ones across the given
    /// bounds. No-op when either dimension is zero.
    pub(crate) fn init(&mut self, rng: &mut StdRng, count: usize, width: u32, height: u32, colored: bool) {
        if width == 0 || height == 0 {
            return;
        }
        self.width = width;
        self.height = height;
        self.stars.clear();

        let count = count.min(MAX_STARS);
        let (w, h) = (width as f32, height as f32);
        for _ in 0..count {
            let (r, g, b) = random_color(rng, colored);
            self.stars.push(Star {
                x: rng.gen_range(0.0..w),
                y: rng.gen_range(0.0..h),
                brightness: rng.gen_range(0..=255),
                r,
                g,
                b,
                speed_factor: rng.gen_range(FACTOR_MIN..FACTOR_MAX),
            });
        }
    }

    /// Advance every star one tick: fade, drift, respawn. Uses the bounds the
    /// field was initialized with, so the draw call in the same tick sees
    /// identical limits.
    pub(crate) fn step(&mut self, rng: &mut StdRng, cfg: &Config) {
        if self.width == 0 || self.height == 0 {
            return;
        }
        let (w, h) = (self.width as f32, self.height as f32);
        let drift = cfg.drift_speed as f32 / DRIFT_SCALE;

        for star in self.stars.iter_mut() {
            star.fade(cfg.brightness_step);
            if cfg.drift_speed != 0 {
                star.x += drift * star.speed_factor;
            }

            if star.brightness == 0 {
                // faded out: reappear somewhere new
                star.x = rng.gen_range(0.0..w);
                star.y = rng.gen_range(0.0..h);
                star.brightness = if cfg.drift_speed != 0 {
                    rng.gen_range(FRESH_MIN..=FRESH_MAX)
                } else {
                    255
                };
                respawn_traits(star, rng, cfg.colored_stars);
            } else if cfg.drift_speed > 0 && star.x >= w {
                // left the right edge: wrap to the left
                star.x = 0.0;
                star.y = rng.gen_range(0.0..h);
                star.brightness = rng.gen_range(FRESH_MIN..=FRESH_MAX);
                respawn_traits(star, rng, cfg.colored_stars);
            } else if cfg.drift_speed < 0 && star.x < 0.0 {
                // left the left edge: wrap to the right
                star.x = w - 1.0;
                star.y = rng.gen_range(0.0..h);
                star.brightness = rng.gen_range(FRESH_MIN..=FRESH_MAX);
                respawn_traits(star, rng, cfg.colored_stars);
            }
        }
    }
}

fn respawn_traits(star: &mut Star, rng: &mut StdRng, colored: bool) {
    let (r, g, b) = random_color(rng, colored);
    star.r = r;
    star.g = g;
    star.b = b;
    star.speed_factor = rng.gen_range(FACTOR_MIN..FACTOR_MAX);
}

fn random_color(rng: &mut StdRng, colored: bool) -> (u8, u8, u8) {
    if colored {
        (rng.gen(), rng.gen(), rng.gen())
    } else {
        let gray: u8 = rng.gen();
        (gray, gray, gray)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(0xC0FFEE)
    }

    fn cfg() -> Config {
        Config::default()
    }

    #[test]
    fn init_populates_count_within_bounds() {
        let mut field = StarField::new();
        field.init(&mut rng(), 137, 320, 200, true);
        assert_eq!(field.len(), 137);
        for s in field.iter() {
            assert!(s.x >= 0.0 && s.x < 320.0);
            assert!(s.y >= 0.0 && s.y < 200.0);
            assert!((0..=255).contains(&s.brightness));
        }
    }

    #[test]
    fn init_with_zero_bounds_is_noop() {
        let mut field = StarField::new();
        field.init(&mut rng(), 50, 0, 200, true);
        assert_eq!(field.len(), 0);
        assert_eq!(field.bounds(), (0, 0));
    }

    #[test]
    fn init_caps_at_pool_capacity() {
        let mut field = StarField::new();
        field.init(&mut rng(), MAX_STARS + 100, 100, 100, false);
        assert_eq!(field.len(), MAX_STARS);
    }

    #[test]
    fn grayscale_init_replicates_one_gray() {
        let mut field = StarField::new();
        field.init(&mut rng(), 40, 100, 100, false);
        for s in field.iter() {
            assert_eq!(s.r, s.g);
            assert_eq!(s.g, s.b);
        }
    }

    #[test]
    fn fade_reaches_zero_in_ceil_b_over_s_steps() {
        let mut star = Star {
            x: 0.0,
            y: 0.0,
            brightness: 100,
            r: 255,
            g: 255,
            b: 255,
            speed_factor: 1.0,
        };
        let step = 30;
        let expected = (100 + step - 1) / step; // ceil(100/30) = 4
        for i in 1..=expected {
            star.fade(step);
            if i < expected {
                assert!(star.brightness > 0, "extinguished too early at {i}");
            }
        }
        assert_eq!(star.brightness, 0);
    }

    #[test]
    fn faded_star_respawns_same_tick() {
        let mut field = StarField::new();
        let mut r = rng();
        let mut config = cfg();
        config.num_stars = 1;
        config.brightness_step = 255;
        field.init(&mut r, 1, 100, 100, true);

        field.step(&mut r, &config);
        let star = field.iter().next().unwrap();
        // step 255 drives any initial brightness to 0, and the respawn in the
        // same tick resets it to full
        assert_eq!(star.brightness, 255);
        assert!(star.x >= 0.0 && star.x < 100.0);
        assert!(star.y >= 0.0 && star.y < 100.0);
    }

    #[test]
    fn drift_respawn_brightness_in_fresh_range() {
        let mut field = StarField::new();
        let mut r = rng();
        let mut config = cfg();
        config.num_stars = 60;
        config.brightness_step = 255;
        config.drift_speed = 5;
        field.init(&mut r, 60, 200, 150, true);

        field.step(&mut r, &config);
        for s in field.iter() {
            assert!((FRESH_MIN..=FRESH_MAX).contains(&s.brightness));
        }
    }

    #[test]
    fn rightward_drift_wraps_to_left_edge() {
        let mut field = StarField::new();
        let mut r = rng();
        let mut config = cfg();
        config.brightness_step = 1;
        config.drift_speed = 10;
        field.init(&mut r, 20, 50, 50, true);

        // enough ticks for every star to cross the 50px span at least once
        for _ in 0..200 {
            field.step(&mut r, &config);
            for s in field.iter() {
                assert!(s.x >= 0.0 && s.x < 50.0, "x out of bounds after wrap: {}", s.x);
            }
        }
    }

    #[test]
    fn leftward_drift_wraps_to_right_edge() {
        let mut field = StarField::new();
        let mut r = rng();
        let mut config = cfg();
        config.brightness_step = 1;
        config.drift_speed = -10;
        field.init(&mut r, 20, 50, 50, true);

        for _ in 0..200 {
            field.step(&mut r, &config);
            for s in field.iter() {
                assert!(s.x >= 0.0 && s.x < 50.0, "x out of bounds after wrap: {}", s.x);
            }
        }
    }

    #[test]
    fn brightness_never_negative() {
        let mut field = StarField::new();
        let mut r = rng();
        let mut config = cfg();
        config.brightness_step = 200;
        field.init(&mut r, 100, 100, 100, true);
        for _ in 0..10 {
            field.step(&mut r, &config);
            for s in field.iter() {
                assert!((0..=255).contains(&s.brightness));
            }
        }
    }
}
