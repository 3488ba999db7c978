use anyhow::Result;
use std::fs;
use std::path::Path;

pub(crate) const CONFIG_FILE: &str = "nightsky.ini";

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Config {
    pub(crate) num_stars: i32,       // 0..=500
    pub(crate) delay_ms: i32,        // 0..=1000
    pub(crate) brightness_step: i32, // 1..=255
    pub(crate) colored_stars: bool,
    pub(crate) star_size: i32, // 0..=16, 0 = single pixel
    pub(crate) drift_speed: i32, // -10..=10, 0 = stationary
    pub(crate) fullscreen: bool,
    pub(crate) show_fps: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            num_stars: 100,
            delay_ms: 100,
            brightness_step: 15,
            colored_stars: true,
            star_size: 2,
            drift_speed: 0,
            fullscreen: false,
            show_fps: false,
        }
    }
}

impl Config {
    pub(crate) fn clamp(&mut self) {
        self.num_stars = self.num_stars.clamp(0, crate::field::MAX_STARS as i32);
        self.delay_ms = self.delay_ms.clamp(0, 1000);
        self.brightness_step = self.brightness_step.clamp(1, 255);
        self.star_size = self.star_size.clamp(0, 16);
        self.drift_speed = self.drift_speed.clamp(-10, 10);
    }

    /// Apply `key value` / `key = value` lines. Comments, section headers,
    /// unknown keys and malformed lines are skipped.
    pub(crate) fn apply_text(&mut self, text: &str) {
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') || line.starts_with('[') {
                continue;
            }
            let (key, value) = match line.split_once('=') {
                Some((k, v)) => (k.trim(), v.trim()),
                None => match line.split_once(char::is_whitespace) {
                    Some((k, v)) => (k.trim(), v.trim()),
                    None => continue,
                },
            };
            let Ok(n) = value.parse::<i32>() else { continue };
            match key.to_ascii_lowercase().as_str() {
                "num_stars" => self.num_stars = n,
                "delay_ms" => self.delay_ms = n,
                "brightness_step" => self.brightness_step = n,
                "colored_stars" => self.colored_stars = n != 0,
                "star_size" => self.star_size = n,
                "drift_speed" => self.drift_speed = n,
                "fullscreen" => self.fullscreen = n != 0,
                "show_fps" => self.show_fps = n != 0,
                _ => {}
            }
        }
    }

    fn render_file(&self) -> String {
        let mut out = String::new();
        let mut kv = |comment: &str, key: &str, value: i32| {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str("# ");
            out.push_str(comment);
            out.push('\n');
            out.push_str(key);
            out.push(' ');
            out.push_str(&value.to_string());
            out.push('\n');
        };
        kv("Number of stars displayed on the screen. (0...500)", "num_stars", self.num_stars);
        kv("Delay between logic ticks in milliseconds. Affects animation speed. (0...1000)", "delay_ms", self.delay_ms);
        kv("Step by which brightness decreases per tick. Affects fading smoothness. (1...255)", "brightness_step", self.brightness_step);
        kv("Use colored stars. (1 = random RGB, 0 = grayscale)", "colored_stars", self.colored_stars as i32);
        kv("Star size in pixels. (0 = single pixel, up to 16)", "star_size", self.star_size);
        kv("Lateral drift speed. Negative drifts left, 0 stands still. (-10...10)", "drift_speed", self.drift_speed);
        kv("Start in fullscreen. (1 = yes, 0 = windowed)", "fullscreen", self.fullscreen as i32);
        kv("Show the FPS counter. (1 = yes, 0 = no)", "show_fps", self.show_fps as i32);
        out
    }

    pub(crate) fn save(&self, path: &Path) -> Result<()> {
        let tmp = path.with_extension("ini.tmp");
        fs::write(&tmp, self.render_file())?;
        // Best-effort atomic replace on same filesystem.
        if path.exists() {
            let _ = fs::remove_file(path);
        }
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

/// Load the config, clamping every value; a missing or unreadable file is
/// replaced with a freshly written default one.
pub(crate) fn load_or_create(path: &Path) -> Config {
    match fs::read_to_string(path) {
        Ok(text) => {
            let mut cfg = Config::default();
            cfg.apply_text(&text);
            cfg.clamp();
            cfg
        }
        Err(_) => {
            let cfg = Config::default();
            if let Err(err) = cfg.save(path) {
                eprintln!("nightsky: could not write default config: {err:#}");
            }
            cfg
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_is_noop_in_range() {
        let mut cfg = Config::default();
        let before = cfg.clone();
        cfg.clamp();
        assert_eq!(cfg, before);
    }

    #[test]
    fn clamp_maps_to_nearest_boundary() {
        let mut cfg = Config {
            num_stars: -5,
            delay_ms: 5000,
            brightness_step: 999,
            star_size: 40,
            drift_speed: -99,
            ..Config::default()
        };
        cfg.clamp();
        assert_eq!(cfg.num_stars, 0);
        assert_eq!(cfg.delay_ms, 1000);
        assert_eq!(cfg.brightness_step, 255);
        assert_eq!(cfg.star_size, 16);
        assert_eq!(cfg.drift_speed, -10);
    }

    #[test]
    fn parses_both_separators_and_ignores_noise() {
        let mut cfg = Config::default();
        cfg.apply_text(
            "# comment\n\
             ; another comment\n\
             [section]\n\
             NUM_STARS = 250\n\
             delay_ms 40\n\
             not_a_key 7\n\
             brightness_step banana\n\
             drift_speed=-3\n",
        );
        assert_eq!(cfg.num_stars, 250);
        assert_eq!(cfg.delay_ms, 40);
        assert_eq!(cfg.drift_speed, -3);
        // malformed value left the default alone
        assert_eq!(cfg.brightness_step, 15);
    }

    #[test]
    fn save_load_round_trips() {
        let cfg = Config {
            num_stars: 321,
            delay_ms: 5,
            brightness_step: 7,
            colored_stars: false,
            star_size: 9,
            drift_speed: 4,
            fullscreen: true,
            show_fps: true,
        };
        let mut reloaded = Config::default();
        reloaded.apply_text(&cfg.render_file());
        reloaded.clamp();
        assert_eq!(reloaded, cfg);
    }

    #[test]
    fn missing_file_yields_defaults_and_writes_them() {
        let dir = std::env::temp_dir().join(format!("nightsky-cfg-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("nightsky.ini");
        let _ = std::fs::remove_file(&path);

        let cfg = load_or_create(&path);
        assert_eq!(cfg, Config::default());
        assert!(path.exists());

        let again = load_or_create(&path);
        assert_eq!(again, cfg);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
