use winit::keyboard::{Key, NamedKey};

/// Everything a key press can do. Parameter deltas carry their step so the
/// handler stays a dumb apply-and-flash loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Action {
    Quit,
    ToggleFullscreen,
    AddStars(i32),
    AdjustSpeed(i32),
    AdjustFade(i32),
    AdjustDelay(i32),
    ToggleColor,
    CycleSize,
    ToggleFps,
    Reseed,
}

pub(crate) fn map_key(key: &Key, alt: bool) -> Option<Action> {
    match key {
        Key::Named(NamedKey::Escape) => Some(Action::Quit),
        Key::Named(NamedKey::F11) => Some(Action::ToggleFullscreen),
        Key::Named(NamedKey::Enter) if alt => Some(Action::ToggleFullscreen),
        Key::Named(NamedKey::ArrowUp) => Some(Action::AddStars(10)),
        Key::Named(NamedKey::ArrowDown) => Some(Action::AddStars(-10)),
        Key::Named(NamedKey::ArrowRight) => Some(Action::AdjustSpeed(1)),
        Key::Named(NamedKey::ArrowLeft) => Some(Action::AdjustSpeed(-1)),
        Key::Character(s) => match s.as_str() {
            "q" | "Q" => Some(Action::Quit),
            "c" | "C" => Some(Action::ToggleColor),
            "s" | "S" => Some(Action::CycleSize),
            "f" | "F" => Some(Action::ToggleFps),
            "r" | "R" => Some(Action::Reseed),
            "+" | "=" => Some(Action::AdjustFade(5)),
            "-" | "_" => Some(Action::AdjustFade(-5)),
            "]" => Some(Action::AdjustDelay(10)),
            "[" => Some(Action::AdjustDelay(-10)),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ch(s: &str) -> Key {
        Key::Character(s.into())
    }

    #[test]
    fn quit_and_fullscreen_bindings() {
        assert_eq!(map_key(&Key::Named(NamedKey::Escape), false), Some(Action::Quit));
        assert_eq!(map_key(&ch("Q"), false), Some(Action::Quit));
        assert_eq!(map_key(&Key::Named(NamedKey::F11), false), Some(Action::ToggleFullscreen));
        assert_eq!(
            map_key(&Key::Named(NamedKey::Enter), true),
            Some(Action::ToggleFullscreen)
        );
        // plain Enter does nothing
        assert_eq!(map_key(&Key::Named(NamedKey::Enter), false), None);
    }

    #[test]
    fn parameter_bindings_carry_their_step() {
        assert_eq!(map_key(&Key::Named(NamedKey::ArrowUp), false), Some(Action::AddStars(10)));
        assert_eq!(map_key(&Key::Named(NamedKey::ArrowLeft), false), Some(Action::AdjustSpeed(-1)));
        assert_eq!(map_key(&ch("+"), false), Some(Action::AdjustFade(5)));
        assert_eq!(map_key(&ch("["), false), Some(Action::AdjustDelay(-10)));
        assert_eq!(map_key(&ch("c"), false), Some(Action::ToggleColor));
        assert_eq!(map_key(&ch("x"), false), None);
    }
}
