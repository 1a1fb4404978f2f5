use leptos::{ev, prelude::*};

/// Viewport width thresholds, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Breakpoint {
    Base,
    Sm,
    Md,
    Lg,
    Xl,
    Xxl,
}

impl Breakpoint {
    const ALL: [Breakpoint; 6] = [
        Breakpoint::Base,
        Breakpoint::Sm,
        Breakpoint::Md,
        Breakpoint::Lg,
        Breakpoint::Xl,
        Breakpoint::Xxl,
    ];

    pub const fn min_width(self) -> f64 {
        match self {
            Breakpoint::Base => 0.0,
            Breakpoint::Sm => 480.0,
            Breakpoint::Md => 768.0,
            Breakpoint::Lg => 992.0,
            Breakpoint::Xl => 1280.0,
            Breakpoint::Xxl => 1536.0,
        }
    }

    /// The largest breakpoint the width reaches.
    pub fn from_width(width: f64) -> Self {
        Self::ALL
            .into_iter()
            .rev()
            .find(|breakpoint| width >= breakpoint.min_width())
            .unwrap_or(Breakpoint::Base)
    }

    pub fn reached_by(self, width: f64) -> bool {
        Self::from_width(width) >= self
    }
}

fn current_viewport_width() -> f64 {
    web_sys::window()
        .and_then(|window| window.inner_width().ok())
        .and_then(|width| width.as_f64())
        .unwrap_or_default()
}

/// The window's inner width, kept up to date on resize until the owner is cleaned up.
pub fn use_viewport_width() -> ReadSignal<f64> {
    let (width, set_width) = signal(current_viewport_width());
    let handle = window_event_listener(ev::resize, move |_| {
        set_width.set(current_viewport_width());
    });
    on_cleanup(move || handle.remove());
    width
}

/// Whether `width` is at least `breakpoint`, only notifying when that flips.
pub fn breakpoint_reached(width: Signal<f64>, breakpoint: Breakpoint) -> Memo<bool> {
    Memo::new(move |_| breakpoint.reached_by(width.get()))
}

/// Whether the viewport is at least `breakpoint` wide.
///
/// Each call registers its own resize listener, so call it once near the root and pass the memo down.
pub fn use_breakpoint_reached(breakpoint: Breakpoint) -> Memo<bool> {
    breakpoint_reached(use_viewport_width().into(), breakpoint)
}

#[cfg(test)]
mod tests {
    use rstest::*;

    use super::*;

    #[rstest]
    #[case(0.0, Breakpoint::Base)]
    #[case(479.9, Breakpoint::Base)]
    #[case(480.0, Breakpoint::Sm)]
    #[case(800.0, Breakpoint::Md)]
    #[case(991.0, Breakpoint::Md)]
    #[case(992.0, Breakpoint::Lg)]
    #[case(1300.0, Breakpoint::Xl)]
    #[case(4000.0, Breakpoint::Xxl)]
    fn test_from_width(#[case] width: f64, #[case] expected: Breakpoint) {
        assert_eq!(Breakpoint::from_width(width), expected);
    }

    #[test]
    fn test_reached_by() {
        assert!(!Breakpoint::Lg.reached_by(991.0));
        assert!(Breakpoint::Lg.reached_by(992.0));
        assert!(Breakpoint::Lg.reached_by(1920.0));
        assert!(Breakpoint::Base.reached_by(0.0));
    }

    #[test]
    fn test_breakpoint_reached_follows_width() {
        let owner = Owner::new();
        owner.set();
        let width = RwSignal::new(800.0);
        let is_wide = breakpoint_reached(width.into(), Breakpoint::Lg);
        let is_small = breakpoint_reached(width.into(), Breakpoint::Sm);
        assert!(!is_wide.get_untracked());
        assert!(is_small.get_untracked());

        width.set(1200.0);
        assert!(is_wide.get_untracked());
        width.set(400.0);
        assert!(!is_wide.get_untracked());
        assert!(!is_small.get_untracked());
    }
}
