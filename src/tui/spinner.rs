//! Busy-indicator frames.

use std::time::Duration;

/// Braille "dot" spinner.
pub const FRAMES: [&str; 8] = ["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"];

/// Time between frames (~10fps).
pub const TICK: Duration = Duration::from_millis(100);

/// Frame to show after `elapsed` time since the session started.
pub fn frame_at(elapsed: Duration) -> &'static str {
    let index = (elapsed.as_millis() / TICK.as_millis()) as usize % FRAMES.len();
    FRAMES[index]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames_advance_every_tick_and_wrap() {
        assert_eq!(frame_at(Duration::ZERO), "⣾");
        assert_eq!(frame_at(Duration::from_millis(99)), "⣾");
        assert_eq!(frame_at(Duration::from_millis(100)), "⣽");
        assert_eq!(frame_at(Duration::from_millis(750)), "⣷");
        assert_eq!(frame_at(Duration::from_millis(800)), "⣾");
    }
}
