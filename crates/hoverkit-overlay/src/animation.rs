//! Cancellable position tweens driven by the Tokio clock.

use std::time::Duration;

use tokio::{
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::layer::Position;

/// Default tween length.
pub const DEFAULT_ANIMATION_MS: u64 = 250;

/// Interval between animation frames (~60 fps).
pub const FRAME_INTERVAL_MS: u64 = 16;

/// Deceleration curve: fast start, gentle stop.
pub fn ease_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t) * (1.0 - t)
}

/// Interpolate between two positions, truncating toward zero.
pub fn lerp(from: Position, to: Position, fraction: f32) -> Position {
    let step = |a: i32, b: i32| {
        let a = a as f32;
        (a + (b as f32 - a) * fraction) as i32
    };
    Position::new(step(from.x, to.x), step(from.y, to.y))
}

/// One frame of a running tween.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Frame {
    /// Interpolated position for this frame.
    pub position: Position,
    /// True on the frame that reaches the target.
    pub last: bool,
}

/// Handle to an in-flight tween.
#[derive(Debug)]
pub struct Animation {
    /// Monotonic id, used to tell a finished tween from its replacement.
    generation: u64,
    /// Cancels the tween task.
    token: CancellationToken,
}

impl Animation {
    /// Generation this handle was started with.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Stop the tween. Safe to call more than once.
    pub fn cancel(&self) {
        self.token.cancel();
    }
}

/// Start a tween from `from` to `to` over `duration`.
///
/// `on_frame` runs once per tick with the eased position; returning `false`
/// stops the tween early. Must be called within a Tokio runtime.
pub fn spawn_tween<F>(
    generation: u64,
    from: Position,
    to: Position,
    duration: Duration,
    mut on_frame: F,
) -> (Animation, JoinHandle<()>)
where
    F: FnMut(Frame) -> bool + Send + 'static,
{
    let token = CancellationToken::new();
    let cancel = token.clone();
    let handle = tokio::spawn(async move {
        trace!(generation, ?from, ?to, ms = duration.as_millis(), "tween_start");
        let started = Instant::now();
        let mut ticker = time::interval(Duration::from_millis(FRAME_INTERVAL_MS));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    trace!(generation, "tween_cancelled");
                    return;
                }
                _ = ticker.tick() => {}
            }
            let t = if duration.is_zero() {
                1.0
            } else {
                (started.elapsed().as_secs_f32() / duration.as_secs_f32()).min(1.0)
            };
            let last = t >= 1.0;
            let position = if last { to } else { lerp(from, to, ease_out(t)) };
            if !on_frame(Frame { position, last }) || last {
                trace!(generation, "tween_done");
                return;
            }
        }
    });
    (Animation { generation, token }, handle)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;

    #[test]
    fn curve_endpoints() {
        assert_eq!(ease_out(0.0), 0.0);
        assert_eq!(ease_out(1.0), 1.0);
        assert!(ease_out(0.5) > 0.5);
        assert_eq!(ease_out(2.0), 1.0);
    }

    #[test]
    fn lerp_truncates() {
        let p = lerp(Position::new(0, 10), Position::new(10, 0), 0.55);
        assert_eq!(p, Position::new(5, 4));
    }

    #[test]
    fn lerp_spans_full_coordinate_range() {
        let from = Position::new(i32::MIN, i32::MAX);
        let to = Position::new(i32::MAX, i32::MIN);
        assert_eq!(lerp(from, to, 0.0), from);
        assert_eq!(lerp(from, to, 1.0), to);
        assert_eq!(lerp(from, to, 0.5).x, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn tween_reaches_target_monotonically() {
        let frames = Arc::new(Mutex::new(Vec::new()));
        let sink = frames.clone();
        let (_anim, handle) = spawn_tween(
            1,
            Position::new(0, 0),
            Position::new(100, 0),
            Duration::from_millis(DEFAULT_ANIMATION_MS),
            move |f| {
                sink.lock().push(f);
                true
            },
        );
        handle.await.expect("tween task");
        let frames = frames.lock();
        let last = frames.last().expect("frames");
        assert!(last.last);
        assert_eq!(last.position, Position::new(100, 0));
        assert!(frames.windows(2).all(|w| w[0].position.x <= w[1].position.x));
        assert!(frames.len() > 5);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_tween_stops_short() {
        let frames = Arc::new(Mutex::new(Vec::new()));
        let sink = frames.clone();
        let (anim, handle) = spawn_tween(
            2,
            Position::new(0, 0),
            Position::new(0, 100),
            Duration::from_millis(DEFAULT_ANIMATION_MS),
            move |f| {
                sink.lock().push(f);
                true
            },
        );
        time::sleep(Duration::from_millis(100)).await;
        anim.cancel();
        anim.cancel();
        handle.await.expect("tween task");
        let frames = frames.lock();
        let last = frames.last().expect("frames");
        assert!(!last.last);
        assert!(last.position.y > 0 && last.position.y < 100);
    }
}
