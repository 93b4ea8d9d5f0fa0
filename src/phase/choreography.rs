//! Entrance and exit choreography
//!
//! Presets are plain data: three keyframes (`hidden`, `shown`, `exit`) plus
//! stagger timings. [`Choreography`] turns a preset and a child count into
//! per-child [`ChildCue`]s, and a cue can be sampled at any instant to get
//! the child's interpolated keyframe.
//!
//! Entrance staggers children in declared order; exit staggers them in
//! reverse, so the last-declared child leaves first.

use std::time::Duration;

use serde::Serialize;

/// Animation curve applied to a cue's progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Easing {
    /// Linear interpolation: `t`.
    Linear,
    /// Slow start, accelerating: `t³`.
    EaseIn,
    /// Slow end, decelerating: `1 - (1-t)³`.
    #[default]
    EaseOut,
    /// Smooth S-curve: slow start and end.
    EaseInOut,
}

impl Easing {
    /// Applies the curve to `t`, clamped to `0.0..=1.0`.
    #[must_use]
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::EaseIn => t * t * t,
            Self::EaseOut => {
                let inv = 1.0 - t;
                1.0 - inv * inv * inv
            }
            Self::EaseInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    let inv = (-2.0f64).mul_add(t, 2.0);
                    1.0 - inv * inv * inv / 2.0
                }
            }
        }
    }
}

/// Visual pose of one child: opacity, offset and scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Keyframe {
    /// 0.0 (invisible) to 1.0 (opaque)
    pub opacity: f64,
    /// Horizontal offset in pixels
    pub x: f64,
    /// Vertical offset in pixels
    pub y: f64,
    /// Uniform scale factor
    pub scale: f64,
}

impl Keyframe {
    /// Fully visible, untransformed.
    pub const VISIBLE: Self = Self {
        opacity: 1.0,
        x: 0.0,
        y: 0.0,
        scale: 1.0,
    };

    /// Fully transparent, untransformed.
    pub const TRANSPARENT: Self = Self {
        opacity: 0.0,
        x: 0.0,
        y: 0.0,
        scale: 1.0,
    };

    /// Interpolates between `self` and `to` at progress `t` (unclamped).
    #[must_use]
    pub fn lerp(&self, to: &Self, t: f64) -> Self {
        Self {
            opacity: (to.opacity - self.opacity).mul_add(t, self.opacity),
            x: (to.x - self.x).mul_add(t, self.x),
            y: (to.y - self.y).mul_add(t, self.y),
            scale: (to.scale - self.scale).mul_add(t, self.scale),
        }
    }
}

/// Which child moves first when a group staggers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StaggerDirection {
    /// Declared order: first child first.
    #[default]
    Forward,
    /// Reverse order: last child first.
    Reverse,
}

/// Declarative entrance/exit preset for the children of a phase.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Choreography {
    /// Pose before the entrance starts
    pub hidden: Keyframe,
    /// Pose once the entrance is complete
    pub shown: Keyframe,
    /// Pose at the end of the exit
    pub exit: Keyframe,
    /// Delay before the first child starts entering
    pub delay_children: Duration,
    /// Offset between consecutive children on entrance
    pub stagger: Duration,
    /// Offset between consecutive children on exit
    pub exit_stagger: Duration,
    /// Order children leave in
    pub exit_direction: StaggerDirection,
    /// Duration of one child's transition
    pub child_duration: Duration,
    /// Curve applied to every child transition
    pub easing: Easing,
}

impl Choreography {
    /// Rise-and-settle preset: children fade in from slightly below at 95 %
    /// scale and leave upward, staggered.
    #[must_use]
    pub const fn rise(rise_px: f64, delay_children: Duration, stagger: Duration) -> Self {
        Self {
            hidden: Keyframe {
                opacity: 0.0,
                x: 0.0,
                y: rise_px,
                scale: 0.95,
            },
            shown: Keyframe::VISIBLE,
            exit: Keyframe {
                opacity: 0.0,
                x: 0.0,
                y: -10.0,
                scale: 0.95,
            },
            delay_children,
            stagger,
            exit_stagger: Duration::from_millis(50),
            exit_direction: StaggerDirection::Reverse,
            child_duration: Duration::from_millis(300),
            easing: Easing::EaseOut,
        }
    }

    /// Plain opacity cross-fade with no stagger.
    #[must_use]
    pub const fn fade() -> Self {
        Self {
            hidden: Keyframe::TRANSPARENT,
            shown: Keyframe::VISIBLE,
            exit: Keyframe::TRANSPARENT,
            delay_children: Duration::ZERO,
            stagger: Duration::ZERO,
            exit_stagger: Duration::ZERO,
            exit_direction: StaggerDirection::Forward,
            child_duration: Duration::from_millis(300),
            easing: Easing::EaseInOut,
        }
    }

    /// Entrance cues for `children` children, all shifted by `offset`.
    #[must_use]
    pub fn entrance_cues(&self, children: usize, offset: Duration) -> Vec<ChildCue> {
        (0..children)
            .map(|index| ChildCue {
                index,
                delay: offset + self.delay_children + self.stagger * count(index),
                duration: self.child_duration,
                from: self.hidden,
                to: self.shown,
                easing: self.easing,
            })
            .collect()
    }

    /// Exit cues for `children` children, in declared order.
    ///
    /// With [`StaggerDirection::Reverse`] the last child gets zero delay.
    #[must_use]
    pub fn exit_cues(&self, children: usize) -> Vec<ChildCue> {
        (0..children)
            .map(|index| {
                let rank = match self.exit_direction {
                    StaggerDirection::Forward => index,
                    StaggerDirection::Reverse => children - 1 - index,
                };
                ChildCue {
                    index,
                    delay: self.exit_stagger * count(rank),
                    duration: self.child_duration,
                    from: self.shown,
                    to: self.exit,
                    easing: self.easing,
                }
            })
            .collect()
    }

    /// Time until the last child has finished entering.
    #[must_use]
    pub fn entrance_duration(&self, children: usize) -> Duration {
        last_end(&self.entrance_cues(children, Duration::ZERO))
    }

    /// Time until the last child has finished exiting.
    ///
    /// A phase with no animated children still fades as a whole, so this is
    /// never shorter than one child transition.
    #[must_use]
    pub fn exit_duration(&self, children: usize) -> Duration {
        last_end(&self.exit_cues(children)).max(self.child_duration)
    }
}

/// Scheduled transition of one child.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChildCue {
    /// Declared position of the child
    pub index: usize,
    /// Time from the cue origin until the child starts moving
    pub delay: Duration,
    /// Length of the transition
    pub duration: Duration,
    /// Starting pose
    pub from: Keyframe,
    /// Final pose
    pub to: Keyframe,
    /// Curve applied to progress
    pub easing: Easing,
}

impl ChildCue {
    /// Time from the cue origin until the child is at rest.
    #[must_use]
    pub fn ends_at(&self) -> Duration {
        self.delay + self.duration
    }

    /// Linear progress in `0.0..=1.0` at `elapsed` since the cue origin.
    #[must_use]
    pub fn progress(&self, elapsed: Duration) -> f64 {
        if elapsed <= self.delay {
            return 0.0;
        }
        if self.duration.is_zero() {
            return 1.0;
        }
        ((elapsed - self.delay).as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
    }

    /// Interpolated pose at `elapsed` since the cue origin.
    #[must_use]
    pub fn sample(&self, elapsed: Duration) -> Keyframe {
        let t = self.easing.apply(self.progress(elapsed));
        self.from.lerp(&self.to, t)
    }
}

fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

fn last_end(cues: &[ChildCue]) -> Duration {
    cues.iter().map(ChildCue::ends_at).max().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn test_easing_endpoints() {
        for easing in [
            Easing::Linear,
            Easing::EaseIn,
            Easing::EaseOut,
            Easing::EaseInOut,
        ] {
            assert_close(easing.apply(0.0), 0.0);
            assert_close(easing.apply(1.0), 1.0);
            assert_close(easing.apply(-3.0), 0.0);
            assert_close(easing.apply(7.0), 1.0);
        }
    }

    #[test]
    fn test_easing_shapes() {
        assert_close(Easing::Linear.apply(0.5), 0.5);
        assert!(Easing::EaseIn.apply(0.5) < 0.5);
        assert!(Easing::EaseOut.apply(0.5) > 0.5);
        assert_close(Easing::EaseInOut.apply(0.5), 0.5);
    }

    #[test]
    fn test_entrance_staggers_in_declared_order() {
        let preset = Choreography::rise(20.0, ms(200), ms(150));
        let delays: Vec<Duration> = preset
            .entrance_cues(3, Duration::ZERO)
            .iter()
            .map(|c| c.delay)
            .collect();
        assert_eq!(delays, [ms(200), ms(350), ms(500)]);
    }

    #[test]
    fn test_entrance_offset_shifts_all_cues() {
        let preset = Choreography::rise(15.0, ms(100), ms(100));
        let cues = preset.entrance_cues(2, ms(400));
        assert_eq!(cues[0].delay, ms(500));
        assert_eq!(cues[1].delay, ms(600));
    }

    #[test]
    fn test_exit_reverses_stagger() {
        let preset = Choreography::rise(20.0, ms(200), ms(150));
        let delays: Vec<Duration> = preset.exit_cues(4).iter().map(|c| c.delay).collect();
        assert_eq!(delays, [ms(150), ms(100), ms(50), ms(0)]);
    }

    #[test]
    fn test_exit_duration() {
        let preset = Choreography::rise(20.0, ms(200), ms(150));
        assert_eq!(preset.exit_duration(4), ms(450));
        assert_eq!(preset.exit_duration(0), ms(300));
        assert_eq!(Choreography::fade().exit_duration(5), ms(300));
    }

    #[test]
    fn test_entrance_duration() {
        let preset = Choreography::rise(15.0, ms(100), ms(100));
        assert_eq!(preset.entrance_duration(5), ms(800));
    }

    #[test]
    fn test_cue_sampling() {
        let preset = Choreography::rise(20.0, ms(200), ms(150));
        let cue = &preset.entrance_cues(1, Duration::ZERO)[0];

        let before = cue.sample(ms(100));
        assert_close(before.opacity, 0.0);
        assert_close(before.y, 20.0);
        assert_close(before.scale, 0.95);

        let after = cue.sample(ms(10_000));
        assert_eq!(after, Keyframe::VISIBLE);

        let mid = cue.sample(ms(350));
        assert!(mid.opacity > 0.0 && mid.opacity < 1.0);
        assert!(mid.y > 0.0 && mid.y < 20.0);
    }

    #[test]
    fn test_progress_is_monotonic() {
        let cue = &Choreography::fade().entrance_cues(1, ms(50))[0];
        let mut last = 0.0;
        for step in 0..50 {
            let p = cue.progress(ms(step * 10));
            assert!(p >= last);
            last = p;
        }
        assert_close(last, 1.0);
    }

    #[test]
    fn test_keyframe_lerp() {
        let a = Keyframe::TRANSPARENT;
        let b = Keyframe {
            opacity: 1.0,
            x: 20.0,
            y: -10.0,
            scale: 2.0,
        };
        let mid = a.lerp(&b, 0.5);
        assert_close(mid.opacity, 0.5);
        assert_close(mid.x, 10.0);
        assert_close(mid.y, -5.0);
        assert_close(mid.scale, 1.5);
    }
}
