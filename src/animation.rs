//! Frame-driven tweens for view alpha and position.
//!
//! An animation latches its start time on the first frame of its output after
//! it was created, so a tween queued while an output is idle still runs for
//! its full duration.

use std::time::Duration;

use smithay::utils::{Logical, Point};

use crate::ids::{AnimationId, IdGen, OutputId, ViewId};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Tween {
    Alpha { from: f32, to: f32 },
    Position {
        from: Point<i32, Logical>,
        to: Point<i32, Logical>,
    },
}

impl Tween {
    fn same_kind(&self, other: &Tween) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    fn sample(&self, t: f64) -> TweenValue {
        match *self {
            Tween::Alpha { to, .. } if t >= 1.0 => TweenValue::Alpha(to),
            Tween::Position { to, .. } if t >= 1.0 => TweenValue::Position(to),
            Tween::Alpha { from, to } => TweenValue::Alpha(from + (to - from) * t as f32),
            Tween::Position { from, to } => {
                let x = from.x as f64 + (to.x - from.x) as f64 * t;
                let y = from.y as f64 + (to.y - from.y) as f64 * t;
                TweenValue::Position(Point::from((x.round() as i32, y.round() as i32)))
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TweenValue {
    Alpha(f32),
    Position(Point<i32, Logical>),
}

/// What happens to the view once the tween reaches its target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OnFinish {
    #[default]
    Nothing,
    Unmap,
}

#[derive(Debug)]
struct Animation {
    id: AnimationId,
    view: ViewId,
    output: OutputId,
    tween: Tween,
    duration: Duration,
    started: Option<Duration>,
    on_finish: OnFinish,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimationStep {
    pub view: ViewId,
    pub value: TweenValue,
    pub finished: Option<OnFinish>,
}

#[derive(Debug, Default)]
pub struct Animations {
    running: Vec<Animation>,
    ids: IdGen,
}

impl Animations {
    /// Starts a tween, replacing any running tween of the same kind on the view.
    pub fn start(
        &mut self,
        view: ViewId,
        output: OutputId,
        tween: Tween,
        duration: Duration,
        on_finish: OnFinish,
    ) -> AnimationId {
        self.running
            .retain(|a| !(a.view == view && a.tween.same_kind(&tween)));
        let id = self.ids.next();
        self.running.push(Animation {
            id,
            view,
            output,
            tween,
            duration,
            started: None,
            on_finish,
        });
        id
    }

    pub fn cancel(&mut self, id: AnimationId) {
        self.running.retain(|a| a.id != id);
    }

    pub fn cancel_view(&mut self, view: ViewId) {
        self.running.retain(|a| a.view != view);
    }

    pub fn cancel_output(&mut self, output: OutputId) {
        self.running.retain(|a| a.output != output);
    }

    pub fn is_empty(&self) -> bool {
        self.running.is_empty()
    }

    pub fn target(&self, view: ViewId, kind: &Tween) -> Option<Tween> {
        self.running
            .iter()
            .find(|a| a.view == view && a.tween.same_kind(kind))
            .map(|a| a.tween)
    }

    pub fn outputs(&self) -> Vec<OutputId> {
        let mut outputs: Vec<_> = self.running.iter().map(|a| a.output).collect();
        outputs.sort();
        outputs.dedup();
        outputs
    }

    /// Advances every tween bound to `output` to `now`; finished ones are dropped.
    pub fn advance(&mut self, output: OutputId, now: Duration) -> Vec<AnimationStep> {
        let mut steps = Vec::new();
        self.running.retain_mut(|animation| {
            if animation.output != output {
                return true;
            }
            let started = *animation.started.get_or_insert(now);
            let elapsed = now.saturating_sub(started);
            let t = if animation.duration.is_zero() {
                1.0
            } else {
                (elapsed.as_secs_f64() / animation.duration.as_secs_f64()).min(1.0)
            };
            let done = t >= 1.0;
            steps.push(AnimationStep {
                view: animation.view,
                value: animation.tween.sample(t),
                finished: done.then_some(animation.on_finish),
            });
            !done
        });
        steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alpha_tween_latches_start_on_first_frame() {
        let mut animations = Animations::default();
        let view = ViewId::new(1);
        let output = OutputId::new(1);
        animations.start(
            view,
            output,
            Tween::Alpha { from: 0.0, to: 0.8 },
            Duration::from_millis(200),
            OnFinish::Nothing,
        );

        let first = animations.advance(output, Duration::from_millis(1000));
        assert_eq!(first[0].value, TweenValue::Alpha(0.0));
        assert_eq!(first[0].finished, None);

        let mid = animations.advance(output, Duration::from_millis(1100));
        match mid[0].value {
            TweenValue::Alpha(a) => assert!((a - 0.4).abs() < 1e-4),
            other => panic!("unexpected {other:?}"),
        }

        let last = animations.advance(output, Duration::from_millis(1300));
        assert_eq!(last[0].value, TweenValue::Alpha(0.8));
        assert_eq!(last[0].finished, Some(OnFinish::Nothing));
        assert!(animations.is_empty());
    }

    #[test]
    fn new_tween_replaces_same_kind_only() {
        let mut animations = Animations::default();
        let view = ViewId::new(1);
        let output = OutputId::new(1);
        let d = Duration::from_millis(100);
        animations.start(view, output, Tween::Alpha { from: 0.0, to: 1.0 }, d, OnFinish::Nothing);
        animations.start(
            view,
            output,
            Tween::Position {
                from: Point::from((0, 0)),
                to: Point::from((10, 0)),
            },
            d,
            OnFinish::Nothing,
        );
        animations.start(view, output, Tween::Alpha { from: 1.0, to: 0.0 }, d, OnFinish::Unmap);

        let target = animations.target(view, &Tween::Alpha { from: 0.0, to: 0.0 });
        assert_eq!(target, Some(Tween::Alpha { from: 1.0, to: 0.0 }));
        assert_eq!(animations.advance(output, Duration::ZERO).len(), 2);
    }

    #[test]
    fn other_outputs_are_untouched() {
        let mut animations = Animations::default();
        animations.start(
            ViewId::new(1),
            OutputId::new(2),
            Tween::Alpha { from: 0.0, to: 1.0 },
            Duration::ZERO,
            OnFinish::Nothing,
        );
        assert!(animations.advance(OutputId::new(1), Duration::ZERO).is_empty());
        assert_eq!(animations.outputs(), vec![OutputId::new(2)]);
    }
}
