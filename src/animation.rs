//! A one-dimensional, constant-speed slide used by both the tape and the delta sheet.
//!
//! A slide is either idle or moving toward a single target. Starting a new slide while one
//! is in flight is refused, so each owner has at most one animation at a time.

/// State of a slide.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Motion {
    Idle,
    Moving { target: f32, forward: bool },
}

/// A scalar visual offset animated toward a target at a fixed speed per frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Slide {
    position: f32,
    speed: f32,
    motion: Motion,
}

impl Slide {
    pub fn new(position: f32, speed: f32) -> Self {
        Self {
            position,
            speed,
            motion: Motion::Idle,
        }
    }

    /// Returns the current visual offset.
    pub fn position(&self) -> f32 {
        self.position
    }

    /// Returns where the slide will come to rest.
    pub fn target(&self) -> f32 {
        match self.motion {
            Motion::Idle => self.position,
            Motion::Moving { target, .. } => target,
        }
    }

    pub fn is_moving(&self) -> bool {
        matches!(self.motion, Motion::Moving { .. })
    }

    /// Begins sliding by `distance`. Returns false, changing nothing, if a slide is already in
    /// flight or the distance is zero.
    pub fn start(&mut self, distance: f32) -> bool {
        if self.is_moving() || distance == 0.0 {
            return false;
        }

        self.motion = Motion::Moving {
            target: self.position + distance,
            forward: distance > 0.0,
        };
        true
    }

    /// Advances the slide by one frame. Returns true on the frame the slide comes to rest.
    ///
    /// The stop test compares against the target in the direction of travel, so a step that
    /// would pass the target lands exactly on it instead of overshooting.
    pub fn tick(&mut self) -> bool {
        let Motion::Moving { target, forward } = self.motion else {
            return false;
        };

        let next = if forward {
            self.position + self.speed
        } else {
            self.position - self.speed
        };

        let finished = if forward {
            next >= target
        } else {
            next <= target
        };

        if finished {
            self.position = target;
            self.motion = Motion::Idle;
        } else {
            self.position = next;
        }

        finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticks_until_rest(slide: &mut Slide) -> usize {
        let mut ticks = 0;
        while slide.is_moving() {
            slide.tick();
            ticks += 1;
            assert!(ticks < 10_000, "slide never finished");
        }
        ticks
    }

    #[test]
    fn test_slide_reaches_target_exactly() {
        let mut slide = Slide::new(0.0, 5.0);
        assert!(slide.start(40.0));

        assert_eq!(ticks_until_rest(&mut slide), 8);
        assert_eq!(slide.position(), 40.0);
    }

    #[test]
    fn test_slide_clamps_overshoot() {
        let mut slide = Slide::new(10.0, 4.0);
        assert!(slide.start(-10.0));

        assert_eq!(ticks_until_rest(&mut slide), 3);
        assert_eq!(slide.position(), 0.0);
    }

    #[test]
    fn test_second_start_is_refused() {
        let mut slide = Slide::new(0.0, 5.0);
        assert!(slide.start(40.0));
        slide.tick();

        assert!(!slide.start(-40.0));
        assert_eq!(slide.target(), 40.0);
    }

    #[test]
    fn test_zero_distance_does_not_move() {
        let mut slide = Slide::new(3.0, 5.0);

        assert!(!slide.start(0.0));
        assert!(!slide.is_moving());
        assert!(!slide.tick());
    }
}
