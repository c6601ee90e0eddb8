use foundation::time::{Time, TimeSpan};

/// Cubic in-out easing of normalised progress `t`.
pub fn cubic_in_out(t: f64) -> f64 {
    let t = t * 2.0;
    if t <= 1.0 {
        t * t * t / 2.0
    } else {
        let t = t - 2.0;
        (t * t * t + 2.0) / 2.0
    }
}

/// A scalar eased from `from` to `to` over a time span.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transition {
    from: f64,
    to: f64,
    span: TimeSpan,
}

impl Transition {
    /// A value at rest.
    pub fn settled(value: f64) -> Self {
        Self {
            from: value,
            to: value,
            span: TimeSpan::instant(Time(f64::NEG_INFINITY)),
        }
    }

    pub fn target(&self) -> f64 {
        self.to
    }

    pub fn value_at(&self, now: Time) -> f64 {
        let t = cubic_in_out(self.span.progress(now));
        self.from + (self.to - self.from) * t
    }

    pub fn is_finished(&self, now: Time) -> bool {
        self.span.progress(now) >= 1.0
    }

    /// Restarts towards `to` from wherever the value is at `now`, so an
    /// interrupted transition continues without a jump.
    pub fn retarget(&mut self, to: f64, now: Time, duration_ms: f64) {
        let current = self.value_at(now);
        self.from = current;
        self.to = to;
        self.span = TimeSpan::starting_at(now, duration_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::{Transition, cubic_in_out};
    use foundation::time::Time;

    const DURATION_MS: f64 = 500.0;

    #[test]
    fn cubic_in_out_hits_endpoints_and_midpoint() {
        assert_eq!(cubic_in_out(0.0), 0.0);
        assert_eq!(cubic_in_out(0.5), 0.5);
        assert_eq!(cubic_in_out(1.0), 1.0);
        assert!(cubic_in_out(0.25) < 0.25);
    }

    #[test]
    fn settled_value_is_constant() {
        let t = Transition::settled(4.0);
        assert_eq!(t.value_at(Time(0.0)), 4.0);
        assert!(t.is_finished(Time(0.0)));
    }

    #[test]
    fn retarget_animates_over_duration() {
        let mut t = Transition::settled(0.0);
        t.retarget(32.0, Time(1.0), DURATION_MS);
        assert_eq!(t.target(), 32.0);
        assert_eq!(t.value_at(Time(1.0)), 0.0);
        assert_eq!(t.value_at(Time(1.25)), 16.0);
        assert!(!t.is_finished(Time(1.4)));
        assert_eq!(t.value_at(Time(1.5)), 32.0);
        assert!(t.is_finished(Time(1.5)));
    }

    #[test]
    fn interrupted_transition_starts_from_current_value() {
        let mut t = Transition::settled(0.0);
        t.retarget(40.0, Time(0.0), DURATION_MS);
        let mid = t.value_at(Time(0.25));
        t.retarget(0.0, Time(0.25), DURATION_MS);
        assert_eq!(t.value_at(Time(0.25)), mid);
        assert_eq!(t.value_at(Time(0.75)), 0.0);
    }
}
