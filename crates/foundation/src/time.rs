/// Time primitives
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd)]
pub struct Time(pub f64); // seconds

impl Time {
    pub fn from_millis(ms: f64) -> Self {
        Time(ms / 1000.0)
    }

    pub fn add_millis(self, ms: f64) -> Self {
        Time(self.0 + ms / 1000.0)
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TimeSpan {
    pub start: Time,
    pub end: Time,
}

impl TimeSpan {
    pub fn instant(t: Time) -> Self {
        Self { start: t, end: t }
    }

    pub fn starting_at(start: Time, duration_ms: f64) -> Self {
        Self {
            start,
            end: start.add_millis(duration_ms.max(0.0)),
        }
    }

    pub fn duration(&self) -> f64 {
        (self.end.0 - self.start.0).max(0.0)
    }

    /// Normalised progress of `t` through the span, clamped to `[0, 1]`.
    /// Zero-length spans are complete at (and after) their start.
    pub fn progress(&self, t: Time) -> f64 {
        let d = self.duration();
        if d <= 0.0 {
            return if t.0 >= self.start.0 { 1.0 } else { 0.0 };
        }
        ((t.0 - self.start.0) / d).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::{Time, TimeSpan};

    #[test]
    fn progress_is_clamped() {
        let span = TimeSpan::starting_at(Time(1.0), 500.0);
        assert_eq!(span.duration(), 0.5);
        assert_eq!(span.progress(Time(0.0)), 0.0);
        assert_eq!(span.progress(Time(1.25)), 0.5);
        assert_eq!(span.progress(Time(9.0)), 1.0);
    }

    #[test]
    fn instant_span_completes_immediately() {
        let span = TimeSpan::instant(Time(2.0));
        assert_eq!(span.progress(Time(1.9)), 0.0);
        assert_eq!(span.progress(Time(2.0)), 1.0);
    }
}
