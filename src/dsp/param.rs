//! Automatable parameters — timestamped value curves evaluated per sample.
//!
//! Every curve point is an absolute time on the context clock, so events
//! can be submitted well ahead of playback without drifting.

use crate::error::GraphError;

/// How a parameter reaches an event's value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Ramp {
    /// Jump to the value at the event time.
    Instant,
    /// Interpolate linearly from the previous event, arriving at the event time.
    Linear,
    /// Interpolate exponentially from the previous event, arriving at the event time.
    Exponential,
}

/// One scheduled point on a parameter curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutomationEvent {
    /// Absolute context time in seconds.
    pub time: f64,
    pub value: f64,
    pub ramp: Ramp,
}

/// A parameter with an intrinsic value and a time-ordered automation list.
#[derive(Debug, Clone)]
pub struct AudioParam {
    value: f64,
    /// Context time at which the parameter was created; a ramp with no
    /// earlier event starts here from the intrinsic value.
    created_at: f64,
    events: Vec<AutomationEvent>,
}

impl AudioParam {
    pub fn new(value: f64, created_at: f64) -> Self {
        AudioParam {
            value,
            created_at,
            events: Vec::new(),
        }
    }

    /// Intrinsic value (used before the first event).
    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn events(&self) -> &[AutomationEvent] {
        &self.events
    }

    /// Override the value immediately, discarding any pending automation.
    pub fn set_value(&mut self, value: f64) -> Result<(), GraphError> {
        check_finite(value)?;
        self.value = value;
        self.events.clear();
        Ok(())
    }

    pub fn set_value_at_time(&mut self, value: f64, time: f64) -> Result<(), GraphError> {
        self.insert(AutomationEvent {
            time,
            value,
            ramp: Ramp::Instant,
        })
    }

    pub fn linear_ramp_to_value_at_time(&mut self, value: f64, time: f64) -> Result<(), GraphError> {
        self.insert(AutomationEvent {
            time,
            value,
            ramp: Ramp::Linear,
        })
    }

    pub fn exponential_ramp_to_value_at_time(
        &mut self,
        value: f64,
        time: f64,
    ) -> Result<(), GraphError> {
        if value == 0.0 {
            return Err(GraphError::ExponentialRampToZero);
        }
        self.insert(AutomationEvent {
            time,
            value,
            ramp: Ramp::Exponential,
        })
    }

    /// Drop every event at or after `time`.
    pub fn cancel_scheduled_values(&mut self, time: f64) -> Result<(), GraphError> {
        check_time(time)?;
        self.events.retain(|e| e.time < time);
        Ok(())
    }

    /// Evaluate the curve at absolute time `time`.
    pub fn value_at(&self, time: f64) -> f64 {
        let idx = self.events.partition_point(|e| e.time <= time);

        let (v0, t0) = match idx.checked_sub(1) {
            Some(prev) => (self.events[prev].value, self.events[prev].time),
            None => (self.value, self.created_at),
        };

        let Some(next) = self.events.get(idx) else {
            return v0;
        };

        let span = next.time - t0;
        if span <= 0.0 {
            return v0;
        }
        let frac = ((time - t0) / span).clamp(0.0, 1.0);

        match next.ramp {
            Ramp::Instant => v0,
            Ramp::Linear => v0 + (next.value - v0) * frac,
            Ramp::Exponential => {
                // No exponential path through zero or across a sign change
                if v0 * next.value <= 0.0 {
                    v0
                } else {
                    v0 * (next.value / v0).powf(frac)
                }
            }
        }
    }

    /// Events at equal times keep their insertion order.
    fn insert(&mut self, event: AutomationEvent) -> Result<(), GraphError> {
        check_finite(event.value)?;
        check_time(event.time)?;
        let pos = self.events.partition_point(|e| e.time <= event.time);
        self.events.insert(pos, event);
        Ok(())
    }
}

fn check_finite(value: f64) -> Result<(), GraphError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(GraphError::NonFinite)
    }
}

fn check_time(time: f64) -> Result<(), GraphError> {
    check_finite(time)?;
    if time < 0.0 {
        return Err(GraphError::NegativeTime(time));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn intrinsic_value_without_events() {
        let p = AudioParam::new(0.3, 0.0);
        assert!(close(p.value_at(0.0), 0.3));
        assert!(close(p.value_at(100.0), 0.3));
    }

    #[test]
    fn set_value_at_time_steps() {
        let mut p = AudioParam::new(1.0, 0.0);
        p.set_value_at_time(55.0, 1.0).unwrap();
        p.set_value_at_time(82.5, 1.5).unwrap();
        assert!(close(p.value_at(0.5), 1.0));
        assert!(close(p.value_at(1.0), 55.0));
        assert!(close(p.value_at(1.49), 55.0));
        assert!(close(p.value_at(1.5), 82.5));
        assert!(close(p.value_at(9.0), 82.5));
    }

    #[test]
    fn linear_ramp_interpolates() {
        let mut p = AudioParam::new(0.0, 0.0);
        p.set_value_at_time(0.0, 1.0).unwrap();
        p.linear_ramp_to_value_at_time(0.15, 3.0).unwrap();
        assert!(close(p.value_at(1.0), 0.0));
        assert!(close(p.value_at(2.0), 0.075));
        assert!(close(p.value_at(3.0), 0.15));
        assert!(close(p.value_at(5.0), 0.15));
    }

    #[test]
    fn exponential_ramp_interpolates_geometrically() {
        let mut p = AudioParam::new(1.0, 0.0);
        p.set_value_at_time(0.4, 0.0).unwrap();
        p.exponential_ramp_to_value_at_time(0.01, 0.4).unwrap();
        let mid = p.value_at(0.2);
        assert!(close(mid, (0.4_f64 * 0.01).sqrt()), "got {mid}");
        assert!(close(p.value_at(0.4), 0.01));
        // Holds until the next event
        assert!(close(p.value_at(0.45), 0.01));
    }

    #[test]
    fn exponential_ramp_to_zero_rejected() {
        let mut p = AudioParam::new(1.0, 0.0);
        assert_eq!(
            p.exponential_ramp_to_value_at_time(0.0, 1.0),
            Err(GraphError::ExponentialRampToZero)
        );
    }

    #[test]
    fn exponential_ramp_from_zero_holds() {
        let mut p = AudioParam::new(0.0, 0.0);
        p.set_value_at_time(0.0, 0.0).unwrap();
        p.exponential_ramp_to_value_at_time(1.0, 1.0).unwrap();
        assert!(close(p.value_at(0.5), 0.0));
        assert!(close(p.value_at(1.0), 1.0));
    }

    #[test]
    fn ramp_without_prior_event_starts_at_creation() {
        let mut p = AudioParam::new(0.0, 2.0);
        p.linear_ramp_to_value_at_time(1.0, 4.0).unwrap();
        assert!(close(p.value_at(1.0), 0.0));
        assert!(close(p.value_at(3.0), 0.5));
        assert!(close(p.value_at(4.0), 1.0));
    }

    #[test]
    fn invalid_values_rejected() {
        let mut p = AudioParam::new(0.0, 0.0);
        assert_eq!(p.set_value_at_time(f64::NAN, 1.0), Err(GraphError::NonFinite));
        assert_eq!(
            p.set_value_at_time(1.0, f64::INFINITY),
            Err(GraphError::NonFinite)
        );
        assert_eq!(
            p.set_value_at_time(1.0, -0.5),
            Err(GraphError::NegativeTime(-0.5))
        );
        assert!(p.events().is_empty());
    }

    #[test]
    fn equal_times_keep_insertion_order() {
        let mut p = AudioParam::new(0.0, 0.0);
        p.set_value_at_time(1.0, 1.0).unwrap();
        p.set_value_at_time(2.0, 1.0).unwrap();
        assert_eq!(p.events()[0].value, 1.0);
        assert_eq!(p.events()[1].value, 2.0);
        assert!(close(p.value_at(1.0), 2.0));
    }

    #[test]
    fn set_value_clears_automation() {
        let mut p = AudioParam::new(0.3, 0.0);
        p.set_value_at_time(0.9, 5.0).unwrap();
        p.set_value(0.7).unwrap();
        assert!(p.events().is_empty());
        assert!(close(p.value_at(10.0), 0.7));
    }

    #[test]
    fn cancel_drops_later_events() {
        let mut p = AudioParam::new(0.0, 0.0);
        p.set_value_at_time(1.0, 1.0).unwrap();
        p.set_value_at_time(2.0, 2.0).unwrap();
        p.cancel_scheduled_values(1.5).unwrap();
        assert_eq!(p.events().len(), 1);
        assert!(close(p.value_at(3.0), 1.0));
    }
}
