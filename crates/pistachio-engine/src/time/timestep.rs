use std::time::Duration;

/// Elapsed time between two frames.
#[derive(Debug, Copy, Clone, Default, PartialEq, PartialOrd)]
pub struct Timestep {
    seconds: f32,
}

impl Timestep {
    pub fn from_seconds(seconds: f32) -> Self {
        Self { seconds }
    }

    pub fn seconds(self) -> f32 {
        self.seconds
    }

    pub fn milliseconds(self) -> f32 {
        self.seconds * 1000.0
    }
}

impl From<Duration> for Timestep {
    fn from(duration: Duration) -> Self {
        Self::from_seconds(duration.as_secs_f32())
    }
}

impl From<Timestep> for f32 {
    fn from(ts: Timestep) -> Self {
        ts.seconds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_between_units() {
        let ts = Timestep::from(Duration::from_millis(16));
        assert!((ts.seconds() - 0.016).abs() < 1e-6);
        assert!((ts.milliseconds() - 16.0).abs() < 1e-3);
        assert_eq!(f32::from(Timestep::from_seconds(0.5)), 0.5);
    }
}
