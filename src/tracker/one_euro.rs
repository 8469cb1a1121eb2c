use std::time::Duration;

use crate::config::SmoothingConfig;

/// Low-pass filter component
struct LowPassFilter {
    prev: Option<f32>,
}

impl LowPassFilter {
    fn new() -> Self {
        Self { prev: None }
    }

    fn filter(&mut self, value: f32, alpha: f32) -> f32 {
        let result = match self.prev {
            Some(prev) => alpha * value + (1.0 - alpha) * prev,
            None => value,
        };
        self.prev = Some(result);
        result
    }

    fn reset(&mut self) {
        self.prev = None;
    }
}

/// alpha = 1 / (1 + tau/Te), tau = 1/(2*pi*fc)
fn smoothing_factor(te: f32, cutoff: f32) -> f32 {
    let r = 2.0 * std::f32::consts::PI * cutoff * te;
    r / (r + 1.0)
}

/// One Euro filter over a joint angle, driven by frame timestamps
pub struct AngleSmoother {
    config: SmoothingConfig,
    x_filter: LowPassFilter,
    dx_filter: LowPassFilter,
    prev_value: Option<f32>,
    last_time: Option<Duration>,
}

impl AngleSmoother {
    pub fn new(config: SmoothingConfig) -> Self {
        Self {
            config,
            x_filter: LowPassFilter::new(),
            dx_filter: LowPassFilter::new(),
            prev_value: None,
            last_time: None,
        }
    }

    pub fn filter(&mut self, value: f32, timestamp: Duration) -> f32 {
        let (prev, last) = match (self.prev_value, self.last_time) {
            (Some(prev), Some(last)) if timestamp > last => (prev, last),
            (Some(_), Some(_)) => {
                // Same or earlier timestamp: no time has passed, keep the estimate
                return self.x_filter.prev.unwrap_or(value);
            }
            _ => {
                self.prev_value = Some(value);
                self.last_time = Some(timestamp);
                self.dx_filter.filter(0.0, 1.0);
                return self.x_filter.filter(value, 1.0);
            }
        };
        let dt = (timestamp - last).as_secs_f32();
        self.prev_value = Some(value);
        self.last_time = Some(timestamp);

        let dx = (value - prev) / dt;
        let edx = self
            .dx_filter
            .filter(dx, smoothing_factor(dt, self.config.d_cutoff));
        let cutoff = self.config.min_cutoff + self.config.beta * edx.abs();
        self.x_filter.filter(value, smoothing_factor(dt, cutoff))
    }

    pub fn reset(&mut self) {
        self.x_filter.reset();
        self.dx_filter.reset();
        self.prev_value = None;
        self.last_time = None;
    }
}
