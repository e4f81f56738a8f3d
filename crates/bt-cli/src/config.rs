//! Demo run configuration.
use std::env;
use std::time::Duration;

/// Settings for `bt run`.
///
/// Read from the environment first; command-line flags override.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DemoConfig {
    /// Number of frames to run.
    pub frames: u64,
    /// RNG seed for random composites. `None` draws from OS entropy.
    pub seed: Option<u64>,
    /// Real time to wait between frames.
    pub frame_interval: Duration,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            frames: 20,
            seed: None,
            frame_interval: Duration::ZERO,
        }
    }
}

impl DemoConfig {
    /// Construct configuration from environment variables.
    ///
    /// Environment variables:
    /// - `BT_FRAMES` - Frames to run (default: 20)
    /// - `BT_SEED` - RNG seed (default: entropy)
    /// - `BT_FRAME_MS` - Milliseconds between frames (default: 0)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(frames) = read_env::<u64>("BT_FRAMES") {
            config.frames = frames;
        }
        if let Some(seed) = read_env::<u64>("BT_SEED") {
            config.seed = Some(seed);
        }
        if let Some(ms) = read_env::<u64>("BT_FRAME_MS") {
            config.frame_interval = Duration::from_millis(ms);
        }

        config
    }

    /// Applies command-line overrides on top of the environment.
    pub fn with_overrides(mut self, frames: Option<u64>, seed: Option<u64>, frame_ms: Option<u64>) -> Self {
        if let Some(frames) = frames {
            self.frames = frames;
        }
        if seed.is_some() {
            self.seed = seed;
        }
        if let Some(ms) = frame_ms {
            self.frame_interval = Duration::from_millis(ms);
        }
        self
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let config = DemoConfig::default().with_overrides(Some(5), Some(9), None);
        assert_eq!(config.frames, 5);
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.frame_interval, Duration::ZERO);
    }

    #[test]
    fn absent_flags_keep_existing_values() {
        let base = DemoConfig {
            frames: 3,
            seed: Some(1),
            frame_interval: Duration::from_millis(10),
        };
        assert_eq!(base.clone().with_overrides(None, None, None), base);
    }

    #[test]
    fn missing_variables_read_as_none() {
        assert_eq!(read_env::<u64>("BT_CLI_TEST_UNSET_VARIABLE"), None);
    }
}
