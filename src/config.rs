use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub link: LinkConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LinkConfig {
    /// Serial port to the display MCU (e.g. /dev/ttyACM0 or COM5).
    #[serde(default)]
    pub port: String,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    /// Wire format: "mwf1" (flagged payload) or "legacy" (bare bitmap).
    #[serde(default = "default_protocol")]
    pub protocol: String,
    /// Maximum frame rate offered to the device. The e-paper panel refreshes
    /// far slower than the UI renders, so this is typically single digits.
    #[serde(default = "default_send_fps")]
    pub send_fps: f64,
    /// How long to wait for the device's "OK" before resyncing. A full
    /// e-paper refresh can take many seconds.
    #[serde(default = "default_ack_timeout_secs")]
    pub ack_timeout_secs: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DisplayConfig {
    #[serde(default = "default_width")]
    pub width: usize,
    #[serde(default = "default_height")]
    pub height: usize,
    /// Swap black/white on the wire (rare; panel polarity quirk).
    #[serde(default)]
    pub invert: bool,
    /// Mirror the wire bitmap horizontally for the headset optics.
    #[serde(default = "default_mirror")]
    pub mirror: bool,
}

impl LinkConfig {
    pub fn ack_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.ack_timeout_secs.max(0.0))
    }

    pub fn send_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.send_fps.max(0.05))
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        LinkConfig {
            port: String::new(),
            baud_rate: default_baud_rate(),
            protocol: default_protocol(),
            send_fps: default_send_fps(),
            ack_timeout_secs: default_ack_timeout_secs(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            width: default_width(),
            height: default_height(),
            invert: false,
            mirror: default_mirror(),
        }
    }
}

fn default_baud_rate() -> u32 {
    115200
}

fn default_protocol() -> String {
    "mwf1".to_string()
}

fn default_send_fps() -> f64 {
    8.0
}

fn default_ack_timeout_secs() -> f64 {
    30.0
}

fn default_width() -> usize {
    792
}

fn default_height() -> usize {
    272
}

// The headset prism flips the image; ship with correction on.
fn default_mirror() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_json_fills_defaults() {
        let config: Config =
            serde_json::from_str(r#"{ "link": { "port": "/dev/ttyACM0" } }"#).unwrap();
        assert_eq!(config.link.port, "/dev/ttyACM0");
        assert_eq!(config.link.baud_rate, 115200);
        assert_eq!(config.link.protocol, "mwf1");
        assert_eq!(config.display.width, 792);
        assert_eq!(config.display.height, 272);
        assert!(config.display.mirror);
    }

    #[test]
    fn test_send_interval_clamps_tiny_rates() {
        let link = LinkConfig {
            send_fps: 0.0,
            ..Default::default()
        };
        assert!(link.send_interval() <= Duration::from_secs(20));
    }
}
