use garde::Validate;
use serde::{Deserialize, Serialize};

/// A normalized weather measurement as it travels on the queue and on to the
/// downstream ingestion API.
///
/// Fields are declared in validation order; when several fields are invalid,
/// the first declared one is the reason that gets surfaced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct WeatherReading {
    #[garde(length(min = 1))]
    pub location: String,

    /// Celsius; anything outside this band is sensor garbage.
    #[garde(range(min = -100.0, max = 100.0))]
    pub temperature: f64,

    #[garde(range(min = 0.0, max = 100.0))]
    pub humidity: f64,

    #[garde(range(min = 0.0))]
    pub wind_speed: f64,

    #[garde(length(min = 1))]
    pub condition: String,

    #[garde(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rain_probability: Option<f64>,

    #[garde(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pressure: Option<f64>,

    #[garde(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feels_like: Option<f64>,

    #[garde(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uv_index: Option<f64>,

    /// Opaque source timestamp; never parsed here.
    #[garde(skip)]
    pub timestamp: String,

    /// Provider-specific payload carried through untouched.
    #[garde(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_data: Option<serde_json::Map<String, serde_json::Value>>,
}
