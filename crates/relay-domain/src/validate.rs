//! Garde validation utilities.

use crate::error::DomainError;
use crate::reading::WeatherReading;
use garde::{Report, Validate};

/// Validate a decoded reading against the domain constraints.
///
/// Pure function of the input. Only the first failed check is surfaced;
/// field declaration order on [`WeatherReading`] determines which one that is.
pub fn validate_reading(reading: &WeatherReading) -> Result<(), DomainError> {
    reading
        .validate()
        .map_err(|report| DomainError::Validation(first_validation_error(&report)))
}

/// Format the first entry of a garde Report into a human-readable string
fn first_validation_error(report: &Report) -> String {
    report
        .iter()
        .next()
        .map(|(path, error)| {
            let path = path.to_string();
            if path.is_empty() {
                error.message().to_string()
            } else {
                format!("{}: {}", path, error.message())
            }
        })
        .unwrap_or_else(|| "invalid reading".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_reading() -> WeatherReading {
        WeatherReading {
            location: "Pindamonhangaba, BR".to_string(),
            temperature: 22.5,
            humidity: 55.0,
            wind_speed: 4.0,
            condition: "Clear Sky".to_string(),
            rain_probability: None,
            pressure: None,
            feels_like: None,
            uv_index: None,
            timestamp: "2024-06-01T12:00:00".to_string(),
            raw_data: None,
        }
    }

    #[test]
    fn test_valid_reading_passes() {
        assert!(validate_reading(&valid_reading()).is_ok());
    }

    #[test]
    fn test_empty_location_rejected() {
        let mut reading = valid_reading();
        reading.location = "".to_string();
        let result = validate_reading(&reading);
        match result {
            Err(DomainError::Validation(msg)) => assert!(msg.contains("location")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_temperature_out_of_range_rejected() {
        let mut reading = valid_reading();
        reading.temperature = 150.0;
        let result = validate_reading(&reading);
        match result {
            Err(DomainError::Validation(msg)) => assert!(msg.contains("temperature")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_boundary_values_accepted() {
        let mut reading = valid_reading();
        reading.temperature = -100.0;
        reading.humidity = 100.0;
        reading.wind_speed = 0.0;
        assert!(validate_reading(&reading).is_ok());
    }

    #[test]
    fn test_negative_wind_speed_rejected() {
        let mut reading = valid_reading();
        reading.wind_speed = -1.0;
        assert!(matches!(
            validate_reading(&reading),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn test_empty_condition_rejected() {
        let mut reading = valid_reading();
        reading.condition = "".to_string();
        let result = validate_reading(&reading);
        match result {
            Err(DomainError::Validation(msg)) => assert!(msg.contains("condition")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_first_failed_check_is_reported() {
        // Both location and temperature are invalid; location is checked first
        let mut reading = valid_reading();
        reading.location = "".to_string();
        reading.temperature = 150.0;
        match validate_reading(&reading) {
            Err(DomainError::Validation(msg)) => assert!(msg.contains("location")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_verdict_is_deterministic() {
        let mut reading = valid_reading();
        reading.humidity = 120.0;
        let first = validate_reading(&reading).is_err();
        let second = validate_reading(&reading).is_err();
        assert_eq!(first, second);
    }
}
