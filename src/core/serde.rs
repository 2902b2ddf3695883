use serde::{Serialize, Deserialize, Serializer, Deserializer};
use std::time::Duration;

/// Serializes Duration as seconds
pub fn serialize_duration<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    duration.as_secs_f64().serialize(serializer)
}

/// Deserializes Duration from seconds
pub fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let secs = f64::deserialize(deserializer)?;
    if !secs.is_finite() || secs < 0.0 {
        return Err(serde::de::Error::custom(format!(
            "duration must be a non-negative number of seconds, got {}",
            secs
        )));
    }
    Ok(Duration::from_secs_f64(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    struct Wrapper {
        #[serde(serialize_with = "serialize_duration")]
        #[serde(deserialize_with = "deserialize_duration")]
        timeout: Duration,
    }

    #[test]
    fn test_duration_from_seconds() {
        let w: Wrapper = toml::from_str("timeout = 2.5").unwrap();
        assert_eq!(w.timeout, Duration::from_millis(2500));
    }

    #[test]
    fn test_negative_duration_rejected() {
        let res: std::result::Result<Wrapper, _> = toml::from_str("timeout = -1.0");
        assert!(res.is_err());
    }

    #[test]
    fn test_duration_serializes_as_seconds() {
        let w = Wrapper { timeout: Duration::from_secs(5) };
        assert_eq!(toml::to_string(&w).unwrap().trim(), "timeout = 5.0");
    }
}
