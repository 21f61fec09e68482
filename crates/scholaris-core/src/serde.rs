use serde::{Deserialize, Deserializer};
use uuid::Uuid;

/// Query strings from the frontend send `?class_id=` for "no filter".
pub fn deserialize_optional_uuid<'de, D>(deserializer: D) -> Result<Option<Uuid>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    match opt {
        Some(s) if s.is_empty() => Ok(None),
        Some(s) => Uuid::parse_str(&s)
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

pub fn deserialize_optional_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    match opt {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Filter {
        #[serde(default, deserialize_with = "deserialize_optional_uuid")]
        class_id: Option<Uuid>,
        #[serde(default, deserialize_with = "deserialize_optional_f64")]
        latitude: Option<f64>,
    }

    #[test]
    fn test_empty_strings_become_none() {
        let f: Filter = serde_json::from_str(r#"{"class_id":"","latitude":" "}"#).unwrap();
        assert!(f.class_id.is_none());
        assert!(f.latitude.is_none());
    }

    #[test]
    fn test_values_parse() {
        let id = Uuid::new_v4();
        let json = format!(r#"{{"class_id":"{}","latitude":"12.5"}}"#, id);
        let f: Filter = serde_json::from_str(&json).unwrap();
        assert_eq!(f.class_id, Some(id));
        assert_eq!(f.latitude, Some(12.5));
    }

    #[test]
    fn test_invalid_uuid_is_error() {
        assert!(serde_json::from_str::<Filter>(r#"{"class_id":"nope"}"#).is_err());
    }
}
