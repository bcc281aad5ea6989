//! Lenient deserializers for values the server sends in more than one shape
//! (`"12"` vs `12`, `1` vs `true`).

use serde::de::{self, Deserializer};
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Bool(bool),
    Unsigned(u64),
    Float(f64),
    Text(String),
}

pub fn number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    match Loose::deserialize(deserializer)? {
        Loose::Unsigned(n) => Ok(n),
        Loose::Text(s) => s.trim().parse().map_err(de::Error::custom),
        _ => Err(de::Error::custom("expected an unsigned integer")),
    }
}

pub fn opt_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    match Option::<Loose>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Loose::Unsigned(n)) => Ok(Some(n)),
        Some(Loose::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Loose::Text(s)) => s.trim().parse().map(Some).map_err(de::Error::custom),
        Some(_) => Err(de::Error::custom("expected an unsigned integer")),
    }
}

pub fn opt_decimal<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    match Option::<Loose>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Loose::Unsigned(n)) => Ok(Some(n as f64)),
        Some(Loose::Float(f)) => Ok(Some(f)),
        Some(Loose::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Loose::Text(s)) => s.trim().parse().map(Some).map_err(de::Error::custom),
        Some(Loose::Bool(_)) => Err(de::Error::custom("expected a number")),
    }
}

pub fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    match Option::<Loose>::deserialize(deserializer)? {
        None => Ok(false),
        Some(Loose::Bool(b)) => Ok(b),
        Some(Loose::Unsigned(n)) => Ok(n != 0),
        Some(Loose::Text(s)) => match s.trim() {
            "1" | "true" => Ok(true),
            "0" | "false" | "" => Ok(false),
            other => Err(de::Error::custom(format!("expected a flag, got {:?}", other))),
        },
        Some(Loose::Float(_)) => Err(de::Error::custom("expected a flag")),
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Sample {
        #[serde(deserialize_with = "super::number")]
        id: u64,
        #[serde(default, deserialize_with = "super::opt_number")]
        parent: Option<u64>,
        #[serde(default, deserialize_with = "super::opt_decimal")]
        price: Option<f64>,
        #[serde(default, deserialize_with = "super::flag")]
        active: bool,
    }

    #[test]
    fn test_accepts_strings_and_numbers() {
        let s: Sample =
            serde_json::from_str(r#"{"id":"7","parent":3,"price":"12.5","active":1}"#).unwrap();
        assert_eq!(s.id, 7);
        assert_eq!(s.parent, Some(3));
        assert_eq!(s.price, Some(12.5));
        assert!(s.active);

        let s: Sample = serde_json::from_str(r#"{"id":8,"parent":"","price":null,"active":"0"}"#).unwrap();
        assert_eq!(s.parent, None);
        assert_eq!(s.price, None);
        assert!(!s.active);
    }

    #[test]
    fn test_missing_optional_fields() {
        let s: Sample = serde_json::from_str(r#"{"id":1}"#).unwrap();
        assert_eq!(s.parent, None);
        assert!(!s.active);
    }

    #[test]
    fn test_rejects_garbage_id() {
        assert!(serde_json::from_str::<Sample>(r#"{"id":"abc"}"#).is_err());
    }
}
