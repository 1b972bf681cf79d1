// Copyright 2020-2026 MathxH Chen.
//
// Code is licensed under MIT Apache Dual License

//! Serde helpers for the wire format shared with existing ballots and
//! trustee key files: big integers travel as decimal strings so JSON
//! number precision never truncates them.

use num_bigint::BigUint;
use num_traits::Num;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum StringOrUint {
    String(String),
    Uint(u64),
}

impl StringOrUint {
    fn into_biguint<E: de::Error>(self) -> Result<BigUint, E> {
        match self {
            StringOrUint::String(s) => {
                BigUint::from_str_radix(s.trim(), 10).map_err(de::Error::custom)
            }
            StringOrUint::Uint(u) => Ok(BigUint::from(u)),
        }
    }
}

/// A single big integer.
pub mod big_uint {
    use super::*;

    pub fn serialize<S>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_str_radix(10).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BigUint, D::Error>
    where
        D: Deserializer<'de>,
    {
        let su: StringOrUint = Deserialize::deserialize(deserializer)?;
        su.into_biguint()
    }
}

/// `Option<Vec<BigUint>>`, used for the audit randomness of an answer.
pub mod big_uint_vec_opt {
    use super::*;

    pub fn serialize<S>(value: &Option<Vec<BigUint>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(values) => serializer.collect_seq(values.iter().map(|v| v.to_str_radix(10))),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Vec<BigUint>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<Vec<StringOrUint>> = Deserialize::deserialize(deserializer)?;
        match raw {
            Some(values) => values
                .into_iter()
                .map(StringOrUint::into_biguint)
                .collect::<Result<Vec<_>, _>>()
                .map(Some),
            None => Ok(None),
        }
    }
}

/// `[[BigUint]]`, the question/answer matrix of decryption factors.
pub mod big_uint_matrix {
    use super::*;

    pub fn serialize<S>(value: &[Vec<BigUint>], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let rows: Vec<Vec<String>> = value
            .iter()
            .map(|row| row.iter().map(|v| v.to_str_radix(10)).collect())
            .collect();
        rows.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Vec<BigUint>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Vec<Vec<StringOrUint>> = Deserialize::deserialize(deserializer)?;
        raw.into_iter()
            .map(|row| {
                row.into_iter()
                    .map(StringOrUint::into_biguint)
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect()
    }
}

/// A list serialized as an object keyed by decimal position,
/// `{"0": .., "1": ..}`. Deserialization stops at the first missing key.
pub mod indexed {
    use super::*;
    use serde::ser::SerializeMap;
    use std::collections::BTreeMap;

    pub fn serialize<S, T>(value: &[T], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        let mut map = serializer.serialize_map(Some(value.len()))?;
        for (i, item) in value.iter().enumerate() {
            map.serialize_entry(&i.to_string(), item)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        let mut raw: BTreeMap<String, T> = Deserialize::deserialize(deserializer)?;
        let mut items = Vec::with_capacity(raw.len());
        while let Some(item) = raw.remove(&items.len().to_string()) {
            items.push(item);
        }
        if let Some(stray) = raw.keys().next() {
            return Err(de::Error::custom(format!(
                "index {:?} does not follow 0..{}",
                stray,
                items.len()
            )));
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Holder {
        #[serde(with = "big_uint")]
        value: BigUint,
        #[serde(with = "big_uint_matrix")]
        matrix: Vec<Vec<BigUint>>,
        #[serde(with = "indexed")]
        list: Vec<u32>,
    }

    #[test]
    fn test_decimal_strings_on_the_wire() {
        let holder = Holder {
            value: BigUint::parse_bytes(b"340282366920938463463374607431768223907", 10).unwrap(),
            matrix: vec![vec![BigUint::from(1_u32), BigUint::from(2_u32)]],
            list: vec![7, 9],
        };
        let json = serde_json::to_value(&holder).unwrap();
        assert_eq!(json["value"], "340282366920938463463374607431768223907");
        assert_eq!(json["matrix"][0][1], "2");
        assert_eq!(json["list"]["1"], 9);
    }

    #[test]
    fn test_accepts_plain_integers() {
        let holder: Holder =
            serde_json::from_str(r#"{"value": 23, "matrix": [["4", 5]], "list": {"1": 2, "0": 1}}"#)
                .unwrap();
        assert_eq!(holder.value, BigUint::from(23_u32));
        assert_eq!(holder.matrix, vec![vec![BigUint::from(4_u32), BigUint::from(5_u32)]]);
        assert_eq!(holder.list, vec![1, 2]);
    }

    #[test]
    fn test_indexed_rejects_gaps_and_stray_keys() {
        let gap: Result<Holder, _> =
            serde_json::from_str(r#"{"value": 1, "matrix": [], "list": {"0": 1, "1": 2, "3": 4}}"#);
        let message = gap.unwrap_err().to_string();
        assert!(message.contains("\"3\""), "{}", message);

        let stray: Result<Holder, _> =
            serde_json::from_str(r#"{"value": 1, "matrix": [], "list": {"0": 1, "x": 2}}"#);
        assert!(stray.is_err());

        let empty: Holder =
            serde_json::from_str(r#"{"value": 1, "matrix": [], "list": {}}"#).unwrap();
        assert!(empty.list.is_empty());
    }

    #[test]
    fn test_rejects_non_decimal() {
        let result: Result<Holder, _> =
            serde_json::from_str(r#"{"value": "0x17", "matrix": [], "list": {}}"#);
        assert!(result.is_err());
    }
}
