use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use crate::error::DashError;

/// Subject identifier in its normalized form.
///
/// The source document mixes JSON strings (`"940"`) and integers (`940`) for
/// the same subject, and selector input always arrives as text. Every id goes
/// through [`SubjectId::normalize`] so equality is plain string equality:
/// surrounding whitespace is trimmed, integer-looking ids are reduced to their
/// canonical decimal form (`"0940"` and `"+940"` become `"940"`), and anything
/// else is kept verbatim. Integers cover the `i64` and `u64` ranges, so a JSON
/// number and the same number written as a string always compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubjectId(String);

impl SubjectId {
    pub fn normalize(raw: &str) -> Result<Self, DashError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DashError::InvalidSubjectId(raw.to_string()));
        }
        if let Ok(number) = trimmed.parse::<i64>() {
            return Ok(Self::from_integer(number));
        }
        if let Ok(number) = trimmed.parse::<u64>() {
            return Ok(Self::from_unsigned(number));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn from_integer(value: i64) -> Self {
        Self(value.to_string())
    }

    pub fn from_unsigned(value: u64) -> Self {
        Self(value.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SubjectId {
    type Err = DashError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::normalize(value)
    }
}

impl Serialize for SubjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSubjectId {
    Integer(i64),
    Unsigned(u64),
    Text(String),
}

impl<'de> Deserialize<'de> for SubjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawSubjectId::deserialize(deserializer).map_err(|_| {
            <D::Error as de::Error>::custom("subject id must be a string or an integer")
        })?;
        match raw {
            RawSubjectId::Integer(value) => Ok(SubjectId::from_integer(value)),
            RawSubjectId::Unsigned(value) => Ok(SubjectId::from_unsigned(value)),
            RawSubjectId::Text(value) => SubjectId::normalize(&value).map_err(de::Error::custom),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Null,
    Integer(i64),
    Unsigned(u64),
    Float(f64),
    Text(String),
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::Null => write!(f, "null"),
            MetadataValue::Integer(value) => write!(f, "{value}"),
            MetadataValue::Unsigned(value) => write!(f, "{value}"),
            MetadataValue::Float(value) => write!(f, "{value}"),
            MetadataValue::Text(value) => write!(f, "{value}"),
        }
    }
}

/// One subject's demographic record. Fields keep their document order so the
/// metadata panel lists them the way the data author wrote them.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataRecord {
    id: SubjectId,
    fields: Vec<(String, MetadataValue)>,
}

impl MetadataRecord {
    pub fn new(id: SubjectId, fields: Vec<(String, MetadataValue)>) -> Self {
        Self { id, fields }
    }

    pub fn id(&self) -> &SubjectId {
        &self.id
    }

    pub fn fields(&self) -> &[(String, MetadataValue)] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&MetadataValue> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }
}

impl Serialize for MetadataRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for MetadataRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RecordVisitor;

        impl<'de> Visitor<'de> for RecordVisitor {
            type Value = MetadataRecord;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a flat metadata object with an `id` field")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut id = None;
                let mut fields = Vec::new();
                while let Some((key, value)) = access.next_entry::<String, MetadataValue>()? {
                    if key == "id" {
                        id = Some(match &value {
                            MetadataValue::Integer(number) => SubjectId::from_integer(*number),
                            MetadataValue::Unsigned(number) => SubjectId::from_unsigned(*number),
                            MetadataValue::Text(text) => SubjectId::normalize(text)
                                .map_err(<A::Error as de::Error>::custom)?,
                            _ => {
                                return Err(de::Error::custom(
                                    "metadata id must be a string or an integer",
                                ));
                            }
                        });
                    }
                    fields.push((key, value));
                }
                let id = id.ok_or_else(|| <A::Error as de::Error>::missing_field("id"))?;
                Ok(MetadataRecord { id, fields })
            }
        }

        deserializer.deserialize_map(RecordVisitor)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleRecord {
    pub id: SubjectId,
    pub otu_ids: Vec<i64>,
    pub otu_labels: Vec<String>,
    pub sample_values: Vec<f64>,
}

/// One taxon in one sample: the OTU id, its lineage label, and its abundance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxonObservation {
    pub otu_id: i64,
    pub otu_label: String,
    pub otu_value: f64,
}

impl TaxonObservation {
    pub fn new(otu_id: i64, otu_label: impl Into<String>, otu_value: f64) -> Self {
        Self {
            otu_id,
            otu_label: otu_label.into(),
            otu_value,
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn normalize_integer_forms() {
        let a: SubjectId = " 940 ".parse().unwrap();
        let b: SubjectId = "0940".parse().unwrap();
        let c = SubjectId::from_integer(940);
        assert_eq!(a, c);
        assert_eq!(b, c);
        assert_eq!(c.as_str(), "940");
    }

    #[test]
    fn normalize_keeps_text_ids() {
        let id: SubjectId = " BB-12a ".parse().unwrap();
        assert_eq!(id.as_str(), "BB-12a");
    }

    #[test]
    fn normalize_rejects_blank() {
        let err = "   ".parse::<SubjectId>().unwrap_err();
        assert_matches!(err, DashError::InvalidSubjectId(_));
    }

    #[test]
    fn deserialize_mixed_id_types() {
        let ids: Vec<SubjectId> = serde_json::from_str(r#"["940", 940, " 0940"]"#).unwrap();
        assert!(ids.iter().all(|id| id.as_str() == "940"));
    }

    #[test]
    fn ids_beyond_i64_match_their_text_form() {
        let ids: Vec<SubjectId> =
            serde_json::from_str(r#"[18446744073709551615, "018446744073709551615"]"#).unwrap();
        assert_eq!(ids[0].as_str(), "18446744073709551615");
        assert_eq!(ids[0], ids[1]);

        let record: MetadataRecord =
            serde_json::from_str(r#"{"id": 9223372036854775808, "gender": "F"}"#).unwrap();
        assert_eq!(record.id().as_str(), "9223372036854775808");
        assert_eq!(
            record.get("id"),
            Some(&MetadataValue::Unsigned(9_223_372_036_854_775_808))
        );
    }

    #[test]
    fn deserialize_rejects_float_id() {
        assert!(serde_json::from_str::<SubjectId>("940.5").is_err());
    }

    #[test]
    fn metadata_keeps_field_order() {
        let record: MetadataRecord = serde_json::from_str(
            r#"{"id": 940, "ethnicity": "Caucasian", "gender": "F", "age": 24.0, "wfreq": null}"#,
        )
        .unwrap();
        assert_eq!(record.id().as_str(), "940");
        let keys: Vec<&str> = record.fields().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["id", "ethnicity", "gender", "age", "wfreq"]);
        assert_eq!(record.get("wfreq"), Some(&MetadataValue::Null));
    }

    #[test]
    fn metadata_requires_id() {
        let err = serde_json::from_str::<MetadataRecord>(r#"{"gender": "F"}"#).unwrap_err();
        assert!(err.to_string().contains("id"));
    }
}
