use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Discriminator tag for extended-value tables in the snapshot format.
pub const EXT_TABLE_TAG: &str = "ExtTable";

/// A key/value table whose keys are not restricted to strings, preserved
/// through JSON as `{"__type": "ExtTable", "value": [[k, v], ...]}`.
///
/// Plain JSON objects cannot carry non-string keys, so encoding these tables
/// natively would silently stringify (or drop) entries. The tagged entry
/// list keeps insertion order and arbitrary key shapes, and decodes back to
/// the same table. Applied uniformly: any payload field of this type gets
/// the encoding, there is no per-field special casing in the codec.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExtTable {
    entries: Vec<(Value, Value)>,
}

impl ExtTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<(Value, Value)>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[(Value, Value)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Insert or overwrite the entry for `key`, keeping first-insertion
    /// order for existing keys.
    pub fn insert(&mut self, key: Value, value: Value) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = value,
            None => self.entries.push((key, value)),
        }
    }
}

#[derive(Serialize)]
struct TaggedRef<'a> {
    #[serde(rename = "__type")]
    tag: &'static str,
    value: &'a [(Value, Value)],
}

#[derive(Deserialize)]
struct Tagged {
    #[serde(rename = "__type")]
    tag: String,
    value: Vec<(Value, Value)>,
}

impl Serialize for ExtTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        TaggedRef {
            tag: EXT_TABLE_TAG,
            value: &self.entries,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ExtTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        match value.get("__type") {
            Some(tag) => {
                let tagged: Tagged =
                    serde_json::from_value(value.clone()).map_err(D::Error::custom)?;
                if tag != EXT_TABLE_TAG {
                    return Err(D::Error::custom(format!(
                        "expected __type \"{EXT_TABLE_TAG}\", got {tag}"
                    )));
                }
                Ok(Self {
                    entries: tagged.value,
                })
            }
            // Files written before tables were tagged hold a plain object;
            // coerce its entries so those imports still load.
            None => match value {
                Value::Object(map) => Ok(Self {
                    entries: map
                        .into_iter()
                        .map(|(k, v)| (Value::String(k), v))
                        .collect(),
                }),
                other => Err(D::Error::custom(format!(
                    "expected a tagged {EXT_TABLE_TAG} or an object, got {other}"
                ))),
            },
        }
    }
}
