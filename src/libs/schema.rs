// schema.rs
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Column types an attribute can be declared with.
///
/// `Custom` carries a verbatim SQL type. It is rendered as-is in
/// `CREATE TABLE`, but no value ever validates against it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DataType {
    Integer,
    Boolean,
    String,
    Text,
    Date,
    DateTime,
    Timestamp,
    Custom(String),
}

impl DataType {
    pub fn as_sql(&self) -> &str {
        match self {
            DataType::Integer => "INT",
            DataType::Boolean => "BOOLEAN",
            DataType::String => "VARCHAR(255)",
            DataType::Text => "TEXT",
            DataType::Date => "DATE",
            DataType::DateTime => "DATETIME",
            DataType::Timestamp => "TIMESTAMP",
            DataType::Custom(sql) => sql,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            DataType::Integer => "INTEGER",
            DataType::Boolean => "BOOLEAN",
            DataType::String => "STRING",
            DataType::Text => "TEXT",
            DataType::Date => "DATE",
            DataType::DateTime => "DATETIME",
            DataType::Timestamp => "TIMESTAMP",
            DataType::Custom(sql) => sql,
        }
    }
}

impl From<String> for DataType {
    fn from(value: String) -> Self {
        match value.to_ascii_uppercase().as_str() {
            "INTEGER" => DataType::Integer,
            "BOOLEAN" => DataType::Boolean,
            "STRING" => DataType::String,
            "TEXT" => DataType::Text,
            "DATE" => DataType::Date,
            "DATETIME" => DataType::DateTime,
            "TIMESTAMP" => DataType::Timestamp,
            _ => DataType::Custom(value),
        }
    }
}

impl From<DataType> for String {
    fn from(value: DataType) -> Self {
        value.name().to_string()
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One declared column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeDefinition {
    pub data_type: DataType,
    #[serde(default)]
    pub required: bool,
    #[serde(default, deserialize_with = "deserialize_default")]
    pub default_value: Option<String>,
}

fn deserialize_default<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(default_literal))
}

/// Text for a `DEFAULT '<text>'` clause. Falsy literals (`null`, `false`,
/// `0`, `""`) mean no default; `true` becomes `1`.
pub fn default_literal(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::Bool(true) => Some("1".to_string()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

impl AttributeDefinition {
    pub fn new(data_type: DataType) -> Self {
        Self {
            data_type,
            required: false,
            default_value: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default_value = default_literal(&value.into());
        self
    }
}

pub const ID: &str = "id";
pub const IS_DELETED: &str = "isDeleted";
pub const CREATED_AT: &str = "createdAt";
pub const UPDATED_AT: &str = "updatedAt";

/// Attributes every entity carries whether declared or not.
pub fn system_attributes() -> [(&'static str, AttributeDefinition); 4] {
    [
        (ID, AttributeDefinition::new(DataType::Integer)),
        (IS_DELETED, AttributeDefinition::new(DataType::Boolean)),
        (CREATED_AT, AttributeDefinition::new(DataType::Timestamp)),
        (UPDATED_AT, AttributeDefinition::new(DataType::Timestamp)),
    ]
}

pub fn is_system_attribute(name: &str) -> bool {
    matches!(name, ID | IS_DELETED | CREATED_AT | UPDATED_AT)
}

/// Table synchronisation performed when an entity is declared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncOptions {
    /// Create the table if it does not exist.
    #[serde(default)]
    pub enabled: bool,
    /// Drop the table first, then create it.
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeclareOptions {
    #[serde(default)]
    pub default_where: Map<String, Value>,
    #[serde(default)]
    pub sync: SyncOptions,
}

/// The immutable description of one entity: its table name, its
/// attributes (system attributes merged in) and the predicate every read
/// is scoped by.
#[derive(Debug, Clone, PartialEq)]
pub struct EntitySchema {
    name: String,
    attributes: Vec<(String, AttributeDefinition)>,
    default_where: Map<String, Value>,
}

impl EntitySchema {
    /// Declared attributes named like a system attribute are replaced by
    /// the system definition. `isDeleted = 0` is always part of the
    /// default predicate.
    pub fn new<I, K>(name: impl Into<String>, attributes: I, default_where: Map<String, Value>) -> Self
    where
        I: IntoIterator<Item = (K, AttributeDefinition)>,
        K: Into<String>,
    {
        let mut merged: Vec<(String, AttributeDefinition)> = Vec::new();
        for (attr_name, definition) in attributes {
            let attr_name = attr_name.into();
            if is_system_attribute(&attr_name) {
                continue;
            }
            match merged.iter_mut().find(|(n, _)| *n == attr_name) {
                Some(slot) => slot.1 = definition,
                None => merged.push((attr_name, definition)),
            }
        }
        for (attr_name, definition) in system_attributes() {
            merged.push((attr_name.to_string(), definition));
        }

        let mut default_where = default_where;
        default_where.insert(IS_DELETED.to_string(), Value::from(0));

        Self {
            name: name.into(),
            attributes: merged,
            default_where,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeDefinition> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, definition)| definition)
    }

    /// All attributes, system ones included.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &AttributeDefinition)> {
        self.attributes.iter().map(|(n, d)| (n.as_str(), d))
    }

    /// Attributes the caller declared, in declaration order.
    pub fn declared_attributes(&self) -> impl Iterator<Item = (&str, &AttributeDefinition)> {
        self.attributes().filter(|(n, _)| !is_system_attribute(n))
    }

    pub fn default_where(&self) -> &Map<String, Value> {
        &self.default_where
    }

    /// Caller predicate first, default predicate on top: a key present in
    /// both keeps its position but takes the default's value.
    pub fn scoped_where(&self, caller: &Map<String, Value>) -> Map<String, Value> {
        let mut merged = caller.clone();
        for (key, value) in &self.default_where {
            merged.insert(key.clone(), value.clone());
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn users() -> EntitySchema {
        EntitySchema::new(
            "users",
            [
                ("name", AttributeDefinition::new(DataType::String).required()),
                ("id", AttributeDefinition::new(DataType::String)),
                ("age", AttributeDefinition::new(DataType::Integer)),
            ],
            Map::new(),
        )
    }

    #[test]
    fn system_attributes_are_merged() {
        let schema = users();
        assert_eq!(schema.attribute("id").map(|a| &a.data_type), Some(&DataType::Integer));
        assert_eq!(
            schema.attribute("isDeleted").map(|a| &a.data_type),
            Some(&DataType::Boolean)
        );
        assert!(schema.attribute("createdAt").is_some());
        assert!(schema.attribute("updatedAt").is_some());

        let declared: Vec<&str> = schema.declared_attributes().map(|(n, _)| n).collect();
        assert_eq!(declared, vec!["name", "age"]);
    }

    #[test]
    fn default_where_always_excludes_deleted_rows() {
        let schema = EntitySchema::new(
            "users",
            Vec::<(String, AttributeDefinition)>::new(),
            json!({"tenant": 3, "isDeleted": 1}).as_object().cloned().unwrap_or_default(),
        );
        assert_eq!(
            Value::Object(schema.default_where().clone()),
            json!({"tenant": 3, "isDeleted": 0})
        );
    }

    #[test]
    fn scoped_where_keeps_caller_order() {
        let schema = users();
        let caller = json!({"isDeleted": 1, "age": 3});
        let scoped = schema.scoped_where(caller.as_object().unwrap());
        let keys: Vec<&String> = scoped.keys().collect();
        assert_eq!(keys, vec!["isDeleted", "age"]);
        assert_eq!(scoped["isDeleted"], json!(0));
    }

    #[test]
    fn data_types_deserialize_from_names() {
        let definition: AttributeDefinition =
            serde_json::from_value(json!({"dataType": "INTEGER", "required": true})).unwrap();
        assert_eq!(definition.data_type, DataType::Integer);
        assert!(definition.required);
        assert_eq!(definition.default_value, None);

        let custom: DataType = serde_json::from_value(json!("DECIMAL(10,2)")).unwrap();
        assert_eq!(custom, DataType::Custom("DECIMAL(10,2)".into()));
        assert_eq!(custom.as_sql(), "DECIMAL(10,2)");
    }

    #[test]
    fn default_values_accept_any_literal() {
        let parse = |v: Value| -> Option<String> {
            serde_json::from_value::<AttributeDefinition>(json!({"dataType": "BOOLEAN", "defaultValue": v}))
                .unwrap()
                .default_value
        };
        assert_eq!(parse(json!(1)), Some("1".to_string()));
        assert_eq!(parse(json!(2.5)), Some("2.5".to_string()));
        assert_eq!(parse(json!(true)), Some("1".to_string()));
        assert_eq!(parse(json!("draft")), Some("draft".to_string()));
        assert_eq!(parse(json!(0)), None);
        assert_eq!(parse(json!(false)), None);
        assert_eq!(parse(json!("")), None);
        assert_eq!(parse(Value::Null), None);

        assert_eq!(
            AttributeDefinition::new(DataType::Integer).default_value(0).default_value,
            None
        );
        assert_eq!(
            AttributeDefinition::new(DataType::Integer).default_value(7).default_value,
            Some("7".to_string())
        );
    }

    #[test]
    fn declare_options_default_to_no_sync() {
        let options: DeclareOptions = serde_json::from_value(json!({})).unwrap();
        assert_eq!(options.sync, SyncOptions::default());
        assert!(options.default_where.is_empty());
    }
}
