// model.rs
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::libs::error::{Error, Result};
use crate::libs::executor::{ExecOutcome, Executor, Record};
use crate::libs::query_builder::{self, Attributes, QueryBuilder, SortBy};
use crate::libs::schema::{AttributeDefinition, DeclareOptions, EntitySchema, ID, SyncOptions};
use crate::libs::validator::{ValidatedInput, validate};

/// Parameters for `find_one` / `find_all`.
///
/// Defaults select every column, filter on nothing beyond the entity's
/// default predicate, and leave the order to the database.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindParams {
    pub attributes: Attributes,
    pub r#where: Map<String, Value>,
    /// Appended to the WHERE clause as-is. The caller owns its safety.
    pub raw_where: Option<String>,
    pub sort_by: Option<SortBy>,
}

impl FindParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attributes(mut self, attributes: impl Into<Attributes>) -> Self {
        self.attributes = attributes.into();
        self
    }

    /// Equality filter. Anything but a JSON object leaves the filter empty.
    pub fn r#where(mut self, filter: Value) -> Self {
        self.r#where = match filter {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        self
    }

    pub fn raw_where(mut self, fragment: impl Into<String>) -> Self {
        self.raw_where = Some(fragment.into());
        self
    }

    pub fn sort_by(mut self, sort_by: SortBy) -> Self {
        self.sort_by = Some(sort_by);
        self
    }
}

/// A declared entity bound to the executor that runs its statements.
///
/// The schema is fixed once the model exists, so a model can be shared
/// across tasks without locking.
#[derive(Clone)]
pub struct Model<E> {
    schema: EntitySchema,
    executor: E,
}

impl<E> Model<E>
where
    E: Executor,
{
    /// Wrap an existing schema without touching the database.
    pub fn new(executor: E, schema: EntitySchema) -> Self {
        Self { schema, executor }
    }

    /// Build the schema for `name` and synchronise its table as `options`
    /// asks: `force` drops and recreates, `enabled` creates if missing.
    ///
    /// # Example
    /// ```ignore
    /// let users = Model::declare(
    ///     pool.clone(),
    ///     "users",
    ///     [("name", AttributeDefinition::new(DataType::String).required())],
    ///     DeclareOptions { sync: SyncOptions { enabled: true, force: false }, ..Default::default() },
    /// )
    /// .await?;
    /// ```
    pub async fn declare<I, K>(
        executor: E,
        name: impl Into<String>,
        attributes: I,
        options: DeclareOptions,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = (K, AttributeDefinition)>,
        K: Into<String>,
    {
        let schema = EntitySchema::new(name, attributes, options.default_where);
        let model = Self::new(executor, schema);
        model.sync(options.sync).await?;
        Ok(model)
    }

    pub async fn sync(&self, options: SyncOptions) -> Result<()> {
        let table = self.schema.name();
        if options.force {
            self.executor
                .execute(&query_builder::drop_table(table))
                .await?;
            tracing::info!(event = "table_dropped", table = %table);
        }
        if options.force || options.enabled {
            let sql = query_builder::create_table(&self.schema);
            tracing::debug!(sql = %sql, "creating table");
            self.executor.execute(&sql).await?;
            tracing::info!(event = "table_synced", table = %table);
        }
        Ok(())
    }

    pub fn schema(&self) -> &EntitySchema {
        &self.schema
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn validate(&self, input: &Map<String, Value>) -> Result<ValidatedInput> {
        validate(&self.schema, input)
    }

    /// The SELECT a find call would run, default predicate included.
    pub fn find_sql(&self, params: &FindParams, is_one: bool) -> Result<String> {
        let validated_where = self.validate(&self.schema.scoped_where(&params.r#where))?;
        Ok(QueryBuilder::new(self.schema.name())
            .select(&params.attributes)
            .r#where(&validated_where)
            .raw_where(params.raw_where.as_deref())
            .order_by(params.sort_by.as_ref())
            .limit_one(is_one)
            .build_sql())
    }

    pub async fn find_one(&self, params: FindParams) -> Result<Option<Record>> {
        let sql = self.find_sql(&params, true)?;
        let rows = self.executor.fetch_all(&sql).await?;
        Ok(rows.into_iter().next())
    }

    pub async fn find_all(&self, params: FindParams) -> Result<Vec<Record>> {
        let sql = self.find_sql(&params, false)?;
        self.executor.fetch_all(&sql).await
    }

    pub async fn find_one_as<T>(&self, params: FindParams) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        match self.find_one(params).await? {
            Some(record) => Ok(Some(serde_json::from_value(Value::Object(record))?)),
            None => Ok(None),
        }
    }

    pub async fn find_all_as<T>(&self, params: FindParams) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        self.find_all(params)
            .await?
            .into_iter()
            .map(|record| serde_json::from_value(Value::Object(record)).map_err(Error::from))
            .collect()
    }

    /// Insert a row. Returns the new `id` followed by the caller's input.
    pub async fn create<T>(&self, input: &T) -> Result<Record>
    where
        T: Serialize + ?Sized,
    {
        let input = to_object(input)?;
        let validated = self.validate(&input)?;
        let outcome = self
            .executor
            .execute(&query_builder::insert(self.schema.name(), &validated))
            .await?;

        let mut record = Map::new();
        record.insert(ID.to_string(), Value::from(outcome.last_insert_id));
        for (key, value) in input {
            record.insert(key, value);
        }
        Ok(record)
    }

    pub async fn update<T>(&self, input: &T) -> Result<ExecOutcome>
    where
        T: Serialize + ?Sized,
    {
        let input = to_object(input)?;
        if !is_truthy(input.get(ID)) {
            return Err(Error::validation(ID));
        }
        let validated = self.validate(&input)?;
        let sql = query_builder::update(self.schema.name(), &validated)?;
        self.executor.execute(&sql).await
    }

    /// Soft delete: sets `isDeleted = 1` on the row.
    pub async fn delete(&self, id: impl Into<Value>) -> Result<ExecOutcome> {
        let id = id.into();
        if !is_truthy(Some(&id)) {
            return Err(Error::validation(ID));
        }
        let mut input = Map::new();
        input.insert(ID.to_string(), id);
        let validated = self.validate(&input)?;
        let id = validated.get(ID).ok_or_else(|| Error::validation(ID))?;
        self.executor
            .execute(&query_builder::soft_delete(self.schema.name(), id))
            .await
    }
}

fn to_object<T>(input: &T) -> Result<Map<String, Value>>
where
    T: Serialize + ?Sized,
{
    match serde_json::to_value(input)? {
        Value::Object(map) => Ok(map),
        _ => Err(Error::InputShape),
    }
}

// Missing, null, false, zero and "" all count as "no id".
fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn truthiness_of_ids() {
        assert!(!is_truthy(None));
        assert!(!is_truthy(Some(&Value::Null)));
        assert!(!is_truthy(Some(&json!(0))));
        assert!(!is_truthy(Some(&json!(""))));
        assert!(!is_truthy(Some(&json!(false))));
        assert!(is_truthy(Some(&json!(7))));
        assert!(is_truthy(Some(&json!("7"))));
    }

    #[test]
    fn find_params_builder() {
        let params = FindParams::new()
            .attributes("name")
            .r#where(json!({"age": 3}))
            .raw_where("age > 1")
            .sort_by(SortBy::asc("name"));
        assert_eq!(params.attributes, Attributes::Columns(vec!["name".into()]));
        assert_eq!(params.r#where.get("age"), Some(&json!(3)));
        assert_eq!(params.raw_where.as_deref(), Some("age > 1"));

        let params = FindParams::new().r#where(json!([1, 2]));
        assert!(params.r#where.is_empty());
    }

    #[test]
    fn only_objects_are_accepted_as_input() {
        assert!(matches!(to_object(&json!([1])), Err(Error::InputShape)));
        assert_eq!(to_object(&json!({"a": 1})).unwrap().len(), 1);
    }
}
