// query_builder.rs
//
// Renders statements as plain SQL text for MySQL. Values are inlined, so
// everything except `raw_where` must come out of `validate` first.

use crate::libs::error::{Error, Result};
use crate::libs::schema::{EntitySchema, ID, IS_DELETED};
use crate::libs::validator::ValidatedInput;

/// Wrap an identifier in backticks, doubling any embedded backtick.
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

fn quote_list<'a>(names: impl IntoIterator<Item = &'a str>) -> String {
    names
        .into_iter()
        .map(quote_identifier)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Columns to select.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Attributes {
    #[default]
    All,
    Columns(Vec<String>),
}

impl From<&str> for Attributes {
    /// `"*"` selects everything; anything else is a comma-separated list.
    fn from(value: &str) -> Self {
        if value.trim() == "*" {
            return Attributes::All;
        }
        Attributes::Columns(
            value
                .split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }
}

impl From<Vec<&str>> for Attributes {
    fn from(value: Vec<&str>) -> Self {
        Attributes::Columns(value.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<String>> for Attributes {
    fn from(value: Vec<String>) -> Self {
        Attributes::Columns(value)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortBy {
    pub attribute: String,
    pub order: SortOrder,
}

impl SortBy {
    pub fn asc(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            order: SortOrder::Asc,
        }
    }

    pub fn desc(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            order: SortOrder::Desc,
        }
    }
}

/// SELECT builder for `find_one`/`find_all`.
pub struct QueryBuilder<'a> {
    table: &'a str,
    selects: Option<&'a [String]>,
    wheres: Vec<String>,
    raw_where: Option<&'a str>,
    order_clause: Option<String>,
    limit_one: bool,
}

impl<'a> QueryBuilder<'a> {
    pub fn new(table: &'a str) -> Self {
        Self {
            table,
            selects: None,
            wheres: vec![],
            raw_where: None,
            order_clause: None,
            limit_one: false,
        }
    }

    pub fn select(mut self, attributes: &'a Attributes) -> Self {
        self.selects = match attributes {
            Attributes::All => None,
            Attributes::Columns(columns) => Some(columns.as_slice()),
        };
        self
    }

    /// Each validated entry becomes `name=value`, in input order.
    pub fn r#where(mut self, validated: &ValidatedInput) -> Self {
        self.wheres
            .extend(validated.iter().map(|(name, literal)| format!("{name}={literal}")));
        self
    }

    /// Append a caller-trusted fragment to the WHERE clause. It is not
    /// validated or escaped.
    pub fn raw_where(mut self, fragment: Option<&'a str>) -> Self {
        self.raw_where = fragment.filter(|f| !f.trim().is_empty());
        self
    }

    pub fn order_by(mut self, sort_by: Option<&SortBy>) -> Self {
        self.order_clause = sort_by.map(|s| {
            format!(
                "ORDER BY {} {}",
                quote_identifier(&s.attribute),
                s.order.as_sql()
            )
        });
        self
    }

    pub fn limit_one(mut self, is_one: bool) -> Self {
        self.limit_one = is_one;
        self
    }

    pub fn build_sql(&self) -> String {
        let columns = match self.selects {
            Some(columns) if !columns.is_empty() => quote_list(columns.iter().map(String::as_str)),
            _ => "*".to_string(),
        };
        let mut sql = format!("SELECT {} FROM {}", columns, quote_identifier(self.table));

        let mut conditions = Vec::new();
        if !self.wheres.is_empty() {
            conditions.push(self.wheres.join(" AND "));
        }
        if let Some(raw) = self.raw_where {
            conditions.push(raw.to_string());
        }
        if !conditions.is_empty() {
            sql += &format!(" WHERE {}", conditions.join(" AND "));
        }
        if let Some(order) = &self.order_clause {
            sql += &format!(" {}", order);
        }
        if self.limit_one {
            sql += " LIMIT 1";
        }
        sql
    }
}

/// `CREATE TABLE IF NOT EXISTS` with the surrogate key, soft-delete flag
/// and timestamps always present.
pub fn create_table(schema: &EntitySchema) -> String {
    let mut columns = vec![format!(
        "{} BIGINT UNSIGNED NOT NULL AUTO_INCREMENT",
        quote_identifier(ID)
    )];

    for (name, attribute) in schema.declared_attributes() {
        let mut column = format!(
            "{} {} {}",
            quote_identifier(name),
            attribute.data_type.as_sql(),
            if attribute.required { "NOT NULL" } else { "NULL" }
        );
        if let Some(default) = attribute.default_value.as_deref().filter(|d| !d.is_empty()) {
            column.push_str(&format!(" DEFAULT '{default}'"));
        }
        columns.push(column);
    }

    columns.push(format!("{} BOOLEAN NOT NULL DEFAULT 0", quote_identifier(IS_DELETED)));
    columns.push("`createdAt` TIMESTAMP NULL DEFAULT CURRENT_TIMESTAMP".to_string());
    columns.push(
        "`updatedAt` TIMESTAMP NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP"
            .to_string(),
    );
    columns.push("PRIMARY KEY (`id`)".to_string());
    columns.push("UNIQUE KEY `id` (`id`)".to_string());

    format!(
        "CREATE TABLE IF NOT EXISTS {} ({}) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4",
        quote_identifier(schema.name()),
        columns.join(", ")
    )
}

pub fn drop_table(table: &str) -> String {
    format!("DROP TABLE IF EXISTS {}", quote_identifier(table))
}

/// Columns in input order; `id` and the timestamps are left to the database.
pub fn insert(table: &str, input: &ValidatedInput) -> String {
    let values: Vec<&str> = input.iter().map(|(_, literal)| literal).collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_identifier(table),
        quote_list(input.keys()),
        values.join(", ")
    )
}

pub fn update(table: &str, input: &ValidatedInput) -> Result<String> {
    let id = input.get(ID).ok_or_else(|| Error::validation(ID))?;
    let sets: Vec<String> = input
        .iter()
        .map(|(name, literal)| format!("{}={}", quote_identifier(name), literal))
        .collect();
    Ok(format!(
        "UPDATE {} SET {} WHERE id={}",
        quote_identifier(table),
        sets.join(", "),
        id
    ))
}

/// Soft delete: rows are flagged, never removed.
pub fn soft_delete(table: &str, id: &str) -> String {
    format!(
        "UPDATE {} SET {} = 1 WHERE id = {}",
        quote_identifier(table),
        IS_DELETED,
        id
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::schema::{AttributeDefinition, DataType};
    use crate::libs::validator::validate;
    use serde_json::{Map, Value, json};

    fn schema() -> EntitySchema {
        EntitySchema::new(
            "users",
            [
                ("name", AttributeDefinition::new(DataType::String).required()),
                ("status", AttributeDefinition::new(DataType::Integer).default_value("1")),
                ("age", AttributeDefinition::new(DataType::Integer)),
            ],
            Map::new(),
        )
    }

    fn validated(input: Value) -> ValidatedInput {
        validate(&schema(), input.as_object().unwrap()).unwrap()
    }

    #[test]
    fn where_and_raw_where_are_joined_only_when_both_present() {
        let status = validated(json!({"status": 1}));

        let both = QueryBuilder::new("users")
            .r#where(&status)
            .raw_where(Some("age>18"))
            .build_sql();
        assert_eq!(both, "SELECT * FROM `users` WHERE status=1 AND age>18");

        let only_map = QueryBuilder::new("users").r#where(&status).build_sql();
        assert_eq!(only_map, "SELECT * FROM `users` WHERE status=1");

        let only_raw = QueryBuilder::new("users")
            .r#where(&ValidatedInput::default())
            .raw_where(Some("age>18"))
            .build_sql();
        assert_eq!(only_raw, "SELECT * FROM `users` WHERE age>18");

        let neither = QueryBuilder::new("users").raw_where(Some("  ")).build_sql();
        assert_eq!(neither, "SELECT * FROM `users`");
    }

    #[test]
    fn select_columns_sort_and_limit() {
        let attributes = Attributes::from("name, age");
        let sort = SortBy::desc("age");
        let sql = QueryBuilder::new("users")
            .select(&attributes)
            .r#where(&validated(json!({"name": "Ada", "status": "2"})))
            .order_by(Some(&sort))
            .limit_one(true)
            .build_sql();
        assert_eq!(
            sql,
            "SELECT `name`, `age` FROM `users` WHERE name='Ada' AND status=2 ORDER BY `age` DESC LIMIT 1"
        );
    }

    #[test]
    fn star_selects_everything() {
        assert_eq!(Attributes::from("*"), Attributes::All);
        assert_eq!(
            Attributes::from(vec!["a", "b"]),
            Attributes::Columns(vec!["a".into(), "b".into()])
        );
    }

    #[test]
    fn create_table_injects_system_columns() {
        let sql = create_table(&schema());
        assert_eq!(
            sql,
            "CREATE TABLE IF NOT EXISTS `users` (\
             `id` BIGINT UNSIGNED NOT NULL AUTO_INCREMENT, \
             `name` VARCHAR(255) NOT NULL, \
             `status` INT NULL DEFAULT '1', \
             `age` INT NULL, \
             `isDeleted` BOOLEAN NOT NULL DEFAULT 0, \
             `createdAt` TIMESTAMP NULL DEFAULT CURRENT_TIMESTAMP, \
             `updatedAt` TIMESTAMP NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP, \
             PRIMARY KEY (`id`), \
             UNIQUE KEY `id` (`id`)\
             ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4"
        );
    }

    #[test]
    fn drop_table_is_conditional() {
        assert_eq!(drop_table("users"), "DROP TABLE IF EXISTS `users`");
    }

    #[test]
    fn insert_follows_input_order() {
        let sql = insert("users", &validated(json!({"age": "30", "name": "Ada", "bogus": 1})));
        assert_eq!(sql, "INSERT INTO `users` (`age`, `name`) VALUES (30, 'Ada')");
    }

    #[test]
    fn update_targets_the_id() {
        let sql = update("users", &validated(json!({"id": 5, "name": "Bo"}))).unwrap();
        assert_eq!(sql, "UPDATE `users` SET `id`=5, `name`='Bo' WHERE id=5");

        let err = update("users", &validated(json!({"name": "Bo"}))).unwrap_err();
        assert!(matches!(err, Error::Validation { ref attribute } if attribute == "id"));
    }

    #[test]
    fn soft_delete_never_deletes() {
        let sql = soft_delete("users", "5");
        assert_eq!(sql, "UPDATE `users` SET isDeleted = 1 WHERE id = 5");
        assert!(!sql.contains("DELETE"));
    }

    #[test]
    fn identifiers_escape_backticks() {
        assert_eq!(quote_identifier("we`ird"), "`we``ird`");
    }
}
