//! Destination schema derived from the field descriptors.

use std::collections::HashSet;

use serde::Serialize;

use crate::dbase::field::{normalize_name, FieldDescriptor};
use crate::dbase::field_types::SemanticType;
use crate::DbfError;

/// One destination column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub name: String,
    pub semantic: SemanticType,
    /// Maximum length for text columns, `None` for numeric ones.
    pub max_length: Option<u16>,
    /// Source type code as a character.
    pub type_code: char,
    /// Column definition fragment, e.g. `varchar(20) NULL`.
    pub ddl: String,
    pub decimal_count: u8,
}

/// Ordered destination columns, one per field descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Schema {
    pub columns: Vec<Column>,
}

impl Schema {
    /// Build the schema for a descriptor list.
    ///
    /// # Examples
    ///
    /// ```
    /// use dbf::dbase::schema::Schema;
    /// use dbf::dbase::write::TableBuilder;
    /// use dbf::dbase::cursor::ByteCursor;
    /// use dbf::dbase::header::TableHeader;
    /// use dbf::dbase::field::read_field_descriptors;
    ///
    /// let image = TableBuilder::new().field("ID", b'I', 4).field("ID", b'C', 3).build();
    /// let mut cur = ByteCursor::from_bytes(image);
    /// TableHeader::read(&mut cur).unwrap();
    /// let fields = read_field_descriptors(&mut cur).unwrap();
    /// assert!(Schema::from_fields(&fields).is_err());
    /// ```
    pub fn from_fields(fields: &[FieldDescriptor]) -> Result<Self, DbfError> {
        let mut seen = HashSet::with_capacity(fields.len());
        let mut columns = Vec::with_capacity(fields.len());
        for (i, field) in fields.iter().enumerate() {
            let name = normalize_name(field.name.as_bytes());
            if name.is_empty() {
                return Err(DbfError::InvalidColumnName(i));
            }
            if !seen.insert(name.clone()) {
                return Err(DbfError::DuplicateColumnName(name));
            }
            let spec = field.type_spec();
            columns.push(Column {
                name,
                semantic: spec.semantic,
                max_length: spec.max_length(field.length),
                type_code: field.type_char(),
                ddl: spec.ddl_fragment(field.length),
                decimal_count: field.decimal_count,
            });
        }
        Ok(Schema { columns })
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Column names in order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// `CREATE TABLE` statement with bracket-quoted column names.
    ///
    /// The table name is written as given.
    pub fn create_table_ddl(&self, table: &str) -> String {
        let columns: Vec<String> = self
            .columns
            .iter()
            .map(|c| format!("[{}] {}", c.name, c.ddl))
            .collect();
        format!("CREATE TABLE {} ({})", table, columns.join(", "))
    }

    /// `DROP TABLE` statement for the table.
    pub fn drop_table_ddl(&self, table: &str) -> String {
        format!("DROP TABLE {}", table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str, code: u8, length: u8) -> FieldDescriptor {
        FieldDescriptor {
            name: name.to_string(),
            type_code: code,
            length,
            decimal_count: 0,
            mdx_flag: 0,
            next_autoincrement: 0,
            reserved_1: [0; 2],
            reserved_2: [0; 2],
            reserved_3: [0; 4],
        }
    }

    #[test]
    fn test_columns_in_file_order() {
        let schema = Schema::from_fields(&[
            field("ID", b'+', 4),
            field("Name", b'C', 40),
            field("BORN", b'D', 8),
            field("NOTES", b'M', 10),
            field("BALANCE", b'Y', 8),
            field("RATIO", b'O', 8),
        ])
        .unwrap();
        let names: Vec<&str> = schema.column_names().collect();
        assert_eq!(names, vec!["ID", "Name", "BORN", "NOTES", "BALANCE", "RATIO"]);
        assert_eq!(schema.columns[0].semantic, SemanticType::Int32);
        assert_eq!(schema.columns[0].max_length, None);
        assert_eq!(schema.columns[1].max_length, Some(40));
        assert_eq!(schema.columns[2].max_length, Some(8));
        assert_eq!(schema.columns[3].max_length, Some(10));
        assert_eq!(schema.columns[4].ddl, "decimal(12,4) NULL");
        assert_eq!(schema.columns[5].type_code, 'O');
    }

    #[test]
    fn test_duplicate_names_rejected() {
        match Schema::from_fields(&[field("ID", b'I', 4), field("ID", b'C', 10)]) {
            Err(DbfError::DuplicateColumnName(name)) => assert_eq!(name, "ID"),
            other => panic!("expected DuplicateColumnName, got {:?}", other),
        }
    }

    #[test]
    fn test_names_are_case_sensitive() {
        assert!(Schema::from_fields(&[field("id", b'I', 4), field("ID", b'I', 4)]).is_ok());
    }

    #[test]
    fn test_empty_name_rejected() {
        assert!(matches!(
            Schema::from_fields(&[field("A", b'C', 1), field("   ", b'C', 1)]),
            Err(DbfError::InvalidColumnName(1))
        ));
    }

    #[test]
    fn test_create_table_ddl() {
        let schema =
            Schema::from_fields(&[field("ID", b'I', 4), field("CITY", b'C', 20)]).unwrap();
        assert_eq!(
            schema.create_table_ddl("customers"),
            "CREATE TABLE customers ([ID] int NULL, [CITY] varchar(20) NULL)"
        );
        assert_eq!(schema.drop_table_ddl("customers"), "DROP TABLE customers");
    }

    #[test]
    fn test_empty_schema() {
        let schema = Schema::from_fields(&[]).unwrap();
        assert!(schema.is_empty());
        assert_eq!(schema.create_table_ddl("t"), "CREATE TABLE t ()");
    }
}
