// MySQL column type classification
//
// Maps a declared MySQL type to the SQLite storage class used for the
// physical table and to the metadata MySQL reports in COLUMNS.

use crate::ast::DataType;

/// Default collation for textual columns of tables that do not declare one
pub const DEFAULT_COLLATION: &str = "utf8mb4_general_ci";

/// Collation of NATIONAL / N-prefixed character types
const NATIONAL_COLLATION: &str = "utf8mb3_general_ci";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageClass {
    Integer,
    Real,
    Text,
    Blob,
}

impl StorageClass {
    pub fn as_str(self) -> &'static str {
        match self {
            StorageClass::Integer => "INTEGER",
            StorageClass::Real => "REAL",
            StorageClass::Text => "TEXT",
            StorageClass::Blob => "BLOB",
        }
    }
}

const INTEGER_TYPES: &[&str] = &["bit", "tinyint", "smallint", "mediumint", "int", "bigint"];
const REAL_TYPES: &[&str] = &["float", "double", "decimal"];
const CHAR_TYPES: &[&str] = &["char", "varchar"];
const TEXT_TYPES: &[&str] = &["tinytext", "text", "mediumtext", "longtext"];
const BLOB_TYPES: &[&str] = &["varbinary", "tinyblob", "blob", "mediumblob", "longblob"];
const TEMPORAL_TYPES: &[&str] = &["date", "time", "datetime", "timestamp", "year"];
const SPATIAL_TYPES: &[&str] = &[
    "geometry",
    "point",
    "linestring",
    "polygon",
    "multipoint",
    "multilinestring",
    "multipolygon",
    "geometrycollection",
    "geomcollection",
];

/// True for every type name the driver can store
pub fn is_known_type(name: &str) -> bool {
    INTEGER_TYPES.contains(&name)
        || REAL_TYPES.contains(&name)
        || CHAR_TYPES.contains(&name)
        || TEXT_TYPES.contains(&name)
        || BLOB_TYPES.contains(&name)
        || TEMPORAL_TYPES.contains(&name)
        || SPATIAL_TYPES.contains(&name)
        || matches!(name, "binary" | "enum" | "set" | "json")
}

/// Types that carry a character set and collation
pub fn is_textual(name: &str) -> bool {
    CHAR_TYPES.contains(&name) || TEXT_TYPES.contains(&name) || matches!(name, "enum" | "set")
}

pub fn storage_class(name: &str) -> StorageClass {
    if INTEGER_TYPES.contains(&name) || name == "binary" {
        StorageClass::Integer
    } else if REAL_TYPES.contains(&name) {
        StorageClass::Real
    } else if BLOB_TYPES.contains(&name) {
        StorageClass::Blob
    } else {
        StorageClass::Text
    }
}

/// SQLite type for CAST(x AS type) / CONVERT(x, type)
pub fn cast_target(data_type: &DataType) -> &'static str {
    match data_type.name.as_str() {
        "binary" => "BLOB",
        name if INTEGER_TYPES.contains(&name) => "INTEGER",
        name => storage_class(name).as_str(),
    }
}

/// Parse a type as rendered by the SQL parser, e.g. "BIGINT(20) UNSIGNED",
/// "ENUM('a', 'b')" or "DOUBLE PRECISION", into its canonical MySQL form.
pub fn parse_type(text: &str) -> DataType {
    let text = text.trim();
    let (head, args, tail) = match text.find('(') {
        Some(open) => {
            let close = closing_paren(text, open).unwrap_or(text.len());
            let inner = &text[open + 1..close.min(text.len())];
            let tail = text.get(close + 1..).unwrap_or("");
            (&text[..open], split_args(inner), tail)
        }
        None => (text, Vec::new(), ""),
    };

    let mut data_type = DataType::new("");
    let mut name_words = Vec::new();
    for word in head.split_whitespace().chain(tail.split_whitespace()) {
        match word.to_lowercase().as_str() {
            "unsigned" => data_type.unsigned = true,
            "signed" => {}
            "zerofill" => {
                data_type.zerofill = true;
                data_type.unsigned = true;
            }
            other => name_words.push(other.to_string()),
        }
    }
    data_type.args = args;

    let written = name_words.join(" ");
    data_type.name = match written.as_str() {
        // CAST(x AS SIGNED) / CAST(x AS UNSIGNED)
        "" | "integer" => "int".to_string(),
        "int1" => "tinyint".to_string(),
        "int2" => "smallint".to_string(),
        "int3" | "middleint" => "mediumint".to_string(),
        "int4" => "int".to_string(),
        "int8" => "bigint".to_string(),
        "bool" | "boolean" => {
            data_type.args = vec!["1".to_string()];
            "tinyint".to_string()
        }
        "dec" | "fixed" | "numeric" => "decimal".to_string(),
        "real" | "double precision" | "float8" => "double".to_string(),
        "float4" => "float".to_string(),
        "character varying" | "char varying" => "varchar".to_string(),
        "character" => "char".to_string(),
        "nvarchar" | "national varchar" | "national character varying" | "nchar varchar" => {
            data_type.national = true;
            "varchar".to_string()
        }
        "nchar" | "national char" | "national character" => {
            data_type.national = true;
            "char".to_string()
        }
        "long" | "long varchar" => "mediumtext".to_string(),
        "long varbinary" => "mediumblob".to_string(),
        "serial" => {
            data_type.unsigned = true;
            "serial".to_string()
        }
        other => other.to_string(),
    };
    data_type
}

fn closing_paren(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for (i, ch) in text.char_indices().skip_while(|(i, _)| *i < open) {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(ch),
            (None, '(') => depth += 1,
            (None, ')') => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split type arguments on top-level commas, keeping quoted values intact
fn split_args(inner: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    for ch in inner.chars() {
        match (quote, ch) {
            (Some(q), c) if c == q => {
                quote = None;
                current.push(c);
            }
            (Some(_), c) => current.push(c),
            (None, '\'' | '"') => {
                quote = Some(ch);
                current.push(ch);
            }
            (None, ',') => args.push(std::mem::take(&mut current).trim().to_string()),
            (None, c) => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        args.push(current.trim().to_string());
    }
    args
}

/// Metadata MySQL reports for a column of this type
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnTypeInfo {
    pub data_type: String,
    pub column_type: String,
    pub character_maximum_length: Option<i64>,
    pub character_octet_length: Option<i64>,
    pub numeric_precision: Option<i64>,
    pub numeric_scale: Option<i64>,
    pub datetime_precision: Option<i64>,
    pub character_set_name: Option<String>,
    pub collation_name: Option<String>,
}

fn arg(data_type: &DataType, index: usize) -> Option<i64> {
    data_type.args.get(index).and_then(|a| a.trim().parse().ok())
}

/// Length of an enum/set member as written, e.g. 'it''s' → 4
fn member_length(member: &str) -> i64 {
    let inner = member
        .strip_prefix('\'')
        .and_then(|m| m.strip_suffix('\''))
        .unwrap_or(member);
    inner.replace("''", "'").chars().count() as i64
}

/// Derive COLUMNS metadata.
///
/// `collation` is the column's declared collation, falling back to the
/// table's; it is only used for textual types.
pub fn column_type_info(data_type: &DataType, collation: Option<&str>) -> ColumnTypeInfo {
    let name = data_type.name.as_str();
    let mut info = ColumnTypeInfo {
        data_type: name.to_string(),
        ..Default::default()
    };

    // Canonical argument list for COLUMN_TYPE
    let mut args = data_type.args.clone();
    match name {
        "decimal" => match args.len() {
            0 => args = vec!["10".into(), "0".into()],
            1 => args.push("0".into()),
            _ => {}
        },
        "char" | "binary" | "bit" if args.is_empty() => args = vec!["1".into()],
        _ => {}
    }

    match name {
        "tinyint" | "smallint" | "mediumint" | "int" | "bigint" => {
            let precision = match (name, data_type.unsigned) {
                ("tinyint", _) => 3,
                ("smallint", _) => 5,
                ("mediumint", false) => 7,
                ("mediumint", true) => 8,
                ("int", _) => 10,
                (_, false) => 19,
                (_, true) => 20,
            };
            info.numeric_precision = Some(precision);
            info.numeric_scale = Some(0);
        }
        "bit" => info.numeric_precision = arg(data_type, 0).or(Some(1)),
        "float" => info.numeric_precision = Some(12),
        "double" => info.numeric_precision = Some(22),
        "decimal" => {
            info.numeric_precision = args.first().and_then(|a| a.parse().ok());
            info.numeric_scale = args.get(1).and_then(|a| a.parse().ok());
        }
        "char" | "varchar" => {
            let length = args.first().and_then(|a| a.parse().ok()).unwrap_or(1);
            let bytes_per_char = if data_type.national { 3 } else { 4 };
            info.character_maximum_length = Some(length);
            info.character_octet_length = Some(length * bytes_per_char);
        }
        "binary" | "varbinary" => {
            let length = args.first().and_then(|a| a.parse().ok()).unwrap_or(1);
            info.character_maximum_length = Some(length);
            info.character_octet_length = Some(length);
        }
        "tinytext" | "tinyblob" => {
            info.character_maximum_length = Some(255);
            info.character_octet_length = Some(255);
        }
        "text" | "blob" => {
            info.character_maximum_length = Some(65_535);
            info.character_octet_length = Some(65_535);
        }
        "mediumtext" | "mediumblob" => {
            info.character_maximum_length = Some(16_777_215);
            info.character_octet_length = Some(16_777_215);
        }
        "longtext" | "longblob" => {
            info.character_maximum_length = Some(4_294_967_295);
            info.character_octet_length = Some(4_294_967_295);
        }
        "enum" => {
            let longest = args.iter().map(|a| member_length(a)).max().unwrap_or(0);
            info.character_maximum_length = Some(longest);
            info.character_octet_length = Some(longest * 4);
        }
        "set" => {
            let total: i64 = args.iter().map(|a| member_length(a)).sum::<i64>()
                + (args.len() as i64 - 1).max(0);
            info.character_maximum_length = Some(total);
            info.character_octet_length = Some(total * 4);
        }
        "time" | "datetime" | "timestamp" => {
            info.datetime_precision = arg(data_type, 0).or(Some(0));
        }
        _ => {}
    }

    if is_textual(name) {
        let collation = match collation {
            Some(collation) => collation.to_lowercase(),
            None if data_type.national => NATIONAL_COLLATION.to_string(),
            None => DEFAULT_COLLATION.to_string(),
        };
        info.character_set_name = Some(charset_of(&collation).to_string());
        info.collation_name = Some(collation);
    }

    let mut column_type = name.to_string();
    if !args.is_empty() {
        column_type.push_str(&format!("({})", args.join(",")));
    }
    if data_type.unsigned {
        column_type.push_str(" unsigned");
    }
    if data_type.zerofill {
        column_type.push_str(" zerofill");
    }
    info.column_type = column_type;
    info
}

/// Character set part of a collation name, e.g. utf8mb4_general_ci → utf8mb4
pub fn charset_of(collation: &str) -> &str {
    collation.split('_').next().unwrap_or(collation)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_type_with_width_and_sign() {
        let data_type = parse_type("BIGINT(20) UNSIGNED");
        assert_eq!(data_type.name, "bigint");
        assert_eq!(data_type.args, vec!["20"]);
        assert!(data_type.unsigned);
    }

    #[test]
    fn test_parse_type_aliases() {
        assert_eq!(parse_type("INTEGER").name, "int");
        assert_eq!(parse_type("DOUBLE PRECISION").name, "double");
        assert_eq!(parse_type("NUMERIC(5,2)").name, "decimal");
        assert_eq!(parse_type("CHARACTER VARYING(10)").name, "varchar");
        let boolean = parse_type("BOOLEAN");
        assert_eq!(boolean.name, "tinyint");
        assert_eq!(boolean.args, vec!["1"]);
        let national = parse_type("NVARCHAR(10)");
        assert_eq!(national.name, "varchar");
        assert!(national.national);
    }

    #[test]
    fn test_parse_enum_keeps_members() {
        let data_type = parse_type("ENUM('a, b', 'C')");
        assert_eq!(data_type.name, "enum");
        assert_eq!(data_type.args, vec!["'a, b'", "'C'"]);
    }

    #[test]
    fn test_storage_classes() {
        assert_eq!(storage_class("tinyint"), StorageClass::Integer);
        assert_eq!(storage_class("binary"), StorageClass::Integer);
        assert_eq!(storage_class("decimal"), StorageClass::Real);
        assert_eq!(storage_class("datetime"), StorageClass::Text);
        assert_eq!(storage_class("json"), StorageClass::Text);
        assert_eq!(storage_class("point"), StorageClass::Text);
        assert_eq!(storage_class("varbinary"), StorageClass::Blob);
        assert_eq!(storage_class("longblob"), StorageClass::Blob);
    }

    #[test]
    fn test_cast_targets() {
        assert_eq!(cast_target(&parse_type("BINARY")), "BLOB");
        assert_eq!(cast_target(&parse_type("UNSIGNED")), "INTEGER");
        assert_eq!(cast_target(&parse_type("CHAR(10)")), "TEXT");
        assert_eq!(cast_target(&parse_type("DECIMAL(10,2)")), "REAL");
    }

    // ========== COLUMNS metadata ==========

    #[test]
    fn test_varchar_metadata() {
        let info = column_type_info(&parse_type("VARCHAR(100)"), None);
        assert_eq!(info.column_type, "varchar(100)");
        assert_eq!(info.character_maximum_length, Some(100));
        assert_eq!(info.character_octet_length, Some(400));
        assert_eq!(info.character_set_name.as_deref(), Some("utf8mb4"));
        assert_eq!(info.collation_name.as_deref(), Some(DEFAULT_COLLATION));
    }

    #[test]
    fn test_integer_metadata() {
        let info = column_type_info(&parse_type("INT"), None);
        assert_eq!(info.column_type, "int");
        assert_eq!(info.numeric_precision, Some(10));
        assert_eq!(info.numeric_scale, Some(0));
        assert_eq!(info.collation_name, None);

        let info = column_type_info(&parse_type("BIGINT(20) UNSIGNED"), None);
        assert_eq!(info.column_type, "bigint(20) unsigned");
        assert_eq!(info.numeric_precision, Some(20));
    }

    #[test]
    fn test_decimal_defaults() {
        let info = column_type_info(&parse_type("DECIMAL"), None);
        assert_eq!(info.column_type, "decimal(10,0)");
        assert_eq!(info.numeric_precision, Some(10));
        assert_eq!(info.numeric_scale, Some(0));
    }

    #[test]
    fn test_text_and_datetime_metadata() {
        let info = column_type_info(&parse_type("LONGTEXT"), Some("utf8mb4_unicode_ci"));
        assert_eq!(info.character_maximum_length, Some(4_294_967_295));
        assert_eq!(info.collation_name.as_deref(), Some("utf8mb4_unicode_ci"));

        let info = column_type_info(&parse_type("DATETIME(6)"), None);
        assert_eq!(info.column_type, "datetime(6)");
        assert_eq!(info.datetime_precision, Some(6));
    }

    #[test]
    fn test_enum_metadata() {
        let info = column_type_info(&parse_type("ENUM('a', 'bcd')"), None);
        assert_eq!(info.column_type, "enum('a','bcd')");
        assert_eq!(info.character_maximum_length, Some(3));
    }
}
