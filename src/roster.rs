use itertools::Itertools;
use crate::error::Error;
use crate::rider::ClassId;

pub const DEFAULT_CLASS_CODE: &str = "C";

/// Fixed class lookup, ids double as the ranking priority.
pub fn class_id_for_code(code: &str) -> Option<ClassId> {
    match code {
        "M" => Some(1),
        "E" => Some(2),
        "I" => Some(3),
        "C" => Some(4),
        _ => None,
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RosterRow {
    pub number: i64,
    pub name: String,
    pub class_code: String,
    pub class_id: ClassId,
}

/// Parse an uploaded roster (CSV with NUMBER, NAME and CLASS columns, extra
/// columns tolerated) into rider rows. Rows with an empty required cell are
/// skipped, unknown class codes map to `default_class_id`.
pub fn parse_roster(data: &[u8], default_class_id: ClassId) -> Result<Vec<RosterRow>, Error> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(data);
    let headers = reader.headers()
        .map_err(|e| Error::Validation(format!("Unreadable roster: {e}")))?
        .clone();
    let column = |name: &str| headers.iter().position(|h| h == name);
    let (Some(number_col), Some(name_col), Some(class_col)) = (column("NUMBER"), column("NAME"), column("CLASS")) else {
        return Err(Error::Validation("Roster must have NUMBER, NAME and CLASS columns".to_string()));
    };

    let mut rows = Vec::new();
    for (n, record) in reader.records().enumerate() {
        let record = record.map_err(|e| Error::Validation(format!("Unreadable roster: {e}")))?;
        if record.len() != headers.len() {
            return Err(Error::Validation(format!(
                "Roster row {} has {} columns, expected {}", n + 1, record.len(), headers.len())));
        }
        let number = record.get(number_col).unwrap_or_default();
        let name = record.get(name_col).unwrap_or_default();
        let class_code = record.get(class_col).unwrap_or_default();
        if number.is_empty() || name.is_empty() || class_code.is_empty() {
            continue;
        }
        let number: i64 = number.parse()
            .map_err(|_| Error::Validation(format!("Rider number {number} is not an integer")))?;
        let class_id = class_id_for_code(class_code).unwrap_or(default_class_id);
        rows.push(RosterRow {
            number,
            name: name.to_string(),
            class_code: class_code.to_string(),
            class_id,
        });
    }

    if let Some(dup) = rows.iter().duplicates_by(|row| row.number).next() {
        return Err(Error::DuplicateRider {
            number: dup.number,
            name: dup.name.clone(),
            class: dup.class_code.clone(),
        });
    }
    Ok(rows)
}

#[cfg(test)]
mod test {
    use super::*;

    const DEFAULT_CLASS_ID: ClassId = 4;

    #[test]
    fn parse_valid_roster() {
        let data = b"NUMBER,NAME,CLASS\n12,A. Rider,M\n34,B. Other,E\n56,C. Third,I\n";
        let rows = parse_roster(data, DEFAULT_CLASS_ID).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], RosterRow { number: 12, name: "A. Rider".to_string(), class_code: "M".to_string(), class_id: 1 });
        assert_eq!(rows[1].class_id, 2);
        assert_eq!(rows[2].class_id, 3);
    }

    #[test]
    fn extra_columns_are_tolerated() {
        let data = b"CLUB,NUMBER,NAME,CLASS\nNRTC,12,A. Rider,M\n";
        let rows = parse_roster(data, DEFAULT_CLASS_ID).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].number, 12);
    }

    #[test]
    fn missing_column_fails() {
        let data = b"NUMBER,NAME\n12,A. Rider\n";
        let err = parse_roster(data, DEFAULT_CLASS_ID).unwrap_err();
        assert!(matches!(err, Error::Validation(_)), "{err:?}");
    }

    #[test]
    fn ragged_row_fails() {
        let data = b"NUMBER,NAME,CLASS\n12,A. Rider,M\n34,B. Other\n";
        let err = parse_roster(data, DEFAULT_CLASS_ID).unwrap_err();
        assert!(matches!(err, Error::Validation(_)), "{err:?}");
    }

    #[test]
    fn rows_with_empty_cells_are_skipped() {
        let data = b"NUMBER,NAME,CLASS\n12,A. Rider,M\n,B. Other,E\n34,,I\n56,C. Third,\n";
        let rows = parse_roster(data, DEFAULT_CLASS_ID).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].number, 12);
    }

    #[test]
    fn duplicate_number_fails_with_second_occurrence() {
        let data = b"NUMBER,NAME,CLASS\n12,A. Rider,M\n12,B. Other,E\n";
        let err = parse_roster(data, DEFAULT_CLASS_ID).unwrap_err();
        let Error::DuplicateRider { number, name, class } = err else {
            panic!("expected DuplicateRider, got {err:?}");
        };
        assert_eq!(number, 12);
        assert_eq!(name, "B. Other");
        assert_eq!(class, "E");
    }

    #[test]
    fn unknown_class_code_takes_default() {
        let data = b"NUMBER,NAME,CLASS\n12,A. Rider,X\n";
        let rows = parse_roster(data, DEFAULT_CLASS_ID).unwrap();
        assert_eq!(rows[0].class_id, DEFAULT_CLASS_ID);
        assert_eq!(rows[0].class_code, "X");
    }

    #[test]
    fn non_integer_number_fails() {
        let data = b"NUMBER,NAME,CLASS\ntwelve,A. Rider,M\n";
        let err = parse_roster(data, DEFAULT_CLASS_ID).unwrap_err();
        assert!(matches!(err, Error::Validation(_)), "{err:?}");
    }
}
