use std::str::FromStr;

use quiz_core::model::QuestionId;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::{QuestionRecord, QuizInfoRecord, StorageError};

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn i64_to_u32(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} out of range")))
}

pub(crate) fn encode_strings(values: &[String]) -> Result<String, StorageError> {
    serde_json::to_string(values).map_err(ser)
}

fn decode_strings(field: &'static str, raw: &str) -> Result<Vec<String>, StorageError> {
    serde_json::from_str(raw)
        .map_err(|e| StorageError::Serialization(format!("{field}: {e}")))
}

pub(crate) fn map_quiz_info_row(row: &SqliteRow) -> Result<QuizInfoRecord, StorageError> {
    let people_attended: i64 = row.try_get("people_attended").map_err(ser)?;
    let rules: String = row.try_get("rules").map_err(ser)?;

    Ok(QuizInfoRecord {
        title: row.try_get("title").map_err(ser)?,
        people_attended: i64_to_u32("people_attended", people_attended)?,
        rules: decode_strings("rules", &rules)?,
    })
}

pub(crate) fn map_question_row(row: &SqliteRow) -> Result<QuestionRecord, StorageError> {
    let id: String = row.try_get("id").map_err(ser)?;
    let position: i64 = row.try_get("position").map_err(ser)?;
    let options: String = row.try_get("options").map_err(ser)?;

    Ok(QuestionRecord {
        id: QuestionId::from_str(&id).map_err(ser)?,
        position: i64_to_u32("position", position)?,
        prompt: row.try_get("prompt").map_err(ser)?,
        options: decode_strings("options", &options)?,
        answer: row.try_get("answer").map_err(ser)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strings_round_trip_through_json() {
        let values = vec!["Paris".to_string(), String::new()];
        let encoded = encode_strings(&values).unwrap();
        assert_eq!(decode_strings("options", &encoded).unwrap(), values);
    }

    #[test]
    fn malformed_json_is_a_serialization_error() {
        let err = decode_strings("options", "not json").unwrap_err();
        assert!(matches!(err, StorageError::Serialization(msg) if msg.starts_with("options")));
    }

    #[test]
    fn negative_counter_is_rejected() {
        assert!(i64_to_u32("people_attended", -1).is_err());
    }
}
