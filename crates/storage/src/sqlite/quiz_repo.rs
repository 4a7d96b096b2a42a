use super::SqliteRepository;
use super::mapping::{encode_strings, map_question_row, map_quiz_info_row, ser};
use crate::repository::{
    QuestionRecord, QuizAdminRepository, QuizInfoRecord, QuizRepository, StorageError,
};

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait::async_trait]
impl QuizRepository for SqliteRepository {
    async fn get_quiz_info(&self) -> Result<QuizInfoRecord, StorageError> {
        let row = sqlx::query(
            r"
            SELECT title, people_attended, rules
            FROM quiz_info WHERE id = 1
            ",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        match row {
            Some(row) => map_quiz_info_row(&row),
            None => Err(StorageError::NotFound),
        }
    }

    async fn list_questions(&self) -> Result<Vec<QuestionRecord>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, position, prompt, options, answer
            FROM questions
            ORDER BY position ASC, id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut questions = Vec::with_capacity(rows.len());
        for row in rows {
            questions.push(map_question_row(&row)?);
        }
        Ok(questions)
    }

    async fn increment_attendance(&self) -> Result<u32, StorageError> {
        let value: Option<i64> = sqlx::query_scalar(
            r"
            UPDATE quiz_info
            SET people_attended = people_attended + 1
            WHERE id = 1
            RETURNING people_attended
            ",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        let value = value.ok_or(StorageError::NotFound)?;
        u32::try_from(value).map_err(ser)
    }
}

#[async_trait::async_trait]
impl QuizAdminRepository for SqliteRepository {
    async fn upsert_quiz_info(&self, info: &QuizInfoRecord) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO quiz_info (id, title, people_attended, rules)
            VALUES (1, ?1, ?2, ?3)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                people_attended = excluded.people_attended,
                rules = excluded.rules
            ",
        )
        .bind(&info.title)
        .bind(i64::from(info.people_attended))
        .bind(encode_strings(&info.rules)?)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn upsert_question(&self, question: &QuestionRecord) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO questions (id, position, prompt, options, answer)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(id) DO UPDATE SET
                position = excluded.position,
                prompt = excluded.prompt,
                options = excluded.options,
                answer = excluded.answer
            ",
        )
        .bind(question.id.to_string())
        .bind(i64::from(question.position))
        .bind(&question.prompt)
        .bind(encode_strings(&question.options)?)
        .bind(&question.answer)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }
}
