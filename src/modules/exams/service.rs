use std::collections::HashSet;

use scholaris_core::AppError;
use sqlx::PgPool;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::modules::classes::service::{ClassService, SubjectService};
use crate::modules::users::model::{User, UserRole};
use crate::modules::users::service::UserService;

use super::grading::{grade_for, percentage};
use super::model::{
    CreateExamDto, CreatePaperDto, EXAM_COLUMNS, Exam, ExamPaper, ExamResult, PAPER_COLUMNS,
    PaperWithResult, RESULT_COLUMNS, RecordResultsDto, ReportCard, SubjectReport, UpdateExamDto,
};

pub struct ExamService;

impl ExamService {
    #[instrument(skip(db, dto), fields(exam.name = %dto.name, db.table = "exams"))]
    pub async fn create_exam(
        db: &PgPool,
        school_id: Uuid,
        dto: CreateExamDto,
    ) -> Result<Exam, AppError> {
        ClassService::get_class(db, dto.class_id, Some(school_id))
            .await
            .map_err(|_| AppError::bad_request(anyhow::anyhow!("Class not found in this school")))?;

        let exam = sqlx::query_as::<_, Exam>(&format!(
            "INSERT INTO exams (school_id, name, class_id, start_date, end_date)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {EXAM_COLUMNS}"
        ))
        .bind(school_id)
        .bind(dto.name.trim())
        .bind(dto.class_id)
        .bind(dto.start_date)
        .bind(dto.end_date)
        .fetch_one(db)
        .await?;

        info!(exam.id = %exam.id, "Exam created");
        Ok(exam)
    }

    pub async fn list_exams(
        db: &PgPool,
        school_id: Uuid,
        class_id: Option<Uuid>,
    ) -> Result<Vec<Exam>, AppError> {
        let exams = sqlx::query_as::<_, Exam>(&format!(
            "SELECT {EXAM_COLUMNS} FROM exams
             WHERE school_id = $1 AND ($2::uuid IS NULL OR class_id = $2)
             ORDER BY start_date DESC NULLS LAST, name"
        ))
        .bind(school_id)
        .bind(class_id)
        .fetch_all(db)
        .await?;
        Ok(exams)
    }

    pub async fn get_exam(db: &PgPool, id: Uuid, scope: Option<Uuid>) -> Result<Exam, AppError> {
        sqlx::query_as::<_, Exam>(&format!(
            "SELECT {EXAM_COLUMNS} FROM exams WHERE id = $1 AND ($2::uuid IS NULL OR school_id = $2)"
        ))
        .bind(id)
        .bind(scope)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Exam not found")))
    }

    #[instrument(skip(db, dto))]
    pub async fn update_exam(
        db: &PgPool,
        id: Uuid,
        scope: Option<Uuid>,
        dto: UpdateExamDto,
    ) -> Result<Exam, AppError> {
        let current = Self::get_exam(db, id, scope).await?;
        let start = dto.start_date.or(current.start_date);
        let end = dto.end_date.or(current.end_date);
        if let (Some(start), Some(end)) = (start, end)
            && end < start
        {
            return Err(AppError::unprocessable(anyhow::anyhow!(
                "End date cannot be before start date"
            )));
        }

        let exam = sqlx::query_as::<_, Exam>(&format!(
            "UPDATE exams
             SET name = COALESCE($2, name), start_date = $3, end_date = $4, updated_at = NOW()
             WHERE id = $1
             RETURNING {EXAM_COLUMNS}"
        ))
        .bind(id)
        .bind(dto.name.as_deref().map(str::trim))
        .bind(start)
        .bind(end)
        .fetch_one(db)
        .await?;
        Ok(exam)
    }

    pub async fn delete_exam(db: &PgPool, id: Uuid, scope: Option<Uuid>) -> Result<(), AppError> {
        let result =
            sqlx::query("DELETE FROM exams WHERE id = $1 AND ($2::uuid IS NULL OR school_id = $2)")
                .bind(id)
                .bind(scope)
                .execute(db)
                .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("Exam not found")));
        }
        Ok(())
    }

    #[instrument(skip(db, dto), fields(subject.id = %dto.subject_id))]
    pub async fn add_paper(
        db: &PgPool,
        exam_id: Uuid,
        scope: Option<Uuid>,
        dto: CreatePaperDto,
    ) -> Result<ExamPaper, AppError> {
        let exam = Self::get_exam(db, exam_id, scope).await?;
        SubjectService::get_subject(db, dto.subject_id, Some(exam.school_id))
            .await
            .map_err(|_| AppError::bad_request(anyhow::anyhow!("Subject not found in this school")))?;

        sqlx::query_as::<_, ExamPaper>(&format!(
            "INSERT INTO exam_papers (exam_id, subject_id, max_marks, paper_date)
             VALUES ($1, $2, $3, $4)
             RETURNING {PAPER_COLUMNS}"
        ))
        .bind(exam.id)
        .bind(dto.subject_id)
        .bind(dto.max_marks)
        .bind(dto.paper_date)
        .fetch_one(db)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => AppError::conflict(
                anyhow::anyhow!("This exam already has a paper for the subject"),
            ),
            _ => AppError::database(e),
        })
    }

    pub async fn list_papers(
        db: &PgPool,
        exam_id: Uuid,
        scope: Option<Uuid>,
    ) -> Result<Vec<ExamPaper>, AppError> {
        let exam = Self::get_exam(db, exam_id, scope).await?;
        let papers = sqlx::query_as::<_, ExamPaper>(&format!(
            "SELECT {PAPER_COLUMNS} FROM exam_papers WHERE exam_id = $1 ORDER BY paper_date NULLS LAST"
        ))
        .bind(exam.id)
        .fetch_all(db)
        .await?;
        Ok(papers)
    }

    /// Loads a paper together with the exam it belongs to, scoped to a school.
    async fn paper_in_scope(
        db: &PgPool,
        paper_id: Uuid,
        scope: Option<Uuid>,
    ) -> Result<(ExamPaper, Exam), AppError> {
        let paper = sqlx::query_as::<_, ExamPaper>(&format!(
            "SELECT {PAPER_COLUMNS} FROM exam_papers WHERE id = $1"
        ))
        .bind(paper_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Exam paper not found")))?;

        let exam = Self::get_exam(db, paper.exam_id, scope)
            .await
            .map_err(|_| AppError::not_found(anyhow::anyhow!("Exam paper not found")))?;
        Ok((paper, exam))
    }

    pub async fn delete_paper(
        db: &PgPool,
        paper_id: Uuid,
        scope: Option<Uuid>,
    ) -> Result<(), AppError> {
        let (paper, _) = Self::paper_in_scope(db, paper_id, scope).await?;
        sqlx::query("DELETE FROM exam_papers WHERE id = $1")
            .bind(paper.id)
            .execute(db)
            .await?;
        Ok(())
    }

    /// Upserts marks for a paper. Marks must lie within `[0, max_marks]` and
    /// every student must be in the exam's class.
    #[instrument(skip(db, dto), fields(results = dto.results.len()))]
    pub async fn record_results(
        db: &PgPool,
        paper_id: Uuid,
        scope: Option<Uuid>,
        dto: RecordResultsDto,
    ) -> Result<Vec<ExamResult>, AppError> {
        let (paper, exam) = Self::paper_in_scope(db, paper_id, scope).await?;

        if let Some(over) = dto.results.iter().find(|r| r.marks > paper.max_marks) {
            warn!(student.id = %over.student_id, marks = over.marks, max = paper.max_marks, "Marks above maximum");
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Marks {} exceed the paper maximum of {}",
                over.marks,
                paper.max_marks
            )));
        }

        let student_ids: Vec<Uuid> = dto
            .results
            .iter()
            .map(|r| r.student_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        if student_ids.len() != dto.results.len() {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Each student may appear only once per paper"
            )));
        }

        let in_class = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users
             WHERE id = ANY($1) AND role = 'student' AND school_id = $2 AND class_id = $3",
        )
        .bind(&student_ids)
        .bind(exam.school_id)
        .bind(exam.class_id)
        .fetch_one(db)
        .await?;
        if in_class != student_ids.len() as i64 {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "All students must belong to the exam's class"
            )));
        }

        let mut tx = db.begin().await?;
        let mut results = Vec::with_capacity(dto.results.len());
        for entry in &dto.results {
            let result = sqlx::query_as::<_, ExamResult>(&format!(
                "INSERT INTO exam_results (paper_id, student_id, marks, remarks)
                 VALUES ($1, $2, $3, $4)
                 ON CONFLICT (paper_id, student_id) DO UPDATE
                 SET marks = EXCLUDED.marks, remarks = EXCLUDED.remarks, updated_at = NOW()
                 RETURNING {RESULT_COLUMNS}"
            ))
            .bind(paper.id)
            .bind(entry.student_id)
            .bind(entry.marks)
            .bind(&entry.remarks)
            .fetch_one(&mut *tx)
            .await?;
            results.push(result);
        }
        tx.commit().await?;

        info!(paper.id = %paper.id, recorded = results.len(), "Exam results recorded");
        Ok(results)
    }

    pub async fn list_results(
        db: &PgPool,
        paper_id: Uuid,
        scope: Option<Uuid>,
    ) -> Result<Vec<ExamResult>, AppError> {
        let (paper, _) = Self::paper_in_scope(db, paper_id, scope).await?;
        let results = sqlx::query_as::<_, ExamResult>(&format!(
            "SELECT {RESULT_COLUMNS} FROM exam_results WHERE paper_id = $1 ORDER BY marks DESC"
        ))
        .bind(paper.id)
        .fetch_all(db)
        .await?;
        Ok(results)
    }

    #[instrument(skip(db))]
    pub async fn report_card(
        db: &PgPool,
        exam_id: Uuid,
        student_id: Uuid,
        scope: Option<Uuid>,
    ) -> Result<ReportCard, AppError> {
        let exam = Self::get_exam(db, exam_id, scope).await?;
        let student =
            UserService::get_user(db, student_id, Some(exam.school_id), Some(UserRole::Student))
                .await?;

        let rows = sqlx::query_as::<_, PaperWithResult>(
            "SELECT p.id AS paper_id, p.subject_id, s.name AS subject_name, p.max_marks, r.marks
             FROM exam_papers p
             JOIN subjects s ON s.id = p.subject_id
             LEFT JOIN exam_results r ON r.paper_id = p.id AND r.student_id = $2
             WHERE p.exam_id = $1
             ORDER BY s.name",
        )
        .bind(exam.id)
        .bind(student.id)
        .fetch_all(db)
        .await?;

        Ok(build_report(&exam, &student, rows))
    }
}

/// Papers without a recorded result count towards the maximum with zero marks.
pub(crate) fn build_report(exam: &Exam, student: &User, rows: Vec<PaperWithResult>) -> ReportCard {
    let total_max_marks: f64 = rows.iter().map(|r| r.max_marks).sum();
    let total_marks: f64 = rows.iter().filter_map(|r| r.marks).sum();
    let overall = percentage(total_marks, total_max_marks);

    let subjects = rows
        .into_iter()
        .map(|r| {
            let pct = r.marks.map(|m| percentage(m, r.max_marks));
            SubjectReport {
                paper_id: r.paper_id,
                subject_id: r.subject_id,
                subject_name: r.subject_name,
                max_marks: r.max_marks,
                marks: r.marks,
                percentage: pct,
                grade: pct.map(|p| grade_for(p).to_string()),
            }
        })
        .collect();

    ReportCard {
        exam_id: exam.id,
        exam_name: exam.name.clone(),
        student_id: student.id,
        student_name: student.full_name(),
        subjects,
        total_marks,
        total_max_marks,
        percentage: overall,
        grade: grade_for(overall).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn exam() -> Exam {
        Exam {
            id: Uuid::new_v4(),
            school_id: Uuid::new_v4(),
            name: "Final".into(),
            class_id: Uuid::new_v4(),
            start_date: None,
            end_date: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn student() -> User {
        User {
            id: Uuid::new_v4(),
            first_name: "Ada".into(),
            last_name: "Obi".into(),
            email: "ada@example.com".into(),
            role: UserRole::Student,
            school_id: Some(Uuid::new_v4()),
            phone: None,
            class_id: None,
            section_id: None,
            roll_number: None,
            parent_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn row(name: &str, max: f64, marks: Option<f64>) -> PaperWithResult {
        PaperWithResult {
            paper_id: Uuid::new_v4(),
            subject_id: Uuid::new_v4(),
            subject_name: name.into(),
            max_marks: max,
            marks,
        }
    }

    #[test]
    fn test_report_totals_and_grade() {
        let report = build_report(
            &exam(),
            &student(),
            vec![row("Maths", 100.0, Some(92.0)), row("English", 50.0, Some(34.0))],
        );
        assert_eq!(report.total_marks, 126.0);
        assert_eq!(report.total_max_marks, 150.0);
        assert_eq!(report.percentage, 84.0);
        assert_eq!(report.grade, "A");
        assert_eq!(report.subjects[0].grade.as_deref(), Some("A+"));
        assert_eq!(report.subjects[1].percentage, Some(68.0));
        assert_eq!(report.student_name, "Ada Obi");
    }

    #[test]
    fn test_missing_result_counts_as_zero() {
        let report = build_report(
            &exam(),
            &student(),
            vec![row("Maths", 50.0, Some(50.0)), row("Art", 50.0, None)],
        );
        assert_eq!(report.percentage, 50.0);
        assert_eq!(report.grade, "D");
        assert!(report.subjects[1].grade.is_none());
    }

    #[test]
    fn test_exam_without_papers() {
        let report = build_report(&exam(), &student(), vec![]);
        assert_eq!(report.percentage, 0.0);
        assert_eq!(report.grade, "F");
    }
}
