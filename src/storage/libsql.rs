//! LibSQL storage backend implementation
//!
//! Persists the survey schema in a local libsql (SQLite) database file.
//! Every connection enables foreign keys so the relational constraints of the
//! schema are enforced by the engine.

use crate::error::{EvalError, Result};
use crate::storage::{migrations, NewSchool, SurveyStore};
use crate::types::{
    AnsweredQuestion, AreaId, DomainId, EvaluationArea, EvaluationDomain, Indicator, IndicatorId,
    NewProject, NewQuestion, NewResponse, Project, ProjectId, ProjectStatus, Question, QuestionId,
    RespondentType, School, SchoolId, SchoolPublic, Session, SurveyLink, SurveyLinkId, UserRole,
    UserRoleType,
};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use libsql::{params, Builder, Connection, Database, Row};
use std::path::Path;
use tracing::{debug, info};
use uuid::Uuid;

const SCHOOL_COLUMNS: &str =
    "id, school_code, school_name, password_hash, region, school_type, created_at, updated_at";
const PROJECT_COLUMNS: &str =
    "id, school_id, title, year, description, status, start_date, end_date, created_at, updated_at";
const QUESTION_COLUMNS: &str = "id, project_id, indicator_id, respondent_type, question_text, \
     question_type, options, section_name, description, image_url, order_index, is_required, \
     created_at, updated_at";
const LINK_COLUMNS: &str =
    "id, project_id, respondent_type, access_code, is_active, expires_at, created_at";

/// Fixed-width RFC 3339 so stored timestamps also compare correctly as text
fn ts(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| EvalError::Database(format!("Invalid timestamp '{}': {}", s, e)))
}

fn parse_opt_ts(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
    s.as_deref().map(parse_ts).transpose()
}

fn parse_json(s: Option<String>) -> Result<Option<serde_json::Value>> {
    Ok(s.as_deref().map(serde_json::from_str).transpose()?)
}

/// LibSQL storage backend
pub struct LibsqlStore {
    db: Database,
}

impl LibsqlStore {
    /// Validate an existing database file before opening it
    ///
    /// Returns `Ok(false)` when the file is absent and `must_exist` is false.
    fn validate_database_file(db_path: &str, must_exist: bool) -> Result<bool> {
        let path = Path::new(db_path);

        if !path.exists() {
            if must_exist {
                return Err(EvalError::Database(format!(
                    "Database file not found at '{}'. Run 'school-eval init' first or check database.path.",
                    db_path
                )));
            }
            return Ok(false);
        }

        // SQLite files start with "SQLite format 3\0"
        let bytes = std::fs::read(path).map_err(|e| {
            EvalError::Database(format!("Cannot read database file at '{}': {}", db_path, e))
        })?;
        if bytes.is_empty() {
            // freshly created placeholder (e.g. a temp file); libsql initializes it
            return Ok(true);
        }
        if bytes.len() < 16 || &bytes[0..16] != b"SQLite format 3\0" {
            return Err(EvalError::Database(format!(
                "Database file at '{}' is not a valid SQLite database",
                db_path
            )));
        }

        debug!("Database file validation passed: {}", db_path);
        Ok(true)
    }

    /// Open (and optionally create) a local database, then run migrations
    pub async fn open(db_path: &str, create_if_missing: bool) -> Result<Self> {
        info!(
            "Opening database: {} (create_if_missing: {})",
            db_path, create_if_missing
        );

        let exists = Self::validate_database_file(db_path, !create_if_missing)?;
        if create_if_missing && !exists {
            if let Some(parent) = Path::new(db_path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        EvalError::Database(format!(
                            "Failed to create database directory {}: {}",
                            parent.display(),
                            e
                        ))
                    })?;
                }
            }
        }

        let db = Builder::new_local(db_path)
            .build()
            .await
            .map_err(|e| EvalError::Database(format!("Failed to open local database: {}", e)))?;

        let store = Self { db };
        let conn = store.conn().await?;
        migrations::run(&conn).await?;

        info!("LibSQL database ready");
        Ok(store)
    }

    /// Open an existing database (errors when missing)
    pub async fn open_existing(db_path: &str) -> Result<Self> {
        Self::open(db_path, false).await
    }

    /// Get a connection with foreign keys enforced
    async fn conn(&self) -> Result<Connection> {
        let conn = self
            .db
            .connect()
            .map_err(|e| EvalError::Database(format!("Failed to get connection: {}", e)))?;
        conn.execute("PRAGMA foreign_keys = ON", ()).await?;
        Ok(conn)
    }

    /// Check that the database answers queries
    pub async fn check_health(&self) -> Result<()> {
        let conn = self.conn().await?;
        conn.query("SELECT 1", ())
            .await
            .map_err(|e| EvalError::Database(format!("Health check failed: {}", e)))?;
        Ok(())
    }

    fn row_to_school(row: &Row) -> Result<School> {
        Ok(School {
            id: SchoolId::from_string(&row.get::<String>(0)?)?,
            school_code: row.get(1)?,
            school_name: row.get(2)?,
            password_hash: row.get(3)?,
            region: row.get(4)?,
            school_type: row.get(5)?,
            created_at: parse_ts(&row.get::<String>(6)?)?,
            updated_at: parse_ts(&row.get::<String>(7)?)?,
        })
    }

    fn row_to_project(row: &Row) -> Result<Project> {
        Ok(Project {
            id: ProjectId::from_string(&row.get::<String>(0)?)?,
            school_id: SchoolId::from_string(&row.get::<String>(1)?)?,
            title: row.get(2)?,
            year: row.get::<i64>(3)? as i32,
            description: row.get(4)?,
            status: row.get::<String>(5)?.parse::<ProjectStatus>()?,
            start_date: row.get(6)?,
            end_date: row.get(7)?,
            created_at: parse_ts(&row.get::<String>(8)?)?,
            updated_at: parse_ts(&row.get::<String>(9)?)?,
        })
    }

    fn row_to_question(row: &Row) -> Result<Question> {
        let indicator_id: Option<String> = row.get(2)?;
        Ok(Question {
            id: QuestionId::from_string(&row.get::<String>(0)?)?,
            project_id: ProjectId::from_string(&row.get::<String>(1)?)?,
            indicator_id: indicator_id
                .as_deref()
                .map(IndicatorId::from_string)
                .transpose()?,
            respondent_type: row.get::<String>(3)?.parse()?,
            question_text: row.get(4)?,
            question_type: row.get::<String>(5)?.parse()?,
            options: parse_json(row.get(6)?)?,
            section_name: row.get(7)?,
            description: row.get(8)?,
            image_url: row.get(9)?,
            order_index: row.get(10)?,
            is_required: row.get::<i64>(11)? != 0,
            created_at: parse_ts(&row.get::<String>(12)?)?,
            updated_at: parse_ts(&row.get::<String>(13)?)?,
        })
    }

    fn row_to_link(row: &Row) -> Result<SurveyLink> {
        Ok(SurveyLink {
            id: SurveyLinkId::from_string(&row.get::<String>(0)?)?,
            project_id: ProjectId::from_string(&row.get::<String>(1)?)?,
            respondent_type: row.get::<String>(2)?.parse()?,
            access_code: row.get(3)?,
            is_active: row.get::<i64>(4)? != 0,
            expires_at: parse_opt_ts(row.get(5)?)?,
            created_at: parse_ts(&row.get::<String>(6)?)?,
        })
    }

    fn row_to_indicator(row: &Row) -> Result<Indicator> {
        Ok(Indicator {
            id: IndicatorId::from_string(&row.get::<String>(0)?)?,
            area_id: AreaId::from_string(&row.get::<String>(1)?)?,
            code: row.get(2)?,
            name: row.get(3)?,
            description: row.get(4)?,
            order_index: row.get(5)?,
        })
    }

    async fn lookup_id(&self, table: &str, code: &str) -> Result<Uuid> {
        let conn = self.conn().await?;
        let sql = format!("SELECT id FROM {} WHERE code = ?", table);
        let mut rows = conn.query(&sql, params![code]).await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| EvalError::Database(format!("{} row '{}' vanished", table, code)))?;
        Ok(Uuid::parse_str(&row.get::<String>(0)?)?)
    }
}

#[async_trait]
impl SurveyStore for LibsqlStore {
    async fn create_school(&self, school: &NewSchool) -> Result<School> {
        debug!("Creating school: {}", school.school_code);

        let now = Utc::now();
        let created = School {
            id: SchoolId::new(),
            school_code: school.school_code.clone(),
            school_name: school.school_name.clone(),
            password_hash: school.password_hash.clone(),
            region: school.region.clone(),
            school_type: school.school_type.clone(),
            created_at: now,
            updated_at: now,
        };

        let conn = self.conn().await?;
        conn.execute(
            &format!(
                "INSERT INTO schools ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                SCHOOL_COLUMNS
            ),
            params![
                created.id.to_string(),
                created.school_code.clone(),
                created.school_name.clone(),
                created.password_hash.clone(),
                created.region.clone(),
                created.school_type.clone(),
                ts(now),
                ts(now),
            ],
        )
        .await
        .map_err(|e| {
            let msg = e.to_string();
            if msg.contains("UNIQUE") {
                EvalError::InvalidInput(format!(
                    "school code already registered: {}",
                    school.school_code
                ))
            } else {
                EvalError::Database(msg)
            }
        })?;

        Ok(created)
    }

    async fn get_school(&self, id: SchoolId) -> Result<School> {
        let conn = self.conn().await?;
        let mut rows = conn
            .query(
                &format!("SELECT {} FROM schools WHERE id = ?", SCHOOL_COLUMNS),
                params![id.to_string()],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| EvalError::not_found("school", id))?;
        Self::row_to_school(&row)
    }

    async fn find_school_by_code(&self, code: &str) -> Result<Option<School>> {
        let conn = self.conn().await?;
        let mut rows = conn
            .query(
                &format!("SELECT {} FROM schools WHERE school_code = ?", SCHOOL_COLUMNS),
                params![code],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(Self::row_to_school(&row)?)),
            None => Ok(None),
        }
    }

    async fn update_school_credential(&self, id: SchoolId, password_hash: &str) -> Result<()> {
        let conn = self.conn().await?;
        let changed = conn
            .execute(
                "UPDATE schools SET password_hash = ?, updated_at = ? WHERE id = ?",
                params![password_hash, ts(Utc::now()), id.to_string()],
            )
            .await?;
        if changed == 0 {
            return Err(EvalError::not_found("school", id));
        }
        Ok(())
    }

    async fn list_public_schools(&self) -> Result<Vec<SchoolPublic>> {
        let conn = self.conn().await?;
        let mut rows = conn
            .query(
                "SELECT id, school_code, school_name, region, school_type FROM schools_public ORDER BY school_code",
                (),
            )
            .await?;

        let mut schools = Vec::new();
        while let Some(row) = rows.next().await? {
            schools.push(SchoolPublic {
                id: SchoolId::from_string(&row.get::<String>(0)?)?,
                school_code: row.get(1)?,
                school_name: row.get(2)?,
                region: row.get(3)?,
                school_type: row.get(4)?,
            });
        }
        Ok(schools)
    }

    async fn store_session(&self, session: &Session) -> Result<()> {
        let conn = self.conn().await?;
        conn.execute(
            "INSERT INTO sessions (token, school_id, expires_at, created_at) VALUES (?, ?, ?, ?)",
            params![
                session.token.clone(),
                session.school_id.to_string(),
                ts(session.expires_at),
                ts(session.created_at),
            ],
        )
        .await?;
        Ok(())
    }

    async fn get_session(&self, token: &str) -> Result<Option<Session>> {
        let conn = self.conn().await?;
        let mut rows = conn
            .query(
                "SELECT token, school_id, expires_at, created_at FROM sessions WHERE token = ?",
                params![token],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(Session {
                token: row.get(0)?,
                school_id: SchoolId::from_string(&row.get::<String>(1)?)?,
                expires_at: parse_ts(&row.get::<String>(2)?)?,
                created_at: parse_ts(&row.get::<String>(3)?)?,
            })),
            None => Ok(None),
        }
    }

    async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<usize> {
        let conn = self.conn().await?;
        let removed = conn
            .execute(
                "DELETE FROM sessions WHERE expires_at <= ?",
                params![ts(now)],
            )
            .await?;
        Ok(removed as usize)
    }

    async fn assign_role(
        &self,
        user_id: Uuid,
        school_id: SchoolId,
        role: UserRoleType,
    ) -> Result<UserRole> {
        let granted = UserRole {
            id: Uuid::new_v4(),
            user_id,
            school_id,
            role,
            created_at: Utc::now(),
        };

        let conn = self.conn().await?;
        conn.execute(
            "INSERT INTO user_roles (id, user_id, school_id, role, created_at) VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(user_id, school_id) DO UPDATE SET role = excluded.role",
            params![
                granted.id.to_string(),
                user_id.to_string(),
                school_id.to_string(),
                role.as_str(),
                ts(granted.created_at),
            ],
        )
        .await?;

        // the conflict path keeps the original row id
        let mut rows = conn
            .query(
                "SELECT id, created_at FROM user_roles WHERE user_id = ? AND school_id = ?",
                params![user_id.to_string(), school_id.to_string()],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| EvalError::Database("user role not persisted".to_string()))?;

        Ok(UserRole {
            id: Uuid::parse_str(&row.get::<String>(0)?)?,
            created_at: parse_ts(&row.get::<String>(1)?)?,
            ..granted
        })
    }

    async fn list_roles(&self, school_id: SchoolId) -> Result<Vec<UserRole>> {
        let conn = self.conn().await?;
        let mut rows = conn
            .query(
                "SELECT id, user_id, school_id, role, created_at FROM user_roles WHERE school_id = ? ORDER BY created_at",
                params![school_id.to_string()],
            )
            .await?;

        let mut roles = Vec::new();
        while let Some(row) = rows.next().await? {
            roles.push(UserRole {
                id: Uuid::parse_str(&row.get::<String>(0)?)?,
                user_id: Uuid::parse_str(&row.get::<String>(1)?)?,
                school_id: SchoolId::from_string(&row.get::<String>(2)?)?,
                role: row.get::<String>(3)?.parse()?,
                created_at: parse_ts(&row.get::<String>(4)?)?,
            });
        }
        Ok(roles)
    }

    async fn ensure_domain(
        &self,
        code: &str,
        name: &str,
        description: Option<&str>,
        order_index: i64,
    ) -> Result<DomainId> {
        let conn = self.conn().await?;
        conn.execute(
            "INSERT INTO evaluation_domains (id, code, name, description, order_index, created_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(code) DO UPDATE SET name = excluded.name, description = excluded.description,
                 order_index = excluded.order_index",
            params![
                DomainId::new().to_string(),
                code,
                name,
                description.map(str::to_string),
                order_index,
                ts(Utc::now()),
            ],
        )
        .await?;
        Ok(DomainId(self.lookup_id("evaluation_domains", code).await?))
    }

    async fn ensure_area(
        &self,
        domain_id: DomainId,
        code: &str,
        name: &str,
        order_index: i64,
    ) -> Result<AreaId> {
        let conn = self.conn().await?;
        conn.execute(
            "INSERT INTO evaluation_areas (id, domain_id, code, name, order_index, created_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(code) DO UPDATE SET name = excluded.name, order_index = excluded.order_index",
            params![
                AreaId::new().to_string(),
                domain_id.to_string(),
                code,
                name,
                order_index,
                ts(Utc::now()),
            ],
        )
        .await?;
        Ok(AreaId(self.lookup_id("evaluation_areas", code).await?))
    }

    async fn ensure_indicator(
        &self,
        area_id: AreaId,
        code: &str,
        name: &str,
        order_index: i64,
    ) -> Result<Indicator> {
        let conn = self.conn().await?;
        conn.execute(
            "INSERT INTO indicators (id, area_id, code, name, order_index, created_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(code) DO UPDATE SET name = excluded.name, order_index = excluded.order_index",
            params![
                IndicatorId::new().to_string(),
                area_id.to_string(),
                code,
                name,
                order_index,
                ts(Utc::now()),
            ],
        )
        .await?;

        let mut rows = conn
            .query(
                "SELECT id, area_id, code, name, description, order_index FROM indicators WHERE code = ?",
                params![code],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| EvalError::Database(format!("indicator '{}' not persisted", code)))?;
        Self::row_to_indicator(&row)
    }

    async fn list_domains(&self) -> Result<Vec<EvaluationDomain>> {
        let conn = self.conn().await?;
        let mut rows = conn
            .query(
                "SELECT id, code, name, description, order_index FROM evaluation_domains ORDER BY order_index, code",
                (),
            )
            .await?;

        let mut domains = Vec::new();
        while let Some(row) = rows.next().await? {
            domains.push(EvaluationDomain {
                id: DomainId::from_string(&row.get::<String>(0)?)?,
                code: row.get(1)?,
                name: row.get(2)?,
                description: row.get(3)?,
                order_index: row.get(4)?,
            });
        }
        Ok(domains)
    }

    async fn list_areas(&self) -> Result<Vec<EvaluationArea>> {
        let conn = self.conn().await?;
        let mut rows = conn
            .query(
                "SELECT id, domain_id, code, name, description, order_index FROM evaluation_areas ORDER BY order_index, code",
                (),
            )
            .await?;

        let mut areas = Vec::new();
        while let Some(row) = rows.next().await? {
            areas.push(EvaluationArea {
                id: AreaId::from_string(&row.get::<String>(0)?)?,
                domain_id: DomainId::from_string(&row.get::<String>(1)?)?,
                code: row.get(2)?,
                name: row.get(3)?,
                description: row.get(4)?,
                order_index: row.get(5)?,
            });
        }
        Ok(areas)
    }

    async fn list_indicators(&self) -> Result<Vec<Indicator>> {
        let conn = self.conn().await?;
        let mut rows = conn
            .query(
                "SELECT id, area_id, code, name, description, order_index FROM indicators ORDER BY order_index, code",
                (),
            )
            .await?;

        let mut indicators = Vec::new();
        while let Some(row) = rows.next().await? {
            indicators.push(Self::row_to_indicator(&row)?);
        }
        Ok(indicators)
    }

    async fn create_project(&self, project: &NewProject) -> Result<Project> {
        debug!("Creating project '{}' ({})", project.title, project.year);

        let now = Utc::now();
        let created = Project {
            id: ProjectId::new(),
            school_id: project.school_id,
            title: project.title.clone(),
            year: project.year,
            description: project.description.clone(),
            status: ProjectStatus::Draft,
            start_date: None,
            end_date: None,
            created_at: now,
            updated_at: now,
        };

        let conn = self.conn().await?;
        conn.execute(
            &format!(
                "INSERT INTO projects ({}) VALUES (?, ?, ?, ?, ?, ?, NULL, NULL, ?, ?)",
                PROJECT_COLUMNS
            ),
            params![
                created.id.to_string(),
                created.school_id.to_string(),
                created.title.clone(),
                created.year as i64,
                created.description.clone(),
                created.status.as_str(),
                ts(now),
                ts(now),
            ],
        )
        .await?;

        Ok(created)
    }

    async fn get_project(&self, id: ProjectId) -> Result<Project> {
        let conn = self.conn().await?;
        let mut rows = conn
            .query(
                &format!("SELECT {} FROM projects WHERE id = ?", PROJECT_COLUMNS),
                params![id.to_string()],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| EvalError::not_found("project", id))?;
        Self::row_to_project(&row)
    }

    async fn list_projects(&self, school_id: SchoolId) -> Result<Vec<Project>> {
        let conn = self.conn().await?;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {} FROM projects WHERE school_id = ? ORDER BY year DESC, created_at DESC",
                    PROJECT_COLUMNS
                ),
                params![school_id.to_string()],
            )
            .await?;

        let mut projects = Vec::new();
        while let Some(row) = rows.next().await? {
            projects.push(Self::row_to_project(&row)?);
        }
        Ok(projects)
    }

    async fn update_project_status(
        &self,
        id: ProjectId,
        status: ProjectStatus,
    ) -> Result<Project> {
        let conn = self.conn().await?;
        let changed = conn
            .execute(
                "UPDATE projects SET status = ?, updated_at = ? WHERE id = ?",
                params![status.as_str(), ts(Utc::now()), id.to_string()],
            )
            .await?;
        if changed == 0 {
            return Err(EvalError::not_found("project", id));
        }
        self.get_project(id).await
    }

    async fn insert_questions(&self, questions: &[NewQuestion]) -> Result<usize> {
        if questions.is_empty() {
            return Ok(0);
        }

        let now = ts(Utc::now());
        let conn = self.conn().await?;
        let tx = conn.transaction().await?;
        for q in questions {
            let options = q.options.as_ref().map(serde_json::to_string).transpose()?;
            tx.execute(
                &format!(
                    "INSERT INTO questions ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                    QUESTION_COLUMNS
                ),
                params![
                    QuestionId::new().to_string(),
                    q.project_id.to_string(),
                    q.indicator_id.map(|id| id.to_string()),
                    q.respondent_type.as_str(),
                    q.question_text.clone(),
                    q.question_type.as_str(),
                    options,
                    q.section_name.clone(),
                    q.description.clone(),
                    q.image_url.clone(),
                    q.order_index,
                    if q.is_required { 1i64 } else { 0i64 },
                    now.clone(),
                    now.clone(),
                ],
            )
            .await?;
        }
        tx.commit().await?;

        debug!("Inserted {} questions", questions.len());
        Ok(questions.len())
    }

    async fn list_questions(
        &self,
        project_id: ProjectId,
        respondent_type: Option<RespondentType>,
    ) -> Result<Vec<Question>> {
        let conn = self.conn().await?;
        let mut rows = match respondent_type {
            Some(t) => {
                conn.query(
                    &format!(
                        "SELECT {} FROM questions WHERE project_id = ? AND respondent_type = ? ORDER BY order_index, created_at",
                        QUESTION_COLUMNS
                    ),
                    params![project_id.to_string(), t.as_str()],
                )
                .await?
            }
            None => {
                conn.query(
                    &format!(
                        "SELECT {} FROM questions WHERE project_id = ? ORDER BY order_index, respondent_type",
                        QUESTION_COLUMNS
                    ),
                    params![project_id.to_string()],
                )
                .await?
            }
        };

        let mut questions = Vec::new();
        while let Some(row) = rows.next().await? {
            questions.push(Self::row_to_question(&row)?);
        }
        Ok(questions)
    }

    async fn get_question(&self, id: QuestionId) -> Result<Question> {
        let conn = self.conn().await?;
        let mut rows = conn
            .query(
                &format!("SELECT {} FROM questions WHERE id = ?", QUESTION_COLUMNS),
                params![id.to_string()],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| EvalError::not_found("question", id))?;
        Self::row_to_question(&row)
    }

    async fn update_question(&self, question: &Question) -> Result<Question> {
        let options = question
            .options
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let conn = self.conn().await?;
        let changed = conn
            .execute(
                "UPDATE questions SET indicator_id = ?, respondent_type = ?, question_text = ?,
                 question_type = ?, options = ?, section_name = ?, description = ?, image_url = ?,
                 order_index = ?, is_required = ?, updated_at = ?
                 WHERE id = ?",
                params![
                    question.indicator_id.map(|id| id.to_string()),
                    question.respondent_type.as_str(),
                    question.question_text.clone(),
                    question.question_type.as_str(),
                    options,
                    question.section_name.clone(),
                    question.description.clone(),
                    question.image_url.clone(),
                    question.order_index,
                    if question.is_required { 1i64 } else { 0i64 },
                    ts(Utc::now()),
                    question.id.to_string(),
                ],
            )
            .await?;
        if changed == 0 {
            return Err(EvalError::not_found("question", question.id));
        }
        self.get_question(question.id).await
    }

    async fn delete_question(&self, id: QuestionId) -> Result<()> {
        let conn = self.conn().await?;
        let deleted = conn
            .execute("DELETE FROM questions WHERE id = ?", params![id.to_string()])
            .await?;
        if deleted == 0 {
            return Err(EvalError::not_found("question", id));
        }
        debug!("Deleted question {}", id);
        Ok(())
    }

    async fn insert_responses(&self, responses: &[NewResponse]) -> Result<usize> {
        if responses.is_empty() {
            return Ok(0);
        }

        let now = ts(Utc::now());
        let conn = self.conn().await?;
        let tx = conn.transaction().await?;
        for r in responses {
            let data = r
                .response_data
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?;
            tx.execute(
                "INSERT INTO responses (id, project_id, question_id, respondent_type, session_id, response_value, response_data, created_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    Uuid::new_v4().to_string(),
                    r.project_id.to_string(),
                    r.question_id.to_string(),
                    r.respondent_type.as_str(),
                    r.session_id.clone(),
                    r.response_value.clone(),
                    data,
                    now.clone(),
                ],
            )
            .await?;
        }
        tx.commit().await?;

        debug!("Inserted {} responses", responses.len());
        Ok(responses.len())
    }

    async fn list_answered(&self, project_id: ProjectId) -> Result<Vec<AnsweredQuestion>> {
        let conn = self.conn().await?;
        let mut rows = conn
            .query(
                "SELECT r.respondent_type, r.response_value, q.question_type, q.question_text,
                        q.section_name, i.code
                 FROM responses r
                 JOIN questions q ON q.id = r.question_id
                 LEFT JOIN indicators i ON i.id = q.indicator_id
                 WHERE r.project_id = ?
                 ORDER BY r.created_at",
                params![project_id.to_string()],
            )
            .await?;

        let mut answered = Vec::new();
        while let Some(row) = rows.next().await? {
            answered.push(AnsweredQuestion {
                respondent_type: row.get::<String>(0)?.parse()?,
                response_value: row.get(1)?,
                question_type: row.get::<String>(2)?.parse()?,
                question_text: row.get(3)?,
                section_name: row.get(4)?,
                indicator_code: row.get(5)?,
            });
        }
        Ok(answered)
    }

    async fn create_survey_link(&self, link: &SurveyLink) -> Result<()> {
        let conn = self.conn().await?;
        conn.execute(
            &format!(
                "INSERT INTO survey_links ({}) VALUES (?, ?, ?, ?, ?, ?, ?)",
                LINK_COLUMNS
            ),
            params![
                link.id.to_string(),
                link.project_id.to_string(),
                link.respondent_type.as_str(),
                link.access_code.clone(),
                if link.is_active { 1i64 } else { 0i64 },
                link.expires_at.map(ts),
                ts(link.created_at),
            ],
        )
        .await?;
        Ok(())
    }

    async fn find_survey_link(&self, access_code: &str) -> Result<Option<SurveyLink>> {
        let conn = self.conn().await?;
        let mut rows = conn
            .query(
                &format!("SELECT {} FROM survey_links WHERE access_code = ?", LINK_COLUMNS),
                params![access_code],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(Self::row_to_link(&row)?)),
            None => Ok(None),
        }
    }

    async fn get_survey_link(&self, id: SurveyLinkId) -> Result<SurveyLink> {
        let conn = self.conn().await?;
        let mut rows = conn
            .query(
                &format!("SELECT {} FROM survey_links WHERE id = ?", LINK_COLUMNS),
                params![id.to_string()],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| EvalError::not_found("survey link", id))?;
        Self::row_to_link(&row)
    }

    async fn list_survey_links(&self, project_id: ProjectId) -> Result<Vec<SurveyLink>> {
        let conn = self.conn().await?;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {} FROM survey_links WHERE project_id = ? ORDER BY created_at",
                    LINK_COLUMNS
                ),
                params![project_id.to_string()],
            )
            .await?;

        let mut links = Vec::new();
        while let Some(row) = rows.next().await? {
            links.push(Self::row_to_link(&row)?);
        }
        Ok(links)
    }

    async fn set_survey_link_active(&self, id: SurveyLinkId, active: bool) -> Result<SurveyLink> {
        let conn = self.conn().await?;
        let changed = conn
            .execute(
                "UPDATE survey_links SET is_active = ? WHERE id = ?",
                params![if active { 1i64 } else { 0i64 }, id.to_string()],
            )
            .await?;
        if changed == 0 {
            return Err(EvalError::not_found("survey link", id));
        }
        self.get_survey_link(id).await
    }
}
