//! Database queries for applications.

use chrono::Utc;
use sea_orm::sea_query::{Condition, Expr, Func, LikeExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::entity::application::{self, ActiveModel, Entity as Application};
use crate::error::{AppError, AppResult};
use crate::models::ApplicationStatus;

use super::for_update;

/// Maximum number of rows returned by a search.
pub const SEARCH_LIMIT: u64 = 200;

/// Validated fields for a new application.
#[derive(Debug, Clone)]
pub struct NewApplication {
    pub horse_name_ru: Option<String>,
    pub horse_name_en: Option<String>,
    pub horse_year: i32,
    pub notes: String,
}

/// Insert a new application in `draft` with every flag cleared.
pub async fn insert<C: ConnectionTrait>(
    db: &C,
    new: NewApplication,
) -> AppResult<application::Model> {
    let model = ActiveModel {
        id: Set(Uuid::now_v7()),
        horse_name_ru: Set(new.horse_name_ru),
        horse_name_en: Set(new.horse_name_en),
        horse_year: Set(new.horse_year),
        status: Set(ApplicationStatus::Draft.as_str().to_string()),
        mare_ownership_confirmed: Set(false),
        genetic_done_through_association: Set(false),
        genetic_pending: Set(false),
        created_at: Set(Utc::now()),
        notes: Set(Some(new.notes)),
    };

    model
        .insert(db)
        .await
        .map_err(|e| AppError::Database(format!("Failed to insert application: {}", e)))
}

/// Get an application by ID.
pub async fn find_by_id<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
) -> AppResult<Option<application::Model>> {
    let result = Application::find_by_id(id)
        .one(db)
        .await
        .map_err(|e| AppError::Database(format!("Failed to get application: {}", e)))?;

    Ok(result)
}

/// Get an application by ID, locking the row until the transaction ends.
pub async fn find_for_update<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
) -> AppResult<Option<application::Model>> {
    let result = for_update(Application::find_by_id(id), db)
        .one(db)
        .await
        .map_err(|e| AppError::Database(format!("Failed to lock application: {}", e)))?;

    Ok(result)
}

/// Lower-cased substring pattern with `LIKE` wildcards escaped by `\`.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Newest applications first, optionally narrowed to names containing `term`
/// (case-insensitive). At most [`SEARCH_LIMIT`] rows.
pub async fn search<C: ConnectionTrait>(db: &C, term: &str) -> AppResult<Vec<application::Model>> {
    use sea_orm::sea_query::ExprTrait;

    let mut select = Application::find();

    if !term.is_empty() {
        let pattern = like_pattern(term);
        select = select.filter(
            Condition::any()
                .add(
                    Expr::expr(Func::lower(Expr::col(application::Column::HorseNameRu)))
                        .like(LikeExpr::new(pattern.clone()).escape('\\')),
                )
                .add(
                    Expr::expr(Func::lower(Expr::col(application::Column::HorseNameEn)))
                        .like(LikeExpr::new(pattern).escape('\\')),
                ),
        );
    }

    let rows = select
        .order_by_desc(application::Column::CreatedAt)
        .limit(SEARCH_LIMIT)
        .all(db)
        .await
        .map_err(|e| AppError::Database(format!("Failed to search applications: {}", e)))?;

    Ok(rows)
}

/// Overwrite the status column. Returns the number of rows touched.
pub async fn set_status<C: ConnectionTrait>(db: &C, id: Uuid, status: &str) -> AppResult<u64> {
    let result = Application::update_many()
        .col_expr(application::Column::Status, Expr::value(status))
        .filter(application::Column::Id.eq(id))
        .exec(db)
        .await
        .map_err(|e| AppError::Database(format!("Failed to update application status: {}", e)))?;

    Ok(result.rows_affected)
}
