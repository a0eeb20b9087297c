use diesel::{dsl::count_star, prelude::*};
use rocket::{http::Status, response::status::Custom, serde::json::Json, Route};

use crate::{
  error::{ApiError, ApiResult},
  models::{
    category::{Category, CategoryId, CategoryPage, CategoryRequest, CreateCategoryResponse},
    user::AuthenticatedUser,
    MessageResponse, PageWindow,
  },
  EventBoardDbConn,
};

const DEFAULT_PAGE_SIZE: i64 = 15;

pub fn routes() -> Vec<Route> {
  routes![
    create_category,
    list_categories,
    get_category,
    update_category,
    delete_category,
    get_category_id_by_name
  ]
}

fn duplicate_name() -> ApiError {
  ApiError::validation("Category name already exists.")
}

#[post("/", data = "<category_request>")]
pub async fn create_category(
  conn: EventBoardDbConn,
  caller: Result<AuthenticatedUser, ApiError>,
  category_request: Json<CategoryRequest>,
) -> ApiResult<Custom<Json<CreateCategoryResponse>>> {
  use crate::{db_util::last_inserted_id, schema::categories};

  caller?;
  let new_category = category_request.into_inner().into_new_category()?;

  let category_id = conn
    .run(move |conn| -> QueryResult<i64> {
      conn.transaction(|conn| {
        diesel::insert_into(categories::table)
          .values(&new_category)
          .execute(conn)?;
        last_inserted_id(conn)
      })
    })
    .await
    .map_err(|err| ApiError::on_unique_violation(err, duplicate_name()))?;
  info!("Created category {}", category_id);

  Ok(Custom(
    Status::Created,
    Json(CreateCategoryResponse { category_id }),
  ))
}

#[get("/?<page>&<limit>")]
pub async fn list_categories(
  conn0: EventBoardDbConn,
  conn1: EventBoardDbConn,
  page: Option<i64>,
  limit: Option<i64>,
) -> ApiResult<Json<CategoryPage>> {
  use crate::schema::categories;

  let window = PageWindow::zero_based(page, limit, DEFAULT_PAGE_SIZE);
  let (data, total) = tokio::try_join!(
    conn0.run(move |conn| {
      categories::table
        .order(categories::dsl::id.asc())
        .limit(window.limit)
        .offset(window.offset)
        .load::<Category>(conn)
    }),
    conn1.run(|conn| {
      categories::table
        .select(count_star())
        .get_result::<i64>(conn)
    }),
  )?;

  Ok(Json(CategoryPage {
    data,
    total,
    page: window.page,
    limit: window.limit,
  }))
}

#[get("/<category_id>")]
pub async fn get_category(conn: EventBoardDbConn, category_id: i64) -> ApiResult<Json<Category>> {
  use crate::schema::categories;

  conn
    .run(move |conn| categories::table.find(category_id).first(conn).optional())
    .await?
    .map(Json)
    .ok_or_else(|| ApiError::not_found("Category not found."))
}

#[patch("/<category_id>", data = "<category_request>")]
pub async fn update_category(
  conn: EventBoardDbConn,
  caller: Result<AuthenticatedUser, ApiError>,
  category_id: i64,
  category_request: Json<CategoryRequest>,
) -> ApiResult<Json<MessageResponse>> {
  use crate::schema::categories;

  caller?;
  let changeset = category_request.into_inner().into_changeset()?;

  let updated_rows = conn
    .run(move |conn| {
      diesel::update(categories::table.find(category_id))
        .set(&changeset)
        .execute(conn)
    })
    .await
    .map_err(|err| ApiError::on_unique_violation(err, duplicate_name()))?;
  if updated_rows == 0 {
    return Err(ApiError::not_found("Category not found."));
  }

  Ok(Json(MessageResponse::new("Category updated successfully.")))
}

#[delete("/<category_id>")]
pub async fn delete_category(
  conn: EventBoardDbConn,
  caller: Result<AuthenticatedUser, ApiError>,
  category_id: i64,
) -> ApiResult<Json<MessageResponse>> {
  use crate::schema::{categories, events};

  caller?;
  conn
    .run(move |conn| {
      conn.transaction::<_, ApiError, _>(|conn| {
        let exists: Option<i64> = categories::table
          .find(category_id)
          .select(categories::dsl::id)
          .first(conn)
          .optional()?;
        if exists.is_none() {
          return Err(ApiError::not_found("Category not found."));
        }

        let event_count: i64 = events::table
          .filter(events::dsl::category_id.eq(category_id))
          .select(count_star())
          .get_result(conn)?;
        if event_count > 0 {
          return Err(ApiError::validation(
            "Cannot delete a category that still has events.",
          ));
        }

        diesel::delete(categories::table.find(category_id)).execute(conn)?;
        Ok(())
      })
    })
    .await?;
  info!("Deleted category {}", category_id);

  Ok(Json(MessageResponse::new("Category deleted successfully.")))
}

#[get("/getIdByName/<name>")]
pub async fn get_category_id_by_name(
  conn: EventBoardDbConn,
  name: String,
) -> ApiResult<Json<CategoryId>> {
  use crate::schema::categories;

  let id: Option<i64> = conn
    .run(move |conn| {
      categories::table
        .filter(categories::dsl::name.eq(name))
        .select(categories::dsl::id)
        .first(conn)
        .optional()
    })
    .await?;
  id.map(|id| Json(CategoryId { id }))
    .ok_or_else(|| ApiError::not_found("Category not found."))
}
