use crate::{error::ApiError, schema::categories};

#[derive(Queryable, Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Category {
  pub id: i64,
  pub name: String,
  pub description: String,
}

#[derive(Insertable)]
#[diesel(table_name = categories)]
pub struct NewCategory {
  pub name: String,
  pub description: String,
}

#[derive(Deserialize, Default)]
pub struct CategoryRequest {
  pub name: Option<String>,
  pub description: Option<String>,
}

#[derive(AsChangeset, Default, Debug, PartialEq)]
#[diesel(table_name = categories)]
pub struct CategoryChangeset {
  pub name: Option<String>,
  pub description: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
  value.filter(|value| !value.trim().is_empty())
}

impl CategoryRequest {
  pub fn into_new_category(self) -> Result<NewCategory, ApiError> {
    match (non_empty(self.name), non_empty(self.description)) {
      (Some(name), Some(description)) => Ok(NewCategory { name, description }),
      _ => Err(ApiError::validation("Name and description are required.")),
    }
  }

  pub fn into_changeset(self) -> Result<CategoryChangeset, ApiError> {
    let changeset = CategoryChangeset {
      name: non_empty(self.name),
      description: non_empty(self.description),
    };
    if changeset == CategoryChangeset::default() {
      return Err(ApiError::validation("No fields to update."));
    }
    Ok(changeset)
  }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryResponse {
  pub category_id: i64,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct CategoryPage {
  pub data: Vec<Category>,
  pub total: i64,
  pub page: i64,
  pub limit: i64,
}

#[derive(Serialize, Deserialize)]
pub struct CategoryId {
  pub id: i64,
}

#[test]
fn test_category_request_validation() {
  let missing = CategoryRequest {
    name: Some(String::from("Music")),
    description: Some(String::from("   ")),
  };
  assert!(matches!(
    missing.into_new_category(),
    Err(ApiError::Validation(_))
  ));

  let partial = CategoryRequest {
    description: Some(String::from("Concerts and gigs")),
    ..Default::default()
  }
  .into_changeset()
  .unwrap();
  assert_eq!(partial.name, None);
  assert_eq!(partial.description.as_deref(), Some("Concerts and gigs"));

  assert!(matches!(
    CategoryRequest::default().into_changeset(),
    Err(ApiError::Validation(_))
  ));
}
