use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::TypeError;

pub type Uuid = i32;

#[derive(
    Clone, Debug, PartialEq, PartialOrd, sqlx::Type, Serialize, Eq, Ord, Hash, Deserialize,
)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    User,
    Admin,
}

impl TryFrom<Value> for UserRole {
    type Error = TypeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value.as_str() {
            Some(value) => match value {
                "user" => Ok(Self::User),
                "admin" => Ok(Self::Admin),
                _ => Err(TypeError::new("Invalid variant")),
            },
            None => return Err(TypeError::new("Failed to parse value as string")),
        }
    }
}

// Rows

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Ingredient {
    pub id: Uuid,
    pub name: String,
    pub measurement_unit: String,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct IngredientRow {
    pub id: Uuid,
    pub name: String,
    pub measurement_unit: String,

    pub count: i64,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub color: String,
    pub slug: String,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Recipe {
    pub id: Uuid,
    pub author_id: Uuid,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct RecipeRow {
    pub id: Uuid,
    pub author_id: Uuid,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,

    pub count: i64,
}

/// Compact recipe body returned by relation adds and embedded in
/// subscription entries.
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct RecipeSummary {
    pub id: Uuid,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct RecipeIngredient {
    pub ingredient_id: Uuid,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct CartIngredientRow {
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShoppingListRow {
    pub name: String,
    pub measurement_unit: String,
    pub total_amount: i64,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct FollowedAuthorRow {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,

    pub count: i64,
}

// Derived representations

#[derive(Debug, Clone, Serialize)]
pub struct FullRecipe {
    pub id: Uuid,
    pub author: User,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
    pub tags: Vec<Tag>,
    pub ingredients: Vec<RecipeIngredient>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionEntry {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
    pub recipes: Vec<RecipeSummary>,
    pub recipes_count: i64,
}

// Drafts

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngredientAmount {
    pub id: Uuid,
    pub amount: i32,
}

impl TryFrom<Value> for IngredientAmount {
    type Error = TypeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let id = value
            .get("id")
            .and_then(|v| v.as_i64())
            .ok_or(TypeError::new("Failed to parse ingredient id"))?;
        let amount = value
            .get("amount")
            .and_then(|v| v.as_i64())
            .ok_or(TypeError::new("Failed to parse ingredient amount"))?;

        Ok(Self {
            id: id as Uuid,
            amount: amount as i32,
        })
    }
}

/// Unvalidated recipe payload. The author never travels in the draft; it is
/// taken from the session identity at persist time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeDraft {
    pub name: String,
    pub text: String,
    pub image: String,
    pub cooking_time: i32,
    pub tags: Vec<Uuid>,
    pub ingredients: Vec<IngredientAmount>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ingredient_amount_from_value() {
        let part = IngredientAmount::try_from(json!({"id": 3, "amount": 200})).unwrap();
        assert_eq!(part.id, 3);
        assert_eq!(part.amount, 200);
    }

    #[test]
    fn ingredient_amount_rejects_missing_fields() {
        assert!(IngredientAmount::try_from(json!({"id": 3})).is_err());
        assert!(IngredientAmount::try_from(json!({"amount": 1})).is_err());
        assert!(IngredientAmount::try_from(json!("flour")).is_err());
    }

    #[test]
    fn recipe_draft_from_json_body() {
        let draft: RecipeDraft = serde_json::from_value(json!({
            "name": "Pancakes",
            "text": "Mix and fry.",
            "image": "recipes/4c7fca8e.png",
            "cooking_time": 20,
            "tags": [1, 2],
            "ingredients": [{"id": 1, "amount": 200}, {"id": 2, "amount": 2}],
        }))
        .unwrap();

        assert_eq!(draft.name, "Pancakes");
        assert_eq!(draft.tags, vec![1, 2]);
        assert_eq!(draft.ingredients.len(), 2);
        assert_eq!(draft.ingredients[1].amount, 2);
    }

    #[test]
    fn user_role_from_value() {
        assert_eq!(
            UserRole::try_from(json!("admin")).unwrap(),
            UserRole::Admin
        );
        assert!(UserRole::try_from(json!("creator")).is_err());
        assert!(UserRole::try_from(json!(3)).is_err());
    }
}
