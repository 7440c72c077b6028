use sqlx::{Pool, Postgres};

use crate::database::error::QueryError;
use crate::database::schema::{RecipeSummary, Uuid};
use crate::error::{ApiError, Error};

use super::get_recipe_summary;

/// The favorite and shopping-cart relations share one contract; the kind
/// resolves statically to the table it targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    Favorite,
    ShoppingCart,
}

impl RelationKind {
    pub const fn table(self) -> &'static str {
        match self {
            RelationKind::Favorite => "user_favorites",
            RelationKind::ShoppingCart => "user_shopping_cart",
        }
    }

    fn conflict_info(self) -> &'static str {
        match self {
            RelationKind::Favorite => "Recipe is already in favorites",
            RelationKind::ShoppingCart => "Recipe is already in the shopping cart",
        }
    }

    fn missing_info(self) -> &'static str {
        match self {
            RelationKind::Favorite => "Recipe is not in favorites",
            RelationKind::ShoppingCart => "Recipe is not in the shopping cart",
        }
    }
}

pub async fn has_relation(
    kind: RelationKind,
    recipe_id: Uuid,
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<bool, Error> {
    let result: Option<(Uuid,)> = sqlx::query_as(&format!(
        "SELECT recipe_id FROM {} WHERE recipe_id = $1 AND user_id = $2",
        kind.table()
    ))
    .bind(recipe_id)
    .bind(user_id)
    .fetch_optional(&*pool)
    .await
    .map_err(|e| QueryError::from(e))?;

    Ok(result.is_some())
}

/// The existence pre-check is a nicety; the table's uniqueness constraint is
/// what actually decides a concurrent double-add, so zero affected rows is
/// the authoritative conflict signal.
pub async fn add_relation(
    kind: RelationKind,
    recipe_id: Uuid,
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<RecipeSummary, Error> {
    let summary = get_recipe_summary(recipe_id, pool)
        .await?
        .ok_or(ApiError::NotFound.new("No recipe exists with specified id"))?;

    let result = sqlx::query(&format!(
        "INSERT INTO {} (user_id, recipe_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        kind.table()
    ))
    .bind(user_id)
    .bind(recipe_id)
    .execute(pool)
    .await
    .map_err(|e| QueryError::from(e))?;

    if result.rows_affected() <= 0 {
        return Err(ApiError::Conflict.new(kind.conflict_info()));
    }

    Ok(summary)
}

pub async fn remove_relation(
    kind: RelationKind,
    recipe_id: Uuid,
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    if get_recipe_summary(recipe_id, pool).await?.is_none() {
        return Err(ApiError::NotFound.new("No recipe exists with specified id"));
    }

    let result = sqlx::query(&format!(
        "DELETE FROM {} WHERE user_id = $1 AND recipe_id = $2",
        kind.table()
    ))
    .bind(user_id)
    .bind(recipe_id)
    .execute(pool)
    .await
    .map_err(|e| QueryError::from(e))?;

    if result.rows_affected() <= 0 {
        return Err(ApiError::NotFound.new(kind.missing_info()));
    }

    Ok(())
}

pub async fn is_favorite(
    recipe_id: Uuid,
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<bool, Error> {
    has_relation(RelationKind::Favorite, recipe_id, user_id, pool).await
}

pub async fn is_in_shopping_cart(
    recipe_id: Uuid,
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<bool, Error> {
    has_relation(RelationKind::ShoppingCart, recipe_id, user_id, pool).await
}

pub async fn add_to_favorites(
    recipe_id: Uuid,
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<RecipeSummary, Error> {
    add_relation(RelationKind::Favorite, recipe_id, user_id, pool).await
}

pub async fn remove_from_favorites(
    recipe_id: Uuid,
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    remove_relation(RelationKind::Favorite, recipe_id, user_id, pool).await
}

pub async fn add_to_shopping_cart(
    recipe_id: Uuid,
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<RecipeSummary, Error> {
    add_relation(RelationKind::ShoppingCart, recipe_id, user_id, pool).await
}

pub async fn remove_from_shopping_cart(
    recipe_id: Uuid,
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    remove_relation(RelationKind::ShoppingCart, recipe_id, user_id, pool).await
}
