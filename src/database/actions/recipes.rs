use sqlx::{Pool, Postgres, QueryBuilder, Transaction};

use crate::constants::RECIPE_COUNT_PER_PAGE;
use crate::database::error::QueryError;
use crate::database::pagination::PageContext;
use crate::database::schema::{
    FullRecipe, IngredientAmount, Recipe, RecipeDraft, RecipeIngredient, RecipeRow,
    RecipeSummary, Uuid,
};
use crate::database::validation;
use crate::error::{ApiError, Error};
use crate::jwt::SessionData;

use super::{
    get_user_by_id, is_favorite, is_in_shopping_cart, list_recipe_tags, resolve_ingredient_ids,
    resolve_tag_ids,
};

pub async fn get_recipe(id: Uuid, pool: &Pool<Postgres>) -> Result<Option<Recipe>, Error> {
    let row: Option<Recipe> = sqlx::query_as("SELECT * FROM recipes WHERE id = $1")
        .bind(id)
        .fetch_optional(&*pool)
        .await
        .map_err(|e| QueryError::from(e))?;

    Ok(row)
}

pub async fn get_recipe_summary(
    id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<Option<RecipeSummary>, Error> {
    let row: Option<RecipeSummary> =
        sqlx::query_as("SELECT id, name, image, cooking_time FROM recipes WHERE id = $1")
            .bind(id)
            .fetch_optional(&*pool)
            .await
            .map_err(|e| QueryError::from(e))?;

    Ok(row)
}

/// Fetches a recipe for mutation. The author is the only identity allowed
/// through; everyone else gets `Forbidden` without the recipe being touched.
pub async fn get_recipe_mut(
    id: Uuid,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<Recipe, Error> {
    let recipe = get_recipe(id, pool).await?;

    match recipe {
        Some(recipe) => {
            if recipe.author_id != session.user_id {
                Err(ApiError::Forbidden.new("Only the author can modify this recipe"))
            } else {
                Ok(recipe)
            }
        }
        None => Err(ApiError::NotFound.new("No recipe exists with specified id")),
    }
}

pub async fn fetch_recipes(
    author: Option<Uuid>,
    search: String,
    offset: i64,
    pool: &Pool<Postgres>,
) -> Result<PageContext<RecipeRow>, Error> {
    let rows: Vec<RecipeRow> = match author {
        Some(author) => {
            sqlx::query_as("SELECT r.id, r.author_id, r.name, r.image, r.cooking_time, COUNT(*) OVER() AS count FROM recipes r WHERE r.author_id = $1 AND r.name ILIKE $2 ORDER BY r.id LIMIT $3 OFFSET $4")
                .bind(author)
                .bind(format!("%{search}%"))
                .bind(RECIPE_COUNT_PER_PAGE)
                .bind(offset)
                .fetch_all(&*pool).await.map_err(|e| QueryError::from(e))?
        }
        None => {
            sqlx::query_as("SELECT r.id, r.author_id, r.name, r.image, r.cooking_time, COUNT(*) OVER() AS count FROM recipes r WHERE r.name ILIKE $1 ORDER BY r.id LIMIT $2 OFFSET $3")
                .bind(format!("%{search}%"))
                .bind(RECIPE_COUNT_PER_PAGE)
                .bind(offset)
                .fetch_all(&*pool).await.map_err(|e| QueryError::from(e))?
        }
    };

    let total_count = rows.get(0).map(|p| p.count).unwrap_or(0);
    let page = PageContext::from_rows(rows, total_count, RECIPE_COUNT_PER_PAGE, offset);
    Ok(page)
}

pub async fn list_recipe_ingredients(
    recipe_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<Vec<RecipeIngredient>, Error> {
    let rows: Vec<RecipeIngredient> = sqlx::query_as(
        "
        SELECT ri.ingredient_id AS ingredient_id, i.name AS name, i.measurement_unit AS measurement_unit, ri.amount AS amount
        FROM recipe_ingredients ri
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE ri.recipe_id = $1
        ORDER BY ri.ingredient_id
    ",
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await
    .map_err(|e| QueryError::from(e))?;

    Ok(rows)
}

/// Runs the full rule list against the catalogs. Completes before any write,
/// so a failing draft leaves no partial effect.
pub async fn validate_recipe_draft(
    draft: &RecipeDraft,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    let known_tags = resolve_tag_ids(&draft.tags, pool).await?;
    let ingredient_ids: Vec<Uuid> = draft.ingredients.iter().map(|part| part.id).collect();
    let known_ingredients = resolve_ingredient_ids(&ingredient_ids, pool).await?;

    validation::validate_draft(draft, &known_tags, &known_ingredients)?;
    Ok(())
}

async fn insert_recipe_ingredients(
    recipe_id: Uuid,
    parts: &[IngredientAmount],
    tr: &mut Transaction<'_, Postgres>,
) -> Result<(), Error> {
    let mut query_builder: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) ");

    query_builder.push_values(parts.iter(), |mut b, part| {
        b.push_bind(recipe_id).push_bind(part.id).push_bind(part.amount);
    });

    query_builder
        .build()
        .execute(&mut **tr)
        .await
        .map_err(|e| QueryError::from(e))?;

    Ok(())
}

async fn insert_recipe_tags(
    recipe_id: Uuid,
    tags: &[Uuid],
    tr: &mut Transaction<'_, Postgres>,
) -> Result<(), Error> {
    let mut query_builder: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO recipe_tags_map (recipe_id, tag_id) ");

    query_builder.push_values(tags.iter(), |mut b, tag_id| {
        b.push_bind(recipe_id).push_bind(*tag_id);
    });

    query_builder
        .build()
        .execute(&mut **tr)
        .await
        .map_err(|e| QueryError::from(e))?;

    Ok(())
}

/// Validates the draft, then persists the recipe row, its ingredient rows
/// and its tag set as one atomic unit. The author comes from the session,
/// never from the draft.
pub async fn create_recipe(
    draft: &RecipeDraft,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<Uuid, Error> {
    validate_recipe_draft(draft, pool).await?;

    let mut tr = pool
        .begin()
        .await
        .map_err(|_| QueryError::new("Could not start transaction".to_owned()))?;

    let id: (Uuid,) = sqlx::query_as(
        "
        INSERT INTO recipes (author_id, name, image, text, cooking_time)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
    ",
    )
    .bind(session.user_id)
    .bind(&draft.name)
    .bind(&draft.image)
    .bind(&draft.text)
    .bind(draft.cooking_time)
    .fetch_one(&mut *tr)
    .await
    .map_err(|e| QueryError::from(e))?;

    insert_recipe_ingredients(id.0, &draft.ingredients, &mut tr).await?;
    insert_recipe_tags(id.0, &draft.tags, &mut tr).await?;

    tr.commit().await.map_err(|e| {
        log::error!("Failed to commit recipe creation: {e}");
        QueryError::new("Could not commit transaction".to_owned())
    })?;

    Ok(id.0)
}

/// Author-only. The ingredient rows and the tag set are replaced wholesale
/// with the newly validated draft, in the same transaction as the row update.
pub async fn update_recipe(
    id: Uuid,
    draft: &RecipeDraft,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    let recipe = get_recipe_mut(id, session, pool).await?;
    validate_recipe_draft(draft, pool).await?;

    let mut tr = pool
        .begin()
        .await
        .map_err(|_| QueryError::new("Could not start transaction".to_owned()))?;

    sqlx::query("UPDATE recipes SET name = $1, image = $2, text = $3, cooking_time = $4 WHERE id = $5")
        .bind(&draft.name)
        .bind(&draft.image)
        .bind(&draft.text)
        .bind(draft.cooking_time)
        .bind(recipe.id)
        .execute(&mut *tr)
        .await
        .map_err(|e| QueryError::from(e))?;

    sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
        .bind(recipe.id)
        .execute(&mut *tr)
        .await
        .map_err(|e| QueryError::from(e))?;
    insert_recipe_ingredients(recipe.id, &draft.ingredients, &mut tr).await?;

    sqlx::query("DELETE FROM recipe_tags_map WHERE recipe_id = $1")
        .bind(recipe.id)
        .execute(&mut *tr)
        .await
        .map_err(|e| QueryError::from(e))?;
    insert_recipe_tags(recipe.id, &draft.tags, &mut tr).await?;

    tr.commit()
        .await
        .map_err(|_| QueryError::new("Could not commit transaction".to_owned()))?;

    Ok(())
}

/// Author-only. Cascades to the ingredient rows, the tag set and both
/// user relations before removing the recipe row itself.
pub async fn delete_recipe(
    id: Uuid,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    let recipe = get_recipe_mut(id, session, pool).await?;

    let mut tr = pool
        .begin()
        .await
        .map_err(|_| QueryError::new("Could not start transaction".to_owned()))?;

    sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
        .bind(recipe.id)
        .execute(&mut *tr)
        .await
        .map_err(|e| QueryError::from(e))?;

    sqlx::query("DELETE FROM recipe_tags_map WHERE recipe_id = $1")
        .bind(recipe.id)
        .execute(&mut *tr)
        .await
        .map_err(|e| QueryError::from(e))?;

    sqlx::query("DELETE FROM user_favorites WHERE recipe_id = $1")
        .bind(recipe.id)
        .execute(&mut *tr)
        .await
        .map_err(|e| QueryError::from(e))?;

    sqlx::query("DELETE FROM user_shopping_cart WHERE recipe_id = $1")
        .bind(recipe.id)
        .execute(&mut *tr)
        .await
        .map_err(|e| QueryError::from(e))?;

    sqlx::query("DELETE FROM recipes WHERE id = $1")
        .bind(recipe.id)
        .execute(&mut *tr)
        .await
        .map_err(|e| QueryError::from(e))?;

    tr.commit()
        .await
        .map_err(|_| QueryError::new("Could not commit transaction".to_owned()))?;

    Ok(())
}

/// Assembles the read representation. `is_favorited` and
/// `is_in_shopping_cart` are computed against the viewer; anonymous viewers
/// always see false.
pub async fn get_full_recipe(
    id: Uuid,
    viewer: Option<&SessionData>,
    pool: &Pool<Postgres>,
) -> Result<Option<FullRecipe>, Error> {
    let recipe = match get_recipe(id, pool).await? {
        Some(recipe) => recipe,
        None => return Ok(None),
    };

    let author = get_user_by_id(pool, recipe.author_id)
        .await?
        .ok_or(ApiError::InternalServerError.new("Recipe author is missing"))?;

    let tags = list_recipe_tags(recipe.id, pool).await?;
    let ingredients = list_recipe_ingredients(recipe.id, pool).await?;

    let (is_favorited, is_in_shopping_cart) = match viewer {
        Some(session) => (
            is_favorite(recipe.id, session.user_id, pool).await?,
            is_in_shopping_cart(recipe.id, session.user_id, pool).await?,
        ),
        None => (false, false),
    };

    Ok(Some(FullRecipe {
        id: recipe.id,
        author,
        name: recipe.name,
        image: recipe.image,
        text: recipe.text,
        cooking_time: recipe.cooking_time,
        tags,
        ingredients,
        is_favorited,
        is_in_shopping_cart,
    }))
}
