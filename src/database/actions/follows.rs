use sqlx::{Pool, Postgres};

use crate::constants::SUBSCRIPTION_COUNT_PER_PAGE;
use crate::database::error::QueryError;
use crate::database::pagination::PageContext;
use crate::database::schema::{FollowedAuthorRow, RecipeSummary, SubscriptionEntry, Uuid};
use crate::error::{ApiError, Error};

use super::get_user_by_id;

pub async fn is_following(
    user_id: Uuid,
    following_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<bool, Error> {
    let result: Option<(Uuid,)> = sqlx::query_as(
        "SELECT following_id FROM user_follows WHERE user_id = $1 AND following_id = $2",
    )
    .bind(user_id)
    .bind(following_id)
    .fetch_optional(&*pool)
    .await
    .map_err(|e| QueryError::from(e))?;

    Ok(result.is_some())
}

/// Self-follow is rejected outright; duplicate follows are decided by the
/// uniqueness constraint, same as the recipe relations.
pub async fn follow_user(
    user_id: Uuid,
    following_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    if user_id == following_id {
        return Err(ApiError::InvalidRequest.new("Cannot subscribe to yourself"));
    }

    if get_user_by_id(pool, following_id).await?.is_none() {
        return Err(ApiError::NotFound.new("No user exists with specified id"));
    }

    let result = sqlx::query(
        "INSERT INTO user_follows (user_id, following_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(user_id)
    .bind(following_id)
    .execute(pool)
    .await
    .map_err(|e| QueryError::from(e))?;

    if result.rows_affected() <= 0 {
        return Err(ApiError::Conflict.new("Already subscribed to this user"));
    }

    Ok(())
}

pub async fn unfollow_user(
    user_id: Uuid,
    following_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    let result =
        sqlx::query("DELETE FROM user_follows WHERE user_id = $1 AND following_id = $2")
            .bind(user_id)
            .bind(following_id)
            .execute(pool)
            .await
            .map_err(|e| QueryError::from(e))?;

    if result.rows_affected() <= 0 {
        return Err(ApiError::NotFound.new("Not subscribed to this user"));
    }

    Ok(())
}

pub async fn list_author_recipes(
    author_id: Uuid,
    limit: Option<i64>,
    pool: &Pool<Postgres>,
) -> Result<Vec<RecipeSummary>, Error> {
    let rows: Vec<RecipeSummary> = match limit {
        Some(limit) => {
            sqlx::query_as("SELECT id, name, image, cooking_time FROM recipes WHERE author_id = $1 ORDER BY id LIMIT $2")
                .bind(author_id)
                .bind(limit)
                .fetch_all(pool)
                .await
                .map_err(|e| QueryError::from(e))?
        }
        None => {
            sqlx::query_as("SELECT id, name, image, cooking_time FROM recipes WHERE author_id = $1 ORDER BY id")
                .bind(author_id)
                .fetch_all(pool)
                .await
                .map_err(|e| QueryError::from(e))?
        }
    };

    Ok(rows)
}

pub async fn count_author_recipes(author_id: Uuid, pool: &Pool<Postgres>) -> Result<i64, Error> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM recipes WHERE author_id = $1")
        .bind(author_id)
        .fetch_one(pool)
        .await
        .map_err(|e| QueryError::from(e))?;

    Ok(row.0)
}

/// Pages the followed authors, each enriched with their recipes (capped at
/// `recipes_limit`) and the uncapped total. `is_subscribed` is recomputed
/// rather than trusted; in this listing it is true by construction.
pub async fn fetch_subscriptions(
    user_id: Uuid,
    recipes_limit: Option<i64>,
    offset: i64,
    pool: &Pool<Postgres>,
) -> Result<PageContext<SubscriptionEntry>, Error> {
    let rows: Vec<FollowedAuthorRow> = sqlx::query_as(
        "
        SELECT u.id, u.username, u.email, u.first_name, u.last_name, COUNT(*) OVER() AS count
        FROM user_follows f
        INNER JOIN users u ON u.id = f.following_id
        WHERE f.user_id = $1
        ORDER BY u.id
        LIMIT $2 OFFSET $3
    ",
    )
    .bind(user_id)
    .bind(SUBSCRIPTION_COUNT_PER_PAGE)
    .bind(offset)
    .fetch_all(pool)
    .await
    .map_err(|e| QueryError::from(e))?;

    let total_count = rows.get(0).map(|r| r.count).unwrap_or(0);

    let mut entries: Vec<SubscriptionEntry> = Vec::with_capacity(rows.len());
    for author in rows {
        let recipes = list_author_recipes(author.id, recipes_limit, pool).await?;
        let recipes_count = count_author_recipes(author.id, pool).await?;

        entries.push(SubscriptionEntry {
            id: author.id,
            username: author.username,
            email: author.email,
            first_name: author.first_name,
            last_name: author.last_name,
            is_subscribed: true,
            recipes,
            recipes_count,
        });
    }

    let page = PageContext::from_rows(entries, total_count, SUBSCRIPTION_COUNT_PER_PAGE, offset);
    Ok(page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    #[tokio::test]
    async fn self_follow_is_rejected_before_any_query() {
        // Lazy pool: never connects, so reaching the database would fail the
        // test with a connection error instead of the expected 400.
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unreachable")
            .unwrap();

        let error = follow_user(7, 7, &pool).await.unwrap_err();
        assert_eq!(error.code, 400);
        assert_eq!(error.info.as_deref(), Some("Cannot subscribe to yourself"));
    }
}
