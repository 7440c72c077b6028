use std::collections::HashMap;

use sqlx::{Pool, Postgres};
use warp::reply::Reply;

use crate::constants::{SHOPPING_LIST_CONTENT_TYPE, SHOPPING_LIST_FILENAME};
use crate::database::error::QueryError;
use crate::database::schema::{CartIngredientRow, ShoppingListRow, Uuid};
use crate::error::Error;

/// Expands the user's cart into one row per ingredient occurrence, in
/// (recipe, ingredient) order so the reduction below is deterministic.
pub async fn fetch_cart_ingredients(
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<Vec<CartIngredientRow>, Error> {
    let rows: Vec<CartIngredientRow> = sqlx::query_as(
        "
        SELECT i.name AS name, i.measurement_unit AS measurement_unit, ri.amount AS amount
        FROM user_shopping_cart sc
        INNER JOIN recipe_ingredients ri ON ri.recipe_id = sc.recipe_id
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE sc.user_id = $1
        ORDER BY sc.recipe_id, ri.ingredient_id
    ",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(|e| QueryError::from(e))?;

    Ok(rows)
}

/// Groups by (name, measurement_unit) in first-occurrence order, summing
/// amounts. An empty cart reduces to an empty list.
pub fn aggregate_shopping_list(rows: Vec<CartIngredientRow>) -> Vec<ShoppingListRow> {
    let mut index: HashMap<(String, String), usize> = HashMap::new();
    let mut list: Vec<ShoppingListRow> = vec![];

    for row in rows {
        let key = (row.name.clone(), row.measurement_unit.clone());
        match index.get(&key) {
            Some(at) => list[*at].total_amount += row.amount as i64,
            None => {
                index.insert(key, list.len());
                list.push(ShoppingListRow {
                    name: row.name,
                    measurement_unit: row.measurement_unit,
                    total_amount: row.amount as i64,
                });
            }
        }
    }

    list
}

pub fn render_shopping_list(rows: &[ShoppingListRow]) -> String {
    rows.iter()
        .map(|row| format!("{} {} {}", row.name, row.total_amount, row.measurement_unit))
        .collect::<Vec<String>>()
        .join("\n")
}

pub async fn generate_shopping_list(
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<String, Error> {
    let rows = fetch_cart_ingredients(user_id, pool).await?;
    let list = aggregate_shopping_list(rows);

    log::debug!(
        "Generated shopping list for user {user_id}: {} ingredients",
        list.len()
    );

    Ok(render_shopping_list(&list))
}

/// Wraps a rendered list as the plain-text attachment the download endpoint
/// serves.
pub fn shopping_list_reply(content: String) -> impl Reply {
    let reply = warp::reply::with_header(content, "Content-Type", SHOPPING_LIST_CONTENT_TYPE);
    warp::reply::with_header(
        reply,
        "Content-Disposition",
        format!("attachment; filename={SHOPPING_LIST_FILENAME}"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, unit: &str, amount: i32) -> CartIngredientRow {
        CartIngredientRow {
            name: name.to_string(),
            measurement_unit: unit.to_string(),
            amount,
        }
    }

    #[test]
    fn sums_across_recipes_by_name_and_unit() {
        // Recipe A: flour 200 g, egg 2 pc. Recipe B: flour 100 g, sugar 50 g.
        let rows = vec![
            row("flour", "g", 200),
            row("egg", "pc", 2),
            row("flour", "g", 100),
            row("sugar", "g", 50),
        ];

        let list = aggregate_shopping_list(rows);
        assert_eq!(
            list,
            vec![
                ShoppingListRow {
                    name: String::from("flour"),
                    measurement_unit: String::from("g"),
                    total_amount: 300,
                },
                ShoppingListRow {
                    name: String::from("egg"),
                    measurement_unit: String::from("pc"),
                    total_amount: 2,
                },
                ShoppingListRow {
                    name: String::from("sugar"),
                    measurement_unit: String::from("g"),
                    total_amount: 50,
                },
            ]
        );
    }

    #[test]
    fn same_name_different_unit_stays_separate() {
        let rows = vec![row("milk", "ml", 200), row("milk", "pc", 1)];
        let list = aggregate_shopping_list(rows);
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].total_amount, 200);
        assert_eq!(list[1].total_amount, 1);
    }

    #[test]
    fn empty_cart_is_empty_output() {
        let list = aggregate_shopping_list(vec![]);
        assert!(list.is_empty());
        assert_eq!(render_shopping_list(&list), "");
    }

    #[test]
    fn groups_keep_first_occurrence_order() {
        let rows = vec![
            row("sugar", "g", 10),
            row("flour", "g", 100),
            row("sugar", "g", 5),
        ];

        let list = aggregate_shopping_list(rows);
        let names: Vec<&str> = list.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["sugar", "flour"]);
        assert_eq!(list[0].total_amount, 15);
    }

    #[test]
    fn renders_one_line_per_group() {
        let list = vec![
            ShoppingListRow {
                name: String::from("flour"),
                measurement_unit: String::from("g"),
                total_amount: 300,
            },
            ShoppingListRow {
                name: String::from("egg"),
                measurement_unit: String::from("pc"),
                total_amount: 2,
            },
        ];

        assert_eq!(render_shopping_list(&list), "flour 300 g\negg 2 pc");
    }
}
