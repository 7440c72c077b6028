use std::{collections::HashMap, str::FromStr};

use serde_json::Value;

use super::error::TypeError;
use super::schema::{IngredientAmount, RecipeDraft, Uuid};
use crate::error::Error;

pub type FormData = HashMap<String, Value>;

/// Loosely-typed request body: a JSON object pulled apart field by field,
/// with one distinct error per failed conversion.
pub struct Form {
    inner: HashMap<String, Value>,
}

impl Form {
    pub fn from_data(data: FormData) -> Self {
        Self { inner: data }
    }

    pub fn get_value<T>(&self, key: &str) -> Result<T, Error>
    where
        T: TryFrom<Value>,
    {
        match self.inner.get(key) {
            Some(value) => value
                .to_owned()
                .try_into()
                .map_err(|_e| Error::from(TypeError::new("Invalid type conversion"))),
            None => Err(Error::from(TypeError::new("Invalid key"))),
        }
    }

    pub fn get_number<T>(&self, key: &str) -> Result<T, Error>
    where
        T: FromStr,
    {
        match self.inner.get(key) {
            Some(value) => match value.as_str() {
                Some(v) => v
                    .to_owned()
                    .parse()
                    .map_err(|_e| Error::from(TypeError::new("Invalid type conversion"))),
                None => Err(Error::from(TypeError::new("Failed to parse value as str"))),
            },
            None => Err(Error::from(TypeError::new("Invalid key"))),
        }
    }

    pub fn get_int(&self, key: &str) -> Result<i64, TypeError> {
        match self.inner.get(key) {
            Some(value) => value
                .as_i64()
                .ok_or(TypeError::new("Failed to parse value as integer")),
            None => Err(TypeError::new("Invalid key")),
        }
    }

    pub fn get_str(&self, key: &str) -> Result<String, TypeError> {
        match self.inner.get(key) {
            Some(value) => match value.as_str() {
                Some(v) => Ok(v.to_string()),
                None => Err(TypeError::new("Invalid key")),
            },
            None => Err(TypeError::new("Invalid key")),
        }
    }

    pub fn get_list(&self, key: &str) -> Result<Vec<Value>, TypeError> {
        match self.inner.get(key) {
            Some(value) => match value.as_array() {
                Some(v) => Ok(v.to_owned()),
                None => Err(TypeError::new("Failed to parse value as list")),
            },
            None => Err(TypeError::new("Invalid key")),
        }
    }
}

impl RecipeDraft {
    pub fn from_form(form: &Form) -> Result<Self, Error> {
        let tags = form
            .get_list("tags")?
            .into_iter()
            .map(|value| {
                value
                    .as_i64()
                    .map(|id| id as Uuid)
                    .ok_or(TypeError::new("Failed to parse tag id"))
            })
            .collect::<Result<Vec<Uuid>, TypeError>>()?;

        let ingredients = form
            .get_list("ingredients")?
            .into_iter()
            .map(IngredientAmount::try_from)
            .collect::<Result<Vec<IngredientAmount>, TypeError>>()?;

        Ok(Self {
            name: form.get_str("name")?,
            text: form.get_str("text")?,
            image: form.get_str("image")?,
            cooking_time: form.get_int("cooking_time")? as i32,
            tags,
            ingredients,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn form(value: Value) -> Form {
        let data: FormData = serde_json::from_value(value).unwrap();
        Form::from_data(data)
    }

    #[test]
    fn draft_from_form() {
        let form = form(json!({
            "name": "Borscht",
            "text": "Simmer for an hour.",
            "image": "recipes/9b1de2aa.png",
            "cooking_time": 90,
            "tags": [2],
            "ingredients": [{"id": 5, "amount": 300}],
        }));

        let draft = RecipeDraft::from_form(&form).unwrap();
        assert_eq!(draft.name, "Borscht");
        assert_eq!(draft.cooking_time, 90);
        assert_eq!(draft.tags, vec![2]);
        assert_eq!(draft.ingredients[0].id, 5);
        assert_eq!(draft.ingredients[0].amount, 300);
    }

    #[test]
    fn draft_rejects_malformed_tags() {
        let form = form(json!({
            "name": "Borscht",
            "text": "Simmer for an hour.",
            "image": "recipes/9b1de2aa.png",
            "cooking_time": 90,
            "tags": ["dinner"],
            "ingredients": [{"id": 5, "amount": 300}],
        }));

        assert!(RecipeDraft::from_form(&form).is_err());
    }

    #[test]
    fn draft_rejects_missing_field() {
        let form = form(json!({
            "name": "Borscht",
            "tags": [],
            "ingredients": [],
        }));

        assert!(RecipeDraft::from_form(&form).is_err());
    }

    #[test]
    fn get_number_parses_string_encoded_values() {
        let form = form(json!({"recipes_limit": "3"}));
        assert_eq!(form.get_number::<i64>("recipes_limit").unwrap(), 3);
        assert!(form.get_number::<i64>("missing").is_err());
    }

    #[test]
    fn get_value_converts_through_try_from() {
        use crate::database::schema::UserRole;

        let form = form(json!({"role": "admin"}));
        assert_eq!(form.get_value::<UserRole>("role").unwrap(), UserRole::Admin);
        assert!(form.get_value::<UserRole>("missing").is_err());
    }
}
