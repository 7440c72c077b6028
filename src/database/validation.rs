use std::collections::HashSet;

use crate::error::{ApiError, Error};

use super::schema::{RecipeDraft, Uuid};

/// One kind per rule; rules run in a fixed order and the first failure wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("cooking_time must be a positive integer")]
    InvalidCookingTime,
    #[error("Recipe must have at least one tag")]
    NoTags,
    #[error("Recipe tags must not repeat")]
    DuplicateTag,
    #[error("Unknown tag id")]
    UnknownTag,
    #[error("Recipe must have at least one ingredient")]
    NoIngredients,
    #[error("Ingredient amount must be a positive integer")]
    InvalidAmount,
    #[error("Recipe ingredients must not repeat")]
    DuplicateIngredient,
    #[error("Unknown ingredient id")]
    UnknownIngredient,
}

impl From<ValidationError> for Error {
    fn from(value: ValidationError) -> Self {
        ApiError::InvalidRequest.new(&value.to_string())
    }
}

type DraftRule = fn(&RecipeDraft) -> Result<(), ValidationError>;

const TAG_RULES: &[DraftRule] = &[cooking_time_at_least_one, tags_present, tags_unique];
const INGREDIENT_RULES: &[DraftRule] =
    &[ingredients_present, amounts_positive, ingredients_unique];

fn cooking_time_at_least_one(draft: &RecipeDraft) -> Result<(), ValidationError> {
    if draft.cooking_time < 1 {
        return Err(ValidationError::InvalidCookingTime);
    }
    Ok(())
}

fn tags_present(draft: &RecipeDraft) -> Result<(), ValidationError> {
    if draft.tags.is_empty() {
        return Err(ValidationError::NoTags);
    }
    Ok(())
}

fn tags_unique(draft: &RecipeDraft) -> Result<(), ValidationError> {
    let mut seen: HashSet<Uuid> = HashSet::new();
    if !draft.tags.iter().all(|id| seen.insert(*id)) {
        return Err(ValidationError::DuplicateTag);
    }
    Ok(())
}

fn ingredients_present(draft: &RecipeDraft) -> Result<(), ValidationError> {
    if draft.ingredients.is_empty() {
        return Err(ValidationError::NoIngredients);
    }
    Ok(())
}

fn amounts_positive(draft: &RecipeDraft) -> Result<(), ValidationError> {
    if draft.ingredients.iter().any(|part| part.amount < 1) {
        return Err(ValidationError::InvalidAmount);
    }
    Ok(())
}

fn ingredients_unique(draft: &RecipeDraft) -> Result<(), ValidationError> {
    let mut seen: HashSet<Uuid> = HashSet::new();
    if !draft.ingredients.iter().all(|part| seen.insert(part.id)) {
        return Err(ValidationError::DuplicateIngredient);
    }
    Ok(())
}

fn all_known(requested: &[Uuid], known: &[Uuid]) -> bool {
    let known: HashSet<Uuid> = known.iter().copied().collect();
    requested.iter().all(|id| known.contains(id))
}

/// Validates a draft against the catalog ids it references. `known_tags` and
/// `known_ingredients` are the subsets of the requested ids that actually
/// exist; callers resolve them with one query each before invoking this.
/// Runs fully before any write, so a failed draft leaves no partial effect.
pub fn validate_draft(
    draft: &RecipeDraft,
    known_tags: &[Uuid],
    known_ingredients: &[Uuid],
) -> Result<(), ValidationError> {
    for rule in TAG_RULES {
        rule(draft)?;
    }
    if !all_known(&draft.tags, known_tags) {
        return Err(ValidationError::UnknownTag);
    }
    for rule in INGREDIENT_RULES {
        rule(draft)?;
    }
    let ingredient_ids: Vec<Uuid> = draft.ingredients.iter().map(|part| part.id).collect();
    if !all_known(&ingredient_ids, known_ingredients) {
        return Err(ValidationError::UnknownIngredient);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::schema::IngredientAmount;

    fn draft() -> RecipeDraft {
        RecipeDraft {
            name: String::from("Pancakes"),
            text: String::from("Mix and fry."),
            image: String::from("recipes/4c7fca8e.png"),
            cooking_time: 20,
            tags: vec![1, 2],
            ingredients: vec![
                IngredientAmount { id: 1, amount: 200 },
                IngredientAmount { id: 2, amount: 2 },
            ],
        }
    }

    fn validate(draft: &RecipeDraft) -> Result<(), ValidationError> {
        validate_draft(draft, &[1, 2], &[1, 2])
    }

    #[test]
    fn valid_draft_passes() {
        assert_eq!(validate(&draft()), Ok(()));
    }

    #[test]
    fn cooking_time_must_be_positive() {
        let mut d = draft();
        d.cooking_time = 0;
        assert_eq!(validate(&d), Err(ValidationError::InvalidCookingTime));

        d.cooking_time = -5;
        assert_eq!(validate(&d), Err(ValidationError::InvalidCookingTime));
    }

    #[test]
    fn tags_must_be_present() {
        let mut d = draft();
        d.tags.clear();
        assert_eq!(validate(&d), Err(ValidationError::NoTags));
    }

    #[test]
    fn tags_must_be_unique() {
        let mut d = draft();
        d.tags = vec![1, 1];
        assert_eq!(validate(&d), Err(ValidationError::DuplicateTag));
    }

    #[test]
    fn tags_must_exist() {
        let mut d = draft();
        d.tags = vec![1, 7];
        assert_eq!(validate(&d), Err(ValidationError::UnknownTag));
    }

    #[test]
    fn ingredients_must_be_present() {
        let mut d = draft();
        d.ingredients.clear();
        assert_eq!(validate(&d), Err(ValidationError::NoIngredients));
    }

    #[test]
    fn amounts_must_be_positive() {
        let mut d = draft();
        d.ingredients[1].amount = 0;
        assert_eq!(validate(&d), Err(ValidationError::InvalidAmount));
    }

    #[test]
    fn ingredients_must_be_unique() {
        let mut d = draft();
        d.ingredients[1].id = 1;
        assert_eq!(validate(&d), Err(ValidationError::DuplicateIngredient));
    }

    #[test]
    fn ingredients_must_exist() {
        let mut d = draft();
        d.ingredients[1].id = 9;
        assert_eq!(validate(&d), Err(ValidationError::UnknownIngredient));
    }

    #[test]
    fn rules_run_in_declared_order() {
        // Several rules broken at once: the earliest one is reported.
        let mut d = draft();
        d.cooking_time = 0;
        d.tags.clear();
        d.ingredients.clear();
        assert_eq!(validate(&d), Err(ValidationError::InvalidCookingTime));

        let mut d = draft();
        d.tags = vec![9];
        d.ingredients.clear();
        assert_eq!(validate(&d), Err(ValidationError::UnknownTag));

        let mut d = draft();
        d.ingredients[0].amount = 0;
        d.ingredients[1].id = 9;
        assert_eq!(validate(&d), Err(ValidationError::InvalidAmount));
    }

    #[test]
    fn error_maps_to_bad_request() {
        let error: Error = ValidationError::NoTags.into();
        assert_eq!(error.code, 400);
        assert_eq!(
            error.info.as_deref(),
            Some("Recipe must have at least one tag")
        );
    }
}
