use super::{Collection, Field, Rules};

/// Fixed id of the auth collection, referenced by every owner relation
pub const USERS_COLLECTION_ID: &str = "_pb_users_auth_";

const OWNER_RULE: &str = "userId = @request.auth.id";
const SIGNED_IN_RULE: &str = "@request.auth.id != ''";

fn rule(expr: &str) -> Option<String> {
    Some(expr.to_string())
}

pub fn users() -> Collection {
    Collection::auth("users")
        .with_id(USERS_COLLECTION_ID)
        .field(Field::text("name", None, Some(255)))
}

pub fn habits() -> Collection {
    Collection::base("habits")
        .field(Field::text("name", Some(1), Some(255)).required())
        .field(Field::text("description", None, None))
        .field(Field::select("type", &["good", "bad"]).required())
        .field(Field::number("points"))
        .field(Field::relation("userId", USERS_COLLECTION_ID, true).required())
        .with_rules(Rules {
            list: rule(OWNER_RULE),
            view: rule(OWNER_RULE),
            create: rule("@request.auth.id != \"\""),
            update: rule(OWNER_RULE),
            delete: rule(OWNER_RULE),
        })
}

pub fn instruments() -> Collection {
    let owner_or_public = format!("{} && (userId = @request.auth.id || isPublic = true)", SIGNED_IN_RULE);
    let signed_in_owner = format!("{} && {}", SIGNED_IN_RULE, OWNER_RULE);

    Collection::base("instruments")
        .field(
            Field::relation("userId", USERS_COLLECTION_ID, true)
                .max_select(1)
                .required(),
        )
        .field(Field::text("name", Some(1), Some(100)).required())
        .field(Field::text("description", None, Some(1000)))
        .field(Field::json("instrumentData", Some(2_000_000)).required())
        .field(Field::boolean("isPublic"))
        .field(Field::json("tags", Some(10_000)))
        .field(Field::autodate("created", true, false))
        .field(Field::autodate("updated", true, true))
        .with_rules(Rules {
            list: Some(owner_or_public.clone()),
            view: Some(owner_or_public),
            create: rule(SIGNED_IN_RULE),
            update: Some(signed_in_owner.clone()),
            delete: Some(signed_in_owner),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collections::{CollectionKind, FieldKind};

    #[test]
    fn users_is_auth_collection_with_fixed_id() {
        let users = users();
        assert_eq!(users.kind, CollectionKind::Auth);
        assert_eq!(users.id, USERS_COLLECTION_ID);
        assert_eq!(users.rules, Rules::default());
    }

    #[test]
    fn habits_fields_and_rules() {
        let habits = habits();
        let names: Vec<_> = habits.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["name", "description", "type", "points", "userId"]);

        let kind = &habits.get_field("type").unwrap().kind;
        assert_eq!(
            *kind,
            FieldKind::Select {
                values: vec!["good".to_string(), "bad".to_string()]
            }
        );
        assert_eq!(habits.rules.list.as_deref(), Some("userId = @request.auth.id"));
        assert_eq!(habits.rules.create.as_deref(), Some("@request.auth.id != \"\""));
        assert_eq!(habits.relation_targets(), vec![USERS_COLLECTION_ID]);
    }

    #[test]
    fn instruments_limits_and_rules() {
        let instruments = instruments();
        assert_eq!(
            instruments.get_field("instrumentData").unwrap().kind,
            FieldKind::Json { max_size: Some(2_000_000) }
        );
        assert!(!instruments.get_field("userId").unwrap().is_multiple());
        assert_eq!(
            instruments.rules.view.as_deref(),
            Some("@request.auth.id != '' && (userId = @request.auth.id || isPublic = true)")
        );
        assert_eq!(
            instruments.rules.delete.as_deref(),
            Some("@request.auth.id != '' && userId = @request.auth.id")
        );
    }
}
