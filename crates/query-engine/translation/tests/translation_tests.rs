mod common;

use common::*;
use query_engine_sql::sql;
use query_engine_sql::sql::string::Param;
use query_engine_translation::translation::error::{CoercionError, Error, ModelResolutionError};
use query_engine_translation::translation::helpers::RequestContext;
use query_engine_translation::translation::request::{Value, JOIN_TYPE_ARGUMENT, ORDER_BY_ARGUMENT};
use similar_asserts::assert_eq;

const LUKE_EXTERNAL_ID: &str = "5f8e6d58-4c1b-4d55-9a3c-9d1f2f3a4b01";
const LEIA_EXTERNAL_ID: &str = "5f8e6d58-4c1b-4d55-9a3c-9d1f2f3a4b04";

mod fetching {
    use super::*;
    use similar_asserts::assert_eq;

    #[tokio::test]
    async fn to_one_below_the_root_is_fetched() {
        let configuration = starwars_configuration().await.unwrap();
        let request = field("Person")
            .with_selection(field("name"))
            .with_selection(field("favoriteDroid").with_selection(field("name")));

        let sql = translate_sql(&configuration, &RequestContext::default(), "Person", &request);
        assert_eq!(
            sql.sql,
            r#"SELECT DISTINCT "Person_0" FROM "Person" AS "Person_0" LEFT OUTER JOIN FETCH "Person_0"."favoriteDroid" AS "favoriteDroid_1""#
        );
    }

    #[tokio::test]
    async fn fetches_nest_under_fetches() {
        let configuration = starwars_configuration().await.unwrap();
        let request = field("Pet").with_selection(
            field("owner").with_selection(field("favoriteDroid").with_selection(field("name"))),
        );

        let sql = translate_sql(&configuration, &RequestContext::default(), "Pet", &request);
        assert_eq!(
            sql.sql,
            r#"SELECT DISTINCT "Pet_0" FROM "Pet" AS "Pet_0" LEFT OUTER JOIN FETCH "Pet_0"."owner" AS "owner_1" LEFT OUTER JOIN FETCH "owner_1"."favoriteDroid" AS "favoriteDroid_2""#
        );
    }

    #[tokio::test]
    async fn filtered_to_one_is_joined_with_its_filter() {
        let configuration = starwars_configuration().await.unwrap();
        let request = field("Person").with_selection(
            field("favoriteDroid")
                .with_argument("primaryFunction", string("Astromech"))
                .with_selection(field("name")),
        );

        let sql = translate_sql(&configuration, &RequestContext::default(), "Person", &request);
        assert_eq!(
            sql.sql,
            r#"SELECT DISTINCT "Person_0" FROM "Person" AS "Person_0" LEFT OUTER JOIN "Person_0"."favoriteDroid" AS "favoriteDroid_1" ON ("favoriteDroid_1"."primaryFunction" = $1)"#
        );
        assert_eq!(sql.params, vec![Param::String("Astromech".to_string())]);
    }

    #[tokio::test]
    async fn to_one_below_a_collection_join_is_not_fetched() {
        let configuration = starwars_configuration().await.unwrap();
        let request = field("Person").with_selection(
            field("friends").with_selection(field("favoriteDroid").with_selection(field("name"))),
        );

        let plan = translate(&configuration, &RequestContext::default(), "Person", &request).unwrap();
        let friends = &plan.query.joins[0];
        assert_eq!(friends.kind, sql::ast::JoinKind::Join);
        assert_eq!(friends.joins[0].attribute, "favoriteDroid");
        assert_eq!(friends.joins[0].kind, sql::ast::JoinKind::Join);
    }

    #[tokio::test]
    async fn eager_fetching_can_be_turned_off() {
        let mut configuration = starwars_configuration().await.unwrap();
        configuration.fetch_settings.eager_fetch_to_one = false;
        let request = field("Person")
            .with_selection(field("favoriteDroid").with_selection(field("name")));

        let plan = translate(&configuration, &RequestContext::default(), "Person", &request).unwrap();
        assert_eq!(plan.query.joins[0].kind, sql::ast::JoinKind::Join);
    }

    #[tokio::test]
    async fn collection_without_sub_selections_is_not_joined() {
        let configuration = starwars_configuration().await.unwrap();
        let request = field("Person").with_selection(field("pets"));

        let sql = translate_sql(&configuration, &RequestContext::default(), "Person", &request);
        assert_eq!(sql.sql, r#"SELECT DISTINCT "Person_0" FROM "Person" AS "Person_0""#);
    }

    #[tokio::test]
    async fn typename_is_not_an_attribute() {
        let configuration = starwars_configuration().await.unwrap();
        let with_typename = field("Person")
            .with_selection(field("__typename"))
            .with_selection(
                field("favoriteDroid")
                    .with_selection(field("__typename"))
                    .with_selection(field("name")),
            );
        let without_typename = field("Person")
            .with_selection(field("favoriteDroid").with_selection(field("name")));

        let context = RequestContext::default();
        assert_eq!(
            translate(&configuration, &context, "Person", &with_typename).unwrap(),
            translate(&configuration, &context, "Person", &without_typename).unwrap()
        );
    }

    #[tokio::test]
    async fn join_type_can_be_requested() {
        let configuration = starwars_configuration().await.unwrap();
        let request = field("Person").with_selection(
            field("friends")
                .with_argument(JOIN_TYPE_ARGUMENT, enum_value("INNER"))
                .with_selection(field("name")),
        );

        let sql = translate_sql(&configuration, &RequestContext::default(), "Person", &request);
        assert_eq!(
            sql.sql,
            r#"SELECT DISTINCT "Person_0" FROM "Person" AS "Person_0" INNER JOIN "Person_0"."friends" AS "friends_1""#
        );
    }

    #[tokio::test]
    async fn plans_are_always_distinct() {
        let configuration = starwars_configuration().await.unwrap();
        let context = RequestContext::default();
        let requests = vec![
            ("Person", field("Person")),
            ("Person", field("Person").with_selection(field("friends").with_selection(field("name")))),
            ("Droid", field("Droid").with_argument("name", string("R2-D2"))),
            ("Pet", field("Pet").with_selection(field("owner").with_selection(field("name")))),
        ];

        for (entity, request) in requests {
            let plan = translate(&configuration, &context, entity, &request).unwrap();
            assert!(plan.query.distinct, "{entity} plan is not distinct");
        }
    }
}

mod ordering {
    use super::*;
    use similar_asserts::assert_eq;

    #[tokio::test]
    async fn shallower_levels_order_first() {
        let configuration = starwars_configuration().await.unwrap();
        let request = field("Person")
            .with_selection(
                field("favoriteDroid").with_selection(
                    field("owner")
                        .with_selection(field("name").with_argument(ORDER_BY_ARGUMENT, enum_value("DESC"))),
                ),
            )
            .with_selection(
                field("droid")
                    .with_selection(field("name").with_argument(ORDER_BY_ARGUMENT, enum_value("ASC"))),
            );

        let sql = translate_sql(&configuration, &RequestContext::default(), "Person", &request);
        assert_eq!(
            sql.sql,
            r#"SELECT DISTINCT "Person_0" FROM "Person" AS "Person_0" LEFT OUTER JOIN FETCH "Person_0"."favoriteDroid" AS "favoriteDroid_1" LEFT OUTER JOIN FETCH "favoriteDroid_1"."owner" AS "owner_2" LEFT OUTER JOIN FETCH "Person_0"."droid" AS "droid_3" ORDER BY "droid_3"."name" ASC, "owner_2"."name" DESC"#
        );
    }

    #[tokio::test]
    async fn root_orderings_keep_selection_order() {
        let configuration = starwars_configuration().await.unwrap();
        let request = field("Person")
            .with_selection(field("homePlanet").with_argument(ORDER_BY_ARGUMENT, enum_value("DESC")))
            .with_selection(field("name").with_argument(ORDER_BY_ARGUMENT, enum_value("ASC")));

        let sql = translate_sql(&configuration, &RequestContext::default(), "Person", &request);
        assert_eq!(
            sql.sql,
            r#"SELECT DISTINCT "Person_0" FROM "Person" AS "Person_0" ORDER BY "Person_0"."homePlanet" DESC, "Person_0"."name" ASC"#
        );
    }

    #[tokio::test]
    async fn orderings_below_a_collection_join_are_ignored() {
        let configuration = starwars_configuration().await.unwrap();
        let request = field("Person").with_selection(
            field("friends")
                .with_selection(field("name").with_argument(ORDER_BY_ARGUMENT, enum_value("ASC"))),
        );

        let plan = translate(&configuration, &RequestContext::default(), "Person", &request).unwrap();
        assert!(plan.query.order_by.elements.is_empty());
    }

    #[tokio::test]
    async fn invalid_direction_is_rejected() {
        let configuration = starwars_configuration().await.unwrap();
        let request = field("Person")
            .with_selection(field("name").with_argument(ORDER_BY_ARGUMENT, enum_value("SIDEWAYS")));

        let error = translate(&configuration, &RequestContext::default(), "Person", &request).unwrap_err();
        assert!(matches!(
            error,
            Error::Coercion(CoercionError::InvalidDirective { .. })
        ));
    }
}

mod filtering {
    use super::*;
    use similar_asserts::assert_eq;

    #[tokio::test]
    async fn singular_attribute_is_compared_for_equality() {
        let configuration = starwars_configuration().await.unwrap();
        let request = field("Person").with_argument("name", string("Han Solo"));

        let sql = translate_sql(&configuration, &RequestContext::default(), "Person", &request);
        assert_eq!(
            sql.sql,
            r#"SELECT DISTINCT "Person_0" FROM "Person" AS "Person_0" WHERE ("Person_0"."name" = $1)"#
        );
    }

    #[tokio::test]
    async fn list_value_becomes_membership() {
        let configuration = starwars_configuration().await.unwrap();
        let request = field("Person").with_argument(
            "name",
            Value::List(vec![string("Han Solo"), string("Leia Organa")]),
        );

        let sql = translate_sql(&configuration, &RequestContext::default(), "Person", &request);
        assert_eq!(
            sql.sql,
            r#"SELECT DISTINCT "Person_0" FROM "Person" AS "Person_0" WHERE ("Person_0"."name" IN ($1, $2))"#
        );
    }

    #[tokio::test]
    async fn plural_root_argument_joins_the_collection() {
        let configuration = starwars_configuration().await.unwrap();
        let request = field("Person")
            .with_argument("appearsIn", enum_value("JEDI"))
            .with_selection(field("name"));

        let sql = translate_sql(&configuration, &RequestContext::default(), "Person", &request);
        assert_eq!(
            sql.sql,
            r#"SELECT DISTINCT "Person_0" FROM "Person" AS "Person_0" LEFT OUTER JOIN "Person_0"."appearsIn" AS "appearsIn_1" WHERE ("appearsIn_1" IN ($1))"#
        );
        assert_eq!(
            sql.params,
            vec![Param::Value(sql::ast::Value::Enum {
                enum_type: "Episode".to_string(),
                constant: "JEDI".to_string(),
            })]
        );
    }

    #[tokio::test]
    async fn reserved_arguments_are_not_predicates() {
        let configuration = starwars_configuration().await.unwrap();
        let request = field("Person").with_selection(
            field("friends")
                .with_argument(JOIN_TYPE_ARGUMENT, enum_value("LEFT"))
                .with_selection(field("name").with_argument(ORDER_BY_ARGUMENT, enum_value("ASC"))),
        );

        let plan = translate(&configuration, &RequestContext::default(), "Person", &request).unwrap();
        assert_eq!(plan.query.joins[0].on, None);
        assert_eq!(plan.query.where_, sql::ast::Where(sql::helpers::true_expr()));
    }

    #[tokio::test]
    async fn unknown_attribute_fails_resolution() {
        let configuration = starwars_configuration().await.unwrap();
        let request = field("Person").with_selection(field("lightsaber"));

        let error = translate(&configuration, &RequestContext::default(), "Person", &request).unwrap_err();
        assert_eq!(
            error,
            Error::ModelResolution(ModelResolutionError::AttributeNotFound {
                entity: "Person".to_string(),
                attribute: "lightsaber".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn unknown_entity_fails_resolution() {
        let configuration = starwars_configuration().await.unwrap();
        let error =
            translate(&configuration, &RequestContext::default(), "Wookiee", &field("Wookiee")).unwrap_err();
        assert_eq!(
            error,
            Error::ModelResolution(ModelResolutionError::EntityNotFound("Wookiee".to_string()))
        );
    }
}

mod coercion {
    use super::*;
    use similar_asserts::assert_eq;

    fn root_where(
        configuration: &ndc_entity_configuration::Configuration,
        context: &RequestContext,
        request: &query_engine_translation::translation::request::SelectionNode,
    ) -> sql::ast::Where {
        translate(configuration, context, "Person", request)
            .unwrap()
            .query
            .where_
    }

    #[tokio::test]
    async fn enum_literal_needs_a_resolvable_attribute() {
        let configuration = starwars_configuration().await.unwrap();
        let request = field("Person").with_argument("rank", enum_value("CAPTAIN"));

        let error = translate(&configuration, &RequestContext::default(), "Person", &request).unwrap_err();
        assert_eq!(
            error,
            Error::Coercion(CoercionError::EnumAttributeNotFound {
                entity: "Person".to_string(),
                argument: "rank".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn enum_literal_must_be_a_constant() {
        let configuration = starwars_configuration().await.unwrap();
        let request = field("Person").with_argument("gender", enum_value("DROID"));

        let error = translate(&configuration, &RequestContext::default(), "Person", &request).unwrap_err();
        assert_eq!(
            error,
            Error::Coercion(CoercionError::UnknownEnumConstant {
                enum_type: "Gender".to_string(),
                constant: "DROID".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn strings_become_uuids_for_uuid_attributes() {
        let configuration = starwars_configuration().await.unwrap();
        let request = field("Person").with_argument("externalId", string(LUKE_EXTERNAL_ID));

        let sql = translate_sql(&configuration, &RequestContext::default(), "Person", &request);
        assert_eq!(
            sql.params,
            vec![Param::Value(sql::ast::Value::Uuid(
                uuid::Uuid::parse_str(LUKE_EXTERNAL_ID).unwrap()
            ))]
        );
    }

    #[tokio::test]
    async fn malformed_uuid_is_rejected() {
        let configuration = starwars_configuration().await.unwrap();
        let request = field("Person").with_argument("externalId", string("not-a-uuid"));

        let error = translate(&configuration, &RequestContext::default(), "Person", &request).unwrap_err();
        assert_eq!(
            error,
            Error::Coercion(CoercionError::InvalidUuid {
                argument: "externalId".to_string(),
                value: "not-a-uuid".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn bound_uuid_argument_wins_over_the_literal() {
        let configuration = starwars_configuration().await.unwrap();
        let leia = uuid::Uuid::parse_str(LEIA_EXTERNAL_ID).unwrap();
        let context = RequestContext {
            arguments: variables([("externalId", sql::ast::Value::Uuid(leia))]),
            ..RequestContext::default()
        };
        let request = field("Person").with_argument("externalId", string("not-a-uuid"));

        let sql = translate_sql(&configuration, &context, "Person", &request);
        assert_eq!(sql.params, vec![Param::Value(sql::ast::Value::Uuid(leia))]);
    }

    #[tokio::test]
    async fn bound_arguments_only_apply_to_the_root() {
        let configuration = starwars_configuration().await.unwrap();
        let context = RequestContext {
            arguments: variables([(
                "externalId",
                sql::ast::Value::Uuid(uuid::Uuid::parse_str(LEIA_EXTERNAL_ID).unwrap()),
            )]),
            ..RequestContext::default()
        };
        let request = field("Person").with_selection(
            field("friends")
                .with_argument("externalId", string("not-a-uuid"))
                .with_selection(field("name")),
        );

        let error = translate(&configuration, &context, "Person", &request).unwrap_err();
        assert!(matches!(
            error,
            Error::Coercion(CoercionError::InvalidUuid { .. })
        ));
    }

    #[tokio::test]
    async fn coercing_a_bound_list_again_changes_nothing() {
        let configuration = starwars_configuration().await.unwrap();
        let literal = field("Person").with_argument(
            "externalId",
            Value::List(vec![string(LUKE_EXTERNAL_ID), string(LEIA_EXTERNAL_ID)]),
        );
        let literal_where = root_where(&configuration, &RequestContext::default(), &literal);

        let sql::ast::Where(sql::ast::Expression::BinaryArrayOperator { right, .. }) = &literal_where
        else {
            panic!("expected a membership test, got {literal_where:?}");
        };
        let coerced = right
            .iter()
            .map(|expression| match expression {
                sql::ast::Expression::Value(value) => value.clone(),
                other => panic!("expected a value, got {other:?}"),
            })
            .collect();

        let context = RequestContext {
            variables: variables([("ids", sql::ast::Value::Array(coerced))]),
            ..RequestContext::default()
        };
        let bound = field("Person").with_argument("externalId", Value::Variable("ids".to_string()));

        assert_eq!(root_where(&configuration, &context, &bound), literal_where);
    }

    #[tokio::test]
    async fn variables_are_coerced_like_literals() {
        let configuration = starwars_configuration().await.unwrap();
        let literal = field("Person").with_argument("externalId", string(LUKE_EXTERNAL_ID));
        let context = RequestContext {
            variables: variables([(
                "id",
                sql::ast::Value::String(LUKE_EXTERNAL_ID.to_string()),
            )]),
            ..RequestContext::default()
        };
        let bound = field("Person").with_argument("externalId", Value::Variable("id".to_string()));

        assert_eq!(
            root_where(&configuration, &context, &bound),
            root_where(&configuration, &RequestContext::default(), &literal)
        );
    }

    #[tokio::test]
    async fn unbound_variable_is_rejected() {
        let configuration = starwars_configuration().await.unwrap();
        let request = field("Person").with_argument("name", Value::Variable("who".to_string()));

        let error = translate(&configuration, &RequestContext::default(), "Person", &request).unwrap_err();
        assert_eq!(
            error,
            Error::Coercion(CoercionError::UnboundVariable("who".to_string()))
        );
    }
}

mod parent_resolution {
    use super::*;
    use similar_asserts::assert_eq;

    #[tokio::test]
    async fn many_to_many_goes_through_a_subquery_from_the_parent() {
        let configuration = starwars_configuration().await.unwrap();
        let request = field("friends").with_selection(field("name"));

        let sql = translate_sql(&configuration, &nested_context("Person", "1002"), "Person", &request);
        assert_eq!(
            sql.sql,
            r#"SELECT DISTINCT "Person_0" FROM "Person" AS "Person_0" WHERE ("Person_0" IN (SELECT "friends_2" FROM "Person" AS "Person_1" INNER JOIN "Person_1"."friends" AS "friends_2" WHERE ("Person_1" = $1)))"#
        );
        assert_eq!(
            sql.params,
            vec![Param::Value(sql::ast::Value::Entity(entity_ref("Person", "1002")))]
        );
    }

    #[tokio::test]
    async fn mapped_by_compares_the_owning_attribute() {
        let configuration = starwars_configuration().await.unwrap();
        let request = field("pets").with_selection(field("name"));

        let sql = translate_sql(&configuration, &nested_context("Person", "1005"), "Pet", &request);
        assert_eq!(
            sql.sql,
            r#"SELECT DISTINCT "Pet_0" FROM "Pet" AS "Pet_0" WHERE ("Pet_0"."owner" = $1)"#
        );
    }

    #[tokio::test]
    async fn parent_predicate_is_combined_with_the_field_arguments() {
        let configuration = starwars_configuration().await.unwrap();
        let request = field("favoriteDroid")
            .with_argument("primaryFunction", string("Astromech"))
            .with_selection(field("name"));

        let sql = translate_sql(&configuration, &nested_context("Person", "1000"), "Droid", &request);
        assert_eq!(
            sql.sql,
            r#"SELECT DISTINCT "Droid_0" FROM "Droid" AS "Droid_0" WHERE (("Droid_0"."primaryFunction" = $1) AND ("Droid_0" IN (SELECT "favoriteDroid_2" FROM "Person" AS "Person_1" INNER JOIN "Person_1"."favoriteDroid" AS "favoriteDroid_2" WHERE ("Person_1" = $2))))"#
        );
    }

    #[tokio::test]
    async fn scalar_field_of_the_parent_is_not_an_association() {
        let configuration = starwars_configuration().await.unwrap();
        let error = translate(
            &configuration,
            &nested_context("Person", "1000"),
            "Person",
            &field("name"),
        )
        .unwrap_err();
        assert_eq!(
            error,
            Error::ModelResolution(ModelResolutionError::NotAnAssociation {
                entity: "Person".to_string(),
                attribute: "name".to_string(),
            })
        );
    }
}
