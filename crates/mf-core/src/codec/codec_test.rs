use super::*;
use crate::manifest::{DatePart, JoinType, DESCRIPTION_PROPERTY};

fn sample_manifest() -> Manifest {
    let mut m = Manifest::new("memory", "main");
    m.data_source = Some("duckdb".to_string());

    let mut orders = Model::new("orders");
    orders.source = Some(ModelSource::TableReference(TableReference {
        catalog: Some("memory".into()),
        schema: Some("main".into()),
        table: "orders".into(),
    }));
    orders.primary_key = Some("id".into());
    let mut id = Column::plain("id", "INTEGER");
    id.not_null = true;
    orders.columns = vec![
        id,
        Column::plain("customer_id", "INTEGER"),
        Column::calculated("amount_cents", "BIGINT", "amount * 100"),
    ];
    orders
        .properties
        .insert(DESCRIPTION_PROPERTY.into(), "All orders".into());

    let mut customers = Model::new("customers");
    customers.source = Some(ModelSource::RefSql("SELECT * FROM raw.customers".into()));
    customers.cached = true;
    customers.refresh_time = Some("30m".into());
    customers.columns = vec![Column::plain("id", "INTEGER")];

    m.models = vec![orders, customers];
    m.relationships.push(Relationship::new(
        "orders_customers",
        "orders",
        "customers",
        JoinType::ManyToOne,
        "orders.customer_id = customers.id",
    ));
    m.metrics.push(Metric {
        name: "revenue".into(),
        base_object: "orders".into(),
        dimensions: vec![Column::plain("customer_id", "INTEGER")],
        measures: vec![Column::calculated("total", "DOUBLE", "sum(amount)")],
        time_grains: vec![TimeGrain {
            name: "order_date".into(),
            ref_column: "created_at".into(),
            date_parts: vec![DatePart::Year, DatePart::Month],
        }],
        cached: false,
        refresh_time: None,
        properties: Default::default(),
    });
    m.views.push(View {
        name: "big_orders".into(),
        statement: "SELECT * FROM orders WHERE amount > 100".into(),
        properties: Default::default(),
    });
    m.enum_definitions.push(EnumDefinition {
        name: "status".into(),
        values: vec![
            EnumValue {
                name: "OPEN".into(),
                value: Some("o".into()),
                properties: Default::default(),
            },
            EnumValue {
                name: "CLOSED".into(),
                value: None,
                properties: Default::default(),
            },
        ],
        properties: Default::default(),
    });
    m
}

fn assert_structurally_equal(a: &Manifest, b: &Manifest) {
    assert_eq!(a.catalog, b.catalog);
    assert_eq!(a.schema, b.schema);
    assert_eq!(a.data_source, b.data_source);
    assert_eq!(a.models, b.models);
    assert_eq!(a.relationships, b.relationships);
    assert_eq!(a.metrics, b.metrics);
    assert_eq!(a.views, b.views);
    assert_eq!(a.enum_definitions, b.enum_definitions);
}

#[test]
fn test_round_trip_preserves_structure() {
    let m = sample_manifest();
    let json = to_json(&m).unwrap();
    let back = from_json(&json).unwrap();
    assert_structurally_equal(&m, &back);
}

#[test]
fn test_round_trip_of_minimal_manifest() {
    let m = Manifest::new("memory", "main");
    let back = decode(encode(&m)).unwrap();
    assert_structurally_equal(&m, &back);
}

#[test]
fn test_export_is_sparse() {
    let mut m = sample_manifest();
    m.relationships.clear();
    m.metrics.clear();
    m.views.clear();
    let value = serde_json::to_value(encode(&m)).unwrap();

    assert!(value.get("relationships").is_none());
    assert!(value.get("metrics").is_none());
    assert!(value.get("views").is_none());
    assert_eq!(value["dataSource"], "duckdb");

    let orders = &value["models"][0];
    assert!(orders.get("cached").is_none());
    assert!(orders.get("refSql").is_none());
    assert_eq!(orders["tableReference"]["table"], "orders");
    assert_eq!(orders["primaryKey"], "id");

    let id = &orders["columns"][0];
    assert_eq!(id["notNull"], true);
    assert!(id.get("isCalculated").is_none());
    assert!(id.get("isHidden").is_none());
    assert!(id.get("properties").is_none());

    let customer_id = &orders["columns"][1];
    assert!(customer_id.get("notNull").is_none());

    let calc = &orders["columns"][2];
    assert_eq!(calc["isCalculated"], true);
    assert_eq!(calc["expression"], "amount * 100");

    let customers = &value["models"][1];
    assert_eq!(customers["cached"], true);
    assert_eq!(customers["refreshTime"], "30m");
    assert!(customers.get("properties").is_none());
}

#[test]
fn test_export_uses_fixed_tokens() {
    let value = serde_json::to_value(encode(&sample_manifest())).unwrap();
    assert_eq!(value["relationships"][0]["joinType"], "MANY_TO_ONE");
    assert_eq!(
        value["metrics"][0]["timeGrain"][0]["dateParts"],
        serde_json::json!(["YEAR", "MONTH"])
    );
}

#[test]
fn test_imports_internal_snake_case_form() {
    let m = sample_manifest();
    let internal = serde_json::to_string(&m).unwrap();
    assert!(internal.contains("\"join_type\""));

    let back = from_json(&internal).unwrap();
    assert_structurally_equal(&m, &back);
}

#[test]
fn test_imports_snake_case_field_names() {
    let json = r#"{
        "catalog": "memory",
        "schema": "main",
        "data_source": "duckdb",
        "models": [
            {"name": "a", "table_reference": {"table": "a"}, "primary_key": "id",
             "columns": [{"name": "id", "type": "INTEGER", "not_null": true}]},
            {"name": "b", "ref_sql": "SELECT 1"}
        ],
        "relationships": [
            {"name": "a_b", "models": ["a", "b"], "join_type": "ONE_TO_ONE", "condition": "a.id = b.id"}
        ]
    }"#;
    let m = from_json(json).unwrap();
    assert_eq!(m.data_source.as_deref(), Some("duckdb"));
    assert_eq!(m.models[0].primary_key.as_deref(), Some("id"));
    assert!(m.models[0].columns[0].not_null);
    assert_eq!(
        m.models[1].source,
        Some(ModelSource::RefSql("SELECT 1".into()))
    );
    assert_eq!(m.relationships[0].join_type, JoinType::OneToOne);
}

fn expect_validation(json: &str, needle: &str) {
    match from_json(json) {
        Err(CodecError::Validation(msg)) => {
            assert!(msg.contains(needle), "'{msg}' does not contain '{needle}'")
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn test_unknown_join_type_is_rejected() {
    expect_validation(
        r#"{"catalog": "c", "schema": "s",
            "models": [{"name": "a"}, {"name": "b"}],
            "relationships": [{"name": "r", "models": ["a", "b"], "joinType": "SIDEWAYS", "condition": "a.x = b.x"}]}"#,
        "SIDEWAYS",
    );
}

#[test]
fn test_unknown_date_part_is_rejected() {
    expect_validation(
        r#"{"catalog": "c", "schema": "s",
            "metrics": [{"name": "m", "baseObject": "a",
                         "timeGrain": [{"name": "g", "refColumn": "ts", "dateParts": ["FORTNIGHT"]}]}]}"#,
        "FORTNIGHT",
    );
}

#[test]
fn test_missing_catalog_is_rejected() {
    expect_validation(r#"{"schema": "s"}"#, "catalog");
}

#[test]
fn test_empty_schema_is_rejected() {
    expect_validation(r#"{"catalog": "c", "schema": " "}"#, "schema");
}

#[test]
fn test_relationship_needs_exactly_two_models() {
    expect_validation(
        r#"{"catalog": "c", "schema": "s",
            "models": [{"name": "a"}, {"name": "b"}, {"name": "d"}],
            "relationships": [{"name": "r", "models": ["a", "b", "d"], "joinType": "MANY_TO_MANY", "condition": "a.x = b.x"}]}"#,
        "exactly two models",
    );
}

#[test]
fn test_calculated_column_needs_expression() {
    expect_validation(
        r#"{"catalog": "c", "schema": "s",
            "models": [{"name": "a", "columns": [{"name": "x", "type": "INT", "isCalculated": true}]}]}"#,
        "no expression",
    );
}

#[test]
fn test_model_with_two_sources_is_rejected() {
    expect_validation(
        r#"{"catalog": "c", "schema": "s",
            "models": [{"name": "a", "refSql": "SELECT 1", "tableReference": {"table": "a"}}]}"#,
        "more than one",
    );
}

#[test]
fn test_dangling_relationship_is_rejected() {
    expect_validation(
        r#"{"catalog": "c", "schema": "s",
            "models": [{"name": "a"}],
            "relationships": [{"name": "r", "models": ["a", "ghost"], "joinType": "ONE_TO_ONE", "condition": "a.x = ghost.x"}]}"#,
        "ghost",
    );
}

#[test]
fn test_duplicate_model_is_rejected() {
    expect_validation(
        r#"{"catalog": "c", "schema": "s", "models": [{"name": "a"}, {"name": "a"}]}"#,
        "duplicate model",
    );
}

#[test]
fn test_malformed_json_is_a_json_error() {
    assert!(matches!(from_json("{not json"), Err(CodecError::Json(_))));
}

#[test]
fn test_json_schema_document_matches_tokens() {
    let schema: serde_json::Value = serde_json::from_str(MANIFEST_JSON_SCHEMA).unwrap();
    assert_eq!(schema["required"], serde_json::json!(["catalog", "schema"]));

    let join_types = schema["definitions"]["relationship"]["properties"]["joinType"]["enum"]
        .as_array()
        .unwrap()
        .clone();
    for jt in [
        JoinType::OneToOne,
        JoinType::OneToMany,
        JoinType::ManyToOne,
        JoinType::ManyToMany,
    ] {
        assert!(join_types.contains(&serde_json::Value::String(jt.to_string())));
    }
}

#[test]
fn test_empty_table_reference_is_rejected() {
    expect_validation(
        r#"{"catalog": "c", "schema": "s",
            "models": [{"name": "m", "tableReference": {"table": ""}}]}"#,
        "tableReference.table",
    );
}

#[test]
fn test_empty_enum_value_name_is_rejected() {
    expect_validation(
        r#"{"catalog": "c", "schema": "s",
            "enumDefinitions": [{"name": "e", "values": [{"name": ""}]}]}"#,
        "enum 'e' value",
    );
}

#[test]
fn test_empty_names_are_rejected() {
    let cases = [
        (r#"{"catalog": "c", "schema": "s", "models": [{"name": ""}]}"#, "model"),
        (
            r#"{"catalog": "c", "schema": "s", "models": [{"name": "m", "columns": [{"name": "", "type": "INT"}]}]}"#,
            "column",
        ),
        (
            r#"{"catalog": "c", "schema": "s", "metrics": [{"name": "", "baseObject": "m"}]}"#,
            "metric",
        ),
        (
            r#"{"catalog": "c", "schema": "s", "views": [{"name": "", "statement": "SELECT 1"}]}"#,
            "view",
        ),
        (
            r#"{"catalog": "c", "schema": "s", "enumDefinitions": [{"name": ""}]}"#,
            "enum",
        ),
        (
            r#"{"catalog": "c", "schema": "s", "models": [{"name": "a"}, {"name": "b"}],
                "relationships": [{"name": "", "models": ["a", "b"], "joinType": "MANY_TO_ONE", "condition": "a.x = b.x"}]}"#,
            "relationship",
        ),
    ];
    for (json, needle) in cases {
        expect_validation(json, needle);
    }
}

#[test]
fn test_missing_required_fields_are_rejected() {
    let cases = [
        (
            r#"{"catalog": "c", "schema": "s", "models": [{"name": "m", "tableReference": {}}]}"#,
            "table",
        ),
        (
            r#"{"catalog": "c", "schema": "s", "models": [{"name": "m", "columns": [{"name": "x"}]}]}"#,
            "type",
        ),
        (
            r#"{"catalog": "c", "schema": "s", "models": [{"name": "a"}, {"name": "b"}],
                "relationships": [{"name": "r", "models": ["a", "b"], "joinType": "MANY_TO_ONE"}]}"#,
            "condition",
        ),
        (
            r#"{"catalog": "c", "schema": "s", "models": [{"name": "a"}, {"name": "b"}],
                "relationships": [{"name": "r", "models": ["a", "b"], "condition": "a.x = b.x"}]}"#,
            "joinType",
        ),
        (
            r#"{"catalog": "c", "schema": "s", "metrics": [{"name": "m"}]}"#,
            "baseObject",
        ),
        (
            r#"{"catalog": "c", "schema": "s", "metrics": [{"name": "m", "baseObject": "o", "timeGrain": [{"name": "g"}]}]}"#,
            "refColumn",
        ),
        (
            r#"{"catalog": "c", "schema": "s", "views": [{"name": "v"}]}"#,
            "statement",
        ),
        (
            r#"{"catalog": "c", "schema": "s", "enumDefinitions": [{"name": "e", "values": [{"value": "x"}]}]}"#,
            "name",
        ),
    ];
    for (json, needle) in cases {
        expect_validation(json, needle);
    }
}

#[test]
fn test_relationship_needs_two_models() {
    expect_validation(
        r#"{"catalog": "c", "schema": "s", "models": [{"name": "a"}],
            "relationships": [{"name": "r", "models": ["a"], "joinType": "MANY_TO_ONE", "condition": "a.x = a.y"}]}"#,
        "exactly two models",
    );
}

#[test]
fn test_json_schema_enum_value_name_is_non_empty() {
    let schema: serde_json::Value = serde_json::from_str(MANIFEST_JSON_SCHEMA).unwrap();
    let value = &schema["definitions"]["enumDefinition"]["properties"]["values"]["items"];
    assert_eq!(value["properties"]["name"]["minLength"], 1);
    assert_eq!(
        schema["definitions"]["tableReference"]["properties"]["table"]["minLength"],
        1
    );
}
