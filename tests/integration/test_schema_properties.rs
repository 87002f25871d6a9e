//! Property tests for schema synthesis and output-field selection

use proptest::prelude::*;
use proximadb_orm::core::errors::ConfigError;
use proximadb_orm::schema::{select_output_fields, DIMENSION_PARAM};
use proximadb_orm::{CollectionSchema, DocumentLayout, FieldSpec, SemanticType};

fn scalar_type() -> impl Strategy<Value = SemanticType> {
    prop_oneof![
        Just(SemanticType::Bool),
        Just(SemanticType::Int32),
        Just(SemanticType::Int64),
        Just(SemanticType::Float32),
        Just(SemanticType::Float64),
        Just(SemanticType::String),
    ]
}

fn role_tags(inbound: bool, outbound: bool) -> String {
    let mut tokens = Vec::new();
    if inbound {
        tokens.push("in");
    }
    if outbound {
        tokens.push("out");
    }
    tokens.join(",")
}

proptest! {
    #[test]
    fn schema_holds_exactly_the_inbound_fields(
        scalars in prop::collection::vec((scalar_type(), any::<bool>(), any::<bool>()), 0..12),
        dimension in 1usize..512,
    ) {
        let mut specs = vec![
            FieldSpec::new("id", SemanticType::Int64, "pk,out"),
            FieldSpec::new("embedding", SemanticType::FloatVector, format!("in,dim={}", dimension)),
        ];
        for (i, (semantic_type, inbound, outbound)) in scalars.iter().enumerate() {
            specs.push(FieldSpec::new(format!("attr_{}", i), *semantic_type, role_tags(*inbound, *outbound)));
        }

        let layout = DocumentLayout::extract("Sample", specs).unwrap();
        let schema = CollectionSchema::synthesize(&layout, "samples").unwrap();

        let inbound = scalars.iter().filter(|(_, inbound, _)| *inbound).count();
        prop_assert_eq!(schema.fields.len(), inbound + 2);
        prop_assert_eq!(schema.primary_key_field.as_str(), "id");
        prop_assert_eq!(schema.index_field.as_deref(), Some("embedding"));
        prop_assert_eq!(
            schema.field("embedding").and_then(|f| f.type_params.get(DIMENSION_PARAM)).cloned(),
            Some(dimension.to_string())
        );

        let mut expected_outputs = vec!["id".to_string()];
        for (i, (_, _, outbound)) in scalars.iter().enumerate() {
            if *outbound {
                expected_outputs.push(format!("attr_{}", i));
            }
        }
        prop_assert_eq!(select_output_fields(&layout), expected_outputs);
    }

    #[test]
    fn primary_key_count_must_be_one(count in 2usize..6) {
        let mut specs = vec![FieldSpec::new("embedding", SemanticType::FloatVector, "in,dim=4")];
        for i in 0..count {
            specs.push(FieldSpec::new(format!("key_{}", i), SemanticType::Int64, "pk"));
        }

        let layout = DocumentLayout::extract("Sample", specs).unwrap();
        let result = CollectionSchema::synthesize(&layout, "samples");
        let matched =
            matches!(result, Err(ConfigError::PrimaryKeyCount { count: found, .. }) if found == count);
        prop_assert!(matched);
    }
}

#[test]
fn missing_primary_key_is_rejected() {
    let specs = vec![FieldSpec::new("embedding", SemanticType::FloatVector, "in,dim=4")];
    let layout = DocumentLayout::extract("Sample", specs).unwrap();
    assert!(matches!(
        CollectionSchema::synthesize(&layout, "samples"),
        Err(ConfigError::PrimaryKeyCount { count: 0, .. })
    ));
}
