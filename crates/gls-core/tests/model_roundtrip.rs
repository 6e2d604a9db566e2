//! Serde roundtrip and JsonSchema validation for the input and policy types.

use gls_core::entities::*;
use gls_core::enums::*;
use gls_core::events::{EntryEvent, InputEvent};
use gls_core::policy::*;
use schemars::schema_for;

/// Validate a JSON value against a schemars-generated schema.
fn validate_against_schema(
    schema: &serde_json::Value,
    instance: &serde_json::Value,
) -> Vec<String> {
    let validator = jsonschema::validator_for(schema).expect("schema should be valid");
    validator
        .iter_errors(instance)
        .map(|e| format!("{e}"))
        .collect()
}

macro_rules! roundtrip_and_validate {
    ($name:ident, $ty:ty, $instance:expr) => {
        #[test]
        fn $name() {
            let val: $ty = $instance;

            let json_str = serde_json::to_string_pretty(&val).unwrap();
            let recovered: $ty = serde_json::from_str(&json_str).unwrap();
            assert_eq!(
                recovered,
                val,
                "serde roundtrip failed for {}",
                stringify!($ty)
            );

            let schema = serde_json::to_value(schema_for!($ty)).unwrap();
            let instance = serde_json::to_value(&val).unwrap();
            let errors = validate_against_schema(&schema, &instance);
            assert!(
                errors.is_empty(),
                "Schema validation failed for {}: {:?}",
                stringify!($ty),
                errors
            );
        }
    };
}

roundtrip_and_validate!(
    entry_event_roundtrip,
    InputEvent,
    InputEvent::Entry(EntryEvent {
        label: "dual.html".into(),
        entry_type: "dualabbreviation".into(),
        fields: [("short".to_string(), "HTML".to_string())].into(),
        parent: Some("markup".into()),
        see: vec!["xml".into()],
        see_also: Vec::new(),
        alias: None,
        variant: Some("html".into()),
        dependencies: vec!["sgml".into()],
    })
);

roundtrip_and_validate!(
    record_event_roundtrip,
    InputEvent,
    InputEvent::Record(UsageRecord::new("html").at("12"))
);

roundtrip_and_validate!(
    compound_event_roundtrip,
    InputEvent,
    InputEvent::Compound(CompoundEntry::new("html-xml", "html", &["html", "xml"]))
);

roundtrip_and_validate!(
    prior_selection_roundtrip,
    PriorSelection,
    PriorSelection {
        selected: ["a".to_string(), "b".to_string()].into(),
        dependencies: ["c".to_string()].into(),
    }
);

roundtrip_and_validate!(
    collation_pass_roundtrip,
    SortPass,
    SortPass {
        policy: SortPolicy::Collation {
            locale: Some("en-GB".into()),
            rule: CollationRule::WordNoCase,
            field: Some("sort".into()),
            numeric_pad: Some(4),
            suffix: SuffixPolicy::NonUnique,
        },
        reverse: true,
        tie_break: TieBreak::Field("name".into()),
        fallback_field: "name".into(),
    }
);

roundtrip_and_validate!(
    flatten_policy_roundtrip,
    FlattenPolicy,
    FlattenPolicy {
        timing: FlattenTiming::PostSort,
        rule: FlattenRule::DiscardUnrecorded,
        condition: Some(Condition::All {
            conditions: vec![
                Condition::FieldDefined {
                    field: "description".into()
                },
                Condition::Not {
                    condition: Box::new(Condition::HasRecords)
                },
            ],
        }),
    }
);

roundtrip_and_validate!(
    missing_parent_roundtrip,
    MissingParentPolicy,
    MissingParentPolicy::Create {
        category: MissingParentCategory::SameAsBase,
    }
);
