//! End-to-end behaviour of the selection pipeline.

use gls_config::GlsConfig;
use gls_core::entities::{Entry, PriorSelection, UsageRecord};
use gls_core::enums::{FlattenRule, FlattenTiming, SelectionMode};
use gls_core::labels::LabelPrefixes;
use gls_core::policy::{
    FieldPattern, FlattenPolicy, MatchPolicy, MissingParentPolicy, SecondarySort, SortPass,
    SortPolicy, TieBreak,
};
use gls_engine::closure::ClosureOptions;
use gls_engine::hierarchy::{FlattenStage, MissingParentContext, flatten_lonely_children};
use gls_engine::matcher::EntryMatcher;
use gls_engine::reference::ReferenceIndex;
use gls_engine::selection::{SelectionEngine, SelectionRules};
use gls_engine::{Diagnostics, Engine, EngineError, EntryStore};
use pretty_assertions::assert_eq;
use rand::SeedableRng;
use rand::rngs::StdRng;

fn store_with(entries: Vec<Entry>) -> EntryStore {
    let mut store = EntryStore::new(LabelPrefixes::default());
    for entry in entries {
        store.insert(entry).unwrap();
    }
    store
}

fn records(labels: &[&str]) -> Vec<UsageRecord> {
    labels.iter().map(|label| UsageRecord::new(*label)).collect()
}

fn engine(config: GlsConfig) -> Engine {
    Engine::new(config).with_rng(StdRng::seed_from_u64(1))
}

fn config(mode: SelectionMode, primary: SortPass) -> GlsConfig {
    let mut config = GlsConfig::default();
    config.selection.mode = mode;
    config.sort.primary = primary;
    config
}

fn labels(outcome: &gls_engine::SelectionOutcome) -> Vec<&str> {
    outcome.labels().collect()
}

#[test]
fn see_reference_pulls_in_unrecorded_target() {
    let store = store_with(vec![Entry::new("B").with_see(&["A"]), Entry::new("A")]);
    let mut engine = engine(config(
        SelectionMode::RecordedAndDepsAndSee,
        SortPass::new(SortPolicy::None),
    ));

    let outcome = engine.run(store, records(&["B"]), &PriorSelection::default()).unwrap();

    assert_eq!(labels(&outcome), vec!["B", "A"]);
    assert_eq!(outcome.entries[0].usage_record_count, 1);
    assert_eq!(outcome.entries[1].usage_record_count, 0);
    assert_eq!(outcome.entries[1].dependents, vec!["B".to_string()]);
    assert!(outcome.diagnostics.is_empty());
}

#[test]
fn parent_cycle_aborts_without_output() {
    let store = store_with(vec![
        Entry::new("A").with_parent("B"),
        Entry::new("B").with_parent("A"),
    ]);
    let mut engine = engine(GlsConfig::default());

    let result = engine.run(store, records(&["A"]), &PriorSelection::default());

    let Err(EngineError::ParentCycle { chain }) = result else {
        panic!("expected a parent cycle, got {result:?}");
    };
    assert!(chain.contains(&"A".to_string()));
    assert!(chain.contains(&"B".to_string()));
}

#[test]
fn selected_before_without_prior_is_fatal() {
    let store = store_with(vec![Entry::new("A")]);
    let mut engine = engine(config(SelectionMode::SelectedBefore, SortPass::default()));
    let result = engine.run(store, Vec::new(), &PriorSelection::default());
    assert!(matches!(result, Err(EngineError::SelectedBeforeWithoutPrior)));
}

#[test]
fn limit_keeps_commit_order_and_reports_the_rest() {
    let entries: Vec<Entry> = (0..10).map(|i| Entry::new(format!("e{i}"))).collect();
    let all: Vec<String> = (0..10).map(|i| format!("e{i}")).collect();
    let all: Vec<&str> = all.iter().map(String::as_str).collect();
    let mut config = config(SelectionMode::RecordedNoDeps, SortPass::new(SortPolicy::None));
    config.selection.limit = 3;

    let outcome = engine(config)
        .run(store_with(entries), records(&all), &PriorSelection::default())
        .unwrap();

    assert_eq!(labels(&outcome), vec!["e0", "e1", "e2"]);
    assert_eq!(outcome.truncated.len(), 7);
    assert_eq!(outcome.prior.selected.len(), 3);
}

#[test]
fn truncated_entries_are_flagged_unselected() {
    let mut store = store_with((0..10).map(|i| Entry::new(format!("e{i}"))).collect());
    let mut index = ReferenceIndex::new(Vec::new());
    let mut diagnostics = Diagnostics::new();
    let prior = PriorSelection::default();
    let matcher = EntryMatcher::compile(&MatchPolicy::default()).unwrap();
    let missing = MissingParentPolicy::Warn;
    let rules = SelectionRules {
        closure: ClosureOptions {
            mode: SelectionMode::All,
            variant_dependency: false,
            missing_parents: MissingParentContext {
                policy: &missing,
                base_name: "",
            },
        },
        limit: 3,
        matcher: &matcher,
        prune: None,
    };

    let selection = SelectionEngine::new(&mut store, &mut index, &mut diagnostics, &prior, rules)
        .run()
        .unwrap();

    assert_eq!(selection.sequence.len(), 3);
    assert_eq!(store.iter().filter(|entry| entry.selected).count(), 3);
    assert_eq!(store.iter().filter(|entry| !entry.selected).count(), 7);
}

#[test]
fn identical_keys_keep_selection_order() {
    let store = store_with(vec![
        Entry::new("late").with_field("name", "twin"),
        Entry::new("early").with_field("name", "twin"),
    ]);
    let pass = SortPass::default().with_tie_break(TieBreak::None);
    let outcome = engine(config(SelectionMode::RecordedNoDeps, pass))
        .run(store, records(&["late", "early"]), &PriorSelection::default())
        .unwrap();
    assert_eq!(labels(&outcome), vec!["late", "early"]);
}

#[test]
fn seeded_random_order_is_reproducible() {
    let run = || {
        let store = store_with((0..12).map(|i| Entry::new(format!("r{i}"))).collect());
        let pass = SortPass::new(SortPolicy::Random { seed: Some(42) });
        let outcome = Engine::new(config(SelectionMode::All, pass))
            .run(store, Vec::new(), &PriorSelection::default())
            .unwrap();
        outcome.labels().map(ToString::to_string).collect::<Vec<_>>()
    };
    assert_eq!(run(), run());
}

#[test]
fn closure_reaches_every_dependency() {
    let store = store_with(vec![
        Entry::new("root"),
        Entry::new("leaf")
            .with_parent("root")
            .with_see(&["target"])
            .with_dependencies(&["dep"]),
        Entry::new("target").with_alias("aliased"),
        Entry::new("aliased"),
        Entry::new("dep"),
        Entry::new("unrelated"),
    ]);
    let outcome = engine(config(SelectionMode::RecordedAndDeps, SortPass::default()))
        .run(store, records(&["leaf"]), &PriorSelection::default())
        .unwrap();

    let mut selected = labels(&outcome);
    selected.sort_unstable();
    assert_eq!(selected, vec!["aliased", "dep", "leaf", "root", "target"]);
    for entry in &outcome.entries {
        if let Some(parent) = &entry.parent {
            assert!(outcome.labels().any(|label| label == parent));
        }
    }
}

#[test]
fn unresolved_reference_is_reported_not_fatal() {
    let store = store_with(vec![Entry::new("A").with_see(&["ghost"])]);
    let outcome = engine(GlsConfig::default())
        .run(store, records(&["A"]), &PriorSelection::default())
        .unwrap();
    assert_eq!(labels(&outcome), vec!["A"]);
    assert_eq!(outcome.diagnostics.len(), 1);
}

#[test]
fn flattening_twice_changes_nothing() {
    let mut store = store_with(vec![
        Entry::new("top").with_field("name", "Top"),
        Entry::new("mid").with_field("name", "Mid").with_parent("top"),
        Entry::new("low").with_field("name", "Low").with_parent("mid"),
    ]);
    let mut sequence: Vec<String> = ["top", "mid", "low"].map(String::from).to_vec();
    let mut selected = gls_engine::selected::SelectedSet::new();
    for label in &sequence {
        selected.commit(label);
    }
    let policy = FlattenPolicy {
        timing: FlattenTiming::PreSort,
        rule: FlattenRule::OnlyUnrecordedParents,
        condition: None,
    };

    let first = flatten_lonely_children(
        &mut sequence,
        &mut store,
        &mut selected,
        &policy,
        None,
        FlattenStage::PreSort,
    );
    let after_once = sequence.clone();
    let names_once: Vec<String> = store.iter().map(|e| e.name().to_string()).collect();

    let second = flatten_lonely_children(
        &mut sequence,
        &mut store,
        &mut selected,
        &policy,
        None,
        FlattenStage::PreSort,
    );
    let names_twice: Vec<String> = store.iter().map(|e| e.name().to_string()).collect();

    assert!(!first.is_empty());
    assert!(second.is_empty());
    assert_eq!(sequence, after_once);
    assert_eq!(names_once, names_twice);
}

#[test]
fn groups_merge_only_within_a_level() {
    let store = store_with(vec![
        Entry::new("alpha").with_field("name", "alpha"),
        Entry::new("beta").with_field("name", "beta"),
        Entry::new("child").with_field("name", "child").with_parent("beta"),
        Entry::new("gamma").with_field("name", "gamma"),
    ]);
    let mut config = config(SelectionMode::All, SortPass::default());
    config.groups.group_level = 1;
    config.groups.merge_small_groups = Some(1);

    let outcome = engine(config)
        .run(store, Vec::new(), &PriorSelection::default())
        .unwrap();

    for group in &outcome.groups {
        let levels: Vec<usize> = outcome
            .entries
            .iter()
            .filter(|entry| group.entries.contains(&entry.label))
            .map(|entry| entry.level)
            .collect();
        assert!(levels.iter().all(|&level| level == group.level), "{group:?}");
    }
    assert_eq!(outcome.groups[0].label, "A-B");
    assert_eq!(outcome.groups[1].label, "C");
    assert_eq!(outcome.groups[1].level, 1);
}

#[test]
fn prior_selection_carries_into_the_next_run() {
    let first = engine(GlsConfig::default())
        .run(
            store_with(vec![Entry::new("A"), Entry::new("B")]),
            records(&["A"]),
            &PriorSelection::default(),
        )
        .unwrap();
    assert!(first.prior.was_selected("A"));

    let second = engine(config(SelectionMode::SelectedBefore, SortPass::default()))
        .run(
            store_with(vec![Entry::new("A"), Entry::new("B")]),
            Vec::new(),
            &first.prior,
        )
        .unwrap();
    assert_eq!(labels(&second), vec!["A"]);
}

#[test]
fn variants_and_secondary_list_are_ordered_separately() {
    let store = store_with(vec![
        Entry::new("pi").with_field("category", "greek").with_variant("dual.pi"),
        Entry::new("dual.pi").with_variant("pi"),
        Entry::new("zeta").with_field("category", "greek"),
        Entry::new("alpha"),
    ]);
    let mut config = config(SelectionMode::All, SortPass::default());
    config.sort.variant = Some(SortPass::default());
    config.sort.secondary = Some(SecondarySort {
        pass: SortPass::default(),
        match_policy: MatchPolicy::filter(vec![FieldPattern::new("category", "greek")]),
        list_name: "greek".into(),
    });

    let outcome = engine(config)
        .run(store, Vec::new(), &PriorSelection::default())
        .unwrap();

    assert_eq!(labels(&outcome), vec!["alpha", "pi", "zeta"]);
    let variants: Vec<&str> = outcome.variant_entries.iter().map(|e| e.label.as_str()).collect();
    assert_eq!(variants, vec!["dual.pi"]);
    let secondary = outcome.secondary.expect("secondary ordering");
    assert_eq!(secondary.list_name, "greek");
    assert_eq!(secondary.labels, vec!["pi".to_string(), "zeta".to_string()]);
}

#[test]
fn pruning_keeps_references_to_selected_parents() {
    let store = store_with(vec![
        Entry::new("p"),
        Entry::new("a").with_parent("p").with_see(&["p", "d"]),
        Entry::new("d"),
    ]);
    let mut config = config(SelectionMode::RecordedAndDeps, SortPass::default());
    config.prune.enabled = true;

    let outcome = engine(config)
        .run(store, records(&["a"]), &PriorSelection::default())
        .unwrap();

    assert_eq!(labels(&outcome), vec!["p", "a"]);
    let a = outcome.entries.iter().find(|entry| entry.label == "a").unwrap();
    assert_eq!(a.cross_refs.see, vec!["p".to_string()]);
}

fn flatten_config(timing: FlattenTiming) -> GlsConfig {
    let mut config = GlsConfig::default();
    config.hierarchy.flatten = FlattenPolicy {
        timing,
        rule: FlattenRule::OnlyUnrecordedParents,
        condition: None,
    };
    config
}

#[test]
fn pre_sort_flatten_drops_discarded_parent_from_dependencies() {
    let store = store_with(vec![
        Entry::new("g").with_field("name", "g"),
        Entry::new("p").with_field("name", "p").with_parent("g"),
        Entry::new("c").with_field("name", "c").with_parent("p"),
        Entry::new("x").with_field("name", "x").with_parent("g"),
    ]);

    let outcome = engine(flatten_config(FlattenTiming::PreSort))
        .run(store, records(&["g", "c", "x"]), &PriorSelection::default())
        .unwrap();

    assert_eq!(labels(&outcome), vec!["g", "c", "x"]);
    assert_eq!(outcome.discarded, vec!["p".to_string()]);
    let g = &outcome.entries[0];
    assert_eq!(g.dependents, vec!["x".to_string(), "c".to_string()]);
    let c = &outcome.entries[1];
    assert_eq!(c.parent.as_deref(), Some("g"));
    assert_eq!(c.display_override.as_deref(), Some("c, p"));
    assert!(outcome.prior.is_dependency("g"));
    assert!(!outcome.prior.is_dependency("p"));
}

#[test]
fn post_sort_flatten_names_child_after_parent() {
    let store = store_with(vec![
        Entry::new("fruit").with_field("name", "fruit"),
        Entry::new("apple").with_field("name", "apple").with_parent("fruit"),
    ]);

    let outcome = engine(flatten_config(FlattenTiming::PostSort))
        .run(store, records(&["apple"]), &PriorSelection::default())
        .unwrap();

    assert_eq!(labels(&outcome), vec!["apple"]);
    assert_eq!(outcome.discarded, vec!["fruit".to_string()]);
    let apple = &outcome.entries[0];
    assert_eq!(apple.display_override.as_deref(), Some("fruit, apple"));
    assert_eq!(apple.parent, None);
    assert!(outcome.prior.dependencies.is_empty());
}
