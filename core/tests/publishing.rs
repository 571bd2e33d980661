//! Replace semantics and the two publish failure modes.

mod common;

use common::{account, commercial_filler, FakeStores};
use powerwatch_core::{
    complaints::ComplaintAddressSet,
    config::DetectorConfig,
    error::{DetectorError, PriorState, Stage},
    features,
    pipeline::score_and_publish,
    publisher::{publish, PublishOutcome},
    training,
    types::Priority,
    violator::ViolatorRecord,
};

fn violator(id: i64) -> ViolatorRecord {
    ViolatorRecord {
        account_id: id,
        address: format!("House {id}"),
        priority: Priority::Yellow,
        is_checked: "no".into(),
        avg_consumption_6m: 4_000.0,
    }
}

#[test]
fn empty_list_never_touches_the_sink() {
    let sink = FakeStores::default();
    sink.published.borrow_mut().push(violator(1));

    let outcome = publish(&sink, &[]).unwrap();
    assert_eq!(outcome, PublishOutcome::NothingToPublish);
    assert_eq!(sink.delete_calls.get(), 0);
    assert_eq!(sink.insert_calls.get(), 0);
    assert_eq!(sink.published.borrow().len(), 1);
}

#[test]
fn publish_replaces_previous_set() {
    let sink = FakeStores::default();
    sink.published.borrow_mut().extend([violator(1), violator(2)]);

    let outcome = publish(&sink, &[violator(3)]).unwrap();
    assert_eq!(outcome, PublishOutcome::Published { deleted: 2, inserted: 1 });
    assert_eq!(*sink.published.borrow(), vec![violator(3)]);
}

#[test]
fn delete_failure_keeps_prior_state_and_skips_insert() {
    let sink = FakeStores::default();
    sink.published.borrow_mut().push(violator(1));
    sink.fail_delete.set(true);

    let err = publish(&sink, &[violator(2)]).unwrap_err();
    assert!(matches!(
        err,
        DetectorError::PublishFailure { prior_state: PriorState::Retained, .. }
    ));
    assert_eq!(err.stage(), Stage::Publish);
    assert_eq!(sink.insert_calls.get(), 0);
    assert_eq!(*sink.published.borrow(), vec![violator(1)]);
}

#[test]
fn insert_failure_after_delete_reports_lost_state() {
    let sink = FakeStores::default();
    sink.published.borrow_mut().push(violator(1));
    sink.fail_insert.set(true);

    let err = publish(&sink, &[violator(2)]).unwrap_err();
    assert!(matches!(
        err,
        DetectorError::PublishFailure { prior_state: PriorState::Lost, .. }
    ));
    assert!(err.to_string().contains("prior state lost"));
    assert!(sink.published.borrow().is_empty());
}

#[test]
fn scoring_failure_never_reaches_the_sink() {
    let config = DetectorConfig::default_test();
    let mut accounts = commercial_filler(100, 10);
    accounts.push(account(1, None, false, "X", &[7_000.0, 7_000.0, 7_000.0]));
    let mut set = features::extract(accounts, &config).unwrap();
    let model = training::train(&set.vectors, &set.labels, &config).unwrap();

    let sink = FakeStores::default();
    sink.published.borrow_mut().push(violator(9));
    set.labels.pop();

    let err = score_and_publish(&sink, &model, &set, &ComplaintAddressSet::default(), &config)
        .unwrap_err();
    assert!(matches!(err, DetectorError::ScoringFailure(_)), "{err:?}");
    assert_eq!(err.stage(), Stage::Score);
    assert_eq!(sink.delete_calls.get(), 0);
    assert_eq!(sink.insert_calls.get(), 0);
    assert_eq!(sink.published.borrow().len(), 1);
}

#[test]
fn successful_scoring_publishes_through_the_sink() {
    let config = DetectorConfig::default_test();
    let mut accounts = commercial_filler(100, 10);
    accounts.push(account(1, None, false, "X", &[7_000.0, 7_000.0, 7_000.0]));
    let set = features::extract(accounts, &config).unwrap();
    let model = training::train(&set.vectors, &set.labels, &config).unwrap();

    let sink = FakeStores::default();
    let (scored, outcome) =
        score_and_publish(&sink, &model, &set, &ComplaintAddressSet::default(), &config).unwrap();
    assert_eq!(scored.violators.len(), 1);
    assert_eq!(outcome, PublishOutcome::Published { deleted: 0, inserted: 1 });
    assert_eq!(sink.delete_calls.get(), 1);
}
