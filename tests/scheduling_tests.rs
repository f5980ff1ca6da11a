use cadence::models::{
    DueStrategy, Priority, RecurrenceRule, RecurringTemplate, ScheduleType, Task, TaskStatus,
};
use cadence::recurrence::{materialize, period_key};
use cadence::sort::{smart_compare, sort_tasks, SortRule};
use cadence::zone::{classify, TaskZone};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use rstest::rstest;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn at(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_opt(10, 30, 0).unwrap()
}

fn weekly_template(id: u64, days: &[u8]) -> RecurringTemplate {
    let mut rule = RecurrenceRule::new(ScheduleType::Weekly);
    rule.days_of_week = days.to_vec();
    RecurringTemplate::new(id, "Plan the week", rule)
}

/// Runs the materializer and appends what it produced, like the host store does.
fn run(templates: &[RecurringTemplate], tasks: &mut Vec<Task>, now: NaiveDateTime) -> usize {
    let created = materialize(templates, tasks, now);
    let n = created.len();
    tasks.extend(created);
    n
}

#[test]
fn second_pass_in_same_period_creates_nothing() {
    let mut monthly = RecurrenceRule::new(ScheduleType::Monthly);
    monthly.day_of_month = Some(10);
    let mut flexible = RecurrenceRule::new(ScheduleType::Weekly);
    flexible.flexible = true;
    let templates = vec![
        weekly_template(1, &[2]),
        RecurringTemplate::new(2, "Invoices", monthly),
        RecurringTemplate::new(3, "Review", flexible),
        RecurringTemplate::new(4, "Water plants", RecurrenceRule::new(ScheduleType::Daily)),
    ];
    let now = at(d(2025, 6, 4));
    let mut tasks = Vec::new();

    assert_eq!(run(&templates, &mut tasks, now), 4);
    assert_eq!(run(&templates, &mut tasks, now), 0);
    // Later the same week: daily fires again, the others stay quiet.
    assert_eq!(run(&templates, &mut tasks, at(d(2025, 6, 6))), 1);
    assert_eq!(tasks.len(), 5);
}

#[rstest]
#[case(d(2025, 6, 2), true)] // anchor week
#[case(d(2025, 6, 11), false)] // +1 week
#[case(d(2025, 6, 18), true)] // +2 weeks
#[case(d(2025, 6, 25), false)]
#[case(d(2025, 5, 19), false)] // before the anchor
fn biweekly_interval_gating(#[case] today: NaiveDate, #[case] fires: bool) {
    let mut tmpl = weekly_template(1, &[1]);
    tmpl.rule.interval = 2;
    tmpl.rule.anchor_date = Some("2025-06-02".into());
    let created = materialize(&[tmpl], &[], at(today));
    assert_eq!(created.len(), usize::from(fires));
}

#[test]
fn interval_one_ignores_anchor_in_the_future() {
    let mut tmpl = weekly_template(1, &[1]);
    tmpl.rule.anchor_date = Some("2030-01-01".into());
    assert_eq!(materialize(&[tmpl], &[], at(d(2025, 6, 4))).len(), 1);
}

#[test]
fn day_31_lands_on_april_30() {
    let mut rule = RecurrenceRule::new(ScheduleType::Monthly);
    rule.day_of_month = Some(31);
    let tmpl = RecurringTemplate::new(1, "Close the books", rule);
    let created = materialize(&[tmpl], &[], at(d(2025, 4, 12)));
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].due_date, Some(d(2025, 4, 30)));
    assert_eq!(created[0].extras.period_key.as_deref(), Some("2025-04"));
}

#[test]
fn weekly_key_is_stable_within_a_week_and_changes_across_weeks() {
    let tmpl = weekly_template(1, &[5]);
    let key = |day| materialize(&[tmpl.clone()], &[], at(day))[0].extras.period_key.clone();
    assert_eq!(key(d(2025, 6, 2)), key(d(2025, 6, 8)));
    assert_ne!(key(d(2025, 6, 8)), key(d(2025, 6, 9)));
    assert_eq!(period_key(d(2025, 6, 8), ScheduleType::Weekly), "2025-06-02");
}

#[test]
fn existing_instance_from_another_template_does_not_block() {
    let mut tasks = Vec::new();
    let now = at(d(2025, 6, 4));
    run(&[weekly_template(1, &[1])], &mut tasks, now);
    assert_eq!(run(&[weekly_template(2, &[1])], &mut tasks, now), 1);
}

#[test]
fn deleting_a_template_keeps_its_tasks_and_stops_new_ones() {
    let mut tasks = Vec::new();
    let tmpl = weekly_template(1, &[3]);
    run(&[tmpl], &mut tasks, at(d(2025, 6, 4)));
    assert_eq!(run(&[], &mut tasks, at(d(2025, 6, 11))), 0);
    assert_eq!(tasks.len(), 1);
}

#[rstest]
#[case(DueStrategy::SameDay, Some(d(2025, 6, 5)))]
#[case(DueStrategy::EndOfWeek, Some(d(2025, 6, 8)))]
#[case(DueStrategy::EndOfMonth, Some(d(2025, 6, 30)))]
#[case(DueStrategy::None, None)]
fn due_strategy_applies_to_thursday_target(#[case] strategy: DueStrategy, #[case] due: Option<NaiveDate>) {
    let mut tmpl = weekly_template(1, &[4]);
    tmpl.due_strategy = strategy;
    let created = materialize(&[tmpl], &[], at(d(2025, 6, 3)));
    assert_eq!(created[0].due_date, due);
}

#[test]
fn template_json_round_trip_materializes_identically() {
    let mut tmpl = weekly_template(9, &[1, 4]);
    tmpl.priority = Some(Priority::High);
    tmpl.owners = vec!["kim".into()];
    tmpl.due_strategy = DueStrategy::EndOfWeek;
    tmpl.rule.interval = 3;
    tmpl.rule.anchor_date = Some("2025-05-12".into());

    let json = serde_json::to_string(&tmpl).unwrap();
    let restored: RecurringTemplate = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, tmpl);

    let now = at(d(2025, 6, 4));
    let existing = vec![Task::new(3, "unrelated", now)];
    assert_eq!(
        materialize(&[restored], &existing, now),
        materialize(&[tmpl], &existing, now)
    );
}

fn today() -> NaiveDate {
    d(2025, 6, 4)
}

fn task(id: u64, priority: Priority, due: Option<i64>) -> Task {
    let mut t = Task::new(id, format!("task {}", id), at(d(2025, 6, 1)));
    t.priority = Some(priority);
    t.due_date = due.map(|o| today() + Duration::days(o));
    t
}

#[test]
fn zone_examples() {
    let mut doing = task(1, Priority::Medium, Some(-1));
    doing.status = TaskStatus::Doing;
    assert_eq!(classify(&doing, today()), TaskZone::Urgent);
    doing.due_date = None;
    assert_eq!(classify(&doing, today()), TaskZone::NoDate);
    doing.status = TaskStatus::Done;
    assert_eq!(classify(&doing, today()), TaskZone::Done);
}

#[test]
fn smart_sort_tiers_end_to_end() {
    let a = task(1, Priority::High, Some(-1));
    let b = task(2, Priority::Low, Some(0));
    let c = task(3, Priority::High, Some(1));
    let d_ = task(4, Priority::Low, None);
    let mut e = task(5, Priority::High, Some(-1));
    e.status = TaskStatus::Done;

    let mut tasks = vec![e, d_, c, b, a];
    sort_tasks(&mut tasks, &[SortRule::DUE_DATE_ASC], today());
    let order: Vec<u64> = tasks.iter().map(|t| t.id).collect();
    assert_eq!(order, vec![1, 2, 3, 4, 5]);
}

#[test]
fn pinned_backlog_item_beats_urgent_work() {
    let mut pinned = task(1, Priority::Low, None);
    pinned.pinned = true;
    let urgent = task(2, Priority::High, Some(-2));
    assert_eq!(smart_compare(&pinned, &urgent, today()), std::cmp::Ordering::Less);
    assert_eq!(smart_compare(&urgent, &pinned, today()), std::cmp::Ordering::Greater);
}

#[test]
fn comparator_is_antisymmetric_over_a_mixed_list() {
    let mut tasks = vec![
        task(1, Priority::High, Some(-1)),
        task(2, Priority::Low, Some(0)),
        task(3, Priority::Medium, Some(3)),
        task(4, Priority::Low, None),
        task(5, Priority::High, None),
    ];
    tasks[3].pinned = true;
    tasks[4].status = TaskStatus::Done;
    for x in &tasks {
        for y in &tasks {
            assert_eq!(
                smart_compare(x, y, today()),
                smart_compare(y, x, today()).reverse(),
                "{} vs {}",
                x.id,
                y.id
            );
        }
    }
}
