use std::io::Write;

use crossfacet::faculty::dashboard::SalaryDashboard;
use crossfacet::faculty::{load_csv, Faculty};
use crossfacet::{Average, FilterPredicate, Frame, Key, Reducer};

fn faculty(sex: &str, rank: &str, discipline: &str, salary: i64, svc: i64, phd: i64) -> Faculty {
    Faculty {
        sex: sex.into(),
        rank: rank.into(),
        discipline: discipline.into(),
        salary,
        yrs_service: svc,
        yrs_since_phd: phd,
    }
}

/// Deterministic dataset with repeated keys across several dimensions
fn synthetic(n: usize) -> Vec<Faculty> {
    (0..n)
        .map(|i| {
            faculty(
                ["Male", "Female"][i % 2],
                ["Prof", "AsstProf", "AssocProf"][i % 3],
                ["A", "B"][(i / 2) % 2],
                50_000 + (i as i64 * 7919) % 150_000,
                (i as i64 * 13) % 40,
                (i as i64 * 13) % 40 + 3,
            )
        })
        .collect()
}

#[test]
fn test_dashboard_from_csv_end_to_end() {
    let mut tmp = tempfile::NamedTempFile::new().unwrap();
    write!(
        tmp,
        "\"\",rank,discipline,yrs.since.phd,yrs.service,sex,salary\n\
         \"1\",\"Prof\",\"A\",10,8,\"Male\",100\n\
         \"2\",\"Prof\",\"B\",12,9,\"Female\",200\n\
         \"3\",\"AsstProf\",\"A\",3,1,\"Female\",50\n"
    )
    .unwrap();

    let records = load_csv(tmp.path()).unwrap();
    assert_eq!(records.len(), 3);

    let dash = SalaryDashboard::new(records).unwrap();

    // spec scenario: average-by-sex before any filter
    let averages = dash.average_salaries();
    let value = |key: &str| {
        averages
            .iter()
            .find(|r| r.key == Key::from(key))
            .unwrap()
            .value
    };
    assert_eq!(
        value("Male"),
        Average {
            count: 1,
            total: 100.0,
            average: 100.0
        }
    );
    assert_eq!(
        value("Female"),
        Average {
            count: 2,
            total: 250.0,
            average: 125.0
        }
    );

    // spec scenario: professor percentage among women
    assert_eq!(dash.percent_professors("Female"), 0.5);
}

#[test]
fn test_filter_to_empty_discipline_zeroes_all_groups() {
    let mut dash = SalaryDashboard::new(vec![
        faculty("Male", "Prof", "A", 100, 8, 10),
        faculty("Female", "Prof", "B", 200, 9, 12),
        faculty("Female", "AsstProf", "A", 50, 1, 3),
    ])
    .unwrap();

    dash.filter_discipline(Some("Theology")).unwrap();

    for row in dash.gender_balance() {
        assert_eq!(row.value, 0);
    }
    for row in dash.average_salaries() {
        assert_eq!(
            row.value,
            Average {
                count: 0,
                total: 0.0,
                average: 0.0
            }
        );
    }
    for stack in dash.rank_distribution() {
        for row in stack.rows {
            assert_eq!(row.value.ratio(), 0.0);
        }
    }
    assert_eq!(dash.percent_professors("Female"), 0.0);
    assert_eq!(dash.percent_professors("Male"), 0.0);
}

#[test]
fn test_set_then_clear_restores_exact_accumulators() {
    let records = synthetic(200);
    let mut frame = Frame::from_records(records);
    let sex = frame
        .dimension("sex", |r: &Faculty| Key::from(r.sex.clone()))
        .unwrap();
    let salary = frame
        .dimension("salary", |r: &Faculty| Key::from(r.salary))
        .unwrap();
    let avg = frame.group(sex, Reducer::average(|r: &Faculty| r.salary as f64));

    let before = frame.group_rows(avg);
    frame
        .filter(
            salary,
            Some(FilterPredicate::Between(
                Key::from(80_000),
                Key::from(120_000),
            )),
        )
        .unwrap();
    frame.filter(salary, None).unwrap();

    // remove is the exact inverse of add, so clearing lands on the exact
    // starting accumulators, including the floating-point totals
    assert_eq!(frame.group_rows(avg), before);
}

/// Recompute a group from scratch by folding `add` over the exempted
/// active subset, and compare with the incrementally maintained state.
#[test]
fn test_full_vs_incremental_equivalence() {
    let records = synthetic(300);

    let mut frame = Frame::from_records(records.clone());
    let sex = frame
        .dimension("sex", |r: &Faculty| Key::from(r.sex.clone()))
        .unwrap();
    let discipline = frame
        .dimension("discipline", |r: &Faculty| Key::from(r.discipline.clone()))
        .unwrap();
    let salary = frame
        .dimension("salary", |r: &Faculty| Key::from(r.salary))
        .unwrap();
    let avg = frame.group(sex, Reducer::average(|r: &Faculty| r.salary as f64));

    // mirrors of the filters currently applied, for the scratch recompute;
    // the avg group is exempt from the sex filter
    type Pred = Box<dyn Fn(&Faculty) -> bool>;
    let mut discipline_pred: Option<Pred> = None;
    let mut salary_pred: Option<Pred> = None;

    let schedule: Vec<(&str, Option<FilterPredicate>, Option<Pred>)> = vec![
        (
            "discipline",
            Some(FilterPredicate::Equals(Key::from("A"))),
            Some(Box::new(|r: &Faculty| r.discipline == "A")),
        ),
        (
            "salary",
            Some(FilterPredicate::Between(
                Key::from(70_000),
                Key::from(150_000),
            )),
            Some(Box::new(|r: &Faculty| {
                (70_000..150_000).contains(&r.salary)
            })),
        ),
        (
            "salary",
            Some(FilterPredicate::GreaterThan(Key::from(100_000))),
            Some(Box::new(|r: &Faculty| r.salary > 100_000)),
        ),
        ("discipline", None, None),
        (
            "salary",
            Some(FilterPredicate::Custom(std::rc::Rc::new(|k: &Key| {
                k.as_int().is_some_and(|v| v % 2 == 1)
            }))),
            Some(Box::new(|r: &Faculty| r.salary % 2 == 1)),
        ),
        ("salary", None, None),
        (
            "sex",
            Some(FilterPredicate::Equals(Key::from("Female"))),
            None, // exempt for the avg group: never part of the scratch set
        ),
    ];

    for (dim_name, engine_pred, scratch_pred) in schedule {
        match dim_name {
            "discipline" => {
                frame.filter(discipline, engine_pred).unwrap();
                discipline_pred = scratch_pred;
            }
            "salary" => {
                frame.filter(salary, engine_pred).unwrap();
                salary_pred = scratch_pred;
            }
            _ => {
                frame.filter(sex, engine_pred).unwrap();
            }
        }

        // scratch recompute: every filter except the sex dimension's own
        let mut expected: std::collections::HashMap<String, Average> =
            std::collections::HashMap::new();
        for r in &records {
            expected.entry(r.sex.clone()).or_default();
            let passes = discipline_pred.as_ref().is_none_or(|p| p(r))
                && salary_pred.as_ref().is_none_or(|p| p(r));
            if passes {
                let acc = expected.get_mut(&r.sex).unwrap();
                acc.count += 1;
                acc.total += r.salary as f64;
                acc.average = acc.total / acc.count as f64;
            }
        }

        for row in frame.group_rows(avg) {
            let key = row.key.as_str().unwrap().to_string();
            assert_eq!(row.value, expected[&key], "key {key} after {dim_name}");
        }
    }
}

#[test]
fn test_groups_registered_before_and_after_filters_agree() {
    let records = synthetic(100);
    let mut frame = Frame::from_records(records);
    let sex = frame
        .dimension("sex", |r: &Faculty| Key::from(r.sex.clone()))
        .unwrap();
    let discipline = frame
        .dimension("discipline", |r: &Faculty| Key::from(r.discipline.clone()))
        .unwrap();

    let early = frame.group_count(sex);
    frame
        .filter(discipline, Some(FilterPredicate::Equals(Key::from("B"))))
        .unwrap();
    // a group attached after a filter starts from the filtered subset
    let late = frame.group_count(sex);

    assert_eq!(frame.group_rows(early), frame.group_rows(late));
}

#[test]
fn test_loader_error_names_column_and_row() {
    let mut tmp = tempfile::NamedTempFile::new().unwrap();
    write!(
        tmp,
        "\"\",rank,discipline,yrs.since.phd,yrs.service,sex,salary\n\
         \"1\",\"Prof\",\"A\",10,8,\"Male\",100\n\
         \"2\",\"Prof\",\"B\",twelve,9,\"Female\",200\n"
    )
    .unwrap();

    match load_csv(tmp.path()) {
        Err(crossfacet::FacetError::DataFormat { column, row, value }) => {
            assert_eq!(column, "yrs.since.phd");
            assert_eq!(row, 3);
            assert_eq!(value, "twelve");
        }
        other => panic!("expected DataFormat error, got {other:?}"),
    }
}
