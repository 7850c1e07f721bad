use crate::engine::dimension::DimensionHandle;
use crate::engine::frame::Frame;
use crate::engine::group::{Average, Fraction, GroupAllHandle, GroupHandle, Reducer};
use crate::engine::{FacetError, FilterPredicate, GroupRow, Key};
use crate::faculty::{Faculty, RANKS};

/// One stack of the rank-distribution chart: a rank category and its
/// per-gender share of that category
#[derive(Debug, Clone)]
pub struct RankStack {
    pub rank: &'static str,
    pub rows: Vec<GroupRow<Fraction>>,
}

/// The data side of the salary dashboard: every chart's dimensions and
/// groups wired to one frame, with the chart widgets themselves left to an
/// external rendering collaborator.
///
/// Each chart gets its own dimension (even when several project the same
/// field) so the self-filter exemption applies per chart, exactly as the
/// original dashboard behaves.
pub struct SalaryDashboard {
    frame: Frame<Faculty>,
    discipline_dim: DimensionHandle,
    discipline_counts: GroupHandle<i64>,
    balance_dim: DimensionHandle,
    gender_balance: GroupHandle<i64>,
    average_salary: GroupHandle<Average>,
    rank_stacks: Vec<(&'static str, GroupHandle<Fraction>)>,
    pct_prof_women: GroupAllHandle<Fraction>,
    pct_prof_men: GroupAllHandle<Fraction>,
    service_dim: DimensionHandle,
    service_salary: GroupHandle<i64>,
    phd_dim: DimensionHandle,
    phd_salary: GroupHandle<i64>,
}

/// Share of professors among records of one gender, over the whole active
/// subset (both counters move only for records of that gender)
fn professor_share(gender: &str) -> Reducer<Faculty, Fraction> {
    let gender_add = gender.to_string();
    let gender_remove = gender.to_string();
    Reducer::new(
        Fraction::default,
        move |mut acc, r: &Faculty| {
            if r.sex == gender_add {
                acc.total += 1;
                if r.rank == "Prof" {
                    acc.matched += 1;
                }
            }
            acc
        },
        move |mut acc, r: &Faculty| {
            if r.sex == gender_remove {
                acc.total -= 1;
                if r.rank == "Prof" {
                    acc.matched -= 1;
                }
            }
            acc
        },
    )
}

impl SalaryDashboard {
    pub fn new(records: Vec<Faculty>) -> Result<Self, FacetError> {
        let mut frame = Frame::from_records(records);

        let discipline_dim =
            frame.dimension("discipline", |r: &Faculty| Key::from(r.discipline.clone()))?;
        let discipline_counts = frame.group_count(discipline_dim);

        let pct_prof_women = frame.group_all(professor_share("Female"));
        let pct_prof_men = frame.group_all(professor_share("Male"));

        let balance_dim = frame.dimension("sex", |r: &Faculty| Key::from(r.sex.clone()))?;
        let gender_balance = frame.group_count(balance_dim);

        let salary_dim = frame.dimension("sex", |r: &Faculty| Key::from(r.sex.clone()))?;
        let average_salary =
            frame.group(salary_dim, Reducer::average(|r: &Faculty| r.salary as f64));

        let rank_dim = frame.dimension("sex", |r: &Faculty| Key::from(r.sex.clone()))?;
        let mut rank_stacks = Vec::with_capacity(RANKS.len());
        for rank in RANKS {
            let group = frame.group(rank_dim, Reducer::fraction(move |r: &Faculty| r.rank == rank));
            rank_stacks.push((rank, group));
        }

        let service_dim =
            frame.dimension("yrs_service", |r: &Faculty| Key::from(r.yrs_service))?;
        let service_scatter = frame.dimension("service_salary", |r: &Faculty| {
            Key::Composite(vec![
                Key::from(r.yrs_service),
                Key::from(r.salary),
                Key::from(r.rank.clone()),
                Key::from(r.sex.clone()),
            ])
        })?;
        let service_salary = frame.group_count(service_scatter);

        let phd_dim =
            frame.dimension("yrs_since_phd", |r: &Faculty| Key::from(r.yrs_since_phd))?;
        let phd_scatter = frame.dimension("phd_salary", |r: &Faculty| {
            Key::Composite(vec![
                Key::from(r.yrs_since_phd),
                Key::from(r.salary),
                Key::from(r.rank.clone()),
                Key::from(r.sex.clone()),
            ])
        })?;
        let phd_salary = frame.group_count(phd_scatter);

        Ok(SalaryDashboard {
            frame,
            discipline_dim,
            discipline_counts,
            balance_dim,
            gender_balance,
            average_salary,
            rank_stacks,
            pct_prof_women,
            pct_prof_men,
            service_dim,
            service_salary,
            phd_dim,
            phd_salary,
        })
    }

    /// Discipline selector: apply or clear (with `None`) the discipline
    /// filter — a UI control entry point
    pub fn filter_discipline(&mut self, discipline: Option<&str>) -> Result<(), FacetError> {
        self.frame.filter(
            self.discipline_dim,
            discipline.map(|d| FilterPredicate::Equals(Key::from(d))),
        )
    }

    /// Gender-balance bar click: apply or clear the sex filter
    pub fn filter_sex(&mut self, sex: Option<&str>) -> Result<(), FacetError> {
        self.frame.filter(
            self.balance_dim,
            sex.map(|s| FilterPredicate::Equals(Key::from(s))),
        )
    }

    /// Options for the discipline select menu, with active-record counts
    pub fn discipline_options(&self) -> Vec<GroupRow<i64>> {
        self.frame.group_rows(self.discipline_counts)
    }

    pub fn gender_balance(&self) -> Vec<GroupRow<i64>> {
        self.frame.group_rows(self.gender_balance)
    }

    pub fn average_salaries(&self) -> Vec<GroupRow<Average>> {
        self.frame.group_rows(self.average_salary)
    }

    /// The stacked rank-distribution chart: per rank category, the share of
    /// each gender's records holding that rank
    pub fn rank_distribution(&self) -> Vec<RankStack> {
        self.rank_stacks
            .iter()
            .map(|&(rank, group)| RankStack {
                rank,
                rows: self.frame.group_rows(group),
            })
            .collect()
    }

    /// Percentage of one gender's records that are professors, over the
    /// active subset; 0 when no records of that gender remain
    pub fn percent_professors(&self, gender: &str) -> f64 {
        let handle = match gender {
            "Female" => self.pct_prof_women,
            _ => self.pct_prof_men,
        };
        self.frame.group_all_value(handle).ratio()
    }

    /// Scatter points for the service/salary correlation: composite keys
    /// `[yrs_service, salary, rank, sex]` with active-record counts
    pub fn service_salary_points(&self) -> Vec<GroupRow<i64>> {
        self.frame.group_rows(self.service_salary)
    }

    pub fn phd_salary_points(&self) -> Vec<GroupRow<i64>> {
        self.frame.group_rows(self.phd_salary)
    }

    /// X-axis domain of the service/salary chart: `bottom(1)`/`top(1)` of
    /// years of service over the active subset
    pub fn service_range(&self) -> Result<Option<(i64, i64)>, FacetError> {
        Self::axis_range(&self.frame, self.service_dim, |r| r.yrs_service)
    }

    pub fn phd_range(&self) -> Result<Option<(i64, i64)>, FacetError> {
        Self::axis_range(&self.frame, self.phd_dim, |r| r.yrs_since_phd)
    }

    fn axis_range(
        frame: &Frame<Faculty>,
        dim: DimensionHandle,
        value: impl Fn(&Faculty) -> i64,
    ) -> Result<Option<(i64, i64)>, FacetError> {
        let min = frame.bottom(dim, 1)?;
        let max = frame.top(dim, 1)?;
        Ok(match (min.first(), max.first()) {
            (Some(lo), Some(hi)) => Some((value(lo), value(hi))),
            _ => None,
        })
    }
}
