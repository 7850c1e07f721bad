use crossfacet::faculty::Faculty;

/// Small in-memory faculty sample shared by the demos
pub fn sample_faculty() -> Vec<Faculty> {
    let rows = [
        ("Male", "Prof", "B", 139_750, 18, 19),
        ("Male", "Prof", "B", 173_200, 16, 20),
        ("Male", "AsstProf", "B", 79_750, 3, 4),
        ("Male", "Prof", "B", 115_000, 39, 45),
        ("Male", "Prof", "B", 141_500, 41, 40),
        ("Male", "AssocProf", "B", 97_000, 6, 6),
        ("Female", "Prof", "B", 129_000, 23, 25),
        ("Female", "Prof", "A", 105_450, 18, 23),
        ("Female", "AssocProf", "A", 62_884, 14, 15),
        ("Female", "AsstProf", "A", 72_500, 2, 4),
        ("Female", "AsstProf", "B", 77_000, 3, 5),
        ("Male", "AssocProf", "A", 84_000, 11, 12),
    ];
    rows.into_iter()
        .map(|(sex, rank, discipline, salary, svc, phd)| Faculty {
            sex: sex.to_string(),
            rank: rank.to_string(),
            discipline: discipline.to_string(),
            salary,
            yrs_service: svc,
            yrs_since_phd: phd,
        })
        .collect()
}
