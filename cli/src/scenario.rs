use serde::Deserialize;
use zoneplan::{
    AreaConstraint, AreaUnit, Connector, CountRule, DynamicRules, FloorPlan, RoomData, ShapeRule,
};

/// On-disk optimization scenario: the floors, the zone catalog with its
/// affinity matrix, the selected zones, and the soft rules.
#[derive(Debug, Deserialize)]
pub struct Scenario {
    /// Total gross floor area in square meters.
    pub total_gfa: f64,
    /// Zone catalog codes, in affinity-matrix order.
    pub codes: Vec<String>,
    /// Pairwise affinity matrix (negative = attract, positive = repel).
    pub affinity: Vec<Vec<f64>>,
    /// Selected zones with area constraints; empty selects the whole catalog.
    #[serde(default)]
    pub selected: Vec<AreaConstraint>,
    #[serde(default)]
    pub rules: DynamicRules,
    pub floors: Vec<FloorPlan>,
}

impl Scenario {
    pub fn room_data(&self) -> anyhow::Result<RoomData> {
        let rooms =
            RoomData::new(self.codes.clone(), self.affinity.clone(), self.selected.clone())?;
        Ok(rooms)
    }

    /// The built-in demo: a five-level mixed-use podium with a shared
    /// elevator, an escalator and one stair run.
    pub fn demo() -> Self {
        let codes: Vec<String> = ["ent", "lif", "esc", "sty", "bdr", "loc", "gen", "caf", "wc"]
            .map(String::from)
            .into();
        let n = codes.len();
        let idx = |code: &str| codes.iter().position(|c| c == code).unwrap_or(0);

        let mut affinity = vec![vec![0.0; n]; n];
        affinity[idx("ent")][idx("gen")] = -5.0;
        affinity[idx("esc")][idx("gen")] = -2.0;
        affinity[idx("caf")][idx("wc")] = 10.0;
        affinity[idx("bdr")][idx("caf")] = 3.0;

        let selected = vec![
            AreaConstraint::new("ent", Some(2.0), AreaUnit::Percent),
            AreaConstraint::new("lif", Some(1.0), AreaUnit::Percent),
            AreaConstraint::new("esc", Some(2.0), AreaUnit::Percent),
            AreaConstraint::new("sty", Some(1.0), AreaUnit::Percent),
            AreaConstraint::new("bdr", Some(5.0), AreaUnit::Percent),
            AreaConstraint::new("loc", Some(3.0), AreaUnit::Percent),
            AreaConstraint::new("gen", None, AreaUnit::Percent),
            AreaConstraint::new("caf", Some(1100.0), AreaUnit::Sqm),
            AreaConstraint::new("wc", Some(8.0), AreaUnit::Percent),
        ];

        let rules = DynamicRules {
            compactness: vec![ShapeRule::new("gen", 1.5)],
            rectangularity: vec![ShapeRule::new("caf", 2.0)],
            count_per_floor: vec![CountRule::new("wc", 1, 5.0)],
        };

        Self { total_gfa: 10900.0, codes, affinity, selected, rules, floors: demo_floors() }
    }
}

fn demo_floors() -> Vec<FloorPlan> {
    use std::collections::HashMap;

    vec![
        FloorPlan::new(
            "Level 2",
            vec![
                [-10.0, -36.0], [-10.0, -34.4], [-11.0, -34.4], [-12.06, -30.38],
                [-10.72, -29.26], [3.13, -29.26], [5.82, -26.67], [5.8, 39.0],
                [9.72, 39.01], [10.81, 37.16], [12.515, 37.15], [12.5, 38.094],
                [14.974, 38.08], [15.0, 37.2], [16.92, 37.185], [16.05, 22.33],
                [16.04, -33.016], [17.84, -34.95], [10.18, -42.28], [0.36, -42.28],
                [-3.38, -38.86], [-9.82, -38.81],
            ],
        )
        .with_fixed_elements(HashMap::from([
            ("ent".to_string(), vec![[13.7, 37.56], [-9.9, -37.43]]),
            ("bdr".to_string(), vec![[-13.3, -30.46], [11.74, 35.3]]),
            ("loc".to_string(), vec![[1.2, -39.54]]),
        ]))
        .with_connectors(vec![
            Connector::new([0.0, -35.0], "l", "lif"),
            Connector::new([8.67, -30.7], "e", "esc"),
            Connector::new([14.45, -3.93], "s", "sty"),
        ]),
        FloorPlan::new(
            "Level 3",
            vec![
                [-15.84, -31.3], [-12.86, -31.15], [-12.9, -29.3], [-10.4, -29.23],
                [-10.47, -23.4], [-7.12, -23.5], [-2.74, -19.56], [-2.8, 25.73],
                [-3.72, 25.4], [-3.72, 37.4], [-0.86, 35.68], [5.05, 35.68],
                [9.98, 38.3], [10.0, 30.0], [10.67, 30.1], [10.64, -0.66],
                [11.31, -11.0], [11.47, -28.9], [12.37, -30.07], [10.0, -32.22],
                [9.1, -31.6], [1.45, -38.7], [-10.23, -38.87], [-14.3, -35.0],
                [-15.76, -35.0],
            ],
        )
        .with_connectors(vec![
            Connector::new([-11.65, -30.5], "l", "lif"),
            Connector::new([-1.3, -25.9], "e", "esc"),
            Connector::new([8.0, 7.37], "s", "sty"),
        ]),
        FloorPlan::new(
            "Level 4",
            vec![
                [-38.5, -10.37], [-38.5, -17.65], [-21.55, -19.03], [-21.55, -20.14],
                [3.0, -20.0], [10.0, -19.0], [17.6, -19.0], [17.76, -15.37],
                [18.19, -15.37], [21.26, -18.3], [23.24, -18.32], [23.24, -16.45],
                [27.56, -12.45], [29.7, -12.4], [32.1, -10.17], [32.13, -8.2],
                [36.54, -3.98], [38.0, -4.0], [37.94, 2.67], [37.44, 2.78],
                [36.85, 11.8], [36.85, 18.25], [32.93, 18.17], [33.0, 20.0],
                [31.13, 19.92], [31.18, 12.0], [28.72, 12.05], [28.67, 12.97],
                [25.93, 12.84], [25.9, 9.74], [27.18, 9.77], [27.1, -3.54],
                [23.9, -6.38], [8.2, -6.42], [7.82, -6.78], [2.27, -6.7],
                [1.73, -6.34], [-13.24, -6.4], [-25.53, -7.93], [-25.63, -9.8],
                [-33.65, -10.84], [-33.94, -9.7],
            ],
        )
        .with_connectors(vec![
            Connector::new([20.42, -11.76], "l", "lif"),
            Connector::new([28.1, -8.28], "e", "esc"),
        ]),
        FloorPlan::new(
            "Level 5",
            vec![
                [-38.43, -21.22], [-37.98, -14.78], [-21.5, -12.5], [-21.44, -9.77],
                [25.23, -9.73], [27.15, -8.07], [27.24, 19.0], [36.23, 19.05],
                [38.34, 0.23], [38.3, -13.5], [37.94, -13.72], [38.27, -14.02],
                [36.32, -15.86], [36.04, -15.62], [28.93, -22.15], [7.76, -22.1],
                [-0.4, -23.35], [-26.58, -23.27], [-26.62, -22.29],
            ],
        )
        .with_connectors(vec![
            Connector::new([18.2, -14.16], "l", "lif"),
            Connector::new([26.9, -10.6], "e", "esc"),
        ]),
        FloorPlan::new(
            "Level 6",
            vec![
                [-38.77, -7.15], [-38.67, 0.66], [-16.38, 3.46], [-16.36, 4.47],
                [10.22, 4.47], [10.25, 3.12], [26.2, 3.12], [30.7, 7.28],
                [38.25, -0.05], [30.1, -7.74], [7.66, -7.7], [3.46, -8.5],
                [-21.36, -8.6],
            ],
        )
        .with_connectors(vec![
            Connector::new([20.0, -1.0], "l", "lif"),
            Connector::new([27.0, 2.0], "e", "esc"),
        ]),
    ]
}
