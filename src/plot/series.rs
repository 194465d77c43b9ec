use super::table::MergedTable;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Unit {
    Percent,
    Megabytes,
    Unitless,
}

impl Unit {
    /// Tags a column by name: `cpu`/`percent` columns are percentages, other
    /// `mem` columns are megabytes.
    pub fn for_column(name: &str) -> Self {
        if name.contains("cpu") || name.contains("percent") {
            Unit::Percent
        } else if name.contains("mem") {
            Unit::Megabytes
        } else {
            Unit::Unitless
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Unit::Percent => "%",
            Unit::Megabytes => "MB",
            Unit::Unitless => "",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GroupKind {
    Cpu,
    Mem,
}

impl GroupKind {
    pub const ALL: [GroupKind; 2] = [GroupKind::Cpu, GroupKind::Mem];

    pub fn key(self) -> &'static str {
        match self {
            GroupKind::Cpu => "cpu",
            GroupKind::Mem => "mem",
        }
    }

    pub fn contains(self, series_name: &str) -> bool {
        series_name.contains(self.key())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Series {
    pub name: String,
    pub unit: Unit,
    pub points: Vec<(f64, f64)>,
}

impl Series {
    pub fn label(&self) -> String {
        match self.unit {
            Unit::Unitless => self.name.clone(),
            unit => format!("{} [{}]", self.name, unit.label()),
        }
    }

    pub fn max_y(&self) -> f64 {
        self.points.iter().map(|p| p.1).fold(0.0, f64::max)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Group {
    pub kind: GroupKind,
    /// Indices into [`PlotModel::series`].
    pub members: Vec<usize>,
}

/// Everything the viewer needs to draw a finished session.
#[derive(Clone, Debug, PartialEq)]
pub struct PlotModel {
    pub title: String,
    pub series: Vec<Series>,
    pub groups: Vec<Group>,
}

impl PlotModel {
    pub fn from_merged(title: String, merged: &MergedTable) -> Self {
        let series: Vec<Series> = merged
            .columns
            .iter()
            .map(|(name, values)| Series {
                name: name.clone(),
                unit: Unit::for_column(name),
                points: merged.time.iter().copied().zip(values.iter().copied()).collect(),
            })
            .collect();

        let groups = GroupKind::ALL
            .iter()
            .map(|&kind| Group {
                kind,
                members: series
                    .iter()
                    .enumerate()
                    .filter(|(_, s)| kind.contains(&s.name))
                    .map(|(i, _)| i)
                    .collect(),
            })
            .collect();

        PlotModel {
            title,
            series,
            groups,
        }
    }

    pub fn group(&self, kind: GroupKind) -> Option<&Group> {
        self.groups.iter().find(|g| g.kind == kind)
    }

    pub fn group_series(&self, kind: GroupKind) -> Vec<&Series> {
        self.group(kind)
            .map(|g| g.members.iter().filter_map(|&i| self.series.get(i)).collect())
            .unwrap_or_default()
    }

    /// Time range covered by the session, `[0, 1]` when empty.
    pub fn x_bounds(&self) -> [f64; 2] {
        let xs = self.series.iter().flat_map(|s| s.points.iter().map(|p| p.0));
        let (min, max) = xs.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), x| {
            (lo.min(x), hi.max(x))
        });
        if min.is_finite() && max > min {
            [min, max]
        } else if min.is_finite() {
            [min, min + 1.0]
        } else {
            [0.0, 1.0]
        }
    }

    /// `[0, max]` over a group, padded so flat lines stay visible.
    pub fn y_bounds(&self, kind: GroupKind) -> [f64; 2] {
        let max = self
            .group_series(kind)
            .iter()
            .map(|s| s.max_y())
            .fold(0.0, f64::max);
        if max > 0.0 { [0.0, max * 1.05] } else { [0.0, 1.0] }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn units_follow_column_names() {
        assert_eq!(Unit::for_column("sys.cpu"), Unit::Percent);
        assert_eq!(Unit::for_column("sys.mem.percent"), Unit::Percent);
        assert_eq!(Unit::for_column("child.12.mem"), Unit::Megabytes);
        assert_eq!(Unit::for_column("pid.mem_total"), Unit::Megabytes);
        assert_eq!(Unit::for_column("io.reads"), Unit::Unitless);
    }

    #[test]
    fn groups_split_cpu_and_mem() {
        let merged = MergedTable {
            time: vec![0.0, 1.0],
            columns: vec![
                ("sys.mem.percent".to_string(), vec![10.0, 20.0]),
                ("sys.cpu".to_string(), vec![1.0, 2.0]),
                ("pid.mem".to_string(), vec![5.0, 6.0]),
                ("pid.cpu".to_string(), vec![0.0, 100.0]),
            ],
        };
        let model = PlotModel::from_merged("t".into(), &merged);

        assert_eq!(model.group(GroupKind::Cpu).unwrap().members, vec![1, 3]);
        assert_eq!(model.group(GroupKind::Mem).unwrap().members, vec![0, 2]);
        assert_eq!(model.series[2].points, vec![(0.0, 5.0), (1.0, 6.0)]);
        assert_eq!(model.series[2].label(), "pid.mem [MB]");
        assert_eq!(model.x_bounds(), [0.0, 1.0]);
        let [lo, hi] = model.y_bounds(GroupKind::Cpu);
        assert_eq!(lo, 0.0);
        assert!((hi - 105.0).abs() < 1e-9);
    }

    #[test]
    fn empty_model_has_default_bounds() {
        let model = PlotModel::from_merged("t".into(), &MergedTable::default());
        assert_eq!(model.x_bounds(), [0.0, 1.0]);
        assert_eq!(model.y_bounds(GroupKind::Mem), [0.0, 1.0]);
    }
}
