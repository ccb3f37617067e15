//! Text and JSON views of a loaded grid.

use serde_json::{json, Map, Value};
use staffgrid_core::{format_hours, Assignment};
use staffgrid_engine::{DetailState, GridController};

const LABEL_WIDTH: usize = 28;
const CELL_WIDTH: usize = 8;

fn project_label(grid: &GridController, a: &Assignment) -> String {
    a.project_name
        .clone()
        .or_else(|| grid.project(a.project_id).map(|p| p.name.clone()))
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| format!("project {}", a.project_id))
}

fn fit(label: &str, width: usize) -> String {
    if label.chars().count() <= width {
        format!("{:<width$}", label, width = width)
    } else {
        let cut: String = label.chars().take(width - 1).collect();
        format!("{}…", cut)
    }
}

/// One line per person (weekly totals), then one per visible assignment.
pub fn render_table(grid: &GridController) -> String {
    let mut out = String::new();
    out.push_str(&fit("", LABEL_WIDTH));
    for label in grid.axis().labels() {
        out.push_str(&format!("{:>width$}", label, width = CELL_WIDTH));
    }
    out.push('\n');

    for visible in grid.visible_rows() {
        let Some(person) = grid.rows().person(visible.person_id) else {
            continue;
        };
        let mut name = if person.name.is_empty() {
            format!("person {}", person.person_id)
        } else {
            person.name.clone()
        };
        if person.detail == DetailState::Collapsed {
            name.push_str(" (+)");
        }
        out.push_str(&fit(&name, LABEL_WIDTH));
        for week in grid.axis().keys() {
            let total = format_hours(grid.total(person.person_id, week));
            out.push_str(&format!("{:>width$}", total, width = CELL_WIDTH));
        }
        out.push('\n');

        for id in &visible.assignments {
            let Some(a) = grid.rows().assignment(*id) else {
                continue;
            };
            out.push_str(&fit(&format!("  {} #{}", project_label(grid, a), a.id), LABEL_WIDTH));
            for week in grid.axis().keys() {
                let cell = a.weekly_hours.get(week).map(|h| format_hours(*h)).unwrap_or_else(|| "-".into());
                out.push_str(&format!("{:>width$}", cell, width = CELL_WIDTH));
            }
            out.push('\n');
        }
    }
    out
}

pub fn render_json(grid: &GridController) -> Value {
    let people: Vec<Value> = grid
        .visible_rows()
        .into_iter()
        .filter_map(|visible| {
            let person = grid.rows().person(visible.person_id)?;
            let mut totals = Map::new();
            for week in grid.axis().keys() {
                totals.insert(week.to_string(), json!(grid.total(person.person_id, week)));
            }
            let assignments: Vec<Value> = visible
                .assignments
                .iter()
                .filter_map(|id| grid.rows().assignment(*id))
                .map(|a| {
                    json!({
                        "id": a.id,
                        "project_id": a.project_id,
                        "project": project_label(grid, a),
                        "weekly_hours": a.weekly_hours,
                    })
                })
                .collect();
            Some(json!({
                "id": person.person_id,
                "name": person.name,
                "detail": match person.detail {
                    DetailState::Collapsed => "collapsed",
                    DetailState::Loaded => "loaded",
                },
                "totals": totals,
                "assignments": assignments,
            }))
        })
        .collect();

    json!({
        "weeks": grid.axis().keys(),
        "people": people,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use staffgrid_client::{PersonSummary, Snapshot};
    use staffgrid_core::WeekKey;
    use staffgrid_engine::{AcquisitionPath, LoadOutcome, LoadRequest};

    fn grid() -> GridController {
        let mut a = Assignment::new(42, 7, 3).with_hours([("2024-01-01", 10.0), ("2024-01-08", 2.5)]);
        a.project_name = Some("Harbor Retrofit".into());
        let snapshot = Snapshot {
            week_keys: vec![WeekKey::from("2024-01-01"), WeekKey::from("2024-01-08")],
            people: vec![
                PersonSummary { id: 7, name: "Ada Park".into() },
                PersonSummary { id: 9, name: "Sam Ortiz".into() },
            ],
            rows: vec![a],
            ..Snapshot::default()
        };
        let mut grid = GridController::default();
        let ticket = grid.begin_load(LoadRequest::new(2));
        grid.finish_load(ticket, Ok(LoadOutcome { snapshot, path: AcquisitionPath::Sync, warning: None }))
            .unwrap();
        grid
    }

    #[test]
    fn test_render_table() {
        let text = render_table(&grid());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains("Jan 01") && lines[0].contains("Jan 08"));
        assert!(lines[1].starts_with("Ada Park"));
        assert!(lines[1].trim_end().ends_with("2.5"));
        assert!(lines[2].starts_with("  Harbor Retrofit #42"));
        assert!(lines[3].starts_with("Sam Ortiz (+)"));
    }

    #[test]
    fn test_render_json() {
        let v = render_json(&grid());
        assert_eq!(v["weeks"][1], "2024-01-08");
        assert_eq!(v["people"][0]["totals"]["2024-01-01"], 10.0);
        assert_eq!(v["people"][0]["assignments"][0]["weekly_hours"]["2024-01-08"], 2.5);
        assert_eq!(v["people"][1]["detail"], "collapsed");
        assert_eq!(v["people"][1]["totals"]["2024-01-08"], 0.0);
    }

    #[test]
    fn test_fit_truncates() {
        assert_eq!(fit("abc", 5), "abc  ");
        assert_eq!(fit("abcdefgh", 5), "abcd…");
    }
}
