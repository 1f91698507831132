//! Starter habit templates offered on first run.

use crate::model::habit::NewHabit;
use log::warn;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StarterTemplate {
    pub id: &'static str,
    pub name: &'static str,
}

pub const STARTER_TEMPLATES: &[StarterTemplate] = &[
    StarterTemplate {
        id: "t1",
        name: "Drink Water",
    },
    StarterTemplate {
        id: "t2",
        name: "Morning Stretch",
    },
    StarterTemplate {
        id: "t3",
        name: "Meditate",
    },
    StarterTemplate {
        id: "t4",
        name: "Read for 20min",
    },
    StarterTemplate {
        id: "t5",
        name: "Journal",
    },
    StarterTemplate {
        id: "t6",
        name: "Walk 10,000 steps",
    },
];

pub fn find_template(id: &str) -> Option<&'static StarterTemplate> {
    STARTER_TEMPLATES.iter().find(|template| template.id == id)
}

/// Builds import input from selected template ids, in selection order.
///
/// Unknown ids are skipped.
pub fn new_habits(ids: &[&str]) -> Vec<NewHabit> {
    ids.iter()
        .filter_map(|id| {
            let template = find_template(id);
            if template.is_none() {
                warn!(
                    "event=template_select module=templates status=skipped template_id={}",
                    id
                );
            }
            template
        })
        .map(|template| NewHabit::new(template.name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{find_template, new_habits, STARTER_TEMPLATES};

    #[test]
    fn catalogue_ids_are_unique() {
        let mut ids: Vec<&str> = STARTER_TEMPLATES.iter().map(|t| t.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), STARTER_TEMPLATES.len());
        assert_eq!(find_template("t3").map(|t| t.name), Some("Meditate"));
    }

    #[test]
    fn selection_keeps_order_and_skips_unknown_ids() {
        let habits = new_habits(&["t4", "nope", "t3"]);
        let names: Vec<&str> = habits.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["Read for 20min", "Meditate"]);
    }
}
