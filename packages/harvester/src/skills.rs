//! Key-skill frequency report over full vacancy records.

use hh_client::VacancyDetail;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillCount {
    pub name: String,
    pub count: usize,
}

/// Count every `key_skills[].name` across `details`, most frequent first.
/// Ties are ordered by name.
pub fn count_key_skills(details: &[VacancyDetail]) -> Vec<SkillCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for skill in details.iter().flat_map(|d| d.key_skills.iter()) {
        *counts.entry(skill.name.as_str()).or_default() += 1;
    }

    let mut report: Vec<SkillCount> = counts
        .into_iter()
        .map(|(name, count)| SkillCount {
            name: name.to_string(),
            count,
        })
        .collect();
    report.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    report
}
