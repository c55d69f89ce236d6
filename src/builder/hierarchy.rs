//! Creation order for self-referential collections.
//!
//! Records form a forest through their parent field. Roots (empty parent) are
//! visited in source order and children are queued in source order behind
//! their parent, so every parent is created before its children. Records the
//! walk never reaches are orphans: their chain either ends at a parent that
//! is not in the source set, or loops back onto itself.

use crate::snapshot::SourceRecord;
use std::collections::{HashMap, VecDeque};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HierarchyPlan {
    /// Source indices in creation order.
    pub order: Vec<usize>,
    /// Unreached source indices, in source order.
    pub orphans: Vec<usize>,
    /// Orphans that sit on a parent cycle, in source order.
    pub cyclic: Vec<usize>,
}

impl HierarchyPlan {
    pub fn broken_chain(&self) -> usize {
        self.orphans.len() - self.cyclic.len()
    }
}

pub fn plan_hierarchy(records: &[SourceRecord], parent_field: &str) -> HierarchyPlan {
    let position: HashMap<&str, usize> = records
        .iter()
        .enumerate()
        .map(|(i, record)| (record.id.as_str(), i))
        .collect();
    let parents: Vec<Option<&str>> = records
        .iter()
        .map(|record| record.get_str(parent_field))
        .collect();

    let mut children: HashMap<&str, Vec<usize>> = HashMap::new();
    let mut queue = VecDeque::new();
    for (i, parent) in parents.iter().enumerate() {
        match *parent {
            Some(parent) => children.entry(parent).or_default().push(i),
            None => queue.push_back(i),
        }
    }

    let mut reached = vec![false; records.len()];
    let mut order = Vec::with_capacity(records.len());
    while let Some(i) = queue.pop_front() {
        reached[i] = true;
        order.push(i);
        if let Some(kids) = children.get(records[i].id.as_str()) {
            queue.extend(kids.iter().copied());
        }
    }

    let orphans: Vec<usize> = (0..records.len()).filter(|&i| !reached[i]).collect();
    let on_cycle = cycle_members(&parents, &position, &reached);
    let cyclic = orphans.iter().copied().filter(|&i| on_cycle[i]).collect();

    HierarchyPlan {
        order,
        orphans,
        cyclic,
    }
}

/// Marks unreached records whose parent chain returns to themselves.
fn cycle_members(
    parents: &[Option<&str>],
    position: &HashMap<&str, usize>,
    reached: &[bool],
) -> Vec<bool> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        New,
        OnPath,
        Done,
    }

    let mut marks = vec![Mark::New; parents.len()];
    let mut on_cycle = vec![false; parents.len()];

    for start in 0..parents.len() {
        if reached[start] || marks[start] != Mark::New {
            continue;
        }
        let mut path = Vec::new();
        let mut current = Some(start);
        while let Some(i) = current {
            match marks[i] {
                Mark::Done => break,
                Mark::OnPath => {
                    // Everything on the path from `i` onward forms the loop.
                    if let Some(from) = path.iter().position(|&p| p == i) {
                        for &member in &path[from..] {
                            on_cycle[member] = true;
                        }
                    }
                    break;
                }
                Mark::New => {
                    marks[i] = Mark::OnPath;
                    path.push(i);
                    current = parents[i].and_then(|parent| position.get(parent).copied());
                }
            }
        }
        for i in path {
            marks[i] = Mark::Done;
        }
    }

    on_cycle
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FieldMap;
    use serde_json::json;

    fn node(id: &str, parent: &str) -> SourceRecord {
        let mut fields = FieldMap::new();
        fields.insert("parent".into(), json!(parent));
        SourceRecord::new(id, fields)
    }

    fn ids(records: &[SourceRecord], indices: &[usize]) -> Vec<String> {
        indices.iter().map(|&i| records[i].id.to_string()).collect()
    }

    #[test]
    fn test_parents_come_first() {
        let records = vec![
            node("C", "B"),
            node("B", "A"),
            node("A", ""),
            node("D", "A"),
            node("E", ""),
        ];
        let plan = plan_hierarchy(&records, "parent");
        assert_eq!(ids(&records, &plan.order), vec!["A", "E", "B", "D", "C"]);
        assert!(plan.orphans.is_empty());
    }

    #[test]
    fn test_missing_parent_orphans_subtree() {
        let records = vec![
            node("A", ""),
            node("X", "GONE"),
            node("Y", "X"),
            node("Z", "Y"),
        ];
        let plan = plan_hierarchy(&records, "parent");
        assert_eq!(ids(&records, &plan.order), vec!["A"]);
        assert_eq!(ids(&records, &plan.orphans), vec!["X", "Y", "Z"]);
        assert!(plan.cyclic.is_empty());
        assert_eq!(plan.broken_chain(), 3);
    }

    #[test]
    fn test_cycle_is_orphaned_and_reported() {
        let records = vec![
            node("A", ""),
            node("P", "Q"),
            node("Q", "P"),
            node("R", "Q"),
            node("S", "S"),
        ];
        let plan = plan_hierarchy(&records, "parent");
        assert_eq!(ids(&records, &plan.order), vec!["A"]);
        assert_eq!(ids(&records, &plan.orphans), vec!["P", "Q", "R", "S"]);
        assert_eq!(ids(&records, &plan.cyclic), vec!["P", "Q", "S"]);
        assert_eq!(plan.broken_chain(), 1);
    }

    #[test]
    fn test_missing_parent_field_is_a_root() {
        let records = vec![SourceRecord::new("A", FieldMap::new()), node("B", "A")];
        let plan = plan_hierarchy(&records, "parent");
        assert_eq!(ids(&records, &plan.order), vec!["A", "B"]);
    }
}
