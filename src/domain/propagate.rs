//! Forward propagation of hierarchical classification
//!
//! Block codes, the infrastructure flag and level labels are only decided on
//! summary rows. Child rows inherit the nearest preceding decided value, in the
//! order the rows were exported.

use super::task::{Task, MAX_LABEL_LEVEL};

/// Fills each `None` with the last `Some` seen before it
///
/// Leading `None`s stay `None`.
pub fn forward_fill<V: Clone>(values: impl IntoIterator<Item = Option<V>>) -> Vec<Option<V>> {
    values
        .into_iter()
        .scan(None, |last: &mut Option<V>, value| {
            if value.is_some() {
                *last = value;
            }
            Some(last.clone())
        })
        .collect()
}

/// Runs one forward-fill pass over a single task column
fn fill_column<V, G, S>(tasks: Vec<Task>, get: G, set: S) -> Vec<Task>
where
    V: Clone,
    G: Fn(&Task) -> Option<V>,
    S: Fn(&mut Task, Option<V>),
{
    let filled = forward_fill(tasks.iter().map(get));
    tasks
        .into_iter()
        .zip(filled)
        .map(|(mut task, value)| {
            set(&mut task, value);
            task
        })
        .collect()
}

/// Second pipeline pass
#[derive(Debug, Clone, Copy, Default)]
pub struct ForwardPropagator;

impl ForwardPropagator {
    pub fn new() -> Self {
        Self
    }

    /// Propagates block codes, infra flags and level labels down the sequence
    pub fn propagate(&self, tasks: Vec<Task>) -> Vec<Task> {
        let tasks = fill_column(tasks, |t| t.block_code.clone(), |t, v| t.block_code = v);
        let mut tasks = fill_column(tasks, |t| t.is_infra, |t, v| t.is_infra = v);

        let deepest = tasks
            .iter()
            .filter_map(|t| t.outline_level)
            .max()
            .unwrap_or(0) as usize;

        for index in 0..deepest.min(MAX_LABEL_LEVEL) {
            tasks = fill_column(
                tasks,
                |t| t.level_labels.get(index).cloned().flatten(),
                |t, v| {
                    if let Some(label) = t.level_labels.get_mut(index) {
                        *label = v;
                    }
                },
            );
        }

        tasks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::coding::level_labels;

    fn task(id: i64, level: u32, block: Option<&str>, infra: Option<bool>) -> Task {
        let mut t = Task::new(id, format!("Task {}", id));
        t.outline_level = Some(level);
        t.block_code = block.map(String::from);
        t.is_infra = infra;
        t.level_labels = level_labels(&t.service_name, Some(level));
        t
    }

    #[test]
    fn fills_forward() {
        let filled = forward_fill(vec![Some("B.01"), None, None]);
        assert_eq!(filled, vec![Some("B.01"), Some("B.01"), Some("B.01")]);
    }

    #[test]
    fn leading_none_stays_none() {
        let filled = forward_fill(vec![None, Some(1), None, Some(2), None]);
        assert_eq!(filled, vec![None, Some(1), Some(1), Some(2), Some(2)]);
    }

    #[test]
    fn empty_input() {
        let filled: Vec<Option<u8>> = forward_fill(Vec::new());
        assert!(filled.is_empty());
    }

    #[test]
    fn propagates_block_and_infra_in_input_order() {
        let tasks = vec![
            task(1, 1, None, Some(false)),
            task(2, 3, Some("B.01"), Some(true)),
            task(3, 6, None, None),
            task(4, 3, Some("B.02"), Some(true)),
            task(5, 4, None, Some(false)),
            task(6, 6, None, None),
        ];

        let tasks = ForwardPropagator::new().propagate(tasks);
        let blocks: Vec<_> = tasks.iter().map(|t| t.block_code.as_deref()).collect();
        let infra: Vec<_> = tasks.iter().map(|t| t.is_infra).collect();

        assert_eq!(
            blocks,
            vec![None, Some("B.01"), Some("B.01"), Some("B.02"), Some("B.02"), Some("B.02")]
        );
        assert_eq!(
            infra,
            vec![Some(false), Some(true), Some(true), Some(true), Some(false), Some(false)]
        );
    }

    #[test]
    fn labels_inherit_parent_names() {
        let tasks = vec![task(1, 1, None, None), task(2, 2, None, None), task(3, 3, None, None)];
        let tasks = ForwardPropagator::new().propagate(tasks);

        assert_eq!(tasks[2].level_label(1), Some("Task 1"));
        assert_eq!(tasks[2].level_label(2), Some("Task 2"));
        assert_eq!(tasks[2].level_label(3), Some("Task 3"));
        assert_eq!(tasks[1].level_label(1), Some("Task 1"));
    }

    #[test]
    fn preserves_length_and_order() {
        let tasks = vec![task(3, 2, None, None), task(1, 1, None, None), task(2, 3, None, None)];
        let tasks = ForwardPropagator::new().propagate(tasks);
        let ids: Vec<_> = tasks.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }
}
