//! Flat-to-tree aggregation for the backlog hierarchy.
//!
//! The store delivers three flat record sets; the tree shape is derived
//! here by foreign-key matching and recomputed in full from the latest
//! flat state on every use. Nothing in this module holds state.

use std::collections::HashMap;

use uuid::Uuid;

use crate::models::{Feature, Task, UserStory};

/// A story with its features, used for tree views.
#[derive(Debug, Clone, PartialEq)]
pub struct StoryNode {
    pub story: UserStory,
    pub features: Vec<FeatureNode>,
}

/// A feature with its tasks.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureNode {
    pub feature: Feature,
    pub tasks: Vec<Task>,
}

impl StoryNode {
    /// Total number of tasks under this story, across all its features.
    pub fn task_count(&self) -> usize {
        self.features.iter().map(|f| f.tasks.len()).sum()
    }
}

/// Group the three flat sets into a story → feature → task tree.
///
/// Pure function of its inputs: sibling order is the input order (the
/// access layer delivers sequence-index order), inputs are not mutated,
/// and re-running on the same snapshot yields identical output. Features
/// and tasks whose parent id matches no record are dropped silently.
pub fn build_tree(stories: &[UserStory], features: &[Feature], tasks: &[Task]) -> Vec<StoryNode> {
    // Group children by parent id, preserving delivery order within each group.
    let mut features_by_story: HashMap<Uuid, Vec<&Feature>> = HashMap::new();
    for feature in features {
        features_by_story
            .entry(feature.user_story_id)
            .or_default()
            .push(feature);
    }

    let mut tasks_by_feature: HashMap<Uuid, Vec<&Task>> = HashMap::new();
    for task in tasks {
        tasks_by_feature
            .entry(task.feature_id)
            .or_default()
            .push(task);
    }

    stories
        .iter()
        .map(|story| StoryNode {
            story: story.clone(),
            features: features_by_story
                .get(&story.id)
                .map(|fs| {
                    fs.iter()
                        .map(|feature| FeatureNode {
                            feature: (*feature).clone(),
                            tasks: tasks_by_feature
                                .get(&feature.id)
                                .map(|ts| ts.iter().map(|t| (*t).clone()).collect())
                                .unwrap_or_default(),
                        })
                        .collect()
                })
                .unwrap_or_default(),
        })
        .collect()
}

const FEATURE_SYMBOL: char = '◆';
const TASK_SYMBOL: char = '·';

/// Render the backlog tree as ASCII art.
///
/// Example output:
/// ```text
/// User Login (1 feature, 1 task)
/// └── ◆ OAuth
///     └── · Add button
/// ```
pub fn render_tree(nodes: &[StoryNode]) -> String {
    let mut output = String::new();
    for node in nodes {
        output.push_str(&node.story.title);
        let tasks = node.task_count();
        output.push_str(&format!(
            " ({} feature{}, {} task{})\n",
            node.features.len(),
            if node.features.len() == 1 { "" } else { "s" },
            tasks,
            if tasks == 1 { "" } else { "s" },
        ));

        for (i, feature) in node.features.iter().enumerate() {
            let is_last = i == node.features.len() - 1;
            let branch = if is_last { "└── " } else { "├── " };
            output.push_str(branch);
            output.push(FEATURE_SYMBOL);
            output.push(' ');
            output.push_str(&feature.feature.title);
            output.push('\n');

            let prefix = if is_last { "    " } else { "│   " };
            for (j, task) in feature.tasks.iter().enumerate() {
                let task_branch = if j == feature.tasks.len() - 1 {
                    "└── "
                } else {
                    "├── "
                };
                output.push_str(prefix);
                output.push_str(task_branch);
                output.push(TASK_SYMBOL);
                output.push(' ');
                output.push_str(&task.title);
                output.push('\n');
            }
        }
    }
    output
}
