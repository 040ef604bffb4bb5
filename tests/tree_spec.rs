use backlog_board::models::*;
use backlog_board::tree::{build_tree, render_tree};
use chrono::Utc;
use speculate2::speculate;
use uuid::Uuid;

fn make_story(title: &str, order_index: i64) -> UserStory {
    let now = Utc::now();
    UserStory {
        id: Uuid::new_v4(),
        project_id: Uuid::nil(),
        title: title.to_string(),
        description: String::new(),
        order_index,
        created_at: now,
        updated_at: now,
    }
}

fn make_feature(story_id: Uuid, title: &str, order_index: i64) -> Feature {
    let now = Utc::now();
    Feature {
        id: Uuid::new_v4(),
        project_id: Uuid::nil(),
        user_story_id: story_id,
        title: title.to_string(),
        description: String::new(),
        order_index,
        created_at: now,
        updated_at: now,
    }
}

fn make_task(feature_id: Uuid, title: &str, order_index: i64) -> Task {
    let now = Utc::now();
    Task {
        id: Uuid::new_v4(),
        project_id: Uuid::nil(),
        feature_id,
        title: title.to_string(),
        description: String::new(),
        order_index,
        created_at: now,
        updated_at: now,
    }
}

speculate! {
    describe "build_tree" {
        it "groups features under their story and tasks under their feature" {
            let story = make_story("Login", 0);
            let feature = make_feature(story.id, "OAuth", 0);
            let task = make_task(feature.id, "Add button", 0);

            let nodes = build_tree(&[story.clone()], &[feature.clone()], &[task.clone()]);

            assert_eq!(nodes.len(), 1);
            assert_eq!(nodes[0].story.id, story.id);
            assert_eq!(nodes[0].features.len(), 1);
            assert_eq!(nodes[0].features[0].feature.title, "OAuth");
            assert_eq!(nodes[0].features[0].tasks.len(), 1);
            assert_eq!(nodes[0].features[0].tasks[0].title, "Add button");
        }

        it "drops features whose story does not exist" {
            let story = make_story("Login", 0);
            let orphan = make_feature(Uuid::new_v4(), "Ghost", 0);

            let nodes = build_tree(&[story], &[orphan], &[]);

            assert_eq!(nodes.len(), 1);
            assert!(nodes[0].features.is_empty());
        }

        it "drops tasks whose feature does not exist" {
            let story = make_story("Login", 0);
            let feature = make_feature(story.id, "OAuth", 0);
            let orphan = make_task(Uuid::new_v4(), "Lost", 0);

            let nodes = build_tree(&[story], &[feature], &[orphan]);

            let tasks: usize = nodes[0].features.iter().map(|f| f.tasks.len()).sum();
            assert_eq!(tasks, 0);
        }

        it "preserves the delivered sibling order" {
            let story = make_story("Login", 0);
            let first = make_feature(story.id, "First", 0);
            let second = make_feature(story.id, "Second", 1);
            let third = make_feature(story.id, "Third", 2);

            let nodes = build_tree(
                &[story],
                &[first.clone(), second.clone(), third.clone()],
                &[],
            );

            let titles: Vec<&str> = nodes[0]
                .features
                .iter()
                .map(|f| f.feature.title.as_str())
                .collect();
            assert_eq!(titles, vec!["First", "Second", "Third"]);
        }

        it "is idempotent over the same snapshot" {
            let story_a = make_story("A", 0);
            let story_b = make_story("B", 1);
            let feature = make_feature(story_a.id, "F", 0);
            let task = make_task(feature.id, "T", 0);

            let stories = vec![story_a, story_b];
            let features = vec![feature];
            let tasks = vec![task];

            let first = build_tree(&stories, &features, &tasks);
            let second = build_tree(&stories, &features, &tasks);

            assert_eq!(first, second);
        }

        it "does not mutate its inputs" {
            let story = make_story("Login", 0);
            let feature = make_feature(story.id, "OAuth", 0);
            let stories = vec![story];
            let features = vec![feature];
            let tasks: Vec<Task> = Vec::new();

            let stories_before = stories.clone();
            let features_before = features.clone();

            let _ = build_tree(&stories, &features, &tasks);

            assert_eq!(stories, stories_before);
            assert_eq!(features, features_before);
        }

        it "yields a story with no features and a feature with no tasks" {
            let story = make_story("Empty", 0);
            let other = make_story("Parent", 1);
            let feature = make_feature(other.id, "Childless", 0);

            let nodes = build_tree(&[story, other], &[feature], &[]);

            assert!(nodes[0].features.is_empty());
            assert_eq!(nodes[1].features.len(), 1);
            assert!(nodes[1].features[0].tasks.is_empty());
        }
    }

    describe "task_count" {
        it "sums tasks across all features of a story" {
            let story = make_story("Login", 0);
            let f1 = make_feature(story.id, "OAuth", 0);
            let f2 = make_feature(story.id, "SSO", 1);
            let tasks = vec![
                make_task(f1.id, "a", 0),
                make_task(f1.id, "b", 1),
                make_task(f2.id, "c", 0),
            ];

            let nodes = build_tree(&[story], &[f1, f2], &tasks);
            assert_eq!(nodes[0].task_count(), 3);
        }
    }

    describe "render_tree" {
        it "renders the hierarchy with branch characters and counts" {
            let story = make_story("User Login", 0);
            let feature = make_feature(story.id, "OAuth", 0);
            let task = make_task(feature.id, "Add button", 0);

            let nodes = build_tree(&[story], &[feature], &[task]);
            let output = render_tree(&nodes);

            assert_eq!(
                output,
                "User Login (1 feature, 1 task)\n\
                 └── ◆ OAuth\n\
                 \u{20}\u{20}\u{20}\u{20}└── · Add button\n"
            );
        }

        it "renders a story with no children as a single line" {
            let story = make_story("Solo", 0);
            let nodes = build_tree(&[story], &[], &[]);

            assert_eq!(render_tree(&nodes), "Solo (0 features, 0 tasks)\n");
        }
    }
}
