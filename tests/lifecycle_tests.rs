//! Integration tests for the task lifecycle engine.
//!
//! Each transition is exercised against an in-memory SQLite database:
//! permission guards, status legality, window bookkeeping, and the ledger
//! entry every successful transition must leave behind.

use task_relay::db::Database;
use task_relay::error::FlowError;
use task_relay::types::{
    NewTask, TaskCategory, TaskFilter, TaskPatch, TaskStatus, TransitionKind, User,
};

const HOUR_MS: i64 = 3_600_000;

/// Helper to create a fresh in-memory database for testing.
fn setup_db() -> Database {
    Database::open_in_memory().expect("Failed to create in-memory database")
}

fn add_user(db: &Database, name: &str, email: &str, admin: bool) -> User {
    db.create_user(name, email, admin).expect("Failed to create user")
}

/// A plain task draft from `creator` assigned to `handler`, no window.
fn draft(creator: &User, handler: &User) -> NewTask {
    NewTask {
        title: "Ship the quarterly build".to_string(),
        category: TaskCategory::Normal,
        description: Some("cut, sign, publish".to_string()),
        creator_id: creator.id,
        handler_id: handler.id,
        expected_start: None,
        expected_end: None,
    }
}

mod create_tests {
    use super::*;

    #[test]
    fn create_starts_in_new_with_zero_progress() {
        let db = setup_db();
        let alice = add_user(&db, "Alice", "alice@example.com", false);
        let bob = add_user(&db, "Bob", "bob@example.com", false);

        let task = db.create_task(&draft(&alice, &bob)).expect("Failed to create task");

        assert_eq!(task.status, TaskStatus::New);
        assert_eq!(task.progress, 0);
        assert_eq!(task.time_progress, 0);
        assert_eq!(task.creator_id, alice.id);
        assert_eq!(task.handler_id, bob.id);
        assert!(task.actual_start.is_none());
        assert!(task.actual_end.is_none());
        assert!(task.created_at > 0);
    }

    #[test]
    fn create_writes_exactly_one_ledger_entry() {
        let db = setup_db();
        let alice = add_user(&db, "Alice", "alice@example.com", false);
        let bob = add_user(&db, "Bob", "bob@example.com", false);

        let task = db.create_task(&draft(&alice, &bob)).unwrap();
        let ledger = db.get_ledger(task.id).unwrap();

        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger[0].kind, TransitionKind::Create);
        assert_eq!(ledger[0].operator_id, alice.id);
        assert_eq!(ledger[0].target_user_id, bob.id);
        assert!(ledger[0].message.is_none());
    }

    #[test]
    fn create_rejects_blank_title() {
        let db = setup_db();
        let alice = add_user(&db, "Alice", "alice@example.com", false);
        let bob = add_user(&db, "Bob", "bob@example.com", false);

        let mut input = draft(&alice, &bob);
        input.title = "   ".to_string();

        let err = db.create_task(&input).unwrap_err();
        assert!(matches!(err, FlowError::InvalidArgument(_)));
    }

    #[test]
    fn create_rejects_window_ending_before_it_starts() {
        let db = setup_db();
        let alice = add_user(&db, "Alice", "alice@example.com", false);
        let bob = add_user(&db, "Bob", "bob@example.com", false);

        let mut input = draft(&alice, &bob);
        input.expected_start = Some(2 * HOUR_MS);
        input.expected_end = Some(HOUR_MS);

        let err = db.create_task(&input).unwrap_err();
        assert!(matches!(err, FlowError::InvalidArgument(_)));
    }

    #[test]
    fn create_rejects_unknown_handler() {
        let db = setup_db();
        let alice = add_user(&db, "Alice", "alice@example.com", false);

        let mut input = draft(&alice, &alice);
        input.handler_id = 9999;

        let err = db.create_task(&input).unwrap_err();
        assert!(matches!(err, FlowError::NotFound { .. }));
    }

    #[test]
    fn create_rejects_deactivated_handler() {
        let db = setup_db();
        let alice = add_user(&db, "Alice", "alice@example.com", false);
        let bob = add_user(&db, "Bob", "bob@example.com", false);
        db.update_user(
            bob.id,
            &task_relay::types::UserPatch {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .unwrap();

        let err = db.create_task(&draft(&alice, &bob)).unwrap_err();
        assert!(matches!(err, FlowError::NotFound { .. }));
    }
}

mod transfer_tests {
    use super::*;

    #[test]
    fn handler_transfers_to_new_handler() {
        let db = setup_db();
        let alice = add_user(&db, "Alice", "alice@example.com", false);
        let bob = add_user(&db, "Bob", "bob@example.com", false);
        let carol = add_user(&db, "Carol", "carol@example.com", false);
        let task = db.create_task(&draft(&alice, &bob)).unwrap();

        let task = db
            .transfer_task(task.id, bob.id, carol.id, Some("your area"))
            .expect("Failed to transfer task");

        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.handler_id, carol.id);

        let ledger = db.get_ledger(task.id).unwrap();
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger[1].kind, TransitionKind::Transfer);
        assert_eq!(ledger[1].operator_id, bob.id);
        assert_eq!(ledger[1].target_user_id, carol.id);
        assert_eq!(ledger[1].message.as_deref(), Some("your area"));
    }

    #[test]
    fn admin_transfers_someone_elses_task() {
        let db = setup_db();
        let root = add_user(&db, "Root", "root@example.com", true);
        let bob = add_user(&db, "Bob", "bob@example.com", false);
        let carol = add_user(&db, "Carol", "carol@example.com", false);
        let task = db.create_task(&draft(&bob, &bob)).unwrap();

        let task = db.transfer_task(task.id, root.id, carol.id, None).unwrap();

        assert_eq!(task.handler_id, carol.id);
        assert_eq!(task.status, TaskStatus::Pending);
    }

    #[test]
    fn bystander_cannot_transfer() {
        let db = setup_db();
        let alice = add_user(&db, "Alice", "alice@example.com", false);
        let bob = add_user(&db, "Bob", "bob@example.com", false);
        let mallory = add_user(&db, "Mallory", "mallory@example.com", false);
        let task = db.create_task(&draft(&alice, &bob)).unwrap();

        let err = db
            .transfer_task(task.id, mallory.id, mallory.id, None)
            .unwrap_err();
        assert!(matches!(err, FlowError::Forbidden(_)));

        // Nothing changed and nothing was recorded.
        let task = db.get_task(task.id).unwrap().unwrap();
        assert_eq!(task.handler_id, bob.id);
        assert_eq!(db.get_ledger(task.id).unwrap().len(), 1);
    }

    #[test]
    fn creator_without_admin_cannot_transfer() {
        let db = setup_db();
        let alice = add_user(&db, "Alice", "alice@example.com", false);
        let bob = add_user(&db, "Bob", "bob@example.com", false);
        let task = db.create_task(&draft(&alice, &bob)).unwrap();

        let err = db.transfer_task(task.id, alice.id, alice.id, None).unwrap_err();
        assert!(matches!(err, FlowError::Forbidden(_)));
    }

    #[test]
    fn transfer_to_deactivated_target_is_rejected() {
        let db = setup_db();
        let alice = add_user(&db, "Alice", "alice@example.com", false);
        let bob = add_user(&db, "Bob", "bob@example.com", false);
        let carol = add_user(&db, "Carol", "carol@example.com", false);
        let task = db.create_task(&draft(&alice, &bob)).unwrap();
        db.update_user(
            carol.id,
            &task_relay::types::UserPatch {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .unwrap();

        let err = db.transfer_task(task.id, bob.id, carol.id, None).unwrap_err();
        assert!(matches!(err, FlowError::NotFound { .. }));
    }

    #[test]
    fn transfer_works_from_any_status() {
        let db = setup_db();
        let alice = add_user(&db, "Alice", "alice@example.com", false);
        let bob = add_user(&db, "Bob", "bob@example.com", false);
        let carol = add_user(&db, "Carol", "carol@example.com", false);
        let task = db.create_task(&draft(&alice, &bob)).unwrap();

        db.respond_task(task.id, bob.id).unwrap();
        db.complete_task(task.id, bob.id, None).unwrap();

        // Reassigning a completed task reopens it as Pending.
        let task = db.transfer_task(task.id, bob.id, carol.id, None).unwrap();
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.handler_id, carol.id);
    }

    #[test]
    fn transfer_to_self_is_allowed() {
        let db = setup_db();
        let alice = add_user(&db, "Alice", "alice@example.com", false);
        let bob = add_user(&db, "Bob", "bob@example.com", false);
        let task = db.create_task(&draft(&alice, &bob)).unwrap();

        let task = db.transfer_task(task.id, bob.id, bob.id, None).unwrap();
        assert_eq!(task.handler_id, bob.id);
        assert_eq!(task.status, TaskStatus::Pending);
    }
}

mod respond_tests {
    use super::*;

    #[test]
    fn respond_moves_new_task_to_processing() {
        let db = setup_db();
        let alice = add_user(&db, "Alice", "alice@example.com", false);
        let bob = add_user(&db, "Bob", "bob@example.com", false);
        let task = db.create_task(&draft(&alice, &bob)).unwrap();

        let task = db.respond_task(task.id, bob.id).expect("Failed to respond");

        assert_eq!(task.status, TaskStatus::Processing);
        assert!(task.actual_start.is_some());

        let ledger = db.get_ledger(task.id).unwrap();
        assert_eq!(ledger.last().unwrap().kind, TransitionKind::Respond);
    }

    #[test]
    fn respond_works_from_pending_and_suspended() {
        let db = setup_db();
        let alice = add_user(&db, "Alice", "alice@example.com", false);
        let bob = add_user(&db, "Bob", "bob@example.com", false);
        let carol = add_user(&db, "Carol", "carol@example.com", false);
        let task = db.create_task(&draft(&alice, &bob)).unwrap();

        // Pending after a transfer.
        db.transfer_task(task.id, bob.id, carol.id, None).unwrap();
        let task = db.respond_task(task.id, carol.id).unwrap();
        assert_eq!(task.status, TaskStatus::Processing);

        // Suspended, then picked back up.
        db.suspend_task(task.id, carol.id, Some("waiting on parts")).unwrap();
        let task = db.respond_task(task.id, carol.id).unwrap();
        assert_eq!(task.status, TaskStatus::Processing);
    }

    #[test]
    fn respond_while_processing_is_rejected() {
        let db = setup_db();
        let alice = add_user(&db, "Alice", "alice@example.com", false);
        let bob = add_user(&db, "Bob", "bob@example.com", false);
        let task = db.create_task(&draft(&alice, &bob)).unwrap();
        db.respond_task(task.id, bob.id).unwrap();

        let err = db.respond_task(task.id, bob.id).unwrap_err();
        assert!(matches!(
            err,
            FlowError::InvalidState {
                current: TaskStatus::Processing,
                ..
            }
        ));
    }

    #[test]
    fn only_the_handler_may_respond() {
        let db = setup_db();
        let root = add_user(&db, "Root", "root@example.com", true);
        let bob = add_user(&db, "Bob", "bob@example.com", false);
        let task = db.create_task(&draft(&root, &bob)).unwrap();

        // Not even an admin can accept work on someone else's behalf.
        let err = db.respond_task(task.id, root.id).unwrap_err();
        assert!(matches!(err, FlowError::Forbidden(_)));
    }

    #[test]
    fn actual_start_is_kept_across_suspend_and_resume() {
        let db = setup_db();
        let alice = add_user(&db, "Alice", "alice@example.com", false);
        let bob = add_user(&db, "Bob", "bob@example.com", false);
        let task = db.create_task(&draft(&alice, &bob)).unwrap();

        let first = db.respond_task(task.id, bob.id).unwrap();
        db.suspend_task(task.id, bob.id, None).unwrap();
        let second = db.respond_task(task.id, bob.id).unwrap();

        assert_eq!(second.actual_start, first.actual_start);
    }
}

mod suspend_tests {
    use super::*;

    #[test]
    fn suspend_pauses_a_processing_task() {
        let db = setup_db();
        let alice = add_user(&db, "Alice", "alice@example.com", false);
        let bob = add_user(&db, "Bob", "bob@example.com", false);
        let task = db.create_task(&draft(&alice, &bob)).unwrap();
        db.respond_task(task.id, bob.id).unwrap();

        let task = db
            .suspend_task(task.id, bob.id, Some("blocked on vendor"))
            .expect("Failed to suspend");

        assert_eq!(task.status, TaskStatus::Suspended);

        let ledger = db.get_ledger(task.id).unwrap();
        assert_eq!(ledger.last().unwrap().kind, TransitionKind::Suspend);
        assert_eq!(ledger.last().unwrap().message.as_deref(), Some("blocked on vendor"));
    }

    #[test]
    fn suspend_outside_processing_is_rejected() {
        let db = setup_db();
        let alice = add_user(&db, "Alice", "alice@example.com", false);
        let bob = add_user(&db, "Bob", "bob@example.com", false);
        let task = db.create_task(&draft(&alice, &bob)).unwrap();

        let err = db.suspend_task(task.id, bob.id, None).unwrap_err();
        assert!(matches!(
            err,
            FlowError::InvalidState {
                current: TaskStatus::New,
                ..
            }
        ));
    }

    #[test]
    fn rejected_suspend_leaves_no_trace() {
        let db = setup_db();
        let alice = add_user(&db, "Alice", "alice@example.com", false);
        let bob = add_user(&db, "Bob", "bob@example.com", false);
        let mallory = add_user(&db, "Mallory", "mallory@example.com", false);
        let task = db.create_task(&draft(&alice, &bob)).unwrap();
        db.respond_task(task.id, bob.id).unwrap();

        let err = db.suspend_task(task.id, mallory.id, None).unwrap_err();
        assert!(matches!(err, FlowError::Forbidden(_)));

        let task = db.get_task(task.id).unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::Processing);
        assert_eq!(db.get_ledger(task.id).unwrap().len(), 2);
    }
}

mod completion_tests {
    use super::*;

    #[test]
    fn complete_finishes_the_task() {
        let db = setup_db();
        let alice = add_user(&db, "Alice", "alice@example.com", false);
        let bob = add_user(&db, "Bob", "bob@example.com", false);
        let task = db.create_task(&draft(&alice, &bob)).unwrap();
        db.respond_task(task.id, bob.id).unwrap();

        let task = db
            .complete_task(task.id, bob.id, Some("shipped"))
            .expect("Failed to complete");

        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.progress, 100);
        assert!(task.actual_end.is_some());

        let ledger = db.get_ledger(task.id).unwrap();
        assert_eq!(ledger.last().unwrap().kind, TransitionKind::Complete);
    }

    #[test]
    fn completing_twice_keeps_the_first_end_timestamp() {
        let db = setup_db();
        let alice = add_user(&db, "Alice", "alice@example.com", false);
        let bob = add_user(&db, "Bob", "bob@example.com", false);
        let task = db.create_task(&draft(&alice, &bob)).unwrap();
        db.respond_task(task.id, bob.id).unwrap();

        let first = db.complete_task(task.id, bob.id, None).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let second = db.complete_task(task.id, bob.id, None).unwrap();

        assert_eq!(second.actual_end, first.actual_end);
        // Both runs are transitions, so both are on the record.
        assert_eq!(db.get_ledger(task.id).unwrap().len(), 4);
    }

    #[test]
    fn close_works_from_any_status() {
        let db = setup_db();
        let alice = add_user(&db, "Alice", "alice@example.com", false);
        let bob = add_user(&db, "Bob", "bob@example.com", false);
        let task = db.create_task(&draft(&alice, &bob)).unwrap();

        // Straight from New, without ever being worked.
        let task = db.close_task(task.id, bob.id, Some("duplicate")).unwrap();

        assert_eq!(task.status, TaskStatus::Closed);
        assert!(task.actual_end.is_some());

        let ledger = db.get_ledger(task.id).unwrap();
        assert_eq!(ledger.last().unwrap().kind, TransitionKind::Close);
    }

    #[test]
    fn close_after_complete_keeps_original_end() {
        let db = setup_db();
        let alice = add_user(&db, "Alice", "alice@example.com", false);
        let bob = add_user(&db, "Bob", "bob@example.com", false);
        let task = db.create_task(&draft(&alice, &bob)).unwrap();
        db.respond_task(task.id, bob.id).unwrap();

        let completed = db.complete_task(task.id, bob.id, None).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let closed = db.close_task(task.id, bob.id, None).unwrap();

        assert_eq!(closed.status, TaskStatus::Closed);
        assert_eq!(closed.actual_end, completed.actual_end);
    }

    #[test]
    fn admin_may_complete_for_the_handler() {
        let db = setup_db();
        let root = add_user(&db, "Root", "root@example.com", true);
        let bob = add_user(&db, "Bob", "bob@example.com", false);
        let task = db.create_task(&draft(&bob, &bob)).unwrap();

        let task = db.complete_task(task.id, root.id, None).unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
    }
}

mod edit_tests {
    use super::*;

    #[test]
    fn edit_updates_fields_without_a_ledger_entry() {
        let db = setup_db();
        let alice = add_user(&db, "Alice", "alice@example.com", false);
        let bob = add_user(&db, "Bob", "bob@example.com", false);
        let task = db.create_task(&draft(&alice, &bob)).unwrap();

        let task = db
            .edit_task(
                task.id,
                bob.id,
                &TaskPatch {
                    description: Some("new plan".to_string()),
                    progress: Some(40),
                },
            )
            .expect("Failed to edit");

        assert_eq!(task.description.as_deref(), Some("new plan"));
        assert_eq!(task.progress, 40);
        assert_eq!(db.get_ledger(task.id).unwrap().len(), 1);
    }

    #[test]
    fn edit_rejects_out_of_range_progress() {
        let db = setup_db();
        let alice = add_user(&db, "Alice", "alice@example.com", false);
        let bob = add_user(&db, "Bob", "bob@example.com", false);
        let task = db.create_task(&draft(&alice, &bob)).unwrap();

        let err = db
            .edit_task(
                task.id,
                bob.id,
                &TaskPatch {
                    progress: Some(101),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, FlowError::InvalidArgument(_)));
    }

    #[test]
    fn bystander_cannot_edit() {
        let db = setup_db();
        let alice = add_user(&db, "Alice", "alice@example.com", false);
        let bob = add_user(&db, "Bob", "bob@example.com", false);
        let mallory = add_user(&db, "Mallory", "mallory@example.com", false);
        let task = db.create_task(&draft(&alice, &bob)).unwrap();

        let err = db
            .edit_task(
                task.id,
                mallory.id,
                &TaskPatch {
                    progress: Some(10),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, FlowError::Forbidden(_)));
    }
}

mod query_tests {
    use super::*;

    #[test]
    fn get_task_returns_none_for_unknown_id() {
        let db = setup_db();
        assert!(db.get_task(4242).unwrap().is_none());
    }

    #[test]
    fn list_is_newest_first_and_paginated() {
        let db = setup_db();
        let alice = add_user(&db, "Alice", "alice@example.com", false);
        let bob = add_user(&db, "Bob", "bob@example.com", false);

        let mut ids = Vec::new();
        for i in 0..5 {
            let mut input = draft(&alice, &bob);
            input.title = format!("task {i}");
            ids.push(db.create_task(&input).unwrap().id);
        }

        let page = db.list_tasks(1, 2, &TaskFilter::default()).unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.page, 1);
        assert_eq!(page.page_size, 2);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].id, ids[4]);
        assert_eq!(page.items[1].id, ids[3]);

        let page = db.list_tasks(3, 2, &TaskFilter::default()).unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id, ids[0]);
    }

    #[test]
    fn list_filters_combine_with_and() {
        let db = setup_db();
        let alice = add_user(&db, "Alice", "alice@example.com", false);
        let bob = add_user(&db, "Bob", "bob@example.com", false);
        let carol = add_user(&db, "Carol", "carol@example.com", false);

        let mut urgent = draft(&alice, &bob);
        urgent.title = "Hotfix login outage".to_string();
        urgent.category = TaskCategory::Urgent;
        let urgent = db.create_task(&urgent).unwrap();

        let mut routine = draft(&alice, &carol);
        routine.title = "Rotate signing keys".to_string();
        db.create_task(&routine).unwrap();

        let filter = TaskFilter {
            category: Some(TaskCategory::Urgent),
            handler_id: Some(bob.id),
            ..Default::default()
        };
        let page = db.list_tasks(1, 10, &filter).unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id, urgent.id);

        // Same category, wrong handler.
        let filter = TaskFilter {
            category: Some(TaskCategory::Urgent),
            handler_id: Some(carol.id),
            ..Default::default()
        };
        assert_eq!(db.list_tasks(1, 10, &filter).unwrap().total, 0);
    }

    #[test]
    fn list_search_matches_title_substring() {
        let db = setup_db();
        let alice = add_user(&db, "Alice", "alice@example.com", false);
        let bob = add_user(&db, "Bob", "bob@example.com", false);

        let mut input = draft(&alice, &bob);
        input.title = "Migrate billing schema".to_string();
        let hit = db.create_task(&input).unwrap();
        db.create_task(&draft(&alice, &bob)).unwrap();

        let filter = TaskFilter {
            search: Some("billing".to_string()),
            ..Default::default()
        };
        let page = db.list_tasks(1, 10, &filter).unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id, hit.id);
    }

    #[test]
    fn status_filter_follows_transitions() {
        let db = setup_db();
        let alice = add_user(&db, "Alice", "alice@example.com", false);
        let bob = add_user(&db, "Bob", "bob@example.com", false);
        let task = db.create_task(&draft(&alice, &bob)).unwrap();
        db.create_task(&draft(&alice, &bob)).unwrap();
        db.respond_task(task.id, bob.id).unwrap();

        let filter = TaskFilter {
            status: Some(TaskStatus::Processing),
            ..Default::default()
        };
        let page = db.list_tasks(1, 10, &filter).unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id, task.id);
    }

    #[test]
    fn reads_compute_live_time_progress() {
        let db = setup_db();
        let alice = add_user(&db, "Alice", "alice@example.com", false);
        let bob = add_user(&db, "Bob", "bob@example.com", false);

        let now = task_relay::db::now_ms();
        let mut input = draft(&alice, &bob);
        // A wide window centered on now stays at 50 for hours either side.
        input.expected_start = Some(now - 1000 * HOUR_MS);
        input.expected_end = Some(now + 1000 * HOUR_MS);
        let task = db.create_task(&input).unwrap();

        // The stored column still holds 0; the read derives the live value.
        let task = db.get_task(task.id).unwrap().unwrap();
        assert_eq!(task.time_progress, 50);

        let page = db.list_tasks(1, 10, &TaskFilter::default()).unwrap();
        assert_eq!(page.items[0].time_progress, 50);
    }

    #[test]
    fn ledger_reads_are_oldest_first() {
        let db = setup_db();
        let alice = add_user(&db, "Alice", "alice@example.com", false);
        let bob = add_user(&db, "Bob", "bob@example.com", false);
        let task = db.create_task(&draft(&alice, &bob)).unwrap();
        db.respond_task(task.id, bob.id).unwrap();
        db.suspend_task(task.id, bob.id, None).unwrap();
        db.respond_task(task.id, bob.id).unwrap();
        db.complete_task(task.id, bob.id, None).unwrap();

        let ledger = db.get_ledger(task.id).unwrap();
        let kinds: Vec<_> = ledger.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TransitionKind::Create,
                TransitionKind::Respond,
                TransitionKind::Suspend,
                TransitionKind::Respond,
                TransitionKind::Complete,
            ]
        );
        assert!(ledger.windows(2).all(|w| w[0].id < w[1].id));
    }

    #[test]
    fn ledger_for_unknown_task_is_not_found() {
        let db = setup_db();
        let err = db.get_ledger(777).unwrap_err();
        assert!(matches!(err, FlowError::NotFound { .. }));
    }
}
