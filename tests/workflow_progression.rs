//! End-to-end progression through the public handlers.

mod common;

use common::{gutters, item_ids, roofing, workflow, TestApp};
use project_workflow::application::{
    CompleteLineItemCommand, GetPositionQuery, InitializeWorkflowCommand, UncompleteLineItemCommand, WorkflowError,
};
use project_workflow::domain::foundation::{AlertStatus, LineItemId, Percentage, PhaseKey};
use project_workflow::ports::AlertRepository;

#[tokio::test]
async fn roofing_walks_lead_to_completion() {
    let roofing = roofing();
    let items = item_ids(&roofing);
    let app = TestApp::with_templates(&[roofing]).await;
    let project = app.project("ROOFING", &[]).await;

    app.services.ensure_ready.handle(project).await.unwrap();
    let position = app.services.get_position.handle(GetPositionQuery { project_id: project }).await.unwrap();
    assert_eq!(position.phase, PhaseKey::Lead);
    assert_eq!(position.progress, Percentage::ZERO);
    assert_eq!(position.main().and_then(|m| m.position).map(|p| p.line_item_id), Some(items[0]));

    let expected = [(33, PhaseKey::Lead), (67, PhaseKey::Execution), (100, PhaseKey::Completion)];
    for (id, (progress, phase)) in items.iter().zip(expected) {
        let result = app
            .services
            .complete_line_item
            .handle(CompleteLineItemCommand::new(project, *id))
            .await
            .unwrap();
        assert_eq!(result.progress.value(), progress);
        assert_eq!(result.project.map(|p| p.phase), Some(phase));
    }

    let position = app.services.get_position.handle(GetPositionQuery { project_id: project }).await.unwrap();
    assert_eq!(position.phase, PhaseKey::Completion);
    assert_eq!(position.progress, Percentage::HUNDRED);
    assert!(position.main().unwrap().position.is_none());
    assert!(app.alerts.list_active_for_project(&project).await.unwrap().is_empty());

    let closed = app.alerts.all().await;
    assert_eq!(closed.len(), 3);
    assert!(closed.iter().all(|a| a.status() == AlertStatus::Completed));
}

#[tokio::test]
async fn roofing_and_gutters_initialize_with_one_main() {
    let (roofing, gutters) = (roofing(), gutters());
    let (roof_items, gutter_items) = (item_ids(&roofing), item_ids(&gutters));
    let app = TestApp::with_templates(&[roofing, gutters]).await;
    let project = app.project("ROOFING", &["GUTTERS"]).await;

    let result = app
        .services
        .initialize_workflow
        .handle(InitializeWorkflowCommand::new(project).with_types(vec![workflow("ROOFING"), workflow("GUTTERS")]))
        .await
        .unwrap();

    assert_eq!(result.created.len(), 2);
    assert_eq!(result.created.iter().filter(|t| t.is_main_workflow()).count(), 1);
    let current: Vec<_> = result.created.iter().map(|t| t.current_line_item_id()).collect();
    assert_eq!(current, vec![Some(roof_items[0]), Some(gutter_items[0])]);

    let active = app.alerts.list_active_for_project(&project).await.unwrap();
    assert_eq!(active.len(), 2);
}

#[tokio::test]
async fn ensure_ready_twice_creates_no_duplicates() {
    let app = TestApp::with_templates(&[roofing(), gutters()]).await;
    let project = app.project("ROOFING", &["GUTTERS"]).await;

    let first = app.services.ensure_ready.handle(project).await.unwrap();
    let second = app.services.ensure_ready.handle(project).await.unwrap();

    assert_eq!(first.created, 2);
    assert!(second.is_noop());
    assert_eq!(app.trackers.count().await, 2);
    assert_eq!(app.alerts.all().await.len(), 2);
}

#[tokio::test]
async fn out_of_order_completion_keeps_pointer_and_alert() {
    let roofing = roofing();
    let items = item_ids(&roofing);
    let app = TestApp::with_templates(&[roofing]).await;
    let project = app.project("ROOFING", &[]).await;
    app.services.ensure_ready.handle(project).await.unwrap();

    let result = app
        .services
        .complete_line_item
        .handle(CompleteLineItemCommand::new(project, items[1]))
        .await
        .unwrap();

    assert_eq!(result.next_active.map(|p| p.line_item_id), Some(items[0]));
    assert_eq!(result.progress.value(), 33);
    assert!(result.alerts.is_empty());
    let active = app.alerts.list_active_for_project(&project).await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].line_item_id(), items[0]);

    // Completing the earlier item jumps past the already-done one.
    let result = app
        .services
        .complete_line_item
        .handle(CompleteLineItemCommand::new(project, items[0]))
        .await
        .unwrap();
    assert_eq!(result.next_active.map(|p| p.line_item_id), Some(items[2]));
    assert_eq!(result.project.map(|p| p.phase), Some(PhaseKey::Execution));
}

#[tokio::test]
async fn reversal_restores_earlier_position() {
    let roofing = roofing();
    let items = item_ids(&roofing);
    let app = TestApp::with_templates(&[roofing]).await;
    let project = app.project("ROOFING", &[]).await;
    app.services.ensure_ready.handle(project).await.unwrap();
    for id in &items[..2] {
        app.services
            .complete_line_item
            .handle(CompleteLineItemCommand::new(project, *id))
            .await
            .unwrap();
    }

    let result = app
        .services
        .uncomplete_line_item
        .handle(UncompleteLineItemCommand::new(project, items[1]))
        .await
        .unwrap();

    assert_eq!(result.current.map(|p| p.line_item_id), Some(items[1]));
    assert_eq!(result.project.map(|p| p.phase), Some(PhaseKey::Lead));
    let active = app.alerts.list_active_for_project(&project).await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].line_item_id(), items[1]);
}

#[tokio::test]
async fn unknown_ids_are_not_found() {
    let app = TestApp::with_templates(&[roofing()]).await;
    let project = app.project("ROOFING", &[]).await;
    app.services.ensure_ready.handle(project).await.unwrap();

    let err = app
        .services
        .complete_line_item
        .handle(CompleteLineItemCommand::new(project, LineItemId::new()))
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::UnknownLineItem(_)));
    assert!(err.is_not_found());
}

#[tokio::test]
async fn notifier_receives_every_diff() {
    let roofing = roofing();
    let items = item_ids(&roofing);
    let app = TestApp::with_templates(&[roofing]).await;
    let project = app.project("ROOFING", &[]).await;
    app.services.ensure_ready.handle(project).await.unwrap();

    app.services
        .complete_line_item
        .handle(CompleteLineItemCommand::new(project, items[0]))
        .await
        .unwrap();

    let delivered = app.notifier.delivered().await;
    assert_eq!(delivered.len(), 2);
    assert!(delivered.iter().all(|(id, _)| *id == project));
    assert_eq!(delivered[1].1.closed.len(), 1);
    assert_eq!(delivered[1].1.opened.len(), 1);
}
