//! Integration tests for StockAdjustmentProcessor.

mod common;

use common::{today, InventoryCall, TestPos};
use meridian_core::{AdjustmentStatus, Direction, ErrorKind};
use meridian_engine::Actor;

#[tokio::test]
async fn processing_applies_every_line() {
    let pos = TestPos::spawn().await;
    let flour = pos.product("Flour 1kg", 390, 20).await;
    let stock = pos.stock();

    let id = stock.create(&pos.actor).await.unwrap();
    stock.add_line(&id, &flour.id, 10).await.unwrap();

    let message = stock.process(&id, Some("  weekly recount ")).await.unwrap();
    assert_eq!(message, format!("Stock adjustment {} processed (1 lines)", id));

    let reason = format!("Stock adjustment {}", id);
    assert_eq!(
        pos.inventory.calls(),
        vec![InventoryCall::AdjustStock {
            product_id: flour.id.clone(),
            delta: 10,
            direction: Direction::Entry,
            reason: reason.clone(),
            date: today(),
        }]
    );
    assert_eq!(pos.stock_of(&flour.id).await, 30);

    let detail = stock.get(&id).await.unwrap();
    assert_eq!(detail.adjustment.status, AdjustmentStatus::Processed);
    assert_eq!(detail.adjustment.observation.as_deref(), Some("weekly recount"));
    assert_eq!(detail.adjustment.processed_on, Some(today()));
    assert_eq!(detail.adjustment.created_by, pos.actor.user_id);

    let movements = stock.movements(&id).await.unwrap();
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].reason, reason);
    assert_eq!(movements[0].quantity, 10);
    assert_eq!(movements[0].moved_on, today());
}

#[tokio::test]
async fn negative_delta_is_an_exit() {
    let pos = TestPos::spawn().await;
    let flour = pos.product("Flour 1kg", 390, 20).await;
    let sugar = pos.product("Sugar 1kg", 450, 5).await;
    let stock = pos.stock();

    let id = stock.create(&pos.actor).await.unwrap();
    stock.add_line(&id, &flour.id, -3).await.unwrap();
    stock.add_line(&id, &sugar.id, 7).await.unwrap();
    stock.process(&id, None).await.unwrap();

    let directions: Vec<(i64, Direction)> = pos
        .inventory
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            InventoryCall::AdjustStock { delta, direction, .. } => Some((delta, direction)),
            InventoryCall::MoveStock { .. } => None,
        })
        .collect();

    assert_eq!(directions, vec![(-3, Direction::Exit), (7, Direction::Entry)]);
    assert_eq!(pos.stock_of(&flour.id).await, 17);
    assert_eq!(pos.stock_of(&sugar.id).await, 12);
    assert_eq!(stock.get(&id).await.unwrap().adjustment.observation, None);
}

#[tokio::test]
async fn processed_adjustment_is_frozen() {
    let pos = TestPos::spawn().await;
    let flour = pos.product("Flour 1kg", 390, 20).await;
    let stock = pos.stock();

    let id = stock.create(&pos.actor).await.unwrap();
    let line = stock.add_line(&id, &flour.id, 2).await.unwrap();
    stock.process(&id, None).await.unwrap();

    let err = stock.process(&id, None).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::StateConflict);
    assert_eq!(err.message, format!("Stock adjustment {} is already processed", id));

    for err in [
        stock.add_line(&id, &flour.id, 1).await.unwrap_err(),
        stock.remove_line(&id, &line.id).await.unwrap_err(),
        stock.remove(&id).await.unwrap_err(),
    ] {
        assert_eq!(err.kind, ErrorKind::StateConflict);
    }

    assert_eq!(pos.inventory.calls().len(), 1);
    assert_eq!(pos.stock_of(&flour.id).await, 22);
}

#[tokio::test]
async fn failing_line_rolls_back_the_whole_adjustment() {
    let pos = TestPos::spawn().await;
    let flour = pos.product("Flour 1kg", 390, 20).await;
    let sugar = pos.product("Sugar 1kg", 450, 5).await;
    let stock = pos.stock();

    let id = stock.create(&pos.actor).await.unwrap();
    stock.add_line(&id, &flour.id, 4).await.unwrap();
    stock.add_line(&id, &sugar.id, -1).await.unwrap();
    pos.inventory.fail_adjust_on(2);

    let err = stock.process(&id, Some("recount")).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Infra);

    assert_eq!(pos.stock_of(&flour.id).await, 20);
    assert_eq!(pos.stock_of(&sugar.id).await, 5);
    assert_eq!(pos.count("stock_movements").await, 0);

    let detail = stock.get(&id).await.unwrap();
    assert!(detail.adjustment.is_pending());
    assert_eq!(detail.adjustment.observation, None);
    assert_eq!(detail.lines.len(), 2);

    // The next attempt goes through.
    stock.process(&id, None).await.unwrap();
    assert_eq!(pos.stock_of(&flour.id).await, 24);
    assert_eq!(pos.stock_of(&sugar.id).await, 4);
}

#[tokio::test]
async fn adjustment_without_lines_can_be_processed() {
    let pos = TestPos::spawn().await;
    let stock = pos.stock();
    let id = stock.create(&pos.actor).await.unwrap();

    let message = stock.process(&id, None).await.unwrap();

    assert_eq!(message, format!("Stock adjustment {} processed (0 lines)", id));
    assert!(pos.inventory.calls().is_empty());
    assert!(!stock.get(&id).await.unwrap().adjustment.is_pending());
}

#[tokio::test]
async fn line_rules() {
    let pos = TestPos::spawn().await;
    let flour = pos.product("Flour 1kg", 390, 20).await;
    let stock = pos.stock();
    let id = stock.create(&pos.actor).await.unwrap();

    let err = stock.add_line(&id, &flour.id, 0).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let err = stock.add_line(&id, "no-such-product", 1).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    let err = stock.add_line("no-such-adjustment", &flour.id, 1).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    let err = stock.remove_line(&id, "no-such-line").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    let keep = stock.add_line(&id, &flour.id, 3).await.unwrap();
    let drop = stock.add_line(&id, &flour.id, -1).await.unwrap();
    stock.remove_line(&id, &drop.id).await.unwrap();

    let lines = stock.get(&id).await.unwrap().lines;
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].id, keep.id);
    assert_eq!(lines[0].direction(), Direction::Entry);
}

#[tokio::test]
async fn remove_deletes_a_pending_adjustment() {
    let pos = TestPos::spawn().await;
    let flour = pos.product("Flour 1kg", 390, 20).await;
    let stock = pos.stock();

    let id = stock.create(&pos.actor).await.unwrap();
    stock.add_line(&id, &flour.id, 5).await.unwrap();
    stock.remove(&id).await.unwrap();

    let err = stock.get(&id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
    assert_eq!(pos.count("stock_adjustment_lines").await, 0);
    assert_eq!(pos.stock_of(&flour.id).await, 20);
}

#[tokio::test]
async fn unknown_ids_are_not_found() {
    let pos = TestPos::spawn().await;
    let stock = pos.stock();

    for err in [
        stock.process("missing", None).await.unwrap_err(),
        stock.remove("missing").await.unwrap_err(),
        stock.get("missing").await.unwrap_err(),
        stock.create(&Actor::new("ghost")).await.unwrap_err(),
    ] {
        assert_eq!(err.kind, ErrorKind::NotFound);
    }
}

#[tokio::test]
async fn list_shows_every_adjustment() {
    let pos = TestPos::spawn().await;
    let stock = pos.stock();

    let first = stock.create(&pos.actor).await.unwrap();
    let second = stock.create(&pos.actor).await.unwrap();
    stock.process(&first, None).await.unwrap();

    let listed = stock.list().await.unwrap();
    assert_eq!(listed.len(), 2);

    let ids: Vec<&str> = listed.iter().map(|a| a.id.as_str()).collect();
    assert!(ids.contains(&first.as_str()));
    assert!(ids.contains(&second.as_str()));
}
