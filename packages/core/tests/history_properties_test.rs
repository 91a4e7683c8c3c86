//! History and Graph Property Tests
//!
//! Laws that must hold for every operation, checked over a realistic editing
//! session rather than a single hand-picked case:
//!
//! - every reachable node is indexed and every indexed node is reachable
//! - no node is ever its own ancestor
//! - writing a current value never records history
//! - perform then undo lands exactly on the pre-perform graph
//! - perform, undo, redo lands on the post-perform graph
//! - undo then redo leaves both stacks where they were

#[cfg(test)]
mod history_property_tests {
    use anyhow::Result;
    use serde_json::json;
    use stagehand_core::graph::SceneGraph;
    use stagehand_core::operations::{
        CreateNodeOperation, DeleteNodesOperation, GroupNodesOperation, NodeSpec, Operation,
        ReparentNodeOperation, SetPropertyOperation,
    };
    use stagehand_core::{EditorSession, NodeId, OperationService};
    use std::sync::Arc;

    fn open() -> (EditorSession, Arc<OperationService>) {
        let session = EditorSession::default();
        session.new_document("Properties");
        let service = session.active_document().unwrap();
        (session, service)
    }

    fn primary(session: &EditorSession) -> NodeId {
        session.state().selection.primary_node_id.clone().unwrap()
    }

    fn assert_sound(graph: &SceneGraph) {
        graph.check_integrity().unwrap();
        for node in graph.iter_depth_first() {
            assert!(
                !graph.ancestors(&node.id).contains(&node.id),
                "'{}' is its own ancestor",
                node.id
            );
        }
    }

    async fn create(
        session: &EditorSession,
        service: &OperationService,
        spec: NodeSpec,
        parent: Option<&NodeId>,
    ) -> Result<NodeId> {
        let mut operation = CreateNodeOperation::new(spec);
        operation.parent = parent.cloned();
        assert!(service.invoke_and_push(&operation).await?);
        Ok(primary(session))
    }

    /// Perform, then check undo restores the prior graph exactly, redo
    /// restores the performed one, and the stacks end where they were
    async fn round_trip(service: &OperationService, operation: &dyn Operation) -> Result<()> {
        let before = service.graph().await;
        assert!(service.invoke_and_push(operation).await?, "{} did nothing", operation.label());
        let after = service.graph().await;
        let labels = service.history_labels().await;
        assert_sound(&after);

        assert!(service.undo().await?);
        let undone = service.graph().await;
        assert_sound(&undone);
        assert_eq!(undone, before, "{} did not undo exactly", operation.label());
        assert!(service.redo().await?);

        assert_eq!(service.graph().await, after, "{} did not round-trip", operation.label());
        assert_eq!(service.history_labels().await, labels);
        Ok(())
    }

    #[tokio::test]
    async fn test_structural_operations_round_trip() -> Result<()> {
        let (session, service) = open();

        let world = create(&session, &service, NodeSpec::new("group").named("World"), None).await?;
        let props = create(&session, &service, NodeSpec::new("group").named("Props"), Some(&world)).await?;
        let crate_mesh = create(&session, &service, NodeSpec::new("mesh").named("Crate"), Some(&props)).await?;
        let barrel = create(&session, &service, NodeSpec::new("mesh").named("Barrel"), None).await?;
        let lamp = create(&session, &service, NodeSpec::new("light").named("Lamp"), Some(&world)).await?;
        assert_sound(&service.graph().await);

        round_trip(&service, &CreateNodeOperation::new(NodeSpec::new("camera"))).await?;
        // unset fields, with and without a default, then a set one
        round_trip(
            &service,
            &SetPropertyOperation::new(crate_mesh.clone(), "position", json!([1, 2, 3])),
        )
        .await?;
        round_trip(
            &service,
            &SetPropertyOperation::new(crate_mesh.clone(), "material", json!("oak")),
        )
        .await?;
        round_trip(
            &service,
            &SetPropertyOperation::new(lamp.clone(), "intensity", json!(0.25)),
        )
        .await?;
        round_trip(&service, &SetPropertyOperation::new(lamp.clone(), "name", json!("Sun"))).await?;
        service
            .invoke_and_push(&SetPropertyOperation::new(barrel.clone(), "visible", json!(false)))
            .await?;
        round_trip(
            &service,
            &SetPropertyOperation::new(barrel.clone(), "visible", json!(true)),
        )
        .await?;
        round_trip(
            &service,
            &ReparentNodeOperation::new(barrel.clone(), Some(props.clone())).at(0),
        )
        .await?;
        round_trip(&service, &ReparentNodeOperation::new(props.clone(), None)).await?;
        round_trip(
            &service,
            &GroupNodesOperation::new(vec![crate_mesh.clone(), barrel.clone()]).named("Stack"),
        )
        .await?;
        round_trip(
            &service,
            &DeleteNodesOperation::new(vec![lamp.clone(), world.clone()]),
        )
        .await?;

        let graph = service.graph().await;
        assert!(!graph.contains(&world));
        assert!(!graph.contains(&lamp));
        assert!(graph.contains(&crate_mesh));
        Ok(())
    }

    #[tokio::test]
    async fn test_undo_everything_then_redo_everything() -> Result<()> {
        let (session, service) = open();

        let world = create(&session, &service, NodeSpec::new("group"), None).await?;
        let mesh = create(&session, &service, NodeSpec::new("mesh"), Some(&world)).await?;
        let label = create(&session, &service, NodeSpec::new("label"), None).await?;
        service
            .invoke_and_push(&ReparentNodeOperation::new(mesh.clone(), None))
            .await?;
        service
            .invoke_and_push(&SetPropertyOperation::new(label.clone(), "text", json!("Score")))
            .await?;
        service
            .invoke_and_push(&DeleteNodesOperation::new(vec![world.clone()]))
            .await?;
        let finished = service.graph().await;

        let mut undone = 0;
        while service.undo().await? {
            undone += 1;
            assert_sound(&service.graph().await);
        }
        assert_eq!(undone, 6);
        assert!(service.graph().await.is_empty());

        while service.redo().await? {
            assert_sound(&service.graph().await);
        }
        assert_eq!(service.graph().await, finished);
        Ok(())
    }

    #[tokio::test]
    async fn test_current_values_never_record() -> Result<()> {
        let (session, service) = open();
        let sprite = create(&session, &service, NodeSpec::new("sprite").named("Coin"), None).await?;
        let before = service.history_labels().await;

        let unchanged = [
            SetPropertyOperation::new(sprite.clone(), "name", json!("Coin")),
            SetPropertyOperation::new(sprite.clone(), "visible", json!(true)),
            SetPropertyOperation::new(sprite.clone(), "position", json!([0, 0])),
            SetPropertyOperation::new(sprite.clone(), "scale", json!([1.0, 1.0])),
            SetPropertyOperation::new(sprite.clone(), "rotation", json!(0)),
        ];
        for operation in &unchanged {
            assert!(
                !service.invoke_and_push(operation).await?,
                "{} should be a no-op",
                operation.label()
            );
        }

        // a real change, then the same change again
        let move_right = SetPropertyOperation::new(sprite.clone(), "position", json!([10, 0]));
        assert!(service.invoke_and_push(&move_right).await?);
        assert!(!service.invoke_and_push(&move_right).await?);

        let after = service.history_labels().await;
        assert_eq!(after.undo.len(), before.undo.len() + 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_redo_cleared_by_any_new_commit() -> Result<()> {
        let (session, service) = open();
        let mesh = create(&session, &service, NodeSpec::new("mesh"), None).await?;
        service
            .invoke_and_push(&SetPropertyOperation::new(mesh.clone(), "name", json!("Rock")))
            .await?;

        service.undo().await?;
        assert_eq!(service.history_labels().await.redo, vec!["Rename Node"]);

        // a no-op must not clear redo
        service
            .invoke_and_push(&SetPropertyOperation::new(mesh.clone(), "visible", json!(true)))
            .await?;
        assert!(service.can_redo().await);

        service
            .invoke_and_push(&SetPropertyOperation::new(mesh.clone(), "visible", json!(false)))
            .await?;
        assert!(!service.can_redo().await);
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_structure_requests_change_nothing() -> Result<()> {
        let (session, service) = open();
        let outer = create(&session, &service, NodeSpec::new("group"), None).await?;
        let inner = create(&session, &service, NodeSpec::new("group"), Some(&outer)).await?;
        let sprite = create(&session, &service, NodeSpec::new("sprite"), None).await?;
        let before = service.graph().await;

        // cycle, self-target, dimension mismatch, non-container target
        assert!(!service
            .invoke_and_push(&ReparentNodeOperation::new(outer.clone(), Some(inner.clone())))
            .await?);
        assert!(!service
            .invoke_and_push(&ReparentNodeOperation::new(outer.clone(), Some(outer.clone())))
            .await?);
        assert!(!service
            .invoke_and_push(&ReparentNodeOperation::new(sprite.clone(), Some(inner.clone())))
            .await?);
        let mesh = create(&session, &service, NodeSpec::new("mesh"), None).await?;
        let with_mesh = service.graph().await;
        assert!(!service
            .invoke_and_push(&ReparentNodeOperation::new(inner.clone(), Some(mesh.clone())))
            .await?);

        assert_eq!(service.graph().await, with_mesh);
        service.undo().await?;
        assert_eq!(service.graph().await, before);
        Ok(())
    }
}
