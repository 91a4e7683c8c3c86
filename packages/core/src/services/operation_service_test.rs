//! Tests for OperationService: recording, undo/redo and the FIFO gate

#[cfg(test)]
mod operation_service_tests {
    use crate::collaborators::{
        Collaborators, MemoryDocumentStore, RecordingRenderSync, RenderCall,
    };
    use crate::config::EngineConfig;
    use crate::document::Document;
    use crate::models::{NodeId, SceneId};
    use crate::operations::{
        Change, CreateNodeOperation, DeleteNodesOperation, NodeSpec, Operation,
        OperationContext, OperationError, OperationOutcome, SaveDocumentOperation,
        SelectNodesOperation, SetPropertyOperation,
    };
    use crate::services::OperationService;
    use crate::state::{StateStore, StateSynchronizer};
    use async_trait::async_trait;
    use serde_json::json;
    use std::path::Path;
    use std::sync::Arc;

    struct Harness {
        service: OperationService,
        store: Arc<StateStore>,
        files: Arc<MemoryDocumentStore>,
    }

    fn harness(config: EngineConfig) -> Harness {
        harness_with(config, Collaborators::default())
    }

    fn harness_with(config: EngineConfig, collaborators: Collaborators) -> Harness {
        let store = Arc::new(StateStore::default());
        let files = Arc::new(MemoryDocumentStore::new());
        let collaborators = collaborators.with_persistence(files.clone());
        let document = Document::new(SceneId::new("scene-1"), "Test Scene");

        let synchronizer = StateSynchronizer::new(&store, &collaborators.render);
        synchronizer.register_document(&document);
        synchronizer.set_active(Some(SceneId::new("scene-1")));

        let service =
            OperationService::new(document, store.clone(), collaborators, Arc::new(config));
        Harness {
            service,
            store,
            files,
        }
    }

    fn primary(store: &StateStore) -> NodeId {
        store
            .snapshot()
            .selection
            .primary_node_id
            .clone()
            .expect("something should be selected")
    }

    #[tokio::test]
    async fn test_create_undo_redo() {
        let h = harness(EngineConfig::default());

        let created = h
            .service
            .invoke_and_push(&CreateNodeOperation::new(NodeSpec::new("sprite")))
            .await
            .unwrap();
        assert!(created);
        let sprite = primary(&h.store);

        // sprite plus the auto-created canvas
        let graph = h.service.graph().await;
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.roots().len(), 1);
        assert!(h.service.read(|d| d.dirty).await);

        assert!(h.service.undo().await.unwrap());
        assert!(h.service.graph().await.is_empty());
        assert!(h.store.snapshot().selection.is_empty());

        assert!(h.service.redo().await.unwrap());
        let graph = h.service.graph().await;
        assert_eq!(graph.len(), 2);
        assert!(graph.contains(&sprite));
        assert_eq!(primary(&h.store), sprite);
    }

    #[tokio::test]
    async fn test_undo_redo_on_empty_history() {
        let h = harness(EngineConfig::default());

        assert!(!h.service.undo().await.unwrap());
        assert!(!h.service.redo().await.unwrap());
        assert!(!h.service.can_undo().await);
    }

    #[tokio::test]
    async fn test_invoke_is_not_recorded() {
        let h = harness(EngineConfig::default());
        h.service
            .invoke_and_push(&CreateNodeOperation::new(NodeSpec::new("mesh")))
            .await
            .unwrap();
        let mesh = primary(&h.store);

        let outcome = h
            .service
            .invoke(&SelectNodesOperation::new(vec![]))
            .await
            .unwrap();
        assert!(outcome.did_mutate());
        assert!(h.store.snapshot().selection.is_empty());

        let labels = h.service.history_labels().await;
        assert_eq!(labels.undo, vec!["Create Mesh"]);

        h.service
            .invoke(&SelectNodesOperation::new(vec![mesh.clone()]))
            .await
            .unwrap();
        assert_eq!(primary(&h.store), mesh);
    }

    #[tokio::test]
    async fn test_noop_is_not_recorded() {
        let h = harness(EngineConfig::default());
        h.service
            .invoke_and_push(&CreateNodeOperation::new(NodeSpec::new("mesh").named("Cube")))
            .await
            .unwrap();
        let mesh = primary(&h.store);

        let renamed = h
            .service
            .invoke_and_push(&SetPropertyOperation::new(mesh.clone(), "name", json!("Cube")))
            .await
            .unwrap();
        assert!(!renamed);

        let missing = h
            .service
            .invoke_and_push(&SetPropertyOperation::new(
                NodeId::new("gone"),
                "name",
                json!("Ghost"),
            ))
            .await
            .unwrap();
        assert!(!missing);

        assert_eq!(h.service.history_labels().await.undo.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_operation_leaves_history_untouched() {
        let h = harness(EngineConfig::default());
        h.service
            .invoke_and_push(&CreateNodeOperation::new(NodeSpec::new("light")))
            .await
            .unwrap();

        let err = h
            .service
            .invoke(&SaveDocumentOperation::new())
            .await
            .unwrap_err();
        assert!(matches!(err, OperationError::InvalidOperation(_)));
        assert_eq!(h.service.history_labels().await.undo.len(), 1);
        assert!(h.service.read(|d| d.dirty).await);
    }

    #[tokio::test]
    async fn test_save_marks_clean_without_recording() {
        let h = harness(EngineConfig::default());
        h.service
            .invoke_and_push(&CreateNodeOperation::new(NodeSpec::new("camera")))
            .await
            .unwrap();

        let outcome = h
            .service
            .invoke(&SaveDocumentOperation::to_path("scenes/test.scene.json"))
            .await
            .unwrap();
        assert!(outcome.did_mutate());

        assert!(!h.service.read(|d| d.dirty).await);
        assert!(h.files.get(Path::new("scenes/test.scene.json")).is_some());
        assert_eq!(h.service.history_labels().await.undo.len(), 1);

        let state = h.store.snapshot();
        let descriptor = state.scenes.active_descriptor().unwrap();
        assert!(!descriptor.dirty);
        assert_eq!(
            descriptor.path.as_deref(),
            Some(Path::new("scenes/test.scene.json"))
        );
    }

    #[tokio::test]
    async fn test_history_is_bounded() {
        let config = EngineConfig {
            max_history: 2,
            ..EngineConfig::default()
        };
        let h = harness(config);
        h.service
            .invoke_and_push(&CreateNodeOperation::new(NodeSpec::new("mesh")))
            .await
            .unwrap();
        let mesh = primary(&h.store);

        for name in ["A", "B"] {
            h.service
                .invoke_and_push(&SetPropertyOperation::new(mesh.clone(), "name", json!(name)))
                .await
                .unwrap();
        }

        let labels = h.service.history_labels().await;
        assert_eq!(labels.undo, vec!["Rename Node", "Rename Node"]);

        assert!(h.service.undo().await.unwrap());
        assert!(h.service.undo().await.unwrap());
        assert!(!h.service.undo().await.unwrap());
        // the creation itself was evicted
        assert!(h.service.graph().await.contains(&mesh));
    }

    #[tokio::test]
    async fn test_history_status_is_published() {
        let h = harness(EngineConfig::default());
        h.service
            .invoke_and_push(&CreateNodeOperation::new(NodeSpec::new("mesh")))
            .await
            .unwrap();
        h.service.undo().await.unwrap();

        let state = h.store.snapshot();
        let history = state.scenes.active_descriptor().unwrap().history;
        assert_eq!(history.undo_len, 0);
        assert_eq!(history.redo_len, 1);

        h.service.clear_history().await;
        let state = h.store.snapshot();
        assert_eq!(state.scenes.active_descriptor().unwrap().history.redo_len, 0);
    }

    #[tokio::test]
    async fn test_new_commit_clears_redo() {
        let h = harness(EngineConfig::default());
        h.service
            .invoke_and_push(&CreateNodeOperation::new(NodeSpec::new("mesh")))
            .await
            .unwrap();
        h.service.undo().await.unwrap();
        assert!(h.service.can_redo().await);

        h.service
            .invoke_and_push(&CreateNodeOperation::new(NodeSpec::new("light")))
            .await
            .unwrap();
        assert!(!h.service.can_redo().await);
    }

    #[tokio::test]
    async fn test_concurrent_calls_commit_in_call_order() {
        let h = harness(EngineConfig::default());

        let first = CreateNodeOperation::new(NodeSpec::new("mesh").named("First"));
        let second = CreateNodeOperation::new(NodeSpec::new("mesh").named("Second"));
        let third = CreateNodeOperation::new(NodeSpec::new("mesh").named("Third"));

        let (a, b, c) = tokio::join!(
            h.service.invoke_and_push(&first),
            h.service.invoke_and_push(&second),
            h.service.invoke_and_push(&third),
        );
        assert!(a.unwrap() && b.unwrap() && c.unwrap());

        let labels = h.service.history_labels().await;
        assert_eq!(
            labels.undo,
            vec!["Create First", "Create Second", "Create Third"]
        );

        let graph = h.service.graph().await;
        let names: Vec<&str> = graph
            .roots()
            .iter()
            .filter_map(|id| graph.get(id))
            .map(|node| node.name.as_str())
            .collect();
        assert_eq!(names, vec!["First", "Second", "Third"]);
    }

    #[tokio::test]
    async fn test_undo_restores_unset_defaulted_property() {
        let h = harness(EngineConfig::default());
        h.service
            .invoke_and_push(&CreateNodeOperation::new(NodeSpec::new("mesh")))
            .await
            .unwrap();
        let mesh = primary(&h.store);
        let before = h.service.graph().await;
        assert!(before.get(&mesh).unwrap().property("position").is_none());

        h.service
            .invoke_and_push(&SetPropertyOperation::new(
                mesh.clone(),
                "position",
                json!([1.0, 2.0, 3.0]),
            ))
            .await
            .unwrap();
        assert!(h.service.undo().await.unwrap());

        // the key is gone again, not set to its default
        let graph = h.service.graph().await;
        assert!(graph.get(&mesh).unwrap().property("position").is_none());
        assert_eq!(graph, before);
    }

    #[tokio::test]
    async fn test_undo_and_redo_replay_render_sync() {
        let recorder = Arc::new(RecordingRenderSync::new());
        let h = harness_with(
            EngineConfig::default(),
            Collaborators::default().with_render_sync(recorder.clone()),
        );
        h.service
            .invoke_and_push(&CreateNodeOperation::new(NodeSpec::new("mesh")))
            .await
            .unwrap();
        let mesh = primary(&h.store);
        recorder.take_calls();

        let moved = SetPropertyOperation::new(mesh.clone(), "position", json!([4.0, 0.0, 0.0]));
        h.service.invoke_and_push(&moved).await.unwrap();
        assert_eq!(recorder.take_calls(), vec![RenderCall::Transform(mesh.clone())]);

        h.service.undo().await.unwrap();
        assert_eq!(recorder.take_calls(), vec![RenderCall::Transform(mesh.clone())]);
        h.service.redo().await.unwrap();
        assert_eq!(recorder.take_calls(), vec![RenderCall::Transform(mesh.clone())]);

        let hidden = SetPropertyOperation::new(mesh.clone(), "visible", json!(false));
        h.service.invoke_and_push(&hidden).await.unwrap();
        assert_eq!(recorder.take_calls(), vec![RenderCall::Visibility(mesh.clone())]);
        h.service.undo().await.unwrap();
        assert_eq!(recorder.take_calls(), vec![RenderCall::Visibility(mesh.clone())]);

        h.service
            .invoke_and_push(&DeleteNodesOperation::new(vec![mesh.clone()]))
            .await
            .unwrap();
        assert!(recorder.take_calls().contains(&RenderCall::Visibility(mesh.clone())));
        h.service.undo().await.unwrap();
        let calls = recorder.take_calls();
        assert!(calls.contains(&RenderCall::Transform(mesh.clone())));
        assert!(calls.contains(&RenderCall::Selection(vec![mesh.clone()])));
    }

    #[tokio::test]
    async fn test_render_sync_failures_are_swallowed() {
        let recorder = Arc::new(RecordingRenderSync::failing());
        let h = harness_with(
            EngineConfig::default(),
            Collaborators::default().with_render_sync(recorder.clone()),
        );

        assert!(h
            .service
            .invoke_and_push(&CreateNodeOperation::new(NodeSpec::new("light")))
            .await
            .unwrap());
        let light = primary(&h.store);
        assert!(h
            .service
            .invoke_and_push(&SetPropertyOperation::new(
                light.clone(),
                "position",
                json!([0.0, 5.0, 0.0]),
            ))
            .await
            .unwrap());

        assert!(h.service.undo().await.unwrap());
        assert!(h.service.graph().await.get(&light).unwrap().property("position").is_none());
        assert!(h.service.redo().await.unwrap());
        assert_eq!(
            h.service.graph().await.get(&light).unwrap().property("position"),
            Some(&json!([0.0, 5.0, 0.0]))
        );

        // every notification was attempted and failed
        assert!(recorder.calls().contains(&RenderCall::Transform(light.clone())));
        assert_eq!(h.service.history_labels().await.undo.len(), 2);
    }

    /// Commits a raw reparent without any of the checks the real
    /// reparent operation makes
    struct RawReparent {
        node_id: NodeId,
        to_parent: NodeId,
    }

    #[async_trait]
    impl Operation for RawReparent {
        fn label(&self) -> String {
            "Raw Reparent".to_string()
        }

        async fn perform(
            &self,
            ctx: &mut OperationContext<'_>,
        ) -> Result<OperationOutcome, OperationError> {
            let graph = &ctx.document.graph;
            let from_parent = graph.parent_of(&self.node_id).cloned();
            let from_index = graph.index_in_parent(&self.node_id).unwrap_or_default();
            let change = Change::Reparent {
                node_id: self.node_id.clone(),
                from_parent,
                from_index,
                to_parent: Some(self.to_parent.clone()),
                to_index: 0,
            };
            ctx.commit(self.label(), change)
        }
    }

    #[tokio::test]
    async fn test_failed_move_restores_the_subtree() {
        let h = harness(EngineConfig::default());
        h.service
            .invoke_and_push(&CreateNodeOperation::new(NodeSpec::new("mesh")))
            .await
            .unwrap();
        h.service
            .invoke_and_push(&CreateNodeOperation::new(NodeSpec::new("group")))
            .await
            .unwrap();
        let outer = primary(&h.store);
        h.service
            .invoke_and_push(&CreateNodeOperation::new(NodeSpec::new("group")))
            .await
            .unwrap();
        let inner = primary(&h.store);
        let before = h.service.graph().await;
        assert_eq!(before.parent_of(&inner), Some(&outer));
        assert_eq!(before.index_in_parent(&outer), Some(1));

        // the target leaves the graph together with the moved node
        let err = h
            .service
            .invoke_and_push(&RawReparent {
                node_id: outer.clone(),
                to_parent: inner.clone(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, OperationError::Internal(_)), "{:?}", err);

        let after = h.service.graph().await;
        assert_eq!(after, before);
        after.check_integrity().unwrap();
        assert_eq!(h.service.history_labels().await.undo.len(), 3);
    }
}
