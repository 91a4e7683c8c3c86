//! State Synchronizer
//!
//! Projects document mutations into the reactive state tree. It holds no
//! business logic: each method rebuilds or edits one sub-tree, replaces it as
//! a whole and reports what changed. Selection replacements are forwarded to
//! the renderer.

use crate::collaborators::RenderNotifier;
use crate::document::Document;
use crate::models::SceneId;
use crate::state::{
    HierarchySnapshot, HistoryStatus, PlayMode, SceneDescriptor, SelectionState, StateEvent,
    StateStore,
};
use std::sync::Arc;

pub struct StateSynchronizer<'a> {
    store: &'a StateStore,
    render: &'a RenderNotifier,
}

impl<'a> StateSynchronizer<'a> {
    pub fn new(store: &'a StateStore, render: &'a RenderNotifier) -> Self {
        Self { store, render }
    }

    /// Publish descriptor and hierarchy for a newly opened document
    pub fn register_document(&self, document: &Document) {
        let scene_id = document.scene_id().clone();
        let descriptor = SceneDescriptor {
            id: scene_id.clone(),
            name: document.name.clone(),
            path: document.path.clone(),
            dirty: document.dirty,
            history: HistoryStatus::default(),
        };
        let hierarchy = Arc::new(HierarchySnapshot::from_graph(&document.graph));

        self.store.update(|state| {
            let mut scenes = (*state.scenes).clone();
            scenes.descriptors.insert(scene_id.clone(), descriptor);
            scenes.hierarchies.insert(scene_id.clone(), hierarchy);
            state.scenes = Arc::new(scenes);
            vec![
                StateEvent::DescriptorChanged {
                    scene_id: scene_id.clone(),
                },
                StateEvent::HierarchyChanged { scene_id },
            ]
        });
    }

    /// Drop every trace of a closed document; closing the active document
    /// leaves no document active and clears the selection
    pub fn unregister_document(&self, scene_id: &SceneId) {
        let mut cleared_selection = None;
        self.store.update(|state| {
            if !state.scenes.descriptors.contains_key(scene_id) {
                return Vec::new();
            }
            let mut events = Vec::new();
            let mut scenes = (*state.scenes).clone();
            scenes.descriptors.remove(scene_id);
            scenes.hierarchies.remove(scene_id);
            if scenes.active_scene_id.as_ref() == Some(scene_id) {
                scenes.active_scene_id = None;
                events.push(StateEvent::ActiveSceneChanged { scene_id: None });
                if !state.selection.is_empty() {
                    let selection = SelectionState::default();
                    state.selection = Arc::new(selection.clone());
                    events.push(StateEvent::SelectionChanged { node_ids: Vec::new() });
                    cleared_selection = Some(selection);
                }
            }
            state.scenes = Arc::new(scenes);
            events.push(StateEvent::DocumentClosed {
                scene_id: scene_id.clone(),
            });
            events
        });

        if let Some(selection) = cleared_selection {
            self.render.selection(&selection);
        }
    }

    /// Switch the active document; the selection belongs to the previously
    /// active document and is cleared on a switch
    pub fn set_active(&self, scene_id: Option<SceneId>) {
        let mut cleared_selection = None;
        self.store.update(|state| {
            if state.scenes.active_scene_id == scene_id {
                return Vec::new();
            }
            let mut scenes = (*state.scenes).clone();
            scenes.active_scene_id = scene_id.clone();
            state.scenes = Arc::new(scenes);

            let mut events = vec![StateEvent::ActiveSceneChanged { scene_id }];
            if !state.selection.is_empty() {
                let selection = SelectionState::default();
                state.selection = Arc::new(selection.clone());
                events.push(StateEvent::SelectionChanged { node_ids: Vec::new() });
                cleared_selection = Some(selection);
            }
            events
        });

        if let Some(selection) = cleared_selection {
            self.render.selection(&selection);
        }
    }

    /// Rebuild the hierarchy snapshot of `document` from its graph
    pub fn project_hierarchy(&self, document: &Document) {
        let scene_id = document.scene_id().clone();
        let hierarchy = HierarchySnapshot::from_graph(&document.graph);

        self.store.update(|state| {
            if state.scenes.hierarchies.get(&scene_id).map(Arc::as_ref) == Some(&hierarchy) {
                return Vec::new();
            }
            let mut scenes = (*state.scenes).clone();
            scenes
                .hierarchies
                .insert(scene_id.clone(), Arc::new(hierarchy));
            state.scenes = Arc::new(scenes);
            vec![StateEvent::HierarchyChanged { scene_id }]
        });
    }

    /// Mirror name, path and dirty flag of `document` into its descriptor
    pub fn sync_descriptor(&self, document: &Document) {
        let scene_id = document.scene_id();
        self.edit_descriptor(scene_id, |descriptor| {
            descriptor.name = document.name.clone();
            descriptor.path = document.path.clone();
            descriptor.dirty = document.dirty;
        });
    }

    pub fn publish_history(&self, scene_id: &SceneId, status: HistoryStatus) {
        self.edit_descriptor(scene_id, |descriptor| descriptor.history = status);
        self.store.update(|_| {
            vec![StateEvent::HistoryChanged {
                scene_id: scene_id.clone(),
                undo_len: status.undo_len,
                redo_len: status.redo_len,
            }]
        });
    }

    /// Replace the selection and tell the renderer
    pub fn replace_selection(&self, selection: SelectionState) {
        let mut replaced = false;
        self.store.update(|state| {
            if *state.selection == selection {
                return Vec::new();
            }
            state.selection = Arc::new(selection.clone());
            replaced = true;
            vec![StateEvent::SelectionChanged {
                node_ids: selection.node_ids.clone(),
            }]
        });

        if replaced {
            self.render.selection(&selection);
        }
    }

    /// Remove selected ids that no longer exist in the active document
    pub fn prune_selection(&self, document: &Document) {
        let state = self.store.snapshot();
        if state.scenes.active_scene_id.as_ref() != Some(document.scene_id()) {
            return;
        }
        let pruned = state.selection.retain(|id| document.graph.contains(id));
        if pruned != *state.selection {
            self.replace_selection(pruned);
        }
    }

    pub fn set_play_mode(&self, mode: PlayMode) {
        self.store.update(|state| {
            if state.play_mode == mode {
                return Vec::new();
            }
            state.play_mode = mode;
            vec![StateEvent::PlayModeChanged { mode }]
        });
    }

    /// Full projection after a document mutation
    pub fn project_document(&self, document: &Document) {
        self.project_hierarchy(document);
        self.sync_descriptor(document);
        self.prune_selection(document);
    }

    fn edit_descriptor(
        &self,
        scene_id: &SceneId,
        edit: impl FnOnce(&mut SceneDescriptor),
    ) {
        self.store.update(|state| {
            let Some(current) = state.scenes.descriptors.get(scene_id) else {
                return Vec::new();
            };
            let mut descriptor = current.clone();
            edit(&mut descriptor);
            if descriptor == *current {
                return Vec::new();
            }
            let mut scenes = (*state.scenes).clone();
            scenes.descriptors.insert(scene_id.clone(), descriptor);
            state.scenes = Arc::new(scenes);
            vec![StateEvent::DescriptorChanged {
                scene_id: scene_id.clone(),
            }]
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{RecordingRenderSync, RenderCall};
    use crate::graph::Subtree;
    use crate::models::{Node, NodeId};

    fn document_with_node() -> (Document, NodeId) {
        let mut document = Document::new(SceneId::from("s1"), "Level");
        let node = Node::from_kind("group", "World").unwrap();
        let id = node.id.clone();
        document.graph.attach(Subtree::single(node), None, None).unwrap();
        (document, id)
    }

    #[test]
    fn test_register_and_project() {
        let store = StateStore::new(16);
        let render = RenderNotifier::new(Arc::new(RecordingRenderSync::new()));
        let sync = StateSynchronizer::new(&store, &render);
        let (mut document, id) = document_with_node();

        sync.register_document(&document);
        sync.set_active(Some(document.scene_id().clone()));
        let state = store.snapshot();
        assert!(state.scenes.active_hierarchy().unwrap().contains(&id));

        document.graph.detach(&id, None).unwrap();
        document.dirty = true;
        sync.project_document(&document);

        let state = store.snapshot();
        assert!(state.scenes.active_hierarchy().unwrap().is_empty());
        assert!(state.scenes.active_descriptor().unwrap().dirty);
    }

    #[test]
    fn test_prune_selection_notifies_renderer() {
        let store = StateStore::new(16);
        let recorder = Arc::new(RecordingRenderSync::new());
        let render = RenderNotifier::new(recorder.clone());
        let sync = StateSynchronizer::new(&store, &render);
        let (mut document, id) = document_with_node();

        sync.register_document(&document);
        sync.set_active(Some(document.scene_id().clone()));
        sync.replace_selection(SelectionState::single(id.clone()));
        document.graph.detach(&id, None).unwrap();
        sync.prune_selection(&document);

        assert!(store.snapshot().selection.is_empty());
        assert_eq!(
            recorder.take_calls(),
            vec![RenderCall::Selection(vec![id]), RenderCall::Selection(vec![])]
        );
    }

    #[test]
    fn test_switching_documents_clears_selection() {
        let store = StateStore::new(16);
        let render = RenderNotifier::new(Arc::new(RecordingRenderSync::new()));
        let sync = StateSynchronizer::new(&store, &render);
        let (document, id) = document_with_node();

        sync.register_document(&document);
        sync.set_active(Some(document.scene_id().clone()));
        sync.replace_selection(SelectionState::single(id));
        sync.set_active(Some(SceneId::from("other")));

        assert!(store.snapshot().selection.is_empty());

        sync.unregister_document(document.scene_id());
        assert!(store.snapshot().scenes.descriptors.is_empty());
    }
}
