//! Scene graph + render-form synchronization tests

use super::*;
use crate::assets::{MaterialDesc, MaterialStore, ModelData, ModelStore, TextureStore};
use crate::foundation::math::Vec3;
use crate::render::backends::HeadlessBackend;

struct Fixture {
    backend: HeadlessBackend,
    models: ModelStore,
    textures: TextureStore,
    materials: MaterialStore,
    scene: Scene,
    renderform: RenderformCreator,
}

impl Fixture {
    fn new() -> Self {
        let mut backend = HeadlessBackend::new();
        let mut models = ModelStore::new();
        models.load("cube", &ModelData::cube(), &mut backend).unwrap();

        let mut two_part = ModelData::cube();
        two_part
            .meshes
            .push(ModelData::plane(1.0).meshes.remove(0).with_material_slot(1));
        models.load("lamp_post", &two_part, &mut backend).unwrap();

        let textures = TextureStore::new();
        let mut materials = MaterialStore::new();
        materials
            .load("brick", &MaterialDesc::from_color([0.7, 0.3, 0.2]), &textures)
            .unwrap();
        materials
            .load("glass", &MaterialDesc::from_color([0.9, 0.9, 1.0]), &textures)
            .unwrap();

        Self {
            backend,
            models,
            textures,
            materials,
            scene: Scene::new(),
            renderform: RenderformCreator::new(),
        }
    }

    fn sync(&mut self) -> Result<(), RenderformError> {
        let updates = self.scene.pull_updates();
        self.renderform
            .update(&updates, &self.scene, &self.models, &self.materials)
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        self.models.clear(&mut self.backend);
        self.textures.clear(&mut self.backend);
    }
}

fn cube(uuid: &str, material: &str) -> NodeDesc {
    NodeDesc::new(uuid).with_model("cube").with_materials([material])
}

#[test]
fn test_added_node_appears_under_its_material() {
    let mut fx = Fixture::new();
    let id = fx.scene.create_node(cube("cube0", "brick")).unwrap();
    fx.sync().unwrap();

    let batch = fx.renderform.batch("brick").unwrap();
    assert_eq!(batch.draws.len(), 1);
    assert_eq!(batch.draws[0].node, id);
    assert_eq!(batch.draws[0].model, "cube");
    assert_eq!(batch.draws[0].index_count, 36);
    assert_eq!(batch.material.diffuse_color, [0.7, 0.3, 0.2]);
    assert!(fx.renderform.contains_node(id));
}

#[test]
fn test_removed_node_leaves_the_renderform() {
    let mut fx = Fixture::new();
    let keep = fx.scene.create_node(cube("keep", "brick")).unwrap();
    let drop_me = fx.scene.create_node(cube("drop", "brick")).unwrap();
    fx.sync().unwrap();
    assert_eq!(fx.renderform.draw_count(), 2);

    fx.scene.remove_node(drop_me).unwrap();
    fx.sync().unwrap();

    assert_eq!(fx.renderform.draw_count(), 1);
    assert!(fx.renderform.contains_node(keep));
    assert!(!fx.renderform.contains_node(drop_me));
}

#[test]
fn test_last_draw_removal_drops_the_batch() {
    let mut fx = Fixture::new();
    let id = fx.scene.create_node(cube("only", "glass")).unwrap();
    fx.sync().unwrap();
    fx.scene.remove_node(id).unwrap();
    fx.sync().unwrap();

    assert!(fx.renderform.renderform().is_empty());
}

#[test]
fn test_add_and_remove_in_one_tick_leaves_nothing() {
    let mut fx = Fixture::new();
    let id = fx.scene.create_node(cube("flash", "brick")).unwrap();
    fx.scene.remove_node(id).unwrap();
    fx.sync().unwrap();

    assert_eq!(fx.renderform.draw_count(), 0);
    assert!(!fx.scene.has_pending_updates());
}

#[test]
fn test_same_model_two_nodes_removal_is_by_identity() {
    let mut fx = Fixture::new();
    let a = fx.scene.create_node(cube("a", "brick")).unwrap();
    let b = fx.scene.create_node(cube("b", "brick")).unwrap();
    fx.sync().unwrap();

    fx.scene.remove_node(a).unwrap();
    fx.sync().unwrap();

    let draws = &fx.renderform.batch("brick").unwrap().draws;
    assert_eq!(draws.len(), 1);
    assert_eq!(draws[0].node, b);
}

#[test]
fn test_multi_mesh_model_spans_batches() {
    let mut fx = Fixture::new();
    let id = fx
        .scene
        .create_node(NodeDesc::new("post").with_model("lamp_post").with_materials(["brick", "glass"]))
        .unwrap();
    fx.sync().unwrap();

    assert_eq!(fx.renderform.batch("brick").unwrap().draws[0].mesh_index, 0);
    assert_eq!(fx.renderform.batch("glass").unwrap().draws[0].mesh_index, 1);

    fx.scene.remove_node(id).unwrap();
    fx.sync().unwrap();
    assert!(fx.renderform.renderform().is_empty());
}

#[test]
fn test_unknown_material_is_reported_and_skipped() {
    let mut fx = Fixture::new();
    fx.scene.create_node(cube("bad", "marble")).unwrap();
    let good = fx.scene.create_node(cube("good", "brick")).unwrap();

    let err = fx.sync().unwrap_err();
    assert_eq!(
        err,
        RenderformError::UnknownMaterial {
            node: "bad".to_string(),
            material: "marble".to_string(),
        }
    );
    assert_eq!(fx.renderform.draw_count(), 1);
    assert!(fx.renderform.contains_node(good));
}

#[test]
fn test_model_without_meshes_is_not_tracked() {
    let mut fx = Fixture::new();
    fx.models.insert_unchecked("empty", Vec::new()).unwrap();
    let id = fx
        .scene
        .create_node(NodeDesc::new("ghost").with_model("empty").with_materials(["brick"]))
        .unwrap();
    fx.sync().unwrap();

    assert!(!fx.renderform.contains_node(id));
    assert!(fx.renderform.renderform().is_empty());
}

#[test]
fn test_failing_node_leaves_no_partial_entries() {
    let mut fx = Fixture::new();
    // Mesh 0 resolves, mesh 1 needs a second material slot
    fx.scene
        .create_node(NodeDesc::new("post").with_model("lamp_post").with_materials(["brick"]))
        .unwrap();

    let err = fx.sync().unwrap_err();
    assert!(matches!(
        err,
        RenderformError::MaterialSlotOutOfRange { slot: 1, available: 1, .. }
    ));
    assert!(fx.renderform.renderform().is_empty());
}

#[test]
fn test_first_error_is_returned() {
    let mut fx = Fixture::new();
    fx.scene
        .create_node(NodeDesc::new("ghost").with_model("teapot").with_materials(["brick"]))
        .unwrap();
    fx.scene.create_node(cube("bad", "marble")).unwrap();

    assert!(matches!(fx.sync(), Err(RenderformError::UnknownModel { .. })));
}

#[test]
fn test_lights_and_modelless_nodes_are_not_drawn() {
    let mut fx = Fixture::new();
    let cube0 = fx.scene.create_node(cube("cube0", "brick")).unwrap();
    let light0 = fx
        .scene
        .create_node(NodeDesc::new("light0").with_category(NodeCategory::Light))
        .unwrap();
    fx.scene.create_node(NodeDesc::new("pivot")).unwrap();
    fx.sync().unwrap();

    assert_eq!(fx.renderform.draw_count(), 1);
    let batch = fx.renderform.batch("brick").unwrap();
    assert_eq!(batch.draws[0].node, cube0);
    assert_eq!(fx.scene.nodes_in_category(NodeCategory::Light), &[light0]);
    assert_eq!(fx.scene.nodes_in_category(NodeCategory::Normal).len(), 2);
}

#[test]
fn test_recategorized_node_is_refolded() {
    let mut fx = Fixture::new();
    let id = fx.scene.create_node(cube("cube0", "brick")).unwrap();
    fx.sync().unwrap();

    fx.scene.set_category(id, NodeCategory::Invalid).unwrap();
    fx.sync().unwrap();
    assert!(!fx.renderform.contains_node(id));

    fx.scene.set_category(id, NodeCategory::Normal).unwrap();
    fx.sync().unwrap();
    assert!(fx.renderform.contains_node(id));
    assert_eq!(fx.renderform.draw_count(), 1);
}

#[test]
fn test_subtree_removal_clears_child_draws() {
    let mut fx = Fixture::new();
    let parent = fx.scene.create_node(cube("parent", "brick")).unwrap();
    let child = fx.scene.create_child_node(parent, cube("child", "glass")).unwrap();
    fx.sync().unwrap();
    assert_eq!(fx.renderform.draw_count(), 2);

    fx.scene.remove_node(parent).unwrap();
    fx.sync().unwrap();
    assert!(!fx.renderform.contains_node(child));
    assert_eq!(fx.renderform.draw_count(), 0);
}

#[test]
fn test_tick_sequence_propagates_and_refreshes_bounds() {
    let mut fx = Fixture::new();
    let bounds = fx.models["cube"].bounds();
    let parent = fx.scene.create_node(cube("parent", "brick").with_bounds(bounds)).unwrap();
    let child = fx
        .scene
        .create_child_node(parent, cube("child", "brick").with_bounds(bounds))
        .unwrap();
    fx.sync().unwrap();

    fx.scene.snapshot_transforms();
    fx.scene.translate(parent, Vec3::new(5.0, 0.0, 0.0), true);
    fx.scene.refresh_bounds();

    for id in [parent, child] {
        let node = fx.scene.node(id).unwrap();
        assert_eq!(node.aabb.min_x(), 4.5);
        assert_eq!(node.aabb.max_x(), 5.5);
        assert_eq!(node.transform.interpolated(0.0)[(0, 3)], 0.0);
        assert_eq!(node.transform.interpolated(1.0)[(0, 3)], 5.0);
    }
    // Transform edits are not structural
    assert!(!fx.scene.has_pending_updates());
}
