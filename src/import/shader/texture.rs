use std::collections::HashMap;

use anyhow::{Result, bail};

use crate::host::node_tree::{ColorSpace, MathOp, SocketValue};
use crate::host::{HostScene, NodeId, NodeTree, TextureId};
use crate::material_defs::TextureKind;
use crate::schema::NodeKind;

use super::super::context::ImportContext;
use super::super::mesh_builder::UV_LAYER_NAME;
use super::backend::BackendProfile;

/// Why a file is sampled. Color and alpha share one sampled subgraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TexturePurpose {
    Sampled,
    NormalMap,
}

impl From<TextureKind> for TexturePurpose {
    fn from(kind: TextureKind) -> Self {
        match kind {
            TextureKind::Color | TextureKind::Alpha => TexturePurpose::Sampled,
            TextureKind::Normal => TexturePurpose::NormalMap,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureSubgraph {
    Sampled { node: NodeId, color: usize, alpha: usize },
    NormalMap { node: NodeId },
}

impl TextureSubgraph {
    /// Output socket feeding a parameter of the given texture kind.
    pub fn output(self, kind: TextureKind) -> Option<(NodeId, usize)> {
        match (self, kind) {
            (TextureSubgraph::Sampled { node, color, .. }, TextureKind::Color) => Some((node, color)),
            (TextureSubgraph::Sampled { node, alpha, .. }, TextureKind::Alpha) => Some((node, alpha)),
            (TextureSubgraph::NormalMap { node }, TextureKind::Normal) => Some((node, 0)),
            _ => None,
        }
    }
}

/// Where subgraphs are built inside one definition instance.
#[derive(Debug, Clone, Copy)]
pub struct SubgraphSite {
    pub uv_scale: [f32; 2],
    /// Sample through legacy texture datablocks with UVs offset around the mapping.
    pub uv_offset: bool,
    /// Geometry node of a legacy instance, source of the UV coordinates.
    pub geometry: Option<NodeId>,
}

impl SubgraphSite {
    pub fn new(profile: &BackendProfile, uv_scale: [f32; 2], geometry: Option<NodeId>) -> Self {
        Self {
            uv_scale,
            uv_offset: profile.uv_offset,
            geometry,
        }
    }
}

/// Texture subgraphs of one definition instance, keyed by file and purpose.
#[derive(Debug, Default)]
pub struct TextureCache {
    entries: HashMap<(String, TexturePurpose), TextureSubgraph>,
    /// Legacy texture datablocks sampled by the instance, in first-use order.
    pub legacy: Vec<TextureId>,
}

impl TextureCache {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Output socket for `file` used as `kind`, building its subgraph on first use.
    pub fn output(
        &mut self,
        host: &mut HostScene,
        ctx: &mut ImportContext,
        tree: &mut NodeTree,
        site: SubgraphSite,
        kind: TextureKind,
        file: &str,
    ) -> Result<(NodeId, usize)> {
        let purpose = TexturePurpose::from(kind);
        let key = (file.to_string(), purpose);
        let subgraph = match self.entries.get(&key) {
            Some(existing) => *existing,
            None => {
                let y = self.entries.len() as f32 * -300.0 + 300.0;
                let built = match purpose {
                    TexturePurpose::NormalMap => normal_map(host, ctx, tree, site, file, y)?,
                    TexturePurpose::Sampled if site.uv_offset => {
                        self.legacy_sampled(host, ctx, tree, site, file, y)?
                    }
                    TexturePurpose::Sampled => image_sampled(host, ctx, tree, site, file, y)?,
                };
                tracing::debug!(file, ?purpose, y, "built texture subgraph");
                self.entries.insert(key, built);
                built
            }
        };
        match subgraph.output(kind) {
            Some(output) => Ok(output),
            None => bail!("texture '{file}' has no {kind:?} output"),
        }
    }

    fn legacy_sampled(
        &mut self,
        host: &mut HostScene,
        ctx: &mut ImportContext,
        tree: &mut NodeTree,
        site: SubgraphSite,
        file: &str,
        y: f32,
    ) -> Result<TextureSubgraph> {
        let Some(geometry) = site.geometry else {
            bail!("'{}': offset texture coordinates need a geometry node", tree.name);
        };
        let texture = match ctx.legacy_textures.get(file) {
            Some(id) => *id,
            None => {
                let image = ctx.images.get(host, file)?;
                let id = host.new_texture(file, image);
                ctx.legacy_textures.insert(file.to_string(), id);
                id
            }
        };
        if !self.legacy.contains(&texture) {
            self.legacy.push(texture);
        }

        let tex = tree.add_node(NodeKind::Texture);
        tree.set_location(tex, [-300.0, y])?;
        tree.node_mut(tex)?.settings.texture = Some(texture);

        let mapping = mapping_node(tree, site, [-900.0, y])?;
        let add = offset_node(tree, MathOp::Add, [-1100.0, y])?;
        let sub = offset_node(tree, MathOp::Subtract, [-500.0, y])?;
        tree.node_mut(geometry)?.settings.uv_map = Some(UV_LAYER_NAME.to_string());

        tree.link(geometry, 4, add, 0)?;
        tree.link(add, 0, mapping, 0)?;
        tree.link(mapping, 0, sub, 0)?;
        tree.link(sub, 0, tex, 0)?;
        Ok(TextureSubgraph::Sampled {
            node: tex,
            color: 1,
            alpha: 0,
        })
    }
}

fn image_sampled(
    host: &mut HostScene,
    ctx: &mut ImportContext,
    tree: &mut NodeTree,
    site: SubgraphSite,
    file: &str,
    y: f32,
) -> Result<TextureSubgraph> {
    let image = ctx.images.get(host, file)?;
    let tex = tree.add_node(NodeKind::TexImage);
    tree.set_location(tex, [-300.0, y])?;
    tree.node_mut(tex)?.settings.image = Some(image);

    let uv = uv_node(tree, [-900.0, y])?;
    let mapping = mapping_node(tree, site, [-700.0, y])?;
    tree.link(uv, 0, mapping, 0)?;
    tree.link(mapping, 0, tex, 0)?;
    Ok(TextureSubgraph::Sampled {
        node: tex,
        color: 0,
        alpha: 1,
    })
}

fn normal_map(
    host: &mut HostScene,
    ctx: &mut ImportContext,
    tree: &mut NodeTree,
    site: SubgraphSite,
    file: &str,
    y: f32,
) -> Result<TextureSubgraph> {
    let image = ctx.images.get(host, file)?;
    let normal = tree.add_node(NodeKind::NormalMap);
    tree.set_location(normal, [-250.0, y])?;

    let tex = tree.add_node(NodeKind::TexImage);
    tree.set_location(tex, [-500.0, y])?;
    {
        let settings = &mut tree.node_mut(tex)?.settings;
        settings.image = Some(image);
        settings.color_space = Some(ColorSpace::None);
    }

    let uv = uv_node(tree, [-1200.0, y])?;
    let mapping = mapping_node(tree, site, [-900.0, y])?;
    tree.link(uv, 0, mapping, 0)?;
    tree.link(mapping, 0, tex, 0)?;
    tree.link(tex, 0, normal, 1)?;
    Ok(TextureSubgraph::NormalMap { node: normal })
}

fn uv_node(tree: &mut NodeTree, location: [f32; 2]) -> Result<NodeId> {
    let uv = tree.add_node(NodeKind::UvMap);
    tree.set_location(uv, location)?;
    tree.node_mut(uv)?.settings.uv_map = Some(UV_LAYER_NAME.to_string());
    Ok(uv)
}

fn mapping_node(tree: &mut NodeTree, site: SubgraphSite, location: [f32; 2]) -> Result<NodeId> {
    let mapping = tree.add_node(NodeKind::Mapping);
    tree.set_location(mapping, location)?;
    let [s, t] = site.uv_scale;
    tree.node_mut(mapping)?.settings.scale = Some([s, t, 1.0]);
    Ok(mapping)
}

fn offset_node(tree: &mut NodeTree, op: MathOp, location: [f32; 2]) -> Result<NodeId> {
    let node = tree.add_node(NodeKind::VectorMath);
    tree.set_location(node, location)?;
    tree.node_mut(node)?.settings.operation = Some(op);
    tree.set_input_default(node, 1, SocketValue::Vector([1.0, 1.0, 0.0]))?;
    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Backend, EdgeFlagOptions};
    use crate::host::{HostCapabilities, TreeUsage};
    use crate::import::images::ImageStore;
    use crate::import::shader::backend::INTERNAL;

    fn fixture(backend: Backend) -> (tempfile::TempDir, HostScene, ImportContext) {
        let dir = tempfile::tempdir().expect("tempdir");
        for name in ["wood.png", "bump.png"] {
            image::RgbaImage::new(2, 2)
                .save(dir.path().join(name))
                .expect("write png");
        }
        let host = HostScene::empty(HostCapabilities::default());
        let ctx = ImportContext::new(
            backend,
            false,
            EdgeFlagOptions::default(),
            ImageStore::new(dir.path(), false),
        );
        (dir, host, ctx)
    }

    const SITE: SubgraphSite = SubgraphSite {
        uv_scale: [2.0, 3.0],
        uv_offset: false,
        geometry: None,
    };

    #[test]
    fn color_and_alpha_share_one_sampled_subgraph() {
        let (_dir, mut host, mut ctx) = fixture(Backend::Cycles);
        let mut tree = NodeTree::new("Wood", TreeUsage::Group);
        let mut cache = TextureCache::default();

        let color = cache
            .output(&mut host, &mut ctx, &mut tree, SITE, TextureKind::Color, "wood.png")
            .expect("color");
        let alpha = cache
            .output(&mut host, &mut ctx, &mut tree, SITE, TextureKind::Alpha, "wood.png")
            .expect("alpha");
        assert_eq!(color.0, alpha.0);
        assert_eq!((color.1, alpha.1), (0, 1));
        assert_eq!(cache.len(), 1);
        assert_eq!(tree.nodes_of_kind(NodeKind::TexImage).len(), 1);

        let mapping = tree.nodes_of_kind(NodeKind::Mapping)[0];
        assert_eq!(
            tree.node(mapping).expect("mapping").settings.scale,
            Some([2.0, 3.0, 1.0])
        );
        assert_eq!(tree.node(color.0).expect("tex").location, [-300.0, 300.0]);
    }

    #[test]
    fn normal_maps_are_cached_apart_and_placed_below() {
        let (_dir, mut host, mut ctx) = fixture(Backend::Cycles);
        let mut tree = NodeTree::new("Wood", TreeUsage::Group);
        let mut cache = TextureCache::default();

        cache
            .output(&mut host, &mut ctx, &mut tree, SITE, TextureKind::Color, "wood.png")
            .expect("color");
        let (normal, socket) = cache
            .output(&mut host, &mut ctx, &mut tree, SITE, TextureKind::Normal, "bump.png")
            .expect("normal");
        assert_eq!(socket, 0);
        assert_eq!(tree.node(normal).expect("normal").location, [-250.0, 0.0]);

        let tex = tree.link_into(normal, 1).expect("image feeds normal map").from_node;
        assert_eq!(
            tree.node(tex).expect("tex").settings.color_space,
            Some(ColorSpace::None)
        );
        assert_eq!(host.images.len(), 2);
    }

    #[test]
    fn legacy_sampling_offsets_uvs_around_mapping() {
        let (_dir, mut host, mut ctx) = fixture(Backend::Internal);
        let mut tree = NodeTree::new("Wood", TreeUsage::Group);
        let geometry = tree.add_node(NodeKind::Geometry);
        let site = SubgraphSite::new(&INTERNAL, [1.0, 1.0], Some(geometry));
        let mut cache = TextureCache::default();

        let (tex, color) = cache
            .output(&mut host, &mut ctx, &mut tree, site, TextureKind::Color, "wood.png")
            .expect("color");
        assert_eq!(color, 1);
        assert_eq!(tree.node(tex).expect("tex").kind, NodeKind::Texture);
        assert_eq!(cache.legacy.len(), 1);
        assert_eq!(ctx.legacy_textures.len(), 1);

        let sub = tree.link_into(tex, 0).expect("sub").from_node;
        let mapping = tree.link_into(sub, 0).expect("mapping").from_node;
        let add = tree.link_into(mapping, 0).expect("add").from_node;
        assert!(tree.is_linked((geometry, 4), (add, 0)));
        assert_eq!(tree.node(sub).expect("sub").settings.operation, Some(MathOp::Subtract));
        assert_eq!(tree.node(add).expect("add").settings.operation, Some(MathOp::Add));
        assert_eq!(
            tree.node(add).expect("add").inputs[1].default,
            SocketValue::Vector([1.0, 1.0, 0.0])
        );
    }

    #[test]
    fn missing_image_aborts() {
        let (_dir, mut host, mut ctx) = fixture(Backend::Cycles);
        let mut tree = NodeTree::new("Wood", TreeUsage::Group);
        let mut cache = TextureCache::default();
        assert!(
            cache
                .output(&mut host, &mut ctx, &mut tree, SITE, TextureKind::Color, "nope.png")
                .is_err()
        );
    }
}
