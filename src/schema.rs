//! Shader node vocabulary: node kinds and their typed sockets.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SocketType {
    Rgba,
    Value,
    Vector,
    Shader,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SocketDecl {
    pub name: &'static str,
    pub ty: SocketType,
}

const fn rgba(name: &'static str) -> SocketDecl {
    SocketDecl {
        name,
        ty: SocketType::Rgba,
    }
}

const fn value(name: &'static str) -> SocketDecl {
    SocketDecl {
        name,
        ty: SocketType::Value,
    }
}

const fn vector(name: &'static str) -> SocketDecl {
    SocketDecl {
        name,
        ty: SocketType::Vector,
    }
}

const fn shader(name: &'static str) -> SocketDecl {
    SocketDecl {
        name,
        ty: SocketType::Shader,
    }
}

macro_rules! sockets {
    ($($decl:expr),* $(,)?) => {
        const { &[$($decl),*] }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NodeKind {
    GroupInput,
    GroupOutput,
    /// Instance of another node tree; sockets mirror that tree's interface.
    Group,
    BsdfDiffuse,
    BsdfGlossy,
    BsdfTransparent,
    BsdfVelvet,
    BsdfToon,
    MixShader,
    AddShader,
    Emission,
    AmbientOcclusion,
    LayerWeight,
    LightPath,
    Fresnel,
    Math,
    MixRgb,
    SeparateHsv,
    CombineHsv,
    VectorMath,
    TexImage,
    UvMap,
    Mapping,
    NormalMap,
    NewGeometry,
    MaterialOutput,
    /// Legacy internal renderer nodes.
    Material,
    Geometry,
    Texture,
    Output,
}

impl NodeKind {
    /// True for kinds whose sockets come from a tree interface.
    pub fn has_dynamic_sockets(self) -> bool {
        matches!(self, NodeKind::GroupInput | NodeKind::GroupOutput | NodeKind::Group)
    }

    /// Name the host gives a freshly created node of this kind.
    pub fn default_name(self) -> &'static str {
        match self {
            NodeKind::GroupInput => "Group Input",
            NodeKind::GroupOutput => "Group Output",
            NodeKind::Group => "Group",
            NodeKind::BsdfDiffuse => "Diffuse BSDF",
            NodeKind::BsdfGlossy => "Glossy BSDF",
            NodeKind::BsdfTransparent => "Transparent BSDF",
            NodeKind::BsdfVelvet => "Velvet BSDF",
            NodeKind::BsdfToon => "Toon BSDF",
            NodeKind::MixShader => "Mix Shader",
            NodeKind::AddShader => "Add Shader",
            NodeKind::Emission => "Emission",
            NodeKind::AmbientOcclusion => "Ambient Occlusion",
            NodeKind::LayerWeight => "Layer Weight",
            NodeKind::LightPath => "Light Path",
            NodeKind::Fresnel => "Fresnel",
            NodeKind::Math => "Math",
            NodeKind::MixRgb => "Mix",
            NodeKind::SeparateHsv => "Separate HSV",
            NodeKind::CombineHsv => "Combine HSV",
            NodeKind::VectorMath => "Vector Math",
            NodeKind::TexImage => "Image Texture",
            NodeKind::UvMap => "UV Map",
            NodeKind::Mapping => "Mapping",
            NodeKind::NormalMap => "Normal Map",
            NodeKind::NewGeometry => "Geometry",
            NodeKind::MaterialOutput => "Material Output",
            NodeKind::Material => "Material",
            NodeKind::Geometry => "Geometry",
            NodeKind::Texture => "Texture",
            NodeKind::Output => "Output",
        }
    }

    pub fn inputs(self) -> &'static [SocketDecl] {
        const BSDF: &[SocketDecl] = &[rgba("Color"), value("Roughness"), vector("Normal")];
        match self {
            NodeKind::GroupInput | NodeKind::GroupOutput | NodeKind::Group => &[],
            NodeKind::BsdfDiffuse | NodeKind::BsdfGlossy => BSDF,
            NodeKind::BsdfTransparent => sockets![rgba("Color")],
            NodeKind::BsdfVelvet => sockets![rgba("Color"), value("Sigma"), vector("Normal")],
            NodeKind::BsdfToon => sockets![
                rgba("Color"),
                value("Size"),
                value("Smooth"),
                vector("Normal"),
            ],
            NodeKind::MixShader => sockets![value("Fac"), shader("Shader"), shader("Shader")],
            NodeKind::AddShader => sockets![shader("Shader"), shader("Shader")],
            NodeKind::Emission => sockets![rgba("Color"), value("Strength")],
            NodeKind::AmbientOcclusion => sockets![rgba("Color")],
            NodeKind::LayerWeight => sockets![value("Blend"), vector("Normal")],
            NodeKind::LightPath => &[],
            NodeKind::Fresnel => sockets![value("IOR"), vector("Normal")],
            NodeKind::Math => sockets![value("Value"), value("Value")],
            NodeKind::MixRgb => sockets![value("Fac"), rgba("Color1"), rgba("Color2")],
            NodeKind::SeparateHsv => sockets![rgba("Color")],
            NodeKind::CombineHsv => sockets![value("H"), value("S"), value("V")],
            NodeKind::VectorMath => sockets![vector("Vector"), vector("Vector")],
            NodeKind::TexImage => sockets![vector("Vector")],
            NodeKind::UvMap => &[],
            NodeKind::Mapping => sockets![vector("Vector")],
            NodeKind::NormalMap => sockets![value("Strength"), rgba("Color")],
            NodeKind::NewGeometry => &[],
            NodeKind::MaterialOutput => sockets![
                shader("Surface"),
                shader("Volume"),
                value("Displacement"),
            ],
            NodeKind::Material => sockets![
                rgba("Color"),
                rgba("Spec"),
                value("Refl"),
                vector("Normal"),
            ],
            NodeKind::Geometry => &[],
            NodeKind::Texture => sockets![vector("Vector")],
            NodeKind::Output => sockets![rgba("Color"), value("Alpha")],
        }
    }

    pub fn outputs(self) -> &'static [SocketDecl] {
        match self {
            NodeKind::GroupInput | NodeKind::GroupOutput | NodeKind::Group => &[],
            NodeKind::BsdfDiffuse
            | NodeKind::BsdfGlossy
            | NodeKind::BsdfTransparent
            | NodeKind::BsdfVelvet
            | NodeKind::BsdfToon => sockets![shader("BSDF")],
            NodeKind::MixShader | NodeKind::AddShader => sockets![shader("Shader")],
            NodeKind::Emission => sockets![shader("Emission")],
            NodeKind::AmbientOcclusion => sockets![shader("AO")],
            NodeKind::LayerWeight => sockets![value("Fresnel"), value("Facing")],
            NodeKind::LightPath => sockets![
                value("Is Camera Ray"),
                value("Is Shadow Ray"),
                value("Is Diffuse Ray"),
                value("Is Glossy Ray"),
                value("Is Singular Ray"),
                value("Is Reflection Ray"),
                value("Is Transmission Ray"),
                value("Ray Length"),
                value("Ray Depth"),
                value("Transparent Depth"),
            ],
            NodeKind::Fresnel => sockets![value("Fac")],
            NodeKind::Math => sockets![value("Value")],
            NodeKind::MixRgb | NodeKind::CombineHsv => sockets![rgba("Color")],
            NodeKind::SeparateHsv => sockets![value("H"), value("S"), value("V")],
            NodeKind::VectorMath => sockets![vector("Vector"), value("Value")],
            NodeKind::TexImage => sockets![rgba("Color"), value("Alpha")],
            NodeKind::UvMap => sockets![vector("UV")],
            NodeKind::Mapping => sockets![vector("Vector")],
            NodeKind::NormalMap => sockets![vector("Normal")],
            NodeKind::NewGeometry => sockets![
                vector("Position"),
                vector("Normal"),
                vector("Tangent"),
                vector("True Normal"),
                vector("Incoming"),
                vector("Parametric"),
                value("Backfacing"),
                value("Pointiness"),
            ],
            NodeKind::MaterialOutput | NodeKind::Output => &[],
            NodeKind::Material => sockets![rgba("Color"), value("Alpha"), vector("Normal")],
            NodeKind::Geometry => sockets![
                vector("Global"),
                vector("Local"),
                vector("View"),
                vector("Orco"),
                vector("UV"),
                vector("Normal"),
                rgba("Vertex Color"),
                value("Vertex Alpha"),
                value("Front/Back"),
            ],
            NodeKind::Texture => sockets![value("Value"), rgba("Color"), vector("Normal")],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facing_outputs_sit_where_the_wiring_expects_them() {
        assert_eq!(NodeKind::NewGeometry.outputs()[6].name, "Backfacing");
        assert_eq!(NodeKind::Geometry.outputs()[4].name, "UV");
        assert_eq!(NodeKind::Geometry.outputs()[5].name, "Normal");
        assert_eq!(NodeKind::Geometry.outputs()[8].name, "Front/Back");
        assert_eq!(NodeKind::Texture.outputs()[1].ty, SocketType::Rgba);
    }

    #[test]
    fn group_kinds_have_no_static_sockets() {
        for kind in [NodeKind::Group, NodeKind::GroupInput, NodeKind::GroupOutput] {
            assert!(kind.has_dynamic_sockets());
            assert!(kind.inputs().is_empty());
            assert!(kind.outputs().is_empty());
        }
        assert!(!NodeKind::MixShader.has_dynamic_sockets());
    }
}
