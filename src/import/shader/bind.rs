use crate::color::srgb8_to_linear_rgba;
use crate::host::node_tree::SocketValue;
use crate::material_defs::{ParamValue, TextureKind};
use crate::schema::SocketType;

/// How a parameter value lands on an input socket.
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    Literal(SocketValue),
    Texture { kind: TextureKind, file: String },
}

/// Socket type a texture reference can drive.
pub fn texture_socket(kind: TextureKind) -> SocketType {
    match kind {
        TextureKind::Color => SocketType::Rgba,
        TextureKind::Alpha => SocketType::Value,
        TextureKind::Normal => SocketType::Vector,
    }
}

/// Check a parameter value against the socket type it targets.
pub fn bind_param(ty: SocketType, value: &ParamValue) -> Result<Binding, String> {
    match (ty, value) {
        (ty, ParamValue::Texture { kind, file }) if texture_socket(*kind) == ty => {
            Ok(Binding::Texture {
                kind: *kind,
                file: file.clone(),
            })
        }
        (SocketType::Rgba, ParamValue::Color(c)) => match c[..] {
            [r, g, b] => Ok(Binding::Literal(SocketValue::Rgba(srgb8_to_linear_rgba([r, g, b])))),
            _ => Err(format!("expected 3 color components, got {}", c.len())),
        },
        (SocketType::Value, ParamValue::Numbers(n)) => match n[..] {
            [v] => Ok(Binding::Literal(SocketValue::Value(v))),
            _ => Err(format!("expected 1 component, got {}", n.len())),
        },
        (SocketType::Vector, ParamValue::Numbers(n)) => match n[..] {
            [x, y, z] => Ok(Binding::Literal(SocketValue::Vector([x, y, z]))),
            _ => Err(format!("expected 3 components, got {}", n.len())),
        },
        (SocketType::Shader, _) => Err("shader inputs cannot take a value".to_string()),
        (ty, value) => Err(format!("{value:?} does not fit a {ty:?} input")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material_defs::parse_param_value;

    fn bind(ty: SocketType, raw: &str) -> Result<Binding, String> {
        bind_param(ty, &parse_param_value(raw))
    }

    #[test]
    fn color_literal_is_decoded_to_linear() {
        let Ok(Binding::Literal(SocketValue::Rgba([r, g, b, a]))) = bind(SocketType::Rgba, "Color(255,0,128)")
        else {
            panic!("expected an rgba literal");
        };
        assert!((r - 1.0).abs() < 1e-6);
        assert_eq!(g, 0.0);
        assert!((b - 0.2158605).abs() < 1e-4);
        assert_eq!(a, 1.0);
    }

    #[test]
    fn textures_bind_only_to_their_socket_type() {
        assert_eq!(
            bind(SocketType::Rgba, "TextureColor(wood.png)"),
            Ok(Binding::Texture {
                kind: TextureKind::Color,
                file: "wood.png".to_string()
            })
        );
        assert!(bind(SocketType::Value, "TextureColor(wood.png)").is_err());
        assert!(matches!(
            bind(SocketType::Vector, "TextureNormal(n.png)"),
            Ok(Binding::Texture {
                kind: TextureKind::Normal,
                ..
            })
        ));
    }

    #[test]
    fn component_counts_are_checked() {
        assert_eq!(
            bind(SocketType::Value, "0.25"),
            Ok(Binding::Literal(SocketValue::Value(0.25)))
        );
        assert!(bind(SocketType::Value, "0.25 0.5").is_err());
        assert_eq!(
            bind(SocketType::Vector, "(0, -1, 0.5)"),
            Ok(Binding::Literal(SocketValue::Vector([0.0, -1.0, 0.5])))
        );
        assert!(bind(SocketType::Vector, "1 2").is_err());
        assert!(bind(SocketType::Rgba, "Color(1,2)").is_err());
        assert!(bind(SocketType::Rgba, "0.5").is_err());
    }

    #[test]
    fn shader_sockets_reject_everything() {
        assert!(bind(SocketType::Shader, "1").is_err());
    }
}
