//! Line-oriented material definition files.
//!
//! One definition per line: `;`-separated `key=value` clauses. Line 0 is the
//! default sink; material id `n` lives on line `n + 1`.

use std::path::Path;

use anyhow::{Context, Result};

use crate::error::ImportError;

/// Keys that describe the definition itself rather than a shader input.
pub const RESERVED_KEYS: [&str; 4] = ["Type", "Name", "ID", "UVScale"];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialDefinition {
    params: Vec<(String, String)>,
}

impl MaterialDefinition {
    /// Later duplicates overwrite the earlier value in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.params.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = value,
            None => self.params.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Parameters that target shader inputs, in file order.
    pub fn shader_params(&self) -> impl Iterator<Item = (&str, &str)> {
        self.iter().filter(|(k, _)| !RESERVED_KEYS.contains(k))
    }

    pub fn name(&self) -> Option<&str> {
        self.get("Name")
    }

    pub fn shader_type(&self) -> Option<&str> {
        self.get("Type")
    }

    /// `UVScale=(s,t)`. `None` when absent, `Err` when it does not hold two numbers.
    pub fn uv_scale(&self) -> Option<std::result::Result<[f32; 2], String>> {
        let raw = self.get("UVScale")?;
        let numbers = scan_numbers(raw);
        Some(match numbers.as_slice() {
            [s, t] => Ok([*s, *t]),
            _ => Err(format!(
                "UVScale expects 2 components, got {} in '{raw}'",
                numbers.len()
            )),
        })
    }
}

pub fn parse_definition_line(line: &str) -> MaterialDefinition {
    let mut def = MaterialDefinition::default();
    for clause in line.trim().split(';') {
        let mut parts = clause.split('=');
        let (Some(key), Some(value), None) = (parts.next(), parts.next(), parts.next()) else {
            continue;
        };
        def.insert(key.trim(), value.trim());
    }
    def
}

/// All definitions of one file, indexed by line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialTable {
    pub definitions: Vec<MaterialDefinition>,
}

impl MaterialTable {
    pub fn parse(text: &str) -> Self {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        Self {
            definitions: text.lines().map(parse_definition_line).collect(),
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read material definitions {}", path.display()))?;
        Ok(Self::parse(&text))
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Definition for a material id (`-1` resolves to the default sink on line 0).
    pub fn resolve(&self, material_id: i32) -> Result<(usize, &MaterialDefinition)> {
        let missing = || ImportError::MissingMaterialDefinition {
            id: material_id,
            len: self.definitions.len(),
        };
        let index = material_id
            .checked_add(1)
            .and_then(|i| usize::try_from(i).ok())
            .ok_or_else(missing)?;
        let def = self.definitions.get(index).ok_or_else(missing)?;
        Ok((index, def))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureKind {
    Color,
    Alpha,
    Normal,
}

/// A raw parameter value, before it is checked against a socket type.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// `Color(r,g,b)` with 0-255 components.
    Color(Vec<f32>),
    Texture { kind: TextureKind, file: String },
    Numbers(Vec<f32>),
}

const TEXTURE_PREFIXES: [(&str, TextureKind); 3] = [
    ("TextureColor(", TextureKind::Color),
    ("TextureAlpha(", TextureKind::Alpha),
    ("TextureNormal(", TextureKind::Normal),
];

pub fn parse_param_value(raw: &str) -> ParamValue {
    for (prefix, kind) in TEXTURE_PREFIXES {
        if let Some(start) = raw.find(prefix) {
            let inner = &raw[start + prefix.len()..];
            let file = match inner.rfind(')') {
                Some(end) => &inner[..end],
                None => inner,
            };
            return ParamValue::Texture {
                kind,
                file: file.trim().to_string(),
            };
        }
    }
    if let Some(start) = raw.find("Color(") {
        return ParamValue::Color(scan_numbers(&raw[start + "Color(".len()..]));
    }
    ParamValue::Numbers(scan_numbers(raw))
}

/// Every decimal literal in `s`, with optional sign and fraction.
pub fn scan_numbers(s: &str) -> Vec<f32> {
    let bytes = s.as_bytes();
    let mut out = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let start = i;
        if matches!(bytes[i], b'-' | b'+') {
            i += 1;
        }
        let digits_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        let int_digits = i - digits_start;
        let mut frac_digits = 0;
        if i < bytes.len() && bytes[i] == b'.' {
            let frac_start = i + 1;
            let mut j = frac_start;
            while j < bytes.len() && bytes[j].is_ascii_digit() {
                j += 1;
            }
            frac_digits = j - frac_start;
            if frac_digits > 0 {
                i = j;
            }
        }
        if int_digits + frac_digits == 0 {
            i = start + 1;
            continue;
        }
        if let Ok(v) = s[start..i].parse::<f32>() {
            out.push(v);
        }
    }
    out
}
