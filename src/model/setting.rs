use std::collections::BTreeMap;

use serde::Deserialize;

use crate::errors::Result;

const GROUP_EYE_BLINK: &str = "EyeBlink";
const GROUP_LIP_SYNC: &str = "LipSync";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MotionRef {
    pub file: String,
    #[serde(default)]
    pub sound: Option<String>,
    pub fade_in_time: Option<f32>,
    pub fade_out_time: Option<f32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExpressionRef {
    pub name: String,
    pub file: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HitAreaRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ParameterGroup {
    #[serde(default)]
    name: String,
    #[serde(default)]
    ids: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct FileReferences {
    moc: String,
    textures: Vec<String>,
    physics: String,
    pose: String,
    user_data: String,
    expressions: Vec<ExpressionRef>,
    motions: BTreeMap<String, Vec<MotionRef>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct ModelSettingJson {
    file_references: FileReferences,
    groups: Vec<ParameterGroup>,
    hit_areas: Vec<HitAreaRef>,
    layout: BTreeMap<String, f32>,
}

/// Parsed `<model>.model3.json` manifest.
///
/// Lookups that fall outside the declared lists return empty names, zero
/// counts or `-1.0` fade times, so callers treat them as absent.
#[derive(Debug, Clone, Default)]
pub struct ModelSetting {
    json: ModelSettingJson,
}

impl ModelSetting {
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let json: ModelSettingJson = serde_json::from_slice(bytes)?;
        Ok(Self { json })
    }

    #[must_use]
    pub fn model_file_name(&self) -> &str {
        &self.json.file_references.moc
    }

    // ------------------------------------------------------------------
    // Textures
    // ------------------------------------------------------------------

    #[must_use]
    pub fn texture_count(&self) -> usize {
        self.json.file_references.textures.len()
    }

    #[must_use]
    pub fn texture_file_name(&self, index: usize) -> &str {
        self.json
            .file_references
            .textures
            .get(index)
            .map_or("", String::as_str)
    }

    // ------------------------------------------------------------------
    // Optional assets
    // ------------------------------------------------------------------

    #[must_use]
    pub fn expression_count(&self) -> usize {
        self.json.file_references.expressions.len()
    }

    #[must_use]
    pub fn expression_name(&self, index: usize) -> &str {
        self.json
            .file_references
            .expressions
            .get(index)
            .map_or("", |e| e.name.as_str())
    }

    #[must_use]
    pub fn expression_file_name(&self, index: usize) -> &str {
        self.json
            .file_references
            .expressions
            .get(index)
            .map_or("", |e| e.file.as_str())
    }

    #[must_use]
    pub fn physics_file_name(&self) -> &str {
        &self.json.file_references.physics
    }

    #[must_use]
    pub fn pose_file_name(&self) -> &str {
        &self.json.file_references.pose
    }

    #[must_use]
    pub fn user_data_file(&self) -> &str {
        &self.json.file_references.user_data
    }

    // ------------------------------------------------------------------
    // Motions
    // ------------------------------------------------------------------

    pub fn motion_group_names(&self) -> impl Iterator<Item = &str> {
        self.json.file_references.motions.keys().map(String::as_str)
    }

    #[must_use]
    pub fn motion_group_count(&self) -> usize {
        self.json.file_references.motions.len()
    }

    #[must_use]
    pub fn motion_count(&self, group: &str) -> usize {
        self.json
            .file_references
            .motions
            .get(group)
            .map_or(0, Vec::len)
    }

    /// Sum of clips over all groups.
    #[must_use]
    pub fn total_motion_count(&self) -> usize {
        self.json.file_references.motions.values().map(Vec::len).sum()
    }

    fn motion(&self, group: &str, index: usize) -> Option<&MotionRef> {
        self.json.file_references.motions.get(group)?.get(index)
    }

    #[must_use]
    pub fn motion_file_name(&self, group: &str, index: usize) -> &str {
        self.motion(group, index).map_or("", |m| m.file.as_str())
    }

    #[must_use]
    pub fn motion_sound_file_name(&self, group: &str, index: usize) -> &str {
        self.motion(group, index)
            .and_then(|m| m.sound.as_deref())
            .unwrap_or("")
    }

    #[must_use]
    pub fn motion_fade_in_time(&self, group: &str, index: usize) -> f32 {
        self.motion(group, index)
            .and_then(|m| m.fade_in_time)
            .unwrap_or(-1.0)
    }

    #[must_use]
    pub fn motion_fade_out_time(&self, group: &str, index: usize) -> f32 {
        self.motion(group, index)
            .and_then(|m| m.fade_out_time)
            .unwrap_or(-1.0)
    }

    // ------------------------------------------------------------------
    // Hit areas, effect parameters, layout
    // ------------------------------------------------------------------

    #[must_use]
    pub fn hit_areas_count(&self) -> usize {
        self.json.hit_areas.len()
    }

    #[must_use]
    pub fn hit_area_name(&self, index: usize) -> &str {
        self.json.hit_areas.get(index).map_or("", |h| h.name.as_str())
    }

    #[must_use]
    pub fn hit_area_id(&self, index: usize) -> &str {
        self.json.hit_areas.get(index).map_or("", |h| h.id.as_str())
    }

    /// Drawable id of the hit area called `name`.
    #[must_use]
    pub fn hit_area_id_by_name(&self, name: &str) -> Option<&str> {
        self.json
            .hit_areas
            .iter()
            .find(|h| h.name == name)
            .map(|h| h.id.as_str())
    }

    fn group_ids(&self, name: &str) -> Vec<String> {
        self.json
            .groups
            .iter()
            .filter(|g| g.name == name)
            .flat_map(|g| g.ids.iter().cloned())
            .collect()
    }

    #[must_use]
    pub fn eye_blink_parameter_ids(&self) -> Vec<String> {
        self.group_ids(GROUP_EYE_BLINK)
    }

    #[must_use]
    pub fn lip_sync_parameter_ids(&self) -> Vec<String> {
        self.group_ids(GROUP_LIP_SYNC)
    }

    /// Layout entries with keys normalized to snake case
    /// (`CenterX` becomes `center_x`).
    #[must_use]
    pub fn layout(&self) -> Vec<(String, f32)> {
        self.json
            .layout
            .iter()
            .map(|(k, v)| (snake_case(k), *v))
            .collect()
    }
}

fn snake_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 2);
    for (i, c) in key.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 && !out.ends_with('_') {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserDataEntry {
    pub target: String,
    pub id: String,
    pub value: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct UserDataJson {
    #[serde(default)]
    user_data: Vec<UserDataEntry>,
}

/// Parsed userdata3.json: free-form strings attached to art meshes.
#[derive(Debug, Clone, Default)]
pub struct UserData {
    entries: Vec<UserDataEntry>,
}

impl UserData {
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let json: UserDataJson = serde_json::from_slice(bytes)?;
        Ok(Self {
            entries: json.user_data,
        })
    }

    #[must_use]
    pub fn entries(&self) -> &[UserDataEntry] {
        &self.entries
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.value.as_str())
    }

    pub fn for_target<'a>(&'a self, target: &'a str) -> impl Iterator<Item = &'a UserDataEntry> {
        self.entries.iter().filter(move |e| e.target == target)
    }
}
