use serde::Deserialize;

use crate::engine::CoreModel;
use crate::errors::Result;

const EPSILON: f32 = 0.001;
const DEFAULT_FADE_IN_TIME: f32 = 0.5;
const PHI: f32 = 0.5;
const BACK_OPACITY_THRESHOLD: f32 = 0.15;

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PoseJson {
    fade_in_time: Option<f32>,
    #[serde(default)]
    groups: Vec<Vec<PartJson>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PartJson {
    id: String,
    #[serde(default)]
    link: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PosePart {
    /// Part id; the part's visibility parameter shares the id.
    pub id: String,
    pub links: Vec<String>,
}

/// Mutually exclusive part groups from pose3.json.
///
/// In each group exactly one part is shown: the first whose parameter is set,
/// or the group's first part. The shown part fades in while the others fade
/// out, and linked parts mirror their owner's opacity.
#[derive(Debug, Clone)]
pub struct Pose {
    groups: Vec<Vec<PosePart>>,
    fade_in_time: f32,
    initialized: bool,
}

impl Pose {
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let json: PoseJson = serde_json::from_slice(bytes)?;
        let groups = json
            .groups
            .into_iter()
            .map(|group| {
                group
                    .into_iter()
                    .map(|p| PosePart {
                        id: p.id,
                        links: p.link,
                    })
                    .collect()
            })
            .collect();
        Ok(Self {
            groups,
            fade_in_time: json
                .fade_in_time
                .filter(|t| *t >= 0.0)
                .unwrap_or(DEFAULT_FADE_IN_TIME),
            initialized: false,
        })
    }

    #[must_use]
    pub fn groups(&self) -> &[Vec<PosePart>] {
        &self.groups
    }

    #[must_use]
    pub fn fade_in_time(&self) -> f32 {
        self.fade_in_time
    }

    /// Shows the first part of every group and hides the rest.
    pub fn reset(&mut self, model: &mut dyn CoreModel) {
        for group in &self.groups {
            for (i, part) in group.iter().enumerate() {
                let v = if i == 0 { 1.0 } else { 0.0 };
                model.set_part_opacity(&part.id, v);
                model.set_parameter_value(&part.id, v, 1.0);
                for link in &part.links {
                    model.set_part_opacity(link, v);
                }
            }
        }
        self.initialized = true;
    }

    pub fn update_parameters(&mut self, model: &mut dyn CoreModel, dt: f32) {
        if !self.initialized {
            self.reset(model);
        }
        let dt = dt.max(0.0);

        for group in &self.groups {
            self.fade_group(model, group, dt);
        }
        self.copy_part_opacities(model);
    }

    fn fade_group(&self, model: &mut dyn CoreModel, group: &[PosePart], dt: f32) {
        let mut visible: Option<usize> = None;
        let mut new_opacity = 1.0;

        for (i, part) in group.iter().enumerate() {
            if model.parameter_value(&part.id) > EPSILON {
                if visible.is_some() {
                    break;
                }
                visible = Some(i);
                new_opacity = if self.fade_in_time <= 0.0 {
                    1.0
                } else {
                    (model.part_opacity(&part.id) + dt / self.fade_in_time).min(1.0)
                };
            }
        }

        // No part selected: show the first one at full opacity.
        let visible = visible.unwrap_or(0);

        for (i, part) in group.iter().enumerate() {
            if i == visible {
                model.set_part_opacity(&part.id, new_opacity);
                continue;
            }

            let mut opacity = model.part_opacity(&part.id);
            let mut a1 = if new_opacity < PHI {
                new_opacity * (PHI - 1.0) / PHI + 1.0
            } else {
                (1.0 - new_opacity) * PHI / (1.0 - PHI)
            };
            let back_opacity = (1.0 - a1) * (1.0 - new_opacity);
            if back_opacity > BACK_OPACITY_THRESHOLD {
                a1 = 1.0 - BACK_OPACITY_THRESHOLD / (1.0 - new_opacity);
            }
            if opacity > a1 {
                opacity = a1;
            }
            model.set_part_opacity(&part.id, opacity);
        }
    }

    fn copy_part_opacities(&self, model: &mut dyn CoreModel) {
        for part in self.groups.iter().flatten() {
            if part.links.is_empty() {
                continue;
            }
            let opacity = model.part_opacity(&part.id);
            for link in &part.links {
                model.set_part_opacity(link, opacity);
            }
        }
    }
}
