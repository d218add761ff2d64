//! Skeleton and generation plan loading
//!
//! Skeletons and the per-bone generation setup are authored as JSON or YAML
//! documents. The format is chosen from the file extension; `.yaml` and
//! `.yml` are YAML, everything else is JSON.
//!
//! ```yaml
//! prefix: tailed_
//! bones:
//!   tail_1:
//!     method: TailAndCopyFromLoop
//!     copied_animation: tail_swish
//!     copied_bone: tail_1
//!     tail:
//!       mass: 4.0
//!   tail_2:
//!     method: Mirror
//!     copied_bone: tail_1
//! ```

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::animation::AnimationId;
use crate::error::{AnimError, Result};
use crate::generation::{
    BaseTarget, CopyFrom, GenerateFramesMethod, GenerationMethod, TailParams,
};
use crate::skeleton::{Skeleton, SkeletonDefinition};

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
}

/// Read a JSON or YAML document
pub fn load_document<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    if is_yaml(path) {
        serde_yaml_ng::from_reader(reader)
            .map_err(|e| AnimError::Config(format!("{}: {e}", path.display())))
    } else {
        serde_json::from_reader(reader)
            .map_err(|e| AnimError::Config(format!("{}: {e}", path.display())))
    }
}

/// Load a skeleton definition and check its bone tree
pub fn load_skeleton<P: AsRef<Path>>(path: P) -> Result<SkeletonDefinition> {
    let skeleton: SkeletonDefinition = load_document(path)?;
    skeleton.validate()?;
    debug!(
        "Loaded skeleton '{}' with {} bones",
        skeleton.name,
        skeleton.bone_count()
    );
    Ok(skeleton)
}

/// A bone given by index or by name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BoneRef {
    Index(usize),
    Name(String),
}

impl BoneRef {
    /// Index of the bone in `skeleton`
    pub fn resolve(&self, skeleton: &SkeletonDefinition) -> Result<usize> {
        match self {
            Self::Index(index) => {
                skeleton.bone(*index)?;
                Ok(*index)
            }
            Self::Name(name) => skeleton.find_bone(name).ok_or_else(|| {
                AnimError::Config(format!(
                    "skeleton '{}' has no bone '{name}'",
                    skeleton.name
                ))
            }),
        }
    }
}

/// Base rotation taken from a key of another animation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseConfig {
    pub animation: AnimationId,
    pub bone: BoneRef,
    #[serde(default)]
    pub frame: usize,
}

/// Configuration of one bone's generation method
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodConfig {
    pub method: GenerateFramesMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copied_animation: Option<AnimationId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copied_bone: Option<BoneRef>,
    #[serde(default)]
    pub time_offset: f32,
    #[serde(default)]
    pub add_from_base: bool,
    #[serde(default)]
    pub skip_this_zero_frame: bool,
    #[serde(default)]
    pub skip_source_zero_frame: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<BaseConfig>,
    /// Only read by the tail tags
    #[serde(default)]
    pub tail: TailParams,
}

impl MethodConfig {
    pub fn new(method: GenerateFramesMethod) -> Self {
        Self {
            method,
            copied_animation: None,
            copied_bone: None,
            time_offset: 0.0,
            add_from_base: false,
            skip_this_zero_frame: false,
            skip_source_zero_frame: false,
            base: None,
            tail: TailParams::default(),
        }
    }

    fn base_target(&self, skeleton: &SkeletonDefinition, bone: usize) -> Result<BaseTarget> {
        match &self.base {
            None => Ok(BaseTarget::rest(bone)),
            Some(base) => Ok(BaseTarget {
                animation: Some(base.animation.clone()),
                bone: base.bone.resolve(skeleton)?,
                frame: base.frame,
            }),
        }
    }

    fn configure_copy(&self, copy: &mut CopyFrom, skeleton: &SkeletonDefinition) -> Result<()> {
        copy.copied_animation.clone_from(&self.copied_animation);
        if let Some(bone) = &self.copied_bone {
            copy.copied_bone = bone.resolve(skeleton)?;
        }
        copy.time_offset = self.time_offset;
        copy.add_from_base = self.add_from_base;
        copy.skip_this_zero_frame = self.skip_this_zero_frame;
        copy.skip_source_zero_frame = self.skip_source_zero_frame;
        copy.base = self.base_target(skeleton, copy.owner.bone)?;
        Ok(())
    }

    /// Build the configured method for `bone`
    pub fn build(&self, bone: usize, skeleton: &Arc<SkeletonDefinition>) -> Result<GenerationMethod> {
        let mut method = GenerationMethod::from_tag(self.method, bone, skeleton.clone());
        let inner = match &mut method {
            GenerationMethod::Tail(tail) => {
                tail.params = self.tail;
                tail.base.as_mut()
            }
            other => other,
        };

        match inner {
            GenerationMethod::Static(pose) => pose.base = self.base_target(skeleton, bone)?,
            GenerationMethod::CopyFrom(copy) => {
                if self.copied_animation.is_none() {
                    return Err(AnimError::Config(format!(
                        "{} on bone {bone} needs copied_animation",
                        self.method
                    )));
                }
                self.configure_copy(copy, skeleton)?;
            }
            GenerationMethod::Mirror(copy) => self.configure_copy(copy, skeleton)?,
            GenerationMethod::Tail(_) => {}
        }
        Ok(method)
    }
}

/// Generation methods of the bones of a custom skeleton, keyed by bone name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationPlan {
    /// Prepended to the names of generated animations
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub bones: BTreeMap<String, MethodConfig>,
}

impl GenerationPlan {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        load_document(path)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml_ng::from_str(yaml).map_err(|e| AnimError::Config(e.to_string()))
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| AnimError::Config(e.to_string()))
    }

    /// Install the configured methods into the method table of `skeleton`
    ///
    /// Bones not named by the plan keep their current method.
    pub fn apply(&self, skeleton: &mut Skeleton) -> Result<()> {
        let definition = skeleton.definition.clone();
        for (name, config) in &self.bones {
            let bone = BoneRef::Name(name.clone()).resolve(&definition)?;
            let method = config.build(bone, &definition)?;
            debug!("Bone {bone} '{name}' uses {}", method.tag());
            skeleton.methods.set(bone, method)?;
        }
        Ok(())
    }
}
