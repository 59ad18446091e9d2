//! 服装选项目录
//!
//! 一个性别的全部下拉选项与预设, 按 (数据目录, 性别) 缓存。

use std::{
    collections::{BTreeMap, HashMap},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use lazy_static::lazy_static;
use serde_json::{Map, Value};

use crate::{
    error::Error,
    utils::data_loader::{
        discover_body_parts, load_body_types, load_description_styles, load_global_options,
        load_outfit_data, load_presets, load_scale_options, load_scene_highlights,
        SceneHighlights,
    },
};

lazy_static! {
    static ref CATALOG_CACHE: Mutex<HashMap<(PathBuf, String), Arc<OutfitCatalog>>> =
        Mutex::new(HashMap::new());
}

#[derive(Debug, Clone, Default)]
pub struct OutfitCatalog {
    pub gender: String,
    /// 身体部位, 已排序
    pub body_parts: Vec<String>,
    /// 身体部位 -> 服装选项
    pub outfit: BTreeMap<String, Vec<String>>,
    pub body_types: Vec<String>,
    pub poses: Vec<String>,
    pub backgrounds: Vec<String>,
    pub races: Vec<String>,
    pub age_groups: Vec<String>,
    pub scene: SceneHighlights,
    pub description_styles: Vec<String>,
    pub scales: Vec<String>,
    /// 预设名称 -> 字段
    pub presets: BTreeMap<String, Map<String, Value>>,
}

impl OutfitCatalog {
    /// 从数据目录加载
    pub fn load(data_dir: &Path, gender: &str) -> Self {
        let gender_dir = data_dir.join("outfit").join(gender);
        let styles_dir = data_dir.join("styles");
        let body_parts = discover_body_parts(&gender_dir);
        let outfit = load_outfit_data(&gender_dir, &body_parts);
        let presets = load_presets(data_dir).remove(gender).unwrap_or_default();

        log::debug!(
            "outfit catalog loaded, gender: {gender}, body parts: {}, presets: {}",
            body_parts.len(),
            presets.len()
        );

        Self {
            gender: gender.to_string(),
            body_parts,
            outfit,
            body_types: load_body_types(&gender_dir),
            poses: load_global_options(&gender_dir, "poses.json", "poses"),
            backgrounds: load_global_options(data_dir, "backgrounds.json", "backgrounds"),
            races: load_global_options(data_dir, "race.json", "races"),
            age_groups: load_global_options(data_dir, "age_groups.json", "age_groups"),
            scene: load_scene_highlights(&styles_dir),
            description_styles: load_description_styles(&styles_dir),
            scales: load_scale_options(&styles_dir),
            presets,
        }
    }

    /// 获取缓存的目录, 首次访问时加载
    pub fn cached(data_dir: &Path, gender: &str) -> Result<Arc<Self>, Error> {
        let mut cache = CATALOG_CACHE
            .lock()
            .map_err(|e| Error::LockError(e.to_string()))?;
        let catalog = cache
            .entry((data_dir.to_path_buf(), gender.to_string()))
            .or_insert_with(|| Arc::new(Self::load(data_dir, gender)));
        Ok(catalog.clone())
    }

    /// 字段 -> 选项, 用于解析 "random"
    pub fn options(&self) -> BTreeMap<String, Vec<String>> {
        let mut options = self.outfit.clone();
        let fields = [
            ("body_type", &self.body_types),
            ("pose", &self.poses),
            ("background", &self.backgrounds),
            ("race", &self.races),
            ("age_group", &self.age_groups),
            ("mood", &self.scene.moods),
            ("time_of_day", &self.scene.times),
            ("weather", &self.scene.weather),
            ("color_scheme", &self.scene.color_schemes),
            ("description_style", &self.description_styles),
            ("creative_scale", &self.scales),
        ];
        for (field, values) in fields {
            options.insert(field.to_string(), values.clone());
        }
        options
    }

    /// 预设下拉选项: "none", "random" 以及预设名称
    pub fn preset_names(&self) -> Vec<String> {
        let mut names = vec!["none".to_string(), "random".to_string()];
        names.extend(self.presets.keys().cloned());
        names
    }
}
