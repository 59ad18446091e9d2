//! 服装提示词生成
//!
//! 处理顺序: 种子模式 -> inputs_json 覆盖 -> 预设 -> 构建提示词

use std::{
    collections::{HashMap, VecDeque},
    sync::Mutex,
};

use lazy_static::lazy_static;
use log::{debug, warn};
use serde_json::{json, Map, Value};

use super::catalog::OutfitCatalog;
use crate::{
    error::Error,
    prompt::{
        preset::{apply_preset, pick_preset, strip_preset_colors},
        PromptBuilder,
    },
    utils::{
        options::{OPTION_NONE, OPTION_RANDOM},
        seed::SeedMode,
    },
};

/// inputs_json 之外还可以覆盖的文本字段
const TEXT_FIELDS: [&str; 5] = [
    "character_name",
    "custom_attributes",
    "avoid_terms",
    "makeup_data",
    "preset",
];

/// 不参与缓存键的输入
const VOLATILE_FIELDS: [&str; 2] = ["_last_seed", "enable_cache"];

/// 缓存的最大条目数
const OUTPUT_CACHE_CAPACITY: usize = 128;

lazy_static! {
    static ref OUTPUT_CACHE: Mutex<OutputCache> = Mutex::new(OutputCache::new(OUTPUT_CACHE_CAPACITY));
}

/// 有容量上限的输出缓存, 超出时淘汰最早写入的条目
#[derive(Debug)]
struct OutputCache {
    capacity: usize,
    entries: HashMap<String, OutfitOutput>,
    order: VecDeque<String>,
}

impl OutputCache {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    fn get(&self, key: &str) -> Option<&OutfitOutput> {
        self.entries.get(key)
    }

    fn insert(&mut self, key: String, output: OutfitOutput) {
        if self.entries.insert(key.clone(), output).is_some() {
            return;
        }
        self.order.push_back(key);
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// 节点输出
#[derive(Debug, Clone, PartialEq)]
pub struct OutfitOutput {
    pub positive: String,
    pub seed: u64,
    pub negative: String,
    pub metadata: String,
}

impl OutfitOutput {
    pub fn into_tuple(self) -> (String, u64, String, String) {
        (self.positive, self.seed, self.negative, self.metadata)
    }
}

pub struct OutfitGenerator<'a> {
    catalog: &'a OutfitCatalog,
}

impl<'a> OutfitGenerator<'a> {
    pub fn new(catalog: &'a OutfitCatalog) -> Self {
        Self { catalog }
    }

    /// 生成提示词, enable_cache 开启时相同输入直接返回缓存结果
    ///
    /// random 种子模式每次的种子都不同, 不使用缓存
    pub fn generate(&self, mut inputs: Map<String, Value>) -> Result<OutfitOutput, Error> {
        let seed_mode = SeedMode::parse_or_fixed(&text(&inputs, "seed_mode"));
        let image_seed = seed_mode.resolve(number(&inputs, "seed"), number(&inputs, "_last_seed"));

        let enable_cache = boolean(&inputs, "enable_cache", true) && seed_mode != SeedMode::Random;
        let cache_key = if enable_cache {
            Some(self.cache_key(&inputs, seed_mode, image_seed)?)
        } else {
            None
        };
        if let Some(key) = &cache_key {
            let cache = OUTPUT_CACHE
                .lock()
                .map_err(|e| Error::LockError(e.to_string()))?;
            if let Some(output) = cache.get(key) {
                debug!("outfit cache hit, gender: {}", self.catalog.gender);
                return Ok(output.clone());
            }
        }

        self.apply_inputs_json(&mut inputs);

        let style_seed = number(&inputs, "style_seed");
        let builder_seed = if style_seed == 0 { image_seed } else { style_seed };
        let preset_name = self.apply_preset(&mut inputs, builder_seed)?;

        let mut builder = PromptBuilder::new(builder_seed, inputs, self.catalog.options());
        let positive = builder.build(&self.catalog.body_parts);
        let negative = builder.negative_prompt();

        let mut metadata = builder.metadata();
        if let Value::Object(obj) = &mut metadata {
            obj.insert("gender".to_string(), json!(self.catalog.gender));
            obj.insert("preset".to_string(), json!(preset_name));
            obj.insert("image_seed".to_string(), json!(image_seed));
            obj.insert("style_seed".to_string(), json!(builder_seed));
        }

        let output = OutfitOutput {
            positive,
            seed: image_seed,
            negative,
            metadata: serde_json::to_string(&metadata)?,
        };

        if let Some(key) = cache_key {
            let mut cache = OUTPUT_CACHE
                .lock()
                .map_err(|e| Error::LockError(e.to_string()))?;
            cache.insert(key, output.clone());
            debug!("outfit cache size: {}", cache.len());
        }
        Ok(output)
    }

    /// 性别 + 规范化的输入 + 种子模式 + 本次种子
    fn cache_key(
        &self,
        inputs: &Map<String, Value>,
        seed_mode: SeedMode,
        image_seed: u64,
    ) -> Result<String, Error> {
        // serde_json 的 Map 按键排序, 序列化结果是稳定的
        let mut canonical = inputs.clone();
        for field in VOLATILE_FIELDS {
            canonical.remove(field);
        }
        Ok(format!(
            "{}|{}|{seed_mode}|{image_seed}",
            self.catalog.gender,
            serde_json::to_string(&canonical)?
        ))
    }

    /// 使用 inputs_json 覆盖输入, 解析失败时忽略
    fn apply_inputs_json(&self, inputs: &mut Map<String, Value>) {
        let raw = text(inputs, "inputs_json");
        if raw.is_empty() {
            return;
        }

        let overrides = match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(overrides)) => overrides,
            Ok(_) => {
                warn!("inputs_json must be a json object, ignored");
                return;
            }
            Err(e) => {
                warn!("error parsing inputs_json, {e}");
                return;
            }
        };

        let options = self.catalog.options();
        for (key, value) in overrides {
            if options.contains_key(&key) || TEXT_FIELDS.contains(&key.as_str()) {
                inputs.insert(key, value);
            } else {
                debug!("inputs_json key {key} is not an input, skipped");
            }
        }
    }

    /// 应用预设, 返回使用的预设名称
    fn apply_preset(&self, inputs: &mut Map<String, Value>, seed: u64) -> Result<String, Error> {
        let requested = text(inputs, "preset");
        let name = match requested.as_str() {
            "" | OPTION_NONE => return Ok(OPTION_NONE.to_string()),
            OPTION_RANDOM => match pick_preset(&self.catalog.presets, seed) {
                Some(name) => name,
                None => return Ok(OPTION_NONE.to_string()),
            },
            name => name.to_string(),
        };

        let Some(preset) = self.catalog.presets.get(&name) else {
            warn!("preset {name} not found for {}", self.catalog.gender);
            return Ok(OPTION_NONE.to_string());
        };

        let preset = if boolean(inputs, "preset_colors", true) {
            preset.clone()
        } else {
            strip_preset_colors(preset, &self.catalog.body_parts)?
        };
        let lock = boolean(inputs, "lock_preset_fields", false);
        apply_preset(inputs, &preset, lock);
        Ok(name)
    }
}

fn text(inputs: &Map<String, Value>, key: &str) -> String {
    inputs
        .get(key)
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

fn number(inputs: &Map<String, Value>, key: &str) -> u64 {
    match inputs.get(key) {
        Some(Value::Number(n)) => n.as_u64().unwrap_or_default(),
        Some(Value::String(s)) => s.trim().parse().unwrap_or_default(),
        _ => 0,
    }
}

fn boolean(inputs: &Map<String, Value>, key: &str, default: bool) -> bool {
    inputs.get(key).and_then(Value::as_bool).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn catalog(gender: &str) -> OutfitCatalog {
        OutfitCatalog::load(&PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data"), gender)
    }

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    fn metadata(output: &OutfitOutput) -> anyhow::Result<Value> {
        Ok(serde_json::from_str(&output.metadata)?)
    }

    #[test]
    fn test_fixed_seed_is_reproducible() -> anyhow::Result<()> {
        let catalog = catalog("female");
        let generator = OutfitGenerator::new(&catalog);
        let inputs = map(json!({
            "seed": 1234,
            "seed_mode": "fixed",
            "torso": "random",
            "legs": "random",
            "background": "random",
        }));

        let first = generator.generate(inputs.clone())?;
        let second = generator.generate(inputs)?;
        assert_eq!(first, second);
        assert_eq!(first.seed, 1234);
        assert!(first.positive.contains("Attire: "));
        assert!(!first.positive.contains("random"));
        Ok(())
    }

    #[test]
    fn test_increment_seed() -> anyhow::Result<()> {
        let catalog = catalog("male");
        let generator = OutfitGenerator::new(&catalog);
        let output = generator.generate(map(json!({
            "seed": 5,
            "seed_mode": "increment",
            "_last_seed": 41,
        })))?;
        assert_eq!(output.seed, 42);
        assert_eq!(metadata(&output)?["image_seed"], json!(42));
        Ok(())
    }

    #[test]
    fn test_named_preset_fills_controls() -> anyhow::Result<()> {
        let catalog = catalog("female");
        let generator = OutfitGenerator::new(&catalog);
        let output = generator.generate(map(json!({
            "seed_mode": "fixed",
            "preset": "Casual",
            "torso": "random",
            "legs": "none",
            "background": "Urban rooftop",
        })))?;

        assert!(output.positive.contains("torso: t-shirt"));
        assert!(output.positive.contains("legs: jeans"));
        assert!(output.positive.contains("Background: Urban rooftop"));
        assert_eq!(metadata(&output)?["preset"], json!("Casual"));
        Ok(())
    }

    #[test]
    fn test_locked_preset_without_colors() -> anyhow::Result<()> {
        let catalog = catalog("female");
        let generator = OutfitGenerator::new(&catalog);
        let output = generator.generate(map(json!({
            "seed_mode": "fixed",
            "preset": "Glam Party",
            "preset_colors": false,
            "lock_preset_fields": true,
            "background": "Urban rooftop",
        })))?;

        assert!(output.positive.contains("torso: sequin cocktail dress"));
        assert!(output.positive.contains("feet: stiletto heels"));
        assert!(output.positive.contains("Background: Luxury hotel lobby"));
        assert!(output.positive.contains("Makeup: lipstick (red, heavy)"));
        Ok(())
    }

    #[test]
    fn test_random_preset_uses_style_seed() -> anyhow::Result<()> {
        let catalog = catalog("male");
        let generator = OutfitGenerator::new(&catalog);
        let inputs = |seed: u64| {
            map(json!({"seed": seed, "style_seed": 77, "seed_mode": "fixed", "preset": "random"}))
        };

        let first = metadata(&generator.generate(inputs(1))?)?;
        let second = metadata(&generator.generate(inputs(2))?)?;
        assert_eq!(first["preset"], second["preset"]);
        assert_ne!(first["preset"], json!("none"));
        assert_eq!(first["style_seed"], json!(77));
        Ok(())
    }

    #[test]
    fn test_inputs_json_overrides() -> anyhow::Result<()> {
        let catalog = catalog("male");
        let generator = OutfitGenerator::new(&catalog);
        let output = generator.generate(map(json!({
            "seed_mode": "fixed",
            "torso": "none",
            "inputs_json": r#"{"torso": "oversized graphic hoodie", "character_name": "Leo", "seed": 9}"#,
        })))?;
        assert!(output.positive.starts_with("Character: Leo"));
        assert!(output.positive.contains("torso: oversized graphic hoodie"));
        assert_eq!(output.seed, 0);

        let output = generator.generate(map(json!({"seed_mode": "fixed", "inputs_json": "{ broken"})))?;
        assert_eq!(output.positive, "");
        Ok(())
    }

    #[test]
    fn test_negative_prompt_from_preset() -> anyhow::Result<()> {
        let catalog = catalog("male");
        let generator = OutfitGenerator::new(&catalog);
        let output = generator.generate(map(json!({
            "seed_mode": "fixed",
            "preset": "Black Tie",
            "avoid_terms": "Blurry, cartoon",
        })))?;
        assert!(output.negative.starts_with("low-res, blurry"));
        assert!(output.negative.contains("beard"));
        assert!(output.negative.ends_with("cartoon"));
        assert_eq!(output.negative.to_lowercase().matches("blurry").count(), 1);
        Ok(())
    }

    #[test]
    fn test_output_cache() -> anyhow::Result<()> {
        let catalog = catalog("female");
        let generator = OutfitGenerator::new(&catalog);
        let inputs = map(json!({
            "seed": 31337,
            "seed_mode": "fixed",
            "enable_cache": true,
            "character_name": "Cached",
        }));

        let first = generator.generate(inputs.clone())?;
        let key = generator.cache_key(&inputs, SeedMode::Fixed, 31337)?;
        assert!(OUTPUT_CACHE
            .lock()
            .map_err(|e| anyhow::anyhow!("{e}"))?
            .get(&key)
            .is_some());
        assert_eq!(generator.generate(inputs)?, first);
        Ok(())
    }

    #[test]
    fn test_random_seed_mode_is_not_cached() -> anyhow::Result<()> {
        let catalog = catalog("male");
        let generator = OutfitGenerator::new(&catalog);
        let inputs = map(json!({
            "seed_mode": "random",
            "enable_cache": true,
            "character_name": "Uncached",
        }));

        for _ in 0..20 {
            let output = generator.generate(inputs.clone())?;
            let key = generator.cache_key(&inputs, SeedMode::Random, output.seed)?;
            assert!(OUTPUT_CACHE
                .lock()
                .map_err(|e| anyhow::anyhow!("{e}"))?
                .get(&key)
                .is_none());
        }
        Ok(())
    }

    #[test]
    fn test_output_cache_evicts_oldest() {
        let output = |seed: u64| OutfitOutput {
            positive: format!("p{seed}"),
            seed,
            negative: String::new(),
            metadata: "{}".to_string(),
        };

        let mut cache = OutputCache::new(3);
        for seed in 0..5 {
            cache.insert(format!("k{seed}"), output(seed));
        }
        assert_eq!(cache.len(), 3);
        assert!(cache.get("k0").is_none());
        assert!(cache.get("k1").is_none());
        assert_eq!(cache.get("k4"), Some(&output(4)));

        cache.insert("k2".to_string(), output(42));
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.get("k2").map(|o| o.seed), Some(42));
    }
}
