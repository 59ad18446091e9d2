//! 化妆编辑器
//!
//! 维护一个有序的化妆条目列表, 每次修改后重新计算序列化结果。
//! 序列化结果只包含 `enabled == true && type != "none"` 的条目, 顺序与列表一致,
//! 供下游的提示词构建读取。

use serde_json::Value;

use super::{
    diagnostics::{DiagnosticSink, LogSink},
    item::{FieldValue, MakeupEntry, MakeupField, MakeupItem},
    vocabulary::{Vocabulary, VocabularySource},
};
use crate::error::Error;

/// 空列表的序列化结果
pub const EMPTY_SERIALIZED: &str = "[]";

/// 编辑器状态变化的观察者, 如界面重绘或写入隐藏字段
pub trait EditorObserver: Send {
    fn on_change(&self, serialized: &str);
}

impl<F> EditorObserver for F
where
    F: Fn(&str) + Send,
{
    fn on_change(&self, serialized: &str) {
        self(serialized)
    }
}

pub struct MakeupEditor {
    items: Vec<MakeupItem>,
    counter: u64,
    serialized: String,
    vocabulary: Vocabulary,
    sink: Box<dyn DiagnosticSink>,
    observers: Vec<Box<dyn EditorObserver>>,
}

impl Default for MakeupEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MakeupEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MakeupEditor")
            .field("items", &self.items)
            .field("counter", &self.counter)
            .field("serialized", &self.serialized)
            .finish()
    }
}

impl MakeupEditor {
    pub fn new() -> Self {
        Self::with_sink(Box::new(LogSink))
    }

    pub fn with_sink(sink: Box<dyn DiagnosticSink>) -> Self {
        Self {
            items: Vec::new(),
            counter: 0,
            serialized: EMPTY_SERIALIZED.to_string(),
            vocabulary: Vocabulary::use_default(),
            sink,
            observers: Vec::new(),
        }
    }

    pub fn add_observer(&mut self, observer: Box<dyn EditorObserver>) {
        self.observers.push(observer);
    }

    pub fn items(&self) -> &[MakeupItem] {
        &self.items
    }

    pub fn item(&self, id: u64) -> Option<&MakeupItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 最近一次添加条目时加载的词表
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// 当前序列化结果
    pub fn serialize(&self) -> &str {
        &self.serialized
    }

    /// 添加默认条目
    ///
    /// 每次添加都会重新读取词表, 读取失败时使用内置词表
    pub fn add_item(&mut self, source: &dyn VocabularySource) -> MakeupItem {
        self.vocabulary = Vocabulary::resolve(source, self.sink.as_ref());

        let item = MakeupItem::new(self.next_id());
        self.items.push(item.clone());
        self.changed();
        item
    }

    /// 复制条目, 新条目追加到列表末尾
    pub fn duplicate_item(&mut self, id: u64) -> Result<MakeupItem, Error> {
        let Some(source) = self.item(id).cloned() else {
            return Err(self.not_found("duplicate", id));
        };

        let item = source.duplicate(self.next_id());
        self.items.push(item.clone());
        self.changed();
        Ok(item)
    }

    pub fn remove_item(&mut self, id: u64) -> Result<(), Error> {
        let Some(index) = self.items.iter().position(|item| item.id == id) else {
            return Err(self.not_found("remove", id));
        };

        self.items.remove(index);
        self.changed();
        Ok(())
    }

    /// 清空条目, id 计数不会重置
    pub fn clear_all(&mut self) {
        self.items.clear();
        self.changed();
    }

    /// 修改条目字段
    ///
    /// 词表之外的字符串值也会被接受, 仅输出调试信息
    pub fn set_field(&mut self, id: u64, field: &str, value: FieldValue) -> Result<(), Error> {
        let Some(index) = self.items.iter().position(|item| item.id == id) else {
            return Err(self.not_found("set field on", id));
        };

        let outside_vocabulary = match (&value, field.parse::<MakeupField>()) {
            (FieldValue::Text(text), Ok(field)) => !self.vocabulary.contains(field, text),
            _ => false,
        };

        let field = self.items[index].set_field(field, value).map_err(|e| {
            self.sink.warn(&format!("set field on item {id} failed: {e}"));
            e
        })?;
        if outside_vocabulary {
            self.sink.debug(&format!(
                "item {id} {field} set to a value outside the loaded vocabulary"
            ));
        }

        self.changed();
        Ok(())
    }

    /// 从序列化结果恢复条目, 用于重新加载已保存的工作流
    ///
    /// 每个条目分配新的 id; JSON 无法解析时保持当前状态不变
    pub fn restore(&mut self, serialized: &str) -> Result<(), Error> {
        let serialized = serialized.trim();
        let values: Vec<Value> = if serialized.is_empty() {
            Vec::new()
        } else {
            serde_json::from_str(serialized)?
        };

        let mut items = Vec::with_capacity(values.len());
        for value in values {
            let entry: MakeupEntry = match serde_json::from_value(value) {
                Ok(entry) => entry,
                Err(e) => {
                    self.sink.warn(&format!("skip invalid makeup entry: {e}"));
                    continue;
                }
            };
            items.push(MakeupItem {
                id: self.next_id(),
                enabled: entry.enabled,
                r#type: entry.r#type,
                intensity: entry.intensity,
                color: entry.color,
            });
        }

        self.items = items;
        self.changed();
        Ok(())
    }

    fn next_id(&mut self) -> u64 {
        self.counter += 1;
        self.counter
    }

    fn not_found(&self, action: &str, id: u64) -> Error {
        self.sink
            .warn(&format!("cannot {action} makeup item {id}: not found"));
        Error::ItemNotFound(id)
    }

    /// 重新计算序列化结果并通知观察者
    fn changed(&mut self) {
        let entries = self
            .items
            .iter()
            .filter(|item| item.is_active())
            .map(MakeupItem::entry)
            .collect::<Vec<_>>();

        self.serialized = match serde_json::to_string(&entries) {
            Ok(v) => v,
            Err(e) => {
                self.sink.warn(&format!("serialize makeup items failed: {e}"));
                EMPTY_SERIALIZED.to_string()
            }
        };

        for observer in &self.observers {
            observer.on_change(&self.serialized);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashSet,
        sync::{Arc, Mutex},
    };

    use serde_json::json;

    use super::*;
    use crate::makeup::{diagnostics::RecordingSink, vocabulary::StaticVocabularySource};

    fn source() -> StaticVocabularySource {
        StaticVocabularySource(json!({
            "attire": [{"type": "lipstick"}, {"type": "eyeshadow"}],
            "colors": ["none", "red", "gold"],
        }))
    }

    fn editor() -> (MakeupEditor, RecordingSink) {
        let sink = RecordingSink::new();
        (MakeupEditor::with_sink(Box::new(sink.clone())), sink)
    }

    fn serialized_values(editor: &MakeupEditor) -> anyhow::Result<Value> {
        Ok(serde_json::from_str(editor.serialize())?)
    }

    #[test]
    fn test_initial_state() {
        let (editor, _) = editor();
        assert!(editor.is_empty());
        assert_eq!(editor.serialize(), "[]");
    }

    #[test]
    fn test_scenario() -> anyhow::Result<()> {
        let (mut editor, _) = editor();

        let first = editor.add_item(&source());
        assert_eq!(editor.serialize(), "[]");

        editor.set_field(first.id, "type", "lipstick".into())?;
        assert_eq!(
            serialized_values(&editor)?,
            json!([{"type": "lipstick", "intensity": "medium", "color": "none", "enabled": true}])
        );

        editor.set_field(first.id, "enabled", false.into())?;
        assert_eq!(editor.serialize(), "[]");

        let second = editor.add_item(&source());
        editor.set_field(second.id, "type", "eyeshadow".into())?;
        editor.set_field(second.id, "color", "gold".into())?;
        editor.set_field(second.id, "intensity", "heavy".into())?;
        let copy = editor.duplicate_item(second.id)?;

        assert_ne!(copy.id, second.id);
        assert_eq!(editor.len(), 3);
        let expected = json!({"type": "eyeshadow", "intensity": "heavy", "color": "gold", "enabled": true});
        assert_eq!(serialized_values(&editor)?, json!([expected, expected]));

        editor.remove_item(second.id)?;
        assert_eq!(editor.len(), 2);
        assert_eq!(serialized_values(&editor)?, json!([expected]));

        editor.remove_item(first.id)?;
        assert_eq!(editor.len(), 1);
        assert_eq!(editor.items()[0].id, copy.id);
        assert_eq!(serialized_values(&editor)?, json!([expected]));
        Ok(())
    }

    #[test]
    fn test_duplicate_then_remove_original() -> anyhow::Result<()> {
        let (mut editor, _) = editor();

        let original = editor.add_item(&source());
        assert_eq!(editor.serialize(), "[]");

        editor.set_field(original.id, "type", "lipstick".into())?;
        let lipstick = json!({"type": "lipstick", "intensity": "medium", "color": "none", "enabled": true});
        assert_eq!(serialized_values(&editor)?, json!([lipstick]));

        editor.set_field(original.id, "enabled", false.into())?;
        assert_eq!(editor.serialize(), "[]");

        editor.set_field(original.id, "enabled", true.into())?;
        let copy = editor.duplicate_item(original.id)?;
        assert_eq!(editor.len(), 2);
        assert_ne!(copy.id, original.id);
        assert_eq!(serialized_values(&editor)?, json!([lipstick, lipstick]));

        editor.remove_item(original.id)?;
        assert_eq!(editor.len(), 1);
        assert_eq!(editor.items()[0].id, copy.id);
        assert_eq!(serialized_values(&editor)?, json!([lipstick]));
        Ok(())
    }

    #[test]
    fn test_ids_unique_and_increasing() -> anyhow::Result<()> {
        let (mut editor, _) = editor();
        let mut last = 0;
        for i in 0..10 {
            let item = if i % 3 == 2 {
                editor.duplicate_item(last)?
            } else {
                editor.add_item(&source())
            };
            assert!(item.id > last);
            last = item.id;
        }

        editor.clear_all();
        let item = editor.add_item(&source());
        assert!(item.id > last, "ids are not reused after clear");

        let ids = editor.items().iter().map(|i| i.id).collect::<HashSet<_>>();
        assert_eq!(ids.len(), editor.len());
        Ok(())
    }

    #[test]
    fn test_duplicate_appends_at_end() -> anyhow::Result<()> {
        let (mut editor, _) = editor();
        let a = editor.add_item(&source());
        let b = editor.add_item(&source());
        editor.set_field(a.id, "type", "lipstick".into())?;
        editor.set_field(b.id, "type", "eyeshadow".into())?;

        let copy = editor.duplicate_item(a.id)?;
        let ids = editor.items().iter().map(|i| i.id).collect::<Vec<_>>();
        assert_eq!(ids, vec![a.id, b.id, copy.id]);

        let types = serialized_values(&editor)?
            .as_array()
            .map(|a| a.iter().map(|v| v["type"].clone()).collect::<Vec<_>>())
            .unwrap_or_default();
        assert_eq!(types, vec![json!("lipstick"), json!("eyeshadow"), json!("lipstick")]);
        Ok(())
    }

    #[test]
    fn test_absent_id_is_noop() -> anyhow::Result<()> {
        let (mut editor, sink) = editor();
        let item = editor.add_item(&source());
        editor.set_field(item.id, "type", "lipstick".into())?;
        let before_items = editor.items().to_vec();
        let before = editor.serialize().to_string();

        assert!(matches!(editor.remove_item(99), Err(Error::ItemNotFound(99))));
        assert!(matches!(editor.duplicate_item(99), Err(Error::ItemNotFound(99))));
        assert!(matches!(
            editor.set_field(99, "type", "blush".into()),
            Err(Error::ItemNotFound(99))
        ));
        assert_eq!(editor.items(), before_items.as_slice());
        assert_eq!(editor.serialize(), before);

        // 重复删除
        editor.remove_item(item.id)?;
        assert!(matches!(editor.remove_item(item.id), Err(Error::ItemNotFound(_))));
        assert!(editor.is_empty());
        assert_eq!(editor.serialize(), "[]");
        assert_eq!(sink.warnings().len(), 4);
        Ok(())
    }

    #[test]
    fn test_invalid_field_leaves_state() -> anyhow::Result<()> {
        let (mut editor, sink) = editor();
        let item = editor.add_item(&source());
        editor.set_field(item.id, "type", "lipstick".into())?;
        let before = editor.serialize().to_string();

        assert!(matches!(
            editor.set_field(item.id, "finish", "matte".into()),
            Err(Error::InvalidField(_))
        ));
        assert!(matches!(
            editor.set_field(item.id, "enabled", "no".into()),
            Err(Error::InvalidField(_))
        ));
        assert_eq!(editor.serialize(), before);
        assert_eq!(sink.warnings().len(), 2);
        Ok(())
    }

    #[test]
    fn test_permissive_values() -> anyhow::Result<()> {
        let (mut editor, sink) = editor();
        let item = editor.add_item(&source());
        editor.set_field(item.id, "type", "glitter tattoo".into())?;
        editor.set_field(item.id, "color", "teal".into())?;

        assert_eq!(
            serialized_values(&editor)?,
            json!([{"type": "glitter tattoo", "intensity": "medium", "color": "teal", "enabled": true}])
        );
        assert!(sink.warnings().is_empty());
        assert_eq!(sink.records().len(), 2);
        Ok(())
    }

    #[test]
    fn test_clear_all_idempotent() -> anyhow::Result<()> {
        let (mut editor, _) = editor();
        let item = editor.add_item(&source());
        editor.set_field(item.id, "type", "lipstick".into())?;

        editor.clear_all();
        assert!(editor.is_empty());
        assert_eq!(editor.serialize(), "[]");

        editor.clear_all();
        assert!(editor.is_empty());
        assert_eq!(editor.serialize(), "[]");
        Ok(())
    }

    #[test]
    fn test_serialize_is_deterministic() -> anyhow::Result<()> {
        let (mut editor, _) = editor();
        for t in ["lipstick", "none", "eyeshadow"] {
            let item = editor.add_item(&source());
            editor.set_field(item.id, "type", t.into())?;
        }
        let first = editor.serialize().to_string();
        assert_eq!(editor.serialize(), first);
        assert_eq!(serialized_values(&editor)?.as_array().map(Vec::len), Some(2));
        Ok(())
    }

    #[test]
    fn test_vocabulary_fallback_on_add() {
        let (mut editor, sink) = editor();
        editor.add_item(&StaticVocabularySource(json!({"attire": 5})));
        assert_eq!(editor.len(), 1);
        assert_eq!(editor.vocabulary(), &Vocabulary::use_default());
        assert_eq!(sink.warnings().len(), 1);

        editor.add_item(&source());
        assert_eq!(editor.vocabulary().types, vec!["none", "lipstick", "eyeshadow"]);
    }

    #[test]
    fn test_observers_notified() -> anyhow::Result<()> {
        let (mut editor, _) = editor();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_c = seen.clone();
        editor.add_observer(Box::new(move |serialized: &str| {
            if let Ok(mut seen) = seen_c.lock() {
                seen.push(serialized.to_string());
            }
        }));

        let item = editor.add_item(&source());
        editor.set_field(item.id, "type", "lipstick".into())?;
        let _ = editor.remove_item(42);
        editor.clear_all();

        let seen = seen.lock().map_err(|e| anyhow::anyhow!("{e}"))?.clone();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0], "[]");
        assert!(seen[1].contains("lipstick"));
        assert_eq!(seen[2], "[]");
        Ok(())
    }

    #[test]
    fn test_restore() -> anyhow::Result<()> {
        let (mut editor, sink) = editor();
        let old = editor.add_item(&source());

        editor.restore(
            r#"[{"type":"lipstick","color":"red"}, 7, {"type":"blush","enabled":false}]"#,
        )?;
        assert_eq!(editor.len(), 2);
        assert!(editor.items().iter().all(|i| i.id > old.id));
        assert_eq!(
            serialized_values(&editor)?,
            json!([{"type": "lipstick", "intensity": "medium", "color": "red", "enabled": true}])
        );
        assert_eq!(sink.warnings().len(), 1);

        let before = editor.serialize().to_string();
        assert!(matches!(editor.restore("{ nope"), Err(Error::SerdeJsonError(_))));
        assert_eq!(editor.serialize(), before);
        assert_eq!(editor.len(), 2);

        editor.restore("")?;
        assert!(editor.is_empty());
        Ok(())
    }
}
