//! 评测数据模型 - 数据层
//!
//! 定义评测的基本单元（QaRecord）和评分产物（ScoreBundle）。
//!
//! 输入 JSON 中的字段可能是字符串、数字或布尔值（例如 `"category": 5`），
//! 统一在反序列化阶段转成 String，后续代码不再做任何隐式转换。

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 一条待评测的 QA 记录
///
/// - `question`: 问题原文
/// - `answer`: 标准答案
/// - `response`: 模型预测答案
/// - `category`: 类别标签（仅用于过滤）
///
/// 记录所属的分组键不在结构体内，由扁平化后的 `(group_key, QaRecord)`
/// 工作项携带。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QaRecord {
    #[serde(deserialize_with = "deserialize_stringify")]
    pub question: String,
    #[serde(deserialize_with = "deserialize_stringify")]
    pub answer: String,
    #[serde(deserialize_with = "deserialize_stringify")]
    pub response: String,
    #[serde(deserialize_with = "deserialize_stringify")]
    pub category: String,
}

/// 单条记录的评分结果
///
/// 四个透传字段保持与输入记录完全一致，三个分数字段：
/// - `bleu_score`: n-gram 指标中的 1-gram 精确率（bleu1）
/// - `f1_score`: 词汇重叠指标中的 F1 分量
/// - `llm_score`: LLM 评委给出的分数（0~1）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreBundle {
    pub question: String,
    pub answer: String,
    pub response: String,
    pub category: String,
    pub bleu_score: f64,
    pub f1_score: f64,
    pub llm_score: f64,
}

/// 输入数据集：分组键 → QA 记录列表
pub type GroupedDataset = BTreeMap<String, Vec<QaRecord>>;

/// 评测结果：分组键 → 评分结果列表（组内顺序为完成顺序）
pub type EvaluationResults = BTreeMap<String, Vec<ScoreBundle>>;

// Helper function to deserialize a field as string, integer, float or bool
fn deserialize_stringify<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Visitor;
    use std::fmt;

    struct StringifyVisitor;

    impl<'de> Visitor<'de> for StringifyVisitor {
        type Value = String;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string, number or bool")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_bool<E>(self, value: bool) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }
    }

    deserializer.deserialize_any(StringifyVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_string_fields() {
        let json = r#"{"question":"Q","answer":"A","response":"B","category":"5"}"#;
        let record: QaRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.question, "Q");
        assert_eq!(record.answer, "A");
        assert_eq!(record.response, "B");
        assert_eq!(record.category, "5");
    }

    #[test]
    fn test_deserialize_numeric_category() {
        // category 在输入文件中经常是数字
        let json = r#"{"question":"Q","answer":"A","response":"B","category":5}"#;
        let record: QaRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.category, "5");
    }

    #[test]
    fn test_deserialize_numeric_answer() {
        let json = r#"{"question":"几岁?","answer":42,"response":"42","category":"1"}"#;
        let record: QaRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.answer, "42");
    }

    #[test]
    fn test_deserialize_ignores_extra_fields() {
        let json = r#"{"question":"Q","answer":"A","response":"B","category":"1","context":"忽略我","score":0.5}"#;
        let record: QaRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.question, "Q");
    }

    #[test]
    fn test_deserialize_missing_field_fails() {
        // 缺少 response 字段，应该直接报错
        let json = r#"{"question":"Q","answer":"A","category":"1"}"#;
        let result: Result<QaRecord, _> = serde_json::from_str(json);

        assert!(result.is_err(), "缺少必需字段时应该反序列化失败");
    }

    #[test]
    fn test_score_bundle_field_order() {
        let bundle = ScoreBundle {
            question: "Q".to_string(),
            answer: "A".to_string(),
            response: "B".to_string(),
            category: "1".to_string(),
            bleu_score: 0.5,
            f1_score: 0.6,
            llm_score: 0.7,
        };

        let json = serde_json::to_string(&bundle).unwrap();
        let keys: Vec<&str> = json
            .trim_matches(|c| c == '{' || c == '}')
            .split(',')
            .map(|kv| kv.split(':').next().unwrap().trim_matches('"'))
            .collect();

        assert_eq!(
            keys,
            vec![
                "question",
                "answer",
                "response",
                "category",
                "bleu_score",
                "f1_score",
                "llm_score"
            ]
        );
    }
}
