//! 文本指标服务 - 业务能力层
//!
//! 提供两类纯计算指标：
//! - 词汇重叠指标（precision / recall / f1）
//! - n-gram 精确率（bleu1 ~ bleu4，带裁剪，不做跨阶聚合）
//!
//! 所有指标都是同步的 CPU 计算，只处理单条 (预测, 参考) 文本对，
//! 不出现 Vec<QaRecord>，不关心流程顺序。

use anyhow::Result;
use regex::Regex;
use std::collections::{HashMap, HashSet};

/// 词汇重叠指标
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LexicalScores {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// n-gram 精确率指标
///
/// 每一阶都是独立的裁剪精确率，bleu1 即 1-gram 精确率。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BleuScores {
    pub bleu1: f64,
    pub bleu2: f64,
    pub bleu3: f64,
    pub bleu4: f64,
}

/// 计算词汇重叠指标
///
/// # 参数
/// - `predicted`: 预测答案
/// - `reference`: 标准答案
///
/// # 返回
/// precision / recall / f1，均在 [0, 1] 区间
pub fn calculate_metrics(predicted: &str, reference: &str) -> Result<LexicalScores> {
    let pred_tokens = tokenize(&normalize_text(predicted)?);
    let ref_tokens = tokenize(&normalize_text(reference)?);

    if pred_tokens.is_empty() && ref_tokens.is_empty() {
        return Ok(LexicalScores {
            precision: 1.0,
            recall: 1.0,
            f1: 1.0,
        });
    }
    if pred_tokens.is_empty() || ref_tokens.is_empty() {
        return Ok(LexicalScores {
            precision: 0.0,
            recall: 0.0,
            f1: 0.0,
        });
    }

    let pred_set: HashSet<&String> = pred_tokens.iter().collect();
    let ref_set: HashSet<&String> = ref_tokens.iter().collect();

    let common = pred_set.intersection(&ref_set).count() as f64;
    let precision = common / pred_tokens.len() as f64;
    let recall = common / ref_tokens.len() as f64;

    let f1 = if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    };

    Ok(LexicalScores {
        precision,
        recall,
        f1,
    })
}

/// 计算 bleu1 ~ bleu4 裁剪精确率
///
/// 每个 n-gram 的命中次数被参考答案中的出现次数裁剪，
/// 避免重复词刷分。预测文本不足 n 个词时该阶记 0。
pub fn calculate_bleu_scores(predicted: &str, reference: &str) -> Result<BleuScores> {
    let pred_tokens = tokenize(&normalize_text(predicted)?);
    let ref_tokens = tokenize(&normalize_text(reference)?);

    Ok(BleuScores {
        bleu1: ngram_precision(&pred_tokens, &ref_tokens, 1),
        bleu2: ngram_precision(&pred_tokens, &ref_tokens, 2),
        bleu3: ngram_precision(&pred_tokens, &ref_tokens, 3),
        bleu4: ngram_precision(&pred_tokens, &ref_tokens, 4),
    })
}

/// 文本规范化：转小写并去掉标点符号
fn normalize_text(text: &str) -> Result<String> {
    // 去掉所有既不是字母数字也不是空白的字符
    let re = Regex::new(r"[^\w\s]")?;
    let lowercased = text.to_lowercase();
    let stripped = re.replace_all(&lowercased, " ");
    Ok(stripped.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// 按空白切分为词
fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace().map(|s| s.to_string()).collect()
}

/// 统计 n-gram 出现次数
fn ngram_counts(tokens: &[String], n: usize) -> HashMap<&[String], usize> {
    let mut counts: HashMap<&[String], usize> = HashMap::new();
    if tokens.len() >= n {
        for gram in tokens.windows(n) {
            *counts.entry(gram).or_insert(0) += 1;
        }
    }
    counts
}

/// 单阶裁剪 n-gram 精确率
fn ngram_precision(pred_tokens: &[String], ref_tokens: &[String], n: usize) -> f64 {
    if pred_tokens.len() < n {
        return 0.0;
    }

    let pred_counts = ngram_counts(pred_tokens, n);
    let ref_counts = ngram_counts(ref_tokens, n);

    let total = pred_tokens.len() - n + 1;
    let clipped: usize = pred_counts
        .iter()
        .map(|(gram, count)| (*count).min(ref_counts.get(gram).copied().unwrap_or(0)))
        .sum();

    clipped as f64 / total as f64
}
