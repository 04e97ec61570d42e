//! LLM 评委服务 - 业务能力层
//!
//! 只负责"单条答案打分"能力，不关心流程
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型
//! - 兼容 OpenAI API 的服务（如 Azure, Gemini, Doubao 等）

use anyhow::Result;
use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::AppError;

/// LLM 评委能力
///
/// 评测流程只依赖这个 trait，测试里可以注入计数、
/// 故意失败等各种假评委。
#[async_trait]
pub trait Judge: Send + Sync {
    /// 对单条预测打分
    ///
    /// # 参数
    /// - `question`: 问题原文
    /// - `reference`: 标准答案
    /// - `predicted`: 预测答案
    ///
    /// # 返回
    /// [0, 1] 区间的分数
    async fn evaluate(&self, question: &str, reference: &str, predicted: &str) -> Result<f64>;
}

/// LLM 评委服务
///
/// 职责：
/// - 调用 LLM API 对单条预测答案打分
/// - 提供通用的 LLM 调用接口
/// - 只处理单条 (question, answer, response)
/// - 不出现 Vec<QaRecord>
/// - 不出现 group_key / record_index
/// - 不关心流程顺序
pub struct JudgeService {
    client: Client<OpenAIConfig>,
    model_name: String,
}

impl JudgeService {
    /// 创建新的评委服务
    pub fn new(config: &Config) -> Self {
        // 配置 OpenAI 客户端（兼容 OpenAI API 的服务）
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        let client = Client::with_config(openai_config);

        Self {
            client,
            model_name: config.llm_model_name.clone(),
        }
    }

    /// 通用的 LLM 调用函数
    ///
    /// 这是最基础的 LLM 调用接口，评委功能基于此函数实现。
    ///
    /// # 参数
    /// - `user_message`: 用户消息内容
    /// - `system_message`: 系统消息（可选）
    ///
    /// # 返回
    /// 返回 LLM 的响应内容（字符串）
    pub async fn send_to_llm(
        &self,
        user_message: &str,
        system_message: Option<&str>,
    ) -> Result<String> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", user_message.len());

        // 构建消息列表
        let mut messages = Vec::new();

        // 添加系统消息（如果提供）
        if let Some(sys_msg) = system_message {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg)
                .build()?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(user_message)
            .build()?;
        messages.push(ChatCompletionRequestMessage::User(user_msg));

        // 构建请求
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(0.0)
            .max_tokens(64u32)
            .build()?;

        // 调用 API
        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            AppError::llm_api_failed(&self.model_name, e)
        })?;

        debug!("LLM API 调用成功");

        // 提取响应内容
        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| AppError::Llm(crate::error::LlmError::EmptyContent {
                model: self.model_name.clone(),
            }))?;

        Ok(content.trim().to_string())
    }

    /// 构建用于答案打分的消息
    ///
    /// 返回 (user_message, system_message)
    fn build_judge_messages(
        &self,
        question: &str,
        reference: &str,
        predicted: &str,
    ) -> (String, String) {
        let system_message = "你是一个严格的问答质量评委，擅长判断预测答案是否正确回答了问题。\
                             你需要以标准答案为准，综合考虑语义等价和事实正确性来打分，\
                             不要因为表述方式不同而扣分。"
            .to_string();

        let user_message = format!(
            r#"请评估下面这条预测答案相对标准答案的质量。

【打分标准】
- 1.0：预测答案与标准答案语义等价，完整回答了问题
- 0.5：预测答案部分正确，但有遗漏或含有错误信息
- 0.0：预测答案错误或答非所问
- 可以使用 0 到 1 之间的任意小数表达中间程度

问题：{}

标准答案：{}

预测答案：{}

只返回一个 0 到 1 之间的小数，不要返回任何其他内容。"#,
            question, reference, predicted
        );

        (user_message, system_message)
    }

    /// 解析评委的 LLM 响应
    ///
    /// 从 LLM 的响应中提取分数，解析不出来视为评委调用失败
    fn parse_score_response(&self, response: &str) -> Result<f64> {
        let response = response.trim();

        // 尝试直接解析数字
        if let Ok(score) = response.parse::<f64>() {
            return Ok(score.clamp(0.0, 1.0));
        }

        // 尝试从文本中提取数字
        for word in response.split_whitespace() {
            let cleaned = word.trim_matches(|c: char| !c.is_numeric() && c != '.');
            if cleaned.is_empty() {
                continue;
            }
            if let Ok(score) = cleaned.parse::<f64>() {
                debug!("从响应 '{}' 中提取到分数: {}", response, score);
                return Ok(score.clamp(0.0, 1.0));
            }
        }

        warn!("无法解析 LLM 响应: '{}'", response);
        Err(AppError::llm_score_parse_failed(response).into())
    }
}

#[async_trait]
impl Judge for JudgeService {
    async fn evaluate(&self, question: &str, reference: &str, predicted: &str) -> Result<f64> {
        let (user_message, system_message) =
            self.build_judge_messages(question, reference, predicted);

        let response = self
            .send_to_llm(&user_message, Some(&system_message))
            .await?;

        let score = self.parse_score_response(&response)?;

        debug!("评委打分: {} (模型: {})", score, self.model_name);

        Ok(score)
    }
}
