//! 命令结构体定义（Command DTO）

/// 创建消息
#[derive(Debug, Clone)]
pub struct CreateMessageCommand {
    pub conversation_id: String,
    /// 来自认证上下文，不接受请求负载中的值
    pub sender_id: String,
    pub text: String,
    pub tags: Option<Vec<String>>,
}

/// 软删除消息
#[derive(Debug, Clone)]
pub struct DeleteMessageCommand {
    pub message_id: String,
}

/// 追加标签
#[derive(Debug, Clone)]
pub struct AddTagsCommand {
    pub message_id: String,
    pub tags: Vec<String>,
}

/// 替换标签
#[derive(Debug, Clone)]
pub struct UpdateTagsCommand {
    pub message_id: String,
    pub tags: Vec<String>,
}

/// 点赞 / 取消点赞
#[derive(Debug, Clone)]
pub struct ToggleLikeCommand {
    pub message_id: String,
    pub user_id: String,
    pub liked: bool,
}

/// 添加 / 移除表情回应
#[derive(Debug, Clone)]
pub struct ReactionCommand {
    pub message_id: String,
    pub user_id: String,
    pub emoji: String,
    pub add: bool,
}

/// 标记消息已解决 / 未解决
#[derive(Debug, Clone)]
pub struct SetResolvedCommand {
    pub message_id: String,
    pub resolved: bool,
}
