//! 查询结构体定义（Query DTO）

/// 获取单条消息
#[derive(Debug, Clone)]
pub struct GetMessageQuery {
    pub message_id: String,
}

/// 按标签查询消息（命中任意一个即返回）
#[derive(Debug, Clone)]
pub struct GetMessagesByTagsQuery {
    pub tags: Vec<String>,
}

/// 会话消息列表
#[derive(Debug, Clone, Default)]
pub struct ListMessagesQuery {
    pub conversation_id: String,
    pub include_deleted: bool,
    pub oldest_first: bool,
    pub limit: Option<i64>,
    pub offset: u64,
}

/// 列出所有标签
#[derive(Debug, Clone, Default)]
pub struct ListTagsQuery {
    // 无参数
}
